//! Tool Catalog - 호출자에게 보이는 도구 목록
//!
//! 노출 여부는 두 축으로 결정됩니다:
//!
//! - gate: 도구별 환경 플래그. 닫혀 있으면 목록에도 없고 호출도 `UnknownTool`
//! - 읽기 전용 모드: 켜져 있으면 레지스트리의 read-only 도구만 노출
//!
//! 정책으로 거부된 action은 스키마에서 빠지지만, 도구 자체는 계속 호출 가능하며
//! 거부된 action을 호출하면 핸들러가 `ActionDenied`를 반환합니다.

use super::builtin;
use super::context::ToolContext;
use super::definition::ToolDefinition;
use super::registry::{InvariantViolation, ToolRegistry};
use crate::ToolError;
use labforge_foundation::{EnvSnapshot, PolicyGate, ServerConfig};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// 카탈로그 항목 (MCP `tools/list` 형식)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

pub struct ToolCatalog {
    registries: Vec<ToolRegistry>,
    config: Arc<ServerConfig>,
    env: EnvSnapshot,
    policy: Arc<PolicyGate>,
}

impl ToolCatalog {
    /// 빈 카탈로그
    pub fn new(config: Arc<ServerConfig>, env: EnvSnapshot, policy: Arc<PolicyGate>) -> Self {
        Self {
            registries: Vec::new(),
            config,
            env,
            policy,
        }
    }

    /// builtin 기능 영역을 모두 포함한 카탈로그
    pub fn with_builtins(ctx: &ToolContext, env: EnvSnapshot) -> Self {
        let mut catalog = Self::new(ctx.shared_config(), env, ctx.shared_policy());
        for registry in builtin::all_registries(ctx) {
            catalog.add_registry(registry);
        }
        info!(
            "Catalog ready: {} tools in {} areas, {} visible",
            catalog.tool_count(),
            catalog.registries.len(),
            catalog.visible().len()
        );
        catalog
    }

    pub fn add_registry(&mut self, registry: ToolRegistry) {
        debug!(
            "Registered area '{}' with {} tools",
            registry.area(),
            registry.len()
        );
        self.registries.push(registry);
    }

    pub fn with_registry(mut self, registry: ToolRegistry) -> Self {
        self.add_registry(registry);
        self
    }

    pub fn registries(&self) -> &[ToolRegistry] {
        &self.registries
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn policy(&self) -> &PolicyGate {
        &self.policy
    }

    pub fn tool_count(&self) -> usize {
        self.registries.iter().map(ToolRegistry::len).sum()
    }

    /// gate와 읽기 전용 모드를 통과한 도구 (등록 순서)
    pub fn visible(&self) -> Vec<&ToolDefinition> {
        self.registries
            .iter()
            .flat_map(|r| r.filtered(self.config.read_only, &self.env))
            .collect()
    }

    fn find_visible(&self, name: &str) -> Option<&ToolDefinition> {
        self.registries.iter().find_map(|registry| {
            let tool = registry.get(name)?;
            let visible = tool.gate_open(&self.env)
                && (!self.config.read_only || registry.is_read_only(name));
            visible.then_some(tool)
        })
    }

    /// 노출 도구 목록 (거부된 action은 스키마에서 제외)
    pub fn list_tools(&self) -> Vec<CatalogEntry> {
        self.visible()
            .into_iter()
            .filter_map(|tool| {
                let schema = tool
                    .schema()
                    .to_json_schema_where(|a| !self.policy.is_denied(&tool.name, a.name));
                if schema.is_none() {
                    debug!("Omitting '{}' from listing: every action denied", tool.name);
                }
                Some(CatalogEntry {
                    name: tool.name.clone(),
                    description: tool.description.clone(),
                    input_schema: schema?,
                })
            })
            .collect()
    }

    /// 도구 호출
    ///
    /// 노출되지 않은 도구는 존재 여부와 무관하게 `UnknownTool`입니다.
    pub async fn call_tool(&self, name: &str, args: Value) -> Result<Value, ToolError> {
        let tool = self
            .find_visible(name)
            .ok_or_else(|| ToolError::unknown_tool(name))?;
        tool.call(args).await
    }

    /// 모든 레지스트리의 불변식 + 영역 간 이름 중복
    pub fn check_invariants(&self) -> Vec<InvariantViolation> {
        let mut violations: Vec<_> = self
            .registries
            .iter()
            .flat_map(ToolRegistry::check_invariants)
            .collect();

        let mut seen = HashSet::new();
        for registry in &self.registries {
            for name in registry.names() {
                if !seen.insert(name) {
                    violations.push(InvariantViolation::DuplicateName(name.to_string()));
                }
            }
        }
        violations
    }
}
