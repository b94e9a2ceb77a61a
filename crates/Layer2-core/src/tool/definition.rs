//! Tool Definition & Dispatcher
//!
//! `ToolDefinition`은 등록 단위입니다: 이름, 설명, 스키마, 핸들러, gate.
//!
//! 대부분의 도구는 `Dispatcher`를 핸들러로 사용합니다. Dispatcher는 호출마다
//! 아래 단계를 순서대로 실행하고, 한 단계라도 실패하면 즉시 에러를 반환합니다.
//!
//! 1. 스키마 검증 → `SchemaValidation`
//! 2. 정책 확인 → `ActionDenied` (카탈로그 필터링과 무관하게 항상 확인)
//! 3. typed action으로 변환 → 실패 시 `UnreachableDispatch`
//! 4. `ActionHandler::handle` (업스트림 호출)
//! 5. 응답 정리 (`_links` 제거)

use super::context::ToolContext;
use crate::schema::ToolSchema;
use crate::{shape, ToolError};
use async_trait::async_trait;
use labforge_foundation::EnvSnapshot;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

// ============================================================================
// ToolGate
// ============================================================================

/// 환경 플래그로 도구 노출 여부를 결정
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolGate {
    pub env_var: &'static str,
    pub default_value: bool,
}

impl ToolGate {
    pub const fn new(env_var: &'static str, default_value: bool) -> Self {
        Self {
            env_var,
            default_value,
        }
    }

    /// 플래그가 설정되어 있으면 그 값, 아니면 기본값
    pub fn resolve(&self, env: &EnvSnapshot) -> bool {
        env.flag(self.env_var).unwrap_or(self.default_value)
    }
}

// ============================================================================
// Handler traits
// ============================================================================

/// 검증되지 않은 입력을 받는 도구 핸들러
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, args: Value) -> Result<Value, ToolError>;
}

/// 도구별 typed action 처리
#[async_trait]
pub trait ActionHandler: Send + Sync + 'static {
    /// `#[serde(tag = "action")]` enum
    type Action: DeserializeOwned + Send;

    async fn handle(&self, action: Self::Action, ctx: &ToolContext) -> Result<Value, ToolError>;
}

// ============================================================================
// Dispatcher
// ============================================================================

pub struct Dispatcher<H: ActionHandler> {
    tool: String,
    schema: Arc<ToolSchema>,
    ctx: ToolContext,
    handler: H,
}

impl<H: ActionHandler> Dispatcher<H> {
    pub fn new(
        tool: impl Into<String>,
        schema: Arc<ToolSchema>,
        ctx: ToolContext,
        handler: H,
    ) -> Self {
        Self {
            tool: tool.into(),
            schema,
            ctx,
            handler,
        }
    }
}

#[async_trait]
impl<H: ActionHandler> ToolHandler for Dispatcher<H> {
    async fn call(&self, args: Value) -> Result<Value, ToolError> {
        let call_id = Uuid::new_v4();
        let start = Instant::now();

        let parsed = self.schema.validate(&args).map_err(|e| {
            debug!("[{}] {} rejected: {}", call_id, self.tool, e);
            ToolError::SchemaValidation {
                tool: self.tool.clone(),
                issues: e.issues,
            }
        })?;
        let action = parsed.action().to_string();

        if self.ctx.policy().is_denied(&self.tool, &action) {
            warn!("[{}] {}:{} denied by policy", call_id, self.tool, action);
            return Err(ToolError::denied(&self.tool, &action));
        }

        let typed: H::Action = parsed.decode().map_err(|e| {
            warn!(
                "[{}] {}:{} passed validation but has no dispatch arm: {}",
                call_id, self.tool, action, e
            );
            ToolError::unreachable(&self.tool, &action)
        })?;

        let result = self.handler.handle(typed, &self.ctx).await;
        let elapsed = start.elapsed().as_millis();
        match &result {
            Ok(_) => debug!("[{}] {}:{} ok in {}ms", call_id, self.tool, action, elapsed),
            Err(e) => debug!(
                "[{}] {}:{} failed in {}ms: {}",
                call_id, self.tool, action, elapsed, e
            ),
        }

        result.map(shape::strip_links)
    }
}

// ============================================================================
// ToolDefinition
// ============================================================================

/// 등록 단위 (시작 시 생성, 이후 불변)
#[derive(Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    schema: Arc<ToolSchema>,
    handler: Arc<dyn ToolHandler>,
    pub gate: Option<ToolGate>,
}

impl ToolDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        schema: Arc<ToolSchema>,
        handler: Arc<dyn ToolHandler>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            schema,
            handler,
            gate: None,
        }
    }

    /// `Dispatcher`를 핸들러로 사용하는 도구
    pub fn dispatch<H: ActionHandler>(
        name: &str,
        description: &str,
        schema: ToolSchema,
        ctx: &ToolContext,
        handler: H,
    ) -> Self {
        let schema = Arc::new(schema);
        let dispatcher = Dispatcher::new(name, Arc::clone(&schema), ctx.clone(), handler);
        Self::new(name, description, schema, Arc::new(dispatcher))
    }

    pub fn with_gate(mut self, gate: ToolGate) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    /// 직렬화된 입력 스키마
    pub fn input_schema(&self) -> Value {
        self.schema.to_json_schema()
    }

    /// gate가 없거나 열려 있는지
    pub fn gate_open(&self, env: &EnvSnapshot) -> bool {
        self.gate.map_or(true, |gate| gate.resolve(env))
    }

    pub async fn call(&self, args: Value) -> Result<Value, ToolError> {
        self.handler.call(args).await
    }
}

impl fmt::Debug for ToolDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDefinition")
            .field("name", &self.name)
            .field("actions", &self.schema.action_names())
            .field("gate", &self.gate)
            .finish()
    }
}
