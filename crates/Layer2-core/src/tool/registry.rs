//! Tool Registry - 기능 영역별 도구 등록 및 관리
//!
//! 기능 영역(projects, members, pipelines, integrations)마다 하나의 레지스트리를 둡니다.
//!
//! ## 구조
//! - `tools`: 등록 순서를 유지하는 정의 목록 (카탈로그 출력 순서)
//! - `index`: 이름 → 위치 (디스패치용 조회)
//! - `read_only`: 읽기 전용 배포에서 노출할 query 도구 이름
//!
//! ```ignore
//! let mut registry = ToolRegistry::new("projects");
//! registry.register(browse_projects);
//! registry.register(manage_project);
//! registry.mark_read_only("browse_projects");
//!
//! let tool = registry.get("browse_projects").unwrap();
//! let result = tool.call(json!({"action": "get", "project_id": "123"})).await?;
//! ```

use super::definition::ToolDefinition;
use crate::ToolError;
use labforge_foundation::EnvSnapshot;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::{debug, warn};

/// 레지스트리 불변식 위반
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// index 키와 정의의 name이 다름
    KeyMismatch { key: String, name: String },
    /// 같은 이름이 두 번 등록됨
    DuplicateName(String),
    /// 레지스트리에 없는 읽기 전용 이름
    DanglingReadOnly(String),
    /// 읽기 전용 도구에 상태 변경 action이 있음
    ReadOnlyToolMutates { tool: String, action: String },
    /// 읽기 전용이 아닌 도구에 상태 변경 action이 없음
    CommandToolWithoutMutation(String),
    /// action이 하나도 없는 도구
    EmptySchema(String),
    /// 한 도구 안에서 action 이름 중복
    DuplicateAction { tool: String, action: String },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeyMismatch { key, name } => {
                write!(f, "registry key '{}' maps to tool named '{}'", key, name)
            }
            Self::DuplicateName(name) => write!(f, "tool '{}' is registered twice", name),
            Self::DanglingReadOnly(name) => {
                write!(f, "read-only name '{}' is not a registered tool", name)
            }
            Self::ReadOnlyToolMutates { tool, action } => write!(
                f,
                "read-only tool '{}' has mutating action '{}'",
                tool, action
            ),
            Self::CommandToolWithoutMutation(name) => write!(
                f,
                "tool '{}' is not read-only but has no mutating action",
                name
            ),
            Self::EmptySchema(name) => write!(f, "tool '{}' declares no actions", name),
            Self::DuplicateAction { tool, action } => {
                write!(f, "tool '{}' declares action '{}' twice", tool, action)
            }
        }
    }
}

/// 도구 레지스트리
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    area: String,
    tools: Vec<ToolDefinition>,
    index: HashMap<String, usize>,
    read_only: Vec<String>,
}

impl ToolRegistry {
    /// 빈 레지스트리 생성
    pub fn new(area: impl Into<String>) -> Self {
        Self {
            area: area.into(),
            tools: Vec::new(),
            index: HashMap::new(),
            read_only: Vec::new(),
        }
    }

    pub fn area(&self) -> &str {
        &self.area
    }

    /// 도구 등록
    ///
    /// 같은 이름이 이미 있으면 기존 위치에서 교체합니다.
    pub fn register(&mut self, tool: ToolDefinition) {
        match self.index.get(&tool.name) {
            Some(&idx) => {
                warn!("Tool '{}' re-registered in '{}'", tool.name, self.area);
                self.tools[idx] = tool;
            }
            None => {
                self.index.insert(tool.name.clone(), self.tools.len());
                self.tools.push(tool);
            }
        }
    }

    /// 여러 도구 한번에 등록
    pub fn register_all(&mut self, tools: impl IntoIterator<Item = ToolDefinition>) {
        for tool in tools {
            self.register(tool);
        }
    }

    /// 읽기 전용 배포에서 노출할 도구로 지정
    pub fn mark_read_only(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.read_only.contains(&name) {
            self.read_only.push(name);
        }
    }

    pub fn with_read_only<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            self.mark_read_only(name);
        }
        self
    }

    /// 도구 조회
    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.index.get(name).map(|&idx| &self.tools[idx])
    }

    /// 도구 존재 여부
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// 등록 순서대로 모든 도구
    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.tools
    }

    /// 모든 도구 이름 (등록 순서)
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn read_only_names(&self) -> &[String] {
        &self.read_only
    }

    pub fn is_read_only(&self, name: &str) -> bool {
        self.read_only.iter().any(|n| n == name)
    }

    /// 도구 개수
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// 비어있는지 확인
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// 배포 설정에 따라 노출되는 도구 (gate, 읽기 전용 모드)
    pub fn filtered(&self, read_only: bool, env: &EnvSnapshot) -> Vec<&ToolDefinition> {
        self.tools
            .iter()
            .filter(|t| t.gate_open(env))
            .filter(|t| !read_only || self.is_read_only(&t.name))
            .collect()
    }

    /// 도구 실행 (필터링 없이 이름으로 직접)
    ///
    /// 정책 확인은 핸들러 안에서 이루어지므로 이 경로로도 우회되지 않습니다.
    pub async fn execute(&self, name: &str, args: Value) -> Result<Value, ToolError> {
        let tool = self.get(name).ok_or_else(|| ToolError::unknown_tool(name))?;
        debug!("Executing '{}' from registry '{}'", name, self.area);
        tool.call(args).await
    }

    /// 불변식 확인 (위반 목록, 비어 있으면 정상)
    pub fn check_invariants(&self) -> Vec<InvariantViolation> {
        let mut violations = Vec::new();

        for (key, &idx) in &self.index {
            match self.tools.get(idx) {
                Some(tool) if &tool.name == key => {}
                Some(tool) => violations.push(InvariantViolation::KeyMismatch {
                    key: key.clone(),
                    name: tool.name.clone(),
                }),
                None => violations.push(InvariantViolation::KeyMismatch {
                    key: key.clone(),
                    name: String::new(),
                }),
            }
        }

        let mut seen = HashSet::new();
        for tool in &self.tools {
            if !seen.insert(tool.name.as_str()) {
                violations.push(InvariantViolation::DuplicateName(tool.name.clone()));
            }

            let schema = tool.schema();
            if schema.actions().is_empty() {
                violations.push(InvariantViolation::EmptySchema(tool.name.clone()));
            }

            let mut actions = HashSet::new();
            for action in schema.actions() {
                if !actions.insert(action.name) {
                    violations.push(InvariantViolation::DuplicateAction {
                        tool: tool.name.clone(),
                        action: action.name.to_string(),
                    });
                }
            }

            if self.is_read_only(&tool.name) {
                for action in schema.actions().iter().filter(|a| a.mutating) {
                    violations.push(InvariantViolation::ReadOnlyToolMutates {
                        tool: tool.name.clone(),
                        action: action.name.to_string(),
                    });
                }
            } else if !schema.has_mutating() {
                violations.push(InvariantViolation::CommandToolWithoutMutation(
                    tool.name.clone(),
                ));
            }
        }

        for name in &self.read_only {
            if !self.contains(name) {
                violations.push(InvariantViolation::DanglingReadOnly(name.clone()));
            }
        }

        violations
    }
}
