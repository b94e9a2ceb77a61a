//! Tool 호출 에러 타입
//!
//! 한 번의 호출은 아래 단계를 순서대로 거치며, 실패한 단계가 에러 종류를 결정합니다.
//!
//! ```text
//! Received → Validated → PolicyChecked → Dispatched → UpstreamCalled → ShapedResponse
//!     │          │             │              │              │
//!     ▼          ▼             ▼              ▼              ▼
//! UnknownTool  Schema-     ActionDenied   Unreachable-    Upstream /
//!              Validation                 Dispatch        Transport
//! ```

use crate::schema::FieldIssue;
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;
use thiserror::Error;

/// 호출 단계
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationStage {
    Received,
    Validated,
    PolicyChecked,
    Dispatched,
    UpstreamCalled,
    ShapedResponse,
}

impl fmt::Display for InvocationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Received => "received",
            Self::Validated => "validated",
            Self::PolicyChecked => "policy_checked",
            Self::Dispatched => "dispatched",
            Self::UpstreamCalled => "upstream_called",
            Self::ShapedResponse => "shaped_response",
        };
        f.write_str(name)
    }
}

/// Tool 호출 에러
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolError {
    /// 카탈로그에 없는 도구 (gate로 숨겨진 도구도 동일하게 보고)
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// 입력 검증 실패
    #[error("Invalid arguments for {tool}: {}", format_issues(.issues))]
    SchemaValidation { tool: String, issues: Vec<FieldIssue> },

    /// 정책으로 거부된 action
    #[error("Action '{action}' of tool '{tool}' is denied by policy")]
    ActionDenied { tool: String, action: String },

    /// 업스트림 API가 non-2xx 응답
    #[error("Upstream API error: {status} {status_text}")]
    Upstream {
        status: u16,
        status_text: String,
        body_excerpt: Option<String>,
    },

    /// 업스트림 요청 자체가 실패 (연결, 타임아웃 등)
    #[error("Transport error: {0}")]
    Transport(String),

    /// 스키마와 디스패처가 action 집합에 대해 불일치
    #[error("Unreachable dispatch: tool '{tool}' has no handler for action '{action}'")]
    UnreachableDispatch { tool: String, action: String },
}

fn format_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl ToolError {
    pub fn unknown_tool(name: impl Into<String>) -> Self {
        Self::UnknownTool(name.into())
    }

    pub fn denied(tool: impl Into<String>, action: impl Into<String>) -> Self {
        Self::ActionDenied {
            tool: tool.into(),
            action: action.into(),
        }
    }

    pub fn unreachable(tool: impl Into<String>, action: impl Into<String>) -> Self {
        Self::UnreachableDispatch {
            tool: tool.into(),
            action: action.into(),
        }
    }

    /// 실패한 호출 단계
    pub fn stage(&self) -> InvocationStage {
        match self {
            Self::UnknownTool(_) => InvocationStage::Received,
            Self::SchemaValidation { .. } => InvocationStage::Validated,
            Self::ActionDenied { .. } => InvocationStage::PolicyChecked,
            Self::UnreachableDispatch { .. } => InvocationStage::Dispatched,
            Self::Upstream { .. } | Self::Transport(_) => InvocationStage::UpstreamCalled,
        }
    }

    /// 에러 종류 식별자
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownTool(_) => "unknown_tool",
            Self::SchemaValidation { .. } => "schema_validation",
            Self::ActionDenied { .. } => "action_denied",
            Self::Upstream { .. } => "upstream",
            Self::Transport(_) => "transport",
            Self::UnreachableDispatch { .. } => "unreachable_dispatch",
        }
    }

    /// 호출자가 입력을 고쳐서 해결할 수 있는 에러인지
    pub fn is_user_facing(&self) -> bool {
        match self {
            Self::UnknownTool(_) | Self::SchemaValidation { .. } | Self::ActionDenied { .. } => {
                true
            }
            Self::Upstream { status, .. } => (400..500).contains(status),
            Self::Transport(_) | Self::UnreachableDispatch { .. } => false,
        }
    }

    /// `{error: {kind, message, stage, ...}}` 형태로 변환
    pub fn to_json(&self) -> Value {
        let mut error = json!({
            "kind": self.kind(),
            "message": self.to_string(),
            "stage": self.stage(),
        });

        let details = match self {
            Self::UnknownTool(name) => json!({ "tool": name }),
            Self::SchemaValidation { tool, issues } => json!({ "tool": tool, "issues": issues }),
            Self::ActionDenied { tool, action } | Self::UnreachableDispatch { tool, action } => {
                json!({ "tool": tool, "action": action })
            }
            Self::Upstream {
                status,
                status_text,
                body_excerpt,
            } => json!({
                "status": status,
                "statusText": status_text,
                "bodyExcerpt": body_excerpt,
            }),
            Self::Transport(_) => json!({}),
        };

        if let (Some(target), Value::Object(extra)) = (error.as_object_mut(), details) {
            target.extend(extra);
        }
        json!({ "error": error })
    }
}

impl From<reqwest::Error> for ToolError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Transport(format!("Request timed out: {}", err))
        } else if err.is_connect() {
            Self::Transport(format!("Connection failed: {}", err))
        } else {
            Self::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_and_kind() {
        let err = ToolError::denied("manage_project", "delete");
        assert_eq!(err.stage(), InvocationStage::PolicyChecked);
        assert_eq!(err.kind(), "action_denied");
        assert!(err.is_user_facing());

        let err = ToolError::unreachable("manage_project", "nuke");
        assert_eq!(err.stage(), InvocationStage::Dispatched);
        assert!(!err.is_user_facing());
    }

    #[test]
    fn test_upstream_user_facing_by_status() {
        let not_found = ToolError::Upstream {
            status: 404,
            status_text: "Not Found".into(),
            body_excerpt: None,
        };
        let server = ToolError::Upstream {
            status: 502,
            status_text: "Bad Gateway".into(),
            body_excerpt: None,
        };
        assert!(not_found.is_user_facing());
        assert!(!server.is_user_facing());
        assert_eq!(server.to_string(), "Upstream API error: 502 Bad Gateway");
    }

    #[test]
    fn test_validation_message_lists_paths() {
        let err = ToolError::SchemaValidation {
            tool: "browse_projects".into(),
            issues: vec![
                FieldIssue::new("action", "unknown action"),
                FieldIssue::new("project_id", "required field is missing"),
            ],
        };
        let message = err.to_string();
        assert!(message.contains("action: unknown action"));
        assert!(message.contains("project_id: required field is missing"));
    }

    #[test]
    fn test_to_json() {
        let value = ToolError::Upstream {
            status: 403,
            status_text: "Forbidden".into(),
            body_excerpt: Some("{\"message\":\"403 Forbidden\"}".into()),
        }
        .to_json();

        assert_eq!(value["error"]["kind"], "upstream");
        assert_eq!(value["error"]["status"], 403);
        assert_eq!(value["error"]["stage"], "upstream_called");

        let value = ToolError::unknown_tool("x").to_json();
        assert_eq!(value["error"]["tool"], "x");
        assert_eq!(value["error"]["message"], "Unknown tool: x");
    }
}
