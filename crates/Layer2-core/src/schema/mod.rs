//! Schema Layer - 도구 입력 스키마
//!
//! - `field` - 필드 종류와 정규화 규칙
//! - `action` - action variant (query / command)
//! - `tool_schema` - action들의 union, 검증 및 JSON Schema 생성

mod action;
mod field;
mod tool_schema;

pub use action::{ActionSchema, ACTION_FIELD};
pub use field::{FieldIssue, FieldKind, FieldSpec};
pub use tool_schema::{ParsedAction, SchemaValidationError, ToolSchema};
