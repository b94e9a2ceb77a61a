//! Tool schema - action들의 discriminated union
//!
//! ```text
//! raw JSON ──validate()──► ParsedAction ──decode::<T>()──► typed action enum
//!    │                        │
//!    │                        └─ canonical field map (선언된 필드만)
//!    └─ 실패 시 SchemaValidationError (모든 필드 이슈를 한 번에)
//! ```

use super::action::{ActionSchema, ACTION_FIELD};
use super::field::FieldIssue;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use std::fmt;
use tracing::debug;

// ============================================================================
// SchemaValidationError
// ============================================================================

/// 검증 실패 (하나 이상의 필드 이슈)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaValidationError {
    pub issues: Vec<FieldIssue>,
}

impl SchemaValidationError {
    fn single(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            issues: vec![FieldIssue::new(path, message)],
        }
    }

    /// 특정 경로에 대한 이슈가 있는지
    pub fn has_path(&self, path: &str) -> bool {
        self.issues.iter().any(|i| i.path == path)
    }
}

impl fmt::Display for SchemaValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.issues.iter().map(|i| i.to_string()).collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for SchemaValidationError {}

// ============================================================================
// ParsedAction
// ============================================================================

/// 검증을 통과한 action
///
/// 입력에 없던 optional 필드는 `fields`에 존재하지 않습니다.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedAction {
    action: String,
    fields: Map<String, Value>,
}

impl ParsedAction {
    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// `action` 태그를 포함한 JSON으로 재직렬화
    pub fn to_value(&self) -> Value {
        let mut object = Map::with_capacity(self.fields.len() + 1);
        object.insert(ACTION_FIELD.to_string(), Value::String(self.action.clone()));
        object.extend(self.fields.clone());
        Value::Object(object)
    }

    /// 도구별 typed action enum으로 변환
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.to_value())
    }
}

// ============================================================================
// ToolSchema
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ToolSchema {
    actions: Vec<ActionSchema>,
}

impl ToolSchema {
    pub fn new(actions: Vec<ActionSchema>) -> Self {
        Self { actions }
    }

    pub fn actions(&self) -> &[ActionSchema] {
        &self.actions
    }

    pub fn action(&self, name: &str) -> Option<&ActionSchema> {
        self.actions.iter().find(|a| a.name == name)
    }

    pub fn action_names(&self) -> Vec<&'static str> {
        self.actions.iter().map(|a| a.name).collect()
    }

    /// 하나 이상의 action이 상태를 변경하는지
    pub fn has_mutating(&self) -> bool {
        self.actions.iter().any(|a| a.mutating)
    }

    /// 입력 검증 및 정규화
    pub fn validate(&self, raw: &Value) -> Result<ParsedAction, SchemaValidationError> {
        let Some(input) = raw.as_object() else {
            return Err(SchemaValidationError::single(
                "$",
                "arguments must be a JSON object",
            ));
        };

        let expected = || format!("expected one of: {}", self.action_names().join(", "));
        let schema = match input.get(ACTION_FIELD) {
            None | Some(Value::Null) => {
                return Err(SchemaValidationError::single(
                    ACTION_FIELD,
                    format!("required field is missing; {}", expected()),
                ))
            }
            Some(Value::String(tag)) => match self.action(tag) {
                Some(schema) => schema,
                None => {
                    return Err(SchemaValidationError::single(
                        ACTION_FIELD,
                        format!("unknown action '{}'; {}", tag, expected()),
                    ))
                }
            },
            Some(_) => {
                return Err(SchemaValidationError::single(
                    ACTION_FIELD,
                    format!("must be a string; {}", expected()),
                ))
            }
        };

        let mut fields = Map::new();
        let mut issues = Vec::new();

        for spec in &schema.fields {
            match input.get(spec.name) {
                None | Some(Value::Null) => {
                    if spec.required {
                        issues.push(FieldIssue::new(spec.name, "required field is missing"));
                    }
                }
                Some(value) => match spec.kind.coerce(spec.name, value) {
                    Ok(canonical) => {
                        fields.insert(spec.name.to_string(), canonical);
                    }
                    Err(issue) => issues.push(issue),
                },
            }
        }

        for key in input.keys() {
            if key != ACTION_FIELD && schema.find_field(key).is_none() {
                debug!("Dropping undeclared field '{}' for action '{}'", key, schema.name);
            }
        }

        if !issues.is_empty() {
            return Err(SchemaValidationError { issues });
        }

        Ok(ParsedAction {
            action: schema.name.to_string(),
            fields,
        })
    }

    /// 전체 JSON Schema
    pub fn to_json_schema(&self) -> Value {
        self.to_json_schema_where(|_| true)
            .unwrap_or_else(|| json!({ "type": "object" }))
    }

    /// 조건을 만족하는 action만 포함한 JSON Schema (남는 action이 없으면 None)
    pub fn to_json_schema_where<F>(&self, mut keep: F) -> Option<Value>
    where
        F: FnMut(&ActionSchema) -> bool,
    {
        let kept: Vec<&ActionSchema> = self.actions.iter().filter(|a| keep(a)).collect();

        match kept.as_slice() {
            [] => None,
            [only] => Some(only.json_schema()),
            many => {
                let names: Vec<&str> = many.iter().map(|a| a.name).collect();
                let variants: Vec<Value> = many.iter().map(|a| a.json_schema()).collect();
                Some(json!({
                    "type": "object",
                    "properties": {
                        ACTION_FIELD: { "type": "string", "enum": names }
                    },
                    "required": [ACTION_FIELD],
                    "oneOf": variants,
                }))
            }
        }
    }
}
