//! Action schema - 하나의 action variant
//!
//! action은 자신에게 필요한 필드만 선언합니다. query action은 업스트림 상태를
//! 읽기만 하고, command action은 변경합니다.

use super::field::FieldSpec;
use serde_json::{json, Map, Value};

/// action 판별자 필드 이름
pub const ACTION_FIELD: &str = "action";

#[derive(Debug, Clone, PartialEq)]
pub struct ActionSchema {
    pub name: &'static str,
    pub description: &'static str,
    /// 업스트림 상태를 변경하는지
    pub mutating: bool,
    pub fields: Vec<FieldSpec>,
}

impl ActionSchema {
    /// 읽기 전용 action
    pub fn query(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            mutating: false,
            fields: Vec::new(),
        }
    }

    /// 상태 변경 action
    pub fn command(name: &'static str, description: &'static str) -> Self {
        Self {
            mutating: true,
            ..Self::query(name, description)
        }
    }

    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn fields(mut self, fields: impl IntoIterator<Item = FieldSpec>) -> Self {
        self.fields.extend(fields);
        self
    }

    pub fn find_field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// variant 하나의 object 스키마 (`action`은 const)
    pub fn json_schema(&self) -> Value {
        let mut properties = Map::new();
        properties.insert(
            ACTION_FIELD.to_string(),
            json!({ "type": "string", "const": self.name }),
        );

        let mut required = vec![Value::from(ACTION_FIELD)];
        for field in &self.fields {
            properties.insert(field.name.to_string(), field.json_schema());
            if field.required {
                required.push(Value::from(field.name));
            }
        }

        json!({
            "type": "object",
            "description": self.description,
            "properties": properties,
            "required": required,
            "additionalProperties": false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_schema() {
        let action = ActionSchema::command("delete", "Delete a project")
            .field(FieldSpec::id("project_id").required())
            .field(FieldSpec::boolean("permanently_remove"));
        let schema = action.json_schema();

        assert!(action.mutating);
        assert_eq!(schema["properties"]["action"]["const"], "delete");
        assert_eq!(schema["required"], json!(["action", "project_id"]));
        assert_eq!(schema["additionalProperties"], false);
        assert!(action.find_field("permanently_remove").is_some());
        assert!(action.find_field("name").is_none());
    }
}
