//! Field spec - action 입력 필드 선언
//!
//! 각 필드는 종류(`FieldKind`)에 따라 입력값을 정규형(canonical form)으로 변환합니다.
//!
//! | 종류        | 허용 입력                         | 정규형         |
//! |-------------|-----------------------------------|----------------|
//! | `String`    | 비어있지 않은 문자열              | string         |
//! | `Id`        | 문자열 또는 정수                  | string         |
//! | `Slug`      | 비어있지 않은 문자열              | string         |
//! | `Integer`   | 정수 또는 숫자 문자열             | number         |
//! | `Boolean`   | bool 또는 `"true"`/`"false"`      | bool           |
//! | `Enum`      | 선언된 값 중 하나                 | string         |
//! | `Date`      | `YYYY-MM-DD`                      | string         |
//! | `StringMap` | 값이 모두 문자열인 object         | object         |
//! | `Object`    | 임의의 object                     | object         |
//!
//! `Id`/`Slug`는 URL path segment로 쓰이므로 `.`만으로 된 값(`.`, `..`)은 거부합니다.

use serde::Serialize;
use serde_json::{json, Map, Value};
use std::fmt;

/// 검증 실패 항목 (필드 경로 + 메시지)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub path: String,
    pub message: String,
}

impl FieldIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// 필드 종류
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    String,
    Id,
    Slug,
    Integer { min: Option<i64>, max: Option<i64> },
    Boolean,
    Enum(&'static [&'static str]),
    Date,
    StringMap,
    Object,
}

impl FieldKind {
    /// 입력값을 정규형으로 변환
    pub fn coerce(&self, path: &str, value: &Value) -> Result<Value, FieldIssue> {
        let issue = |message: String| FieldIssue::new(path, message);

        match self {
            Self::String => match value {
                Value::String(s) if !s.trim().is_empty() => Ok(Value::String(s.clone())),
                Value::String(_) => Err(issue("must not be empty".into())),
                other => Err(issue(format!("expected a string, got {}", type_name(other)))),
            },

            Self::Id => match value {
                Value::String(s) => path_segment(s).map(Value::String).map_err(issue),
                Value::Number(n) if n.is_i64() || n.is_u64() => Ok(Value::String(n.to_string())),
                other => Err(issue(format!(
                    "expected a string or integer identifier, got {}",
                    type_name(other)
                ))),
            },

            Self::Slug => match value {
                Value::String(s) => path_segment(s).map(Value::String).map_err(issue),
                other => Err(issue(format!("expected a string, got {}", type_name(other)))),
            },

            Self::Integer { min, max } => {
                let parsed = match value {
                    Value::Number(n) => n.as_i64(),
                    Value::String(s) => s.trim().parse::<i64>().ok(),
                    _ => None,
                };
                let n = parsed.ok_or_else(|| {
                    issue(format!("expected an integer, got {}", type_name(value)))
                })?;
                if let Some(min) = min {
                    if n < *min {
                        return Err(issue(format!("must be >= {}", min)));
                    }
                }
                if let Some(max) = max {
                    if n > *max {
                        return Err(issue(format!("must be <= {}", max)));
                    }
                }
                Ok(Value::from(n))
            }

            Self::Boolean => match value {
                Value::Bool(b) => Ok(Value::Bool(*b)),
                Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(Value::Bool(true)),
                Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(Value::Bool(false)),
                other => Err(issue(format!("expected a boolean, got {}", type_name(other)))),
            },

            Self::Enum(values) => match value {
                Value::String(s) if values.contains(&s.as_str()) => Ok(Value::String(s.clone())),
                _ => Err(issue(format!("expected one of: {}", values.join(", ")))),
            },

            Self::Date => match value {
                Value::String(s) => chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .map(|_| Value::String(s.clone()))
                    .map_err(|_| issue(format!("expected a date as YYYY-MM-DD, got '{}'", s))),
                other => Err(issue(format!("expected a date string, got {}", type_name(other)))),
            },

            Self::StringMap => {
                let Value::Object(map) = value else {
                    return Err(issue(format!("expected an object, got {}", type_name(value))));
                };
                let mut out = Map::new();
                for (key, entry) in map {
                    match entry {
                        Value::String(s) => {
                            out.insert(key.clone(), Value::String(s.clone()));
                        }
                        other => {
                            return Err(FieldIssue::new(
                                format!("{}.{}", path, key),
                                format!("expected a string, got {}", type_name(other)),
                            ))
                        }
                    }
                }
                Ok(Value::Object(out))
            }

            Self::Object => match value {
                Value::Object(_) => Ok(value.clone()),
                other => Err(issue(format!("expected an object, got {}", type_name(other)))),
            },
        }
    }

    /// JSON Schema 조각
    pub fn json_schema(&self) -> Value {
        match self {
            Self::String => json!({ "type": "string", "minLength": 1, "pattern": "\\S" }),
            Self::Id => json!({ "type": ["string", "integer"], "pattern": SEGMENT_PATTERN }),
            Self::Slug => json!({ "type": "string", "pattern": SEGMENT_PATTERN }),
            Self::Integer { min, max } => {
                let mut schema = json!({ "type": "integer" });
                if let Some(min) = min {
                    schema["minimum"] = json!(min);
                }
                if let Some(max) = max {
                    schema["maximum"] = json!(max);
                }
                schema
            }
            Self::Boolean => json!({ "type": "boolean" }),
            Self::Enum(values) => json!({ "type": "string", "enum": values }),
            Self::Date => json!({ "type": "string", "format": "date" }),
            Self::StringMap => json!({
                "type": "object",
                "additionalProperties": { "type": "string" }
            }),
            Self::Object => json!({ "type": "object" }),
        }
    }
}

/// 공백도 `.`도 아닌 문자가 하나 이상 있어야 함
const SEGMENT_PATTERN: &str = "[^.\\s]";

/// path segment 값 정규화 (trim, 빈 값과 dot segment 거부)
fn path_segment(raw: &str) -> Result<String, String> {
    let value = raw.trim();
    if value.is_empty() {
        return Err("must not be empty".into());
    }
    if value.chars().all(|c| c == '.') {
        return Err(format!("'{}' is not a valid identifier", value));
    }
    Ok(value.to_string())
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// 필드 선언
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub description: &'static str,
}

impl FieldSpec {
    pub fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            description: "",
        }
    }

    pub fn string(name: &'static str) -> Self {
        Self::new(name, FieldKind::String)
    }

    pub fn id(name: &'static str) -> Self {
        Self::new(name, FieldKind::Id)
    }

    pub fn slug(name: &'static str) -> Self {
        Self::new(name, FieldKind::Slug)
    }

    pub fn integer(name: &'static str) -> Self {
        Self::new(name, FieldKind::Integer { min: None, max: None })
    }

    pub fn bounded(name: &'static str, min: i64, max: i64) -> Self {
        Self::new(
            name,
            FieldKind::Integer {
                min: Some(min),
                max: Some(max),
            },
        )
    }

    pub fn boolean(name: &'static str) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    pub fn one_of(name: &'static str, values: &'static [&'static str]) -> Self {
        Self::new(name, FieldKind::Enum(values))
    }

    pub fn date(name: &'static str) -> Self {
        Self::new(name, FieldKind::Date)
    }

    pub fn string_map(name: &'static str) -> Self {
        Self::new(name, FieldKind::StringMap)
    }

    pub fn object(name: &'static str) -> Self {
        Self::new(name, FieldKind::Object)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub fn json_schema(&self) -> Value {
        let mut schema = self.kind.json_schema();
        if !self.description.is_empty() {
            schema["description"] = json!(self.description);
        }
        schema
    }
}
