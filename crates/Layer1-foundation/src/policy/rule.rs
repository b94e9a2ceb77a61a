//! Policy rule - `tool` 또는 `tool:action` 패턴
//!
//! 각 부분은 끝에 `*`를 붙여 prefix 와일드카드로 쓸 수 있습니다.
//!
//! | 규칙                         | 의미                                 |
//! |------------------------------|--------------------------------------|
//! | `manage_project`             | manage_project의 모든 action         |
//! | `manage_project:delete`      | manage_project의 delete만            |
//! | `manage_*`                   | manage_로 시작하는 모든 도구         |
//! | `*:delete`                   | 모든 도구의 delete                   |
//! | `manage_member:remove_*`     | remove_로 시작하는 action            |

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 거부/허용 규칙
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PolicyRule {
    tool: String,
    action: Option<String>,
}

impl PolicyRule {
    /// 도구 전체 규칙
    pub fn tool(tool: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            action: None,
        }
    }

    /// 특정 action 규칙
    pub fn action(tool: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            action: Some(action.into()),
        }
    }

    pub fn tool_pattern(&self) -> &str {
        &self.tool
    }

    pub fn action_pattern(&self) -> Option<&str> {
        self.action.as_deref()
    }

    /// action까지 지정한 규칙이 도구 전체 규칙보다 우선
    pub fn specificity(&self) -> u8 {
        if self.action.is_some() {
            2
        } else {
            1
        }
    }

    pub fn matches(&self, tool: &str, action: &str) -> bool {
        if !pattern_matches(&self.tool, tool) {
            return false;
        }
        match &self.action {
            Some(pattern) => pattern_matches(pattern, action),
            None => true,
        }
    }
}

fn pattern_matches(pattern: &str, value: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => value.starts_with(prefix),
        None => pattern == value,
    }
}

fn validate_part(part: &str, raw: &str) -> Result<(), Error> {
    if part.is_empty() {
        return Err(Error::Policy(format!("empty segment in rule '{}'", raw)));
    }
    let body = part.strip_suffix('*').unwrap_or(part);
    if body.contains('*') {
        return Err(Error::Policy(format!(
            "wildcard is only allowed at the end of a segment: '{}'",
            raw
        )));
    }
    if !body
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(Error::Policy(format!("invalid characters in rule '{}'", raw)));
    }
    Ok(())
}

impl FromStr for PolicyRule {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        match raw.split_once(':') {
            Some((tool, action)) => {
                validate_part(tool, raw)?;
                validate_part(action, raw)?;
                Ok(Self::action(tool, action))
            }
            None => {
                validate_part(raw, raw)?;
                Ok(Self::tool(raw))
            }
        }
    }
}

impl TryFrom<String> for PolicyRule {
    type Error = Error;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl From<PolicyRule> for String {
    fn from(rule: PolicyRule) -> Self {
        rule.to_string()
    }
}

impl fmt::Display for PolicyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.action {
            Some(action) => write!(f, "{}:{}", self.tool, action),
            None => write!(f, "{}", self.tool),
        }
    }
}
