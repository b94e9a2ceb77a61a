//! 내장 정책 프리셋
//!
//! - `full` - 아무것도 거부하지 않음
//! - `readonly` - 모든 command 도구(`manage_*`) 거부
//! - `safe` - 파괴적인 action만 거부

use super::rule::PolicyRule;
use super::settings::PolicyLayer;
use crate::{Error, Result};

pub const PRESET_FULL: &str = "full";
pub const PRESET_READONLY: &str = "readonly";
pub const PRESET_SAFE: &str = "safe";

/// 사용 가능한 프리셋 이름
pub fn names() -> &'static [&'static str] {
    &[PRESET_FULL, PRESET_READONLY, PRESET_SAFE]
}

/// 프리셋 이름으로 레이어 생성
pub fn resolve(name: &str) -> Result<PolicyLayer> {
    let layer = match name.trim().to_ascii_lowercase().as_str() {
        PRESET_FULL => PolicyLayer::new(),
        PRESET_READONLY => PolicyLayer::new().deny(PolicyRule::tool("manage_*")),
        PRESET_SAFE => PolicyLayer::new()
            .deny(PolicyRule::action("*", "delete"))
            .deny(PolicyRule::action("*", "remove_*"))
            .deny(PolicyRule::action("manage_project", "transfer"))
            .deny(PolicyRule::action("manage_integration", "disable")),
        _ => return Err(Error::UnknownPreset(name.to_string())),
    };
    Ok(layer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_names_resolve() {
        for name in names() {
            assert!(resolve(name).is_ok(), "preset {} should resolve", name);
        }
        assert!(resolve("READONLY").is_ok());
    }

    #[test]
    fn test_unknown_preset() {
        assert!(matches!(resolve("yolo"), Err(Error::UnknownPreset(_))));
    }

    #[test]
    fn test_safe_preset_rules() {
        let safe = resolve(PRESET_SAFE).unwrap();
        let denies = |tool: &str, action: &str| safe.deny.iter().any(|r| r.matches(tool, action));

        assert!(denies("manage_project", "delete"));
        assert!(denies("manage_member", "remove_from_group"));
        assert!(!denies("manage_project", "create"));
        assert!(!denies("browse_projects", "get"));
    }
}
