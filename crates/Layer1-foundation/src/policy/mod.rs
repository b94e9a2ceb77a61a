//! Policy - action 단위 거부 정책
//!
//! - `rule` - `tool` / `tool:action` 패턴
//! - `settings` - 정책 레이어 (JSON 파일, 환경 변수)
//! - `presets` - 내장 프리셋 (full, readonly, safe)
//! - `service` - 런타임 게이트 (교체 가능)

pub mod presets;
mod rule;
mod service;
mod settings;

pub use rule::PolicyRule;
pub use service::{ActionPolicy, PolicyDecision, PolicyGate, ScopedLayer};
pub use settings::{
    PolicyLayer, PolicyScope, ENV_POLICY_ALLOW, ENV_POLICY_DENY, ENV_POLICY_PRESET, POLICY_FILE,
};
