//! # labforge-foundation
//!
//! Foundation layer for Labforge:
//! - Env: 프로세스 시작 시 캡처한 환경 변수 스냅샷
//! - Config: 업스트림 API / 배포 모드 설정 (ServerConfig)
//! - Policy: action 단위 거부 정책 (PolicyGate)
//! - Storage: JsonStore (글로벌 + 프로젝트 설정 파일)
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  EnvSnapshot ──┬──► ServerConfig (apiUrl, token, ...)   │
//! │                ├──► ToolGate (USE_PIPELINE, ...)        │
//! │                └──► PolicyGate                          │
//! │                        ▲                                │
//! │   JsonStore ───────────┘  (policy.json, config.json)    │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod env;
pub mod error;
pub mod policy;
pub mod storage;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Env (환경 변수 스냅샷)
// ============================================================================
pub use env::{parse_flag, EnvSnapshot};

// ============================================================================
// Config (설정)
// ============================================================================
pub use config::{
    ServerConfig, ServerConfigFile, DEFAULT_API_URL, DEFAULT_JOB_LOG_MAX_BYTES,
    DEFAULT_TIMEOUT_SECS, SERVER_CONFIG_FILE,
};

// ============================================================================
// Policy (정책)
// ============================================================================
pub use policy::{
    presets as policy_presets, ActionPolicy, PolicyDecision, PolicyGate, PolicyLayer, PolicyRule,
    PolicyScope, ScopedLayer, POLICY_FILE,
};

// ============================================================================
// Storage (저장소)
// ============================================================================
pub use storage::{JsonStore, APP_DIR_NAME, PROJECT_DIR_NAME};
