//! Config - 통합 설정 관리
//!
//! - `server.rs` - ServerConfig (API URL, 토큰, 읽기 전용 모드)

mod server;

pub use server::{
    ServerConfig, ServerConfigFile, DEFAULT_API_URL, DEFAULT_JOB_LOG_MAX_BYTES,
    DEFAULT_TIMEOUT_SECS, ENV_API_URL, ENV_READ_ONLY, ENV_TIMEOUT_SECS, ENV_TOKEN,
    SERVER_CONFIG_FILE,
};
