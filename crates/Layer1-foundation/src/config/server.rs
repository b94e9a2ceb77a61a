//! Server Config - 업스트림 API 및 배포 모드 설정
//!
//! 설정 우선순위 (뒤가 앞을 덮어씀):
//!
//! 1. 기본값
//! 2. 글로벌 `config.json` (`<config_dir>/labforge/`)
//! 3. 프로젝트 `config.json` (`.labforge/`)
//! 4. 환경 변수 (`GITLAB_API_URL`, `GITLAB_TOKEN`, ...)
//!
//! 결과물인 [`ServerConfig`]는 시작 시 한 번 만들어지고 이후 불변입니다.

use crate::env::EnvSnapshot;
use crate::storage::JsonStore;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// 설정 파일명
pub const SERVER_CONFIG_FILE: &str = "config.json";

/// 기본 API URL
pub const DEFAULT_API_URL: &str = "https://gitlab.com/api/v4";

/// 기본 요청 타임아웃 (초)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// 기본 job log 크기 제한 (64 KiB)
pub const DEFAULT_JOB_LOG_MAX_BYTES: usize = 64 * 1024;

// Environment variable names
pub const ENV_API_URL: &str = "GITLAB_API_URL";
pub const ENV_TOKEN: &str = "GITLAB_TOKEN";
pub const ENV_READ_ONLY: &str = "GITLAB_READ_ONLY_MODE";
pub const ENV_TIMEOUT_SECS: &str = "GITLAB_TIMEOUT_SECS";

// ============================================================================
// ServerConfigFile - 파일 포맷 (모든 필드 optional)
// ============================================================================

/// `config.json` 파일 구조
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_log_max_bytes: Option<usize>,
}

impl ServerConfigFile {
    /// 다른 설정과 병합 (other가 우선)
    pub fn merge(&mut self, other: ServerConfigFile) {
        if other.api_url.is_some() {
            self.api_url = other.api_url;
        }
        if other.token.is_some() {
            self.token = other.token;
        }
        if other.read_only.is_some() {
            self.read_only = other.read_only;
        }
        if other.timeout_secs.is_some() {
            self.timeout_secs = other.timeout_secs;
        }
        if other.job_log_max_bytes.is_some() {
            self.job_log_max_bytes = other.job_log_max_bytes;
        }
    }

    /// 환경 변수 오버라이드 적용
    pub fn apply_env(&mut self, env: &EnvSnapshot) -> Result<()> {
        if let Some(url) = env.get(ENV_API_URL) {
            self.api_url = Some(url.to_string());
        }
        if let Some(token) = env.get(ENV_TOKEN) {
            self.token = Some(token.to_string());
        }
        if let Some(read_only) = env.flag(ENV_READ_ONLY) {
            self.read_only = Some(read_only);
        }
        if let Some(raw) = env.get(ENV_TIMEOUT_SECS) {
            let secs = raw
                .parse::<u64>()
                .map_err(|_| Error::invalid_env(ENV_TIMEOUT_SECS, raw, "expected whole seconds"))?;
            self.timeout_secs = Some(secs);
        }
        Ok(())
    }
}

// ============================================================================
// ServerConfig - 해석된 불변 설정
// ============================================================================

/// 해석이 끝난 서버 설정
#[derive(Clone, PartialEq)]
pub struct ServerConfig {
    /// API base URL (항상 `/`로 끝남)
    pub api_url: Url,
    /// Personal/project access token
    pub token: Option<String>,
    /// 읽기 전용 배포 모드
    pub read_only: bool,
    /// 업스트림 요청 타임아웃
    pub timeout: Duration,
    /// job log 응답 최대 바이트
    pub job_log_max_bytes: usize,
}

impl ServerConfig {
    /// 파일 + 환경 변수에서 로드
    ///
    /// `project_dir`가 주어지면 해당 디렉토리의 `.labforge/config.json`도 읽습니다.
    pub fn load(env: &EnvSnapshot, project_dir: Option<&Path>) -> Result<Self> {
        Self::load_with(JsonStore::global().ok().as_ref(), env, project_dir)
    }

    /// 글로벌 저장소를 직접 지정해서 로드
    pub fn load_with(
        global: Option<&JsonStore>,
        env: &EnvSnapshot,
        project_dir: Option<&Path>,
    ) -> Result<Self> {
        let mut file = ServerConfigFile::default();

        // 1. 글로벌 설정
        if let Some(global) = global {
            if let Some(global_config) =
                global.load_optional::<ServerConfigFile>(SERVER_CONFIG_FILE)?
            {
                debug!("Loaded global config from {}", global.base_dir().display());
                file.merge(global_config);
            }
        }

        // 2. 프로젝트 설정
        if let Some(dir) = project_dir {
            let project = JsonStore::project(dir);
            if let Some(project_config) =
                project.load_optional::<ServerConfigFile>(SERVER_CONFIG_FILE)?
            {
                debug!("Loaded project config from {}", project.base_dir().display());
                file.merge(project_config);
            }
        }

        // 3. 환경 변수
        file.apply_env(env)?;

        Self::resolve(file)
    }

    /// 환경 변수만으로 생성 (파일 무시)
    pub fn from_env(env: &EnvSnapshot) -> Result<Self> {
        let mut file = ServerConfigFile::default();
        file.apply_env(env)?;
        Self::resolve(file)
    }

    /// 파일 포맷을 검증하고 기본값을 채움
    pub fn resolve(file: ServerConfigFile) -> Result<Self> {
        let raw_url = file.api_url.as_deref().unwrap_or(DEFAULT_API_URL);
        let api_url = parse_api_url(raw_url)?;

        let timeout_secs = file.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(Error::Config("timeoutSecs must be greater than zero".into()));
        }

        Ok(Self {
            api_url,
            token: file.token.filter(|t| !t.trim().is_empty()),
            read_only: file.read_only.unwrap_or(false),
            timeout: Duration::from_secs(timeout_secs),
            job_log_max_bytes: file.job_log_max_bytes.unwrap_or(DEFAULT_JOB_LOG_MAX_BYTES),
        })
    }

    // ========================================================================
    // Builder
    // ========================================================================

    /// 기본값으로 생성 (URL만 지정)
    pub fn new(api_url: Url) -> Self {
        Self {
            api_url,
            token: None,
            read_only: false,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            job_log_max_bytes: DEFAULT_JOB_LOG_MAX_BYTES,
        }
    }

    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_job_log_max_bytes(mut self, max: usize) -> Self {
        self.job_log_max_bytes = max;
        self
    }
}

// 토큰은 로그에 남지 않도록 가림
impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("api_url", &self.api_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("read_only", &self.read_only)
            .field("timeout", &self.timeout)
            .field("job_log_max_bytes", &self.job_log_max_bytes)
            .finish()
    }
}

/// API URL 파싱 (http/https만 허용, 끝에 `/` 보장)
fn parse_api_url(raw: &str) -> Result<Url> {
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{}/", raw)
    };
    let url = Url::parse(&normalized)?;
    if !["http", "https"].contains(&url.scheme()) {
        return Err(Error::Config(format!(
            "apiUrl must use http or https, got: {}",
            url.scheme()
        )));
    }
    Ok(url)
}
