//! Environment Snapshot - 환경 변수 스냅샷
//!
//! 프로세스 시작 시 한 번만 환경 변수를 읽어 불변 스냅샷으로 보관합니다.
//! 도구 핸들러는 환경 변수를 직접 읽지 않고, 이 스냅샷에서 파생된 설정만 사용합니다.
//!
//! ```ignore
//! let env = EnvSnapshot::capture();
//! if env.flag("USE_PIPELINE").unwrap_or(true) {
//!     // 파이프라인 도구 노출
//! }
//! ```

use std::collections::HashMap;
use tracing::warn;

/// 불변 환경 변수 스냅샷
#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    /// 현재 프로세스 환경 캡처
    pub fn capture() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    /// 빈 스냅샷 (테스트용)
    pub fn empty() -> Self {
        Self::default()
    }

    /// 명시적인 (key, value) 쌍으로 생성
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// 값 조회 (빈 문자열은 unset 취급)
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// boolean 플래그 조회
    ///
    /// 해석 불가능한 값은 unset으로 취급합니다.
    pub fn flag(&self, name: &str) -> Option<bool> {
        let raw = self.get(name)?;
        let parsed = parse_flag(raw);
        if parsed.is_none() {
            warn!("Ignoring unparsable boolean {}={:?}", name, raw);
        }
        parsed
    }

    /// 쉼표로 구분된 목록 조회
    pub fn list(&self, name: &str) -> Vec<String> {
        self.get(name)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

/// "1/true/yes/on" 및 "0/false/no/off" 해석 (대소문자 무시)
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
