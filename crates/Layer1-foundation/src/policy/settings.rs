//! Policy 설정 저장/로드
//!
//! 정책 레이어는 여러 출처에서 옵니다:
//!
//! - Global: `<config_dir>/labforge/policy.json`
//! - Environment: `LABFORGE_POLICY_PRESET`, `LABFORGE_DENY`, `LABFORGE_ALLOW`
//! - Project: `<project>/.labforge/policy.json`

use super::rule::PolicyRule;
use crate::env::EnvSnapshot;
use crate::storage::JsonStore;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// 설정 파일명
pub const POLICY_FILE: &str = "policy.json";

pub const ENV_POLICY_PRESET: &str = "LABFORGE_POLICY_PRESET";
pub const ENV_POLICY_DENY: &str = "LABFORGE_DENY";
pub const ENV_POLICY_ALLOW: &str = "LABFORGE_ALLOW";

/// 정책 출처 (뒤로 갈수록 구체적 = 우선)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyScope {
    /// 내장 프리셋 (전역 기본값)
    Preset,
    /// 글로벌 설정 파일
    Global,
    /// 환경 변수
    Environment,
    /// 프로젝트 로컬 설정 파일
    Project,
}

impl fmt::Display for PolicyScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Preset => "preset",
            Self::Global => "global",
            Self::Environment => "environment",
            Self::Project => "project",
        };
        f.write_str(name)
    }
}

/// 정책 레이어 (policy.json 파일 구조)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyLayer {
    /// 사용할 프리셋 이름
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,

    /// 거부 규칙
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deny: Vec<PolicyRule>,

    /// 허용 규칙 (덜 구체적인 레이어의 거부를 덮어씀)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allow: Vec<PolicyRule>,
}

impl PolicyLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deny(mut self, rule: PolicyRule) -> Self {
        self.deny.push(rule);
        self
    }

    pub fn allow(mut self, rule: PolicyRule) -> Self {
        self.allow.push(rule);
        self
    }

    pub fn preset(mut self, name: impl Into<String>) -> Self {
        self.preset = Some(name.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.preset.is_none() && self.deny.is_empty() && self.allow.is_empty()
    }

    /// 주어진 저장소에서 로드 (없으면 None)
    pub fn load_from(store: &JsonStore) -> Result<Option<Self>> {
        store.load_optional(POLICY_FILE)
    }

    /// 프로젝트 설정 로드 (없으면 None)
    pub fn load_project(project_dir: &Path) -> Result<Option<Self>> {
        Self::load_from(&JsonStore::project(project_dir))
    }

    /// 프로젝트 설정 저장
    pub fn save_project(&self, project_dir: &Path) -> Result<()> {
        JsonStore::project(project_dir).save(POLICY_FILE, self)
    }

    /// 환경 변수에서 레이어 구성
    pub fn from_env(env: &EnvSnapshot) -> Result<Option<Self>> {
        let mut layer = Self::new();
        layer.preset = env.get(ENV_POLICY_PRESET).map(String::from);
        for raw in env.list(ENV_POLICY_DENY) {
            layer.deny.push(raw.parse()?);
        }
        for raw in env.list(ENV_POLICY_ALLOW) {
            layer.allow.push(raw.parse()?);
        }
        Ok((!layer.is_empty()).then_some(layer))
    }
}
