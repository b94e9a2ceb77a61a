//! Policy gate - 런타임 action 거부 판정
//!
//! 여러 출처의 [`PolicyLayer`]를 scope 순서로 쌓고, 호출마다
//! `(tool, action)`이 거부되는지 판정합니다.
//!
//! 판정 규칙:
//! 1. 가장 구체적인 scope(Project > Environment > Global > Preset)부터 확인
//! 2. 매칭 규칙이 있는 첫 scope가 결정
//! 3. 같은 scope 안에서는 action 규칙이 도구 전체 규칙보다 우선, 동률이면 deny 우선
//! 4. 어떤 규칙도 매칭되지 않으면 허용

use super::presets;
use super::rule::PolicyRule;
use super::settings::{PolicyLayer, PolicyScope};
use crate::env::EnvSnapshot;
use crate::storage::JsonStore;
use crate::Result;
use parking_lot::RwLock;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

// ============================================================================
// ActionPolicy - 불변 정책 스냅샷
// ============================================================================

/// scope가 붙은 정책 레이어
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScopedLayer {
    pub scope: PolicyScope,
    #[serde(flatten)]
    pub layer: PolicyLayer,
}

/// 판정 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyDecision {
    pub denied: bool,
    /// 결정한 scope (기본 허용이면 None)
    pub scope: Option<PolicyScope>,
    /// 결정한 규칙
    pub rule: Option<PolicyRule>,
}

impl PolicyDecision {
    fn default_allow() -> Self {
        Self {
            denied: false,
            scope: None,
            rule: None,
        }
    }
}

/// 해석이 끝난 정책 (scope 오름차순 레이어 목록)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActionPolicy {
    #[serde(skip_serializing_if = "Option::is_none")]
    preset: Option<String>,
    layers: Vec<ScopedLayer>,
}

impl ActionPolicy {
    /// 아무것도 거부하지 않는 정책
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// 레이어 목록으로 정책 구성
    ///
    /// 프리셋은 가장 구체적인 레이어가 지정한 것 하나만 적용됩니다.
    /// 알 수 없는 프리셋 이름은 에러입니다.
    pub fn from_layers<I>(layers: I) -> Result<Self>
    where
        I: IntoIterator<Item = (PolicyScope, PolicyLayer)>,
    {
        let mut layers: Vec<ScopedLayer> = layers
            .into_iter()
            .filter(|(scope, _)| *scope != PolicyScope::Preset)
            .map(|(scope, layer)| ScopedLayer { scope, layer })
            .collect();
        layers.sort_by_key(|l| l.scope);

        let preset = layers.iter().rev().find_map(|l| l.layer.preset.clone());
        if let Some(name) = &preset {
            let preset_layer = presets::resolve(name)?;
            layers.insert(
                0,
                ScopedLayer {
                    scope: PolicyScope::Preset,
                    layer: preset_layer,
                },
            );
        }

        Ok(Self { preset, layers })
    }

    pub fn preset(&self) -> Option<&str> {
        self.preset.as_deref()
    }

    pub fn layers(&self) -> &[ScopedLayer] {
        &self.layers
    }

    /// 프리셋 레이어를 제외한 원본 레이어
    fn configured_layers(&self) -> impl Iterator<Item = (PolicyScope, PolicyLayer)> + '_ {
        self.layers
            .iter()
            .filter(|l| l.scope != PolicyScope::Preset)
            .map(|l| (l.scope, l.layer.clone()))
    }

    pub fn decide(&self, tool: &str, action: &str) -> PolicyDecision {
        for scoped in self.layers.iter().rev() {
            let denies = scoped.layer.deny.iter().map(|r| (r, true));
            let allows = scoped.layer.allow.iter().map(|r| (r, false));

            let mut best: Option<(&PolicyRule, bool)> = None;
            for (rule, deny) in denies.chain(allows) {
                if !rule.matches(tool, action) {
                    continue;
                }
                best = match best {
                    Some((current, current_deny))
                        if current.specificity() > rule.specificity()
                            || (current.specificity() == rule.specificity() && current_deny) =>
                    {
                        Some((current, current_deny))
                    }
                    _ => Some((rule, deny)),
                };
            }

            if let Some((rule, deny)) = best {
                return PolicyDecision {
                    denied: deny,
                    scope: Some(scoped.scope),
                    rule: Some(rule.clone()),
                };
            }
        }
        PolicyDecision::default_allow()
    }

    pub fn is_denied(&self, tool: &str, action: &str) -> bool {
        self.decide(tool, action).denied
    }
}

// ============================================================================
// PolicyGate - 교체 가능한 공유 정책
// ============================================================================

/// 동시 호출에서 공유되는 정책 게이트
///
/// 판정은 read lock만 잡고, `replace`/`load_project`는 write lock으로
/// 정책 전체를 원자적으로 교체합니다.
#[derive(Debug, Default)]
pub struct PolicyGate {
    policy: RwLock<ActionPolicy>,
}

impl PolicyGate {
    pub fn new(policy: ActionPolicy) -> Self {
        Self {
            policy: RwLock::new(policy),
        }
    }

    pub fn allow_all() -> Self {
        Self::new(ActionPolicy::allow_all())
    }

    /// 글로벌 파일 + 환경 변수 + 프로젝트 파일에서 로드
    pub fn load(env: &EnvSnapshot, project_dir: Option<&Path>) -> Result<Self> {
        Self::load_with(JsonStore::global().ok().as_ref(), env, project_dir)
    }

    /// 글로벌 저장소를 직접 지정해서 로드
    pub fn load_with(
        global: Option<&JsonStore>,
        env: &EnvSnapshot,
        project_dir: Option<&Path>,
    ) -> Result<Self> {
        let mut layers = Vec::new();

        if let Some(global) = global.map(PolicyLayer::load_from).transpose()?.flatten() {
            layers.push((PolicyScope::Global, global));
        }
        if let Some(from_env) = PolicyLayer::from_env(env)? {
            layers.push((PolicyScope::Environment, from_env));
        }
        if let Some(dir) = project_dir {
            if let Some(project) = PolicyLayer::load_project(dir)? {
                layers.push((PolicyScope::Project, project));
            }
        }

        let policy = ActionPolicy::from_layers(layers)?;
        info!(
            "Policy loaded: {} layer(s), preset {:?}",
            policy.layers().len(),
            policy.preset()
        );
        Ok(Self::new(policy))
    }

    pub fn decide(&self, tool: &str, action: &str) -> PolicyDecision {
        self.policy.read().decide(tool, action)
    }

    pub fn is_denied(&self, tool: &str, action: &str) -> bool {
        self.policy.read().is_denied(tool, action)
    }

    /// 정책 전체 교체
    pub fn replace(&self, policy: ActionPolicy) {
        *self.policy.write() = policy;
        debug!("Policy replaced");
    }

    /// 프로젝트 레이어만 다시 읽어 교체
    ///
    /// 파일이 없으면 프로젝트 레이어가 제거됩니다. 파일이 깨져 있으면
    /// 기존 정책을 그대로 유지하고 에러를 반환합니다.
    pub fn load_project(&self, project_dir: &Path) -> Result<()> {
        let project = PolicyLayer::load_project(project_dir)?;

        let mut guard = self.policy.write();
        let mut layers: Vec<_> = guard
            .configured_layers()
            .filter(|(scope, _)| *scope != PolicyScope::Project)
            .collect();
        if let Some(layer) = project {
            layers.push((PolicyScope::Project, layer));
        }
        *guard = ActionPolicy::from_layers(layers)?;

        info!("Project policy reloaded from {}", project_dir.display());
        Ok(())
    }

    /// 현재 정책 스냅샷
    pub fn describe(&self) -> ActionPolicy {
        self.policy.read().clone()
    }
}
