//! Tool Context - 핸들러가 공유하는 읽기 전용 런타임
//!
//! 시작 시 한 번 만들어져 모든 도구에 `Clone`으로 전달됩니다.
//! 핸들러는 환경 변수를 직접 읽지 않고 이 컨텍스트만 사용합니다.
//!
//! ```ignore
//! let config = Arc::new(ServerConfig::load(&env, Some(&cwd))?);
//! let api: Arc<dyn ApiClient> = Arc::new(HttpApiClient::new(&config)?);
//! let policy = Arc::new(PolicyGate::load(&env, Some(&cwd))?);
//! let ctx = ToolContext::new(config, api, policy);
//! ```

use crate::api::ApiClient;
use labforge_foundation::{PolicyGate, ServerConfig};
use std::fmt;
use std::sync::Arc;

#[derive(Clone)]
pub struct ToolContext {
    config: Arc<ServerConfig>,
    api: Arc<dyn ApiClient>,
    policy: Arc<PolicyGate>,
}

impl ToolContext {
    pub fn new(config: Arc<ServerConfig>, api: Arc<dyn ApiClient>, policy: Arc<PolicyGate>) -> Self {
        Self {
            config,
            api,
            policy,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn shared_config(&self) -> Arc<ServerConfig> {
        Arc::clone(&self.config)
    }

    pub fn api(&self) -> &dyn ApiClient {
        self.api.as_ref()
    }

    pub fn policy(&self) -> &PolicyGate {
        &self.policy
    }

    pub fn shared_policy(&self) -> Arc<PolicyGate> {
        Arc::clone(&self.policy)
    }
}

impl fmt::Debug for ToolContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
