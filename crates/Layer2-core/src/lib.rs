//! labforge-core: GitLab 도구 레지스트리와 action 디스패치
//!
//! Layer2 - 도구 정의, 스키마 검증, 업스트림 호출
//!
//! # 주요 모듈
//!
//! - `schema`: 선언적 action 스키마, 입력 검증, JSON Schema 생성
//! - `tool`: 도구 정의, 기능 영역별 레지스트리, 카탈로그
//! - `api`: 업스트림 REST client (`ApiClient` trait, reqwest 구현, mock)
//! - `shape`: 응답 후처리 (`_links` 제거, job log 정리)
//!
//! # 사용 예시
//!
//! ```ignore
//! use labforge_core::{HttpApiClient, ToolCatalog, ToolContext};
//! use labforge_foundation::{EnvSnapshot, PolicyGate, ServerConfig};
//!
//! let env = EnvSnapshot::capture();
//! let config = Arc::new(ServerConfig::load(&env, None)?);
//! let policy = Arc::new(PolicyGate::load(&env, None)?);
//! let api = Arc::new(HttpApiClient::new(&config)?);
//!
//! let ctx = ToolContext::new(config, api, policy);
//! let catalog = ToolCatalog::with_builtins(&ctx, env);
//!
//! let result = catalog
//!     .call_tool("browse_projects", json!({"action": "search", "q": "topic:devops"}))
//!     .await?;
//! ```

pub mod api;
mod error;
pub mod schema;
pub mod shape;
pub mod tool;

// Re-exports: Error
pub use error::{InvocationStage, ToolError};

// Re-exports: API
pub use api::{ApiClient, ApiPath, ApiRequest, HttpApiClient, Method, MockApiClient};

// Re-exports: Schema
pub use schema::{ActionSchema, FieldKind, FieldSpec, ParsedAction, ToolSchema};

// Re-exports: Tool
pub use tool::{
    ActionHandler, CatalogEntry, InvariantViolation, ToolCatalog, ToolContext, ToolDefinition,
    ToolGate, ToolRegistry,
};

/// Layer2 버전
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
