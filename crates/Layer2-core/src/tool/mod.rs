//! Tool System - 기능 영역별 도구 등록과 호출
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  ToolCatalog                                                │
//! │  ├── list_tools() - gate/읽기 전용/정책을 반영한 목록       │
//! │  └── call_tool(name, args) - 노출된 도구만 호출             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ToolRegistry (기능 영역당 하나)                            │
//! │  ├── register(definition)                                   │
//! │  ├── mark_read_only(name)                                   │
//! │  └── check_invariants()                                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ToolDefinition = name + description + ToolSchema + handler │
//! │  └── Dispatcher<H: ActionHandler>                           │
//! │      validate → policy → decode → handle → strip_links      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ToolContext: ServerConfig + ApiClient + PolicyGate         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 사용법
//!
//! ```ignore
//! use labforge_core::tool::{ToolCatalog, ToolContext};
//!
//! let ctx = ToolContext::new(config, api, policy);
//! let catalog = ToolCatalog::with_builtins(&ctx, env);
//!
//! let tools = catalog.list_tools();
//! let project = catalog
//!     .call_tool("browse_projects", json!({"action": "get", "project_id": 123}))
//!     .await?;
//! ```

pub mod builtin;
mod catalog;
mod context;
mod definition;
mod registry;

// Re-exports: Catalog
pub use catalog::{CatalogEntry, ToolCatalog};

// Re-exports: Context
pub use context::ToolContext;

// Re-exports: Definition
pub use definition::{ActionHandler, Dispatcher, ToolDefinition, ToolGate, ToolHandler};

// Re-exports: Registry
pub use registry::{InvariantViolation, ToolRegistry};
