//! Storage module for Labforge
//!
//! - `json`: JSON - 글로벌/프로젝트 설정 파일 저장/로드

mod json;

// JSON Storage (범용)
pub use json::{JsonStore, APP_DIR_NAME, PROJECT_DIR_NAME};
