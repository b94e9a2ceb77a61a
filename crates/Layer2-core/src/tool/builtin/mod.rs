//! Builtin Tools - 기능 영역별 도구
//!
//! 영역마다 query 도구(`browse_*`, 읽기 전용)와 command 도구(`manage_*`)가 한 쌍입니다.
//!
//! | 영역         | query                 | command              | gate                        |
//! |--------------|-----------------------|----------------------|-----------------------------|
//! | projects     | `browse_projects`     | `manage_project`     | -                           |
//! | members      | `browse_members`      | `manage_member`      | -                           |
//! | pipelines    | `browse_pipelines`    | `manage_pipeline`    | `USE_PIPELINE` (기본 on)    |
//! | integrations | `browse_integrations` | `manage_integration` | `USE_INTEGRATIONS` (기본 off)|

pub mod integrations;
pub mod members;
pub mod pipelines;
pub mod projects;

use super::context::ToolContext;
use super::registry::ToolRegistry;
use crate::api::ApiRequest;
use crate::schema::FieldSpec;

/// 모든 기능 영역 레지스트리 생성
pub fn all_registries(ctx: &ToolContext) -> Vec<ToolRegistry> {
    vec![
        projects::registry(ctx),
        members::registry(ctx),
        pipelines::registry(ctx),
        integrations::registry(ctx),
    ]
}

// ============================================================================
// 공통 필드
// ============================================================================

pub(crate) fn project_id() -> FieldSpec {
    FieldSpec::id("project_id")
        .required()
        .describe("Project ID or URL-encoded path (e.g. 42 or group/project)")
}

pub(crate) fn group_id() -> FieldSpec {
    FieldSpec::id("group_id")
        .required()
        .describe("Group ID or full path")
}

pub(crate) fn user_id() -> FieldSpec {
    FieldSpec::id("user_id").required().describe("User ID")
}

pub(crate) fn pagination() -> [FieldSpec; 2] {
    [
        FieldSpec::bounded("per_page", 1, 100).describe("Results per page (1-100)"),
        FieldSpec::bounded("page", 1, 10_000).describe("Page number, starting at 1"),
    ]
}

pub(crate) const VISIBILITY: &[&str] = &["private", "internal", "public"];

/// 페이지 파라미터 추가
pub(crate) fn paginate(request: ApiRequest, per_page: Option<u32>, page: Option<u32>) -> ApiRequest {
    request.param_opt("per_page", per_page).param_opt("page", page)
}
