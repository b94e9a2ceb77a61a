//! Members - 프로젝트/그룹 멤버 조회 및 관리
//!
//! 멤버 API는 프로젝트와 그룹이 같은 모양이라 `MemberSource`로 경로만 바꿉니다.

use super::projects::insert_opt;
use super::{group_id, paginate, pagination, project_id, user_id};
use crate::api::{ApiPath, ApiRequest};
use crate::schema::{ActionSchema, FieldSpec, ToolSchema};
use crate::shape;
use crate::tool::context::ToolContext;
use crate::tool::definition::{ActionHandler, ToolDefinition};
use crate::tool::registry::ToolRegistry;
use crate::ToolError;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};

pub const BROWSE_MEMBERS: &str = "browse_members";
pub const MANAGE_MEMBER: &str = "manage_member";

const ACCESS_LEVELS: &[&str] = &["guest", "reporter", "developer", "maintainer", "owner"];

pub fn registry(ctx: &ToolContext) -> ToolRegistry {
    let mut registry = ToolRegistry::new("members");
    registry.register(ToolDefinition::dispatch(
        BROWSE_MEMBERS,
        "List or inspect members of a project or group, optionally including inherited members",
        browse_schema(),
        ctx,
        BrowseMembers,
    ));
    registry.register(ToolDefinition::dispatch(
        MANAGE_MEMBER,
        "Add, update or remove a member of a project or group",
        manage_schema(),
        ctx,
        ManageMember,
    ));
    registry.with_read_only([BROWSE_MEMBERS])
}

/// GitLab 권한 이름 → 숫자 레벨
pub fn access_level_value(name: &str) -> Option<u32> {
    match name {
        "guest" => Some(10),
        "reporter" => Some(20),
        "developer" => Some(30),
        "maintainer" => Some(40),
        "owner" => Some(50),
        _ => None,
    }
}

enum MemberSource<'a> {
    Project(&'a str),
    Group(&'a str),
}

impl MemberSource<'_> {
    fn members(&self, inherited: bool) -> ApiPath {
        let base = match self {
            Self::Project(id) => ApiPath::new("projects").id(id),
            Self::Group(id) => ApiPath::new("groups").id(id),
        };
        if inherited {
            base.push("members/all")
        } else {
            base.push("members")
        }
    }

    fn member(&self, user_id: &str, inherited: bool) -> ApiPath {
        self.members(inherited).id(user_id)
    }
}

// ============================================================================
// browse_members
// ============================================================================

fn inherited() -> FieldSpec {
    FieldSpec::boolean("inherited").describe("Include members inherited from parent groups")
}

fn list_fields() -> Vec<FieldSpec> {
    let mut fields = vec![
        FieldSpec::string("query").describe("Filter by name or username"),
        inherited(),
    ];
    fields.extend(pagination());
    fields
}

pub fn browse_schema() -> ToolSchema {
    ToolSchema::new(vec![
        ActionSchema::query("list_project", "List members of a project")
            .field(project_id())
            .fields(list_fields()),
        ActionSchema::query("list_group", "List members of a group")
            .field(group_id())
            .fields(list_fields()),
        ActionSchema::query("get_project", "Get one project member")
            .field(project_id())
            .field(user_id())
            .field(inherited()),
        ActionSchema::query("get_group", "Get one group member")
            .field(group_id())
            .field(user_id())
            .field(inherited()),
    ])
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum BrowseMembersAction {
    ListProject {
        project_id: String,
        #[serde(flatten)]
        filter: ListFilter,
    },
    ListGroup {
        group_id: String,
        #[serde(flatten)]
        filter: ListFilter,
    },
    GetProject {
        project_id: String,
        user_id: String,
        inherited: Option<bool>,
    },
    GetGroup {
        group_id: String,
        user_id: String,
        inherited: Option<bool>,
    },
}

#[derive(Debug, Deserialize)]
pub struct ListFilter {
    query: Option<String>,
    inherited: Option<bool>,
    per_page: Option<u32>,
    page: Option<u32>,
}

pub struct BrowseMembers;

#[async_trait]
impl ActionHandler for BrowseMembers {
    type Action = BrowseMembersAction;

    async fn handle(&self, action: Self::Action, ctx: &ToolContext) -> Result<Value, ToolError> {
        let request = match action {
            BrowseMembersAction::ListProject { project_id, filter } => {
                list(MemberSource::Project(&project_id), filter)
            }
            BrowseMembersAction::ListGroup { group_id, filter } => {
                list(MemberSource::Group(&group_id), filter)
            }
            BrowseMembersAction::GetProject {
                project_id,
                user_id,
                inherited,
            } => ApiRequest::get(
                MemberSource::Project(&project_id).member(&user_id, inherited.unwrap_or(false)),
            ),
            BrowseMembersAction::GetGroup {
                group_id,
                user_id,
                inherited,
            } => ApiRequest::get(
                MemberSource::Group(&group_id).member(&user_id, inherited.unwrap_or(false)),
            ),
        };
        ctx.api().send(request).await
    }
}

fn list(source: MemberSource<'_>, filter: ListFilter) -> ApiRequest {
    let request = ApiRequest::get(source.members(filter.inherited.unwrap_or(false)))
        .param_opt("query", filter.query);
    paginate(request, filter.per_page, filter.page)
}

// ============================================================================
// manage_member
// ============================================================================

fn grant_fields() -> Vec<FieldSpec> {
    vec![
        user_id(),
        FieldSpec::one_of("access_level", ACCESS_LEVELS)
            .required()
            .describe("Role to grant"),
        FieldSpec::date("expires_at").describe("Membership expiry date (YYYY-MM-DD)"),
    ]
}

pub fn manage_schema() -> ToolSchema {
    ToolSchema::new(vec![
        ActionSchema::command("add_to_project", "Add a user to a project")
            .field(project_id())
            .fields(grant_fields()),
        ActionSchema::command("add_to_group", "Add a user to a group")
            .field(group_id())
            .fields(grant_fields()),
        ActionSchema::command("update_project", "Change a project member's role or expiry")
            .field(project_id())
            .fields(grant_fields()),
        ActionSchema::command("update_group", "Change a group member's role or expiry")
            .field(group_id())
            .fields(grant_fields()),
        ActionSchema::command("remove_from_project", "Remove a user from a project")
            .field(project_id())
            .field(user_id()),
        ActionSchema::command("remove_from_group", "Remove a user from a group")
            .field(group_id())
            .field(user_id()),
    ])
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ManageMemberAction {
    AddToProject {
        project_id: String,
        #[serde(flatten)]
        grant: Grant,
    },
    AddToGroup {
        group_id: String,
        #[serde(flatten)]
        grant: Grant,
    },
    UpdateProject {
        project_id: String,
        #[serde(flatten)]
        grant: Grant,
    },
    UpdateGroup {
        group_id: String,
        #[serde(flatten)]
        grant: Grant,
    },
    RemoveFromProject {
        project_id: String,
        user_id: String,
    },
    RemoveFromGroup {
        group_id: String,
        user_id: String,
    },
}

#[derive(Debug, Deserialize)]
pub struct Grant {
    user_id: String,
    access_level: String,
    expires_at: Option<String>,
}

impl Grant {
    /// 요청 body 구성
    ///
    /// `access_level`은 스키마 enum을 통과한 값이므로 매핑 실패는 dispatch 오류입니다.
    fn body(self, action: &str, include_user: bool) -> Result<Value, ToolError> {
        let level = access_level_value(&self.access_level)
            .ok_or_else(|| ToolError::unreachable(MANAGE_MEMBER, action))?;

        let mut body = Map::new();
        if include_user {
            body.insert("user_id".into(), json!(self.user_id));
        }
        body.insert("access_level".into(), json!(level));
        insert_opt(&mut body, "expires_at", self.expires_at);
        Ok(Value::Object(body))
    }
}

pub struct ManageMember;

#[async_trait]
impl ActionHandler for ManageMember {
    type Action = ManageMemberAction;

    async fn handle(&self, action: Self::Action, ctx: &ToolContext) -> Result<Value, ToolError> {
        let request = match action {
            ManageMemberAction::AddToProject { project_id, grant } => {
                ApiRequest::post(MemberSource::Project(&project_id).members(false))
                    .json(grant.body("add_to_project", true)?)
            }
            ManageMemberAction::AddToGroup { group_id, grant } => {
                ApiRequest::post(MemberSource::Group(&group_id).members(false))
                    .json(grant.body("add_to_group", true)?)
            }
            ManageMemberAction::UpdateProject { project_id, grant } => {
                let path = MemberSource::Project(&project_id).member(&grant.user_id, false);
                ApiRequest::put(path).json(grant.body("update_project", false)?)
            }
            ManageMemberAction::UpdateGroup { group_id, grant } => {
                let path = MemberSource::Group(&group_id).member(&grant.user_id, false);
                ApiRequest::put(path).json(grant.body("update_group", false)?)
            }
            ManageMemberAction::RemoveFromProject {
                project_id,
                user_id,
            } => ApiRequest::delete(MemberSource::Project(&project_id).member(&user_id, false)),
            ManageMemberAction::RemoveFromGroup { group_id, user_id } => {
                ApiRequest::delete(MemberSource::Group(&group_id).member(&user_id, false))
            }
        };
        ctx.api().send(request).await.map(shape::command_ack)
    }
}
