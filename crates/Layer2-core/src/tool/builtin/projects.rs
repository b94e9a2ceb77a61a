//! Projects - 프로젝트 검색/조회 및 관리
//!
//! - `browse_projects`: search, list, get
//! - `manage_project`: create, update, delete, fork, archive, unarchive, transfer

use super::{paginate, pagination, project_id, VISIBILITY};
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

pub const BROWSE_PROJECTS: &str = "browse_projects";
pub const MANAGE_PROJECT: &str = "manage_project";

const ORDER_BY: &[&str] = &[
    "id",
    "name",
    "path",
    "created_at",
    "updated_at",
    "last_activity_at",
];
const SORT: &[&str] = &["asc", "desc"];

pub fn registry(ctx: &ToolContext) -> ToolRegistry {
    let mut registry = ToolRegistry::new("projects");
    registry.register(ToolDefinition::dispatch(
        BROWSE_PROJECTS,
        "Find and inspect projects: search by text and filters, list by group or membership, get one project",
        browse_schema(),
        ctx,
        BrowseProjects,
    ));
    registry.register(ToolDefinition::dispatch(
        MANAGE_PROJECT,
        "Create, update, delete, fork, archive, unarchive or transfer a project",
        manage_schema(),
        ctx,
        ManageProject,
    ));
    registry.with_read_only([BROWSE_PROJECTS])
}

// ============================================================================
// browse_projects
// ============================================================================

pub fn browse_schema() -> ToolSchema {
    ToolSchema::new(vec![
        ActionSchema::query("search", "Search projects by text; supports topic:, language: and visibility: tokens")
            .field(
                FieldSpec::string("q")
                    .required()
                    .describe("Search text, e.g. 'topic:devops language:rust deploy'. Quote phrases with \"...\""),
            )
            .field(FieldSpec::one_of("visibility", VISIBILITY))
            .field(FieldSpec::boolean("archived"))
            .fields(pagination()),
        ActionSchema::query("list", "List projects, optionally within a group")
            .field(FieldSpec::id("group_id").describe("List projects of this group instead of all visible projects"))
            .field(FieldSpec::boolean("owned").describe("Only projects owned by the current user"))
            .field(FieldSpec::boolean("membership").describe("Only projects the current user is a member of"))
            .field(FieldSpec::boolean("archived"))
            .field(FieldSpec::one_of("order_by", ORDER_BY))
            .field(FieldSpec::one_of("sort", SORT))
            .fields(pagination()),
        ActionSchema::query("get", "Get a single project")
            .field(project_id())
            .field(FieldSpec::boolean("statistics").describe("Include repository statistics"))
            .field(FieldSpec::boolean("license").describe("Include license information")),
    ])
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum BrowseProjectsAction {
    Search {
        q: String,
        visibility: Option<String>,
        archived: Option<bool>,
        per_page: Option<u32>,
        page: Option<u32>,
    },
    List {
        group_id: Option<String>,
        owned: Option<bool>,
        membership: Option<bool>,
        archived: Option<bool>,
        order_by: Option<String>,
        sort: Option<String>,
        per_page: Option<u32>,
        page: Option<u32>,
    },
    Get {
        project_id: String,
        statistics: Option<bool>,
        license: Option<bool>,
    },
}

pub struct BrowseProjects;

#[async_trait]
impl ActionHandler for BrowseProjects {
    type Action = BrowseProjectsAction;

    async fn handle(&self, action: Self::Action, ctx: &ToolContext) -> Result<Value, ToolError> {
        let request = match action {
            BrowseProjectsAction::Search {
                q,
                visibility,
                archived,
                per_page,
                page,
            } => {
                let query = SearchQuery::parse(&q);
                let request = ApiRequest::get(ApiPath::new("projects"))
                    .param_opt("search", query.text())
                    .param_opt("topic", query.topic())
                    .param_opt("with_programming_language", query.language)
                    .param_opt("visibility", visibility.or(query.visibility))
                    .param_opt("archived", archived);
                paginate(request, per_page, page)
            }
            BrowseProjectsAction::List {
                group_id,
                owned,
                membership,
                archived,
                order_by,
                sort,
                per_page,
                page,
            } => {
                let path = match &group_id {
                    Some(group) => ApiPath::new("groups").id(group).push("projects"),
                    None => ApiPath::new("projects"),
                };
                let request = ApiRequest::get(path)
                    .param_opt("owned", owned)
                    .param_opt("membership", membership)
                    .param_opt("archived", archived)
                    .param_opt("order_by", order_by)
                    .param_opt("sort", sort);
                paginate(request, per_page, page)
            }
            BrowseProjectsAction::Get {
                project_id,
                statistics,
                license,
            } => ApiRequest::get(ApiPath::new("projects").id(&project_id))
                .param_opt("statistics", statistics)
                .param_opt("license", license),
        };
        ctx.api().send(request).await
    }
}

/// 검색어 분해 결과
///
/// `topic:X`, `language:X`, `visibility:X` 토큰은 필터로, 나머지는 검색어로.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub terms: Vec<String>,
    pub topics: Vec<String>,
    pub language: Option<String>,
    pub visibility: Option<String>,
}

impl SearchQuery {
    pub fn parse(q: &str) -> Self {
        let tokens = shlex::split(q)
            .unwrap_or_else(|| q.split_whitespace().map(String::from).collect());

        let mut query = Self::default();
        for token in tokens {
            match token.split_once(':') {
                Some(("topic", value)) if !value.is_empty() => query.topics.push(value.to_string()),
                Some(("language", value)) if !value.is_empty() => {
                    query.language = Some(value.to_string())
                }
                Some(("visibility", value)) if VISIBILITY.contains(&value) => {
                    query.visibility = Some(value.to_string())
                }
                _ => query.terms.push(token),
            }
        }
        query
    }

    /// 남은 검색어 (없으면 None)
    pub fn text(&self) -> Option<String> {
        (!self.terms.is_empty()).then(|| self.terms.join(" "))
    }

    /// topic 필터 (여러 개면 쉼표로 연결)
    pub fn topic(&self) -> Option<String> {
        (!self.topics.is_empty()).then(|| self.topics.join(","))
    }
}

// ============================================================================
// manage_project
// ============================================================================

pub fn manage_schema() -> ToolSchema {
    ToolSchema::new(vec![
        ActionSchema::command("create", "Create a new project")
            .field(FieldSpec::string("name").required())
            .field(FieldSpec::string("path").describe("Repository path; derived from name if omitted"))
            .field(FieldSpec::id("namespace_id").describe("Namespace (group) to create the project in"))
            .field(FieldSpec::string("description"))
            .field(FieldSpec::one_of("visibility", VISIBILITY))
            .field(FieldSpec::boolean("initialize_with_readme")),
        ActionSchema::command("update", "Update project settings")
            .field(project_id())
            .field(FieldSpec::string("name"))
            .field(FieldSpec::string("description"))
            .field(FieldSpec::one_of("visibility", VISIBILITY))
            .field(FieldSpec::string("default_branch")),
        ActionSchema::command("delete", "Delete a project").field(project_id()),
        ActionSchema::command("fork", "Fork a project into another namespace")
            .field(project_id())
            .field(FieldSpec::string("namespace_path").describe("Target namespace path"))
            .field(FieldSpec::string("name"))
            .field(FieldSpec::string("path")),
        ActionSchema::command("archive", "Archive a project (read-only)").field(project_id()),
        ActionSchema::command("unarchive", "Unarchive a project").field(project_id()),
        ActionSchema::command("transfer", "Transfer a project to another namespace")
            .field(project_id())
            .field(
                FieldSpec::id("namespace")
                    .required()
                    .describe("Target namespace ID or path"),
            ),
    ])
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ManageProjectAction {
    Create {
        name: String,
        path: Option<String>,
        namespace_id: Option<String>,
        description: Option<String>,
        visibility: Option<String>,
        initialize_with_readme: Option<bool>,
    },
    Update {
        project_id: String,
        name: Option<String>,
        description: Option<String>,
        visibility: Option<String>,
        default_branch: Option<String>,
    },
    Delete {
        project_id: String,
    },
    Fork {
        project_id: String,
        namespace_path: Option<String>,
        name: Option<String>,
        path: Option<String>,
    },
    Archive {
        project_id: String,
    },
    Unarchive {
        project_id: String,
    },
    Transfer {
        project_id: String,
        namespace: String,
    },
}

pub struct ManageProject;

#[async_trait]
impl ActionHandler for ManageProject {
    type Action = ManageProjectAction;

    async fn handle(&self, action: Self::Action, ctx: &ToolContext) -> Result<Value, ToolError> {
        let project = |id: &str| ApiPath::new("projects").id(id);

        let request = match action {
            ManageProjectAction::Create {
                name,
                path,
                namespace_id,
                description,
                visibility,
                initialize_with_readme,
            } => {
                let mut body = Map::new();
                body.insert("name".into(), json!(name));
                insert_opt(&mut body, "path", path);
                insert_opt(&mut body, "namespace_id", namespace_id);
                insert_opt(&mut body, "description", description);
                insert_opt(&mut body, "visibility", visibility);
                insert_opt(&mut body, "initialize_with_readme", initialize_with_readme);
                ApiRequest::post(ApiPath::new("projects")).json(Value::Object(body))
            }
            ManageProjectAction::Update {
                project_id,
                name,
                description,
                visibility,
                default_branch,
            } => {
                let mut body = Map::new();
                insert_opt(&mut body, "name", name);
                insert_opt(&mut body, "description", description);
                insert_opt(&mut body, "visibility", visibility);
                insert_opt(&mut body, "default_branch", default_branch);
                ApiRequest::put(project(&project_id)).json(Value::Object(body))
            }
            ManageProjectAction::Delete { project_id } => {
                ApiRequest::delete(project(&project_id))
            }
            ManageProjectAction::Fork {
                project_id,
                namespace_path,
                name,
                path,
            } => {
                let mut body = Map::new();
                insert_opt(&mut body, "namespace_path", namespace_path);
                insert_opt(&mut body, "name", name);
                insert_opt(&mut body, "path", path);
                ApiRequest::post(project(&project_id).push("fork")).json(Value::Object(body))
            }
            ManageProjectAction::Archive { project_id } => {
                ApiRequest::post(project(&project_id).push("archive"))
            }
            ManageProjectAction::Unarchive { project_id } => {
                ApiRequest::post(project(&project_id).push("unarchive"))
            }
            ManageProjectAction::Transfer {
                project_id,
                namespace,
            } => ApiRequest::put(project(&project_id).push("transfer"))
                .json(json!({ "namespace": namespace })),
        };
        ctx.api().send(request).await.map(shape::command_ack)
    }
}

/// 값이 있을 때만 body에 추가
pub(crate) fn insert_opt<T: Into<Value>>(body: &mut Map<String, Value>, key: &str, value: Option<T>) {
    if let Some(value) = value {
        body.insert(key.to_string(), value.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_query_split() {
        let query = SearchQuery::parse("topic:devops test");
        assert_eq!(query.topic().as_deref(), Some("devops"));
        assert_eq!(query.text().as_deref(), Some("test"));
        assert_eq!(query.language, None);
    }

    #[test]
    fn test_search_query_quotes_and_filters() {
        let query = SearchQuery::parse(
            r#"topic:ci topic:k8s language:rust visibility:public "release notes" bot"#,
        );
        assert_eq!(query.topic().as_deref(), Some("ci,k8s"));
        assert_eq!(query.language.as_deref(), Some("rust"));
        assert_eq!(query.visibility.as_deref(), Some("public"));
        assert_eq!(query.text().as_deref(), Some("release notes bot"));
    }

    #[test]
    fn test_search_query_edge_cases() {
        // 알 수 없는 visibility나 빈 값은 검색어로 남김
        let query = SearchQuery::parse("visibility:secret topic:");
        assert_eq!(query.visibility, None);
        assert_eq!(query.text().as_deref(), Some("visibility:secret topic:"));

        // 따옴표가 안 닫히면 공백 기준으로
        let query = SearchQuery::parse(r#""unterminated topic:x"#);
        assert_eq!(query.topic().as_deref(), Some("x"));
        assert_eq!(query.text().as_deref(), Some("\"unterminated"));

        assert_eq!(SearchQuery::parse("topic:a").text(), None);
    }

    #[test]
    fn test_schemas_decode() {
        let parsed = browse_schema()
            .validate(&json!({"action": "get", "project_id": 7, "statistics": "true"}))
            .unwrap();
        assert!(matches!(
            parsed.decode::<BrowseProjectsAction>().unwrap(),
            BrowseProjectsAction::Get { project_id, statistics: Some(true), license: None } if project_id == "7"
        ));

        let parsed = manage_schema()
            .validate(&json!({"action": "transfer", "project_id": "a/b", "namespace": 12}))
            .unwrap();
        assert!(matches!(
            parsed.decode::<ManageProjectAction>().unwrap(),
            ManageProjectAction::Transfer { namespace, .. } if namespace == "12"
        ));
    }
}
