//! Integrations - 프로젝트 연동(서비스) 설정
//!
//! 기본적으로 숨겨져 있으며 `USE_INTEGRATIONS=true`일 때만 노출됩니다.

use super::project_id;
use crate::api::{ApiPath, ApiRequest};
use crate::schema::{ActionSchema, FieldSpec, ToolSchema};
use crate::shape;
use crate::tool::context::ToolContext;
use crate::tool::definition::{ActionHandler, ToolDefinition, ToolGate};
use crate::tool::registry::ToolRegistry;
use crate::ToolError;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};

pub const BROWSE_INTEGRATIONS: &str = "browse_integrations";
pub const MANAGE_INTEGRATION: &str = "manage_integration";

pub const INTEGRATIONS_GATE: ToolGate = ToolGate::new("USE_INTEGRATIONS", false);

pub fn registry(ctx: &ToolContext) -> ToolRegistry {
    let mut registry = ToolRegistry::new("integrations");
    registry.register(
        ToolDefinition::dispatch(
            BROWSE_INTEGRATIONS,
            "List a project's integrations or read one integration's settings",
            browse_schema(),
            ctx,
            BrowseIntegrations,
        )
        .with_gate(INTEGRATIONS_GATE),
    );
    registry.register(
        ToolDefinition::dispatch(
            MANAGE_INTEGRATION,
            "Configure or disable a project integration",
            manage_schema(),
            ctx,
            ManageIntegration,
        )
        .with_gate(INTEGRATIONS_GATE),
    );
    registry.with_read_only([BROWSE_INTEGRATIONS])
}

fn integration() -> FieldSpec {
    FieldSpec::slug("integration")
        .required()
        .describe("Integration slug, e.g. slack, jira, mattermost")
}

fn integration_path(project_id: &str, slug: &str) -> ApiPath {
    ApiPath::new("projects")
        .id(project_id)
        .push("integrations")
        .id(slug)
}

pub fn browse_schema() -> ToolSchema {
    ToolSchema::new(vec![
        ActionSchema::query("list", "List active integrations of a project").field(project_id()),
        ActionSchema::query("get", "Get one integration's settings")
            .field(project_id())
            .field(integration()),
    ])
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum BrowseIntegrationsAction {
    List { project_id: String },
    Get { project_id: String, integration: String },
}

pub struct BrowseIntegrations;

#[async_trait]
impl ActionHandler for BrowseIntegrations {
    type Action = BrowseIntegrationsAction;

    async fn handle(&self, action: Self::Action, ctx: &ToolContext) -> Result<Value, ToolError> {
        let path = match action {
            BrowseIntegrationsAction::List { project_id } => {
                ApiPath::new("projects").id(&project_id).push("integrations")
            }
            BrowseIntegrationsAction::Get {
                project_id,
                integration,
            } => integration_path(&project_id, &integration),
        };
        ctx.api().send(ApiRequest::get(path)).await
    }
}

pub fn manage_schema() -> ToolSchema {
    ToolSchema::new(vec![
        ActionSchema::command("update", "Create or update an integration's settings")
            .field(project_id())
            .field(integration())
            .field(
                FieldSpec::object("settings")
                    .required()
                    .describe("Integration settings, sent as-is (e.g. {\"webhook\": \"...\"})"),
            ),
        ActionSchema::command("disable", "Disable an integration")
            .field(project_id())
            .field(integration()),
    ])
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ManageIntegrationAction {
    Update {
        project_id: String,
        integration: String,
        settings: Map<String, Value>,
    },
    Disable {
        project_id: String,
        integration: String,
    },
}

pub struct ManageIntegration;

#[async_trait]
impl ActionHandler for ManageIntegration {
    type Action = ManageIntegrationAction;

    async fn handle(&self, action: Self::Action, ctx: &ToolContext) -> Result<Value, ToolError> {
        let request = match action {
            ManageIntegrationAction::Update {
                project_id,
                integration,
                settings,
            } => ApiRequest::put(integration_path(&project_id, &integration))
                .json(Value::Object(settings)),
            ManageIntegrationAction::Disable {
                project_id,
                integration,
            } => ApiRequest::delete(integration_path(&project_id, &integration)),
        };
        ctx.api().send(request).await.map(shape::command_ack)
    }
}
