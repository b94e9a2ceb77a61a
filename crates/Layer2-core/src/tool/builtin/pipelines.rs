//! Pipelines - CI 파이프라인/잡 조회 및 제어
//!
//! `USE_PIPELINE` 플래그로 노출 여부를 제어합니다 (기본 노출).

use super::{paginate, pagination, project_id};
use crate::api::{ApiPath, ApiRequest};
use crate::schema::{ActionSchema, FieldSpec, ToolSchema};
use crate::shape;
use crate::tool::context::ToolContext;
use crate::tool::definition::{ActionHandler, ToolDefinition, ToolGate};
use crate::tool::registry::ToolRegistry;
use crate::ToolError;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::debug;

pub const BROWSE_PIPELINES: &str = "browse_pipelines";
pub const MANAGE_PIPELINE: &str = "manage_pipeline";

pub const PIPELINE_GATE: ToolGate = ToolGate::new("USE_PIPELINE", true);

const STATUS: &[&str] = &[
    "created",
    "waiting_for_resource",
    "preparing",
    "pending",
    "running",
    "success",
    "failed",
    "canceled",
    "skipped",
    "manual",
    "scheduled",
];

const JOB_SCOPE: &[&str] = &[
    "created", "pending", "running", "failed", "success", "canceled", "skipped", "manual",
];

pub fn registry(ctx: &ToolContext) -> ToolRegistry {
    let mut registry = ToolRegistry::new("pipelines");
    registry.register(
        ToolDefinition::dispatch(
            BROWSE_PIPELINES,
            "List pipelines, inspect a pipeline and its jobs, or read a job log",
            browse_schema(),
            ctx,
            BrowsePipelines,
        )
        .with_gate(PIPELINE_GATE),
    );
    registry.register(
        ToolDefinition::dispatch(
            MANAGE_PIPELINE,
            "Trigger, retry, cancel or delete a pipeline",
            manage_schema(),
            ctx,
            ManagePipeline,
        )
        .with_gate(PIPELINE_GATE),
    );
    registry.with_read_only([BROWSE_PIPELINES])
}

fn pipeline_id() -> FieldSpec {
    FieldSpec::id("pipeline_id").required().describe("Pipeline ID")
}

fn pipeline_path(project_id: &str, pipeline_id: &str) -> ApiPath {
    ApiPath::new("projects")
        .id(project_id)
        .push("pipelines")
        .id(pipeline_id)
}

// ============================================================================
// browse_pipelines
// ============================================================================

pub fn browse_schema() -> ToolSchema {
    ToolSchema::new(vec![
        ActionSchema::query("list", "List pipelines of a project, newest first")
            .field(project_id())
            .field(FieldSpec::one_of("status", STATUS))
            .field(FieldSpec::string("ref").describe("Branch or tag name"))
            .field(FieldSpec::string("source").describe("Trigger source, e.g. push, web, schedule"))
            .fields(pagination()),
        ActionSchema::query("get", "Get a single pipeline")
            .field(project_id())
            .field(pipeline_id()),
        ActionSchema::query("jobs", "List the jobs of a pipeline")
            .field(project_id())
            .field(pipeline_id())
            .field(FieldSpec::one_of("scope", JOB_SCOPE)),
        ActionSchema::query("job_log", "Read a job's log with ANSI colors removed")
            .field(project_id())
            .field(FieldSpec::id("job_id").required().describe("Job ID"))
            .field(
                FieldSpec::bounded("tail_lines", 1, 100_000)
                    .describe("Only return the last N lines"),
            ),
    ])
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum BrowsePipelinesAction {
    List {
        project_id: String,
        status: Option<String>,
        #[serde(rename = "ref")]
        git_ref: Option<String>,
        source: Option<String>,
        per_page: Option<u32>,
        page: Option<u32>,
    },
    Get {
        project_id: String,
        pipeline_id: String,
    },
    Jobs {
        project_id: String,
        pipeline_id: String,
        scope: Option<String>,
    },
    JobLog {
        project_id: String,
        job_id: String,
        tail_lines: Option<usize>,
    },
}

pub struct BrowsePipelines;

#[async_trait]
impl ActionHandler for BrowsePipelines {
    type Action = BrowsePipelinesAction;

    async fn handle(&self, action: Self::Action, ctx: &ToolContext) -> Result<Value, ToolError> {
        let request = match action {
            BrowsePipelinesAction::List {
                project_id,
                status,
                git_ref,
                source,
                per_page,
                page,
            } => {
                let request = ApiRequest::get(ApiPath::new("projects").id(&project_id).push("pipelines"))
                    .param_opt("status", status)
                    .param_opt("ref", git_ref)
                    .param_opt("source", source);
                paginate(request, per_page, page)
            }
            BrowsePipelinesAction::Get {
                project_id,
                pipeline_id,
            } => ApiRequest::get(pipeline_path(&project_id, &pipeline_id)),
            BrowsePipelinesAction::Jobs {
                project_id,
                pipeline_id,
                scope,
            } => ApiRequest::get(pipeline_path(&project_id, &pipeline_id).push("jobs"))
                .param_opt("scope", scope),
            BrowsePipelinesAction::JobLog {
                project_id,
                job_id,
                tail_lines,
            } => return job_log(ctx, &project_id, &job_id, tail_lines).await,
        };
        ctx.api().send(request).await
    }
}

async fn job_log(
    ctx: &ToolContext,
    project_id: &str,
    job_id: &str,
    tail_lines: Option<usize>,
) -> Result<Value, ToolError> {
    let path = ApiPath::new("projects")
        .id(project_id)
        .push("jobs")
        .id(job_id)
        .push("trace");
    let raw = match ctx.api().send(ApiRequest::get(path)).await? {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    };

    let log = shape::job_log(&raw, tail_lines, ctx.config().job_log_max_bytes);
    if log.truncated {
        debug!(
            "Job {} log shortened (tail_lines={:?}, max {} bytes)",
            job_id,
            tail_lines,
            ctx.config().job_log_max_bytes
        );
    }
    Ok(json!({
        "job_id": job_id,
        "content": log.content,
        "truncated": log.truncated,
    }))
}

// ============================================================================
// manage_pipeline
// ============================================================================

pub fn manage_schema() -> ToolSchema {
    ToolSchema::new(vec![
        ActionSchema::command("create", "Run a new pipeline for a branch or tag")
            .field(project_id())
            .field(FieldSpec::string("ref").required().describe("Branch or tag to run"))
            .field(
                FieldSpec::string_map("variables")
                    .describe("CI variables as {\"KEY\": \"value\"}"),
            ),
        ActionSchema::command("retry", "Retry the failed jobs of a pipeline")
            .field(project_id())
            .field(pipeline_id()),
        ActionSchema::command("cancel", "Cancel a running pipeline")
            .field(project_id())
            .field(pipeline_id()),
        ActionSchema::command("delete", "Delete a pipeline")
            .field(project_id())
            .field(pipeline_id()),
    ])
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ManagePipelineAction {
    Create {
        project_id: String,
        #[serde(rename = "ref")]
        git_ref: String,
        variables: Option<BTreeMap<String, String>>,
    },
    Retry {
        project_id: String,
        pipeline_id: String,
    },
    Cancel {
        project_id: String,
        pipeline_id: String,
    },
    Delete {
        project_id: String,
        pipeline_id: String,
    },
}

/// `{"KEY": "value"}` → `[{"key": "KEY", "value": "value"}]`
pub fn variables_body(variables: BTreeMap<String, String>) -> Value {
    variables
        .into_iter()
        .map(|(key, value)| json!({ "key": key, "value": value }))
        .collect()
}

pub struct ManagePipeline;

#[async_trait]
impl ActionHandler for ManagePipeline {
    type Action = ManagePipelineAction;

    async fn handle(&self, action: Self::Action, ctx: &ToolContext) -> Result<Value, ToolError> {
        let request = match action {
            ManagePipelineAction::Create {
                project_id,
                git_ref,
                variables,
            } => {
                let mut body = json!({ "ref": git_ref });
                if let Some(variables) = variables.filter(|v| !v.is_empty()) {
                    body["variables"] = variables_body(variables);
                }
                ApiRequest::post(ApiPath::new("projects").id(&project_id).push("pipeline")).json(body)
            }
            ManagePipelineAction::Retry {
                project_id,
                pipeline_id,
            } => ApiRequest::post(pipeline_path(&project_id, &pipeline_id).push("retry")),
            ManagePipelineAction::Cancel {
                project_id,
                pipeline_id,
            } => ApiRequest::post(pipeline_path(&project_id, &pipeline_id).push("cancel")),
            ManagePipelineAction::Delete {
                project_id,
                pipeline_id,
            } => ApiRequest::delete(pipeline_path(&project_id, &pipeline_id)),
        };
        ctx.api().send(request).await.map(shape::command_ack)
    }
}
