//! 카탈로그 통합 테스트 - builtin 도구를 mock 업스트림으로 호출
//!
//! `cargo test -p labforge-core --test catalog_test`

use futures::future::join_all;
use labforge_core::tool::builtin::{integrations, members, pipelines, projects};
use labforge_core::{Method, MockApiClient, ToolCatalog, ToolContext, ToolError};
use labforge_foundation::{
    ActionPolicy, EnvSnapshot, PolicyGate, PolicyLayer, PolicyRule, PolicyScope, ServerConfig,
};
use serde_json::{json, Value};
use std::sync::Arc;

struct Harness {
    catalog: ToolCatalog,
    api: Arc<MockApiClient>,
}

fn harness(api: MockApiClient, read_only: bool, env: EnvSnapshot, policy: ActionPolicy) -> Harness {
    let url = url::Url::parse("https://gitlab.example.com/api/v4/").unwrap();
    let config = Arc::new(ServerConfig::new(url).with_read_only(read_only));
    let api = Arc::new(api);
    let ctx = ToolContext::new(config, api.clone(), Arc::new(PolicyGate::new(policy)));
    Harness {
        catalog: ToolCatalog::with_builtins(&ctx, env),
        api,
    }
}

fn default_harness(api: MockApiClient) -> Harness {
    harness(api, false, EnvSnapshot::empty(), ActionPolicy::allow_all())
}

fn listed(catalog: &ToolCatalog) -> Vec<String> {
    catalog.list_tools().into_iter().map(|e| e.name).collect()
}

#[tokio::test]
async fn test_get_project_single_upstream_call() {
    let h = default_harness(MockApiClient::new().respond(
        Method::Get,
        "projects/123",
        json!({"id": 123, "name": "demo", "_links": {"self": "https://gitlab.example.com/api/v4/projects/123"}}),
    ));

    let result = h
        .catalog
        .call_tool(
            projects::BROWSE_PROJECTS,
            json!({"action": "get", "project_id": "123"}),
        )
        .await
        .unwrap();

    assert_eq!(result, json!({"id": 123, "name": "demo"}));
    let requests = h.api.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, Method::Get);
    assert_eq!(requests[0].path, "projects/123");
}

#[tokio::test]
async fn test_search_splits_query_tokens() {
    let h = default_harness(MockApiClient::new().respond(Method::Get, "projects", json!([])));

    h.catalog
        .call_tool(
            projects::BROWSE_PROJECTS,
            json!({"action": "search", "q": "topic:devops test", "per_page": 20}),
        )
        .await
        .unwrap();

    let request = h.api.last_request().unwrap();
    assert_eq!(request.query_value("topic"), Some("devops"));
    assert_eq!(request.query_value("search"), Some("test"));
    assert_eq!(request.query_value("per_page"), Some("20"));
    assert_eq!(request.query_value("with_programming_language"), None);
}

#[tokio::test]
async fn test_unknown_action_rejected_at_action_path() {
    let h = default_harness(MockApiClient::new());

    let err = h
        .catalog
        .call_tool(
            projects::MANAGE_PROJECT,
            json!({"action": "nuke", "project_id": "1"}),
        )
        .await
        .unwrap_err();

    match err {
        ToolError::SchemaValidation { tool, issues } => {
            assert_eq!(tool, projects::MANAGE_PROJECT);
            assert!(issues.iter().any(|i| i.path == "action"));
        }
        other => panic!("expected schema validation error, got {:?}", other),
    }
    assert_eq!(h.api.request_count(), 0);
}

#[tokio::test]
async fn test_field_issues_reported_together() {
    let h = default_harness(MockApiClient::new());

    let err = h
        .catalog
        .call_tool(
            members::MANAGE_MEMBER,
            json!({"action": "add_to_project", "project_id": 1, "access_level": "admin"}),
        )
        .await
        .unwrap_err();

    let ToolError::SchemaValidation { issues, .. } = err else {
        panic!("expected schema validation error");
    };
    let paths: Vec<&str> = issues.iter().map(|i| i.path.as_str()).collect();
    assert!(paths.contains(&"user_id"));
    assert!(paths.contains(&"access_level"));
}

#[tokio::test]
async fn test_denied_action_never_reaches_upstream() {
    let policy = ActionPolicy::from_layers([(
        PolicyScope::Project,
        PolicyLayer::new().deny(PolicyRule::action(projects::MANAGE_PROJECT, "delete")),
    )])
    .unwrap();
    let h = harness(
        MockApiClient::new().respond(Method::Delete, "projects/1", Value::Null),
        false,
        EnvSnapshot::empty(),
        policy,
    );

    let err = h
        .catalog
        .call_tool(
            projects::MANAGE_PROJECT,
            json!({"action": "delete", "project_id": "1"}),
        )
        .await
        .unwrap_err();

    assert_eq!(err, ToolError::denied(projects::MANAGE_PROJECT, "delete"));
    assert_eq!(h.api.request_count(), 0);

    // 같은 도구의 다른 action은 그대로 목록에 남음
    let entries = h.catalog.list_tools();
    let manage = entries
        .iter()
        .find(|e| e.name == projects::MANAGE_PROJECT)
        .unwrap();
    let actions = &manage.input_schema["properties"]["action"]["enum"];
    assert!(actions.as_array().unwrap().iter().all(|a| a != "delete"));
    assert!(actions.as_array().unwrap().iter().any(|a| a == "create"));
}

#[tokio::test]
async fn test_dot_identifiers_cannot_retarget_requests() {
    let policy = ActionPolicy::from_layers([(
        PolicyScope::Project,
        PolicyLayer::new().deny(PolicyRule::action(projects::MANAGE_PROJECT, "delete")),
    )])
    .unwrap();
    let h = harness(
        MockApiClient::new()
            .respond(Method::Delete, "projects/5", Value::Null)
            .respond(Method::Delete, "groups/3", Value::Null),
        false,
        EnvSnapshot::from_pairs([("USE_INTEGRATIONS", "true")]),
        policy,
    );

    let calls = [
        (
            pipelines::MANAGE_PIPELINE,
            json!({"action": "delete", "project_id": "5", "pipeline_id": ".."}),
            "pipeline_id",
        ),
        (
            members::MANAGE_MEMBER,
            json!({"action": "remove_from_group", "group_id": 3, "user_id": "."}),
            "user_id",
        ),
        (
            integrations::MANAGE_INTEGRATION,
            json!({"action": "disable", "project_id": 5, "integration": ".."}),
            "integration",
        ),
    ];
    for (tool, input, field) in calls {
        let err = h.catalog.call_tool(tool, input).await.unwrap_err();
        let ToolError::SchemaValidation { issues, .. } = err else {
            panic!("expected schema validation error for {}", tool);
        };
        assert!(issues.iter().any(|i| i.path == field), "{}: {:?}", tool, issues);
    }
    assert_eq!(h.api.request_count(), 0);
}

#[tokio::test]
async fn test_readonly_preset_denies_every_command_tool() {
    let policy = ActionPolicy::from_layers([(
        PolicyScope::Environment,
        PolicyLayer::new().preset("readonly"),
    )])
    .unwrap();
    let h = harness(MockApiClient::new(), false, EnvSnapshot::empty(), policy);

    assert_eq!(
        listed(&h.catalog),
        vec![
            projects::BROWSE_PROJECTS,
            members::BROWSE_MEMBERS,
            pipelines::BROWSE_PIPELINES
        ]
    );
    let err = h
        .catalog
        .call_tool(
            members::MANAGE_MEMBER,
            json!({"action": "remove_from_group", "group_id": 1, "user_id": 2}),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "action_denied");
}

#[tokio::test]
async fn test_pipeline_gate() {
    let h = harness(
        MockApiClient::new(),
        false,
        EnvSnapshot::from_pairs([("USE_PIPELINE", "false")]),
        ActionPolicy::allow_all(),
    );

    let names = listed(&h.catalog);
    assert!(!names.iter().any(|n| n == pipelines::BROWSE_PIPELINES));
    assert!(!names.iter().any(|n| n == pipelines::MANAGE_PIPELINE));

    let err = h
        .catalog
        .call_tool(
            pipelines::BROWSE_PIPELINES,
            json!({"action": "list", "project_id": 1}),
        )
        .await
        .unwrap_err();
    assert_eq!(err, ToolError::unknown_tool(pipelines::BROWSE_PIPELINES));
    assert_eq!(h.api.request_count(), 0);

    let ungated = default_harness(MockApiClient::new());
    assert!(listed(&ungated.catalog)
        .iter()
        .any(|n| n == pipelines::BROWSE_PIPELINES));
}

#[tokio::test]
async fn test_integrations_hidden_by_default() {
    let h = default_harness(MockApiClient::new());
    assert_eq!(listed(&h.catalog).len(), 6);

    let enabled = harness(
        MockApiClient::new(),
        false,
        EnvSnapshot::from_pairs([("USE_INTEGRATIONS", "true")]),
        ActionPolicy::allow_all(),
    );
    let names = listed(&enabled.catalog);
    assert_eq!(names.len(), 8);
    assert_eq!(names.last().map(String::as_str), Some("manage_integration"));
}

#[tokio::test]
async fn test_read_only_mode_lists_exactly_read_only_tools() {
    let h = harness(
        MockApiClient::new(),
        true,
        EnvSnapshot::from_pairs([("USE_INTEGRATIONS", "1")]),
        ActionPolicy::allow_all(),
    );

    let expected: Vec<String> = h
        .catalog
        .registries()
        .iter()
        .flat_map(|r| r.read_only_names().to_vec())
        .collect();
    assert_eq!(listed(&h.catalog), expected);
    assert_eq!(expected.len(), 4);

    let err = h
        .catalog
        .call_tool(
            projects::MANAGE_PROJECT,
            json!({"action": "archive", "project_id": 1}),
        )
        .await
        .unwrap_err();
    assert_eq!(err, ToolError::unknown_tool(projects::MANAGE_PROJECT));
}

#[tokio::test]
async fn test_builtin_invariants_hold() {
    let h = default_harness(MockApiClient::new());
    let violations = h.catalog.check_invariants();
    assert!(violations.is_empty(), "violations: {:?}", violations);
    assert_eq!(h.catalog.tool_count(), 8);
}

#[tokio::test]
async fn test_upstream_error_passes_through() {
    let h = default_harness(MockApiClient::new().fail(
        Method::Get,
        "projects/9",
        ToolError::Upstream {
            status: 403,
            status_text: "Forbidden".into(),
            body_excerpt: Some("{\"message\":\"403 Forbidden\"}".into()),
        },
    ));

    let err = h
        .catalog
        .call_tool(
            projects::BROWSE_PROJECTS,
            json!({"action": "get", "project_id": 9}),
        )
        .await
        .unwrap_err();

    assert!(err.is_user_facing());
    let body = err.to_json();
    assert_eq!(body["error"]["kind"], "upstream");
    assert_eq!(body["error"]["status"], 403);
}

#[tokio::test]
async fn test_member_add_maps_access_level() {
    let h = default_harness(MockApiClient::new().respond(
        Method::Post,
        "groups/acme%2Fplatform/members",
        json!({"id": 12, "access_level": 30}),
    ));

    h.catalog
        .call_tool(
            members::MANAGE_MEMBER,
            json!({
                "action": "add_to_group",
                "group_id": "acme/platform",
                "user_id": 12,
                "access_level": "developer"
            }),
        )
        .await
        .unwrap();

    let request = h.api.last_request().unwrap();
    assert_eq!(
        request.body,
        Some(labforge_core::api::Body::Json(
            json!({"user_id": "12", "access_level": 30})
        ))
    );
}

#[tokio::test]
async fn test_concurrent_calls() {
    let mut api = MockApiClient::new();
    for id in 1..=10 {
        api = api.respond(
            Method::Get,
            &format!("projects/{}", id),
            json!({"id": id, "_links": {}}),
        );
    }
    let h = default_harness(api);

    let calls = (1..=10).map(|id| {
        h.catalog.call_tool(
            projects::BROWSE_PROJECTS,
            json!({"action": "get", "project_id": id}),
        )
    });
    let results = join_all(calls).await;

    for (i, result) in results.into_iter().enumerate() {
        assert_eq!(result.unwrap(), json!({"id": i + 1}));
    }
    assert_eq!(h.api.request_count(), 10);
}
