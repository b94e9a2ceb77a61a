//! 스키마 적합성 테스트 - 생성된 inputSchema를 실제 JSON Schema 검증기로 확인
//!
//! `cargo test -p labforge-core --test schema_conformance`

use labforge_core::tool::builtin::{integrations, members, pipelines, projects};
use labforge_core::{MockApiClient, ToolCatalog, ToolContext, ToolSchema};
use labforge_foundation::{EnvSnapshot, PolicyGate, ServerConfig};
use serde_json::{json, Value};
use std::sync::Arc;

fn full_catalog() -> ToolCatalog {
    let url = url::Url::parse("https://gitlab.example.com/api/v4/").unwrap();
    let ctx = ToolContext::new(
        Arc::new(ServerConfig::new(url)),
        Arc::new(MockApiClient::new()),
        Arc::new(PolicyGate::allow_all()),
    );
    ToolCatalog::with_builtins(&ctx, EnvSnapshot::from_pairs([("USE_INTEGRATIONS", "true")]))
}

/// 도구별 유효한 샘플 입력
fn samples() -> Vec<(&'static str, ToolSchema, Vec<Value>)> {
    vec![
        (
            projects::BROWSE_PROJECTS,
            projects::browse_schema(),
            vec![
                json!({"action": "search", "q": "topic:devops language:go api", "per_page": 50}),
                json!({"action": "list", "group_id": "acme", "order_by": "name", "sort": "asc"}),
                json!({"action": "get", "project_id": 123, "statistics": true}),
            ],
        ),
        (
            projects::MANAGE_PROJECT,
            projects::manage_schema(),
            vec![
                json!({"action": "create", "name": "demo", "visibility": "private"}),
                json!({"action": "transfer", "project_id": "acme/demo", "namespace": 77}),
                json!({"action": "archive", "project_id": 5}),
            ],
        ),
        (
            members::BROWSE_MEMBERS,
            members::browse_schema(),
            vec![
                json!({"action": "list_group", "group_id": 3, "inherited": true}),
                json!({"action": "get_project", "project_id": 1, "user_id": 9}),
            ],
        ),
        (
            members::MANAGE_MEMBER,
            members::manage_schema(),
            vec![
                json!({"action": "add_to_project", "project_id": 1, "user_id": 9, "access_level": "reporter"}),
                json!({"action": "update_group", "group_id": 2, "user_id": 9, "access_level": "owner", "expires_at": "2027-06-30"}),
                json!({"action": "remove_from_group", "group_id": 2, "user_id": 9}),
            ],
        ),
        (
            pipelines::BROWSE_PIPELINES,
            pipelines::browse_schema(),
            vec![
                json!({"action": "list", "project_id": 1, "status": "failed", "ref": "main"}),
                json!({"action": "jobs", "project_id": 1, "pipeline_id": 10, "scope": "failed"}),
                json!({"action": "job_log", "project_id": 1, "job_id": 99, "tail_lines": 200}),
            ],
        ),
        (
            pipelines::MANAGE_PIPELINE,
            pipelines::manage_schema(),
            vec![
                json!({"action": "create", "project_id": 1, "ref": "main", "variables": {"DEPLOY": "1"}}),
                json!({"action": "cancel", "project_id": 1, "pipeline_id": 10}),
            ],
        ),
        (
            integrations::BROWSE_INTEGRATIONS,
            integrations::browse_schema(),
            vec![json!({"action": "get", "project_id": 1, "integration": "slack"})],
        ),
        (
            integrations::MANAGE_INTEGRATION,
            integrations::manage_schema(),
            vec![
                json!({"action": "update", "project_id": 1, "integration": "jira", "settings": {"url": "https://jira.example.com"}}),
                json!({"action": "disable", "project_id": 1, "integration": "jira"}),
            ],
        ),
    ]
}

#[test]
fn test_every_listed_schema_compiles() {
    let catalog = full_catalog();
    let entries = catalog.list_tools();
    assert_eq!(entries.len(), 8);

    for entry in entries {
        assert_eq!(entry.input_schema["type"], "object", "{}", entry.name);
        assert!(
            jsonschema::validator_for(&entry.input_schema).is_ok(),
            "schema of {} does not compile",
            entry.name
        );
    }
}

#[test]
fn test_samples_pass_both_validators() {
    for (tool, schema, inputs) in samples() {
        let validator = jsonschema::validator_for(&schema.to_json_schema()).unwrap();
        for input in inputs {
            assert!(
                validator.is_valid(&input),
                "{} sample rejected by JSON Schema: {}",
                tool,
                input
            );

            let parsed = schema
                .validate(&input)
                .unwrap_or_else(|e| panic!("{} sample rejected: {} ({})", tool, input, e));
            assert!(
                validator.is_valid(&parsed.to_value()),
                "{} canonical form rejected: {}",
                tool,
                parsed.to_value()
            );
        }
    }
}

#[test]
fn test_invalid_inputs_rejected_by_both() {
    let schema = projects::manage_schema();
    let validator = jsonschema::validator_for(&schema.to_json_schema()).unwrap();

    let invalid = [
        json!({"action": "nuke"}),
        json!({"action": "create"}),
        json!({"action": "create", "name": "x", "visibility": "secret"}),
        json!({"project_id": 1}),
        json!({"action": "create", "name": "   "}),
        json!({"action": "archive", "project_id": ".."}),
        json!({"action": "transfer", "project_id": 1, "namespace": "."}),
    ];
    for input in invalid {
        assert!(!validator.is_valid(&input), "JSON Schema accepted {}", input);
        assert!(schema.validate(&input).is_err(), "validate accepted {}", input);
    }
}

#[test]
fn test_integration_slug_rejects_dot_segment() {
    let schema = integrations::manage_schema();
    let validator = jsonschema::validator_for(&schema.to_json_schema()).unwrap();

    let input = json!({"action": "disable", "project_id": 1, "integration": ".."});
    assert!(!validator.is_valid(&input));
    assert!(schema.validate(&input).is_err());
}

#[test]
fn test_validation_round_trip_is_stable() {
    for (tool, schema, inputs) in samples() {
        for input in inputs {
            let first = schema.validate(&input).unwrap();
            let second = schema.validate(&first.to_value()).unwrap();
            assert_eq!(first, second, "{} not stable for {}", tool, input);
        }
    }
}
