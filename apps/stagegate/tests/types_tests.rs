//! Unit tests for API types serialization/deserialization.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use serde_json::json;
use stagegate::api::types::{
    AdvanceRequest, CheckRequirementsError, CheckRequirementsRequest, CheckRequirementsResponse,
    CreateProjectRequest, EvaluateResponse, HealthResponse, ProjectJson, StagesResponse,
    WriteContentRequest, WriteContentResponse, parse_requirement,
};
use stagegate_core::{
    EvaluationResult, ProgressionEngine, ProjectId, RequirementId, RequirementKind, StageCatalog,
    StageEvaluation, StageId, StageStatus, Transition, WriteOutcome, WritingMode,
};
use std::sync::Arc;

// =============================================================================
// HEALTH RESPONSE TESTS
// =============================================================================

#[test]
fn test_health_response_default() {
    let health = HealthResponse::default();
    assert_eq!(health.status, "ok");
    assert!(!health.version.is_empty());
}

#[test]
fn test_health_response_serialization() {
    let health = HealthResponse {
        status: "ok".to_string(),
        version: "0.4.2".to_string(),
    };

    let json = serde_json::to_string(&health).unwrap();
    assert!(json.contains("\"status\":\"ok\""));
    assert!(json.contains("\"version\":\"0.4.2\""));
}

// =============================================================================
// CHECK REQUIREMENTS REQUEST TESTS
// =============================================================================

#[test]
fn test_check_request_camel_case_fields() {
    let request: CheckRequirementsRequest = serde_json::from_value(json!({
        "projectId": 7,
        "stageId": "introduction",
        "content": "Some text",
        "wordLimit": 500,
        "countedWordsExcludingThisStage": 120,
        "currentStageIndex": 2,
        "isLastStage": false
    }))
    .unwrap();

    assert_eq!(request.stage_id.as_deref(), Some("introduction"));
    assert_eq!(request.effective_word_limit(), Some(500));
    assert_eq!(request.counted_words_excluding_this_stage, Some(120));
    assert_eq!(request.current_stage_index, Some(2));
    assert_eq!(request.is_last_stage, Some(false));
    assert!(request.requirement_specs().is_empty());
}

#[test]
fn test_check_request_zero_limit_is_unlimited() {
    let request: CheckRequirementsRequest =
        serde_json::from_value(json!({"content": "x", "wordLimit": 0})).unwrap();
    assert_eq!(request.effective_word_limit(), None);
}

#[test]
fn test_check_request_non_array_requirements() {
    let request: CheckRequirementsRequest =
        serde_json::from_value(json!({"content": "x", "requirements": {"id": "solo"}})).unwrap();
    assert!(request.requirement_specs().is_empty());
}

#[test]
fn test_parse_requirement_accepts_type_alias() {
    let spec = parse_requirement(
        &json!({
            "id": "body_structure",
            "type": "structure_check",
            "minParagraphs": 3,
            "description": "Three paragraphs"
        }),
        0,
    );

    assert_eq!(spec.id, RequirementId::new("body_structure"));
    assert_eq!(
        spec.kind,
        RequirementKind::StructureCheck {
            min_paragraphs: Some(3)
        }
    );
    assert_eq!(spec.description, "Three paragraphs");
}

#[test]
fn test_parse_requirement_missing_id_uses_position() {
    let spec = parse_requirement(
        &json!({"type": "contains_keywords", "requiredKeywords": ["because"]}),
        4,
    );
    assert_eq!(spec.id, RequirementId::new("requirement_4"));
}

#[test]
fn test_parse_requirement_malformed_degrades() {
    let spec = parse_requirement(&json!({"id": "broken", "maxValue": [1, 2]}), 0);
    assert_eq!(spec.id, RequirementId::new("broken"));
    assert_eq!(
        spec.kind,
        RequirementKind::Unknown {
            kind: "malformed".to_string()
        }
    );

    let not_an_object = parse_requirement(&json!("word_count"), 1);
    assert_eq!(not_an_object.id, RequirementId::new("requirement_1"));
}

// =============================================================================
// CHECK REQUIREMENTS RESPONSE TESTS
// =============================================================================

#[test]
fn test_check_response_wire_shape() {
    let result = EvaluationResult {
        passed_requirement_ids: vec![RequirementId::new("a")],
        failed_requirement_ids: vec![],
        is_completed: true,
        feedback: "done".to_string(),
        detailed_feedback: vec!["A: ok".to_string()],
        word_count: 3,
        character_count: 14,
        ..EvaluationResult::default()
    };

    let response =
        CheckRequirementsResponse::from_result(result, true, "2026-01-01T00:00:00+00:00".into());
    let value = serde_json::to_value(&response).unwrap();

    assert_eq!(value["passedRequirements"], json!(["a"]));
    assert_eq!(value["failedRequirements"], json!([]));
    assert_eq!(value["isCompleted"], json!(true));
    assert_eq!(value["isLastStageCompleted"], json!(true));
    assert_eq!(value["wordCount"], json!(3));
    assert_eq!(value["characterCount"], json!(14));
    assert_eq!(value["detailedFeedback"], json!(["A: ok"]));
    assert_eq!(value["timestamp"], json!("2026-01-01T00:00:00+00:00"));
}

#[test]
fn test_check_error_wire_shape() {
    let value = serde_json::to_value(CheckRequirementsError::new("Content is required")).unwrap();

    assert_eq!(value["error"], json!("Content is required"));
    assert_eq!(value["passedRequirements"], json!([]));
    assert_eq!(value["failedRequirements"], json!([]));
    assert_eq!(value["isCompleted"], json!(false));
    assert_eq!(
        value["feedback"],
        json!("Error checking requirements. Please try again.")
    );
    assert_eq!(
        value["detailedFeedback"],
        json!(["Error: Content is required"])
    );
}

// =============================================================================
// ADVANCE / PROJECT REQUEST TESTS
// =============================================================================

#[test]
fn test_advance_request_defaults_mode() {
    let request: AdvanceRequest = serde_json::from_value(json!({
        "currentStageId": "planning",
        "evaluationResult": {"isCompleted": true, "passedRequirements": ["plan_length"]}
    }))
    .unwrap();

    assert_eq!(request.mode, WritingMode::Essay);
    assert_eq!(request.current_stage_id, "planning");
    let result = EvaluationResult::from(request.evaluation_result);
    assert!(result.is_completed);
    assert_eq!(result.passed_requirement_ids, vec![RequirementId::new("plan_length")]);
}

#[test]
fn test_advance_summary_with_failures_is_not_completed() {
    let request: AdvanceRequest = serde_json::from_value(json!({
        "currentStageId": "thesis_statement",
        "evaluationResult": {"isCompleted": true, "failedRequirements": ["thesis_length"]}
    }))
    .unwrap();

    let result = EvaluationResult::from(request.evaluation_result);
    assert!(!result.is_completed);
    assert_eq!(result.failed_requirement_ids, vec![RequirementId::new("thesis_length")]);
}

#[test]
fn test_create_project_request() {
    let request: CreateProjectRequest =
        serde_json::from_value(json!({"title": "Rivers", "mode": "thesis"})).unwrap();
    assert_eq!(request.mode, WritingMode::Thesis);
    assert_eq!(request.word_limit, None);

    assert!(serde_json::from_value::<CreateProjectRequest>(json!({"title": "x", "mode": "poem"})).is_err());
}

#[test]
fn test_write_request_optional_fields() {
    let request: WriteContentRequest = serde_json::from_value(json!({})).unwrap();
    assert!(request.content.is_none());
    assert!(request.expected_version.is_none());
}

// =============================================================================
// RESPONSE CONVERSION TESTS
// =============================================================================

#[test]
fn test_write_response_without_budget() {
    let response = WriteContentResponse::from(WriteOutcome {
        stage_id: StageId::new("planning"),
        version: 2,
        status: StageStatus::InProgress,
        word_count: 60,
        budget: None,
    });

    let value = serde_json::to_value(&response).unwrap();
    assert_eq!(value["stageId"], json!("planning"));
    assert_eq!(value["status"], json!("in_progress"));
    assert_eq!(value["overWordLimit"], json!(false));
    assert_eq!(value["projectedCountedWords"], json!(null));
}

#[test]
fn test_evaluate_response_transitions() {
    let advanced = EvaluateResponse::from(StageEvaluation {
        stage_id: StageId::new("planning"),
        result: EvaluationResult::default(),
        transition: Transition::Advanced {
            next_stage_id: StageId::new("introduction"),
        },
    });
    assert_eq!(advanced.transition, "advanced");
    assert_eq!(advanced.next_stage_id.as_deref(), Some("introduction"));

    let completed = EvaluateResponse::from(StageEvaluation {
        stage_id: StageId::new("conclusion"),
        result: EvaluationResult::default(),
        transition: Transition::ProjectCompleted { overall_score: 85 },
    });
    assert_eq!(completed.transition, "project_completed");
    assert_eq!(completed.overall_score.as_deref(), Some("8.5/10"));
}

#[test]
fn test_stages_response_lists_requirements() {
    let catalog = StageCatalog::builtin();
    let response = StagesResponse::from(catalog.registry(WritingMode::Essay).unwrap());
    let value = serde_json::to_value(&response).unwrap();

    assert_eq!(value["mode"], json!("essay"));
    assert_eq!(value["defaultWordLimit"], json!(500));
    assert_eq!(value["stages"][0]["id"], json!("thesis_statement"));
    assert_eq!(value["stages"][0]["countsTowardBudget"], json!(false));
    assert_eq!(value["stages"][3]["requirements"].as_array().unwrap().len(), 2);
}

#[test]
fn test_project_json_includes_locked_stages() {
    let engine = ProgressionEngine::new(Arc::new(StageCatalog::builtin()));
    let state = engine
        .start_project(ProjectId(3), "Rivers", WritingMode::Thesis, None)
        .unwrap();
    let registry = engine.registry(WritingMode::Thesis).unwrap();

    let project = ProjectJson::from_state(&state, registry);
    assert_eq!(project.id, 3);
    assert_eq!(project.word_limit, None);
    assert_eq!(project.counted_words, 0);
    assert_eq!(project.overall_score, None);
    assert_eq!(project.stages.len(), 5);
    assert_eq!(project.stages[0].status, "unlocked");
    assert_eq!(project.stages[4].status, "locked");
    assert_eq!(project.stages[4].version, 0);
}
