//! # Validation Tier Tests (T0-T4)
//!
//! If ANY tier fails, the engine is INVALID.
//!
//! ## Tiers
//! - T0: Input Validation
//! - T1: Requirement Rules
//! - T2: Stage Evaluation Scenarios
//! - T3: Stage Progression
//! - T4: Registry Configuration

#![allow(clippy::unwrap_used, clippy::panic)]

use stagegate_core::primitives::{
    FEEDBACK_ADVANCE, FEEDBACK_INSUFFICIENT, FEEDBACK_PROJECT_COMPLETE, WORD_LIMIT_REQUIREMENT_ID,
};
use stagegate_core::{
    EvaluationContext, ProgressionEngine, ProjectId, ProjectStatus, RequirementId, RequirementSpec,
    StageCatalog, StageDefinition, StageGateError, StageId, StageRegistry, StageStatus, Transition,
    WritingMode, evaluate_stage,
};
use std::sync::Arc;

fn words(n: usize) -> String {
    vec!["word"; n].join(" ")
}

fn ctx() -> EvaluationContext {
    EvaluationContext::default()
}

// =============================================================================
// TIER T0: INPUT VALIDATION
// =============================================================================

mod t0_input_validation {
    use super::*;
    use stagegate_core::primitives::MAX_CONTENT_LENGTH;
    use stagegate_core::require_content;

    /// T0.1: Absent content is rejected before evaluation.
    #[test]
    fn absent_content_rejected() {
        assert!(matches!(
            require_content(None),
            Err(StageGateError::InvalidContent(_))
        ));
    }

    /// T0.2: Empty content is valid input.
    #[test]
    fn empty_content_accepted() {
        assert!(require_content(Some("")).is_ok());
    }

    /// T0.3: Oversized content is rejected.
    #[test]
    fn oversized_content_rejected() {
        let big = "x".repeat(MAX_CONTENT_LENGTH + 1);
        let err = require_content(Some(big.as_str())).unwrap_err();
        assert!(err.is_input_error());
    }
}

// =============================================================================
// TIER T1: REQUIREMENT RULES
// =============================================================================

mod t1_requirement_rules {
    use super::*;
    use stagegate_core::RequirementKind;

    /// T1.1: Absent max is unbounded, absent min is zero.
    #[test]
    fn open_bounds() {
        let req = [RequirementSpec::word_count("len", None, None)];
        assert!(evaluate_stage("", &req, &ctx()).unwrap().is_completed);
        assert!(evaluate_stage(&words(5000), &req, &ctx()).unwrap().is_completed);
    }

    /// T1.2: A max of zero is a real bound.
    #[test]
    fn zero_max_is_bound() {
        let req = [RequirementSpec::word_count("len", None, Some(0))];
        assert!(evaluate_stage("", &req, &ctx()).unwrap().is_completed);
        assert!(!evaluate_stage("one", &req, &ctx()).unwrap().is_completed);
    }

    /// T1.3: Keywords match any, not all.
    #[test]
    fn keywords_match_any() {
        let req = [RequirementSpec::keywords("kw", ["alpha", "beta", "gamma"])];
        let result = evaluate_stage("only BETA here", &req, &ctx()).unwrap();
        assert!(result.is_completed);
    }

    /// T1.4: Unknown kinds never block.
    #[test]
    fn unknown_kind_never_blocks() {
        let req = [
            RequirementSpec::new(
                "future",
                RequirementKind::Unknown {
                    kind: "citation_style".to_string(),
                },
            ),
            RequirementSpec::word_count("len", Some(1), None),
        ];
        let result = evaluate_stage("text", &req, &ctx()).unwrap();
        assert!(result.is_completed);
        assert_eq!(result.passed_requirement_ids.len(), 2);
    }

    /// T1.5: Structure check counts blank-line separated paragraphs.
    #[test]
    fn structure_check() {
        let req = [RequirementSpec::paragraphs("body", 3)];
        let two = "First point.\n\nSecond point.";
        let three = "First point.\n\nSecond point.\n\n\nThird point.";
        assert!(!evaluate_stage(two, &req, &ctx()).unwrap().is_completed);
        assert!(evaluate_stage(three, &req, &ctx()).unwrap().is_completed);
    }
}

// =============================================================================
// TIER T2: STAGE EVALUATION SCENARIOS
// =============================================================================

mod t2_scenarios {
    use super::*;

    /// Scenario 1: three words against a 15-40 word range fails as too short.
    #[test]
    fn scenario_too_short() {
        let req = [RequirementSpec::word_count("thesis_length", Some(15), Some(40))];
        let result = evaluate_stage("word word word", &req, &ctx()).unwrap();

        assert!(!result.is_completed);
        assert_eq!(result.word_count, 3);
        assert_eq!(
            result.failed_requirement_ids,
            vec![RequirementId::new("thesis_length")]
        );
        assert!(result.detailed_feedback[0].to_lowercase().contains("too short"));
        assert_eq!(result.feedback, FEEDBACK_INSUFFICIENT);
    }

    /// Scenario 2: "because" satisfies a keyword list containing it.
    #[test]
    fn scenario_keyword_found() {
        let req = [RequirementSpec::keywords("thesis_arguable", ["argu", "because"])];
        let result = evaluate_stage("Transit matters because cities grow.", &req, &ctx()).unwrap();

        assert!(result.is_completed);
        assert!(result.detailed_feedback[0].ends_with("Found keywords: because"));
    }

    /// Scenario 3: the final stage uses the completion message, others the advance message.
    #[test]
    fn scenario_final_stage_message() {
        let req = [RequirementSpec::word_count("len", Some(1), None)];
        let final_ctx = EvaluationContext {
            is_final_stage: true,
            ..ctx()
        };
        let last = evaluate_stage("done", &req, &final_ctx).unwrap();
        let middle = evaluate_stage("done", &req, &ctx()).unwrap();

        assert!(last.is_completed);
        assert_eq!(last.feedback, FEEDBACK_PROJECT_COMPLETE);
        assert_eq!(middle.feedback, FEEDBACK_ADVANCE);
    }

    /// Scenario 4: counted total 480 -> 520 against a limit of 500 fails
    /// even though every stage requirement passes.
    #[test]
    fn scenario_budget_enforced_independently() {
        let req = [RequirementSpec::word_count("intro_length", Some(80), Some(150))];
        // Other counted stages hold 400 words; this stage goes from 80 to 120.
        let budget_ctx = EvaluationContext {
            word_limit: Some(500),
            counted_words_excluding_this_stage: Some(400),
            is_final_stage: false,
        };

        let before = evaluate_stage(&words(80), &req, &budget_ctx).unwrap();
        assert!(before.is_completed);

        let after = evaluate_stage(&words(120), &req, &budget_ctx).unwrap();
        assert!(!after.is_completed);
        assert!(after.over_word_limit());
        assert_eq!(
            after.failed_requirement_ids,
            vec![RequirementId::new(WORD_LIMIT_REQUIREMENT_ID)]
        );
        assert_eq!(
            after.passed_requirement_ids,
            vec![RequirementId::new("intro_length")]
        );
        assert_eq!(after.detailed_feedback[0], "Exceeds word limit: 520 > 500");
    }

    /// Scenario 5: empty content counts zero words and fails any positive minimum.
    #[test]
    fn scenario_empty_content() {
        let req = [RequirementSpec::word_count("len", Some(1), None)];
        let result = evaluate_stage("", &req, &ctx()).unwrap();

        assert_eq!(result.word_count, 0);
        assert_eq!(result.character_count, 0);
        assert!(!result.is_completed);
    }
}

// =============================================================================
// TIER T3: STAGE PROGRESSION
// =============================================================================

mod t3_progression {
    use super::*;

    fn stage(id: &str, counts: bool, min: u32) -> StageDefinition {
        StageDefinition {
            id: StageId::new(id),
            title: id.to_string(),
            description: String::new(),
            order: 0,
            counts_toward_budget: counts,
            requirements: vec![RequirementSpec::word_count(format!("{}_len", id), Some(min), None)],
        }
    }

    fn engine() -> ProgressionEngine {
        let registry = StageRegistry::new(
            WritingMode::Essay,
            Some(500),
            vec![stage("outline", false, 1), stage("draft", true, 1), stage("final", true, 1)],
        )
        .unwrap();
        ProgressionEngine::new(Arc::new(StageCatalog::new(vec![registry]).unwrap()))
    }

    /// T3.1: Stages unlock strictly one after another.
    #[test]
    fn stages_unlock_in_order() {
        let engine = engine();
        let mut state = engine
            .start_project(ProjectId(1), "Essay", WritingMode::Essay, None)
            .unwrap();

        for (id, next) in [("outline", Some("draft")), ("draft", Some("final")), ("final", None)] {
            let id = StageId::new(id);
            assert_eq!(state.project.current_stage_id, id);
            if let Some(next) = next {
                assert_eq!(state.stage_status(&StageId::new(next)), StageStatus::Locked);
            }

            engine.write_content(&mut state, &id, "content", None).unwrap();
            let eval = engine.evaluate(&mut state, &id).unwrap();

            match next {
                Some(next) => assert_eq!(
                    eval.transition,
                    Transition::Advanced {
                        next_stage_id: StageId::new(next)
                    }
                ),
                None => assert!(matches!(eval.transition, Transition::ProjectCompleted { .. })),
            }
        }

        assert_eq!(state.project.status, ProjectStatus::Completed);
    }

    /// T3.2: The 480 -> 520 budget scenario through the engine: the write is
    /// kept, completion is blocked.
    #[test]
    fn over_budget_write_kept_but_blocks_completion() {
        let engine = engine();
        let mut state = engine
            .start_project(ProjectId(1), "Essay", WritingMode::Essay, None)
            .unwrap();
        let outline = StageId::new("outline");
        let draft = StageId::new("draft");
        let last = StageId::new("final");

        engine.write_content(&mut state, &outline, "plan", None).unwrap();
        engine.evaluate(&mut state, &outline).unwrap();
        engine.write_content(&mut state, &draft, &words(400), None).unwrap();
        engine.evaluate(&mut state, &draft).unwrap();

        engine.write_content(&mut state, &last, &words(80), None).unwrap();
        let registry = engine.registry(WritingMode::Essay).unwrap();
        assert_eq!(state.counted_words(registry), 480);

        let outcome = engine.write_content(&mut state, &last, &words(120), None).unwrap();
        assert!(outcome.over_word_limit());
        assert_eq!(state.counted_words(registry), 520);

        let eval = engine.evaluate(&mut state, &last).unwrap();
        assert!(!eval.result.is_completed);
        assert_eq!(eval.transition, Transition::Pending);
        assert_eq!(state.project.status, ProjectStatus::InProgress);
    }

    /// T3.3: Uncounted stages never affect the counted total.
    #[test]
    fn uncounted_stage_excluded_from_budget() {
        let engine = engine();
        let mut state = engine
            .start_project(ProjectId(1), "Essay", WritingMode::Essay, None)
            .unwrap();
        let registry = engine.registry(WritingMode::Essay).unwrap();

        engine
            .write_content(&mut state, &StageId::new("outline"), &words(900), None)
            .unwrap();
        assert_eq!(state.counted_words(registry), 0);
    }

    /// T3.4: Evaluating an unknown stage is an input error.
    #[test]
    fn unknown_stage_rejected() {
        let engine = engine();
        let mut state = engine
            .start_project(ProjectId(1), "Essay", WritingMode::Essay, None)
            .unwrap();
        let err = engine.evaluate(&mut state, &StageId::new("epilogue")).unwrap_err();
        assert!(matches!(err, StageGateError::UnknownStage(_)));
    }

    /// T3.5: An explicit word limit overrides the track default.
    #[test]
    fn explicit_word_limit() {
        let engine = engine();
        let state = engine
            .start_project(ProjectId(1), "Essay", WritingMode::Essay, Some(2000))
            .unwrap();
        assert_eq!(state.project.word_limit, Some(2000));
    }
}

// =============================================================================
// TIER T4: REGISTRY CONFIGURATION
// =============================================================================

mod t4_registry_config {
    use super::*;
    use stagegate_core::{RegistryConfig, RequirementKind};

    const REGISTRY: &str = r#"
[[tracks]]
mode = "essay"
default_word_limit = 750

[[tracks.stages]]
id = "hook"
title = "Opening Hook"
counts_toward_budget = false

[[tracks.stages.requirements]]
id = "hook_length"
kind = "word_count"
min_value = 10
max_value = 60
description = "Hook should be 10-60 words"

[[tracks.stages]]
id = "argument"
counts_toward_budget = true

[[tracks.stages.requirements]]
id = "argument_keywords"
type = "contains_keywords"
required_keywords = ["because", "therefore"]

[[tracks.stages.requirements]]
kind = "tone_check"
"#;

    fn load(text: &str) -> Result<StageCatalog, StageGateError> {
        let config: RegistryConfig = toml::from_str(text).unwrap();
        StageCatalog::from_config(config)
    }

    /// T4.1: A registry file loads in file order with parsed requirement kinds.
    #[test]
    fn registry_file_loads() {
        let catalog = load(REGISTRY).unwrap();
        let essay = catalog.registry(WritingMode::Essay).unwrap();

        assert_eq!(essay.len(), 2);
        assert_eq!(essay.default_word_limit(), Some(750));
        assert_eq!(essay.title(&StageId::new("argument")), "Argument");

        let argument = essay.requirements(&StageId::new("argument"));
        assert_eq!(
            argument[0].kind,
            RequirementKind::ContainsKeywords {
                keywords: vec!["because".to_string(), "therefore".to_string()]
            }
        );
        assert_eq!(argument[1].id.as_str(), "requirement_1");
        assert_eq!(
            argument[1].kind,
            RequirementKind::Unknown {
                kind: "tone_check".to_string()
            }
        );
        assert_eq!(
            essay.successor(&StageId::new("hook")).map(|s| s.id.as_str()),
            Some("argument")
        );
    }

    /// T4.2: Duplicate stage ids are rejected.
    #[test]
    fn duplicate_stage_rejected() {
        let text = r#"
[[tracks]]
mode = "thesis"

[[tracks.stages]]
id = "abstract"

[[tracks.stages]]
id = "abstract"
"#;
        assert!(matches!(load(text), Err(StageGateError::InvalidRegistry(_))));
    }

    /// T4.3: A track without stages is rejected.
    #[test]
    fn empty_track_rejected() {
        let text = r#"
[[tracks]]
mode = "essay"
"#;
        assert!(matches!(load(text), Err(StageGateError::InvalidRegistry(_))));
    }
}
