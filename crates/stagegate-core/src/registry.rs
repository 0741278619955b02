//! # Stage Definition Registry
//!
//! Immutable catalog of the stages in each writing track: ordering, titles,
//! requirement sets and whether a stage counts toward the project word budget.
//!
//! The catalog is built once (from the built-in tracks or a registry file) and
//! handed to the engine explicitly. Lookups are pure; an unknown stage id
//! yields an empty requirement set rather than an error.
//!
//! Tracks are strictly linear: the successor of the stage at `order` is the
//! stage at `order + 1`.

use crate::primitives::{DEFAULT_ESSAY_WORD_LIMIT, MAX_REQUIREMENTS_PER_STAGE};
use crate::requirement::{RequirementDraft, RequirementSpec};
use crate::{StageGateError, StageId, WritingMode};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// STAGE DEFINITION
// =============================================================================

/// One stage of a track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDefinition {
    pub id: StageId,
    pub title: String,
    pub description: String,
    /// 0-based position in the track.
    pub order: usize,
    pub counts_toward_budget: bool,
    pub requirements: Vec<RequirementSpec>,
}

// =============================================================================
// STAGE REGISTRY (one track)
// =============================================================================

/// The ordered stages of one writing track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageRegistry {
    mode: WritingMode,
    default_word_limit: Option<u32>,
    stages: Vec<StageDefinition>,
    index: BTreeMap<StageId, usize>,
}

impl StageRegistry {
    /// Build a registry, assigning contiguous `order` values from position.
    pub fn new(
        mode: WritingMode,
        default_word_limit: Option<u32>,
        stages: Vec<StageDefinition>,
    ) -> Result<Self, StageGateError> {
        if stages.is_empty() {
            return Err(StageGateError::InvalidRegistry(format!(
                "track '{}' has no stages",
                mode
            )));
        }

        let mut index = BTreeMap::new();
        let mut ordered = Vec::with_capacity(stages.len());
        for (order, mut stage) in stages.into_iter().enumerate() {
            if index.insert(stage.id.clone(), order).is_some() {
                return Err(StageGateError::InvalidRegistry(format!(
                    "duplicate stage id '{}' in track '{}'",
                    stage.id, mode
                )));
            }

            if stage.requirements.len() > MAX_REQUIREMENTS_PER_STAGE {
                return Err(StageGateError::InvalidRegistry(format!(
                    "stage '{}' has {} requirements (maximum {})",
                    stage.id,
                    stage.requirements.len(),
                    MAX_REQUIREMENTS_PER_STAGE
                )));
            }

            let mut seen = BTreeSet::new();
            for req in &stage.requirements {
                if !seen.insert(&req.id) {
                    return Err(StageGateError::InvalidRegistry(format!(
                        "duplicate requirement id '{}' in stage '{}'",
                        req.id, stage.id
                    )));
                }
            }

            stage.order = order;
            ordered.push(stage);
        }

        Ok(Self {
            mode,
            default_word_limit,
            stages: ordered,
            index,
        })
    }

    #[must_use]
    pub fn mode(&self) -> WritingMode {
        self.mode
    }

    #[must_use]
    pub fn default_word_limit(&self) -> Option<u32> {
        self.default_word_limit
    }

    /// All stages in order.
    #[must_use]
    pub fn stages(&self) -> &[StageDefinition] {
        &self.stages
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    #[must_use]
    pub fn first(&self) -> Option<&StageDefinition> {
        self.stages.first()
    }

    #[must_use]
    pub fn get(&self, id: &StageId) -> Option<&StageDefinition> {
        self.index.get(id).and_then(|&i| self.stages.get(i))
    }

    #[must_use]
    pub fn contains(&self, id: &StageId) -> bool {
        self.index.contains_key(id)
    }

    #[must_use]
    pub fn position(&self, id: &StageId) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Requirements of a stage; empty for unknown ids.
    #[must_use]
    pub fn requirements(&self, id: &StageId) -> &[RequirementSpec] {
        self.get(id).map_or(&[], |s| s.requirements.as_slice())
    }

    /// Whether the stage counts toward the global budget. Unknown ids do not.
    #[must_use]
    pub fn counts_toward_budget(&self, id: &StageId) -> bool {
        self.get(id).is_some_and(|s| s.counts_toward_budget)
    }

    /// The stage after `id`, or `None` if `id` is terminal or unknown.
    #[must_use]
    pub fn successor(&self, id: &StageId) -> Option<&StageDefinition> {
        let pos = self.position(id)?;
        self.stages.get(pos.saturating_add(1))
    }

    /// The stage before `id`, or `None` if `id` is first or unknown.
    #[must_use]
    pub fn predecessor(&self, id: &StageId) -> Option<&StageDefinition> {
        let pos = self.position(id)?;
        pos.checked_sub(1).and_then(|p| self.stages.get(p))
    }

    #[must_use]
    pub fn is_final(&self, id: &StageId) -> bool {
        self.position(id)
            .is_some_and(|p| p.saturating_add(1) == self.stages.len())
    }

    /// Display title; unknown ids are humanised (`body_paragraphs` -> `Body Paragraphs`).
    #[must_use]
    pub fn title(&self, id: &StageId) -> String {
        match self.get(id) {
            Some(stage) => stage.title.clone(),
            None => humanize(id.as_str()),
        }
    }
}

fn humanize(id: &str) -> String {
    id.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// =============================================================================
// STAGE CATALOG (all tracks)
// =============================================================================

/// One registry per writing mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageCatalog {
    tracks: BTreeMap<WritingMode, StageRegistry>,
}

impl StageCatalog {
    pub fn new(registries: Vec<StageRegistry>) -> Result<Self, StageGateError> {
        let mut tracks = BTreeMap::new();
        for registry in registries {
            let mode = registry.mode();
            if tracks.insert(mode, registry).is_some() {
                return Err(StageGateError::InvalidRegistry(format!(
                    "track '{}' defined more than once",
                    mode
                )));
            }
        }
        if tracks.is_empty() {
            return Err(StageGateError::InvalidRegistry(
                "catalog defines no tracks".to_string(),
            ));
        }
        Ok(Self { tracks })
    }

    /// The built-in essay and thesis tracks.
    #[must_use]
    pub fn builtin() -> Self {
        let mut tracks = BTreeMap::new();
        tracks.insert(WritingMode::Essay, builtin::essay());
        tracks.insert(WritingMode::Thesis, builtin::thesis());
        Self { tracks }
    }

    /// Build a catalog from deserialized registry configuration.
    pub fn from_config(config: RegistryConfig) -> Result<Self, StageGateError> {
        let registries = config
            .tracks
            .into_iter()
            .map(TrackConfig::into_registry)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(registries)
    }

    pub fn registry(&self, mode: WritingMode) -> Result<&StageRegistry, StageGateError> {
        self.tracks.get(&mode).ok_or_else(|| {
            StageGateError::InvalidRegistry(format!("no track configured for mode '{}'", mode))
        })
    }

    pub fn modes(&self) -> impl Iterator<Item = WritingMode> + '_ {
        self.tracks.keys().copied()
    }
}

// =============================================================================
// REGISTRY CONFIGURATION (file shape)
// =============================================================================

/// Top-level registry file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub tracks: Vec<TrackConfig>,
}

/// One `[[tracks]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackConfig {
    pub mode: WritingMode,
    #[serde(default)]
    pub default_word_limit: Option<u32>,
    #[serde(default)]
    pub stages: Vec<StageConfig>,
}

/// One `[[tracks.stages]]` entry. Order is file order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageConfig {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub counts_toward_budget: bool,
    #[serde(default)]
    pub requirements: Vec<RequirementDraft>,
}

impl TrackConfig {
    fn into_registry(self) -> Result<StageRegistry, StageGateError> {
        let stages = self
            .stages
            .into_iter()
            .map(|stage| StageDefinition {
                title: stage.title.unwrap_or_else(|| humanize(&stage.id)),
                id: StageId::new(stage.id),
                description: stage.description,
                order: 0,
                counts_toward_budget: stage.counts_toward_budget,
                requirements: stage
                    .requirements
                    .into_iter()
                    .enumerate()
                    .map(|(i, draft)| draft.into_spec(i))
                    .collect(),
            })
            .collect();
        StageRegistry::new(self.mode, self.default_word_limit, stages)
    }
}

// =============================================================================
// BUILT-IN TRACKS
// =============================================================================

mod builtin {
    use super::{DEFAULT_ESSAY_WORD_LIMIT, StageDefinition, StageRegistry};
    use crate::requirement::RequirementSpec;
    use crate::{StageId, WritingMode};

    fn stage(
        id: &str,
        title: &str,
        description: &str,
        counts_toward_budget: bool,
        requirements: Vec<RequirementSpec>,
    ) -> StageDefinition {
        StageDefinition {
            id: StageId::new(id),
            title: title.to_string(),
            description: description.to_string(),
            order: 0,
            counts_toward_budget,
            requirements,
        }
    }

    fn registry(mode: WritingMode, limit: Option<u32>, stages: Vec<StageDefinition>) -> StageRegistry {
        let index = stages
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id.clone(), i))
            .collect();
        let stages = stages
            .into_iter()
            .enumerate()
            .map(|(order, mut s)| {
                s.order = order;
                s
            })
            .collect();
        StageRegistry {
            mode,
            default_word_limit: limit,
            stages,
            index,
        }
    }

    pub(super) fn essay() -> StageRegistry {
        registry(
            WritingMode::Essay,
            Some(DEFAULT_ESSAY_WORD_LIMIT),
            vec![
                stage(
                    "thesis_statement",
                    "Thesis Statement",
                    "Create a clear, arguable thesis that answers the prompt",
                    false,
                    vec![
                        RequirementSpec::word_count("thesis_length", Some(15), Some(40))
                            .with_description("Thesis should be 15-40 words")
                            .with_error_message("Thesis is too short or too long"),
                        RequirementSpec::keywords(
                            "thesis_arguable",
                            ["argu", "position", "claim", "assert", "because", "therefore"],
                        )
                        .with_description("Thesis must take a clear position")
                        .with_error_message("Your thesis needs to make a clear, arguable claim"),
                    ],
                ),
                stage(
                    "planning",
                    "Essay Plan",
                    "Outline your main arguments and evidence",
                    false,
                    vec![
                        RequirementSpec::word_count("plan_length", Some(50), None)
                            .with_description("Plan should outline at least 3 main points")
                            .with_error_message("Your plan needs more detail (minimum 50 words)"),
                    ],
                ),
                stage(
                    "introduction",
                    "Introduction",
                    "Introduce your topic and thesis",
                    true,
                    vec![
                        RequirementSpec::word_count("intro_length", Some(80), Some(150))
                            .with_description("Introduction should be 80-150 words")
                            .with_error_message("Introduction is too short or too long"),
                    ],
                ),
                stage(
                    "body_paragraphs",
                    "Body Paragraphs",
                    "Develop your arguments with evidence",
                    true,
                    vec![
                        RequirementSpec::word_count("body_length", Some(300), None)
                            .with_description("Body paragraphs should be at least 300 words")
                            .with_error_message(
                                "Body paragraphs need more development (minimum 300 words)",
                            ),
                        RequirementSpec::paragraphs("body_structure", 3)
                            .with_description("Body should contain at least 3 paragraphs")
                            .with_error_message("Separate each argument into its own paragraph"),
                    ],
                ),
                stage(
                    "conclusion",
                    "Conclusion",
                    "Summarize and show significance",
                    true,
                    vec![
                        RequirementSpec::word_count("conclusion_length", Some(80), Some(150))
                            .with_description("Conclusion should be 80-150 words")
                            .with_error_message("Conclusion is too short or too long"),
                    ],
                ),
            ],
        )
    }

    pub(super) fn thesis() -> StageRegistry {
        registry(
            WritingMode::Thesis,
            None,
            vec![
                stage(
                    "research_proposal",
                    "Research Proposal",
                    "Define your research question and objectives",
                    false,
                    vec![
                        RequirementSpec::word_count("proposal_length", Some(200), None)
                            .with_description("Proposal should be 200+ words")
                            .with_error_message("Proposal needs more detail (minimum 200 words)"),
                        RequirementSpec::keywords(
                            "research_question",
                            ["what", "how", "why", "effect", "impact", "relationship", "influence"],
                        )
                        .with_description("Must contain a clear research question")
                        .with_error_message("Your proposal needs a clear research question"),
                    ],
                ),
                stage(
                    "literature_review",
                    "Literature Review",
                    "Survey and synthesise existing research",
                    true,
                    vec![
                        RequirementSpec::word_count("review_length", Some(500), None)
                            .with_description("Literature review should be at least 500 words")
                            .with_error_message("Your review needs more sources and synthesis"),
                        RequirementSpec::paragraphs("review_structure", 3)
                            .with_description("Review should contain at least 3 paragraphs")
                            .with_error_message("Group sources into separate paragraphs"),
                    ],
                ),
                stage(
                    "methodology",
                    "Methodology",
                    "Describe how the research is carried out",
                    true,
                    vec![
                        RequirementSpec::word_count("method_length", Some(300), None)
                            .with_description("Methodology should be at least 300 words")
                            .with_error_message("Describe your method in more detail"),
                        RequirementSpec::keywords(
                            "method_terms",
                            ["data", "sample", "survey", "interview", "analysis", "experiment"],
                        )
                        .with_description("Methodology must name a data or analysis approach")
                        .with_error_message("State how data is collected and analysed"),
                    ],
                ),
                stage(
                    "conclusion",
                    "Conclusion",
                    "Summarise findings and their implications",
                    true,
                    vec![
                        RequirementSpec::word_count("conclusion_length", Some(200), None)
                            .with_description("Conclusion should be at least 200 words")
                            .with_error_message("Conclusion needs more detail (minimum 200 words)"),
                    ],
                ),
                stage(
                    "abstract",
                    "Abstract",
                    "Summarise the whole thesis",
                    false,
                    vec![
                        RequirementSpec::word_count("abstract_length", Some(150), Some(300))
                            .with_description("Abstract should be 150-300 words")
                            .with_error_message("Abstract is too short or too long"),
                    ],
                ),
            ],
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requirement::RequirementKind;

    fn def(id: &str, counts: bool) -> StageDefinition {
        StageDefinition {
            id: StageId::new(id),
            title: id.to_string(),
            description: String::new(),
            order: 99,
            counts_toward_budget: counts,
            requirements: vec![],
        }
    }

    #[test]
    fn orders_are_contiguous() {
        let registry = StageRegistry::new(
            WritingMode::Essay,
            None,
            vec![def("a", false), def("b", true), def("c", true)],
        )
        .expect("registry");
        let orders: Vec<usize> = registry.stages().iter().map(|s| s.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
    }

    #[test]
    fn rejects_oversized_requirement_set() {
        let mut stage = def("a", true);
        stage.requirements = (0..=MAX_REQUIREMENTS_PER_STAGE)
            .map(|i| RequirementSpec::paragraphs(format!("r{}", i), 1))
            .collect();
        let result = StageRegistry::new(WritingMode::Essay, None, vec![stage]);
        assert!(matches!(result, Err(StageGateError::InvalidRegistry(_))));
    }

    #[test]
    fn successor_chain_is_linear() {
        let registry = StageCatalog::builtin();
        let essay = registry.registry(WritingMode::Essay).expect("essay");
        let mut id = essay.first().expect("first").id.clone();
        let mut visited = vec![id.clone()];
        while let Some(next) = essay.successor(&id) {
            id = next.id.clone();
            visited.push(id.clone());
        }
        assert_eq!(visited.len(), essay.len());
        assert!(essay.is_final(&id));
        assert_eq!(id.as_str(), "conclusion");
    }

    #[test]
    fn unknown_stage_has_no_requirements() {
        let catalog = StageCatalog::builtin();
        let essay = catalog.registry(WritingMode::Essay).expect("essay");
        let missing = StageId::new("references");
        assert!(essay.requirements(&missing).is_empty());
        assert!(!essay.counts_toward_budget(&missing));
        assert!(essay.successor(&missing).is_none());
        assert_eq!(essay.title(&missing), "References");
    }

    #[test]
    fn duplicate_stage_rejected() {
        let result = StageRegistry::new(WritingMode::Essay, None, vec![def("a", false), def("a", true)]);
        assert!(matches!(result, Err(StageGateError::InvalidRegistry(_))));
    }

    #[test]
    fn duplicate_requirement_rejected() {
        let mut stage = def("a", false);
        stage.requirements = vec![
            RequirementSpec::word_count("r", None, None),
            RequirementSpec::keywords("r", ["x"]),
        ];
        let result = StageRegistry::new(WritingMode::Essay, None, vec![stage]);
        assert!(matches!(result, Err(StageGateError::InvalidRegistry(_))));
    }

    #[test]
    fn empty_track_rejected() {
        let result = StageRegistry::new(WritingMode::Thesis, None, vec![]);
        assert!(matches!(result, Err(StageGateError::InvalidRegistry(_))));
    }

    #[test]
    fn builtin_budget_flags() {
        let catalog = StageCatalog::builtin();
        let essay = catalog.registry(WritingMode::Essay).expect("essay");
        assert!(!essay.counts_toward_budget(&StageId::new("planning")));
        assert!(essay.counts_toward_budget(&StageId::new("introduction")));
        assert_eq!(essay.default_word_limit(), Some(DEFAULT_ESSAY_WORD_LIMIT));
    }

    #[test]
    fn config_builds_registry() {
        let config = RegistryConfig {
            tracks: vec![TrackConfig {
                mode: WritingMode::Essay,
                default_word_limit: Some(300),
                stages: vec![StageConfig {
                    id: "opening_hook".to_string(),
                    title: None,
                    description: String::new(),
                    counts_toward_budget: true,
                    requirements: vec![RequirementDraft {
                        kind: Some("word_count".to_string()),
                        min_value: Some(5),
                        ..RequirementDraft::default()
                    }],
                }],
            }],
        };
        let catalog = StageCatalog::from_config(config).expect("catalog");
        let essay = catalog.registry(WritingMode::Essay).expect("essay");
        let id = StageId::new("opening_hook");
        assert_eq!(essay.title(&id), "Opening Hook");
        assert_eq!(
            essay.requirements(&id)[0].kind,
            RequirementKind::WordCount {
                min: Some(5),
                max: None
            }
        );
        assert!(catalog.registry(WritingMode::Thesis).is_err());
    }
}
