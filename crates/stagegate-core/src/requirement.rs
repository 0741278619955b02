//! # Requirement Specifications
//!
//! A requirement is one mechanical check attached to a stage. Each kind
//! carries only the parameters it uses, so evaluation is an exhaustive match.
//!
//! Two shapes exist:
//! - [`RequirementSpec`]: the typed form the engine evaluates and stores.
//! - [`RequirementDraft`]: the flat, all-optional form found in registry files
//!   and request bodies. Converting a draft never fails; unrecognised kinds
//!   become [`RequirementKind::Unknown`] and missing parameters take their
//!   most permissive value.

use crate::RequirementId;
use serde::{Deserialize, Serialize};

// =============================================================================
// REQUIREMENT KIND
// =============================================================================

/// The check performed by a requirement, with its kind-specific parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequirementKind {
    /// Word count must fall within `[min, max]`. `None` bounds are open.
    WordCount { min: Option<u32>, max: Option<u32> },
    /// At least one keyword must occur as a case-insensitive substring.
    /// An empty list always passes.
    ContainsKeywords { keywords: Vec<String> },
    /// Content must have at least `min_paragraphs` blank-line separated paragraphs.
    StructureCheck { min_paragraphs: Option<u32> },
    /// A kind this engine does not understand. Always passes.
    Unknown { kind: String },
}

impl RequirementKind {
    /// Wire name of the kind.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            RequirementKind::WordCount { .. } => "word_count",
            RequirementKind::ContainsKeywords { .. } => "contains_keywords",
            RequirementKind::StructureCheck { .. } => "structure_check",
            RequirementKind::Unknown { kind } => kind,
        }
    }
}

// =============================================================================
// REQUIREMENT SPEC
// =============================================================================

/// A single requirement attached to a stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementSpec {
    pub id: RequirementId,
    pub kind: RequirementKind,
    /// Display text; not used by evaluation.
    pub description: String,
    /// Display text; not used by evaluation.
    pub error_message: String,
}

impl RequirementSpec {
    #[must_use]
    pub fn new(id: impl Into<String>, kind: RequirementKind) -> Self {
        Self {
            id: RequirementId::new(id),
            kind,
            description: String::new(),
            error_message: String::new(),
        }
    }

    #[must_use]
    pub fn word_count(id: impl Into<String>, min: Option<u32>, max: Option<u32>) -> Self {
        Self::new(id, RequirementKind::WordCount { min, max })
    }

    #[must_use]
    pub fn keywords<I, S>(id: impl Into<String>, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            id,
            RequirementKind::ContainsKeywords {
                keywords: keywords.into_iter().map(Into::into).collect(),
            },
        )
    }

    #[must_use]
    pub fn paragraphs(id: impl Into<String>, min_paragraphs: u32) -> Self {
        Self::new(
            id,
            RequirementKind::StructureCheck {
                min_paragraphs: Some(min_paragraphs),
            },
        )
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = message.into();
        self
    }

    /// Label used as the prefix of this requirement's feedback line.
    #[must_use]
    pub fn label(&self) -> &str {
        if self.description.is_empty() {
            self.id.as_str()
        } else {
            &self.description
        }
    }
}

// =============================================================================
// REQUIREMENT DRAFT (flat config / wire shape)
// =============================================================================

/// Flat, permissive requirement shape used by registry files and request bodies.
///
/// Field names accept both `camelCase` (request bodies) and `snake_case`
/// (TOML registry files); the kind may be given as `kind` or `type`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RequirementDraft {
    pub id: Option<String>,
    #[serde(alias = "type")]
    pub kind: Option<String>,
    #[serde(alias = "min_value")]
    pub min_value: Option<u32>,
    #[serde(alias = "max_value")]
    pub max_value: Option<u32>,
    #[serde(alias = "required_keywords")]
    pub required_keywords: Option<Vec<String>>,
    #[serde(alias = "min_paragraphs")]
    pub min_paragraphs: Option<u32>,
    pub description: Option<String>,
    #[serde(alias = "error_message")]
    pub error_message: Option<String>,
}

impl RequirementDraft {
    /// Convert into a typed spec. `position` names requirements without an id.
    #[must_use]
    pub fn into_spec(self, position: usize) -> RequirementSpec {
        let kind_name = self.kind.unwrap_or_default();
        let kind = match kind_name.as_str() {
            "word_count" => RequirementKind::WordCount {
                min: self.min_value,
                max: self.max_value,
            },
            "contains_keywords" => RequirementKind::ContainsKeywords {
                keywords: self.required_keywords.unwrap_or_default(),
            },
            "structure_check" => RequirementKind::StructureCheck {
                min_paragraphs: self.min_paragraphs,
            },
            _ => RequirementKind::Unknown { kind: kind_name },
        };

        RequirementSpec {
            id: RequirementId::new(
                self.id
                    .filter(|id| !id.is_empty())
                    .unwrap_or_else(|| format!("requirement_{}", position)),
            ),
            kind,
            description: self.description.unwrap_or_default(),
            error_message: self.error_message.unwrap_or_default(),
        }
    }
}

impl From<&RequirementSpec> for RequirementDraft {
    fn from(spec: &RequirementSpec) -> Self {
        let mut draft = RequirementDraft {
            id: Some(spec.id.0.clone()),
            kind: Some(spec.kind.name().to_string()),
            description: Some(spec.description.clone()),
            error_message: Some(spec.error_message.clone()),
            ..RequirementDraft::default()
        };
        match &spec.kind {
            RequirementKind::WordCount { min, max } => {
                draft.min_value = *min;
                draft.max_value = *max;
            }
            RequirementKind::ContainsKeywords { keywords } => {
                draft.required_keywords = Some(keywords.clone());
            }
            RequirementKind::StructureCheck { min_paragraphs } => {
                draft.min_paragraphs = *min_paragraphs;
            }
            RequirementKind::Unknown { .. } => {}
        }
        draft
    }
}

// =============================================================================
// TESTS
// =============================================================================
