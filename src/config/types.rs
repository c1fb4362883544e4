//! Typed views over the YAML configuration files.
//!
//! Each type keeps the fields the tools act on and collects every other key
//! into `extra`, so listings serialize the file contents unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifies a config definition by its id field.
pub trait Identified {
    /// The definition's identifier.
    fn id(&self) -> &str;
}

/// A single regex extraction rule of a template.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionRule {
    /// Output field name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Regex pattern, matched case-insensitively.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Any other keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An extraction template used by `summarize_sections`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    /// Template identifier (e.g. `loan_application_v1`).
    pub template_id: String,
    /// Ordered extraction rules.
    #[serde(default)]
    pub extraction_rules: Vec<ExtractionRule>,
    /// Any other keys (name, description, sections, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A single rubric criterion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Criterion {
    /// Criterion identifier (e.g. `missing_info`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Risk level reported when the criterion fires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<Value>,
    /// Any other keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A risk rubric used by `identify_risks`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rubric {
    /// Rubric identifier (e.g. `loan_risk_v1`).
    pub rubric_id: String,
    /// Criteria evaluated against a document.
    #[serde(default)]
    pub criteria: Vec<Criterion>,
    /// Any other keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An action checklist used by `generate_action_checklist`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checklist {
    /// Checklist identifier (e.g. `loan_checklist_v1`).
    pub checklist_id: String,
    /// Ordered action items.
    #[serde(default)]
    pub items: Vec<String>,
    /// Any other keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A bank of review questions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionBank {
    /// Question bank identifier.
    pub question_bank_id: String,
    /// Any other keys (questions, categories, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Identified for Template {
    fn id(&self) -> &str {
        &self.template_id
    }
}

impl Identified for Rubric {
    fn id(&self) -> &str {
        &self.rubric_id
    }
}

impl Identified for Checklist {
    fn id(&self) -> &str {
        &self.checklist_id
    }
}

impl Identified for QuestionBank {
    fn id(&self) -> &str {
        &self.question_bank_id
    }
}
