//! MCP tool parameter types.
//!
//! Defines the input schemas for MCP tools using `schemars` for automatic
//! JSON Schema generation required by the MCP protocol. The in-process
//! backend deserializes model arguments into the same types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default rubric for `identify_risks`.
pub const DEFAULT_RUBRIC_ID: &str = "loan_risk_v1";
/// Default checklist for `generate_action_checklist`.
pub const DEFAULT_CHECKLIST_ID: &str = "loan_checklist_v1";

/// Parameters for the `upload_document` tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UploadDocumentParams {
    /// File name to store the document under (no directories).
    pub filename: String,

    /// File bytes, base64-encoded.
    pub file_content_base64: String,
}

/// Parameters for the `extract_document` tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExtractDocumentParams {
    /// The filename of the document (e.g. `loan_app.pdf`).
    pub document_id: String,
}

/// Parameters for the `summarize_sections` tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SummarizeSectionsParams {
    /// The filename of the document.
    pub document_id: String,

    /// The ID of the template to use (e.g. `loan_application_v1`).
    pub template_id: String,
}

/// Parameters for the `identify_risks` tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct IdentifyRisksParams {
    /// The filename of the document.
    pub document_id: String,

    /// The ID of the rubric to use (default: `loan_risk_v1`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rubric_id: Option<String>,
}

/// Parameters for the `generate_action_checklist` tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GenerateChecklistParams {
    /// The filename of the document.
    pub document_id: String,

    /// The ID of the checklist to use (default: `loan_checklist_v1`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checklist_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_ids_default_to_none() {
        let params: IdentifyRisksParams =
            serde_json::from_str(r#"{"document_id": "a.txt"}"#).unwrap();
        assert_eq!(params.document_id, "a.txt");
        assert!(params.rubric_id.is_none());

        let params: GenerateChecklistParams =
            serde_json::from_str(r#"{"document_id": "a.txt", "checklist_id": "c1"}"#).unwrap();
        assert_eq!(params.checklist_id.as_deref(), Some("c1"));
    }

    #[test]
    fn test_schema_marks_required_fields() {
        let schema = serde_json::to_value(schemars::schema_for!(SummarizeSectionsParams)).unwrap();
        let required = schema["required"].as_array().cloned().unwrap_or_default();
        assert!(required.contains(&serde_json::json!("document_id")));
        assert!(required.contains(&serde_json::json!("template_id")));
    }
}
