//! Document-processing tool and resource semantics.
//!
//! [`IdpService`] owns the document store and config store and implements
//! every tool as a function returning the exact text handed back to the
//! caller. Recoverable failures (missing document, template, rubric,
//! checklist, bad upload payload) come back as `"Error: ..."` strings, never
//! as Rust errors, so a model reading the result can correct itself.
//!
//! Both the MCP server and the in-process agent backend delegate here.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::analysis::{self, RiskFinding};
use crate::config::{ConfigKind, ConfigStore};
use crate::documents::DocumentStore;
use crate::error::{DocumentError, Error};

/// Tool name: store a base64 upload.
pub const TOOL_UPLOAD_DOCUMENT: &str = "upload_document";
/// Tool name: extract raw document text.
pub const TOOL_EXTRACT_DOCUMENT: &str = "extract_document";
/// Tool name: template-driven section extraction.
pub const TOOL_SUMMARIZE_SECTIONS: &str = "summarize_sections";
/// Tool name: rubric risk identification.
pub const TOOL_IDENTIFY_RISKS: &str = "identify_risks";
/// Tool name: action checklist generation.
pub const TOOL_GENERATE_ACTION_CHECKLIST: &str = "generate_action_checklist";

/// Resource: stored document names.
pub const RESOURCE_DOCUMENTS: &str = "documents://list";
/// Resource: extraction templates.
pub const RESOURCE_TEMPLATES: &str = "config://templates";
/// Resource: risk rubrics.
pub const RESOURCE_RUBRICS: &str = "config://rubrics";
/// Resource: action checklists.
pub const RESOURCE_CHECKLISTS: &str = "config://checklists";
/// Resource: question banks.
pub const RESOURCE_QUESTIONS: &str = "config://questions";
/// Resource template prefix: output schema by name.
pub const RESOURCE_SCHEMA_PREFIX: &str = "config://schemas/";

/// Sentinel returned for an unknown schema name.
pub const SCHEMA_NOT_FOUND: &str = "Schema not found.";

/// A parsed resource URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceUri {
    /// `documents://list`
    Documents,
    /// `config://templates`
    Templates,
    /// `config://rubrics`
    Rubrics,
    /// `config://checklists`
    Checklists,
    /// `config://questions`
    Questions,
    /// `config://schemas/{name}`
    Schema(String),
}

impl ResourceUri {
    /// Parses a resource URI, returning `None` for unknown URIs.
    #[must_use]
    pub fn parse(uri: &str) -> Option<Self> {
        match uri {
            RESOURCE_DOCUMENTS => Some(Self::Documents),
            RESOURCE_TEMPLATES => Some(Self::Templates),
            RESOURCE_RUBRICS => Some(Self::Rubrics),
            RESOURCE_CHECKLISTS => Some(Self::Checklists),
            RESOURCE_QUESTIONS => Some(Self::Questions),
            other => other
                .strip_prefix(RESOURCE_SCHEMA_PREFIX)
                .filter(|name| !name.is_empty())
                .map(|name| Self::Schema(name.to_string())),
        }
    }
}

/// Output of `summarize_sections`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionSummary {
    /// Document the sections came from.
    pub document_id: String,
    /// Template that was applied.
    pub template_id: String,
    /// Field name → extracted value, in template rule order.
    pub extracted_sections: IndexMap<String, String>,
    /// Leading text of the document for context.
    pub raw_text_snippet: String,
}

/// Output of `identify_risks`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskReport {
    /// Document evaluated.
    pub document_id: String,
    /// Rubric applied.
    pub rubric_id: String,
    /// Risks raised.
    pub risks: Vec<RiskFinding>,
}

/// Output of `generate_action_checklist`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecklistReport {
    /// Document the checklist is for.
    pub document_id: String,
    /// Checklist applied.
    pub checklist_id: String,
    /// Ordered action items.
    pub checklist: Vec<String>,
}

/// Tool and resource implementation over explicit storage handles.
#[derive(Debug, Clone)]
pub struct IdpService {
    documents: DocumentStore,
    config: ConfigStore,
}

impl IdpService {
    /// Creates a service over the given stores.
    #[must_use]
    pub const fn new(documents: DocumentStore, config: ConfigStore) -> Self {
        Self { documents, config }
    }

    /// Returns the document store.
    #[must_use]
    pub const fn documents(&self) -> &DocumentStore {
        &self.documents
    }

    /// Returns the config store.
    #[must_use]
    pub const fn config(&self) -> &ConfigStore {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Tools
    // -----------------------------------------------------------------------

    /// Decodes a base64 payload and stores it under `filename`.
    #[must_use]
    pub fn upload_document(&self, filename: &str, file_content_base64: &str) -> String {
        let bytes = match BASE64.decode(file_content_base64.trim()) {
            Ok(bytes) => bytes,
            Err(e) => {
                let err = DocumentError::Decode {
                    message: e.to_string(),
                };
                return format!("Error: {err}");
            }
        };

        match self.documents.save_upload(filename, &bytes) {
            Ok(path) => {
                debug!(document = filename, path = %path.display(), "upload stored");
                format!("Uploaded '{filename}' ({} bytes).", bytes.len())
            }
            Err(e @ DocumentError::InvalidName { .. }) => format!("Error: {e}"),
            Err(e) => format!("Error saving document: {e}"),
        }
    }

    /// Extracts a document's raw text.
    #[must_use]
    pub fn extract_document(&self, document_id: &str) -> String {
        self.extract_or_message(document_id)
            .unwrap_or_else(|message| message)
    }

    /// Applies a template's extraction rules to a document.
    #[must_use]
    pub fn summarize_sections(&self, document_id: &str, template_id: &str) -> String {
        let text = match self.extract_or_message(document_id) {
            Ok(text) => text,
            Err(message) => return message,
        };

        let template = match self.config.template(template_id) {
            Ok(Some(template)) => template,
            Ok(None) => return format!("Error: Template '{template_id}' not found."),
            Err(e) => return format!("Error loading configuration: {e}"),
        };

        let summary = SectionSummary {
            document_id: document_id.to_string(),
            template_id: template_id.to_string(),
            extracted_sections: analysis::extract_sections(&text, &template.extraction_rules),
            raw_text_snippet: analysis::text_snippet(&text),
        };
        to_pretty_json(&summary)
    }

    /// Evaluates a risk rubric against a document.
    #[must_use]
    pub fn identify_risks(&self, document_id: &str, rubric_id: &str) -> String {
        let text = match self.extract_or_message(document_id) {
            Ok(text) => text,
            Err(message) => return message,
        };

        let rubric = match self.config.rubric(rubric_id) {
            Ok(Some(rubric)) => rubric,
            Ok(None) => return format!("Error: Rubric '{rubric_id}' not found."),
            Err(e) => return format!("Error loading configuration: {e}"),
        };

        let report = RiskReport {
            document_id: document_id.to_string(),
            rubric_id: rubric_id.to_string(),
            risks: analysis::identify_risks(&text, &rubric),
        };
        to_pretty_json(&report)
    }

    /// Builds the action checklist for a document.
    #[must_use]
    pub fn generate_action_checklist(&self, document_id: &str, checklist_id: &str) -> String {
        if !self.documents.exists(document_id) {
            return not_found_message(document_id);
        }

        let checklist = match self.config.checklist(checklist_id) {
            Ok(Some(checklist)) => checklist,
            Ok(None) => return format!("Error: Checklist '{checklist_id}' not found."),
            Err(e) => return format!("Error loading configuration: {e}"),
        };

        let report = ChecklistReport {
            document_id: document_id.to_string(),
            checklist_id: checklist_id.to_string(),
            checklist: analysis::build_checklist(&checklist),
        };
        to_pretty_json(&report)
    }

    // -----------------------------------------------------------------------
    // Resources
    // -----------------------------------------------------------------------

    /// Reads a resource by URI.
    ///
    /// A missing schema yields the [`SCHEMA_NOT_FOUND`] sentinel rather than
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownResource`] for URIs the server does not
    /// expose, or a storage/config error if a listing cannot be read.
    pub fn read_resource(&self, uri: &str) -> Result<String, Error> {
        let resource = ResourceUri::parse(uri).ok_or_else(|| Error::UnknownResource {
            uri: uri.to_string(),
        })?;

        let json = match resource {
            ResourceUri::Documents => serde_json::to_string_pretty(&self.documents.list()?)?,
            ResourceUri::Templates => self.listing_json(ConfigKind::Templates)?,
            ResourceUri::Rubrics => self.listing_json(ConfigKind::Rubrics)?,
            ResourceUri::Checklists => self.listing_json(ConfigKind::Checklists)?,
            ResourceUri::Questions => self.listing_json(ConfigKind::Questions)?,
            ResourceUri::Schema(name) => match self.config.schema(&name) {
                Ok(Some(schema)) => serde_json::to_string_pretty(&schema)?,
                Ok(None) | Err(crate::error::ConfigError::InvalidName { .. }) => {
                    SCHEMA_NOT_FOUND.to_string()
                }
                Err(e) => return Err(e.into()),
            },
        };
        Ok(json)
    }

    fn listing_json(&self, kind: ConfigKind) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(&self.config.listing(kind)?)?)
    }

    /// Extracts text, mapping failures to the message returned to callers.
    fn extract_or_message(&self, document_id: &str) -> Result<String, String> {
        self.documents
            .extract_text(document_id)
            .map_err(|e| match e {
                DocumentError::NotFound { .. } | DocumentError::InvalidName { .. } => {
                    not_found_message(document_id)
                }
                other => {
                    warn!(document = document_id, error = %other, "extraction failed");
                    format!("Error extracting document: {other}")
                }
            })
    }
}

fn not_found_message(document_id: &str) -> String {
    format!("Error: Document '{document_id}' not found.")
}

fn to_pretty_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("Error: failed to serialize result: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    const LOAN_TEMPLATE: &str = r#"template_id: loan_application_v1
name: Loan Application
extraction_rules:
  - field: applicant_name
    pattern: "Applicant Name:\\s*(.+)"
  - field: loan_amount
    pattern: "Loan Amount:\\s*\\$?([\\d,]+)"
"#;

    const LOAN_RUBRIC: &str = "rubric_id: loan_risk_v1
criteria:
  - id: missing_info
    description: Missing signature or required fields
    risk_level: high
  - id: low_credit
    risk_level: medium
";

    const LOAN_CHECKLIST: &str = "checklist_id: loan_checklist_v1
items:
  - Verify applicant identity
  - Validate income proof
";

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn setup() -> (TempDir, IdpService) {
        let dir = TempDir::new().unwrap();
        let configs = dir.path().join("configs");
        write(&configs, "templates/loan.yaml", LOAN_TEMPLATE);
        write(&configs, "rubrics/loan.yaml", LOAN_RUBRIC);
        write(&configs, "checklists/loan.yaml", LOAN_CHECKLIST);
        write(
            &configs,
            "questions/loan.yaml",
            "question_bank_id: loan_questions_v1\nquestions: []\n",
        );
        write(&configs, "schemas/loan_output.json", r#"{"title": "Loan"}"#);

        let documents = DocumentStore::open(dir.path().join("data")).unwrap();
        let service = IdpService::new(documents, ConfigStore::new(configs));
        (dir, service)
    }

    fn add_doc(service: &IdpService, name: &str, text: &str) {
        service
            .documents()
            .save_upload(name, text.as_bytes())
            .unwrap();
    }

    #[test]
    fn test_extract_missing_document() {
        let (_dir, service) = setup();
        assert_eq!(
            service.extract_document("sample_loan.txt"),
            "Error: Document 'sample_loan.txt' not found."
        );
    }

    #[test]
    fn test_summarize_missing_document_passes_error_through() {
        let (_dir, service) = setup();
        assert_eq!(
            service.summarize_sections("sample_loan.txt", "loan_application_v1"),
            "Error: Document 'sample_loan.txt' not found."
        );
    }

    #[test]
    fn test_summarize_sections() {
        let (_dir, service) = setup();
        add_doc(
            &service,
            "app.txt",
            "Applicant Name: Jane Doe\nLoan Amount: $25,000\nSignature: JD",
        );

        let out = service.summarize_sections("app.txt", "loan_application_v1");
        let summary: SectionSummary = serde_json::from_str(&out).unwrap();
        assert_eq!(summary.document_id, "app.txt");
        assert_eq!(summary.extracted_sections["applicant_name"], "Jane Doe");
        assert_eq!(summary.extracted_sections["loan_amount"], "25,000");
        assert!(summary.raw_text_snippet.starts_with("Applicant Name"));
        assert!(summary.raw_text_snippet.ends_with("..."));
    }

    #[test]
    fn test_summarize_unknown_template() {
        let (_dir, service) = setup();
        add_doc(&service, "app.txt", "text");
        assert_eq!(
            service.summarize_sections("app.txt", "nope"),
            "Error: Template 'nope' not found."
        );
    }

    #[test]
    fn test_identify_risks_missing_signature() {
        let (_dir, service) = setup();
        add_doc(&service, "fake_doc.txt", "This document is blank and incomplete.");

        let out = service.identify_risks("fake_doc.txt", "loan_risk_v1");
        let report: RiskReport = serde_json::from_str(&out).unwrap();
        assert_eq!(report.rubric_id, "loan_risk_v1");
        assert_eq!(report.risks.len(), 1);
        assert_eq!(report.risks[0].id, "missing_info");
        assert_eq!(report.risks[0].level, serde_json::json!("high"));
        assert_eq!(report.risks[0].reason, "Potential missing signature.");
    }

    #[test]
    fn test_identify_risks_idempotent() {
        let (_dir, service) = setup();
        add_doc(&service, "doc.txt", "Unsigned application");
        let first = service.identify_risks("doc.txt", "loan_risk_v1");
        let second = service.identify_risks("doc.txt", "loan_risk_v1");
        assert_eq!(first, second);
    }

    #[test]
    fn test_identify_risks_errors() {
        let (_dir, service) = setup();
        assert_eq!(
            service.identify_risks("missing.txt", "loan_risk_v1"),
            "Error: Document 'missing.txt' not found."
        );
        add_doc(&service, "doc.txt", "text");
        assert_eq!(
            service.identify_risks("doc.txt", "other"),
            "Error: Rubric 'other' not found."
        );
    }

    #[test]
    fn test_generate_action_checklist() {
        let (_dir, service) = setup();
        add_doc(&service, "doc.txt", "text");
        let out = service.generate_action_checklist("doc.txt", "loan_checklist_v1");
        let report: ChecklistReport = serde_json::from_str(&out).unwrap();
        assert_eq!(
            report.checklist,
            vec!["Verify applicant identity", "Validate income proof"]
        );
        assert_eq!(
            service.generate_action_checklist("doc.txt", "x"),
            "Error: Checklist 'x' not found."
        );
        assert_eq!(
            service.generate_action_checklist("nope.txt", "loan_checklist_v1"),
            "Error: Document 'nope.txt' not found."
        );
    }

    #[test]
    fn test_upload_document() {
        let (_dir, service) = setup();
        let payload = BASE64.encode(b"hello world");
        assert_eq!(
            service.upload_document("hello.txt", &payload),
            "Uploaded 'hello.txt' (11 bytes)."
        );
        assert_eq!(service.extract_document("hello.txt"), "hello world");
    }

    #[test]
    fn test_upload_rejects_bad_payload_and_name() {
        let (_dir, service) = setup();
        let out = service.upload_document("x.txt", "not base64!!");
        assert!(out.starts_with("Error: Invalid base64 content"), "{out}");

        let out = service.upload_document("../x.txt", &BASE64.encode(b"x"));
        assert!(out.starts_with("Error: invalid document name"), "{out}");
    }

    #[test]
    fn test_resource_listings() {
        let (_dir, service) = setup();
        add_doc(&service, "doc.txt", "text");

        let docs: Vec<String> =
            serde_json::from_str(&service.read_resource(RESOURCE_DOCUMENTS).unwrap()).unwrap();
        assert_eq!(docs, vec!["doc.txt"]);

        for uri in [
            RESOURCE_TEMPLATES,
            RESOURCE_RUBRICS,
            RESOURCE_CHECKLISTS,
            RESOURCE_QUESTIONS,
        ] {
            let list: Vec<serde_json::Value> =
                serde_json::from_str(&service.read_resource(uri).unwrap()).unwrap();
            assert_eq!(list.len(), 1, "{uri}");
        }

        let templates: serde_json::Value =
            serde_json::from_str(&service.read_resource(RESOURCE_TEMPLATES).unwrap()).unwrap();
        assert_eq!(templates[0]["name"], "Loan Application");
    }

    #[test]
    fn test_schema_resource() {
        let (_dir, service) = setup();
        let schema = service.read_resource("config://schemas/loan_output").unwrap();
        assert!(schema.contains("\"title\": \"Loan\""));
        assert_eq!(
            service.read_resource("config://schemas/unknown").unwrap(),
            SCHEMA_NOT_FOUND
        );
        assert!(matches!(
            service.read_resource("config://unknown"),
            Err(Error::UnknownResource { .. })
        ));
    }

    #[test]
    fn test_resource_uri_parse() {
        assert_eq!(
            ResourceUri::parse("config://schemas/loan_output"),
            Some(ResourceUri::Schema("loan_output".to_string()))
        );
        assert_eq!(ResourceUri::parse("config://schemas/"), None);
        assert_eq!(ResourceUri::parse("documents://list"), Some(ResourceUri::Documents));
    }
}
