//! Static document analysis: regex section extraction, the rubric risk
//! heuristic, and checklist assembly.
//!
//! Everything here is pure: the same text and definition always produce
//! the same output.

pub mod checklist;
pub mod risk;
pub mod sections;

pub use checklist::build_checklist;
pub use risk::{MISSING_INFO_ID, RiskFinding, identify_risks};
pub use sections::{SNIPPET_CHARS, extract_sections, text_snippet};
