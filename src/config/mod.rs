//! Domain configuration: extraction templates, risk rubrics, action
//! checklists, question banks, and output schemas.
//!
//! Definitions live as YAML files under `<config_dir>/{templates,rubrics,
//! checklists,questions}/` and JSON schemas under `<config_dir>/schemas/`.

pub mod store;
pub mod types;

pub use store::{ConfigKind, ConfigStore, DEFAULT_CONFIG_DIR};
pub use types::{Checklist, Criterion, ExtractionRule, QuestionBank, Rubric, Template};
