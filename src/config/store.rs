//! Loads configuration definitions from the config directory.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use super::types::{Checklist, Identified, QuestionBank, Rubric, Template};
use crate::error::ConfigError;

/// Default config directory, relative to the working directory.
pub const DEFAULT_CONFIG_DIR: &str = "configs";

const TEMPLATES_DIR: &str = "templates";
const RUBRICS_DIR: &str = "rubrics";
const CHECKLISTS_DIR: &str = "checklists";
const QUESTIONS_DIR: &str = "questions";
const SCHEMAS_DIR: &str = "schemas";

/// A YAML definition category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKind {
    /// `templates/`
    Templates,
    /// `rubrics/`
    Rubrics,
    /// `checklists/`
    Checklists,
    /// `questions/`
    Questions,
}

impl ConfigKind {
    const fn dir(self) -> &'static str {
        match self {
            Self::Templates => TEMPLATES_DIR,
            Self::Rubrics => RUBRICS_DIR,
            Self::Checklists => CHECKLISTS_DIR,
            Self::Questions => QUESTIONS_DIR,
        }
    }
}

/// Read-only access to the config directory.
///
/// Files are re-read on every call so edits are picked up without a
/// restart. A missing category directory is an empty listing.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    root: PathBuf,
}

impl ConfigStore {
    /// Creates a store over `root`. The directory is not required to exist.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the config root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lists every file of a category as parsed, key order intact.
    ///
    /// Unlike the typed views, entries are not required to carry their id
    /// key and no defaults are filled in.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the category directory is unreadable.
    pub fn listing(&self, kind: ConfigKind) -> Result<Vec<Value>, ConfigError> {
        self.load_all(kind.dir())
    }

    /// Lists all extraction templates that carry a `template_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the category directory is unreadable.
    pub fn templates(&self) -> Result<Vec<Template>, ConfigError> {
        self.load_all(TEMPLATES_DIR)
    }

    /// Looks up a template by `template_id`.
    ///
    /// # Errors
    ///
    /// See [`ConfigStore::templates`].
    pub fn template(&self, id: &str) -> Result<Option<Template>, ConfigError> {
        Ok(find_by_id(self.templates()?, id))
    }

    /// Lists all risk rubrics that carry a `rubric_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the category directory is unreadable.
    pub fn rubrics(&self) -> Result<Vec<Rubric>, ConfigError> {
        self.load_all(RUBRICS_DIR)
    }

    /// Looks up a rubric by `rubric_id`.
    ///
    /// # Errors
    ///
    /// See [`ConfigStore::rubrics`].
    pub fn rubric(&self, id: &str) -> Result<Option<Rubric>, ConfigError> {
        Ok(find_by_id(self.rubrics()?, id))
    }

    /// Lists all action checklists that carry a `checklist_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the category directory is unreadable.
    pub fn checklists(&self) -> Result<Vec<Checklist>, ConfigError> {
        self.load_all(CHECKLISTS_DIR)
    }

    /// Looks up a checklist by `checklist_id`.
    ///
    /// # Errors
    ///
    /// See [`ConfigStore::checklists`].
    pub fn checklist(&self, id: &str) -> Result<Option<Checklist>, ConfigError> {
        Ok(find_by_id(self.checklists()?, id))
    }

    /// Lists all question banks that carry a `question_bank_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the category directory is unreadable.
    pub fn question_banks(&self) -> Result<Vec<QuestionBank>, ConfigError> {
        self.load_all(QUESTIONS_DIR)
    }

    /// Looks up a question bank by `question_bank_id`.
    ///
    /// # Errors
    ///
    /// See [`ConfigStore::question_banks`].
    pub fn question_bank(&self, id: &str) -> Result<Option<QuestionBank>, ConfigError> {
        Ok(find_by_id(self.question_banks()?, id))
    }

    /// Loads `schemas/<name>.json`. Returns `Ok(None)` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidName`] for names with path components,
    /// or a read/parse error for an existing but broken file.
    pub fn schema(&self, name: &str) -> Result<Option<Value>, ConfigError> {
        if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            return Err(ConfigError::InvalidName {
                name: name.to_string(),
            });
        }

        let path = self.root.join(SCHEMAS_DIR).join(format!("{name}.json"));
        if !path.is_file() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| ConfigError::Parse {
                path,
                message: e.to_string(),
            })
    }

    /// Parses every `*.yaml` file in a category directory, sorted by file
    /// name. Files that fail to parse are logged and skipped.
    fn load_all<T: DeserializeOwned>(&self, category: &str) -> Result<Vec<T>, ConfigError> {
        let dir = self.root.join(category);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let entries = std::fs::read_dir(&dir).map_err(|source| ConfigError::Read {
            path: dir.clone(),
            source,
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "yaml"))
            .collect();
        paths.sort();

        let mut items = Vec::with_capacity(paths.len());
        for path in paths {
            match load_yaml(&path) {
                Ok(item) => items.push(item),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping config file"),
            }
        }
        Ok(items)
    }
}

fn load_yaml<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yml::from_str(&raw).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn find_by_id<T: Identified>(items: Vec<T>, id: &str) -> Option<T> {
    items.into_iter().find(|item| item.id() == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    fn setup() -> (TempDir, ConfigStore) {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "templates/b.yaml",
            "template_id: second\nextraction_rules: []\n",
        );
        write(
            dir.path(),
            "templates/a.yaml",
            "template_id: first\nextraction_rules:\n  - field: name\n    pattern: 'Name: (.+)'\n",
        );
        write(dir.path(), "templates/notes.txt", "ignored");
        write(
            dir.path(),
            "rubrics/loan.yaml",
            "rubric_id: loan_risk_v1\ncriteria:\n  - id: missing_info\n    risk_level: high\n",
        );
        write(
            dir.path(),
            "checklists/loan.yaml",
            "checklist_id: loan_checklist_v1\nitems:\n  - Verify applicant identity\n",
        );
        write(
            dir.path(),
            "questions/loan.yaml",
            "question_bank_id: loan_questions_v1\nquestions:\n  - What is the loan amount?\n",
        );
        write(
            dir.path(),
            "schemas/loan_output.json",
            r#"{"type": "object"}"#,
        );
        let store = ConfigStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn test_templates_sorted_by_file_name() {
        let (_dir, store) = setup();
        let ids: Vec<String> = store
            .templates()
            .unwrap()
            .into_iter()
            .map(|t| t.template_id)
            .collect();
        assert_eq!(ids, vec!["first", "second"]);
    }

    #[test]
    fn test_lookup_by_id() {
        let (_dir, store) = setup();
        assert!(store.template("first").unwrap().is_some());
        assert!(store.template("missing").unwrap().is_none());
        assert!(store.rubric("loan_risk_v1").unwrap().is_some());
        assert_eq!(
            store.checklist("loan_checklist_v1").unwrap().unwrap().items,
            vec!["Verify applicant identity"]
        );
        assert!(store.question_bank("loan_questions_v1").unwrap().is_some());
    }

    #[test]
    fn test_missing_category_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(dir.path().join("nowhere"));
        assert!(store.templates().unwrap().is_empty());
        assert!(store.rubric("loan_risk_v1").unwrap().is_none());
    }

    #[test]
    fn test_broken_yaml_is_skipped() {
        let (dir, store) = setup();
        write(dir.path(), "rubrics/broken.yaml", "rubric_id: [unclosed\n");
        let rubrics = store.rubrics().unwrap();
        assert_eq!(rubrics.len(), 1);
    }

    #[test]
    fn test_listing_keeps_file_contents() {
        let (dir, store) = setup();
        write(
            dir.path(),
            "rubrics/adhoc.yaml",
            "name: Ad hoc\nrubric_version: 2\n",
        );

        let listing = store.listing(ConfigKind::Rubrics).unwrap();
        assert_eq!(listing.len(), 2);
        // adhoc.yaml sorts first and has no rubric_id and no criteria.
        assert_eq!(listing[0]["name"], "Ad hoc");
        assert!(listing[0].get("criteria").is_none());
        let keys: Vec<&String> = listing[0].as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["name", "rubric_version"]);

        // The typed view only sees definitions with an id.
        assert_eq!(store.rubrics().unwrap().len(), 1);
    }

    #[test]
    fn test_listing_preserves_key_order() {
        let (dir, store) = setup();
        write(
            dir.path(),
            "questions/z.yaml",
            "question_bank_id: zz\nquestions: []\ncategory: loans\n",
        );
        let listing = store.listing(ConfigKind::Questions).unwrap();
        let keys: Vec<&String> = listing[1].as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["question_bank_id", "questions", "category"]);
    }

    #[test]
    fn test_schema_lookup() {
        let (_dir, store) = setup();
        let schema = store.schema("loan_output").unwrap().unwrap();
        assert_eq!(schema["type"], "object");
        assert!(store.schema("unknown").unwrap().is_none());
        assert!(matches!(
            store.schema("../secrets"),
            Err(ConfigError::InvalidName { .. })
        ));
    }
}
