//! Action checklist assembly.

use crate::config::Checklist;

/// Returns the checklist's action items in their configured order.
#[must_use]
pub fn build_checklist(checklist: &Checklist) -> Vec<String> {
    checklist
        .items
        .iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preserves_order_and_drops_blanks() {
        let checklist = Checklist {
            checklist_id: "c".to_string(),
            items: vec![
                "Verify applicant identity".to_string(),
                "  ".to_string(),
                " Validate income proof ".to_string(),
            ],
            extra: serde_json::Map::new(),
        };
        assert_eq!(
            build_checklist(&checklist),
            vec!["Verify applicant identity", "Validate income proof"]
        );
    }
}
