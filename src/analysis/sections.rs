//! Template-driven field extraction.

use indexmap::IndexMap;
use regex::RegexBuilder;
use tracing::warn;

use crate::config::ExtractionRule;

/// Number of characters kept in a raw text snippet.
pub const SNIPPET_CHARS: usize = 500;

/// Maximum compiled regex size (bytes) for template patterns.
const MAX_REGEX_SIZE: usize = 1_000_000;

/// Applies each rule's pattern to `text` and collects the matches in rule
/// order.
///
/// Patterns match case-insensitively. The first capture group is used when
/// the pattern has one, otherwise the whole match. Values are trimmed.
/// Rules without a field or pattern, invalid patterns, and non-matching
/// patterns contribute nothing.
#[must_use]
pub fn extract_sections(text: &str, rules: &[ExtractionRule]) -> IndexMap<String, String> {
    let mut extracted = IndexMap::new();

    for rule in rules {
        let (Some(field), Some(pattern)) = (rule.field.as_deref(), rule.pattern.as_deref()) else {
            continue;
        };
        if field.is_empty() || pattern.is_empty() {
            continue;
        }

        let re = match RegexBuilder::new(pattern)
            .case_insensitive(true)
            .size_limit(MAX_REGEX_SIZE)
            .build()
        {
            Ok(re) => re,
            Err(e) => {
                warn!(field, pattern, error = %e, "skipping invalid extraction pattern");
                continue;
            }
        };

        if let Some(caps) = re.captures(text) {
            let value = if re.captures_len() > 1 {
                caps.get(1)
            } else {
                caps.get(0)
            };
            // An optional group that did not participate yields nothing.
            if let Some(m) = value {
                extracted.insert(field.to_string(), m.as_str().trim().to_string());
            }
        }
    }

    extracted
}

/// Returns the first [`SNIPPET_CHARS`] characters of `text` followed by `...`.
#[must_use]
pub fn text_snippet(text: &str) -> String {
    let head: String = text.chars().take(SNIPPET_CHARS).collect();
    format!("{head}...")
}
