//! Output formatting for CLI commands.
//!
//! Text output is for people; JSON output is the same data as the MCP
//! resources return, for scripts.

use serde::Serialize;
use serde_json::Value;
use std::fmt::Write;

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

impl OutputFormat {
    /// Parses a format name; unknown names fall back to text.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }

    /// Serializes `value` as pretty JSON with a trailing newline.
    #[must_use]
    pub fn to_json<T: Serialize + ?Sized>(self, value: &T) -> String {
        match serde_json::to_string_pretty(value) {
            Ok(json) => format!("{json}\n"),
            Err(e) => format!("{{\"error\": \"serialization failed: {e}\"}}\n"),
        }
    }
}

/// Formats the stored document names.
#[must_use]
pub fn format_document_list(names: &[String], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => format.to_json(names),
        OutputFormat::Text => {
            if names.is_empty() {
                return "No documents stored.\n".to_string();
            }
            let mut output = format!("Documents ({}):\n", names.len());
            for name in names {
                let _ = writeln!(output, "  {name}");
            }
            output
        }
    }
}

/// Formats a configuration listing read from a `config://` resource.
///
/// Text output shows one line per entry: its `id_key` value and, when
/// present, its `name` or `description`.
#[must_use]
pub fn format_config_listing(kind: &str, id_key: &str, listing: &str, format: OutputFormat) -> String {
    let entries: Vec<Value> = serde_json::from_str(listing).unwrap_or_default();

    match format {
        OutputFormat::Json => format.to_json(&entries),
        OutputFormat::Text => {
            if entries.is_empty() {
                return format!("No {kind} configured.\n");
            }
            let mut output = format!("{} ({}):\n", capitalize(kind), entries.len());
            for entry in &entries {
                let id = entry.get(id_key).and_then(Value::as_str).unwrap_or("?");
                let label = entry
                    .get("name")
                    .or_else(|| entry.get("description"))
                    .and_then(Value::as_str);
                match label {
                    Some(label) => {
                        let _ = writeln!(output, "  {id:<28} {label}");
                    }
                    None => {
                        let _ = writeln!(output, "  {id}");
                    }
                }
            }
            output
        }
    }
}

/// Formats a single tool's text result.
///
/// Tool results are already text (or JSON text); JSON output wraps them
/// with the document they came from.
#[must_use]
pub fn format_tool_output(document_id: &str, content: &str, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => format.to_json(&serde_json::json!({
            "document_id": document_id,
            "content": content,
        })),
        OutputFormat::Text => {
            let mut output = content.to_string();
            if !output.ends_with('\n') {
                output.push('\n');
            }
            output
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().collect::<String>() + chars.as_str()
    })
}
