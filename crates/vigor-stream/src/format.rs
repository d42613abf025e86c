//! Layout of flushed text and tool events.
//!
//! Every function here is idempotent on its own output.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

use crate::classifier::{block_kind, BlockKind};

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("paragraph break regex"));
static SENTENCE_GAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([.!?]+)\s+").expect("sentence gap regex"));

/// Format flushed buffer content for display.
///
/// List items and headers get one leading and one trailing newline.
/// Everything else is laid out as a paragraph. Blank input yields `""`.
pub fn format_block(content: &str) -> String {
    let content = content.trim();
    if content.is_empty() {
        return String::new();
    }

    match block_kind(content) {
        BlockKind::Numbered | BlockKind::Bullet | BlockKind::Header => format!("\n{}\n", content),
        BlockKind::Paragraph => format_paragraph(content),
    }
}

/// Sentences rejoined with single spaces, paragraphs separated by a blank
/// line, terminated by `\n\n`.
pub fn format_paragraph(content: &str) -> String {
    let paragraphs: Vec<String> = PARAGRAPH_BREAK
        .split(content.trim())
        .map(|p| SENTENCE_GAP.replace_all(p.trim(), "${1} ").into_owned())
        .filter(|p| !p.is_empty())
        .collect();

    if paragraphs.is_empty() {
        return String::new();
    }
    format!("{}\n\n", paragraphs.join("\n\n"))
}

pub fn format_tool_marker(name: &str) -> String {
    format!("\n\n🔧 **Using {}...**\n\n", name)
}

pub fn format_tool_result(payload: &Value) -> String {
    format!("\n\n📊 **Results:**\n\n{}\n\n", render_value(payload))
}

/// Structured rendering of a tool payload: `• Key: value` lines for
/// objects, numbered lines for arrays, literal text otherwise.
pub fn render_value(payload: &Value) -> String {
    match payload {
        Value::Object(map) => map
            .iter()
            .filter(|(_, value)| !is_blank(value))
            .map(|(key, value)| format!("• {}: {}", title_case(key), inline(value)))
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::Object(map) => format!("{}. {}", i + 1, inline_object(map)),
                other => format!("{}. {}", i + 1, inline(other)),
            })
            .collect::<Vec<_>>()
            .join("\n"),
        other => inline(other),
    }
}

fn inline(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) if items.iter().all(is_scalar) => items
            .iter()
            .map(inline)
            .collect::<Vec<_>>()
            .join(", "),
        // numbers, bools and nested structures as compact JSON
        other => other.to_string(),
    }
}

fn inline_object(map: &Map<String, Value>) -> String {
    map.iter()
        .filter(|(_, value)| !is_blank(value))
        .map(|(key, value)| format!("{}: {}", title_case(key), inline(value)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// `total_calories` -> `Total Calories`
fn title_case(key: &str) -> String {
    key.split(['_', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
