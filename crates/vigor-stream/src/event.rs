use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::pin::Pin;

/// Marks diagnostic chunks so consumers can detect failures without matching variants
pub const DIAGNOSTIC_PREFIX: &str = "[vigor:error] ";

pub type RawEventStream = Pin<Box<dyn Stream<Item = RawEvent> + Send>>;

/// Event produced by a source and consumed by the assembler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum RawEvent {
    Text(String),
    ToolCallStarted(String),
    ToolResult(Value),
    StreamError(String),
    End,
}

impl RawEvent {
    pub fn text(fragment: impl Into<String>) -> Self {
        Self::Text(fragment.into())
    }

    /// Tool result from a raw tool output string.
    ///
    /// Output that is not valid JSON is kept verbatim as a string payload;
    /// no structure is guessed.
    pub fn tool_result_from_str(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => Self::ToolResult(value),
            Err(e) => {
                tracing::warn!(error = %e, "Tool result is not valid JSON, rendering verbatim");
                Self::ToolResult(Value::String(raw.to_string()))
            }
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::End | Self::StreamError(_))
    }
}

/// Display-ready unit emitted by the assembler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "snake_case")]
pub enum OutputChunk {
    Text(String),
    ToolCall { name: String, rendered: String },
    ToolResult(String),
    Diagnostic(String),
    /// Keep-alive yielded when a poll times out; consumers skip it
    Empty,
}

impl OutputChunk {
    pub fn diagnostic(message: impl fmt::Display) -> Self {
        Self::Diagnostic(format!("{}{}", DIAGNOSTIC_PREFIX, message))
    }

    /// Text to display for this chunk
    pub fn text(&self) -> &str {
        match self {
            Self::Text(text) | Self::ToolResult(text) | Self::Diagnostic(text) => text,
            Self::ToolCall { rendered, .. } => rendered,
            Self::Empty => "",
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text().is_empty()
    }

    pub fn is_diagnostic(&self) -> bool {
        matches!(self, Self::Diagnostic(_))
    }
}

impl fmt::Display for OutputChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_result_from_valid_json() {
        let event = RawEvent::tool_result_from_str(r#"{"calories": 2000}"#);
        assert_eq!(event, RawEvent::ToolResult(json!({"calories": 2000})));
    }

    #[test]
    fn test_tool_result_from_invalid_json_is_verbatim() {
        let event = RawEvent::tool_result_from_str("plan: {oats");
        assert_eq!(event, RawEvent::ToolResult(Value::String("plan: {oats".to_string())));
    }

    #[test]
    fn test_diagnostic_prefix() {
        let chunk = OutputChunk::diagnostic("upstream reset");
        assert!(chunk.text().starts_with(DIAGNOSTIC_PREFIX));
        assert!(chunk.is_diagnostic());
        assert!(OutputChunk::Empty.is_empty());
    }

    #[test]
    fn test_chunk_serialization_tag() {
        let json = serde_json::to_value(OutputChunk::ToolResult("x".into())).unwrap();
        assert_eq!(json["type"], "tool_result");
        assert_eq!(json["content"], "x");
    }
}
