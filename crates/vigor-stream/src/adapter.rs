use anyhow::Result;
use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

use vigor_llm::traits::EventStream;
use vigor_llm::{ChatClient, ChatOptions, ChatRequest, Message, StreamEvent, Tool};

use crate::event::{RawEvent, RawEventStream};

/// Generation options passed with every source request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceOptions {
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    500
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            tools: None,
        }
    }
}

impl SourceOptions {
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_tools(mut self, tools: Vec<Tool>) -> Self {
        self.tools = Some(tools);
        self
    }

    fn chat_options(&self) -> ChatOptions {
        let options = ChatOptions::new()
            .temperature(self.temperature)
            .max_tokens(self.max_tokens);
        match &self.tools {
            Some(tools) if !tools.is_empty() => options.tools(tools.clone()),
            _ => options,
        }
    }
}

/// Producer of raw events for one user turn
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Start a streamed completion. Failures after the stream is open arrive
    /// as [`RawEvent::StreamError`], never as a panic.
    async fn open(
        &self,
        messages: Vec<Message>,
        model: &str,
        options: &SourceOptions,
    ) -> Result<RawEventStream>;
}

/// [`SourceAdapter`] over a streaming [`ChatClient`]
pub struct ChatSourceAdapter {
    client: Arc<dyn ChatClient>,
}

impl ChatSourceAdapter {
    pub fn new(client: Arc<dyn ChatClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SourceAdapter for ChatSourceAdapter {
    async fn open(
        &self,
        messages: Vec<Message>,
        model: &str,
        options: &SourceOptions,
    ) -> Result<RawEventStream> {
        tracing::info!(model = %model, messages = messages.len(), "Opening completion stream");

        let request = ChatRequest::new(model, messages).with_options(options.chat_options());
        let events = self.client.chat_stream(request).await?;

        Ok(raw_events(events))
    }
}

/// Map provider stream events to raw events.
///
/// Message deltas become text, the first delta naming each tool call becomes
/// a tool marker, and a transport error ends the stream with `StreamError`.
pub fn raw_events(events: EventStream) -> RawEventStream {
    Box::pin(async_stream::stream! {
        let mut events = events;
        let mut announced: HashSet<u32> = HashSet::new();

        while let Some(item) = events.next().await {
            match item {
                Ok(StreamEvent::Message { content }) => yield RawEvent::Text(content),
                Ok(StreamEvent::ToolCall { index, name, .. }) => {
                    if let Some(name) = name {
                        if announced.insert(index) {
                            yield RawEvent::ToolCallStarted(name);
                        }
                    }
                }
                Ok(StreamEvent::Done { finish_reason }) => {
                    tracing::debug!(finish_reason = ?finish_reason, "Completion finished");
                    yield RawEvent::End;
                    return;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Completion stream failed");
                    yield RawEvent::StreamError(e.to_string());
                    return;
                }
            }
        }

        tracing::debug!("Completion stream closed without a finish marker");
        yield RawEvent::End;
    })
}

/// Source that fails immediately, for turns whose stream could not be opened
pub fn error_stream(message: impl Into<String>) -> RawEventStream {
    Box::pin(futures::stream::once(futures::future::ready(RawEvent::StreamError(
        message.into(),
    ))))
}

/// Source replaying fixed events, then `End`
pub fn replay(events: Vec<RawEvent>) -> RawEventStream {
    Box::pin(futures::stream::iter(events).chain(futures::stream::once(
        futures::future::ready(RawEvent::End),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = SourceOptions::default();
        assert_eq!(options.temperature, 0.7);
        assert_eq!(options.max_tokens, 500);

        let chat = options.chat_options();
        assert_eq!(chat.temperature, Some(0.7));
        assert_eq!(chat.max_tokens, Some(500));
        assert!(chat.tools.is_none());
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: SourceOptions = serde_json::from_str(r#"{"max_tokens": 800}"#).unwrap();
        assert_eq!(options.temperature, 0.7);
        assert_eq!(options.max_tokens, 800);
    }
}
