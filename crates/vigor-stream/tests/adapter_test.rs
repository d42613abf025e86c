use async_trait::async_trait;
use futures::StreamExt;
use std::sync::{Arc, Mutex};

use vigor_llm::traits::EventStream;
use vigor_llm::{ChatClient, ChatRequest, ChatResponse, Message, StreamEvent};
use vigor_stream::adapter::error_stream;
use vigor_stream::{
    AssemblerConfig, ChatSourceAdapter, OutputChunk, RawEvent, SourceAdapter, SourceOptions,
    StreamAssembler,
};

/// Chat client that replays scripted stream events and records requests
struct ScriptedClient {
    script: Vec<Result<StreamEvent, String>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedClient {
    fn new(script: Vec<Result<StreamEvent, String>>) -> Self {
        Self {
            script,
            requests: Mutex::new(Vec::new()),
        }
    }

    fn last_request(&self) -> ChatRequest {
        self.requests.lock().unwrap().last().cloned().expect("no request recorded")
    }
}

#[async_trait]
impl ChatClient for ScriptedClient {
    async fn chat(&self, _request: ChatRequest) -> anyhow::Result<ChatResponse> {
        anyhow::bail!("non-streaming chat is not scripted")
    }

    async fn chat_stream(&self, request: ChatRequest) -> anyhow::Result<EventStream> {
        self.requests.lock().unwrap().push(request);
        let items: Vec<anyhow::Result<StreamEvent>> = self
            .script
            .iter()
            .cloned()
            .map(|item| item.map_err(anyhow::Error::msg))
            .collect();
        Ok(Box::pin(futures::stream::iter(items)))
    }
}

fn message(content: &str) -> Result<StreamEvent, String> {
    Ok(StreamEvent::Message {
        content: content.to_string(),
    })
}

fn tool_delta(name: Option<&str>, arguments: &str) -> Result<StreamEvent, String> {
    Ok(StreamEvent::ToolCall {
        index: 0,
        id: name.map(|_| "call_1".to_string()),
        name: name.map(str::to_string),
        arguments: Some(arguments.to_string()),
    })
}

fn done() -> Result<StreamEvent, String> {
    Ok(StreamEvent::Done {
        finish_reason: Some("stop".to_string()),
    })
}

#[tokio::test]
async fn test_maps_provider_events_to_raw_events() {
    let client = Arc::new(ScriptedClient::new(vec![
        message("Let me check"),
        tool_delta(Some("meal_planner"), ""),
        tool_delta(None, "{\"diet\":"),
        tool_delta(None, "\"vegan\"}"),
        message("Done."),
        done(),
        message("never seen"),
    ]));
    let adapter = ChatSourceAdapter::new(client.clone());

    let events: Vec<RawEvent> = adapter
        .open(vec![Message::user("plan meals")], "openai/gpt-4o-mini", &SourceOptions::default())
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(
        events,
        vec![
            RawEvent::text("Let me check"),
            RawEvent::ToolCallStarted("meal_planner".to_string()),
            RawEvent::text("Done."),
            RawEvent::End,
        ]
    );

    let request = client.last_request();
    assert_eq!(request.model, "openai/gpt-4o-mini");
    assert_eq!(request.options.temperature, Some(0.7));
    assert_eq!(request.options.max_tokens, Some(500));
}

#[tokio::test]
async fn test_transport_error_becomes_stream_error() {
    let client = Arc::new(ScriptedClient::new(vec![
        message("partial"),
        Err("connection reset".to_string()),
        message("ignored"),
    ]));
    let adapter = ChatSourceAdapter::new(client);

    let events: Vec<RawEvent> = adapter
        .open(vec![Message::user("hi")], "m", &SourceOptions::default())
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(events.len(), 2);
    assert_eq!(events[0], RawEvent::text("partial"));
    assert!(matches!(&events[1], RawEvent::StreamError(msg) if msg.contains("connection reset")));
}

#[tokio::test]
async fn test_missing_finish_marker_still_ends() {
    let client = Arc::new(ScriptedClient::new(vec![message("Hi")]));
    let adapter = ChatSourceAdapter::new(client);

    let events: Vec<RawEvent> = adapter
        .open(vec![Message::user("hi")], "m", &SourceOptions::default().with_max_tokens(64))
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(events, vec![RawEvent::text("Hi"), RawEvent::End]);
}

#[tokio::test(start_paused = true)]
async fn test_end_to_end_through_assembler() {
    let client = Arc::new(ScriptedClient::new(vec![
        message("Great"),
        message(" question. Here"),
        message(" is a tip"),
        done(),
    ]));
    let adapter = ChatSourceAdapter::new(client);
    let source = adapter
        .open(vec![Message::user("tips?")], "m", &SourceOptions::default())
        .await
        .unwrap();

    let chunks: Vec<OutputChunk> = StreamAssembler::new(source, AssemblerConfig::default())
        .into_stream()
        .filter(|c| futures::future::ready(!c.is_empty()))
        .collect()
        .await;

    let texts: Vec<&str> = chunks.iter().map(|c| c.text()).collect();
    assert_eq!(texts, vec!["Great question. Here\n\n", "is a tip\n\n"]);
}

#[tokio::test(start_paused = true)]
async fn test_error_stream_yields_single_diagnostic() {
    let chunks: Vec<OutputChunk> = StreamAssembler::new(
        error_stream("could not reach provider"),
        AssemblerConfig::default(),
    )
    .into_stream()
    .collect()
    .await;

    assert_eq!(chunks.len(), 1);
    assert!(chunks[0].is_diagnostic());
    assert!(chunks[0].text().contains("could not reach provider"));
}
