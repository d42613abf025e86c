use async_trait::async_trait;
use futures::StreamExt;
use std::sync::{Arc, Mutex};

use vigor_agent::{
    AgentConfig, Features, RunHooks, SessionContext, WellnessAgent, AGENT_NAME,
};
use vigor_llm::Message;
use vigor_stream::adapter::replay;
use vigor_stream::{OutputChunk, RawEvent, RawEventStream, SourceAdapter, SourceOptions};

/// Source that answers every request with fixed text and records the prompts
struct ScriptedSource {
    reply: Vec<&'static str>,
    fail: bool,
    requests: Mutex<Vec<(Vec<Message>, String)>>,
}

impl ScriptedSource {
    fn new(reply: Vec<&'static str>) -> Arc<Self> {
        Arc::new(Self {
            reply,
            fail: false,
            requests: Mutex::new(Vec::new()),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: Vec::new(),
            fail: true,
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<(Vec<Message>, String)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SourceAdapter for ScriptedSource {
    async fn open(
        &self,
        messages: Vec<Message>,
        model: &str,
        _options: &SourceOptions,
    ) -> anyhow::Result<RawEventStream> {
        self.requests.lock().unwrap().push((messages, model.to_string()));
        if self.fail {
            anyhow::bail!("connection refused");
        }
        Ok(replay(self.reply.iter().map(|s| RawEvent::text(*s)).collect()))
    }
}

#[derive(Default)]
struct RecordingHooks {
    events: Mutex<Vec<String>>,
}

#[async_trait]
impl RunHooks for RecordingHooks {
    async fn on_tool_start(&self, _ctx: &SessionContext, tool: &str) {
        self.events.lock().unwrap().push(format!("tool_start:{}", tool));
    }

    async fn on_handoff(&self, _ctx: &SessionContext, from: &str, to: &str) {
        self.events.lock().unwrap().push(format!("handoff:{}->{}", from, to));
    }
}

fn agent_with(source: Arc<ScriptedSource>) -> WellnessAgent {
    WellnessAgent::builder()
        .session(SessionContext::new("Ana", 7))
        .source(source)
        .build()
        .unwrap()
}

async fn events(agent: &mut WellnessAgent, message: &str) -> Vec<RawEvent> {
    agent.stream_turn(message).await.collect().await
}

async fn reply(agent: &mut WellnessAgent, message: &str) -> Vec<OutputChunk> {
    agent
        .respond(message)
        .await
        .into_stream()
        .filter(|c| futures::future::ready(!c.is_empty()))
        .collect()
        .await
}

#[tokio::test]
async fn test_goal_route_emits_tool_events_in_order() {
    let mut agent = agent_with(ScriptedSource::new(vec![]));

    let events = events(&mut agent, "My goal is to lose 5kg in 2 months").await;

    assert_eq!(events.len(), 4);
    assert_eq!(events[0], RawEvent::ToolCallStarted("goal_analyzer".to_string()));
    assert!(matches!(&events[1], RawEvent::ToolResult(v) if v["duration_weeks"] == 8));
    assert!(matches!(&events[2], RawEvent::Text(t) if t.contains("recorded your goal")));
    assert_eq!(events[3], RawEvent::End);
    assert!(agent.session().goal.is_some());
}

#[tokio::test]
async fn test_meal_plan_without_goal_is_friendly() {
    let mut agent = agent_with(ScriptedSource::new(vec![]));

    let events = events(&mut agent, "Get a meal plan").await;

    assert_eq!(events[0], RawEvent::ToolCallStarted("meal_planner".to_string()));
    assert_eq!(events[1], RawEvent::text("Please tell me your health goal first."));
    assert_eq!(events[2], RawEvent::End);
}

#[tokio::test]
async fn test_invalid_goal_reports_expected_format() {
    let mut agent = agent_with(ScriptedSource::new(vec![]));

    let events = events(&mut agent, "my goal is to feel great").await;

    assert!(matches!(&events[1], RawEvent::Text(t) if t.contains("lose 5kg in 2 months")));
    assert!(agent.session().goal.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_meal_plan_after_goal_is_assembled() {
    let mut agent = agent_with(ScriptedSource::new(vec![]));
    let _ = events(&mut agent, "lose 5kg in 2 months").await;

    let chunks = reply(&mut agent, "vegetarian meal plan").await;

    assert_eq!(chunks.len(), 3, "chunks: {:?}", chunks);
    assert!(matches!(&chunks[0], OutputChunk::ToolCall { name, .. } if name == "meal_planner"));
    assert!(chunks[1].text().contains("Total Calories: 1800"));
    assert!(chunks[2].text().contains("meal plan"));
    assert!(agent.session().meal_plan.is_some());
}

#[tokio::test]
async fn test_specialist_handoff_is_logged() {
    let source = ScriptedSource::new(vec![]);
    let hooks = Arc::new(RecordingHooks::default());
    let mut agent = WellnessAgent::builder()
        .session(SessionContext::new("Ana", 7))
        .source(source.clone())
        .hooks(hooks.clone())
        .build()
        .unwrap();

    let events = events(&mut agent, "I'm diabetic, what should I eat?").await;

    assert_eq!(events[0], RawEvent::ToolCallStarted("nutrition_expert".to_string()));
    assert!(matches!(&events[1], RawEvent::ToolResult(v) if v["recommended_foods"][0] == "Quinoa"));
    assert_eq!(agent.session().handoff_logs.len(), 1);
    assert_eq!(
        hooks.events.lock().unwrap().as_slice(),
        [format!("handoff:{}->nutrition_expert", AGENT_NAME)]
    );
    assert!(source.requests().is_empty());
}

#[tokio::test]
async fn test_injury_without_details_asks_for_them() {
    let mut agent = agent_with(ScriptedSource::new(vec![]));

    let events = events(&mut agent, "my back is in pain").await;

    assert_eq!(events.len(), 2);
    assert!(matches!(&events[0], RawEvent::Text(t) if t.contains("location, pain level, and duration")));
}

#[tokio::test]
async fn test_chat_route_uses_source_with_context() {
    let source = ScriptedSource::new(vec!["Drink water", " through the day."]);
    let mut agent = agent_with(source.clone());
    agent.record_turn("hello", "Hi Ana!").await;
    agent.set_model("anthropic/claude-3-haiku");

    let events = events(&mut agent, "How much water should I drink?").await;

    assert_eq!(events.last(), Some(&RawEvent::End));
    let requests = source.requests();
    assert_eq!(requests.len(), 1);
    let (messages, model) = &requests[0];
    assert_eq!(model, "anthropic/claude-3-haiku");
    assert_eq!(messages[0].role(), "system");
    assert!(messages[0].text().unwrap_or_default().contains("User: Ana"));
    assert_eq!(messages[1].text(), Some("hello"));
    assert_eq!(messages[2].text(), Some("Hi Ana!"));
    assert_eq!(messages.last().and_then(Message::text), Some("How much water should I drink?"));
}

#[tokio::test(start_paused = true)]
async fn test_unreachable_model_yields_diagnostic() {
    let mut agent = agent_with(ScriptedSource::failing());

    let chunks = reply(&mut agent, "tell me something nice").await;

    assert_eq!(chunks.len(), 1);
    assert!(chunks[0].is_diagnostic());
    assert!(chunks[0].text().contains("connection refused"));
}

#[tokio::test]
async fn test_disabled_feature_falls_back_to_chat() {
    let source = ScriptedSource::new(vec!["Sure."]);
    let mut agent = WellnessAgent::builder()
        .session(SessionContext::new("Ana", 7))
        .source(source.clone())
        .config(AgentConfig::default().with_features(Features {
            workout_planning: false,
            ..Features::default()
        }))
        .build()
        .unwrap();

    let events = events(&mut agent, "workout ideas?").await;

    assert_eq!(events, vec![RawEvent::text("Sure."), RawEvent::End]);
    assert_eq!(source.requests().len(), 1);
}

#[tokio::test]
async fn test_empty_message_is_rejected_before_routing() {
    let hooks = Arc::new(RecordingHooks::default());
    let mut agent = WellnessAgent::builder()
        .session(SessionContext::new("Ana", 7))
        .source(ScriptedSource::new(vec![]))
        .hooks(hooks.clone())
        .build()
        .unwrap();

    let events = events(&mut agent, "   ").await;

    assert_eq!(events, vec![RawEvent::text("Message is empty"), RawEvent::End]);
    assert!(hooks.events.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_record_turn_grows_history() {
    let mut agent = agent_with(ScriptedSource::new(vec![]));
    agent.record_turn("q", "a").await;
    agent.record_turn("q2", "a2").await;
    assert_eq!(agent.session().history_len(), 2);
}
