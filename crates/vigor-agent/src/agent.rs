use anyhow::{anyhow, Result};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use vigor_llm::Message;
use vigor_stream::adapter::{error_stream, replay};
use vigor_stream::{RawEvent, RawEventStream, SourceAdapter, StreamAssembler};

use crate::config::AgentConfig;
use crate::error::AgentError;
use crate::guardrails::{response_warnings, validate_user_input};
use crate::hooks::{RunHooks, TracingHooks};
use crate::router::{KeywordRouter, Route, Router};
use crate::session::SessionContext;
use crate::specialists::{self, Specialist};
use crate::tools::ToolRegistry;
use crate::types::DietPreference;

pub const AGENT_NAME: &str = "wellness_planner";

const LEVELS: [&str; 3] = ["beginner", "intermediate", "advanced"];
const FREQUENCIES: [&str; 4] = ["daily", "biweekly", "weekly", "monthly"];

/// Routes each message to a tool, a specialist or the model and
/// produces the raw events of the reply.
pub struct WellnessAgent {
    session: SessionContext,
    source: Arc<dyn SourceAdapter>,
    router: Arc<dyn Router>,
    tools: ToolRegistry,
    hooks: Arc<dyn RunHooks>,
    config: AgentConfig,
}

impl WellnessAgent {
    pub fn builder() -> WellnessAgentBuilder {
        WellnessAgentBuilder::new()
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub fn set_model(&mut self, model: impl Into<String>) {
        self.config.model = model.into();
        info!(model = %self.config.model, "Switched model");
    }

    /// Raw events answering one user message. Never fails: problems
    /// surface as text or as a stream error inside the returned stream.
    pub async fn stream_turn(&mut self, message: &str) -> RawEventStream {
        if let Err(err) = validate_user_input(message) {
            warn!(error = %err, "Rejected user input");
            return replay(vec![RawEvent::text(err.to_string())]);
        }

        self.hooks.on_agent_start(&self.session, message).await;

        let route = self.router.route(message);
        debug!(route = ?route, "Routed message");

        if let Some(specialist) = specialists::for_route(route) {
            return self.hand_off(specialist, message).await;
        }

        match route.tool_name() {
            Some(tool) if self.config.features.allows(route) => self.run_tool(route, tool, message).await,
            _ => self.open_chat(message).await,
        }
    }

    /// Assembled reply to one user message
    pub async fn respond(&mut self, message: &str) -> StreamAssembler {
        let source = self.stream_turn(message).await;
        StreamAssembler::new(source, self.config.assembler.clone())
    }

    /// Store a finished exchange in the session history
    pub async fn record_turn(&mut self, user: &str, assistant: &str) {
        for phrase in response_warnings(assistant) {
            warn!(phrase = %phrase, "Response contains risky advice");
        }
        self.hooks.on_agent_end(&self.session, assistant).await;
        self.session.record_turn(user, assistant);
    }

    async fn run_tool(&mut self, route: Route, tool: &'static str, message: &str) -> RawEventStream {
        self.hooks.on_tool_start(&self.session, tool).await;

        let args = tool_args(route, message);
        match self.tools.call(tool, args, &mut self.session).await {
            Ok(result) => {
                self.hooks.on_tool_end(&self.session, tool, &result).await;
                replay(vec![
                    RawEvent::ToolCallStarted(tool.to_string()),
                    RawEvent::ToolResult(result),
                    RawEvent::text(follow_up(route)),
                ])
            }
            Err(err) => {
                warn!(tool = %tool, error = %err, "Tool failed");
                replay(vec![
                    RawEvent::ToolCallStarted(tool.to_string()),
                    RawEvent::text(friendly_error(&err, tool)),
                ])
            }
        }
    }

    async fn hand_off(&mut self, specialist: Box<dyn Specialist>, message: &str) -> RawEventStream {
        let name = specialist.name();
        self.hooks.on_handoff(&self.session, AGENT_NAME, name).await;
        specialist.on_handoff(&mut self.session);

        match specialist.handle(&mut self.session, message).await {
            Ok(result) => replay(vec![
                RawEvent::ToolCallStarted(name.to_string()),
                RawEvent::ToolResult(result),
            ]),
            Err(err) => {
                warn!(specialist = %name, error = %err, "Specialist declined");
                replay(vec![RawEvent::text(friendly_error(&err, name))])
            }
        }
    }

    async fn open_chat(&self, message: &str) -> RawEventStream {
        let mut messages = vec![Message::system(format!(
            "{}\n\n{}",
            self.config.system_prompt,
            self.session.profile_summary()
        ))];
        messages.extend(self.session.context_messages());
        messages.push(Message::user(message));

        match self
            .source
            .open(messages, &self.config.model, &self.config.source_options)
            .await
        {
            Ok(stream) => stream,
            Err(err) => {
                error!(model = %self.config.model, error = %err, "Failed to open completion stream");
                error_stream(format!("Could not reach the model: {}", err))
            }
        }
    }
}

fn tool_args(route: Route, message: &str) -> Value {
    let lowered = message.to_lowercase();
    match route {
        Route::Goal => json!({ "goal_string": message }),
        Route::MealPlan => {
            let prefs: Vec<&str> = DietPreference::ALL
                .iter()
                .map(|p| p.as_str())
                .filter(|p| lowered.contains(p))
                .collect();
            if prefs.is_empty() {
                json!({})
            } else {
                json!({ "diet_preferences": prefs })
            }
        }
        Route::Workout => match LEVELS.iter().find(|l| lowered.contains(*l)) {
            Some(level) => json!({ "experience_level": level }),
            None => json!({}),
        },
        Route::Progress => json!({ "update": message }),
        Route::CheckIn => match FREQUENCIES.iter().find(|f| lowered.contains(*f)) {
            Some(frequency) => json!({ "frequency": frequency }),
            None => json!({}),
        },
        _ => json!({}),
    }
}

fn follow_up(route: Route) -> &'static str {
    match route {
        Route::Goal => "I've recorded your goal. Would you like me to create a meal and workout plan?",
        Route::MealPlan => "That's your personalized meal plan. Ask for a workout plan whenever you're ready.",
        Route::Workout => "That's your personalized workout plan. Start slowly and focus on form.",
        Route::Progress => "Nice work, keep it up!",
        Route::CheckIn => "I'll check in with you then.",
        _ => "",
    }
}

fn friendly_error(err: &anyhow::Error, handler: &str) -> String {
    match err.downcast_ref::<AgentError>() {
        Some(agent_err) if agent_err.is_user_facing() => agent_err.to_string(),
        _ => format!("Sorry, {} couldn't complete that request. Please try again.", handler),
    }
}

/// Builder for [`WellnessAgent`]; the session and source are required
pub struct WellnessAgentBuilder {
    session: Option<SessionContext>,
    source: Option<Arc<dyn SourceAdapter>>,
    router: Option<Arc<dyn Router>>,
    tools: Option<ToolRegistry>,
    hooks: Option<Arc<dyn RunHooks>>,
    config: AgentConfig,
}

impl WellnessAgentBuilder {
    pub fn new() -> Self {
        Self {
            session: None,
            source: None,
            router: None,
            tools: None,
            hooks: None,
            config: AgentConfig::default(),
        }
    }

    pub fn session(mut self, session: SessionContext) -> Self {
        self.session = Some(session);
        self
    }

    pub fn source(mut self, source: Arc<dyn SourceAdapter>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn router(mut self, router: Arc<dyn Router>) -> Self {
        self.router = Some(router);
        self
    }

    pub fn tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn hooks(mut self, hooks: Arc<dyn RunHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    pub fn config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<WellnessAgent> {
        let session = self.session.ok_or_else(|| anyhow!("Session is required"))?;
        let source = self.source.ok_or_else(|| anyhow!("Source adapter is required"))?;

        Ok(WellnessAgent {
            session,
            source,
            router: self.router.unwrap_or_else(|| Arc::new(KeywordRouter)),
            tools: self.tools.unwrap_or_else(ToolRegistry::with_defaults),
            hooks: self.hooks.unwrap_or_else(|| Arc::new(TracingHooks)),
            config: self.config,
        })
    }
}

impl Default for WellnessAgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}
