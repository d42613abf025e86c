//! Assistant tools and their registry.

mod checkin;
mod goal;
mod meal;
mod progress;
mod workout;

use anyhow::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::AgentError;
use crate::session::SessionContext;

pub use checkin::CheckinScheduler;
pub use goal::GoalAnalyzer;
pub use meal::MealPlanner;
pub use progress::ProgressTracker;
pub use workout::WorkoutRecommender;

/// A callable tool. `run` may read and update the session.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// JSON schema of the arguments object
    fn parameters(&self) -> Value;

    async fn run(&self, args: Value, ctx: &mut SessionContext) -> Result<Value>;

    fn definition(&self) -> vigor_llm::Tool {
        vigor_llm::Tool::function(self.name(), self.description(), self.parameters())
    }
}

pub(crate) fn parse_args<T: DeserializeOwned>(tool: &str, args: Value) -> Result<T, AgentError> {
    serde_json::from_value(args).map_err(|source| AgentError::InvalidArguments {
        tool: tool.to_string(),
        source,
    })
}

/// Tools by name
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: HashMap<&'static str, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in tool
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(GoalAnalyzer));
        registry.register(Arc::new(MealPlanner));
        registry.register(Arc::new(WorkoutRecommender));
        registry.register(Arc::new(CheckinScheduler));
        registry.register(Arc::new(ProgressTracker));
        registry
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        info!(tool = %tool.name(), "Registered tool");
        self.tools.insert(tool.name(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Sorted tool names
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.tools.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn definitions(&self) -> Vec<vigor_llm::Tool> {
        self.names()
            .into_iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| tool.definition())
            .collect()
    }

    pub async fn call(&self, name: &str, args: Value, ctx: &mut SessionContext) -> Result<Value> {
        let tool = self
            .get(name)
            .ok_or_else(|| AgentError::UnknownTool(name.to_string()))?;
        debug!(tool = %name, args = %args, "Calling tool");
        tool.run(args, ctx).await
    }
}
