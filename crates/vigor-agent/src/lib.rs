//! Wellness assistant built on the streaming assembler.
//!
//! Messages are routed by keyword to a tool, a specialist hand-off or the
//! model. Tool and specialist replies are replayed as raw events so every
//! route reaches the user through the same [`vigor_stream::StreamAssembler`].

pub mod agent;
pub mod config;
pub mod error;
pub mod guardrails;
pub mod hooks;
pub mod router;
pub mod session;
pub mod specialists;
pub mod tools;
pub mod types;

pub use agent::{WellnessAgent, WellnessAgentBuilder, AGENT_NAME};
pub use config::{AgentConfig, Features};
pub use error::AgentError;
pub use guardrails::GuardrailError;
pub use hooks::{RunHooks, TracingHooks};
pub use router::{KeywordRouter, Route, Router};
pub use session::{SessionContext, Turn};
pub use specialists::Specialist;
pub use tools::{Tool, ToolRegistry};
pub use types::{DietPreference, Difficulty, Goal, GoalType, MealPlan, Unit, WorkoutPlan};
