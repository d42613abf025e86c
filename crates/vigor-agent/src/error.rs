use thiserror::Error;

use crate::guardrails::GuardrailError;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Please tell me your health goal first.")]
    MissingGoal,

    #[error(transparent)]
    Guardrail(#[from] GuardrailError),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {source}")]
    InvalidArguments {
        tool: String,
        #[source]
        source: serde_json::Error,
    },
}

impl AgentError {
    /// Whether the message is safe to show the user verbatim
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Self::MissingGoal | Self::Guardrail(_))
    }
}
