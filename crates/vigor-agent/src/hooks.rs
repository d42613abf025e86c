use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use crate::session::SessionContext;

/// Lifecycle callbacks around a turn. Every method defaults to a no-op.
#[async_trait]
pub trait RunHooks: Send + Sync {
    async fn on_agent_start(&self, _ctx: &SessionContext, _message: &str) {}

    async fn on_agent_end(&self, _ctx: &SessionContext, _response: &str) {}

    async fn on_tool_start(&self, _ctx: &SessionContext, _tool: &str) {}

    async fn on_tool_end(&self, _ctx: &SessionContext, _tool: &str, _result: &Value) {}

    async fn on_handoff(&self, _ctx: &SessionContext, _from: &str, _to: &str) {}
}

/// Hooks that only emit tracing events
pub struct TracingHooks;

#[async_trait]
impl RunHooks for TracingHooks {
    async fn on_agent_start(&self, ctx: &SessionContext, message: &str) {
        info!(user = %ctx.name, session_id = %ctx.session_id, chars = message.len(), "Turn started");
    }

    async fn on_agent_end(&self, ctx: &SessionContext, response: &str) {
        info!(user = %ctx.name, session_id = %ctx.session_id, chars = response.len(), "Turn finished");
    }

    async fn on_tool_start(&self, ctx: &SessionContext, tool: &str) {
        info!(user = %ctx.name, tool = %tool, "Tool started");
    }

    async fn on_tool_end(&self, ctx: &SessionContext, tool: &str, result: &Value) {
        debug!(user = %ctx.name, tool = %tool, result = %result, "Tool finished");
    }

    async fn on_handoff(&self, ctx: &SessionContext, from: &str, to: &str) {
        info!(user = %ctx.name, from = %from, to = %to, "Hand-off");
    }
}
