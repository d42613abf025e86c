use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{parse_args, Tool};
use crate::session::SessionContext;

#[derive(Deserialize)]
struct Args {
    update: String,
}

/// Appends a progress note to the session
pub struct ProgressTracker;

#[async_trait]
impl Tool for ProgressTracker {
    fn name(&self) -> &'static str {
        "progress_tracker"
    }

    fn description(&self) -> &'static str {
        "Accepts updates and tracks user progress in the session"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "update": {"type": "string", "description": "Progress update text"}
            },
            "required": ["update"]
        })
    }

    async fn run(&self, args: Value, ctx: &mut SessionContext) -> Result<Value> {
        let args: Args = parse_args(self.name(), args)?;
        let update = args.update.trim().to_string();
        ctx.log_progress(update.clone());
        Ok(json!({
            "message": format!("Progress updated for user {}: {}", ctx.uid, update),
            "entries": ctx.progress_logs.len()
        }))
    }
}
