use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{parse_args, Tool};
use crate::session::SessionContext;

fn default_frequency() -> String {
    "weekly".to_string()
}

#[derive(Deserialize)]
struct Args {
    #[serde(default)]
    user_id: Option<u64>,
    #[serde(default = "default_frequency")]
    frequency: String,
}

pub struct CheckinScheduler;

#[async_trait]
impl Tool for CheckinScheduler {
    fn name(&self) -> &'static str {
        "checkin_scheduler"
    }

    fn description(&self) -> &'static str {
        "Schedules recurring progress check-ins"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "user_id": {"type": "integer", "description": "User's unique ID"},
                "frequency": {"type": "string", "description": "Check-in frequency", "default": "weekly"}
            }
        })
    }

    async fn run(&self, args: Value, ctx: &mut SessionContext) -> Result<Value> {
        let args: Args = parse_args(self.name(), args)?;
        let uid = args.user_id.unwrap_or(ctx.uid);
        Ok(json!({
            "message": format!("Scheduled {} check-ins for user {}.", args.frequency, uid)
        }))
    }
}
