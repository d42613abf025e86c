use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::LazyLock;

use super::{parse_args, Tool};
use crate::error::AgentError;
use crate::guardrails::{validate_goal_string, validate_unit, GuardrailError};
use crate::router::find_goal_phrase;
use crate::session::SessionContext;
use crate::types::{Goal, GoalType};

static GOAL_PARTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(lose|gain)\s+(\d+(?:\.\d+)?)\s*(kg|lbs)\s+in\s+(\d+)\s+(weeks?|months?)$")
        .expect("goal parts regex")
});

const WEEKS_PER_MONTH: u32 = 4;

#[derive(Deserialize)]
struct Args {
    goal_string: String,
}

/// Turns "lose 5kg in 2 months" into a structured goal
pub struct GoalAnalyzer;

impl GoalAnalyzer {
    pub fn parse(goal_string: &str) -> Result<Goal, GuardrailError> {
        let phrase = find_goal_phrase(goal_string)
            .ok_or(GuardrailError::InvalidGoalFormat)?
            .to_lowercase();
        validate_goal_string(&phrase)?;

        let caps = GOAL_PARTS
            .captures(&phrase)
            .ok_or(GuardrailError::InvalidGoalFormat)?;

        let goal_type = if &caps[1] == "lose" {
            GoalType::WeightLoss
        } else {
            GoalType::MuscleGain
        };
        let target_value: f64 = caps[2].parse().map_err(|_| GuardrailError::InvalidGoalFormat)?;
        let unit = validate_unit(&caps[3])?;
        let duration: u32 = caps[4].parse().map_err(|_| GuardrailError::InvalidGoalFormat)?;
        let duration_weeks = if caps[5].starts_with("month") {
            duration.saturating_mul(WEEKS_PER_MONTH)
        } else {
            duration
        };

        Ok(Goal {
            goal_type,
            target_value,
            unit,
            duration_weeks,
        })
    }
}

#[async_trait]
impl Tool for GoalAnalyzer {
    fn name(&self) -> &'static str {
        "goal_analyzer"
    }

    fn description(&self) -> &'static str {
        "Analyzes and structures user health and fitness goals"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "goal_string": {
                    "type": "string",
                    "description": "Goal in the form 'lose 5kg in 2 months'"
                }
            },
            "required": ["goal_string"]
        })
    }

    async fn run(&self, args: Value, ctx: &mut SessionContext) -> Result<Value> {
        let args: Args = parse_args(self.name(), args)?;
        let goal = Self::parse(&args.goal_string).map_err(AgentError::from)?;
        let value = serde_json::to_value(&goal)?;
        ctx.update_goal(goal);
        Ok(value)
    }
}
