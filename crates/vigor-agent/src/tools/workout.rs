use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{parse_args, Tool};
use crate::error::AgentError;
use crate::guardrails::validate_difficulty;
use crate::session::SessionContext;
use crate::types::{Difficulty, Exercise, GoalType, WorkoutPlan};

fn default_level() -> String {
    "beginner".to_string()
}

#[derive(Deserialize)]
struct Args {
    #[serde(default = "default_level")]
    experience_level: String,
}

/// Workout plan for the session goal and experience level
pub struct WorkoutRecommender;

fn exercise(name: &str, sets: u32, reps: u32, notes: &str) -> Exercise {
    Exercise {
        name: name.to_string(),
        sets,
        reps,
        rest_seconds: 60,
        notes: notes.to_string(),
    }
}

impl WorkoutRecommender {
    pub fn plan(goal_type: GoalType, difficulty: Difficulty) -> WorkoutPlan {
        let sets = match difficulty {
            Difficulty::Beginner => 3,
            Difficulty::Intermediate => 4,
            Difficulty::Advanced => 5,
        };

        let mut exercises = vec![
            exercise("Squats", sets, 12, "Focus on form and depth"),
            exercise("Push-ups", sets, 10, "Modify on knees if needed"),
        ];
        match goal_type {
            GoalType::WeightLoss | GoalType::Endurance => {
                exercises.push(exercise("Jumping jacks", sets, 30, "Keep a steady pace"))
            }
            GoalType::Flexibility => exercises.push(exercise("Hamstring stretch", 2, 1, "Hold for 30 seconds")),
            GoalType::MuscleGain | GoalType::Strength => {
                exercises.push(exercise("Lunges", sets, 10, "Alternate legs"))
            }
        }

        WorkoutPlan {
            exercises,
            duration_minutes: 45,
            difficulty,
            equipment_needed: vec!["None".to_string(), "Exercise mat".to_string()],
        }
    }
}

#[async_trait]
impl Tool for WorkoutRecommender {
    fn name(&self) -> &'static str {
        "workout_recommender"
    }

    fn description(&self) -> &'static str {
        "Recommends personalized workout plans based on user goals and experience"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "experience_level": {
                    "type": "string",
                    "enum": ["beginner", "intermediate", "advanced"],
                    "default": "beginner"
                }
            }
        })
    }

    async fn run(&self, args: Value, ctx: &mut SessionContext) -> Result<Value> {
        let args: Args = parse_args(self.name(), args)?;
        let goal_type = ctx.goal.as_ref().ok_or(AgentError::MissingGoal)?.goal_type;
        let difficulty = validate_difficulty(&args.experience_level).map_err(AgentError::from)?;

        let plan = Self::plan(goal_type, difficulty);
        let value = serde_json::to_value(&plan)?;
        ctx.update_workout_plan(plan);
        Ok(value)
    }
}
