use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

use vigor_llm::{Content, Message};

use crate::types::{DietPreference, Goal, MealPlan, ProgressEntry, WorkoutPlan};

pub const MAX_HISTORY_TURNS: usize = 50;
pub const CONTEXT_TURNS: usize = 5;
pub const CONTEXT_PREVIEW_CHARS: usize = 100;

/// One completed exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub user: String,
    pub assistant: String,
    pub at: DateTime<Utc>,
}

/// Everything the assistant knows about the current user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionContext {
    pub session_id: Uuid,
    pub name: String,
    pub uid: u64,
    pub goal: Option<Goal>,
    pub diet_preferences: Vec<DietPreference>,
    pub workout_plan: Option<WorkoutPlan>,
    pub meal_plan: Option<MealPlan>,
    pub injury_notes: Option<String>,
    pub handoff_logs: Vec<String>,
    pub progress_logs: Vec<ProgressEntry>,
    history: VecDeque<Turn>,
}

impl SessionContext {
    pub fn new(name: impl Into<String>, uid: u64) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            name: name.into(),
            uid,
            goal: None,
            diet_preferences: Vec::new(),
            workout_plan: None,
            meal_plan: None,
            injury_notes: None,
            handoff_logs: Vec::new(),
            progress_logs: Vec::new(),
            history: VecDeque::new(),
        }
    }

    pub fn update_goal(&mut self, goal: Goal) {
        self.goal = Some(goal);
    }

    pub fn update_diet_preferences(&mut self, preferences: Vec<DietPreference>) {
        self.diet_preferences = preferences;
    }

    pub fn update_workout_plan(&mut self, plan: WorkoutPlan) {
        self.workout_plan = Some(plan);
    }

    pub fn update_meal_plan(&mut self, plan: MealPlan) {
        self.meal_plan = Some(plan);
    }

    pub fn add_injury_note(&mut self, note: impl Into<String>) {
        self.injury_notes = Some(note.into());
    }

    pub fn log_handoff(&mut self, entry: impl Into<String>) {
        self.handoff_logs.push(entry.into());
    }

    pub fn log_progress(&mut self, update: impl Into<String>) {
        self.progress_logs.push(ProgressEntry {
            update: update.into(),
            recorded_at: Utc::now(),
        });
    }

    /// Append a finished exchange, dropping the oldest past the history cap
    pub fn record_turn(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        if self.history.len() == MAX_HISTORY_TURNS {
            self.history.pop_front();
        }
        self.history.push_back(Turn {
            user: user.into(),
            assistant: assistant.into(),
            at: Utc::now(),
        });
    }

    pub fn history(&self) -> impl Iterator<Item = &Turn> {
        self.history.iter()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Recent turns as chat messages, each side previewed
    pub fn context_messages(&self) -> Vec<Message> {
        let skip = self.history.len().saturating_sub(CONTEXT_TURNS);
        self.history
            .iter()
            .skip(skip)
            .flat_map(|turn| {
                [
                    Message::user(Content::text(turn.user.as_str()).preview(CONTEXT_PREVIEW_CHARS)),
                    Message::assistant(Content::text(turn.assistant.as_str()).preview(CONTEXT_PREVIEW_CHARS)),
                ]
            })
            .collect()
    }

    /// One-line summary for the system prompt
    pub fn profile_summary(&self) -> String {
        let mut parts = vec![format!("User: {}", self.name)];
        if let Some(goal) = &self.goal {
            parts.push(format!(
                "Goal: {:?} {} {} over {} weeks",
                goal.goal_type, goal.target_value, goal.unit, goal.duration_weeks
            ));
        }
        if !self.diet_preferences.is_empty() {
            let prefs: Vec<&str> = self.diet_preferences.iter().map(|p| p.as_str()).collect();
            parts.push(format!("Diet: {}", prefs.join(", ")));
        }
        if let Some(note) = &self.injury_notes {
            parts.push(format!("Injury notes: {}", note));
        }
        parts.join(". ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_is_capped() {
        let mut ctx = SessionContext::new("Ana", 7);
        for i in 0..(MAX_HISTORY_TURNS + 5) {
            ctx.record_turn(format!("q{}", i), format!("a{}", i));
        }
        assert_eq!(ctx.history_len(), MAX_HISTORY_TURNS);
        assert_eq!(ctx.history().next().map(|t| t.user.as_str()), Some("q5"));
    }

    #[test]
    fn test_context_messages_use_recent_turns() {
        let mut ctx = SessionContext::new("Ana", 7);
        for i in 0..8 {
            ctx.record_turn(format!("q{}", i), format!("a{}", i));
        }
        let messages = ctx.context_messages();
        assert_eq!(messages.len(), CONTEXT_TURNS * 2);
        assert_eq!(messages[0].text(), Some("q3"));
        assert_eq!(messages[9].text(), Some("a7"));
    }

    #[test]
    fn test_context_messages_are_truncated() {
        let mut ctx = SessionContext::new("Ana", 7);
        ctx.record_turn("x".repeat(150), "short");
        let messages = ctx.context_messages();
        let user = messages[0].text().unwrap_or_default();
        assert_eq!(user, format!("{}...", "x".repeat(100)));
        assert_eq!(messages[1].text(), Some("short"));
    }

    #[test]
    fn test_logs_accumulate() {
        let mut ctx = SessionContext::new("Ana", 7);
        ctx.log_handoff("Control handed to nutrition_expert agent");
        ctx.log_progress("ran 5km");
        assert_eq!(ctx.handoff_logs.len(), 1);
        assert_eq!(ctx.progress_logs[0].update, "ran 5km");
    }
}
