use regex::Regex;
use std::sync::LazyLock;

static GOAL_PHRASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(lose|gain)\s+\d+(\.\d+)?\s*(kg|lbs)\s+in\s+\d+\s+(weeks?|months?)\b")
        .expect("goal phrase regex")
});

/// Where a user message is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    NutritionExpert,
    InjurySupport,
    Escalation,
    Goal,
    MealPlan,
    Workout,
    Progress,
    CheckIn,
    Chat,
}

impl Route {
    /// Name of the tool serving this route, if any
    pub fn tool_name(&self) -> Option<&'static str> {
        match self {
            Self::Goal => Some("goal_analyzer"),
            Self::MealPlan => Some("meal_planner"),
            Self::Workout => Some("workout_recommender"),
            Self::Progress => Some("progress_tracker"),
            Self::CheckIn => Some("checkin_scheduler"),
            _ => None,
        }
    }

    pub fn is_handoff(&self) -> bool {
        matches!(self, Self::NutritionExpert | Self::InjurySupport | Self::Escalation)
    }
}

/// Decides which handler serves a user message
pub trait Router: Send + Sync {
    fn route(&self, message: &str) -> Route;
}

/// Keyword router: hand-off keywords win over tool keywords,
/// anything unmatched goes to the model.
pub struct KeywordRouter;

impl Router for KeywordRouter {
    fn route(&self, message: &str) -> Route {
        let text = message.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| text.contains(w));

        if has(&["diabetic", "allergy"]) {
            Route::NutritionExpert
        } else if has(&["injury", "pain"]) {
            Route::InjurySupport
        } else if has(&["coach", "human"]) {
            Route::Escalation
        } else if has(&["goal"]) || GOAL_PHRASE.is_match(message) {
            Route::Goal
        } else if has(&["meal plan"]) {
            Route::MealPlan
        } else if has(&["workout", "exercise"]) {
            Route::Workout
        } else if has(&["progress", "track"]) {
            Route::Progress
        } else if has(&["check-in", "checkin", "schedule"]) {
            Route::CheckIn
        } else {
            Route::Chat
        }
    }
}

/// First goal phrase in a message, e.g. `lose 5kg in 2 months`
pub fn find_goal_phrase(message: &str) -> Option<&str> {
    GOAL_PHRASE.find(message).map(|m| m.as_str())
}
