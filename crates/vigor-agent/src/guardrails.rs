//! Input and output guardrails.

use regex::Regex;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

use crate::types::{DietPreference, Difficulty, GoalType, Unit};

pub const MAX_INPUT_CHARS: usize = 1000;

static GOAL_STRING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(lose|gain)\s+\d+(\.\d+)?\s*(kg|lbs)\s+in\s+\d+\s+(weeks?|months?)$")
        .expect("goal string regex")
});

const INJURY_DETAILS: [&str; 3] = ["location", "pain level", "duration"];

const RISKY_PHRASES: [&str; 4] = [
    "stop taking your medication",
    "guaranteed results",
    "no need to see a doctor",
    "starve",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardrailError {
    #[error("Invalid goal format. Example: 'lose 5kg in 2 months'")]
    InvalidGoalFormat,

    #[error("Goal type must be one of {allowed:?}, got '{0}'", allowed = GoalType::ALL)]
    InvalidGoalType(String),

    #[error("Unit must be one of {allowed:?}, got '{0}'", allowed = Unit::ALL)]
    InvalidUnit(String),

    #[error("Difficulty must be one of beginner, intermediate, advanced, got '{0}'")]
    InvalidDifficulty(String),

    #[error("Invalid dietary preference: {0}")]
    InvalidDietPreference(String),

    #[error("Please describe the injury location, pain level, and duration")]
    IncompleteInjuryDescription,

    #[error("Message is empty")]
    EmptyInput,

    #[error("Message is too long ({0} characters, limit {limit})", limit = MAX_INPUT_CHARS)]
    InputTooLong(usize),
}

/// Goal strings look like `lose 5kg in 2 months` (case-insensitive)
pub fn validate_goal_string(goal: &str) -> Result<(), GuardrailError> {
    if GOAL_STRING.is_match(&goal.trim().to_lowercase()) {
        Ok(())
    } else {
        Err(GuardrailError::InvalidGoalFormat)
    }
}

pub fn validate_goal_type(value: &str) -> Result<GoalType, GuardrailError> {
    GoalType::from_str(value)
}

pub fn validate_unit(value: &str) -> Result<Unit, GuardrailError> {
    Unit::from_str(value)
}

pub fn validate_difficulty(value: &str) -> Result<Difficulty, GuardrailError> {
    Difficulty::from_str(value)
}

pub fn validate_diet_preferences<S: AsRef<str>>(values: &[S]) -> Result<Vec<DietPreference>, GuardrailError> {
    values.iter().map(|v| DietPreference::from_str(v.as_ref())).collect()
}

pub fn validate_injury_description(description: &str) -> Result<(), GuardrailError> {
    let lowered = description.to_lowercase();
    if INJURY_DETAILS.iter().all(|detail| lowered.contains(detail)) {
        Ok(())
    } else {
        Err(GuardrailError::IncompleteInjuryDescription)
    }
}

pub fn validate_user_input(message: &str) -> Result<(), GuardrailError> {
    if message.trim().is_empty() {
        return Err(GuardrailError::EmptyInput);
    }
    let len = message.chars().count();
    if len > MAX_INPUT_CHARS {
        return Err(GuardrailError::InputTooLong(len));
    }
    Ok(())
}

/// Phrases in a model response that warrant a warning; the text is not altered
pub fn response_warnings(response: &str) -> Vec<&'static str> {
    let lowered = response.to_lowercase();
    RISKY_PHRASES
        .iter()
        .copied()
        .filter(|phrase| lowered.contains(phrase))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_goal_string() {
        assert!(validate_goal_string("lose 5kg in 2 months").is_ok());
        assert!(validate_goal_string("Gain 3.5 lbs in 6 weeks").is_ok());
        assert!(validate_goal_string("lose 5 kg in 1 month").is_ok());
        assert_eq!(validate_goal_string("get fit soon"), Err(GuardrailError::InvalidGoalFormat));
        assert!(validate_goal_string("lose 5 stone in 2 months").is_err());
    }

    #[test]
    fn test_enumerations() {
        assert_eq!(validate_goal_type("Weight_Loss"), Ok(GoalType::WeightLoss));
        assert!(validate_goal_type("bulking").is_err());
        assert_eq!(validate_unit("KG"), Ok(Unit::Kg));
        assert!(validate_unit("stone").is_err());
        assert_eq!(validate_difficulty("Advanced"), Ok(Difficulty::Advanced));
        assert!(validate_difficulty("expert").is_err());
    }

    #[test]
    fn test_diet_preferences() {
        assert_eq!(
            validate_diet_preferences(&["Vegan", "keto"]),
            Ok(vec![DietPreference::Vegan, DietPreference::Keto])
        );
        assert_eq!(
            validate_diet_preferences(&["carnivore"]),
            Err(GuardrailError::InvalidDietPreference("carnivore".to_string()))
        );
    }

    #[test]
    fn test_injury_description() {
        assert!(validate_injury_description(
            "Location: left knee, pain level 6, duration two weeks"
        )
        .is_ok());
        assert_eq!(
            validate_injury_description("my knee hurts"),
            Err(GuardrailError::IncompleteInjuryDescription)
        );
    }

    #[test]
    fn test_user_input() {
        assert_eq!(validate_user_input("  "), Err(GuardrailError::EmptyInput));
        assert!(validate_user_input("hello").is_ok());
        let long = "x".repeat(MAX_INPUT_CHARS + 1);
        assert_eq!(validate_user_input(&long), Err(GuardrailError::InputTooLong(1001)));
    }

    #[test]
    fn test_response_warnings() {
        assert_eq!(response_warnings("Guaranteed results in a week!"), vec!["guaranteed results"]);
        assert!(response_warnings("Drink water and rest.").is_empty());
    }
}
