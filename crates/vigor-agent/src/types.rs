use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::guardrails::GuardrailError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalType {
    WeightLoss,
    MuscleGain,
    Endurance,
    Flexibility,
    Strength,
}

impl GoalType {
    pub const ALL: [&'static str; 5] = ["weight_loss", "muscle_gain", "endurance", "flexibility", "strength"];
}

impl FromStr for GoalType {
    type Err = GuardrailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "weight_loss" => Ok(Self::WeightLoss),
            "muscle_gain" => Ok(Self::MuscleGain),
            "endurance" => Ok(Self::Endurance),
            "flexibility" => Ok(Self::Flexibility),
            "strength" => Ok(Self::Strength),
            _ => Err(GuardrailError::InvalidGoalType(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Kg,
    Lbs,
    Km,
    Miles,
    Minutes,
}

impl Unit {
    pub const ALL: [&'static str; 5] = ["kg", "lbs", "km", "miles", "minutes"];
}

impl FromStr for Unit {
    type Err = GuardrailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "kg" => Ok(Self::Kg),
            "lbs" => Ok(Self::Lbs),
            "km" => Ok(Self::Km),
            "miles" => Ok(Self::Miles),
            "minutes" => Ok(Self::Minutes),
            _ => Err(GuardrailError::InvalidUnit(s.to_string())),
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Kg => "kg",
            Self::Lbs => "lbs",
            Self::Km => "km",
            Self::Miles => "miles",
            Self::Minutes => "minutes",
        };
        f.write_str(s)
    }
}

/// Structured health goal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub goal_type: GoalType,
    pub target_value: f64,
    pub unit: Unit,
    pub duration_weeks: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl FromStr for Difficulty {
    type Err = GuardrailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            _ => Err(GuardrailError::InvalidDifficulty(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DietPreference {
    Vegetarian,
    Vegan,
    Pescatarian,
    Keto,
    Paleo,
    Mediterranean,
}

impl DietPreference {
    pub const ALL: [DietPreference; 6] = [
        Self::Vegetarian,
        Self::Vegan,
        Self::Pescatarian,
        Self::Keto,
        Self::Paleo,
        Self::Mediterranean,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vegetarian => "vegetarian",
            Self::Vegan => "vegan",
            Self::Pescatarian => "pescatarian",
            Self::Keto => "keto",
            Self::Paleo => "paleo",
            Self::Mediterranean => "mediterranean",
        }
    }
}

impl FromStr for DietPreference {
    type Err = GuardrailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| GuardrailError::InvalidDietPreference(s.to_string()))
    }
}

impl fmt::Display for DietPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub name: String,
    pub items: Vec<String>,
    pub calories: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Macros {
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPlan {
    pub meals: Vec<Meal>,
    pub total_calories: u32,
    pub macros: Macros,
    pub shopping_list: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub name: String,
    pub sets: u32,
    pub reps: u32,
    pub rest_seconds: u32,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutPlan {
    pub exercises: Vec<Exercise>,
    pub duration_minutes: u32,
    pub difficulty: Difficulty,
    pub equipment_needed: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEntry {
    pub update: String,
    pub recorded_at: chrono::DateTime<chrono::Utc>,
}
