use serde::{Deserialize, Serialize};

use vigor_stream::{AssemblerConfig, SourceOptions};

use crate::router::Route;

pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a friendly health and wellness assistant. \
Give practical, safe advice on nutrition, exercise and habits. \
Keep answers short and suggest seeing a professional for medical concerns.";

/// Which tool-backed capabilities are enabled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Features {
    #[serde(default = "enabled")]
    pub meal_planning: bool,
    #[serde(default = "enabled")]
    pub workout_planning: bool,
    #[serde(default = "enabled")]
    pub goal_setting: bool,
    #[serde(default = "enabled")]
    pub progress_tracking: bool,
}

fn enabled() -> bool {
    true
}

impl Default for Features {
    fn default() -> Self {
        Self {
            meal_planning: true,
            workout_planning: true,
            goal_setting: true,
            progress_tracking: true,
        }
    }
}

impl Features {
    pub fn allows(&self, route: Route) -> bool {
        match route {
            Route::Goal => self.goal_setting,
            Route::MealPlan => self.meal_planning,
            Route::Workout => self.workout_planning,
            Route::Progress | Route::CheckIn => self.progress_tracking,
            _ => true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub model: String,
    pub system_prompt: String,
    pub source_options: SourceOptions,
    pub assembler: AssemblerConfig,
    pub features: Features,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            source_options: SourceOptions::default(),
            assembler: AssemblerConfig::default(),
            features: Features::default(),
        }
    }
}

impl AgentConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_source_options(mut self, options: SourceOptions) -> Self {
        self.source_options = options;
        self
    }

    pub fn with_assembler(mut self, assembler: AssemblerConfig) -> Self {
        self.assembler = assembler;
        self
    }

    pub fn with_features(mut self, features: Features) -> Self {
        self.features = features;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_features_gate_routes() {
        let features = Features {
            meal_planning: false,
            ..Features::default()
        };
        assert!(!features.allows(Route::MealPlan));
        assert!(features.allows(Route::Workout));
        assert!(features.allows(Route::Chat));
    }

    #[test]
    fn test_features_deserialize_with_defaults() {
        let features: Features = serde_json::from_str(r#"{"goal_setting": false}"#).unwrap();
        assert!(!features.goal_setting);
        assert!(features.meal_planning);
    }
}
