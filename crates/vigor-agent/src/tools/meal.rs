use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeSet;

use super::{parse_args, Tool};
use crate::error::AgentError;
use crate::guardrails::validate_diet_preferences;
use crate::session::SessionContext;
use crate::types::{DietPreference, GoalType, Macros, Meal, MealPlan};

#[derive(Deserialize)]
struct Args {
    #[serde(default)]
    diet_preferences: Option<Vec<String>>,
}

/// Balanced daily plan sized to the session goal
pub struct MealPlanner;

fn daily_calories(goal_type: GoalType) -> u32 {
    match goal_type {
        GoalType::WeightLoss => 1800,
        GoalType::MuscleGain => 2600,
        _ => 2200,
    }
}

fn proteins(prefs: &[DietPreference]) -> [&'static str; 2] {
    let has = |p: DietPreference| prefs.contains(&p);
    if has(DietPreference::Vegan) {
        ["Tofu", "Lentils"]
    } else if has(DietPreference::Vegetarian) {
        ["Greek yogurt", "Chickpeas"]
    } else if has(DietPreference::Pescatarian) {
        ["Salmon", "Greek yogurt"]
    } else if has(DietPreference::Paleo) {
        ["Lean beef", "Eggs"]
    } else {
        ["Chicken breast", "Eggs"]
    }
}

fn carb(prefs: &[DietPreference]) -> &'static str {
    if prefs.contains(&DietPreference::Keto) {
        "Cauliflower rice"
    } else if prefs.contains(&DietPreference::Paleo) {
        "Sweet potatoes"
    } else {
        "Brown rice"
    }
}

/// Grams of protein, carbs and fat for the calorie target
fn macros(calories: u32, keto: bool) -> Macros {
    let (protein, carbs, fat) = if keto { (0.25, 0.05, 0.70) } else { (0.30, 0.40, 0.30) };
    let kcal = f64::from(calories);
    let round = |g: f64| (g * 10.0).round() / 10.0;
    Macros {
        protein_g: round(kcal * protein / 4.0),
        carbs_g: round(kcal * carbs / 4.0),
        fat_g: round(kcal * fat / 9.0),
    }
}

impl MealPlanner {
    pub fn plan(goal_type: GoalType, prefs: &[DietPreference]) -> MealPlan {
        let total = daily_calories(goal_type);
        let [main_protein, side_protein] = proteins(prefs);
        let carb = carb(prefs);
        let keto = prefs.contains(&DietPreference::Keto);
        let breakfast_base = if keto { "Avocado" } else { "Oats" };
        let share = |pct: u32| total * pct / 100;

        let meals = vec![
            Meal {
                name: "Breakfast".to_string(),
                items: vec![breakfast_base.to_string(), side_protein.to_string(), "Berries".to_string()],
                calories: share(25),
            },
            Meal {
                name: "Lunch".to_string(),
                items: vec![main_protein.to_string(), carb.to_string(), "Leafy greens".to_string()],
                calories: share(35),
            },
            Meal {
                name: "Dinner".to_string(),
                items: vec![main_protein.to_string(), "Roasted vegetables".to_string(), "Olive oil".to_string()],
                calories: share(30),
            },
            Meal {
                name: "Snack".to_string(),
                items: vec!["Almonds".to_string()],
                calories: share(10),
            },
        ];

        let shopping_list: BTreeSet<String> = meals.iter().flat_map(|m| m.items.iter().cloned()).collect();

        MealPlan {
            total_calories: meals.iter().map(|m| m.calories).sum(),
            macros: macros(total, keto),
            shopping_list: shopping_list.into_iter().collect(),
            meals,
        }
    }
}

#[async_trait]
impl Tool for MealPlanner {
    fn name(&self) -> &'static str {
        "meal_planner"
    }

    fn description(&self) -> &'static str {
        "Suggests a daily meal plan honoring dietary preferences"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "diet_preferences": {
                    "type": "array",
                    "items": {
                        "type": "string",
                        "enum": DietPreference::ALL.iter().map(|p| p.as_str()).collect::<Vec<_>>()
                    },
                    "description": "User's dietary preferences"
                }
            }
        })
    }

    async fn run(&self, args: Value, ctx: &mut SessionContext) -> Result<Value> {
        let args: Args = parse_args(self.name(), args)?;
        let goal = ctx.goal.as_ref().ok_or(AgentError::MissingGoal)?;
        let goal_type = goal.goal_type;

        if let Some(prefs) = args.diet_preferences {
            let prefs = validate_diet_preferences(prefs.as_slice()).map_err(AgentError::from)?;
            ctx.update_diet_preferences(prefs);
        }

        let plan = Self::plan(goal_type, &ctx.diet_preferences);
        let value = serde_json::to_value(&plan)?;
        ctx.update_meal_plan(plan);
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Goal, Unit};

    fn session_with_goal(goal_type: GoalType) -> SessionContext {
        let mut ctx = SessionContext::new("Ana", 1);
        ctx.update_goal(Goal {
            goal_type,
            target_value: 5.0,
            unit: Unit::Kg,
            duration_weeks: 8,
        });
        ctx
    }

    #[test]
    fn test_calories_follow_goal() {
        assert_eq!(MealPlanner::plan(GoalType::WeightLoss, &[]).total_calories, 1800);
        assert_eq!(MealPlanner::plan(GoalType::MuscleGain, &[]).total_calories, 2600);
        assert_eq!(MealPlanner::plan(GoalType::Endurance, &[]).total_calories, 2200);
    }

    #[test]
    fn test_vegan_plan_has_no_animal_protein() {
        let plan = MealPlanner::plan(GoalType::WeightLoss, &[DietPreference::Vegan]);
        assert!(plan.shopping_list.contains(&"Tofu".to_string()));
        assert!(!plan.shopping_list.iter().any(|i| i.contains("Chicken") || i.contains("Eggs")));
    }

    #[test]
    fn test_keto_macros_are_fat_heavy() {
        let plan = MealPlanner::plan(GoalType::WeightLoss, &[DietPreference::Keto]);
        assert!(plan.macros.fat_g > plan.macros.carbs_g);
        assert!(plan.shopping_list.contains(&"Cauliflower rice".to_string()));
    }

    #[tokio::test]
    async fn test_requires_goal() {
        let mut ctx = SessionContext::new("Ana", 1);
        let err = MealPlanner.run(json!({}), &mut ctx).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<AgentError>(), Some(AgentError::MissingGoal)));
    }

    #[tokio::test]
    async fn test_run_stores_preferences_and_plan() {
        let mut ctx = session_with_goal(GoalType::MuscleGain);
        let value = MealPlanner
            .run(json!({"diet_preferences": ["Pescatarian"]}), &mut ctx)
            .await
            .unwrap();
        assert_eq!(value["total_calories"], 2600);
        assert_eq!(ctx.diet_preferences, vec![DietPreference::Pescatarian]);
        assert!(ctx.meal_plan.is_some());
    }

    #[tokio::test]
    async fn test_rejects_unknown_preference() {
        let mut ctx = session_with_goal(GoalType::WeightLoss);
        let err = MealPlanner
            .run(json!({"diet_preferences": ["carnivore"]}), &mut ctx)
            .await
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<AgentError>(), Some(AgentError::Guardrail(_))));
    }
}
