//! Specialist hand-offs for requests the general assistant should not handle.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::AgentError;
use crate::guardrails::validate_injury_description;
use crate::router::Route;
use crate::session::SessionContext;

#[async_trait]
pub trait Specialist: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    async fn handle(&self, ctx: &mut SessionContext, query: &str) -> Result<Value>;

    /// Called before `handle` when control moves to this specialist
    fn on_handoff(&self, ctx: &mut SessionContext) {
        ctx.log_handoff(format!("Control handed to {} agent", self.name()));
    }
}

/// Specialist serving a hand-off route
pub fn for_route(route: Route) -> Option<Box<dyn Specialist>> {
    match route {
        Route::NutritionExpert => Some(Box::new(NutritionExpert)),
        Route::InjurySupport => Some(Box::new(InjurySupport)),
        Route::Escalation => Some(Box::new(Escalation)),
        _ => None,
    }
}

pub struct NutritionExpert;

#[async_trait]
impl Specialist for NutritionExpert {
    fn name(&self) -> &'static str {
        "nutrition_expert"
    }

    fn description(&self) -> &'static str {
        "Handles complex dietary needs and restrictions"
    }

    async fn handle(&self, _ctx: &mut SessionContext, query: &str) -> Result<Value> {
        let lowered = query.to_lowercase();
        let (advice, avoid) = if lowered.contains("diabetic") {
            (
                "For a diabetic-friendly plan, keep blood sugar steady with low-glycemic meals.",
                json!(["Refined sugars", "White bread", "Sugary drinks"]),
            )
        } else {
            (
                "With a food allergy, read every label and plan meals around safe staples.",
                json!(["Foods containing your allergen", "Products with unclear labels"]),
            )
        };

        Ok(json!({
            "advice": advice,
            "meal_modifications": [
                "Replace high-glycemic carbs with low-glycemic alternatives",
                "Include more fiber-rich foods",
                "Monitor portion sizes carefully"
            ],
            "recommended_foods": ["Quinoa", "Sweet potatoes", "Leafy greens", "Lean proteins"],
            "foods_to_avoid": avoid
        }))
    }
}

pub struct InjurySupport;

#[async_trait]
impl Specialist for InjurySupport {
    fn name(&self) -> &'static str {
        "injury_support"
    }

    fn description(&self) -> &'static str {
        "Handles injury-related concerns and workout modifications"
    }

    async fn handle(&self, ctx: &mut SessionContext, query: &str) -> Result<Value> {
        validate_injury_description(query).map_err(AgentError::from)?;
        ctx.add_injury_note(query.trim());

        Ok(json!({
            "modified_exercises": [
                {"original": "Squats", "modification": "Wall sits", "reason": "Reduces knee impact while maintaining strength"},
                {"original": "Running", "modification": "Swimming", "reason": "Low-impact cardio alternative"}
            ],
            "recovery_tips": [
                "Apply ice for 15-20 minutes every 2-3 hours",
                "Gentle stretching exercises",
                "Consider physical therapy consultation"
            ],
            "warning_signs": ["Increased pain during exercise", "Swelling", "Limited range of motion"]
        }))
    }
}

pub struct Escalation;

#[async_trait]
impl Specialist for Escalation {
    fn name(&self) -> &'static str {
        "escalation"
    }

    fn description(&self) -> &'static str {
        "Escalates to a human coach"
    }

    async fn handle(&self, _ctx: &mut SessionContext, _query: &str) -> Result<Value> {
        Ok(json!({
            "status": "escalated",
            "message": "I'm connecting you with a human coach.",
            "next_steps": [
                "A coach will review your profile and progress",
                "You'll receive an email within 24 hours to schedule a consultation",
                "The consultation will be 30 minutes via video call"
            ],
            "coach_specialties": ["Weight loss", "Strength training", "Nutrition planning"]
        }))
    }

    fn on_handoff(&self, ctx: &mut SessionContext) {
        ctx.log_handoff(format!("Control handed to {} agent for human coach escalation", self.name()));
    }
}
