//! Coaching prompt built from an intake profile.

use crate::models::UserProfile;

/// Role fixed for the assistant on every completion request.
pub const SYSTEM_INSTRUCTION: &str = "You are a precise fitness API that outputs only JSON.";

const OUTPUT_INSTRUCTIONS: &str = r#"Return ONLY a JSON object with this exact structure (no markdown, no extra text):
{
    "calories": 2200,
    "protein": 150,
    "carbs": 200,
    "fat": 70,
    "message": "A short, punchy 1-sentence motivational summary.",
    "goalSummary": "A very short 2-3 word summary of the strategy e.g. 'Aggressive Cut' or 'Lean Bulk'"
}
Calculate the values precisely based on the user's BMR and TDEE."#;

/// Builds the user turn for a profile. Field values are interpolated as-is.
pub fn compose(profile: &UserProfile) -> String {
    format!(
        "Act as an expert fitness coach. Generate a calculated fitness plan JSON for this user:\n\
         Name: {name}\n\
         Age: {age}, Gender: {gender}, Height: {height}cm, Weight: {weight}kg\n\
         Target Weight: {target}kg\n\
         Weekly Rate: {rate}\n\
         Habits: {habits}\n\
         Goals: {goals}\n\
         Activity Level: {activity}\n\
         Barriers: {barriers}\n\
         Commitment: {pledge} days/week\n\
         \n\
         {instructions}\n",
        name = profile.name,
        age = profile.age,
        gender = profile.gender,
        height = profile.height,
        weight = profile.weight,
        target = profile.target_weight,
        rate = profile.weekly_rate,
        habits = profile.habits.join(", "),
        goals = profile.selected_goals.join(", "),
        activity = profile.activity_level,
        barriers = profile.barriers.join(", "),
        pledge = profile.pledge_days,
        instructions = OUTPUT_INSTRUCTIONS,
    )
}
