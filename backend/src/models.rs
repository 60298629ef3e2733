use serde::{Deserialize, Serialize};

// API Request/Response models

/// Intake payload describing a user's body metrics, goals and preferences.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub user_id: String,
    pub name: String,
    pub selected_goals: Vec<String>,
    pub gender: String,
    pub age: i32,
    pub height: i32,
    pub weight: i32,
    pub target_weight: i32,
    pub weekly_rate: String,
    pub habits: Vec<String>,
    pub activity_level: String,
    pub barriers: Vec<String>,
    pub pledge_days: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedPlan {
    pub calories: i32,
    pub protein: i32,
    pub carbs: i32,
    pub fat: i32,
    pub message: String,
    pub goal_summary: String,
}

impl GeneratedPlan {
    /// The fixed plan served when no completion credential is configured.
    pub fn mock() -> Self {
        Self {
            calories: 2250,
            protein: 180,
            carbs: 200,
            fat: 65,
            message: "This is a mocked plan because API key is missing.".to_string(),
            goal_summary: "Lose Weight & Build Muscle".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
}

// Chat completion wire models

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}
