use serde::{Deserialize, Serialize};

use crate::chat::ChatTurn;
use crate::recipe_parser::Language;

pub const DEFAULT_API_URL: &str = "http://localhost:5000";

pub const LOGIN_PATH: &str = "/api/auth/login";
pub const SIGNUP_PATH: &str = "/api/auth/signup";
pub const GOOGLE_LOGIN_PATH: &str = "/api/auth/google-login";
pub const DETECT_PATH: &str = "/api/detect";
pub const GENERATE_PATH: &str = "/api/recipe/generate";
pub const SAVE_RECIPE_PATH: &str = "/api/recipe/save";
pub const USER_RECIPES_PATH: &str = "/api/recipe/user";
pub const RECIPE_PATH: &str = "/api/recipe";
pub const COOKED_PATH: &str = "/api/recipe/cooked";
pub const CHAT_PATH: &str = "/api/chat";

#[derive(Debug, Serialize, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Clone)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GoogleLoginRequest {
    pub id_token: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthResponse {
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Detection {
    pub label: String,
    #[serde(default)]
    pub confidence: f32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DetectResponse {
    #[serde(default)]
    pub detected: Vec<Detection>,
}

#[derive(Debug, Serialize, Clone)]
pub struct GenerateRecipeRequest {
    pub ingredients: Vec<String>,
    pub preferences: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerateRecipeResponse {
    pub recipe: String,
}

/// Body for both saving a new recipe and editing an existing one.
#[derive(Debug, Serialize, Clone)]
pub struct RecipeBody {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SavedRecipe {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SaveRecipeResponse {
    pub recipe: SavedRecipe,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UserRecipesResponse {
    #[serde(default)]
    pub recipes: Vec<SavedRecipe>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct CookedRequest {
    pub title: String,
    pub content: String,
    pub language: Language,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CookedRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub language: Option<Language>,
    #[serde(default)]
    pub current_step: Option<usize>,
    #[serde(default)]
    pub completed: bool,
}

/// The history endpoint has answered both with a bare record and with a wrapped one.
#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub enum CookedResponse {
    Wrapped {
        #[serde(alias = "recipe", alias = "history")]
        cooked: CookedRecord,
    },
    Bare(CookedRecord),
}

impl CookedResponse {
    pub fn into_record(self) -> CookedRecord {
        match self {
            CookedResponse::Wrapped { cooked } => cooked,
            CookedResponse::Bare(record) => record,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CookHistoryResponse {
    #[serde(default)]
    pub history: Vec<CookedRecord>,
}

#[derive(Debug, Serialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCookedRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_step: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    pub recipe: String,
    /// 1-based, as shown to the user.
    pub current_step: usize,
    pub total_steps: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_instruction: Option<String>,
    pub chat_history: Vec<ChatTurn>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatResponse {
    pub response: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cooked_response_accepts_bare_and_wrapped_records() {
        let bare: CookedResponse =
            serde_json::from_str(r#"{"_id":"abc","title":"Soup","currentStep":2}"#).unwrap();
        let record = bare.into_record();
        assert_eq!(record.id, "abc");
        assert_eq!(record.current_step, Some(2));
        assert!(!record.completed);

        let raw = r#"{"recipe":{"_id":"xyz","title":"Tea","language":"hi"}}"#;
        let wrapped: CookedResponse = serde_json::from_str(raw).unwrap();
        let record = wrapped.into_record();
        assert_eq!(record.id, "xyz");
        assert_eq!(record.language, Some(Language::Secondary));
    }

    #[test]
    fn update_cooked_omits_unset_fields() {
        let body = UpdateCookedRequest {
            current_step: Some(3),
            completed: None,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({ "currentStep": 3 })
        );
    }
}
