use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use thiserror::Error;

use super::endpoints::{
    AuthResponse, ChatRequest, ChatResponse, CookHistoryResponse, CookedRecord, CookedRequest,
    CookedResponse, Credentials, DetectResponse, Detection, GenerateRecipeRequest,
    GenerateRecipeResponse, GoogleLoginRequest, RecipeBody, SaveRecipeResponse, SavedRecipe,
    SignupRequest, UpdateCookedRequest, UserRecipesResponse, CHAT_PATH, COOKED_PATH,
    DETECT_PATH, GENERATE_PATH, GOOGLE_LOGIN_PATH, LOGIN_PATH, RECIPE_PATH, SAVE_RECIPE_PATH,
    SIGNUP_PATH, USER_RECIPES_PATH,
};

#[derive(Debug, Error)]
pub enum ApiConnectionError {
    #[error("not logged in: this request needs a bearer token")]
    MissingToken,
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("API error {status}: {error_body}")]
    ApiError {
        status: reqwest::StatusCode,
        error_body: String,
    },
}

impl ApiConnectionError {
    /// 401/403 responses, shown to the user as "please log in" rather than a generic failure.
    pub fn is_auth_failure(&self) -> bool {
        match self {
            ApiConnectionError::MissingToken => true,
            ApiConnectionError::ApiError { status, .. } => {
                *status == reqwest::StatusCode::UNAUTHORIZED
                    || *status == reqwest::StatusCode::FORBIDDEN
            }
            _ => false,
        }
    }
}

/// Thin client over the recipe backend's REST API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    token: Option<String>,
    client: Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
            client: Client::new(),
        }
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder, ApiConnectionError> {
        let token = self.token.as_deref().ok_or(ApiConnectionError::MissingToken)?;
        Ok(request.bearer_auth(token))
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiConnectionError> {
        let response = Self::check_status(response).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::debug!(error = %e, body = %body, "failed to deserialize API response");
            ApiConnectionError::SerializationError(e)
        })
    }

    async fn check_status(response: Response) -> Result<Response, ApiConnectionError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            Err(ApiConnectionError::ApiError { status, error_body })
        }
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<String, ApiConnectionError> {
        let response = self.client.post(self.url(LOGIN_PATH)).json(credentials).send().await?;
        Ok(Self::read_json::<AuthResponse>(response).await?.token)
    }

    pub async fn signup(&self, request: &SignupRequest) -> Result<(), ApiConnectionError> {
        let response = self.client.post(self.url(SIGNUP_PATH)).json(request).send().await?;
        Self::check_status(response).await?;
        Ok(())
    }

    /// Exchanges an identity-provider id token for a backend token.
    pub async fn google_login(&self, id_token: &str) -> Result<String, ApiConnectionError> {
        let body = GoogleLoginRequest {
            id_token: id_token.to_string(),
        };
        let response = self.client.post(self.url(GOOGLE_LOGIN_PATH)).json(&body).send().await?;
        Ok(Self::read_json::<AuthResponse>(response).await?.token)
    }

    pub async fn detect(
        &self,
        image: Vec<u8>,
        file_name: &str,
    ) -> Result<Vec<Detection>, ApiConnectionError> {
        let part = Part::bytes(image).file_name(file_name.to_string());
        let form = Form::new().part("image", part);
        let response = self.client.post(self.url(DETECT_PATH)).multipart(form).send().await?;
        Ok(Self::read_json::<DetectResponse>(response).await?.detected)
    }

    pub async fn generate_recipe(
        &self,
        request: &GenerateRecipeRequest,
    ) -> Result<String, ApiConnectionError> {
        tracing::debug!(ingredients = ?request.ingredients, "requesting recipe generation");
        let response = self.client.post(self.url(GENERATE_PATH)).json(request).send().await?;
        Ok(Self::read_json::<GenerateRecipeResponse>(response).await?.recipe)
    }

    pub async fn save_recipe(&self, body: &RecipeBody) -> Result<SavedRecipe, ApiConnectionError> {
        let request = self.authorized(self.client.post(self.url(SAVE_RECIPE_PATH)))?;
        let response = request.json(body).send().await?;
        Ok(Self::read_json::<SaveRecipeResponse>(response).await?.recipe)
    }

    pub async fn user_recipes(&self) -> Result<Vec<SavedRecipe>, ApiConnectionError> {
        let request = self.authorized(self.client.get(self.url(USER_RECIPES_PATH)))?;
        let response = request.send().await?;
        Ok(Self::read_json::<UserRecipesResponse>(response).await?.recipes)
    }

    pub async fn update_recipe(
        &self,
        id: &str,
        body: &RecipeBody,
    ) -> Result<(), ApiConnectionError> {
        let url = self.url(&format!("{}/{}", RECIPE_PATH, id));
        let response = self.authorized(self.client.patch(url))?.json(body).send().await?;
        Self::check_status(response).await?;
        Ok(())
    }

    pub async fn delete_recipe(&self, id: &str) -> Result<(), ApiConnectionError> {
        let url = self.url(&format!("{}/{}", RECIPE_PATH, id));
        let response = self.authorized(self.client.delete(url))?.send().await?;
        Self::check_status(response).await?;
        Ok(())
    }

    pub async fn record_cooked(
        &self,
        body: &CookedRequest,
    ) -> Result<CookedRecord, ApiConnectionError> {
        let request = self.authorized(self.client.post(self.url(COOKED_PATH)))?;
        let response = request.json(body).send().await?;
        Ok(Self::read_json::<CookedResponse>(response).await?.into_record())
    }

    pub async fn cook_history(&self) -> Result<Vec<CookedRecord>, ApiConnectionError> {
        let request = self.authorized(self.client.get(self.url(COOKED_PATH)))?;
        let response = request.send().await?;
        Ok(Self::read_json::<CookHistoryResponse>(response).await?.history)
    }

    pub async fn update_cooked(
        &self,
        id: &str,
        body: &UpdateCookedRequest,
    ) -> Result<(), ApiConnectionError> {
        let url = self.url(&format!("{}/{}", COOKED_PATH, id));
        let response = self.authorized(self.client.patch(url))?.json(body).send().await?;
        Self::check_status(response).await?;
        Ok(())
    }

    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ApiConnectionError> {
        let response = self.client.post(self.url(CHAT_PATH)).json(request).send().await?;
        Self::read_json(response).await
    }
}
