use async_trait::async_trait;

use crate::api_connection::endpoints::{CookedRecord, RecipeBody, SavedRecipe};
use crate::api_connection::{ApiClient, ApiConnectionError};
use crate::recipe_parser::{self, Language};

#[async_trait]
pub trait RecipeLibraryApi: Send + Sync {
    async fn save(&self, body: &RecipeBody) -> Result<SavedRecipe, ApiConnectionError>;
}

#[async_trait]
impl RecipeLibraryApi for ApiClient {
    async fn save(&self, body: &RecipeBody) -> Result<SavedRecipe, ApiConnectionError> {
        self.save_recipe(body).await
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Saved(SavedRecipe),
    AlreadySaved,
}

pub fn find_by_title<'a>(saved: &'a [SavedRecipe], title: &str) -> Option<&'a SavedRecipe> {
    saved.iter().find(|recipe| recipe.title == title)
}

/// A recipe already in the cook history is offered as "continue" rather than restarted.
pub fn find_in_history<'a>(history: &'a [CookedRecord], title: &str) -> Option<&'a CookedRecord> {
    history.iter().find(|record| record.title == title)
}

/// Saves `content` under the title parsed for `language`, unless a recipe with that
/// title is already in `saved`.
pub async fn save_if_new<A: RecipeLibraryApi + ?Sized>(
    api: &A,
    saved: &mut Vec<SavedRecipe>,
    content: &str,
    language: Language,
) -> Result<SaveOutcome, ApiConnectionError> {
    let title = recipe_parser::parse(content, language).title;
    if find_by_title(saved, &title).is_some() {
        return Ok(SaveOutcome::AlreadySaved);
    }

    let body = RecipeBody {
        title,
        content: content.to_string(),
    };
    let recipe = api.save(&body).await?;
    tracing::info!(title = %recipe.title, "recipe saved");
    saved.push(recipe.clone());
    Ok(SaveOutcome::Saved(recipe))
}
