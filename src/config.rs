use std::env;
use std::path::PathBuf;

use crate::api_connection::endpoints::DEFAULT_API_URL;

pub const API_URL_ENV_VAR: &str = "RECIPE_API_URL";
pub const STORE_PATH_ENV_VAR: &str = "RECIPE_STORE_PATH";
pub const DEFAULT_STORE_PATH: &str = ".recipe_companion/storage.json";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub api_url: String,
    pub store_path: PathBuf,
}

impl AppConfig {
    /// Reads configuration from the environment, after loading any `.env` file.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        Self {
            api_url: non_empty(API_URL_ENV_VAR).unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            store_path: non_empty(STORE_PATH_ENV_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_PATH)),
        }
    }
}
