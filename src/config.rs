use std::env;

use dotenvy::dotenv;

use crate::domain::errors::StorefrontError;

/// Connection settings for the hosted backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL of the backend project, without a trailing slash.
    pub base_url: String,
    /// The project's public API key, sent with every request.
    pub api_key: String,
}

impl BackendConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// Reads `BACKEND_URL` and `BACKEND_API_KEY` from the environment,
    /// loading a `.env` file first if one exists.
    pub fn from_env() -> Result<Self, StorefrontError> {
        dotenv().ok();
        let base_url = env::var("BACKEND_URL")
            .map_err(|_| StorefrontError::Config("BACKEND_URL must be set".to_string()))?;
        let api_key = env::var("BACKEND_API_KEY")
            .map_err(|_| StorefrontError::Config("BACKEND_API_KEY must be set".to_string()))?;
        Ok(Self::new(base_url, api_key))
    }
}
