//! API client configuration.
//!
//! All three clients talk to the same managed backend with one bearer
//! token. Configuration is loaded from the environment; `with_*` methods
//! override individual fields after construction.

use amora_core::error::{AmoraError, Result};

const DEFAULT_LANGUAGE_HINT: &str = "en";

/// Connection settings shared by the API clients.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the managed backend, without a trailing slash.
    pub base_url: String,
    /// Bearer token for the authenticated endpoints.
    pub auth_token: String,
    /// The signed-in user's identifier.
    pub user_id: String,
    /// Language hint passed to the transcription endpoint.
    pub language_hint: String,
}

impl ApiConfig {
    /// Creates a config with the default language hint.
    pub fn new(
        base_url: impl Into<String>,
        auth_token: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token: auth_token.into(),
            user_id: user_id.into(),
            language_hint: DEFAULT_LANGUAGE_HINT.to_string(),
        }
    }

    /// Loads configuration from the environment.
    ///
    /// Reads `AMORA_API_BASE_URL`, `AMORA_API_TOKEN`, `AMORA_USER_ID`, and
    /// optionally `AMORA_LANGUAGE` (defaults to `en`).
    ///
    /// # Errors
    ///
    /// Returns a `Config` error naming the first missing variable.
    pub fn try_from_env() -> Result<Self> {
        let base_url = require_env("AMORA_API_BASE_URL")?;
        let auth_token = require_env("AMORA_API_TOKEN")?;
        let user_id = require_env("AMORA_USER_ID")?;

        let mut config = Self::new(base_url, auth_token, user_id);
        if let Ok(language) = std::env::var("AMORA_LANGUAGE") {
            if !language.trim().is_empty() {
                config.language_hint = language;
            }
        }
        Ok(config)
    }

    /// Overrides the language hint after construction.
    pub fn with_language_hint(mut self, language: impl Into<String>) -> Self {
        self.language_hint = language.into();
        self
    }

    /// Builds a full endpoint URL from a path like `/threads/t1`.
    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn require_env(name: &str) -> Result<String> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AmoraError::config(format!("{name} is not set")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_stripped() {
        let config = ApiConfig::new("https://api.amora.app/", "tok", "u1");
        assert_eq!(config.endpoint("/threads/t1"), "https://api.amora.app/threads/t1");
    }

    #[test]
    fn test_default_language_hint() {
        let config = ApiConfig::new("https://api.amora.app", "tok", "u1");
        assert_eq!(config.language_hint, "en");
        assert_eq!(config.with_language_hint("fr").language_hint, "fr");
    }
}
