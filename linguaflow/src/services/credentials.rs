/// Credential Store
/// Persists the API bearer token in the local settings table
use crate::config::AUTH_TOKEN_KEY;
use crate::database::Repository;
use crate::error::{AppError, Result};

#[derive(Clone)]
pub struct TokenStore {
    repo: Repository,
}

impl TokenStore {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Store the bearer token used for every API request
    pub async fn set(&self, token: &str) -> Result<()> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AppError::InvalidInput("Token must not be empty".to_string()));
        }

        self.repo.set_setting(AUTH_TOKEN_KEY, token).await?;
        tracing::info!("Auth token stored");
        Ok(())
    }

    pub async fn get(&self) -> Result<Option<String>> {
        self.repo.get_setting(AUTH_TOKEN_KEY).await
    }

    /// Forget the token (logout). The API has no server-side logout.
    pub async fn clear(&self) -> Result<()> {
        self.repo.delete_setting(AUTH_TOKEN_KEY).await?;
        tracing::info!("Auth token cleared");
        Ok(())
    }

    pub async fn has_token(&self) -> bool {
        matches!(self.get().await, Ok(Some(_)))
    }
}
