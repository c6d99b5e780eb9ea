use super::client::ApiClient;
use super::models::User;

#[derive(Clone)]
pub struct AuthApi {
    client: ApiClient,
}

impl AuthApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// `GET /auth/me`; `None` without a stored token or when the call fails
    pub async fn current_user(&self) -> Option<User> {
        if !self.client.tokens().has_token().await {
            return None;
        }

        match self.client.get::<User>("/auth/me", &[]).await {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!("Failed to get current user: {}", e);
                None
            }
        }
    }
}
