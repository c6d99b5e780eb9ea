//! Application state and initialization
//!
//! This module manages the central application state and lifecycle.
//! All services are initialized here and made available through AppState.

use crate::api::{ApiClient, AuthApi, TranscriptsApi, VocabApi};
use crate::config::{API_URL_ENV, DEFAULT_API_BASE_URL};
use crate::database::{create_pool, Repository};
use crate::error::{AppError, Result};
use crate::events::EventBus;
use crate::services::{
    AppSettings, NotificationService, ReviewService, SettingsService, TokenStore, VocabService,
    WorkspaceService,
};
use crate::storage::DraftStore;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub app_data_dir: PathBuf,
    pub events: EventBus,
    pub notifications: NotificationService,
    pub settings: SettingsService,
    pub tokens: TokenStore,
    pub auth: AuthApi,
    pub vocab: VocabService,
    pub review: ReviewService,
    pub workspace: WorkspaceService,
}

/// Platform data directory for the app (`~/.local/share/linguaflow` and friends)
pub fn default_data_dir() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|dir| dir.join("linguaflow"))
        .ok_or_else(|| AppError::Generic("Failed to get app data dir".to_string()))
}

/// API base URL: environment, then settings, then the built-in default
fn resolve_base_url(settings: &AppSettings) -> String {
    std::env::var(API_URL_ENV)
        .ok()
        .filter(|url| !url.trim().is_empty())
        .or_else(|| settings.api.base_url.clone().filter(|url| !url.trim().is_empty()))
        .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
}

/// Application setup - called once on startup
pub async fn setup(app_data_dir: &Path) -> Result<AppState> {
    tracing::info!("Initializing application");
    tracing::info!("App data directory: {:?}", app_data_dir);

    std::fs::create_dir_all(app_data_dir)?;

    let pool = create_pool(&app_data_dir.join("linguaflow.db")).await?;
    let repo = Repository::new(pool);

    let events = EventBus::new();
    let notifications = NotificationService::new(events.clone());

    let settings = SettingsService::new(app_data_dir.to_path_buf(), events.clone());
    let app_settings = settings.load().await?;

    let base_url = resolve_base_url(&app_settings);
    tracing::info!("Using API at {}", base_url);

    let tokens = TokenStore::new(repo.clone());
    let client = ApiClient::with_timeout(
        &base_url,
        tokens.clone(),
        Duration::from_secs(app_settings.api.timeout_secs),
    )?;

    let drafts = DraftStore::with_system_clock(repo);
    let removed = drafts.cleanup_expired().await;
    if removed > 0 {
        tracing::info!("Removed {} expired drafts", removed);
    }

    let vocab = VocabService::new(
        VocabApi::new(client.clone()),
        tokens.clone(),
        notifications.clone(),
        events.clone(),
    );
    let review = ReviewService::new(vocab.clone(), events.clone());
    let workspace = WorkspaceService::new(
        drafts,
        TranscriptsApi::new(client.clone()),
        notifications.clone(),
        events.clone(),
    );

    tracing::info!("Application initialized successfully");

    Ok(AppState {
        app_data_dir: app_data_dir.to_path_buf(),
        events,
        notifications,
        settings,
        tokens,
        auth: AuthApi::new(client),
        vocab,
        review,
        workspace,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::settings::ApiSettings;

    #[test]
    fn test_base_url_from_settings() {
        let mut settings = AppSettings::default();
        settings.api = ApiSettings {
            base_url: Some("https://learn.example.test".to_string()),
            ..ApiSettings::default()
        };

        if std::env::var(API_URL_ENV).is_err() {
            assert_eq!(resolve_base_url(&settings), "https://learn.example.test");
            assert_eq!(resolve_base_url(&AppSettings::default()), DEFAULT_API_BASE_URL);
        }
    }
}
