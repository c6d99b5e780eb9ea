//! Settings service
//!
//! Manages application settings persistence using JSON file storage.

use crate::config::{DEFAULT_API_TIMEOUT_SECS, DEFAULT_DUE_LIMIT, DEFAULT_LEARNING_LANGUAGE, SUPPORTED_LANGUAGES};
use crate::error::{AppError, Result};
use crate::events::{AppEvent, EventBus};
use crate::services::review::ReviewDirection;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;

/// Remote API connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Base URL of the learning API (if None, the environment or built-in default is used)
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_API_TIMEOUT_SECS
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Review session preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewSettings {
    /// Number of due cards fetched for one session
    #[serde(default = "default_due_limit")]
    pub due_limit: u32,
    #[serde(default)]
    pub direction: ReviewDirection,
}

fn default_due_limit() -> u32 {
    DEFAULT_DUE_LIMIT
}

impl Default for ReviewSettings {
    fn default() -> Self {
        Self {
            due_limit: default_due_limit(),
            direction: ReviewDirection::default(),
        }
    }
}

/// One keyboard shortcut binding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortcutBinding {
    pub action: String,
    pub keys: String,
    #[serde(default)]
    pub label: String,
}

fn default_shortcuts() -> Vec<ShortcutBinding> {
    vec![
        ShortcutBinding {
            action: "add_vocab".to_string(),
            keys: "Cmd+Shift+A".to_string(),
            label: "Add selection to vocabulary".to_string(),
        },
        ShortcutBinding {
            action: "open_ai_assistant".to_string(),
            keys: "Cmd+Shift+S".to_string(),
            label: "Ask the AI assistant".to_string(),
        },
    ]
}

fn default_learning_language() -> String {
    DEFAULT_LEARNING_LANGUAGE.to_string()
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_learning_language")]
    pub learning_language: String,
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub review: ReviewSettings,
    #[serde(default = "default_shortcuts")]
    pub shortcuts: Vec<ShortcutBinding>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            learning_language: default_learning_language(),
            api: ApiSettings::default(),
            review: ReviewSettings::default(),
            shortcuts: default_shortcuts(),
        }
    }
}

/// Service for managing application settings
#[derive(Clone)]
pub struct SettingsService {
    settings_path: PathBuf,
    events: EventBus,
}

impl SettingsService {
    pub fn new(app_data_dir: PathBuf, events: EventBus) -> Self {
        Self {
            settings_path: app_data_dir.join("settings.json"),
            events,
        }
    }

    /// Load settings from disk or create default if not exists
    pub async fn load(&self) -> Result<AppSettings> {
        if !self.settings_path.exists() {
            tracing::info!("Settings file not found, creating default settings");
            let default = AppSettings::default();
            self.save(&default).await?;
            return Ok(default);
        }

        let content = fs::read_to_string(&self.settings_path).await?;
        let settings: AppSettings = serde_json::from_str(&content)
            .map_err(|e| AppError::Generic(format!("Failed to parse settings: {}", e)))?;

        Ok(settings)
    }

    /// Save settings to disk
    pub async fn save(&self, settings: &AppSettings) -> Result<()> {
        let content = serde_json::to_string_pretty(settings)
            .map_err(|e| AppError::Generic(format!("Failed to serialize settings: {}", e)))?;

        fs::write(&self.settings_path, content).await?;
        tracing::info!("Settings saved to {:?}", self.settings_path);

        Ok(())
    }

    pub async fn get_learning_language(&self) -> Result<String> {
        let settings = self.load().await?;
        Ok(settings.learning_language)
    }

    /// Switch the learning language and announce it to subscribers
    pub async fn set_learning_language(&self, language: &str) -> Result<()> {
        let language = language.trim().to_lowercase();
        if !SUPPORTED_LANGUAGES.contains(&language.as_str()) {
            return Err(AppError::InvalidInput(format!(
                "Unsupported language '{}' (expected one of: {})",
                language,
                SUPPORTED_LANGUAGES.join(", ")
            )));
        }

        let mut settings = self.load().await?;
        if settings.learning_language == language {
            return Ok(());
        }

        settings.learning_language = language.clone();
        self.save(&settings).await?;

        tracing::info!("Learning language changed to {}", language);
        self.events.publish(AppEvent::LanguageChanged { language });
        Ok(())
    }

    pub async fn get_api(&self) -> Result<ApiSettings> {
        let settings = self.load().await?;
        Ok(settings.api)
    }

    pub async fn update_api(&self, api: ApiSettings) -> Result<()> {
        let mut settings = self.load().await?;
        settings.api = api;
        self.save(&settings).await?;
        Ok(())
    }

    pub async fn get_review(&self) -> Result<ReviewSettings> {
        let settings = self.load().await?;
        Ok(settings.review)
    }

    pub async fn update_review(&self, review: ReviewSettings) -> Result<()> {
        let mut settings = self.load().await?;
        settings.review = review;
        self.save(&settings).await?;
        Ok(())
    }

    pub async fn get_shortcuts(&self) -> Result<Vec<ShortcutBinding>> {
        let settings = self.load().await?;
        Ok(settings.shortcuts)
    }

    pub async fn update_shortcuts(&self, shortcuts: Vec<ShortcutBinding>) -> Result<()> {
        let mut settings = self.load().await?;
        settings.shortcuts = shortcuts;
        self.save(&settings).await?;
        Ok(())
    }
}
