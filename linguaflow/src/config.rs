//! Application configuration constants
//!
//! Central location for retention windows, cache lifetimes, API defaults
//! and storage keys used throughout the client.

use std::time::Duration;

// ===== Local Drafts =====

/// Retention for a transcript draft that has not been saved to the cloud (7 days)
pub const DRAFT_TTL_HOURS: i64 = 7 * 24;

/// Retention for the local backup of a transcript already saved to the cloud (1 day)
pub const SAVED_DRAFT_TTL_HOURS: i64 = 24;

/// Interval between autosave ticks while a workspace is open
pub const AUTOSAVE_INTERVAL: Duration = Duration::from_secs(5);

/// Title given to a workspace draft that was never named
pub const DEFAULT_DRAFT_TITLE: &str = "Dictation practice";

// ===== Request Cache =====

/// Default lifetime of a cached API response
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Lifetime of cached vocabulary stats and due lists.
/// Short, since reviewing cards changes both.
pub const VOCAB_CACHE_TTL: Duration = Duration::from_secs(60);

// ===== API =====

/// Base URL used when neither settings nor the environment provide one
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";

/// Environment variable overriding the API base URL
pub const API_URL_ENV: &str = "LINGUAFLOW_API_URL";

/// Request timeout in seconds (3 minutes; transcription endpoints are slow)
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 3 * 60;

/// Number of due cards requested for a review session
pub const DEFAULT_DUE_LIMIT: u32 = 20;

// ===== Storage Keys =====

/// Settings-table key holding the bearer token
pub const AUTH_TOKEN_KEY: &str = "auth_token";

/// Learning language used until the user picks one
pub const DEFAULT_LEARNING_LANGUAGE: &str = "fr";

/// Languages the learning API accepts
pub const SUPPORTED_LANGUAGES: &[&str] = &["en", "fr"];
