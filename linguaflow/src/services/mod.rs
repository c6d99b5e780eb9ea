//! Services module
//!
//! Client-side policies that sit between front-ends and the API/storage
//! layers: caching, notifications, review sessions and the workspace.

pub mod credentials;
pub mod notifications;
pub mod request_cache;
pub mod review;
pub mod settings;
pub mod vocab;
pub mod workspace;

pub use credentials::TokenStore;
pub use notifications::NotificationService;
pub use request_cache::{cache_key, RequestCache};
pub use review::{ReviewDirection, ReviewService, ReviewSession, ReviewState};
pub use settings::{AppSettings, SettingsService};
pub use vocab::VocabService;
pub use workspace::{CloudSaveOutcome, WorkspaceDraft, WorkspaceService};
