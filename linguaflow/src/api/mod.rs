//! Learning API module
//!
//! Typed wrappers over the remote REST API. All of them share one
//! [`ApiClient`] that owns the HTTP connection pool and envelope handling.

pub mod auth;
pub mod client;
pub mod models;
pub mod transcripts;
pub mod vocab;

pub use auth::AuthApi;
pub use client::ApiClient;
pub use models::*;
pub use transcripts::TranscriptsApi;
pub use vocab::VocabApi;
