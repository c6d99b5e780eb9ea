//! Linguaflow library
//!
//! Headless client core of the Linguaflow language-learning app: vocabulary
//! review sessions, local transcript drafts and access to the learning API.
//! Front-ends (the bundled CLI, a desktop shell) drive it through
//! [`app::AppState`].

pub mod api;
pub mod app;
pub mod clock;
pub mod config;
pub mod database;
pub mod error;
pub mod events;
pub mod services;
pub mod storage;
