//! Storage module
//!
//! Device-local storage for transcript drafts.

pub mod draft_store;

pub use draft_store::DraftStore;
