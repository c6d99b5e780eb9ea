//! Local transcript draft store
//!
//! Durable but disposable: drafts live for 7 days after their last write,
//! and a draft already saved to the cloud is kept for only 1 day as a
//! short-lived backup. Expired records are swept lazily on reads.
//!
//! Everything except `save` is best effort. Read and delete failures are
//! logged and reported as "nothing there" so draft trouble never blocks
//! the primary workflow.

use crate::clock::{Clock, SystemClock};
use crate::database::models::from_millis;
use crate::database::{DraftStatus, DraftUpsert, Repository, TranscriptDraft};
use crate::error::{AppError, Result};
use std::sync::Arc;

#[derive(Clone)]
pub struct DraftStore {
    repo: Repository,
    clock: Arc<dyn Clock>,
}

impl DraftStore {
    pub fn new(repo: Repository, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    pub fn with_system_clock(repo: Repository) -> Self {
        Self::new(repo, Arc::new(SystemClock))
    }

    /// Merge `input` over the stored record and refresh its retention.
    ///
    /// `expires_at` is always `updated_at + ttl(status)`. Moving a draft to
    /// `saved` swaps the 7 day TTL for the 1 day one.
    pub async fn save(&self, input: DraftUpsert) -> Result<TranscriptDraft> {
        if input.id.trim().is_empty() {
            return Err(AppError::InvalidInput("Draft id must not be empty".to_string()));
        }

        // Stored timestamps have millisecond precision
        let now = from_millis(self.clock.now().timestamp_millis())?;
        let existing = self
            .repo
            .get_draft(&input.id)
            .await?
            .filter(|d| !d.is_expired(now));

        let language = match (input.language, &existing) {
            (Some(lang), _) if !lang.trim().is_empty() => lang,
            (_, Some(prev)) => prev.language.clone(),
            _ => {
                return Err(AppError::InvalidInput(format!(
                    "Draft {} needs a language",
                    input.id
                )))
            }
        };

        let status = input
            .status
            .or(existing.as_ref().map(|d| d.status))
            .unwrap_or_default();

        let expires_at = now + status.ttl();

        let draft = match existing {
            Some(prev) => TranscriptDraft {
                id: input.id,
                language,
                title: input.title.unwrap_or(prev.title),
                source_url: input.source_url.unwrap_or(prev.source_url),
                transcript: input.transcript.unwrap_or(prev.transcript),
                notes: input.notes.unwrap_or(prev.notes),
                comments: input.comments.unwrap_or(prev.comments),
                tags: input.tags.unwrap_or(prev.tags),
                created_at: prev.created_at,
                updated_at: now,
                status,
                expires_at,
            },
            None => TranscriptDraft {
                id: input.id,
                language,
                title: input.title.unwrap_or_default(),
                source_url: input.source_url.flatten(),
                transcript: input.transcript.unwrap_or_default(),
                notes: input.notes.unwrap_or_default(),
                comments: input.comments.unwrap_or_default(),
                tags: input.tags.unwrap_or_default(),
                created_at: now,
                updated_at: now,
                status,
                expires_at,
            },
        };

        self.repo.put_draft(&draft).await?;
        tracing::debug!(
            "Saved draft {} as {} until {}",
            draft.id,
            draft.status,
            draft.expires_at
        );

        Ok(draft)
    }

    /// Sweep, then return the draft if it is still alive
    pub async fn load(&self, id: &str) -> Option<TranscriptDraft> {
        self.cleanup_expired().await;

        let draft = match self.repo.get_draft(id).await {
            Ok(draft) => draft?,
            Err(e) => {
                tracing::warn!("Failed to load transcript draft {}: {}", id, e);
                return None;
            }
        };

        if draft.is_expired(self.clock.now()) {
            self.delete(id).await;
            return None;
        }

        Some(draft)
    }

    /// Sweep, then list unsaved drafts for a language, newest first
    pub async fn list(&self, language: &str) -> Vec<TranscriptDraft> {
        self.cleanup_expired().await;

        match self.repo.list_drafts(language, DraftStatus::Draft).await {
            Ok(drafts) => drafts,
            Err(e) => {
                tracing::warn!("Failed to list transcript drafts: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn delete(&self, id: &str) {
        if let Err(e) = self.repo.delete_draft(id).await {
            tracing::warn!("Failed to delete transcript draft {}: {}", id, e);
        }
    }

    /// Remove every expired draft; returns how many went
    pub async fn cleanup_expired(&self) -> u64 {
        match self.repo.delete_expired_drafts(self.clock.now()).await {
            Ok(0) => 0,
            Ok(removed) => {
                tracing::info!("Removed {} expired transcript drafts", removed);
                removed
            }
            Err(e) => {
                tracing::warn!("Failed to cleanup expired transcript drafts: {}", e);
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::database::initialize_database;
    use chrono::{Duration, Utc};
    use sqlx::sqlite::SqlitePoolOptions;

    async fn create_test_store() -> (DraftStore, Arc<ManualClock>) {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        initialize_database(&pool).await.unwrap();

        let clock = Arc::new(ManualClock::new(Utc::now()));
        let store = DraftStore::new(Repository::new(pool), clock.clone());
        (store, clock)
    }

    fn fr_draft(id: &str) -> DraftUpsert {
        DraftUpsert {
            language: Some("fr".to_string()),
            title: Some("t".to_string()),
            transcript: Some("hello".to_string()),
            ..DraftUpsert::new(id)
        }
    }

    #[tokio::test]
    async fn test_new_draft_defaults() {
        let (store, clock) = create_test_store().await;

        let draft = store.save(fr_draft("x")).await.unwrap();

        assert_eq!(draft.status, DraftStatus::Draft);
        assert_eq!(
            draft.created_at.timestamp_millis(),
            clock.now().timestamp_millis()
        );
        assert_eq!(draft.expires_at, draft.updated_at + Duration::days(7));
        assert!(draft.notes.is_empty());
        assert_eq!(draft.source_url, None);
    }

    #[tokio::test]
    async fn test_partial_save_keeps_omitted_fields() {
        let (store, clock) = create_test_store().await;

        let first = store.save(fr_draft("x")).await.unwrap();
        clock.advance(Duration::minutes(10));

        let second = store
            .save(DraftUpsert {
                status: Some(DraftStatus::Saved),
                ..DraftUpsert::new("x")
            })
            .await
            .unwrap();

        assert_eq!(second.transcript, "hello");
        assert_eq!(second.title, "t");
        assert_eq!(second.language, "fr");
        assert_eq!(second.status, DraftStatus::Saved);
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(
            second.updated_at.timestamp_millis(),
            clock.now().timestamp_millis()
        );
        assert_eq!(second.expires_at, second.updated_at + Duration::days(1));
    }

    #[tokio::test]
    async fn test_status_sticks_when_omitted() {
        let (store, _clock) = create_test_store().await;

        store
            .save(DraftUpsert {
                status: Some(DraftStatus::Saved),
                ..fr_draft("x")
            })
            .await
            .unwrap();

        let again = store
            .save(DraftUpsert {
                transcript: Some("edited".to_string()),
                ..DraftUpsert::new("x")
            })
            .await
            .unwrap();

        assert_eq!(again.status, DraftStatus::Saved);
        assert_eq!(again.expires_at, again.updated_at + DraftStatus::Saved.ttl());
    }

    #[tokio::test]
    async fn test_saving_old_draft_uses_saved_ttl() {
        let (store, clock) = create_test_store().await;

        store.save(fr_draft("x")).await.unwrap();
        clock.advance(Duration::days(6) + Duration::hours(12));

        let saved = store
            .save(DraftUpsert {
                status: Some(DraftStatus::Saved),
                ..DraftUpsert::new("x")
            })
            .await
            .unwrap();

        assert_eq!(saved.expires_at, saved.updated_at + Duration::days(1));

        let reloaded = store.load("x").await.unwrap();
        assert_eq!(reloaded.expires_at, saved.expires_at);
        assert_eq!(reloaded.status, DraftStatus::Saved);
    }

    #[tokio::test]
    async fn test_source_url_cleared_explicitly() {
        let (store, _clock) = create_test_store().await;

        store
            .save(DraftUpsert {
                source_url: Some(Some("https://example.test/ep1".to_string())),
                ..fr_draft("x")
            })
            .await
            .unwrap();

        let kept = store.save(DraftUpsert::new("x")).await.unwrap();
        assert_eq!(kept.source_url.as_deref(), Some("https://example.test/ep1"));

        let cleared = store
            .save(DraftUpsert {
                source_url: Some(None),
                ..DraftUpsert::new("x")
            })
            .await
            .unwrap();
        assert_eq!(cleared.source_url, None);
        assert_eq!(store.load("x").await.unwrap().source_url, None);
    }

    #[tokio::test]
    async fn test_storage_failures_are_swallowed() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        initialize_database(&pool).await.unwrap();
        let store = DraftStore::new(
            Repository::new(pool.clone()),
            Arc::new(ManualClock::new(Utc::now())),
        );
        store.save(fr_draft("x")).await.unwrap();

        pool.close().await;

        assert!(store.load("x").await.is_none());
        assert!(store.list("fr").await.is_empty());
        assert_eq!(store.cleanup_expired().await, 0);
        store.delete("x").await;
        assert!(store.save(fr_draft("y")).await.is_err());
    }

    #[tokio::test]
    async fn test_new_draft_requires_language() {
        let (store, _clock) = create_test_store().await;

        let result = store.save(DraftUpsert::new("x")).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));

        let result = store.save(fr_draft("  ")).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_load_expired_returns_none_twice() {
        let (store, clock) = create_test_store().await;

        store.save(fr_draft("x")).await.unwrap();
        clock.advance(Duration::days(7));

        assert!(store.load("x").await.is_none());
        assert!(store.load("x").await.is_none());
    }

    #[tokio::test]
    async fn test_load_fresh_draft() {
        let (store, clock) = create_test_store().await;

        store.save(fr_draft("x")).await.unwrap();
        clock.advance(Duration::days(6));

        let loaded = store.load("x").await.unwrap();
        assert_eq!(loaded.transcript, "hello");
        assert!(store.load("missing").await.is_none());
    }

    #[tokio::test]
    async fn test_list_only_unsaved_for_language() {
        let (store, clock) = create_test_store().await;

        store.save(fr_draft("a")).await.unwrap();
        store
            .save(DraftUpsert {
                status: Some(DraftStatus::Saved),
                ..fr_draft("b")
            })
            .await
            .unwrap();
        store
            .save(DraftUpsert {
                language: Some("en".to_string()),
                ..fr_draft("c")
            })
            .await
            .unwrap();
        clock.advance(Duration::seconds(1));
        store.save(fr_draft("d")).await.unwrap();

        let ids: Vec<String> = store.list("fr").await.into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["d".to_string(), "a".to_string()]);
    }

    #[tokio::test]
    async fn test_cleanup_sweeps_whole_store() {
        let (store, clock) = create_test_store().await;

        store.save(fr_draft("a")).await.unwrap();
        store
            .save(DraftUpsert {
                status: Some(DraftStatus::Saved),
                ..fr_draft("b")
            })
            .await
            .unwrap();

        clock.advance(Duration::days(1));
        assert_eq!(store.cleanup_expired().await, 1);
        assert!(store.load("a").await.is_some());
    }

    #[tokio::test]
    async fn test_expired_record_is_recreated_on_save() {
        let (store, clock) = create_test_store().await;

        let first = store.save(fr_draft("x")).await.unwrap();
        clock.advance(Duration::days(8));

        let second = store.save(fr_draft("x")).await.unwrap();
        assert!(second.created_at > first.created_at);
        assert_eq!(second.status, DraftStatus::Draft);
    }

    #[tokio::test]
    async fn test_delete_is_unconditional() {
        let (store, _clock) = create_test_store().await;

        store.save(fr_draft("x")).await.unwrap();
        store.delete("x").await;
        store.delete("x").await;

        assert!(store.load("x").await.is_none());
    }
}
