//! Repository layer for database operations
//!
//! Plain reads and writes for drafts and key/value settings.
//! Retention rules live in the draft store, not here.

use super::models::*;
use crate::error::Result;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a draft by ID, expired or not
    pub async fn get_draft(&self, id: &str) -> Result<Option<TranscriptDraft>> {
        let row = sqlx::query_as::<_, DraftRow>(
            r#"
            SELECT * FROM transcript_drafts WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TranscriptDraft::try_from).transpose()
    }

    /// Insert or replace a draft (last write wins)
    pub async fn put_draft(&self, draft: &TranscriptDraft) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO transcript_drafts
                (id, language, title, source_url, transcript, notes, comments, tags,
                 created_at, updated_at, status, expires_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                language = excluded.language,
                title = excluded.title,
                source_url = excluded.source_url,
                transcript = excluded.transcript,
                notes = excluded.notes,
                comments = excluded.comments,
                tags = excluded.tags,
                created_at = excluded.created_at,
                updated_at = excluded.updated_at,
                status = excluded.status,
                expires_at = excluded.expires_at
            "#,
        )
        .bind(&draft.id)
        .bind(&draft.language)
        .bind(&draft.title)
        .bind(&draft.source_url)
        .bind(&draft.transcript)
        .bind(serde_json::to_string(&draft.notes)?)
        .bind(serde_json::to_string(&draft.comments)?)
        .bind(serde_json::to_string(&draft.tags)?)
        .bind(draft.created_at.timestamp_millis())
        .bind(draft.updated_at.timestamp_millis())
        .bind(draft.status.as_str())
        .bind(draft.expires_at.timestamp_millis())
        .execute(&self.pool)
        .await?;

        tracing::debug!("Stored draft: {} ({})", draft.id, draft.status);
        Ok(())
    }

    /// Delete a draft; returns whether a row was removed
    pub async fn delete_draft(&self, id: &str) -> Result<bool> {
        let rows = sqlx::query("DELETE FROM transcript_drafts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::debug!("Deleted draft: {} (rows: {})", id, rows);
        Ok(rows > 0)
    }

    /// Delete every draft whose horizon is at or before `now`
    pub async fn delete_expired_drafts(&self, now: DateTime<Utc>) -> Result<u64> {
        let rows = sqlx::query("DELETE FROM transcript_drafts WHERE expires_at <= ?")
            .bind(now.timestamp_millis())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows)
    }

    /// List drafts for a language with the given status, most recently updated first
    pub async fn list_drafts(
        &self,
        language: &str,
        status: DraftStatus,
    ) -> Result<Vec<TranscriptDraft>> {
        let rows = sqlx::query_as::<_, DraftRow>(
            r#"
            SELECT * FROM transcript_drafts
            WHERE language = ? AND status = ?
            ORDER BY updated_at DESC
            "#,
        )
        .bind(language)
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TranscriptDraft::try_from).collect()
    }

    /// Get/set settings
    pub async fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(value)
    }

    pub async fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO settings (key, value) VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        tracing::debug!("Set setting: {}", key);
        Ok(())
    }

    pub async fn delete_setting(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM settings WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;

        tracing::debug!("Deleted setting: {}", key);
        Ok(())
    }
}
