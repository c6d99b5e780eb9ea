//! Database models
//!
//! Rust structs representing locally stored entities.
//! All models use serde for serialization to a UI shell.

use crate::config::{DRAFT_TTL_HOURS, SAVED_DRAFT_TTL_HOURS};
use crate::error::{AppError, Result};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

/// Lifecycle of a local transcript draft
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DraftStatus {
    /// Not yet saved to the cloud
    #[default]
    Draft,
    /// Saved to the cloud; kept briefly as a local backup
    Saved,
}

impl DraftStatus {
    /// How long a record with this status survives after its last update
    pub fn ttl(self) -> Duration {
        match self {
            DraftStatus::Draft => Duration::hours(DRAFT_TTL_HOURS),
            DraftStatus::Saved => Duration::hours(SAVED_DRAFT_TTL_HOURS),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DraftStatus::Draft => "draft",
            DraftStatus::Saved => "saved",
        }
    }
}

impl fmt::Display for DraftStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DraftStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "draft" => Ok(DraftStatus::Draft),
            "saved" => Ok(DraftStatus::Saved),
            other => Err(AppError::InvalidInput(format!(
                "Unknown draft status: {}",
                other
            ))),
        }
    }
}

/// An in-progress transcript held only on this device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptDraft {
    pub id: String,
    pub language: String,
    pub title: String,
    pub source_url: Option<String>,
    pub transcript: String,
    pub notes: Vec<String>,
    pub comments: Vec<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: DraftStatus,
    pub expires_at: DateTime<Utc>,
}

impl TranscriptDraft {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Partial draft write. Omitted fields keep their stored values.
#[derive(Debug, Clone, Default)]
pub struct DraftUpsert {
    pub id: String,
    pub language: Option<String>,
    pub title: Option<String>,
    /// `Some(None)` clears the stored URL
    pub source_url: Option<Option<String>>,
    pub transcript: Option<String>,
    pub notes: Option<Vec<String>>,
    pub comments: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub status: Option<DraftStatus>,
}

impl DraftUpsert {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }
}

/// Row shape of `transcript_drafts`; list fields are JSON text and
/// timestamps are epoch milliseconds so range deletes compare numerically.
#[derive(Debug, FromRow)]
pub(crate) struct DraftRow {
    pub id: String,
    pub language: String,
    pub title: String,
    pub source_url: Option<String>,
    pub transcript: String,
    pub notes: String,
    pub comments: String,
    pub tags: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub status: String,
    pub expires_at: i64,
}

pub(crate) fn from_millis(ms: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| AppError::Generic(format!("Invalid timestamp: {}", ms)))
}

impl TryFrom<DraftRow> for TranscriptDraft {
    type Error = AppError;

    fn try_from(row: DraftRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            language: row.language,
            title: row.title,
            source_url: row.source_url,
            transcript: row.transcript,
            notes: serde_json::from_str(&row.notes)?,
            comments: serde_json::from_str(&row.comments)?,
            tags: serde_json::from_str(&row.tags)?,
            created_at: from_millis(row.created_at)?,
            updated_at: from_millis(row.updated_at)?,
            status: row.status.parse()?,
            expires_at: from_millis(row.expires_at)?,
        })
    }
}
