//! Wire types for the learning API
//!
//! Server payloads are normalised here: historical field aliases are
//! accepted on input and optional fields default, so the rest of the
//! crate only sees one shape per entity.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// Recall quality reported for one reviewed card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grade {
    Again,
    Hard,
    Good,
    Easy,
}

impl Grade {
    pub const ALL: [Grade; 4] = [Grade::Again, Grade::Hard, Grade::Good, Grade::Easy];

    /// Keyboard shortcut mapping used by the review screen (`1`..`4`)
    pub fn from_key(key: char) -> Option<Grade> {
        match key {
            '1' => Some(Grade::Again),
            '2' => Some(Grade::Hard),
            '3' => Some(Grade::Good),
            '4' => Some(Grade::Easy),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Grade::Again => "again",
            Grade::Hard => "hard",
            Grade::Good => "good",
            Grade::Easy => "easy",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Grade {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Grade::ALL
            .into_iter()
            .find(|g| g.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| AppError::InvalidInput(format!("Unknown grade: {}", s)))
    }
}

/// Scheduling state of a card, owned by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardStatus {
    #[default]
    New,
    Learning,
    Review,
    Suspended,
}

impl CardStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CardStatus::New => "new",
            CardStatus::Learning => "learning",
            CardStatus::Review => "review",
            CardStatus::Suspended => "suspended",
        }
    }
}

impl FromStr for CardStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "new" => Ok(CardStatus::New),
            "learning" => Ok(CardStatus::Learning),
            "review" => Ok(CardStatus::Review),
            "suspended" => Ok(CardStatus::Suspended),
            other => Err(AppError::InvalidInput(format!("Unknown card status: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewStats {
    pub status: CardStatus,
    /// ISO timestamps exactly as the server sent them
    pub due_at: Option<String>,
    pub last_reviewed_at: Option<String>,
    pub interval_days: f64,
    pub ease: f64,
    pub reps: u32,
    pub lapses: u32,
    pub streak_correct: u32,
    pub last_grade: Option<Grade>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyCard {
    pub id: String,
    pub language: String,
    pub word: String,
    #[serde(default)]
    pub translation: Option<String>,
    #[serde(default)]
    pub notes: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub review_stats: ReviewStats,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VocabListResponse {
    pub items: Vec<VocabularyCard>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DueCards {
    #[serde(default)]
    pub cards: Vec<VocabularyCard>,
    #[serde(default)]
    pub count: u64,
}

/// Aggregate counts. Older servers send `total` / `due` instead of
/// `total_cards` / `due_today`; call [`VocabStats::normalized`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VocabStats {
    pub total_cards: u64,
    pub cards_by_level: HashMap<String, u64>,
    pub due_today: u64,
    pub reviewed_today: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub learning: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suspended: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overdue: Option<u64>,
}

impl VocabStats {
    pub fn normalized(mut self) -> Self {
        if self.total_cards == 0 {
            self.total_cards = self.total.unwrap_or(0);
        }
        if self.due_today == 0 {
            self.due_today = self.due.unwrap_or(0);
        }
        if self.cards_by_level.is_empty() {
            let legacy = [
                ("new", self.new),
                ("learning", self.learning),
                ("review", self.review),
                ("suspended", self.suspended),
            ];
            for (level, count) in legacy {
                if let Some(count) = count {
                    self.cards_by_level.insert(level.to_string(), count);
                }
            }
        }
        self
    }
}

/// One entry of a batch review submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewSubmission {
    pub card_id: String,
    pub grade: Grade,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReviewItemResult {
    #[serde(default, alias = "card_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queued: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReviewBatchResult {
    #[serde(default)]
    pub updated: u64,
    #[serde(default)]
    pub results: Vec<ReviewItemResult>,
}

/// Filters for listing cards; empty fields are not sent
#[derive(Debug, Clone, Default)]
pub struct VocabQuery {
    pub language: String,
    pub q: Option<String>,
    pub status: Option<CardStatus>,
    pub last_grade: Option<Grade>,
    pub tag: Option<String>,
    pub due_before: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl VocabQuery {
    pub fn for_language(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            ..Default::default()
        }
    }

    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let candidates = [
            ("language", Some(self.language.clone())),
            ("q", self.q.clone()),
            ("status", self.status.map(|s| s.as_str().to_string())),
            ("last_grade", self.last_grade.map(|g| g.as_str().to_string())),
            ("tag", self.tag.clone()),
            ("due_before", self.due_before.clone()),
            ("limit", self.limit.map(|l| l.to_string())),
            ("offset", self.offset.map(|o| o.to_string())),
        ];

        candidates
            .into_iter()
            .filter_map(|(key, value)| value.filter(|v| !v.trim().is_empty()).map(|v| (key, v)))
            .collect()
    }
}

/// Card fields for creation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NewCard {
    pub word: String,
    pub translation: Option<String>,
    #[serde(default)]
    pub notes: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateCardRequest<'a> {
    pub language: &'a str,
    pub word: &'a str,
    pub translation: Option<&'a str>,
    pub notes: &'a [String],
    pub tags: &'a [String],
}

/// Partial card update; only set fields are sent
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CardPatch {
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// Payload of `POST /web/transcripts`
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TranscriptPayload {
    pub language: String,
    pub source_url: Option<String>,
    pub transcript: Option<String>,
    /// Newline-joined notes, or null when there are none
    pub notes: Option<String>,
    /// Newline-joined comments, or null when there are none
    pub comments: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Transcript {
    pub id: String,
    pub language: String,
    pub source_url: Option<String>,
    pub transcript: Option<String>,
    pub notes: Option<String>,
    pub comments: Option<String>,
    pub tags: Vec<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct User {
    #[serde(alias = "user_id", alias = "id")]
    pub sub: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub picture: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_grade_keys_and_parse() {
        assert_eq!(Grade::from_key('1'), Some(Grade::Again));
        assert_eq!(Grade::from_key('4'), Some(Grade::Easy));
        assert_eq!(Grade::from_key('5'), None);
        assert_eq!("Good".parse::<Grade>().unwrap(), Grade::Good);
        assert!("perfect".parse::<Grade>().is_err());
    }

    #[test]
    fn test_card_with_minimal_fields() {
        let card: VocabularyCard = serde_json::from_value(json!({
            "id": "c1",
            "type": "vocabulary_card",
            "language": "fr",
            "word": "chat",
            "review_stats": { "status": "learning", "reps": 3, "last_grade": "hard" }
        }))
        .unwrap();

        assert_eq!(card.translation, None);
        assert!(card.tags.is_empty());
        assert_eq!(card.review_stats.status, CardStatus::Learning);
        assert_eq!(card.review_stats.reps, 3);
        assert_eq!(card.review_stats.last_grade, Some(Grade::Hard));
    }

    #[test]
    fn test_legacy_stats_normalized() {
        let stats: VocabStats = serde_json::from_value(json!({
            "total": 12,
            "due": 4,
            "new": 5,
            "review": 7
        }))
        .unwrap();

        let stats = stats.normalized();
        assert_eq!(stats.total_cards, 12);
        assert_eq!(stats.due_today, 4);
        assert_eq!(stats.cards_by_level.get("new"), Some(&5));
        assert_eq!(stats.cards_by_level.get("review"), Some(&7));
    }

    #[test]
    fn test_current_stats_untouched_by_normalize() {
        let stats: VocabStats = serde_json::from_value(json!({
            "total_cards": 3,
            "cards_by_level": { "new": 3 },
            "due_today": 1,
            "reviewed_today": 2,
            "total": 99
        }))
        .unwrap();

        let stats = stats.normalized();
        assert_eq!(stats.total_cards, 3);
        assert_eq!(stats.cards_by_level.len(), 1);
    }

    #[test]
    fn test_batch_result_accepts_card_id_alias() {
        let result: ReviewBatchResult = serde_json::from_value(json!({
            "updated": 1,
            "results": [
                { "card_id": "a", "ok": true },
                { "id": "b", "ok": false, "error": "not found" }
            ]
        }))
        .unwrap();

        assert_eq!(result.results[0].id.as_deref(), Some("a"));
        assert_eq!(result.results[1].error.as_deref(), Some("not found"));
    }

    #[test]
    fn test_query_skips_empty_values() {
        let query = VocabQuery {
            q: Some("".to_string()),
            status: Some(CardStatus::Review),
            limit: Some(50),
            ..VocabQuery::for_language("fr")
        };

        assert_eq!(
            query.to_pairs(),
            vec![
                ("language", "fr".to_string()),
                ("status", "review".to_string()),
                ("limit", "50".to_string()),
            ]
        );
    }
}
