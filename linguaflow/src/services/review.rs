//! Review sessions
//!
//! A session walks a fixed list of due cards one at a time, collects one
//! grade per card and submits every grade in a single batch at the end.
//! Scheduling happens server-side; the client only reports grades.

use crate::api::{Grade, ReviewSubmission, VocabularyCard};
use crate::error::{AppError, Result};
use crate::events::{AppEvent, EventBus};
use crate::services::vocab::VocabService;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Which side of the card is shown first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDirection {
    #[default]
    WordToTranslation,
    TranslationToWord,
}

impl ReviewDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            ReviewDirection::WordToTranslation => "word_to_translation",
            ReviewDirection::TranslationToWord => "translation_to_word",
        }
    }
}

impl fmt::Display for ReviewDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewDirection {
    type Err = AppError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "word_to_translation" => Ok(ReviewDirection::WordToTranslation),
            "translation_to_word" => Ok(ReviewDirection::TranslationToWord),
            other => Err(AppError::InvalidInput(format!("Unknown review direction: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewState {
    Idle,
    Showing { index: usize, flipped: bool },
    /// The confirmation dialog is open over card `index`
    Confirming { index: usize },
    Submitting,
    Done { reviewed: usize },
}

/// Question and answer text of the current card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardFaces {
    pub front: String,
    pub back: String,
}

/// In-session edit of a card; only set fields change
#[derive(Debug, Clone, Default)]
pub struct CardEdit {
    pub word: Option<String>,
    pub translation: Option<Option<String>>,
    pub notes: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardRow {
    pub card_id: String,
    pub word: String,
    pub translation: Option<String>,
    pub reviewed: bool,
    pub grade: Option<Grade>,
}

/// Data shown in the submit confirmation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub total: usize,
    pub reviewed: usize,
    pub remaining: usize,
    /// 1-based position of the current card
    pub current: usize,
    pub grade_counts: [(Grade, usize); 4],
    pub rows: Vec<CardRow>,
}

pub struct ReviewSession {
    cards: Vec<VocabularyCard>,
    grades: HashMap<String, Grade>,
    direction: ReviewDirection,
    state: ReviewState,
}

impl ReviewSession {
    pub fn new(direction: ReviewDirection) -> Self {
        Self {
            cards: Vec::new(),
            grades: HashMap::new(),
            direction,
            state: ReviewState::Idle,
        }
    }

    /// Begin reviewing `cards` in the given order
    pub fn start(&mut self, cards: Vec<VocabularyCard>) -> Result<()> {
        if self.state != ReviewState::Idle {
            return Err(AppError::InvalidState("Review session already started".to_string()));
        }
        if cards.is_empty() {
            return Err(AppError::InvalidInput("No cards to review".to_string()));
        }

        tracing::debug!("Starting review session with {} cards", cards.len());
        self.cards = cards;
        self.grades.clear();
        self.state = ReviewState::Showing {
            index: 0,
            flipped: false,
        };
        Ok(())
    }

    pub fn state(&self) -> ReviewState {
        self.state
    }

    pub fn direction(&self) -> ReviewDirection {
        self.direction
    }

    pub fn cards(&self) -> &[VocabularyCard] {
        &self.cards
    }

    pub fn total(&self) -> usize {
        self.cards.len()
    }

    pub fn grade_for(&self, card_id: &str) -> Option<Grade> {
        self.grades.get(card_id).copied()
    }

    /// Number of cards that have a grade
    pub fn reviewed_count(&self) -> usize {
        self.grades.len()
    }

    fn current_index(&self) -> Option<usize> {
        match self.state {
            ReviewState::Showing { index, .. } | ReviewState::Confirming { index } => Some(index),
            _ => None,
        }
    }

    pub fn current_card(&self) -> Option<&VocabularyCard> {
        self.current_index().and_then(|i| self.cards.get(i))
    }

    pub fn current_faces(&self) -> Option<CardFaces> {
        let card = self.current_card()?;
        let translation = card.translation.clone().unwrap_or_default();

        Some(match self.direction {
            ReviewDirection::WordToTranslation => CardFaces {
                front: card.word.clone(),
                back: translation,
            },
            ReviewDirection::TranslationToWord => CardFaces {
                front: translation,
                back: card.word.clone(),
            },
        })
    }

    fn showing(&self, action: &str) -> Result<(usize, bool)> {
        match self.state {
            ReviewState::Showing { index, flipped } => Ok((index, flipped)),
            other => Err(AppError::InvalidState(format!("Cannot {} while {:?}", action, other))),
        }
    }

    pub fn flip(&mut self) -> Result<()> {
        let (index, _) = self.showing("flip")?;
        self.state = ReviewState::Showing { index, flipped: true };
        Ok(())
    }

    /// Advance one card; past the last card the confirmation opens
    pub fn next(&mut self) -> Result<()> {
        let (index, _) = self.showing("advance")?;

        self.state = if index + 1 < self.cards.len() {
            ReviewState::Showing {
                index: index + 1,
                flipped: false,
            }
        } else {
            ReviewState::Confirming { index }
        };
        Ok(())
    }

    /// Go back one card. Recorded grades are kept.
    pub fn prev(&mut self) -> Result<()> {
        let (index, _) = self.showing("go back")?;

        if index > 0 {
            self.state = ReviewState::Showing {
                index: index - 1,
                flipped: false,
            };
        }
        Ok(())
    }

    /// Record `grade` for the current card (replacing any earlier grade) and advance
    pub fn mark(&mut self, grade: Grade) -> Result<()> {
        let (index, _) = self.showing("grade")?;

        if let Some(card) = self.cards.get(index) {
            self.grades.insert(card.id.clone(), grade);
        }
        self.next()
    }

    /// Open the submit confirmation before reaching the last card
    pub fn request_submit(&mut self) -> Result<()> {
        let (index, _) = self.showing("submit")?;
        self.state = ReviewState::Confirming { index };
        Ok(())
    }

    /// Close the confirmation and return to the card it was opened over
    pub fn cancel_confirm(&mut self) -> Result<()> {
        match self.state {
            ReviewState::Confirming { index } => {
                self.state = ReviewState::Showing { index, flipped: true };
                Ok(())
            }
            other => Err(AppError::InvalidState(format!(
                "No confirmation to cancel while {:?}",
                other
            ))),
        }
    }

    /// Enter `Submitting` and hand out the batch, in card order.
    ///
    /// Only one submit can be in flight; the session must be confirming.
    pub fn begin_submit(&mut self) -> Result<Vec<ReviewSubmission>> {
        match self.state {
            ReviewState::Confirming { .. } => {}
            ReviewState::Submitting => {
                return Err(AppError::InvalidState("Review batch already submitting".to_string()))
            }
            other => {
                return Err(AppError::InvalidState(format!("Cannot submit while {:?}", other)))
            }
        }

        self.state = ReviewState::Submitting;

        Ok(self
            .cards
            .iter()
            .filter_map(|card| {
                self.grades.get(&card.id).map(|grade| ReviewSubmission {
                    card_id: card.id.clone(),
                    grade: *grade,
                })
            })
            .collect())
    }

    /// Close the session whatever the submit outcome was
    pub fn finish_submit(&mut self) -> Result<usize> {
        if self.state != ReviewState::Submitting {
            return Err(AppError::InvalidState(format!(
                "Cannot finish submit while {:?}",
                self.state
            )));
        }

        let reviewed = self.reviewed_count();
        self.state = ReviewState::Done { reviewed };
        Ok(reviewed)
    }

    pub fn summary(&self) -> SessionSummary {
        let total = self.cards.len();
        let reviewed = self.reviewed_count();
        let index = self.current_index().unwrap_or(total.saturating_sub(1));

        let grade_counts = Grade::ALL.map(|g| (g, self.grades.values().filter(|x| **x == g).count()));

        let rows = self
            .cards
            .iter()
            .enumerate()
            .map(|(i, card)| {
                let grade = self.grade_for(&card.id);
                CardRow {
                    card_id: card.id.clone(),
                    word: card.word.clone(),
                    translation: card.translation.clone(),
                    reviewed: i < index || grade.is_some(),
                    grade,
                }
            })
            .collect();

        SessionSummary {
            total,
            reviewed,
            remaining: total.saturating_sub(reviewed),
            current: (index + 1).min(total.max(1)),
            grade_counts,
            rows,
        }
    }

    /// Apply an edit to this session's copy of a card
    pub fn edit_card(&mut self, card_id: &str, edit: CardEdit) -> Result<&VocabularyCard> {
        let card = self
            .cards
            .iter_mut()
            .find(|c| c.id == card_id)
            .ok_or_else(|| AppError::NotFound(format!("Card {} is not in this session", card_id)))?;

        if let Some(word) = edit.word {
            card.word = word;
        }
        if let Some(translation) = edit.translation {
            card.translation = translation;
        }
        if let Some(notes) = edit.notes {
            card.notes = notes;
        }
        if let Some(tags) = edit.tags {
            card.tags = tags;
        }

        Ok(card)
    }
}

/// Runs the network side of a review session
#[derive(Clone)]
pub struct ReviewService {
    vocab: VocabService,
    events: EventBus,
}

impl ReviewService {
    pub fn new(vocab: VocabService, events: EventBus) -> Self {
        Self { vocab, events }
    }

    /// Fetch due cards and start a session over them
    pub async fn start_session(
        &self,
        language: &str,
        limit: u32,
        direction: ReviewDirection,
    ) -> Result<ReviewSession> {
        let due = self.vocab.due(language, limit).await?;
        let mut session = ReviewSession::new(direction);
        session.start(due.cards)?;
        Ok(session)
    }

    /// Submit all recorded grades in one batch and close the session.
    ///
    /// A failed batch is reported but the session still ends; grades are
    /// not retried.
    pub async fn submit(&self, session: &mut ReviewSession) -> Result<usize> {
        let batch = session.begin_submit()?;

        if batch.is_empty() {
            tracing::debug!("No graded cards, skipping review batch");
        } else {
            match self.vocab.review_batch(&batch).await {
                Ok(result) => tracing::info!("Review batch accepted, {} cards updated", result.updated),
                Err(e) => tracing::error!("Failed to submit review batch: {}", e),
            }
        }

        let reviewed = session.finish_submit()?;
        self.events.publish(AppEvent::ReviewCompleted { reviewed });
        Ok(reviewed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(id: &str, word: &str, translation: &str) -> VocabularyCard {
        VocabularyCard {
            id: id.to_string(),
            language: "fr".to_string(),
            word: word.to_string(),
            translation: Some(translation.to_string()),
            notes: Vec::new(),
            tags: Vec::new(),
            review_stats: Default::default(),
            created_at: None,
            updated_at: None,
        }
    }

    fn three_card_session() -> ReviewSession {
        let mut session = ReviewSession::new(ReviewDirection::WordToTranslation);
        session
            .start(vec![
                card("c0", "chat", "cat"),
                card("c1", "chien", "dog"),
                card("c2", "oiseau", "bird"),
            ])
            .unwrap();
        session
    }

    #[test]
    fn test_mark_good_three_times_reaches_confirmation() {
        let mut session = three_card_session();

        session.mark(Grade::Good).unwrap();
        assert_eq!(session.state(), ReviewState::Showing { index: 1, flipped: false });
        session.mark(Grade::Good).unwrap();
        assert_eq!(session.state(), ReviewState::Showing { index: 2, flipped: false });
        session.mark(Grade::Good).unwrap();
        assert_eq!(session.state(), ReviewState::Confirming { index: 2 });

        for id in ["c0", "c1", "c2"] {
            assert_eq!(session.grade_for(id), Some(Grade::Good));
        }
        assert_eq!(session.reviewed_count(), 3);
    }

    #[test]
    fn test_prev_at_first_card_is_noop() {
        let mut session = three_card_session();
        session.flip().unwrap();

        session.prev().unwrap();

        assert_eq!(session.state(), ReviewState::Showing { index: 0, flipped: true });
    }

    #[test]
    fn test_prev_keeps_grades_and_unflips() {
        let mut session = three_card_session();
        session.mark(Grade::Hard).unwrap();
        session.flip().unwrap();

        session.prev().unwrap();

        assert_eq!(session.state(), ReviewState::Showing { index: 0, flipped: false });
        assert_eq!(session.grade_for("c0"), Some(Grade::Hard));
    }

    #[test]
    fn test_regrade_replaces_earlier_grade() {
        let mut session = three_card_session();
        session.mark(Grade::Again).unwrap();
        session.prev().unwrap();
        session.mark(Grade::Easy).unwrap();

        assert_eq!(session.grade_for("c0"), Some(Grade::Easy));
        assert_eq!(session.reviewed_count(), 1);
    }

    #[test]
    fn test_empty_session_rejected() {
        let mut session = ReviewSession::new(ReviewDirection::default());
        let err = session.start(Vec::new()).unwrap_err();

        assert!(matches!(err, AppError::InvalidInput(ref m) if m == "No cards to review"));
        assert_eq!(session.state(), ReviewState::Idle);
    }

    #[test]
    fn test_cancel_confirm_returns_to_flipped_card() {
        let mut session = three_card_session();
        session.next().unwrap();
        session.request_submit().unwrap();
        assert_eq!(session.state(), ReviewState::Confirming { index: 1 });

        session.cancel_confirm().unwrap();
        assert_eq!(session.state(), ReviewState::Showing { index: 1, flipped: true });
    }

    #[test]
    fn test_begin_submit_only_once() {
        let mut session = three_card_session();
        session.mark(Grade::Good).unwrap();
        session.next().unwrap();
        session.mark(Grade::Again).unwrap();

        let batch = session.begin_submit().unwrap();
        assert_eq!(
            batch,
            vec![
                ReviewSubmission {
                    card_id: "c0".to_string(),
                    grade: Grade::Good
                },
                ReviewSubmission {
                    card_id: "c2".to_string(),
                    grade: Grade::Again
                },
            ]
        );

        assert!(matches!(session.begin_submit(), Err(AppError::InvalidState(_))));
        assert!(session.mark(Grade::Easy).is_err());

        assert_eq!(session.finish_submit().unwrap(), 2);
        assert_eq!(session.state(), ReviewState::Done { reviewed: 2 });
    }

    #[test]
    fn test_summary_counts() {
        let mut session = three_card_session();
        session.mark(Grade::Good).unwrap();
        session.mark(Grade::Again).unwrap();

        let summary = session.summary();

        assert_eq!(summary.total, 3);
        assert_eq!(summary.reviewed, 2);
        assert_eq!(summary.remaining, 1);
        assert_eq!(summary.current, 3);
        assert_eq!(
            summary.grade_counts,
            [(Grade::Again, 1), (Grade::Hard, 0), (Grade::Good, 1), (Grade::Easy, 0)]
        );
        assert!(summary.rows[0].reviewed);
        assert!(!summary.rows[2].reviewed);
        assert_eq!(summary.rows[2].grade, None);
    }

    #[test]
    fn test_direction_swaps_faces() {
        let mut session = ReviewSession::new(ReviewDirection::TranslationToWord);
        session.start(vec![card("c0", "chat", "cat")]).unwrap();

        let faces = session.current_faces().unwrap();
        assert_eq!(faces.front, "cat");
        assert_eq!(faces.back, "chat");
    }

    #[test]
    fn test_edit_card_changes_session_copy_only() {
        let preset = vec![card("c0", "chat", "cat")];
        let mut session = ReviewSession::new(ReviewDirection::WordToTranslation);
        session.start(preset.clone()).unwrap();

        let edited = session
            .edit_card(
                "c0",
                CardEdit {
                    translation: Some(Some("cat (m.)".to_string())),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(edited.translation.as_deref(), Some("cat (m.)"));

        assert_eq!(session.current_faces().unwrap().back, "cat (m.)");
        assert_eq!(preset[0].translation.as_deref(), Some("cat"));
        assert!(matches!(
            session.edit_card("missing", CardEdit::default()),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_grade_keys() {
        assert_eq!(Grade::from_key('1'), Some(Grade::Again));
        assert_eq!(Grade::from_key('4'), Some(Grade::Easy));
        assert_eq!(Grade::from_key('5'), None);
    }
}
