//! Vocabulary endpoints
//!
//! Request/response mapping only. Caching, notifications and auth
//! handling live in `services::vocab`.

use super::client::ApiClient;
use super::models::*;
use crate::error::Result;

#[derive(Clone)]
pub struct VocabApi {
    client: ApiClient,
}

impl VocabApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// `GET /web/vocab`
    pub async fn list(&self, query: &VocabQuery) -> Result<VocabListResponse> {
        self.client.get("/web/vocab", &query.to_pairs()).await
    }

    /// `GET /web/vocab/due`
    pub async fn due(&self, language: &str, limit: u32) -> Result<DueCards> {
        let query = [("language", language.to_string()), ("limit", limit.to_string())];
        self.client.get("/web/vocab/due", &query).await
    }

    /// `GET /web/vocab/stats`
    pub async fn stats(&self, language: &str) -> Result<VocabStats> {
        let stats: VocabStats = self
            .client
            .get("/web/vocab/stats", &[("language", language.to_string())])
            .await?;
        Ok(stats.normalized())
    }

    /// `GET /web/vocab/{id}`
    pub async fn get(&self, card_id: &str, language: &str) -> Result<VocabularyCard> {
        self.client
            .get(
                &format!("/web/vocab/{}", card_id),
                &[("language", language.to_string())],
            )
            .await
    }

    /// `POST /web/vocab`
    pub async fn create(&self, language: &str, card: &NewCard) -> Result<VocabularyCard> {
        let body = CreateCardRequest {
            language,
            word: &card.word,
            translation: card.translation.as_deref(),
            notes: &card.notes,
            tags: &card.tags,
        };
        self.client.post("/web/vocab", &body).await
    }

    /// `POST /web/vocab:review-batch`
    pub async fn review_batch(&self, reviews: &[ReviewSubmission]) -> Result<ReviewBatchResult> {
        let body = serde_json::json!({ "reviews": reviews });
        self.client.post("/web/vocab:review-batch", &body).await
    }

    /// Import cards into a deck.
    ///
    /// The server creates one card per call, so only the first card is
    /// sent and the result is a one-item page. An empty import makes no
    /// request at all.
    pub async fn bulk_import(&self, language: &str, cards: &[NewCard]) -> Result<VocabListResponse> {
        let Some(first) = cards.first() else {
            return Ok(VocabListResponse::default());
        };

        if cards.len() > 1 {
            tracing::warn!(
                "Bulk import received {} cards; only the first is sent",
                cards.len()
            );
        }

        let created = self.create(language, first).await?;
        Ok(VocabListResponse {
            items: vec![created],
            total: 1,
            limit: 1,
            offset: 0,
        })
    }

    /// `PATCH /web/vocab/{id}`
    pub async fn update(&self, card_id: &str, patch: &CardPatch) -> Result<VocabularyCard> {
        self.client
            .patch(&format!("/web/vocab/{}", card_id), patch)
            .await
    }

    /// `DELETE /web/vocab/{id}` (soft delete; the card is suspended)
    pub async fn remove(&self, card_id: &str) -> Result<()> {
        self.client
            .delete(&format!("/web/vocab/{}", card_id), &[])
            .await
    }

    /// `DELETE /web/vocab/{id}/hard`
    pub async fn hard_remove(&self, card_id: &str, language: Option<&str>) -> Result<()> {
        let query: Vec<(&str, String)> = language
            .filter(|l| !l.is_empty())
            .map(|l| vec![("language", l.to_string())])
            .unwrap_or_default();

        self.client
            .delete(&format!("/web/vocab/{}/hard", card_id), &query)
            .await
    }
}
