//! Vocabulary service
//!
//! Wraps [`VocabApi`] with the client-side policies: short-lived caching of
//! stats and due lists, cache invalidation on every write, and the error
//! policy (log, notify, drop the token on 401).

use crate::api::*;
use crate::config::VOCAB_CACHE_TTL;
use crate::error::{AppError, Result};
use crate::events::{AppEvent, EventBus};
use crate::services::credentials::TokenStore;
use crate::services::notifications::NotificationService;
use crate::services::request_cache::{cache_key, RequestCache};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cache key prefix shared by every vocabulary read
const VOCAB_CACHE_PREFIX: &str = "GET:/web/vocab";

#[derive(Clone)]
pub struct VocabService {
    api: VocabApi,
    tokens: TokenStore,
    notifications: NotificationService,
    events: EventBus,
    stats_cache: RequestCache<VocabStats>,
    due_cache: RequestCache<DueCards>,
    /// Set once a 401 has been handled; cleared by the next success
    signed_out: Arc<AtomicBool>,
}

impl VocabService {
    pub fn new(
        api: VocabApi,
        tokens: TokenStore,
        notifications: NotificationService,
        events: EventBus,
    ) -> Self {
        Self {
            api,
            tokens,
            notifications,
            events,
            stats_cache: RequestCache::new(),
            due_cache: RequestCache::new(),
            signed_out: Arc::new(AtomicBool::new(false)),
        }
    }

    pub async fn list(&self, query: &VocabQuery) -> Result<VocabListResponse> {
        let result = self.api.list(query).await;
        self.checked("Failed to load vocabulary", result).await
    }

    /// Cards due for review; cached briefly
    pub async fn due(&self, language: &str, limit: u32) -> Result<DueCards> {
        let key = cache_key(
            "GET",
            "/web/vocab/due",
            &[("language", language.to_string()), ("limit", limit.to_string())],
        );
        let api = self.api.clone();
        let language = language.to_string();

        let result = self
            .due_cache
            .get(&key, move || async move { api.due(&language, limit).await }, VOCAB_CACHE_TTL)
            .await;
        self.checked("Failed to load due cards", result).await
    }

    /// Deck statistics; cached briefly
    pub async fn stats(&self, language: &str) -> Result<VocabStats> {
        let key = cache_key("GET", "/web/vocab/stats", &[("language", language.to_string())]);
        let api = self.api.clone();
        let language = language.to_string();

        let result = self
            .stats_cache
            .get(&key, move || async move { api.stats(&language).await }, VOCAB_CACHE_TTL)
            .await;
        self.checked("Failed to load vocabulary stats", result).await
    }

    pub async fn get(&self, card_id: &str, language: &str) -> Result<VocabularyCard> {
        let result = self.api.get(card_id, language).await;
        self.checked("Failed to load card", result).await
    }

    pub async fn create(&self, language: &str, card: &NewCard) -> Result<VocabularyCard> {
        if card.word.trim().is_empty() {
            return Err(AppError::InvalidInput("Word must not be empty".to_string()));
        }

        let result = self.api.create(language, card).await;
        self.invalidate_cached();
        self.checked("Failed to add card", result).await
    }

    pub async fn bulk_import(&self, language: &str, cards: &[NewCard]) -> Result<VocabListResponse> {
        let result = self.api.bulk_import(language, cards).await;
        self.invalidate_cached();
        self.checked("Failed to import cards", result).await
    }

    pub async fn update(&self, card_id: &str, patch: &CardPatch) -> Result<VocabularyCard> {
        let result = self.api.update(card_id, patch).await;
        self.invalidate_cached();
        self.checked("Failed to update card", result).await
    }

    /// Soft delete (the card is suspended server-side)
    pub async fn delete(&self, card_id: &str) -> Result<()> {
        let result = self.api.remove(card_id).await;
        self.invalidate_cached();
        self.checked("Failed to delete card", result).await
    }

    pub async fn hard_delete(&self, card_id: &str, language: Option<&str>) -> Result<()> {
        let result = self.api.hard_remove(card_id, language).await;
        self.invalidate_cached();
        self.checked("Failed to delete card", result).await
    }

    pub async fn review_batch(&self, reviews: &[ReviewSubmission]) -> Result<ReviewBatchResult> {
        let result = self.api.review_batch(reviews).await;
        self.invalidate_cached();
        self.checked("Failed to submit reviews", result).await
    }

    fn invalidate_cached(&self) {
        self.stats_cache.invalidate_prefix(VOCAB_CACHE_PREFIX);
        self.due_cache.invalidate_prefix(VOCAB_CACHE_PREFIX);
    }

    async fn checked<T>(&self, action: &str, result: Result<T>) -> Result<T> {
        match result {
            Ok(value) => {
                self.signed_out.store(false, Ordering::SeqCst);
                Ok(value)
            }
            Err(e) => {
                self.report(action, &e).await;
                Err(e)
            }
        }
    }

    async fn report(&self, action: &str, err: &AppError) {
        if !err.is_unauthorized() {
            tracing::error!("{}: {}", action, err);
            self.notifications.error(format!("{}: {}", action, err));
            return;
        }

        // Concurrent 401s are handled once
        if self.signed_out.swap(true, Ordering::SeqCst) {
            return;
        }

        tracing::warn!("API rejected the stored token, signing out");
        if let Err(e) = self.tokens.clear().await {
            tracing::warn!("Failed to clear auth token: {}", e);
        }
        self.stats_cache.clear();
        self.due_cache.clear();
        self.events.publish(AppEvent::Unauthorized);
        self.notifications.warning("Session expired. Please sign in again.");
    }
}
