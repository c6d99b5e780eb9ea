//! Workspace service
//!
//! Keeps the transcript being edited safe on this device while the user
//! works, and pushes it to the cloud on request. Local drafts are a
//! convenience: any failure to write one is logged and ignored.

use crate::api::{TranscriptPayload, TranscriptsApi};
use crate::config::{AUTOSAVE_INTERVAL, DEFAULT_DRAFT_TITLE};
use crate::database::{DraftStatus, DraftUpsert, TranscriptDraft};
use crate::events::{AppEvent, EventBus};
use crate::services::notifications::NotificationService;
use crate::storage::DraftStore;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Editor state of the open workspace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceDraft {
    pub id: String,
    pub language: String,
    pub title: String,
    pub source_url: Option<String>,
    pub transcript: String,
    pub notes: Vec<String>,
    pub comments: Vec<String>,
    pub tags: Vec<String>,
}

impl WorkspaceDraft {
    pub fn new(id: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            language: language.into(),
            title: DEFAULT_DRAFT_TITLE.to_string(),
            source_url: None,
            transcript: String::new(),
            notes: Vec::new(),
            comments: Vec::new(),
            tags: Vec::new(),
        }
    }

    /// Empty draft under a fresh id
    pub fn start(language: impl Into<String>) -> Self {
        Self::new(Uuid::new_v4().to_string(), language)
    }

    /// Anything worth keeping was entered
    pub fn has_content(&self) -> bool {
        !self.transcript.trim().is_empty()
            || !self.notes.is_empty()
            || self.source_url.as_deref().is_some_and(|u| !u.trim().is_empty())
            || !self.comments.is_empty()
            || !self.tags.is_empty()
    }

    fn title_or_default(&self) -> String {
        if self.title.trim().is_empty() {
            DEFAULT_DRAFT_TITLE.to_string()
        } else {
            self.title.clone()
        }
    }

    fn source_url(&self) -> Option<String> {
        self.source_url.clone().filter(|u| !u.trim().is_empty())
    }

    /// Full upsert; `status: None` keeps whatever status is stored
    fn to_upsert(&self, status: Option<DraftStatus>) -> DraftUpsert {
        DraftUpsert {
            id: self.id.clone(),
            language: Some(self.language.clone()),
            title: Some(self.title_or_default()),
            source_url: Some(self.source_url()),
            transcript: Some(self.transcript.clone()),
            notes: Some(self.notes.clone()),
            comments: Some(self.comments.clone()),
            tags: Some(self.tags.clone()),
            status,
        }
    }

    fn to_payload(&self) -> TranscriptPayload {
        let joined = |lines: &[String]| (!lines.is_empty()).then(|| lines.join("\n"));

        TranscriptPayload {
            language: self.language.clone(),
            source_url: self.source_url(),
            transcript: Some(self.transcript.clone()),
            notes: joined(&self.notes),
            comments: joined(&self.comments),
            tags: self.tags.clone(),
        }
    }
}

impl From<TranscriptDraft> for WorkspaceDraft {
    fn from(draft: TranscriptDraft) -> Self {
        let title = if draft.title.trim().is_empty() {
            DEFAULT_DRAFT_TITLE.to_string()
        } else {
            draft.title
        };

        Self {
            id: draft.id,
            language: draft.language,
            title,
            source_url: draft.source_url,
            transcript: draft.transcript,
            notes: draft.notes,
            comments: draft.comments,
            tags: draft.tags,
        }
    }
}

/// What happened to a save-to-cloud request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloudSaveOutcome {
    Saved,
    /// Blank transcript; nothing was sent
    NothingToSave,
    Failed,
}

#[derive(Clone)]
pub struct WorkspaceService {
    drafts: DraftStore,
    transcripts: TranscriptsApi,
    notifications: NotificationService,
    events: EventBus,
}

impl WorkspaceService {
    pub fn new(
        drafts: DraftStore,
        transcripts: TranscriptsApi,
        notifications: NotificationService,
        events: EventBus,
    ) -> Self {
        Self {
            drafts,
            transcripts,
            notifications,
            events,
        }
    }

    /// Open draft `id`, or start an empty one under that id
    pub async fn hydrate(&self, id: &str, language: &str) -> WorkspaceDraft {
        match self.drafts.load(id).await {
            Some(existing) => {
                tracing::debug!("Resuming draft {}", id);
                existing.into()
            }
            None => WorkspaceDraft::new(id, language),
        }
    }

    /// Persist the editor state locally. Empty drafts are not written.
    pub async fn autosave(&self, draft: &WorkspaceDraft) -> Option<TranscriptDraft> {
        if !draft.has_content() {
            return None;
        }

        match self.drafts.save(draft.to_upsert(None)).await {
            Ok(saved) => {
                tracing::debug!("Autosaved draft {}", saved.id);
                self.events.publish(AppEvent::DraftSaved { id: saved.id.clone() });
                Some(saved)
            }
            Err(e) => {
                tracing::warn!("Failed to autosave transcript draft {}: {}", draft.id, e);
                None
            }
        }
    }

    /// Save the latest editor state on every tick until the sender is dropped
    pub fn spawn_autosave(&self, mut state: watch::Receiver<WorkspaceDraft>) -> JoinHandle<()> {
        let service = self.clone();

        tokio::spawn(async move {
            tracing::info!("Starting draft autosave");

            let mut interval = tokio::time::interval(AUTOSAVE_INTERVAL);
            // The first tick fires immediately
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let draft = state.borrow().clone();
                        service.autosave(&draft).await;
                    }
                    changed = state.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }

            let last = state.borrow().clone();
            service.autosave(&last).await;
            tracing::info!("Draft autosave stopped");
        })
    }

    /// Send the transcript to the cloud, then keep the local copy as a
    /// short-lived backup
    pub async fn save_to_cloud(&self, draft: &WorkspaceDraft) -> CloudSaveOutcome {
        if draft.transcript.trim().is_empty() {
            self.notifications.info("Nothing to save yet. Type some text first.");
            return CloudSaveOutcome::NothingToSave;
        }

        if let Err(e) = self.transcripts.create(&draft.to_payload()).await {
            tracing::error!("Failed to save transcript {}: {}", draft.id, e);
            self.notifications.error("Failed to save transcript. Please try again.");
            return CloudSaveOutcome::Failed;
        }

        self.notifications.success("Transcript saved to cloud");

        if let Err(e) = self.drafts.save(draft.to_upsert(Some(DraftStatus::Saved))).await {
            tracing::warn!("Failed to mark draft {} as saved: {}", draft.id, e);
        }

        CloudSaveOutcome::Saved
    }

    /// Drop the local draft. Cloud transcripts are untouched.
    pub async fn discard(&self, id: &str) {
        self.drafts.delete(id).await;
        self.notifications.success("Draft deleted");
    }

    /// Unsaved drafts to offer for resuming, newest first
    pub async fn list_drafts(&self, language: &str) -> Vec<TranscriptDraft> {
        self.drafts.list(language).await
    }

    pub async fn cleanup(&self) -> u64 {
        self.drafts.cleanup_expired().await
    }

    pub async fn load_draft(&self, id: &str) -> Option<TranscriptDraft> {
        self.drafts.load(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiClient;
    use crate::clock::{Clock, ManualClock};
    use crate::database::{initialize_database, Repository};
    use crate::services::TokenStore;
    use chrono::{Duration, Utc};
    use serde_json::json;
    use sqlx::sqlite::SqlitePoolOptions;
    use std::sync::Arc;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn create_test_service(server: &MockServer) -> (WorkspaceService, DraftStore, Arc<ManualClock>) {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        initialize_database(&pool).await.unwrap();
        let repo = Repository::new(pool);

        let clock = Arc::new(ManualClock::new(Utc::now()));
        let drafts = DraftStore::new(repo.clone(), clock.clone());
        let client = ApiClient::new(&server.uri(), TokenStore::new(repo)).unwrap();
        let events = EventBus::new();

        let service = WorkspaceService::new(
            drafts.clone(),
            TranscriptsApi::new(client),
            NotificationService::new(events.clone()),
            events,
        );
        (service, drafts, clock)
    }

    fn sample_draft() -> WorkspaceDraft {
        WorkspaceDraft {
            transcript: "bonjour tout le monde".to_string(),
            notes: vec!["liaison".to_string(), "nasal vowels".to_string()],
            ..WorkspaceDraft::new("w1", "fr")
        }
    }

    #[tokio::test]
    async fn test_empty_draft_not_autosaved() {
        let server = MockServer::start().await;
        let (service, drafts, _clock) = create_test_service(&server).await;

        let draft = WorkspaceDraft::new("w0", "fr");
        assert!(service.autosave(&draft).await.is_none());
        assert!(drafts.load("w0").await.is_none());
    }

    #[tokio::test]
    async fn test_autosave_failure_is_swallowed() {
        let server = MockServer::start().await;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        initialize_database(&pool).await.unwrap();
        let repo = Repository::new(pool.clone());
        let client = ApiClient::new(&server.uri(), TokenStore::new(repo.clone())).unwrap();
        let events = EventBus::new();
        let service = WorkspaceService::new(
            DraftStore::with_system_clock(repo),
            TranscriptsApi::new(client),
            NotificationService::new(events.clone()),
            events,
        );

        pool.close().await;

        assert!(service.autosave(&sample_draft()).await.is_none());
        assert!(service.list_drafts("fr").await.is_empty());
        let draft = service.hydrate("w1", "fr").await;
        assert!(!draft.has_content());
    }

    #[tokio::test]
    async fn test_hydrate_resumes_autosaved_draft() {
        let server = MockServer::start().await;
        let (service, _drafts, _clock) = create_test_service(&server).await;

        let saved = service.autosave(&sample_draft()).await.unwrap();
        assert_eq!(saved.status, DraftStatus::Draft);
        assert_eq!(saved.title, "Dictation practice");

        let resumed = service.hydrate("w1", "fr").await;
        assert_eq!(resumed, sample_draft());

        let fresh = service.hydrate("other", "en").await;
        assert_eq!(fresh, WorkspaceDraft::new("other", "en"));
    }

    #[tokio::test]
    async fn test_save_to_cloud_marks_local_copy_saved() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/web/transcripts"))
            .and(body_partial_json(json!({
                "language": "fr",
                "transcript": "bonjour tout le monde",
                "notes": "liaison\nnasal vowels",
                "comments": null
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "data": { "id": "t1", "language": "fr" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (service, drafts, clock) = create_test_service(&server).await;
        let draft = sample_draft();
        service.autosave(&draft).await.unwrap();

        assert_eq!(service.save_to_cloud(&draft).await, CloudSaveOutcome::Saved);

        let local = drafts.load("w1").await.unwrap();
        assert_eq!(local.status, DraftStatus::Saved);
        assert_eq!(
            local.expires_at.timestamp_millis(),
            (clock.now() + Duration::days(1)).timestamp_millis()
        );
        assert!(service.list_drafts("fr").await.is_empty());
    }

    #[tokio::test]
    async fn test_blank_transcript_not_sent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let (service, _drafts, _clock) = create_test_service(&server).await;
        let draft = WorkspaceDraft {
            notes: vec!["only notes".to_string()],
            ..WorkspaceDraft::new("w2", "fr")
        };

        assert_eq!(service.save_to_cloud(&draft).await, CloudSaveOutcome::NothingToSave);
    }

    #[tokio::test]
    async fn test_cloud_failure_keeps_draft() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/web/transcripts"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let (service, drafts, _clock) = create_test_service(&server).await;
        let draft = sample_draft();
        service.autosave(&draft).await.unwrap();

        assert_eq!(service.save_to_cloud(&draft).await, CloudSaveOutcome::Failed);
        assert_eq!(drafts.load("w1").await.unwrap().status, DraftStatus::Draft);
        assert_eq!(service.list_drafts("fr").await.len(), 1);
    }

    #[tokio::test]
    async fn test_spawn_autosave_saves_on_close() {
        let server = MockServer::start().await;
        let (service, drafts, _clock) = create_test_service(&server).await;

        let (tx, rx) = watch::channel(WorkspaceDraft::new("w3", "fr"));
        let handle = service.spawn_autosave(rx);

        tx.send_modify(|d| d.transcript = "je suis là".to_string());
        drop(tx);
        handle.await.unwrap();

        assert_eq!(drafts.load("w3").await.unwrap().transcript, "je suis là");
    }

    #[test]
    fn test_started_drafts_get_distinct_ids() {
        let a = WorkspaceDraft::start("fr");
        let b = WorkspaceDraft::start("fr");

        assert_ne!(a.id, b.id);
        assert_eq!(a.title, "Dictation practice");
        assert!(!a.has_content());
    }

    #[tokio::test]
    async fn test_discard_removes_local_draft() {
        let server = MockServer::start().await;
        let (service, drafts, _clock) = create_test_service(&server).await;
        service.autosave(&sample_draft()).await.unwrap();

        service.discard("w1").await;

        assert!(drafts.load("w1").await.is_none());
    }
}
