use super::client::ApiClient;
use super::models::{Transcript, TranscriptPayload};
use crate::error::Result;

/// Cloud transcript endpoints used by the workspace
#[derive(Clone)]
pub struct TranscriptsApi {
    client: ApiClient,
}

impl TranscriptsApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// `POST /web/transcripts`
    pub async fn create(&self, payload: &TranscriptPayload) -> Result<Transcript> {
        self.client.post("/web/transcripts", payload).await
    }

    /// `DELETE /web/transcripts/{id}`
    pub async fn delete(&self, transcript_id: &str, language: &str) -> Result<()> {
        self.client
            .delete(
                &format!("/web/transcripts/{}", transcript_id),
                &[("language", language.to_string())],
            )
            .await
    }
}
