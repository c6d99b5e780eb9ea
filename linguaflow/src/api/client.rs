//! Generic JSON client for the learning API
//!
//! Every response is wrapped in an envelope:
//! `{ "status": "success" | "error", "data"?, "error"?, "message"? }`.
//! A 401 maps to [`AppError::Unauthorized`]; any other non-2xx status or
//! an error envelope maps to [`AppError::Api`]. Requests are not retried.

use crate::config::DEFAULT_API_TIMEOUT_SECS;
use crate::error::{AppError, Result};
use crate::services::TokenStore;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct Envelope {
    status: Option<String>,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl Envelope {
    /// Best message for a failed call: `error`, then `message`
    fn failure_message(&self) -> Option<String> {
        self.error
            .clone()
            .or_else(|| self.message.clone())
            .filter(|m| !m.trim().is_empty())
    }
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    tokens: TokenStore,
}

impl ApiClient {
    pub fn new(base_url: &str, tokens: TokenStore) -> Result<Self> {
        Self::with_timeout(base_url, tokens, Duration::from_secs(DEFAULT_API_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: &str, tokens: TokenStore, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(concat!("linguaflow/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let req = self.request(Method::GET, path).await.query(query);
        self.send(Method::GET, path, req).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let req = self.request(Method::POST, path).await.json(body);
        self.send(Method::POST, path, req).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let req = self.request(Method::PUT, path).await.json(body);
        self.send(Method::PUT, path, req).await
    }

    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let req = self.request(Method::PATCH, path).await.json(body);
        self.send(Method::PATCH, path, req).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let req = self.request(Method::DELETE, path).await.query(query);
        self.send(Method::DELETE, path, req).await
    }

    /// Build a request with the stored bearer token, read fresh each call
    async fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let req = self.http.request(method, url);

        match self.tokens.get().await {
            Ok(Some(token)) => req.header(AUTHORIZATION, format!("Bearer {}", token)),
            Ok(None) => req,
            Err(e) => {
                tracing::warn!("Failed to read auth token: {}", e);
                req
            }
        }
    }

    async fn send<T: DeserializeOwned>(&self, method: Method, path: &str, req: RequestBuilder) -> Result<T> {
        tracing::debug!("{} {}", method, path);

        let response = req.send().await.map_err(|e| {
            tracing::error!("{} {} failed: {}", method, path, e);
            AppError::Transport(e)
        })?;

        let status = response.status();
        let body = response.text().await?;

        decode_response(status, &body).inspect_err(|e| {
            tracing::error!("{} {} returned {}: {}", method, path, status.as_u16(), e);
        })
    }
}

/// Map status code and raw body to the unwrapped `data` payload
fn decode_response<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T> {
    if status == StatusCode::UNAUTHORIZED {
        return Err(AppError::Unauthorized);
    }

    let envelope: Option<Envelope> = if body.trim().is_empty() {
        None
    } else {
        serde_json::from_str(body).ok()
    };

    if !status.is_success() {
        let message = envelope
            .as_ref()
            .and_then(Envelope::failure_message)
            .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()));
        return Err(AppError::Api {
            status: status.as_u16(),
            message,
        });
    }

    // 204 and friends carry no envelope at all
    let Some(envelope) = envelope else {
        if body.trim().is_empty() {
            return Ok(serde_json::from_value(Value::Null)?);
        }
        return Err(AppError::Api {
            status: status.as_u16(),
            message: "Malformed response body".to_string(),
        });
    };

    match envelope.status.as_deref() {
        Some("success") => Ok(serde_json::from_value(envelope.data.unwrap_or(Value::Null))?),
        Some("error") => Err(AppError::Api {
            status: status.as_u16(),
            message: envelope
                .failure_message()
                .unwrap_or_else(|| "API request failed".to_string()),
        }),
        _ => Err(AppError::Api {
            status: status.as_u16(),
            message: "Invalid response status".to_string(),
        }),
    }
}
