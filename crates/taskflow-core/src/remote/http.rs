//! HTTP document-store client.
//!
//! Documents live at `{base_url}/users/{user_id}/data/{key}`. `GET` returns the
//! snapshot JSON (404 when absent), `PATCH` merge-writes it, `DELETE` removes
//! it. Change subscriptions are implemented by polling.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tokio::sync::mpsc;

use super::{RemoteError, RemoteEvent, RemoteResult, RemoteStore};
use crate::config::RemoteConfig;
use crate::models::Snapshot;
use crate::util::{compact_text, is_http_url, normalize_text_option};

const HTTP_TIMEOUT_SECS: u64 = 10;

/// `RemoteStore` speaking JSON over HTTP.
#[derive(Clone)]
pub struct HttpRemoteStore {
    base_url: String,
    api_key: Option<String>,
    poll_interval: Duration,
    client: reqwest::Client,
}

impl std::fmt::Debug for HttpRemoteStore {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("HttpRemoteStore")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

impl HttpRemoteStore {
    /// Build a client from remote configuration.
    ///
    /// `poll_interval` controls how often subscriptions re-fetch documents.
    pub fn new(config: &RemoteConfig, poll_interval: Duration) -> RemoteResult<Self> {
        let base_url = normalize_base_url(&config.base_url)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .map_err(|error| RemoteError::Api(format!("failed to build HTTP client: {error}")))?;

        Ok(Self {
            base_url,
            api_key: normalize_text_option(config.api_key.clone()),
            poll_interval,
            client,
        })
    }

    fn document_url(&self, user_id: &str, key: &str) -> String {
        format!(
            "{}/users/{}/data/{}",
            self.base_url,
            urlencoding::encode(user_id),
            urlencoding::encode(key)
        )
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn fetch(&self, user_id: &str, key: &str) -> RemoteResult<Option<Snapshot>> {
        let response = self
            .authorize(self.client.get(self.document_url(user_id, key)))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_response(status, &body));
        }

        let body = response.text().await.map_err(transport_error)?;
        parse_snapshot(&body).map(Some)
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn get(&self, user_id: &str, key: &str) -> RemoteResult<Option<Snapshot>> {
        self.fetch(user_id, key).await
    }

    async fn upsert_merge(
        &self,
        user_id: &str,
        key: &str,
        snapshot: &Snapshot,
    ) -> RemoteResult<()> {
        let response = self
            .authorize(self.client.patch(self.document_url(user_id, key)))
            .json(snapshot)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(classify_response(status, &body))
    }

    async fn delete(&self, user_id: &str, key: &str) -> RemoteResult<()> {
        let response = self
            .authorize(self.client.delete(self.document_url(user_id, key)))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(classify_response(status, &body))
    }

    async fn subscribe(
        &self,
        user_id: &str,
        key: &str,
        events: mpsc::UnboundedSender<RemoteEvent>,
    ) -> RemoteResult<()> {
        let store = self.clone();
        let user_id = user_id.to_string();
        let key = key.to_string();

        tokio::spawn(async move {
            let interval = store.poll_interval;
            poll_changes(|| store.fetch(&user_id, &key), interval, &events).await;
            tracing::debug!("Stopped polling {user_id}/{key}");
        });

        Ok(())
    }
}

/// Re-fetch a document every `interval` and forward version changes.
///
/// Stops after the first fetch error (sent as `Failed`) or once the receiver
/// is dropped. Absent documents produce no event.
async fn poll_changes<F, Fut>(
    mut fetch: F,
    interval: Duration,
    events: &mpsc::UnboundedSender<RemoteEvent>,
) where
    F: FnMut() -> Fut,
    Fut: Future<Output = RemoteResult<Option<Snapshot>>>,
{
    let mut last_version = None;
    loop {
        match fetch().await {
            Ok(Some(snapshot)) => {
                if last_version != Some(snapshot.version) {
                    last_version = Some(snapshot.version);
                    if events.send(RemoteEvent::Changed(snapshot)).is_err() {
                        return;
                    }
                }
            }
            Ok(None) => {}
            Err(error) => {
                let _ = events.send(RemoteEvent::Failed(error));
                return;
            }
        }

        tokio::select! {
            () = events.closed() => return,
            () = tokio::time::sleep(interval) => {}
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
}

/// Map a non-success HTTP response to a `RemoteError`.
fn classify_response(status: StatusCode, body: &str) -> RemoteError {
    let message = parse_api_error(status, body);
    match status.as_u16() {
        401 | 403 => RemoteError::PermissionDenied(message),
        408 | 429 | 500..=599 => RemoteError::Unavailable(message),
        _ => RemoteError::Api(message),
    }
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{trimmed} ({})", status.as_u16())
    }
}

fn transport_error(error: reqwest::Error) -> RemoteError {
    if let Some(status) = error.status() {
        return classify_response(status, "");
    }
    if error.is_decode() {
        return RemoteError::InvalidPayload(error.to_string());
    }
    RemoteError::Unavailable(error.to_string())
}

fn parse_snapshot(body: &str) -> RemoteResult<Snapshot> {
    serde_json::from_str(body)
        .map_err(|error| RemoteError::InvalidPayload(format!("{error}: {}", compact_text(body))))
}

fn normalize_base_url(raw: &str) -> RemoteResult<String> {
    let url = normalize_text_option(Some(raw.to_string()))
        .ok_or_else(|| RemoteError::Api("remote base URL must not be empty".to_string()))?;
    if is_http_url(&url) {
        Ok(url.trim_end_matches('/').to_string())
    } else {
        Err(RemoteError::Api(
            "remote base URL must include http:// or https://".to_string(),
        ))
    }
}
