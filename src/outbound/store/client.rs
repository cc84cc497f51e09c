//! Shared HTTP client for the remote JSON document store.
//!
//! The store exposes collections as REST resources: `{base}/{collection}.json`
//! for the whole collection, `{base}/{collection}/{key}.json` for one
//! document. `POST` to a collection assigns a key and returns it as
//! `{"name": "<key>"}`; equality queries use `orderBy`/`equalTo` parameters
//! whose values are JSON-quoted strings.
//!
//! This client owns transport details only: URL construction, timeout and
//! HTTP error mapping, and JSON decoding. Collection adapters translate the
//! raw documents into domain types.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Failures raised while talking to the document store.
///
/// Collection adapters convert these into their port error types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreClientError {
    #[error("document store unreachable: {message}")]
    Transport { message: String },
    #[error("document store request timed out: {message}")]
    Timeout { message: String },
    #[error("document store payload could not be decoded: {message}")]
    Decode { message: String },
    #[error("document store rejected the request: status {status}: {message}")]
    Status { status: u16, message: String },
}

impl StoreClientError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }
}

/// Body of a successful collection `POST`.
#[derive(Debug, Deserialize)]
struct CreatedDto {
    name: String,
}

/// Reqwest-backed client bound to one store base URL.
#[derive(Clone)]
pub struct DocumentStore {
    client: Client,
    base: Url,
}

impl DocumentStore {
    /// Build a client with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base: Url) -> Result<Self, reqwest::Error> {
        Self::with_timeout(base, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Build a client with a caller-supplied request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn with_timeout(base: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base })
    }

    /// URL for a store node: the final segment gains the `.json` suffix.
    fn node_url(&self, segments: &[&str]) -> Result<Url, StoreClientError> {
        let mut url = self.base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| StoreClientError::transport("store base URL cannot-be-a-base"))?;
            path.pop_if_empty();
            let (last, init) = segments
                .split_last()
                .ok_or_else(|| StoreClientError::transport("store node path is empty"))?;
            path.extend(init);
            path.push(&format!("{last}.json"));
        }
        Ok(url)
    }

    /// Fetch one node. A JSON `null` body means the node is absent.
    pub async fn fetch(&self, segments: &[&str]) -> Result<Option<Value>, StoreClientError> {
        let url = self.node_url(segments)?;
        let value: Value = self.decode(self.client.get(url)).await?;
        Ok((!value.is_null()).then_some(value))
    }

    /// Fetch the documents of `collection` whose `field` equals `value`.
    ///
    /// Returns the raw keyed object (`{}` when nothing matches).
    pub async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Value, StoreClientError> {
        let url = self.node_url(&[collection])?;
        let request = self.client.get(url).query(&[
            ("orderBy", format!("\"{field}\"")),
            ("equalTo", format!("\"{value}\"")),
        ]);
        self.decode(request).await
    }

    /// Append a document to `collection`; the store assigns and returns the key.
    pub async fn create(
        &self,
        collection: &str,
        document: &Value,
    ) -> Result<String, StoreClientError> {
        let url = self.node_url(&[collection])?;
        let created: CreatedDto = self.decode(self.client.post(url).json(document)).await?;
        Ok(created.name)
    }

    /// Merge `document` into an existing node. Absent fields are untouched.
    pub async fn patch(&self, segments: &[&str], document: &Value) -> Result<(), StoreClientError> {
        let url = self.node_url(segments)?;
        self.decode::<Value>(self.client.patch(url).json(document))
            .await?;
        Ok(())
    }

    /// Remove a node. Deleting an absent node succeeds.
    pub async fn delete(&self, segments: &[&str]) -> Result<(), StoreClientError> {
        let url = self.node_url(segments)?;
        self.decode::<Value>(self.client.delete(url)).await?;
        Ok(())
    }

    async fn decode<T>(&self, request: reqwest::RequestBuilder) -> Result<T, StoreClientError>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        serde_json::from_slice(body.as_ref()).map_err(|error| {
            StoreClientError::decode(format!("invalid store JSON payload: {error}"))
        })
    }
}

fn map_transport_error(error: reqwest::Error) -> StoreClientError {
    if error.is_timeout() {
        StoreClientError::timeout(error.to_string())
    } else {
        StoreClientError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> StoreClientError {
    let body_preview = body_preview(body);
    let message = if body_preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        body_preview
    };

    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            StoreClientError::timeout(message)
        }
        _ => StoreClientError::status(status.as_u16(), message),
    }
}

pub(crate) fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
