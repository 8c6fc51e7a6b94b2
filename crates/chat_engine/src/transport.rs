use std::time::Duration;

use chat_core::{ChatReply, Source};
use chat_logging::{chat_debug, chat_warn};
use futures_util::StreamExt;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("http status {0}")]
    HttpStatus(u16),
    #[error("invalid response: {0}")]
    InvalidShape(String),
    #[error("network error: {0}")]
    NetworkFailure(String),
}

#[derive(Debug, Clone)]
pub struct TransportSettings {
    pub connect_timeout: Duration,
    /// Whole-request timeout. `None` leaves requests bounded only by the connection.
    pub request_timeout: Option<Duration>,
    pub max_response_bytes: u64,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: None,
            max_response_bytes: 2 * 1024 * 1024,
        }
    }
}

#[async_trait::async_trait]
pub trait ChatTransport: Send + Sync {
    /// Posts `query` to `url` and validates the answer.
    async fn send_query(&self, url: &str, query: &str) -> Result<ChatReply, TransportError>;

    /// Probes `url`; true only for a 2xx response. Never fails.
    async fn check_health(&self, url: &str) -> bool;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    query: &'a str,
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    settings: TransportSettings,
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(settings: TransportSettings) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder().connect_timeout(settings.connect_timeout);
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| TransportError::NetworkFailure(err.to_string()))?;
        Ok(Self { settings, client })
    }

    async fn read_body(&self, response: reqwest::Response) -> Result<Vec<u8>, TransportError> {
        let max_bytes = self.settings.max_response_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(TransportError::InvalidShape(format!(
                    "response too large ({content_len} bytes, max {max_bytes})"
                )));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|err| TransportError::NetworkFailure(err.to_string()))?;
            if bytes.len() as u64 + chunk.len() as u64 > max_bytes {
                return Err(TransportError::InvalidShape(format!(
                    "response exceeds {max_bytes} bytes"
                )));
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes)
    }
}

#[async_trait::async_trait]
impl ChatTransport for ReqwestTransport {
    async fn send_query(&self, url: &str, query: &str) -> Result<ChatReply, TransportError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|err| TransportError::NetworkFailure(format!("invalid url {url}: {err}")))?;
        let body = serde_json::to_vec(&ChatRequest { query })
            .map_err(|err| TransportError::NetworkFailure(err.to_string()))?;

        let response = self
            .client
            .post(parsed)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|err| TransportError::NetworkFailure(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::HttpStatus(status.as_u16()));
        }

        let bytes = self.read_body(response).await?;
        let reply = parse_chat_reply(&bytes)?;
        chat_debug!(
            "Chat reply: {} chars, {} sources",
            reply.answer.len(),
            reply.sources.len()
        );
        Ok(reply)
    }

    async fn check_health(&self, url: &str) -> bool {
        let Ok(parsed) = reqwest::Url::parse(url) else {
            chat_warn!("Health url is not valid: {}", url);
            return false;
        };
        match self
            .client
            .get(parsed)
            .header(CACHE_CONTROL, "no-store")
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                chat_debug!("Health probe failed: {}", err);
                false
            }
        }
    }
}

/// Accepts a body only if it has a string `answer`, an array `sources` of objects and an
/// object `usage`. Nested fields of the wrong type are treated as absent.
pub fn parse_chat_reply(bytes: &[u8]) -> Result<ChatReply, TransportError> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|err| TransportError::InvalidShape(format!("malformed json: {err}")))?;

    let answer = value
        .get("answer")
        .and_then(Value::as_str)
        .ok_or_else(|| TransportError::InvalidShape("`answer` is not a string".into()))?
        .to_string();

    let raw_sources = value
        .get("sources")
        .and_then(Value::as_array)
        .ok_or_else(|| TransportError::InvalidShape("`sources` is not an array".into()))?;

    let usage = value
        .get("usage")
        .filter(|usage| usage.is_object())
        .ok_or_else(|| TransportError::InvalidShape("`usage` is not an object".into()))?;

    let sources = raw_sources
        .iter()
        .map(|raw| {
            if !raw.is_object() {
                return Err(TransportError::InvalidShape(
                    "`sources` entry is not an object".into(),
                ));
            }
            Ok(source_from_value(raw))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ChatReply {
        answer,
        sources,
        latency_ms: usage.get("latency_ms").and_then(Value::as_f64),
    })
}

fn source_from_value(raw: &Value) -> Source {
    let text = |key: &str| raw.get(key).and_then(Value::as_str).map(str::to_string);
    Source {
        title: text("title"),
        url: text("url").unwrap_or_default(),
        snippet: text("snippet"),
    }
}
