use async_trait::async_trait;
use http::StatusCode;
use http::header::CONTENT_TYPE;
use hyper::body::Bytes;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ForwardError {
    #[error("request to {0} failed: {1}")]
    RequestFailed(String, String),
}

/// Delivers one serialized alert group downstream.
#[async_trait]
pub trait Forwarder: Send + Sync {
    /// Posts `body` as JSON to `url` and returns the downstream status.
    ///
    /// Only transport failures are errors; any HTTP status is a completed
    /// delivery.
    async fn forward(&self, url: &Url, body: Bytes) -> Result<StatusCode, ForwardError>;
}

/// Forwarder backed by a shared `reqwest` client. No timeout is set beyond
/// the client's defaults.
#[derive(Clone, Default)]
pub struct HttpForwarder {
    client: reqwest::Client,
}

impl HttpForwarder {
    pub fn new() -> Self {
        HttpForwarder {
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Forwarder for HttpForwarder {
    async fn forward(&self, url: &Url, body: Bytes) -> Result<StatusCode, ForwardError> {
        let response = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| ForwardError::RequestFailed(url.to_string(), e.to_string()))?;

        Ok(response.status())
    }
}
