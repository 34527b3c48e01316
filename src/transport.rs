//! The HTTP boundary to the dashboard backend.
//!
//! Everything above this module talks to the backend through the
//! [`Transport`] trait, so the orchestration logic can be exercised without
//! a network. [`HttpTransport`] is the production implementation: plain
//! request/response JSON over the configured base URL. There is no retry,
//! no streaming, no pagination, and no authentication.

use async_trait::async_trait;
use serde_json::Value;

use crate::config::Config;
use crate::error::ApiError;

/// Request/response access to the backend API.
#[async_trait]
pub trait Transport: Send + Sync {
    /// `GET {base}{path}` and return the decoded JSON body.
    async fn get(&self, path: &str) -> Result<Value, ApiError>;

    /// `POST {base}{path}` with a JSON body and return the decoded JSON body.
    async fn post(&self, path: &str, body: Value) -> Result<Value, ApiError>;
}

/// [`Transport`] backed by `reqwest`.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self {
            client,
            base_url: config.api.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn read(response: reqwest::Response) -> Result<Value, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &str) -> Result<Value, ApiError> {
        tracing::debug!(path, "GET");
        let response = self.client.get(self.url(path)).send().await?;
        Self::read(response).await
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        tracing::debug!(path, "POST");
        let response = self.client.post(self.url(path)).json(&body).send().await?;
        Self::read(response).await
    }
}
