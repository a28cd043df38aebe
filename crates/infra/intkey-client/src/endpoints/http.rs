//! Contains the [`HttpEndpointClient`] struct, an HTTP-based endpoint client.

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use super::{ClientConfig, ServiceEndpointClient};
use crate::{ClientError, TransactionId, TransactionRequest, TransactionStatus};

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    #[serde(default)]
    id: Option<TransactionId>,
}

/// HTTP client for one integer-key validator endpoint.
#[derive(Debug)]
pub struct HttpEndpointClient {
    /// Endpoint URL as configured.
    url: String,
    /// Base URL with a trailing slash, used to resolve routes.
    base: Url,
    /// HTTP client.
    client: reqwest::Client,
    /// Client configuration.
    config: ClientConfig,
}

impl HttpEndpointClient {
    /// Create a new HTTP endpoint client.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL does not parse or the HTTP client fails to build.
    pub fn new(url: impl Into<String>, config: ClientConfig) -> Result<Self, ClientError> {
        let url = url.into();
        let base = Url::parse(&format!("{}/", url.trim_end_matches('/')))
            .map_err(|source| ClientError::InvalidUrl { url: url.clone(), source })?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl {
                url,
                source: url::ParseError::RelativeUrlWithCannotBeABaseBase,
            });
        }
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::Builder(e.to_string()))?;

        Ok(Self { url, base, client, config })
    }

    fn route(&self, path: &str) -> Result<Url, ClientError> {
        self.base
            .join(path)
            .map_err(|source| ClientError::InvalidUrl { url: self.url.clone(), source })
    }

    /// Route of a single transaction. The id is percent-encoded as one path segment.
    fn transaction_route(&self, id: &TransactionId) -> Result<Url, ClientError> {
        let mut route = self.route("transaction")?;
        route
            .path_segments_mut()
            .map_err(|()| ClientError::InvalidUrl {
                url: self.url.clone(),
                source: url::ParseError::RelativeUrlWithCannotBeABaseBase,
            })?
            .push(id.as_str());
        Ok(route)
    }

    fn http_error(&self, source: reqwest::Error) -> ClientError {
        ClientError::Http { url: self.url.clone(), source }
    }

    fn decode_error(&self, reason: impl ToString) -> ClientError {
        ClientError::Decode { url: self.url.clone(), reason: reason.to_string() }
    }

    async fn do_query_status(&self, id: &TransactionId) -> Result<TransactionStatus, ClientError> {
        let route = self.transaction_route(id)?;
        let response = self.client.get(route).send().await.map_err(|e| self.http_error(e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(TransactionStatus::Unknown);
        }
        if !status.is_success() {
            return Err(ClientError::Status { url: self.url.clone(), status: status.as_u16() });
        }

        let body = response.text().await.map_err(|e| self.http_error(e))?;
        if body.trim().is_empty() {
            return Ok(TransactionStatus::Committed);
        }

        let value: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| self.decode_error(e))?;
        match value.get("status") {
            Some(status) => {
                serde_json::from_value(status.clone()).map_err(|e| self.decode_error(e))
            }
            None => Ok(TransactionStatus::Committed),
        }
    }
}

#[async_trait]
impl ServiceEndpointClient for HttpEndpointClient {
    fn url(&self) -> &str {
        &self.url
    }

    async fn submit(
        &self,
        request: TransactionRequest,
    ) -> Result<Option<TransactionId>, ClientError> {
        let route = self.route("transaction")?;
        let response =
            self.client.post(route).json(&request).send().await.map_err(|e| self.http_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status { url: self.url.clone(), status: status.as_u16() });
        }

        let body: SubmitResponse = response.json().await.map_err(|e| self.decode_error(e))?;
        debug!(
            endpoint = %self.url,
            key = %request.key,
            op = %request.operation,
            id = ?body.id,
            "submitted transaction"
        );
        Ok(body.id)
    }

    async fn query_status(&self, id: &TransactionId) -> TransactionStatus {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match self.do_query_status(id).await {
                Ok(status) => return status,
                Err(e) if e.is_transient() && attempt < self.config.max_retries => {
                    debug!(endpoint = %self.url, %id, attempt, error = %e, "retrying status query");
                    tokio::time::sleep(self.config.backoff(attempt)).await;
                    last_error = Some(e);
                }
                Err(e) => {
                    last_error = Some(e);
                    break;
                }
            }
        }

        if let Some(e) = last_error {
            warn!(endpoint = %self.url, %id, error = %e, "status query failed, reporting unknown");
        }
        TransactionStatus::Unknown
    }

    async fn fetch_state(&self) -> Result<BTreeMap<String, i64>, ClientError> {
        let route = self.route("state")?;
        let response = self.client.get(route).send().await.map_err(|e| self.http_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status { url: self.url.clone(), status: status.as_u16() });
        }

        response.json().await.map_err(|e| self.decode_error(e))
    }

    async fn refresh_cache(&self) -> Result<(), ClientError> {
        let state = self.fetch_state().await?;
        debug!(endpoint = %self.url, keys = state.len(), "refreshed endpoint view");
        Ok(())
    }
}
