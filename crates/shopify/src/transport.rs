//! GraphQL transport: the seam between the accessor and the wire.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;

use crate::pace::Pacer;

/// Admin API version pinned for all requests.
const API_VERSION: &str = "2025-04";

/// Default per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Transport-level failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Connection-level failure (DNS, reset, refused).
    #[error("network error: {0}")]
    Network(String),

    /// The request exceeded its timeout.
    #[error("request timed out")]
    Timeout,

    /// Non-success HTTP status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Top-level GraphQL `errors` array in an otherwise-successful response.
    #[error("API error: {0}")]
    Api(String),

    /// Response body was not the JSON shape the API promises.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl TransportError {
    /// Whether a retry could plausibly succeed.
    ///
    /// Rate-limit and server-side statuses are retryable; semantic API errors
    /// and malformed bodies are definitive.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout => true,
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            Self::Api(_) | Self::Malformed(_) => false,
        }
    }
}

/// Executes one GraphQL operation against one store.
///
/// Implementations return the response's `data` value with top-level GraphQL
/// errors already surfaced as [`TransportError::Api`]. Tests substitute an
/// in-memory fake.
#[async_trait]
pub trait GraphqlTransport: Send + Sync {
    async fn execute(&self, query: &str, variables: Value) -> Result<Value, TransportError>;
}

/// A store's resolved connection identity: domain plus an already-resolved
/// access token. Credential resolution happens in the configuration phase,
/// never here.
#[derive(Debug, Clone)]
pub struct StoreCredentials {
    pub domain: String,
    pub access_token: String,
}

impl StoreCredentials {
    pub fn new(domain: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            access_token: access_token.into(),
        }
    }
}

/// Production transport over HTTPS, one instance per store.
///
/// Owns its own [`Pacer`], so request pacing is per-store state rather than a
/// process-wide singleton.
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
    access_token: String,
    pacer: Pacer,
}

impl HttpTransport {
    pub fn new(credentials: StoreCredentials, pacer: Pacer) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!(
                "https://{}/admin/api/{API_VERSION}/graphql.json",
                credentials.domain
            ),
            access_token: credentials.access_token,
            pacer,
        })
    }
}

#[async_trait]
impl GraphqlTransport for HttpTransport {
    async fn execute(&self, query: &str, variables: Value) -> Result<Value, TransportError> {
        self.pacer.wait().await;

        let response = self
            .client
            .post(&self.endpoint)
            .header("X-Shopify-Access-Token", &self.access_token)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout
                } else {
                    TransportError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let mut body: Value = response
            .json()
            .await
            .map_err(|e| TransportError::Malformed(e.to_string()))?;

        if let Some(errors) = body.get("errors").and_then(Value::as_array) {
            if !errors.is_empty() {
                let joined = errors
                    .iter()
                    .map(|err| {
                        err.get("message")
                            .and_then(Value::as_str)
                            .unwrap_or("unknown error")
                            .to_string()
                    })
                    .collect::<Vec<_>>()
                    .join("; ");
                return Err(TransportError::Api(joined));
            }
        }

        match body.get_mut("data") {
            Some(data) => Ok(data.take()),
            None => Err(TransportError::Malformed(
                "response body has no data field".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification_follows_error_kind() {
        assert!(TransportError::Network("reset".into()).is_retryable());
        assert!(TransportError::Timeout.is_retryable());
        assert!(TransportError::Http {
            status: 429,
            body: String::new()
        }
        .is_retryable());
        assert!(TransportError::Http {
            status: 503,
            body: String::new()
        }
        .is_retryable());
        assert!(!TransportError::Http {
            status: 401,
            body: String::new()
        }
        .is_retryable());
        assert!(!TransportError::Api("bad query".into()).is_retryable());
        assert!(!TransportError::Malformed("truncated".into()).is_retryable());
    }
}
