//! reqwest-backed remote caller.

use async_trait::async_trait;

use crate::caller::RemoteCaller;
use crate::error::RemoteError;
use crate::outcome::{RemoteOutcome, classify};
use crate::request::RemoteRequest;
use crate::retry::{RetryPolicy, retry_transient};

/// Calls collaborators over HTTP, retrying transport faults per [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct HttpRemoteCaller {
    client: reqwest::Client,
    policy: RetryPolicy,
}

impl HttpRemoteCaller {
    /// Builds a caller whose client enforces `policy.timeout` on every attempt.
    pub fn new(policy: RetryPolicy) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(policy.timeout)
            .build()
            .map_err(|e| RemoteError::Client(e.to_string()))?;
        Ok(Self { client, policy })
    }

    /// Uses an existing client; its own timeout settings apply.
    pub fn with_client(client: reqwest::Client, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    async fn send_once(&self, request: &RemoteRequest) -> RemoteOutcome {
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.as_str());
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(endpoint = %request.target(), error = %e, "request failed");
                return RemoteOutcome::TransientNetworkFailure(e.to_string());
            }
        };

        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(endpoint = %request.target(), status, error = %e, "failed reading response body");
                return RemoteOutcome::TransientNetworkFailure(e.to_string());
            }
        };

        let outcome = classify(status, request.expected_status, &body);
        if !outcome.is_success() {
            tracing::warn!(
                endpoint = %request.target(),
                status,
                outcome = outcome.kind(),
                "remote call returned a failure status"
            );
        }
        outcome
    }
}

#[async_trait]
impl RemoteCaller for HttpRemoteCaller {
    #[tracing::instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    async fn call(&self, request: &RemoteRequest) -> RemoteOutcome {
        tracing::debug!(body = ?request.body, "sending request");
        let target = request.target();
        retry_transient(&self.policy, &target, |_| self.send_once(request)).await
    }
}
