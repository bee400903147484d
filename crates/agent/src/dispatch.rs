//! Endpoint dispatch.
//!
//! Sends one completion request across the ordered candidate endpoints:
//! `Pending → Attempting(i) → {Success | Attempting(i+1)} → Exhausted`.
//! Attempts are strictly sequential so priority order holds and no
//! duplicate billable calls are made; each endpoint gets exactly one try.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use dramwise_core::config::CompletionConfig;
use dramwise_core::{EndpointFailure, PipelineError};

use crate::completion::CompletionRequest;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const FAILURE_DETAIL_LIMIT: usize = 300;

/// One delivery attempt against one endpoint.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TransportFailure {
    #[error("status {status}: {detail}")]
    Status { status: u16, detail: String },
    #[error("network failure: {0}")]
    Network(String),
}

#[async_trait]
pub trait CompletionTransport: Send + Sync {
    async fn send(
        &self,
        endpoint: &str,
        request: &CompletionRequest,
    ) -> Result<Value, TransportFailure>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchState {
    Pending,
    Attempting(usize),
    Success(usize),
    Exhausted,
}

/// Every candidate failed. `attempts` is in attempt order.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("all {} completion endpoints failed", attempts.len())]
pub struct DispatchError {
    pub attempts: Vec<EndpointFailure>,
}

impl From<DispatchError> for PipelineError {
    fn from(value: DispatchError) -> Self {
        Self::UpstreamExhausted(value.attempts)
    }
}

#[derive(Clone, Debug)]
pub struct EndpointDispatcher<T> {
    endpoints: Vec<String>,
    transport: T,
}

impl<T: CompletionTransport> EndpointDispatcher<T> {
    pub fn new(endpoints: Vec<String>, transport: T) -> Self {
        Self { endpoints, transport }
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    pub async fn dispatch(&self, request: &CompletionRequest) -> Result<Value, DispatchError> {
        let mut state = DispatchState::Pending;
        let mut attempts = Vec::new();

        debug!(
            event_name = "pipeline.dispatch.start",
            state = ?state,
            candidates = self.endpoints.len(),
            "dispatch starting"
        );

        for (index, endpoint) in self.endpoints.iter().enumerate() {
            state = DispatchState::Attempting(index);
            debug!(
                event_name = "pipeline.dispatch.attempt",
                state = ?state,
                endpoint = %endpoint,
                "sending completion request"
            );

            match self.transport.send(endpoint, request).await {
                Ok(body) => {
                    state = DispatchState::Success(index);
                    info!(
                        event_name = "pipeline.dispatch.success",
                        state = ?state,
                        endpoint = %endpoint,
                        attempts_failed = attempts.len(),
                        "completion endpoint answered"
                    );
                    return Ok(body);
                }
                Err(failure) => {
                    warn!(
                        event_name = "pipeline.dispatch.failover",
                        state = ?state,
                        endpoint = %endpoint,
                        failure = %failure,
                        "endpoint failed, advancing to next candidate"
                    );
                    attempts.push(EndpointFailure {
                        endpoint: endpoint.clone(),
                        detail: failure.to_string(),
                    });
                }
            }
        }

        state = DispatchState::Exhausted;
        warn!(
            event_name = "pipeline.dispatch.exhausted",
            state = ?state,
            attempts_failed = attempts.len(),
            "no completion endpoint answered"
        );
        Err(DispatchError { attempts })
    }
}

/// Production transport: JSON POST with bearer credential, one shared
/// client with the configured per-attempt timeout. Timeout expiry is
/// indistinguishable from any other network failure downstream.
#[derive(Clone, Debug)]
pub struct HttpCompletionTransport {
    client: reqwest::Client,
    api_key: SecretString,
}

impl HttpCompletionTransport {
    pub fn new(config: &CompletionConfig) -> Result<Self, PipelineError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| {
                PipelineError::Configuration(format!("failed to build http client: {error}"))
            })?;

        Ok(Self { client, api_key: config.api_key.clone() })
    }
}

#[async_trait]
impl CompletionTransport for HttpCompletionTransport {
    async fn send(
        &self,
        endpoint: &str,
        request: &CompletionRequest,
    ) -> Result<Value, TransportFailure> {
        let response = self
            .client
            .post(endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(request)
            .send()
            .await
            .map_err(describe_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(TransportFailure::Status {
                status: status.as_u16(),
                detail: truncate_detail(&detail),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|error| TransportFailure::Network(format!("invalid response body: {error}")))
    }
}

fn describe_reqwest_error(error: reqwest::Error) -> TransportFailure {
    if error.is_timeout() {
        return TransportFailure::Network("request timed out".to_string());
    }
    TransportFailure::Network(error.to_string())
}

fn truncate_detail(detail: &str) -> String {
    if detail.len() <= FAILURE_DETAIL_LIMIT {
        return detail.to_string();
    }
    let mut cut = FAILURE_DETAIL_LIMIT;
    while !detail.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…", &detail[..cut])
}
