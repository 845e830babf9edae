//! API client for the test generation workflow.
//!
//! Unlike the fire-and-forget SDK engine, this client surfaces errors
//! and retries transient failures: context management raises, submission
//! returns a typed result instead.

use anyhow::Context;
use ceremony_catalog_sdk::{Extractor, Metadata, Observation};
use serde_json::json;
use std::time::Duration;
use tap::TapFallible;
use tracing::{debug, instrument, warn};

use crate::meta::ContextConfig;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Result of an observation submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionResult {
    pub success: bool,
    pub observation_count: usize,
    pub error_message: Option<String>,
}

impl SubmissionResult {
    fn ok(observation_count: usize) -> Self {
        Self {
            success: true,
            observation_count,
            error_message: None,
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            observation_count: 0,
            error_message: Some(message.into()),
        }
    }
}

/// Synchronous-style catalog API client with bounded retry.
pub struct TestGenApiClient {
    http: reqwest::Client,
    base_url: String,
    max_retries: u32,
    retry_delay: Duration,
    extractor: Extractor,
}

impl TestGenApiClient {
    /// Creates a client with the default timeout (30s) and retry policy
    /// (3 attempts, linear backoff starting at 1s).
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        Self::with_options(base_url, DEFAULT_TIMEOUT, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY)
    }

    pub fn with_options(
        base_url: impl Into<String>,
        timeout: Duration,
        max_retries: u32,
        retry_delay: Duration,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        let base_url: String = base_url.into();
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries: max_retries.max(1),
            retry_delay,
            extractor: Extractor::default(),
        })
    }

    /// Whether the API answers its health endpoint.
    #[instrument(name = "testgen.client.health_check", skip(self), fields(base_url = %self.base_url))]
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/actuator/health", self.base_url);
        match self.http.get(&url).send().await {
            Ok(response) => response.status() == reqwest::StatusCode::OK,
            Err(_) => false,
        }
    }

    /// Whether a context exists.
    #[instrument(name = "testgen.client.context_exists", skip(self), fields(context_id = %context_id))]
    pub async fn context_exists(&self, context_id: &str) -> bool {
        let url = format!("{}/catalog/contexts/{context_id}", self.base_url);
        match self.http.get(&url).send().await {
            Ok(response) => response.status() == reqwest::StatusCode::OK,
            Err(_) => false,
        }
    }

    /// Fetches context details, or `None` when absent or unreachable.
    #[instrument(name = "testgen.client.get_context", skip(self), fields(context_id = %context_id))]
    pub async fn get_context(&self, context_id: &str) -> Option<serde_json::Value> {
        let url = format!("{}/catalog/contexts/{context_id}", self.base_url);
        let response = self.http.get(&url).send().await.ok()?;
        if response.status() != reqwest::StatusCode::OK {
            return None;
        }
        response.json().await.ok()
    }

    /// Creates a context. An already-existing context (409) counts as
    /// success; any other non-201 answer is an error.
    #[instrument(
        name = "testgen.client.create_context",
        skip(self, config),
        fields(context_id = %config.context_id),
        err
    )]
    pub async fn create_context(&self, config: &ContextConfig) -> anyhow::Result<bool> {
        let display_name = if config.display_name.is_empty() {
            config.context_id.clone()
        } else {
            config.display_name.clone()
        };
        let description = if config.description.is_empty() {
            format!("Test context for {}", config.context_id)
        } else {
            config.description.clone()
        };

        let payload = json!({
            "contextId": config.context_id,
            "displayName": display_name,
            "description": description,
            "requiredMetadata": config.required_metadata.keys().collect::<Vec<_>>(),
            "optionalMetadata": config.optional_metadata.keys().collect::<Vec<_>>(),
            "active": true,
        });

        let url = format!("{}/catalog/contexts", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&payload)
            .send()
            .await
            .context("network error creating context")
            .tap_err(|e| warn!("context creation failed: {e:?}"))?;

        match response.status().as_u16() {
            201 => Ok(true),
            409 => {
                debug!("context {} already exists", config.context_id);
                Ok(true)
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                anyhow::bail!("failed to create context: {status} - {body}")
            }
        }
    }

    /// Ensures a context exists, creating it when necessary.
    pub async fn ensure_context_exists(&self, config: &ContextConfig) -> anyhow::Result<bool> {
        if self.context_exists(&config.context_id).await {
            return Ok(true);
        }
        self.create_context(config).await
    }

    /// Deletes a context. Mainly useful for cleaning up test contexts;
    /// deleting an absent context counts as success.
    #[instrument(name = "testgen.client.delete_context", skip(self), fields(context_id = %context_id), err)]
    pub async fn delete_context(&self, context_id: &str) -> anyhow::Result<bool> {
        let url = format!("{}/catalog/contexts/{context_id}", self.base_url);
        let response = self
            .http
            .delete(&url)
            .send()
            .await
            .context("network error deleting context")?;

        match response.status().as_u16() {
            200 | 204 | 404 => Ok(true),
            status => {
                let body = response.text().await.unwrap_or_default();
                anyhow::bail!("failed to delete context: {status} - {body}")
            }
        }
    }

    /// Submits observations with bounded retry: 5xx, timeouts, and
    /// network failures back off linearly (`retry_delay * attempt`);
    /// 4xx never retries.
    #[instrument(
        name = "testgen.client.submit_observations",
        skip(self, observations),
        fields(context_id = %context_id, count = observations.len())
    )]
    pub async fn submit_observations(
        &self,
        context_id: &str,
        observations: &[Observation],
    ) -> SubmissionResult {
        if observations.is_empty() {
            return SubmissionResult::ok(0);
        }

        let url = format!(
            "{}/catalog/contexts/{context_id}/observations",
            self.base_url
        );

        for attempt in 0..self.max_retries {
            let is_last = attempt + 1 == self.max_retries;
            let backoff = self.retry_delay * (attempt + 1);

            let response = match self.http.post(&url).json(observations).send().await {
                Ok(response) => response,
                Err(err) if err.is_timeout() => {
                    if is_last {
                        return SubmissionResult::failed("Request timed out");
                    }
                    tokio::time::sleep(backoff).await;
                    continue;
                }
                Err(err) => {
                    if is_last {
                        return SubmissionResult::failed(format!("Network error: {err}"));
                    }
                    tokio::time::sleep(backoff).await;
                    continue;
                }
            };

            let status = response.status();
            if status.is_success() {
                return SubmissionResult::ok(observations.len());
            }

            let body = response.text().await.unwrap_or_default();
            if status.is_server_error() {
                if is_last {
                    return SubmissionResult::failed(format!(
                        "Server error: {} - {body}",
                        status.as_u16()
                    ));
                }
                tokio::time::sleep(backoff).await;
                continue;
            }
            return SubmissionResult::failed(format!("Client error: {} - {body}", status.as_u16()));
        }

        SubmissionResult::failed("Max retries exceeded")
    }

    /// Extracts observations from an XML document and submits them. Zero
    /// extracted observations is reported as a failure so broken inputs
    /// do not pass silently.
    pub async fn submit_xml_observations(
        &self,
        context_id: &str,
        xml: &str,
        metadata: &Metadata,
    ) -> SubmissionResult {
        let observations = self.extractor.from_str(xml, metadata);
        if observations.is_empty() {
            return SubmissionResult::failed("No observations extracted from XML");
        }
        self.submit_observations(context_id, &observations).await
    }
}
