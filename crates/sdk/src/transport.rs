//! HTTP transport: one batch, one POST, classified failure.

use crate::error::CatalogError;
use crate::observation::Observation;
use tracing::debug;

/// Builds the observations endpoint for a context. `base_url` has already
/// had any trailing slash stripped at init.
pub(crate) fn observations_url(base_url: &str, context_id: &str) -> String {
    format!("{base_url}/catalog/contexts/{context_id}/observations")
}

/// Sends a single batch. Success is any 2xx; everything else becomes a
/// `CatalogError` for the sink. No retries in the fire-and-forget engine.
pub(crate) async fn send_batch(
    http: &reqwest::Client,
    url: &str,
    batch: &[Observation],
) -> Result<(), CatalogError> {
    let response = http
        .post(url)
        .json(batch)
        .send()
        .await
        .map_err(classify_send_error)?;

    let status = response.status();
    if status.is_success() {
        debug!(count = batch.len(), url, "posted observation batch");
        return Ok(());
    }

    let body = response.text().await.unwrap_or_default();
    Err(CatalogError::Api {
        status: status.as_u16(),
        body,
    })
}

fn classify_send_error(err: reqwest::Error) -> CatalogError {
    if err.is_timeout() {
        CatalogError::Timeout(err)
    } else {
        CatalogError::Network(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_building() {
        assert_eq!(
            observations_url("https://catalog.example.com", "deposits"),
            "https://catalog.example.com/catalog/contexts/deposits/observations"
        );
    }
}
