//! Request helpers shared by the HTTP-backed sources

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::SourceError;

/// Client settings applied to every provider request
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub user_agent: String,
    pub timeout: Duration,
}

impl HttpSettings {
    /// Build a fresh client; sources build one per fetch so nothing is pooled across requests
    pub fn client(&self, provider: &str) -> Result<Client, SourceError> {
        Client::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .build()
            .map_err(|e| SourceError::unavailable(provider, format!("failed to create HTTP client: {e}")))
    }
}

/// GET a JSON document, mapping transport and status failures to `Unavailable`
/// and undecodable bodies to `Schema`
pub async fn get_json<T: DeserializeOwned>(
    client: &Client,
    provider: &str,
    url: &str,
) -> Result<T, SourceError> {
    debug!("{} request URL: {}", provider, url);

    let response = client
        .get(url)
        .header("Accept", "application/geo+json, application/json")
        .send()
        .await
        .map_err(|e| SourceError::unavailable(provider, format!("request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let snippet: String = body.chars().take(200).collect();
        return Err(SourceError::unavailable(
            provider,
            format!("HTTP {status}: {snippet}"),
        ));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| SourceError::schema(provider, format!("failed to decode response: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> HttpSettings {
        HttpSettings {
            user_agent: "OneWeather/test".to_string(),
            timeout: Duration::from_secs(2),
        }
    }

    #[test]
    fn test_client_creation() {
        assert!(settings().client("openmeteo").is_ok());
    }

    #[tokio::test]
    async fn test_connection_failure_is_unavailable() {
        let client = settings().client("openmeteo").unwrap();
        let result: Result<serde_json::Value, _> =
            get_json(&client, "openmeteo", "http://127.0.0.1:1/forecast").await;
        assert!(matches!(result, Err(SourceError::Unavailable { .. })));
    }
}
