//! HTTP client for the results service
//!
//! Each logical resource (athlete history, athlete profile, race results) is
//! an ordered list of URL templates. [`ResultsClient::fetch`] walks the list,
//! retrying transient failures against the same URL with exponential backoff,
//! and stops at the first template that answers with a non-empty JSON
//! document.

use super::source::{FetchOutcome, PerformanceSource};
use crate::config::{EndpointConfig, RetryConfig, UpstreamConfig};
use crate::domain::{AthleteId, FetchError, RaceId, Result, SwimbestError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, ORIGIN, REFERER, USER_AGENT};
use reqwest::{Client, ClientBuilder, StatusCode};
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Placeholder substituted with the athlete id
pub const ATHLETE_PLACEHOLDER: &str = "{athlete_id}";

/// Placeholder substituted with the race id
pub const RACE_PLACEHOLDER: &str = "{race_id}";

/// Results service client
///
/// Cheap to share: the underlying `reqwest::Client` pools connections and
/// every method takes `&self`.
///
/// # Example
///
/// ```no_run
/// use swimbest::adapters::results::ResultsClient;
/// use swimbest::config::UpstreamConfig;
/// use swimbest::domain::RaceId;
///
/// # async fn example() -> swimbest::domain::Result<()> {
/// let client = ResultsClient::new(&UpstreamConfig::default())?;
/// let outcome = client.fetch_race(&RaceId::new("4725").unwrap()).await?;
/// println!("found: {}", outcome.is_found());
/// # Ok(())
/// # }
/// ```
pub struct ResultsClient {
    client: Client,
    base_url: Url,
    retry: RetryConfig,
    endpoints: EndpointConfig,
}

impl ResultsClient {
    /// Create a client from upstream configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the base URL or a header value is
    /// invalid, or the HTTP client cannot be built.
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let base_url = Url::parse(&format!("{}/", config.base_url.trim_end_matches('/')))
            .map_err(|e| {
                SwimbestError::Configuration(format!(
                    "Invalid upstream.base_url '{}': {}",
                    config.base_url, e
                ))
            })?;

        let mut headers = HeaderMap::new();
        insert_header(&mut headers, USER_AGENT, &config.user_agent)?;
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(origin) = &config.origin {
            insert_header(&mut headers, ORIGIN, origin)?;
        }
        if let Some(referer) = &config.referer {
            insert_header(&mut headers, REFERER, referer)?;
        }

        let client = ClientBuilder::new()
            .default_headers(headers)
            .timeout(config.timeout())
            .connect_timeout(Duration::from_secs(config.timeout_seconds.min(30)))
            .build()
            .map_err(|e| {
                SwimbestError::Configuration(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            base_url,
            retry: config.retry.clone(),
            endpoints: config.endpoints.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Try `templates` in order with `placeholder` replaced by `value`
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Unreachable`] when every template that resolved to
    /// a URL failed with a retryable error (transport, timeout, 429, 5xx)
    /// after retries. Definitive
    /// answers (404, other 4xx, empty or non-JSON bodies) only move on to the
    /// next template and end in [`FetchOutcome::NotFound`].
    pub async fn fetch(
        &self,
        templates: &[String],
        placeholder: &str,
        value: &str,
    ) -> std::result::Result<FetchOutcome, FetchError> {
        let mut resolved = 0;
        let mut unreachable = 0;
        let mut last_error = None;

        for template in templates {
            let url = match self.resolve(template, placeholder, value) {
                Ok(url) => url,
                Err(e) => {
                    tracing::warn!(template = %template, error = %e, "Skipping endpoint template");
                    continue;
                }
            };
            resolved += 1;

            match self.retry_request(|| self.get_json(&url)).await {
                Ok(payload) => {
                    tracing::debug!(url = %url, "Endpoint returned data");
                    return Ok(FetchOutcome::Found {
                        payload,
                        endpoint: template.clone(),
                    });
                }
                Err(e) if e.is_retryable() => {
                    tracing::warn!(url = %url, error = %e, "Endpoint unreachable after retries");
                    unreachable += 1;
                    last_error = Some(e);
                }
                Err(e) => {
                    tracing::debug!(url = %url, error = %e, "Endpoint has no data, trying next");
                }
            }
        }

        match last_error {
            Some(e) if unreachable == resolved => Err(FetchError::Unreachable {
                attempted: unreachable,
                last_error: e.to_string(),
            }),
            _ => Ok(FetchOutcome::NotFound),
        }
    }

    /// Fetch the results payload of an open-water race
    pub async fn fetch_race(
        &self,
        race_id: &RaceId,
    ) -> std::result::Result<FetchOutcome, FetchError> {
        self.fetch(
            &self.endpoints.race_results,
            RACE_PLACEHOLDER,
            race_id.as_str(),
        )
        .await
    }

    /// Absolute URL for `template` with the placeholder filled in
    fn resolve(
        &self,
        template: &str,
        placeholder: &str,
        value: &str,
    ) -> std::result::Result<Url, FetchError> {
        let filled = template.replace(placeholder, &encode_path_value(value));
        let url = if filled.starts_with("http://") || filled.starts_with("https://") {
            Url::parse(&filled)
        } else {
            self.base_url.join(filled.trim_start_matches('/'))
        };
        url.map_err(|e| FetchError::InvalidEndpoint(format!("{template}: {e}")))
    }

    /// One GET; only a non-empty JSON object or array counts as success
    async fn get_json(&self, url: &Url) -> std::result::Result<Value, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let status = response.status();
        if status.is_server_error() {
            let message = response.text().await.unwrap_or_default();
            return Err(FetchError::ServerError {
                status: status.as_u16(),
                message: truncate(&message),
            });
        }
        if status != StatusCode::OK {
            let message = response.text().await.unwrap_or_default();
            return Err(FetchError::ClientError {
                status: status.as_u16(),
                message: truncate(&message),
            });
        }

        let body = response.text().await.map_err(|e| transport_error(&e))?;
        if body.trim().is_empty() {
            return Err(FetchError::InvalidResponse("empty body".to_string()));
        }
        let payload: Value = serde_json::from_str(&body)
            .map_err(|e| FetchError::InvalidResponse(format!("body is not JSON: {e}")))?;

        let non_empty = match &payload {
            Value::Object(map) => !map.is_empty(),
            Value::Array(items) => !items.is_empty(),
            _ => false,
        };
        if !non_empty {
            return Err(FetchError::InvalidResponse(
                "empty JSON document".to_string(),
            ));
        }
        Ok(payload)
    }

    /// Retry a request with exponential backoff
    ///
    /// Only retryable errors are retried; `max_retries` bounds the total
    /// number of attempts.
    async fn retry_request<F, T, Fut>(&self, operation: F) -> std::result::Result<T, FetchError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = std::result::Result<T, FetchError>>,
    {
        let max_retries = self.retry.max_retries;
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    attempt += 1;
                    if !e.is_retryable() || attempt >= max_retries {
                        return Err(e);
                    }

                    let delay = self.retry.delay_for_attempt(attempt);
                    crate::log_retry_attempt!(attempt, max_retries, &e);
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

#[async_trait]
impl PerformanceSource for ResultsClient {
    /// History templates first, then profile templates
    async fn fetch_athlete(
        &self,
        athlete_id: &AthleteId,
    ) -> std::result::Result<FetchOutcome, FetchError> {
        let templates: Vec<String> = self
            .endpoints
            .athlete_history
            .iter()
            .chain(&self.endpoints.athlete_profile)
            .cloned()
            .collect();
        self.fetch(&templates, ATHLETE_PLACEHOLDER, athlete_id.as_str())
            .await
    }

    fn name(&self) -> &str {
        self.base_url.as_str()
    }
}

fn insert_header(
    headers: &mut HeaderMap,
    name: HeaderName,
    value: &str,
) -> Result<()> {
    let header_value = HeaderValue::from_str(value).map_err(|e| {
        SwimbestError::Configuration(format!("Invalid {name} header value '{value}': {e}"))
    })?;
    headers.insert(name, header_value);
    Ok(())
}

/// Percent-encode an id for use inside a URL path
fn encode_path_value(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

fn transport_error(error: &reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout(error.to_string())
    } else {
        FetchError::ConnectionFailed(error.to_string())
    }
}

fn truncate(message: &str) -> String {
    const LIMIT: usize = 200;
    match message.char_indices().nth(LIMIT) {
        Some((idx, _)) => format!("{}...", &message[..idx]),
        None => message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(base_url: &str) -> UpstreamConfig {
        UpstreamConfig {
            base_url: base_url.to_string(),
            retry: RetryConfig {
                max_retries: 2,
                initial_delay_ms: 1,
                max_delay_ms: 5,
                backoff_multiplier: 2.0,
            },
            endpoints: EndpointConfig {
                athlete_history: vec!["athletes/{athlete_id}/results".to_string()],
                athlete_profile: vec!["athlete/{athlete_id}".to_string()],
                race_results: vec!["events/{race_id}".to_string()],
            },
            ..Default::default()
        }
    }

    fn athlete(id: &str) -> AthleteId {
        AthleteId::new(id).unwrap()
    }

    #[test]
    fn test_resolve_joins_relative_templates_to_base() {
        let client = ResultsClient::new(&config("https://api.example.com/fina")).unwrap();
        let url = client
            .resolve("athletes/{athlete_id}/results", ATHLETE_PLACEHOLDER, "1003542")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.com/fina/athletes/1003542/results"
        );
    }

    #[test]
    fn test_resolve_percent_encodes_values() {
        let client = ResultsClient::new(&config("https://api.example.com/fina/")).unwrap();
        let url = client
            .resolve("/athletes/{athlete_id}", ATHLETE_PLACEHOLDER, "a b/c")
            .unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/fina/athletes/a%20b%2Fc");
    }

    #[test]
    fn test_resolve_accepts_absolute_templates() {
        let client = ResultsClient::new(&config("https://api.example.com/fina")).unwrap();
        let url = client
            .resolve("https://mirror.example.org/events/{race_id}", RACE_PLACEHOLDER, "4725")
            .unwrap();
        assert_eq!(url.as_str(), "https://mirror.example.org/events/4725");
    }

    #[test]
    fn test_invalid_header_is_configuration_error() {
        let mut cfg = config("https://api.example.com");
        cfg.user_agent = "bad\nagent".to_string();
        assert!(matches!(
            ResultsClient::new(&cfg),
            Err(SwimbestError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_second_endpoint_used_after_404() {
        let mut server = mockito::Server::new_async().await;
        let missing = server
            .mock("GET", "/athletes/1003542/results")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;
        let profile = server
            .mock("GET", "/athlete/1003542")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"results":[{"event":"400m Freestyle LCM","time":"3:48.00","date":"2025-07-01"}]}"#)
            .expect(1)
            .create_async()
            .await;

        let client = ResultsClient::new(&config(&server.url())).unwrap();
        let outcome = client.fetch_athlete(&athlete("1003542")).await.unwrap();

        match outcome {
            FetchOutcome::Found { payload, endpoint } => {
                assert_eq!(endpoint, "athlete/{athlete_id}");
                assert_eq!(payload["results"][0]["time"], json!("3:48.00"));
            }
            FetchOutcome::NotFound => panic!("expected payload from second endpoint"),
        }
        missing.assert_async().await;
        profile.assert_async().await;
    }

    #[tokio::test]
    async fn test_empty_documents_are_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _history = server
            .mock("GET", "/athletes/7/results")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;
        let _profile = server
            .mock("GET", "/athlete/7")
            .with_status(200)
            .with_body("")
            .create_async()
            .await;

        let client = ResultsClient::new(&config(&server.url())).unwrap();
        let outcome = client.fetch_athlete(&athlete("7")).await.unwrap();
        assert_eq!(outcome, FetchOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_server_errors_are_retried_then_unreachable() {
        let mut server = mockito::Server::new_async().await;
        let history = server
            .mock("GET", "/athletes/9/results")
            .with_status(503)
            .expect(2)
            .create_async()
            .await;
        let profile = server
            .mock("GET", "/athlete/9")
            .with_status(500)
            .expect(2)
            .create_async()
            .await;

        let client = ResultsClient::new(&config(&server.url())).unwrap();
        let err = client.fetch_athlete(&athlete("9")).await.unwrap_err();

        assert!(matches!(err, FetchError::Unreachable { attempted: 2, .. }));
        history.assert_async().await;
        profile.assert_async().await;
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let history = server
            .mock("GET", "/athletes/3/results")
            .with_status(403)
            .expect(1)
            .create_async()
            .await;
        let profile = server
            .mock("GET", "/athlete/3")
            .with_status(503)
            .expect(2)
            .create_async()
            .await;

        let client = ResultsClient::new(&config(&server.url())).unwrap();
        let outcome = client.fetch_athlete(&athlete("3")).await.unwrap();

        // one definitive answer means the athlete is not unreachable
        assert_eq!(outcome, FetchOutcome::NotFound);
        history.assert_async().await;
        profile.assert_async().await;
    }

    #[tokio::test]
    async fn test_malformed_template_does_not_mask_unreachable_endpoints() {
        let mut server = mockito::Server::new_async().await;
        let history = server
            .mock("GET", "/athletes/11/results")
            .with_status(503)
            .expect(2)
            .create_async()
            .await;

        let mut cfg = config(&server.url());
        cfg.endpoints.athlete_profile = vec!["http://[::1/{athlete_id}".to_string()];
        let client = ResultsClient::new(&cfg).unwrap();
        let err = client.fetch_athlete(&athlete("11")).await.unwrap_err();

        assert!(matches!(err, FetchError::Unreachable { attempted: 1, .. }));
        history.assert_async().await;
    }

    #[tokio::test]
    async fn test_only_malformed_templates_is_not_found() {
        let mut cfg = config("https://api.example.com");
        cfg.endpoints.athlete_history = vec!["http://[::1/{athlete_id}".to_string()];
        cfg.endpoints.athlete_profile = Vec::new();
        let client = ResultsClient::new(&cfg).unwrap();

        let outcome = client.fetch_athlete(&athlete("11")).await.unwrap();
        assert_eq!(outcome, FetchOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_fetch_race_uses_race_templates() {
        let mut server = mockito::Server::new_async().await;
        let race = server
            .mock("GET", "/events/4725")
            .with_status(200)
            .with_body(r#"{"Heats":[{"Results":[]}]}"#)
            .create_async()
            .await;

        let client = ResultsClient::new(&config(&server.url())).unwrap();
        let outcome = client
            .fetch_race(&RaceId::new("4725").unwrap())
            .await
            .unwrap();
        assert!(outcome.is_found());
        race.assert_async().await;
    }
}
