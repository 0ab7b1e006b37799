//! TMDB REST client

use crate::config::ApiSettings;
use crate::error::{AppError, Result};
use crate::tmdb::types::{ApiErrorBody, DiscoverPage, RawMovie};
use crate::tmdb::MovieCatalog;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Exponent cap for backoff doubling.
const MAX_BACKOFF_SHIFT: u32 = 6;

/// HTTP client for the TMDB API.
///
/// Issues one request at a time, authenticates via the `api_key` query
/// parameter, and retries transient failures (timeouts, 5xx, 429) with
/// bounded exponential backoff. 401/403 and other 4xx responses fail
/// immediately.
pub struct TmdbClient {
    client: Client,
    base_url: String,
    api_key: String,
    sort_by: String,
    max_retries: u32,
    retry_base_delay: Duration,
}

impl TmdbClient {
    pub fn new(api: &ApiSettings, sort_by: &str, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(api.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: api.base_url.trim_end_matches('/').to_string(),
            api_key,
            sort_by: sort_by.to_string(),
            max_retries: api.max_retries,
            retry_base_delay: Duration::from_millis(api.retry_base_delay_ms),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, params: &[(&str, String)]) -> Result<T> {
        with_retries(self.max_retries, self.retry_base_delay, || {
            self.get_json_once(url, params)
        })
        .await
    }

    async fn get_json_once<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let response = self
            .client
            .get(url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let message = response
            .json::<ApiErrorBody>()
            .await
            .ok()
            .and_then(|body| body.status_message)
            .unwrap_or_else(|| format!("HTTP {}", status));

        Err(classify_status(status, message))
    }
}

#[async_trait]
impl MovieCatalog for TmdbClient {
    async fn discover_page(&self, page: u32) -> Result<DiscoverPage> {
        let url = format!("{}/discover/movie", self.base_url);
        self.get_json(
            &url,
            &[
                ("sort_by", self.sort_by.clone()),
                ("page", page.to_string()),
            ],
        )
        .await
    }

    async fn movie_details(&self, movie_id: u64) -> Result<RawMovie> {
        let url = format!("{}/movie/{}", self.base_url, movie_id);
        self.get_json(&url, &[("append_to_response", "credits".to_string())])
            .await
    }
}

/// Run `op`, retrying transient failures with exponential backoff.
///
/// `max_retries` counts retries after the initial attempt. Non-transient
/// errors pass through untouched; an exhausted retry budget surfaces as
/// [`AppError::Fetch`].
pub(crate) async fn with_retries<T, F, Fut>(
    max_retries: u32,
    base_delay: Duration,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < max_retries => {
                let delay = backoff_delay(base_delay, attempt);
                warn!(
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    "Transient fetch failure, retrying: {}",
                    e
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) if e.is_transient() => {
                return Err(AppError::Fetch(format!(
                    "Giving up after {} attempts: {}",
                    attempt + 1,
                    e
                )));
            }
            Err(e) => return Err(e),
        }
    }
}

/// Map an HTTP error status to the error taxonomy.
///
/// 401/403 mean a bad or missing key. 429 is the API shedding load and is
/// retried; every other 4xx is a permanent rejection of the request.
fn classify_status(status: StatusCode, message: String) -> AppError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AppError::Auth(message),
        StatusCode::TOO_MANY_REQUESTS => {
            AppError::Transient(format!("HTTP {}: {}", status.as_u16(), message))
        }
        s if s.is_client_error() => AppError::Request(message),
        s => AppError::Transient(format!("HTTP {}: {}", s.as_u16(), message)),
    }
}

/// Delay before retry number `attempt` (0-based): base * 2^attempt, capped.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base * 2u32.saturating_pow(attempt.min(MAX_BACKOFF_SHIFT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn unauthorized_is_auth_error() {
        let err = classify_status(StatusCode::UNAUTHORIZED, "invalid key".to_string());
        assert!(matches!(err, AppError::Auth(_)));
        assert!(!err.is_transient());
    }

    #[test]
    fn not_found_is_request_error() {
        let err = classify_status(StatusCode::NOT_FOUND, "no such movie".to_string());
        assert!(matches!(err, AppError::Request(_)));
        assert!(!err.is_transient());
    }

    #[test]
    fn server_errors_and_rate_limits_are_transient() {
        for status in [
            StatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::BAD_GATEWAY,
            StatusCode::SERVICE_UNAVAILABLE,
            StatusCode::TOO_MANY_REQUESTS,
        ] {
            let err = classify_status(status, "busy".to_string());
            assert!(err.is_transient(), "{} should be transient", status);
        }
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let base = Duration::from_millis(100);
        assert_eq!(backoff_delay(base, 0), Duration::from_millis(100));
        assert_eq!(backoff_delay(base, 1), Duration::from_millis(200));
        assert_eq!(backoff_delay(base, 3), Duration::from_millis(800));
        // exponent capped at 2^6
        assert_eq!(backoff_delay(base, 10), Duration::from_millis(6400));
        assert_eq!(backoff_delay(base, 40), Duration::from_millis(6400));
    }

    #[tokio::test]
    async fn retries_transient_failures_until_success() {
        let calls = AtomicU32::new(0);
        let result = with_retries(3, Duration::from_millis(1), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(AppError::Transient("HTTP 503: busy".to_string()))
                } else {
                    Ok(7u32)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn auth_errors_are_never_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<u32> = with_retries(3, Duration::from_millis(1), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(AppError::Auth("invalid key".to_string())) }
        })
        .await;

        assert!(matches!(result.unwrap_err(), AppError::Auth(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausted_budget_surfaces_fetch_error() {
        let calls = AtomicU32::new(0);
        let result: Result<u32> = with_retries(2, Duration::from_millis(1), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(AppError::Transient("HTTP 500: boom".to_string())) }
        })
        .await;

        assert!(matches!(result.unwrap_err(), AppError::Fetch(_)));
        // initial attempt + 2 retries
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
