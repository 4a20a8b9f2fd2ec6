//! Raw HTTP access to the v3 API.

use crate::error::{RestError, RestResult};
use reqwest::{Client, Url};
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Default base URL of the public v3 API.
pub const DEFAULT_BASE_URL: &str = "https://api.bittrex.com/v3/";

/// Default timeout for API requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// GETs a path relative to the API base and returns the response body.
pub trait Fetch: Send + Sync {
    fn fetch(&self, path: &str) -> impl Future<Output = RestResult<Vec<u8>>> + Send;
}

/// Error body returned by the API, e.g. `{"code":"MARKET_DOES_NOT_EXIST"}`.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: String,
}

/// `reqwest`-backed [`Fetch`].
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    base_url: Url,
}

impl HttpFetcher {
    pub fn new() -> RestResult<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, DEFAULT_TIMEOUT)
    }

    /// # Arguments
    /// * `base_url` - API root; a trailing slash is added when missing
    /// * `timeout` - per-request timeout
    pub fn with_base_url(base_url: &str, timeout: Duration) -> RestResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RestError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let base_url = Url::parse(&normalized)
            .map_err(|e| RestError::HttpClient(format!("Invalid base URL {normalized}: {e}")))?;

        Ok(Self { client, base_url })
    }

    pub fn url(&self, path: &str) -> RestResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| RestError::HttpClient(format!("Invalid path {path}: {e}")))
    }
}

impl Fetch for HttpFetcher {
    async fn fetch(&self, path: &str) -> RestResult<Vec<u8>> {
        let url = self.url(path)?;
        debug!(%url, "GET");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RestError::HttpClient(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| RestError::HttpClient(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            let code = serde_json::from_slice::<ApiErrorBody>(&body)
                .map(|err| err.code)
                .unwrap_or_else(|_| String::from_utf8_lossy(&body).into_owned());
            warn!(path, status = status.as_u16(), %code, "API request failed");
            return Err(RestError::Api {
                status: status.as_u16(),
                code,
            });
        }

        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_join_keeps_version_prefix() {
        let fetcher = HttpFetcher::new().unwrap();
        let url = fetcher.url("markets/BTC-USD/orderbook?depth=25").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.bittrex.com/v3/markets/BTC-USD/orderbook?depth=25"
        );
    }

    #[test]
    fn test_base_url_without_trailing_slash() {
        let fetcher =
            HttpFetcher::with_base_url("http://localhost:8080/v3", Duration::from_secs(1)).unwrap();
        assert_eq!(
            fetcher.url("ping").unwrap().as_str(),
            "http://localhost:8080/v3/ping"
        );
    }
}
