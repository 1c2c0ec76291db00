//! # HTTP Retrieval Utilities
//!
//! Asynchronous API client wrapper around `reqwest`, with exponential backoff
//! retries on transient failures and standardized response handling.

use std::time::Duration;

use anyhow::Context;
use reqwest::{
    header::{HeaderMap, AUTHORIZATION, CONTENT_TYPE},
    Method, Url,
};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::{de::DeserializeOwned, Serialize};

/// Default number of retries for transient failures.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// A standardized container for API responses.
///
/// Wraps the deserialized data along with metadata about the HTTP transaction.
#[derive(Debug)]
pub struct ApiResponse<T> {
    /// The successfully deserialized response body, if any.
    pub data: Option<T>,
    /// The raw error body returned by the server if the request failed.
    pub error_body: Option<String>,
    /// The numeric HTTP status code.
    pub status: u16,
    /// Indicates if the status code was in the 2xx range.
    pub success: bool,
    /// The headers returned by the server.
    pub headers: HeaderMap,
}

/// Tuning knobs for [`ApiClient`].
#[derive(Debug, Clone, Copy)]
pub struct ApiClientOptions {
    /// Timeout applied to every request.
    pub timeout: Duration,
    /// Retries on transient failures (connect errors, 5xx, 429). Zero disables retries.
    pub max_retries: u32,
}

impl Default for ApiClientOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

/// A flexible asynchronous HTTP client.
///
/// Built on top of `reqwest_middleware`, it handles base URLs,
/// authentication tokens, and automatic retries.
#[derive(Clone)]
pub struct ApiClient {
    /// The underlying middleware-enabled client.
    inner: ClientWithMiddleware,
    /// The base URL to which all relative paths are joined.
    base_url: Url,
    /// An optional Bearer token used for authorization.
    auth_token: Option<String>,
}

impl ApiClient {
    /// Creates a client with the default retry policy and timeout.
    ///
    /// # Arguments
    /// * `base_url` - The absolute base URL for the API (e.g., "http://127.0.0.1:9003").
    /// * `auth_token` - An optional string for the Authorization header.
    ///
    /// # Errors
    /// Returns an error if `base_url` is not a valid absolute URL.
    pub fn new(base_url: &str, auth_token: Option<String>) -> anyhow::Result<Self> {
        Self::with_options(base_url, auth_token, ApiClientOptions::default())
    }

    /// Creates a client with explicit timeout and retry settings.
    pub fn with_options(base_url: &str, auth_token: Option<String>, options: ApiClientOptions) -> anyhow::Result<Self> {
        // A trailing slash keeps the last path segment when joining endpoints.
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let url = Url::parse(&normalized).with_context(|| format!("Invalid base URL (must be absolute): {base_url}"))?;

        let http = reqwest::Client::builder()
            .timeout(options.timeout)
            .build()
            .context("Failed to build HTTP client")?;

        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(options.max_retries);
        let client = ClientBuilder::new(http)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            inner: client,
            base_url: url,
            auth_token,
        })
    }

    /// The normalized base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn send<B>(
        &self,
        method: Method,
        path: &str,
        headers: Option<HeaderMap>,
        body: Option<B>,
    ) -> anyhow::Result<reqwest::Response>
    where
        B: Serialize,
    {
        let full_url = self.base_url.join(path)?;
        tracing::debug!(%method, url = %full_url, "Sending HTTP request");
        let mut req = self.inner.request(method, full_url);

        if let Some(h) = headers {
            req = req.headers(h);
        }

        if let Some(token) = &self.auth_token {
            req = req.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        if let Some(b) = body {
            let json_body = serde_json::to_string(&b)?;
            req = req.header(CONTENT_TYPE, "application/json").body(json_body);
        }

        let response: reqwest::Response = req.send().await?;
        Ok(response)
    }

    /// Performs a request and deserializes a successful JSON body into `T`.
    ///
    /// # Arguments
    /// * `method` - The HTTP verb (GET, POST, etc.).
    /// * `path` - The relative path to append to the base URL.
    /// * `headers` - Optional additional headers for this specific request.
    /// * `body` - Optional serializable object to send as the JSON body.
    ///
    /// # Errors
    /// Returns an `anyhow::Error` if URL joining, network execution or decoding fails.
    /// Non-2xx statuses are not errors; they come back with `success == false`.
    pub async fn request<T, B>(
        &self,
        method: Method,
        path: &str,
        headers: Option<HeaderMap>,
        body: Option<B>,
    ) -> anyhow::Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
        B: Serialize,
    {
        let response = self.send(method, path, headers, body).await?;
        let status = response.status();
        let resp_headers = response.headers().clone();

        if status.is_success() {
            let data = response.json::<T>().await?;
            Ok(ApiResponse {
                data: Some(data),
                error_body: None,
                status: status.as_u16(),
                success: true,
                headers: resp_headers,
            })
        } else {
            let error_text = response.text().await.ok();
            tracing::warn!(status = status.as_u16(), "HTTP request returned an error status");
            Ok(ApiResponse {
                data: None,
                error_body: error_text,
                status: status.as_u16(),
                success: false,
                headers: resp_headers,
            })
        }
    }

    /// Like [`request`](Self::request) but keeps the body as raw text, for
    /// endpoints that answer with an empty or non-JSON body.
    pub async fn request_text<B>(
        &self,
        method: Method,
        path: &str,
        headers: Option<HeaderMap>,
        body: Option<B>,
    ) -> anyhow::Result<ApiResponse<String>>
    where
        B: Serialize,
    {
        let response = self.send(method, path, headers, body).await?;
        let status = response.status();
        let resp_headers = response.headers().clone();
        let text = response.text().await?;

        if status.is_success() {
            Ok(ApiResponse {
                data: Some(text),
                error_body: None,
                status: status.as_u16(),
                success: true,
                headers: resp_headers,
            })
        } else {
            Ok(ApiResponse {
                data: None,
                error_body: Some(text),
                status: status.as_u16(),
                success: false,
                headers: resp_headers,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// One-shot HTTP server answering every request with `response`.
    async fn serve_once(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let _ = socket.write_all(response.as_bytes()).await;
            }
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_invalid_base_url_is_an_error() {
        assert!(ApiClient::new("not a url", None).is_err());
    }

    #[test]
    fn test_base_url_keeps_path_segment() {
        let client = ApiClient::new("http://localhost:9003/api", None).unwrap();
        assert_eq!(
            client.base_url().join("SpectrumStatus").unwrap().as_str(),
            "http://localhost:9003/api/SpectrumStatus"
        );
    }

    #[tokio::test]
    async fn test_request_decodes_json() {
        let base = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 11\r\nConnection: close\r\n\r\n{\"ok\":true}",
        )
        .await;
        let client = ApiClient::new(&base, None).unwrap();
        let resp: ApiResponse<serde_json::Value> = client.request(Method::GET, "ping", None, None::<()>).await.unwrap();
        assert!(resp.success);
        assert_eq!(resp.data.unwrap()["ok"], true);
    }

    #[tokio::test]
    async fn test_client_error_is_reported_not_raised() {
        let base = serve_once(
            "HTTP/1.1 400 Bad Request\r\nContent-Length: 4\r\nConnection: close\r\n\r\nnope",
        )
        .await;
        let client = ApiClient::new(&base, None).unwrap();
        let resp = client.request_text(Method::POST, "act", None, None::<()>).await.unwrap();
        assert!(!resp.success);
        assert_eq!(resp.status, 400);
        assert_eq!(resp.error_body.as_deref(), Some("nope"));
    }
}
