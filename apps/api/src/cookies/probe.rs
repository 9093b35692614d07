use async_trait::async_trait;
use reqwest::{header, redirect, Client, StatusCode};
use thiserror::Error;

/// Browser-like User-Agent sent with every probe; some origins reject
/// requests that identify as a bot outright.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Transport-level probe failure. Classification absorbs this into an
/// invalid verdict; it never reaches the API caller as an error.
#[derive(Debug, Error)]
#[error("probe transport failure: {0}")]
pub struct ProbeError(pub String);

impl From<reqwest::Error> for ProbeError {
    fn from(e: reqwest::Error) -> Self {
        ProbeError(e.to_string())
    }
}

/// The slice of an HTTP response the verdict classifier needs.
#[derive(Debug, Clone)]
pub struct ProbeResponse {
    pub status: StatusCode,
    /// `Location` header, present on redirects.
    pub location: Option<String>,
    /// Response body, fetched for 2xx responses only.
    pub body: String,
}

/// Outbound HTTP probe against a target site.
///
/// Kept behind a trait so validation flows can be exercised without the
/// network.
#[async_trait]
pub trait SiteProbe: Send + Sync {
    /// Issues a GET to `url` with `cookie_header` attached as the request's
    /// `Cookie:` header. `Err` covers transport failures only; any response
    /// from the server, whatever its status, is `Ok`.
    async fn fetch(&self, url: &str, cookie_header: &str) -> Result<ProbeResponse, ProbeError>;
}

/// The real probe, backed by reqwest.
///
/// Redirects are NOT followed: a 3xx must be observed directly so the
/// classifier can inspect where it points.
pub struct HttpProbe {
    client: Client,
}

impl HttpProbe {
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(timeout_secs))
                .redirect(redirect::Policy::none())
                .user_agent(USER_AGENT)
                .build()
                .expect("Failed to build HTTP client"),
        }
    }
}

#[async_trait]
impl SiteProbe for HttpProbe {
    async fn fetch(&self, url: &str, cookie_header: &str) -> Result<ProbeResponse, ProbeError> {
        let response = self
            .client
            .get(url)
            .header(header::COOKIE, cookie_header)
            .send()
            .await?;

        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let body = if status.is_success() {
            response.text().await.unwrap_or_default()
        } else {
            String::new()
        };

        Ok(ProbeResponse {
            status,
            location,
            body,
        })
    }
}
