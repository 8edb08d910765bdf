//! Shared HTTP plumbing for every quote source.

use crate::error::Error;
use crate::types::TokenStatus;
use reqwest::header::{ACCEPT, CACHE_CONTROL, HeaderMap, HeaderValue, PRAGMA};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::trace;
use url::Url;

#[cfg(test)]
mod tests;

/// Per-request timeout applied to every vendor call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(12);

/// Longest response excerpt carried into an error message.
const BODY_EXCERPT_LEN: usize = 200;

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Request timeout.
    pub timeout: Duration,
    /// User-Agent header sent with every request.
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: concat!("options-paper-desk/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// How a request proves its identity to a vendor.
#[derive(Clone, Default)]
pub enum Auth {
    /// Public endpoint.
    #[default]
    None,
    /// `Authorization: Bearer <token>`.
    Bearer(String),
    /// Token carried as a query parameter.
    Query {
        /// Parameter name, e.g. `apiKey`.
        param: &'static str,
        /// Token value.
        value: String,
    },
    /// Token carried in custom headers.
    Headers(Vec<(&'static str, String)>),
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Token values stay out of debug output.
        match self {
            Self::None => write!(f, "Auth::None"),
            Self::Bearer(_) => write!(f, "Auth::Bearer(..)"),
            Self::Query { param, .. } => write!(f, "Auth::Query({})", param),
            Self::Headers(headers) => {
                let names: Vec<&str> = headers.iter().map(|(name, _)| *name).collect();
                write!(f, "Auth::Headers({:?})", names)
            }
        }
    }
}

/// Thin wrapper around [`reqwest::Client`] with the desk's defaults baked in:
/// fixed timeout and no-cache request headers.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a new client with the given configuration.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: &HttpConfig) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/csv, */*"));

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()?;

        Ok(Self { client })
    }

    /// Creates a client with default configuration.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn with_defaults() -> Result<Self, Error> {
        Self::new(&HttpConfig::default())
    }

    /// GETs `url` and decodes a JSON body.
    ///
    /// # Errors
    /// `Unauthorized` on 401/403, `Network` on other non-success statuses or
    /// transport failure, `Parse` when the body is not the expected JSON.
    pub async fn get_json<T: DeserializeOwned>(&self, url: Url, auth: &Auth) -> Result<T, Error> {
        let body = self.get_text(url, auth).await?;
        serde_json::from_str(&body).map_err(Error::from)
    }

    /// GETs `url` and returns the raw body.
    ///
    /// # Errors
    /// Same classification as [`HttpClient::get_json`], minus decoding.
    pub async fn get_text(&self, url: Url, auth: &Auth) -> Result<String, Error> {
        let resp = self.request(url, auth).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        classify_status(status, &body)?;
        Ok(body)
    }

    /// Performs one authorized request and reports whether the vendor
    /// accepted the credentials.
    ///
    /// # Errors
    /// `Network` for transport failures or statuses other than 200/401/403.
    pub async fn probe_token(&self, url: Url, auth: &Auth) -> Result<TokenStatus, Error> {
        let resp = self.request(url, auth).send().await?;
        let status = resp.status();
        if status == StatusCode::OK {
            return Ok(TokenStatus::Valid);
        }
        let body = resp.text().await.unwrap_or_default();
        match classify_status(status, &body) {
            Err(Error::Unauthorized(reason)) => Ok(TokenStatus::Invalid { reason }),
            Err(e) => Err(e),
            Ok(()) => Err(Error::Network(format!("unexpected HTTP {}", status.as_u16()))),
        }
    }

    fn request(&self, mut url: Url, auth: &Auth) -> RequestBuilder {
        if let Auth::Query { param, value } = auth {
            url.query_pairs_mut().append_pair(param, value);
        }
        trace!(host = url.host_str().unwrap_or_default(), path = url.path(), "GET");

        let builder = self.client.get(url);
        match auth {
            Auth::Bearer(token) => builder.bearer_auth(token),
            Auth::Headers(headers) => headers
                .iter()
                .fold(builder, |b, (name, value)| b.header(*name, value)),
            Auth::None | Auth::Query { .. } => builder,
        }
    }
}

/// Maps an HTTP status onto the quote error taxonomy.
///
/// # Errors
/// `Unauthorized` for 401/403 and `Network` for any other non-success status.
pub fn classify_status(status: StatusCode, body: &str) -> Result<(), Error> {
    if status.is_success() {
        return Ok(());
    }
    let detail = format!("HTTP {}: {}", status.as_u16(), excerpt(body));
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(Error::Unauthorized(detail)),
        _ => Err(Error::Network(detail)),
    }
}

fn excerpt(body: &str) -> &str {
    let body = body.trim();
    match body.char_indices().nth(BODY_EXCERPT_LEN) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

/// Joins `path` onto `base` and appends query pairs.
///
/// # Errors
/// Returns `Network` when the resulting URL is malformed.
pub fn endpoint(base: &str, path: &str, query: &[(&str, &str)]) -> Result<Url, Error> {
    let mut url = Url::parse(&format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    ))?;
    if !query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (k, v) in query {
            pairs.append_pair(k, v);
        }
    }
    Ok(url)
}
