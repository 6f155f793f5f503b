//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the downloader, including:
//! - Building the HTTP client with a user agent and timeouts
//! - Applying the per-series request headers to every fetch
//! - Classifying failed responses into an [`ErrorClass`]
//! - Producing the user-facing error messages for failed fetches

use crate::crawler::request::RequestContext;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Message used when a request could not be completed at all
pub const TRANSPORT_FAILURE_MESSAGE: &str = "fetch failed unexpectedly";

/// Default user agent sent with every request
pub const DEFAULT_USER_AGENT: &str = concat!("sturdywcdl/", env!("CARGO_PKG_VERSION"));

/// Classification of a failed fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// 401, 403 and unfollowed redirects (302, 303, 307): usually a missing
    /// authorization header or cookie
    AuthLike,

    /// 500 and 503
    ServerIssue,

    /// 404
    NotFound,

    /// Any other non-success status
    Unknown,

    /// The request never produced a response
    TransportFailure,
}

impl ErrorClass {
    /// Classifies a non-success HTTP status code
    ///
    /// | Status | Class |
    /// |--------|-------|
    /// | 401, 403, 302, 303, 307 | AuthLike |
    /// | 500, 503 | ServerIssue |
    /// | 404 | NotFound |
    /// | anything else | Unknown |
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 | 302 | 303 | 307 => Self::AuthLike,
            500 | 503 => Self::ServerIssue,
            404 => Self::NotFound,
            _ => Self::Unknown,
        }
    }

    /// A hint telling the user what probably went wrong
    ///
    /// These texts are part of the error message format other tools parse.
    pub fn helper_text(&self) -> &'static str {
        match self {
            Self::AuthLike => " - Error fetching url. Check if you need an authorization header, or a required cookie.",
            Self::ServerIssue => " - Error fetching url, it might be because the webcomic server is down. Try again later.",
            Self::NotFound => " - Error fetching url. Check if you have entered a correct url.",
            Self::Unknown => " - There was an unknown error fetching the page. Either the webpage is doing something VERY funny, or you should contact the developer of this software.",
            Self::TransportFailure => TRANSPORT_FAILURE_MESSAGE,
        }
    }
}

/// Builds the message for a failed HTTP response: `http <status>:<helper text>`
pub fn http_error_message(status: u16, helper_text: &str) -> String {
    format!("http {}:{}", status, helper_text)
}

/// A classified fetch failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FetchError {
    /// What kind of failure this was
    pub class: ErrorClass,

    /// HTTP status code, absent for transport failures
    pub status: Option<u16>,

    /// User-facing message
    pub message: String,
}

impl FetchError {
    /// Error for a response with a non-success status
    pub fn http(status: u16) -> Self {
        let class = ErrorClass::from_status(status);
        Self {
            class,
            status: Some(status),
            message: http_error_message(status, class.helper_text()),
        }
    }

    /// Error for a request that never completed
    pub fn transport() -> Self {
        Self {
            class: ErrorClass::TransportFailure,
            status: None,
            message: TRANSPORT_FAILURE_MESSAGE.to_string(),
        }
    }
}

/// Result of a single fetch: the response body or a classified error
pub type FetchOutcome = Result<Vec<u8>, FetchError>;

/// HTTP client settings
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub user_agent: String,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub redirect_limit: usize,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
            redirect_limit: 10,
        }
    }
}

/// Builds an HTTP client with the given settings
///
/// # Example
///
/// ```no_run
/// use sturdywcdl::crawler::{build_http_client, FetchSettings};
///
/// let client = build_http_client(&FetchSettings::default()).unwrap();
/// ```
pub fn build_http_client(settings: &FetchSettings) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(settings.user_agent.as_str())
        .timeout(settings.request_timeout)
        .connect_timeout(settings.connect_timeout)
        .redirect(Policy::limited(settings.redirect_limit))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Performs single fetches and classifies their failures
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Creates a fetcher with a freshly built client
    pub fn new(settings: &FetchSettings) -> Result<Self, reqwest::Error> {
        Ok(Self::from_client(build_http_client(settings)?))
    }

    /// Creates a fetcher around an existing client
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// Fetches `url` once, sending the headers from `context`
    ///
    /// # Returns
    ///
    /// * `Ok(bytes)` - 2xx response body
    /// * `Err(FetchError)` - classified failure; transport problems never
    ///   expose the underlying error, only [`TRANSPORT_FAILURE_MESSAGE`]
    pub async fn fetch(&self, url: &Url, context: &RequestContext) -> FetchOutcome {
        let response = match self
            .client
            .get(url.clone())
            .headers(context.headers().clone())
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!("Request to {} failed: {}", url, e);
                return Err(FetchError::transport());
            }
        };

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::http(status.as_u16()));
        }

        match response.bytes().await {
            Ok(body) => Ok(body.to_vec()),
            Err(e) => {
                tracing::debug!("Reading body of {} failed: {}", url, e);
                Err(FetchError::transport())
            }
        }
    }
}
