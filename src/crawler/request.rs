//! Inputs of a single traversal
//!
//! Everything here is fixed once a traversal starts: the page reference it
//! begins at, the selectors used on every page, and the headers sent with every
//! request.

use crate::ConfigError;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use scraper::Selector;
use std::path::PathBuf;
use url::Url;

/// Default limit on the number of pages downloaded per series
pub const DEFAULT_MAX_PAGES: usize = 10_000;

/// Default number of attempts for every page and image fetch
pub const DEFAULT_MAX_ATTEMPTS: usize = 10;

/// A page URL together with the origin of the series it belongs to
///
/// Links found on any page are resolved against the origin of the first page,
/// not against the page they were found on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageReference {
    url: Url,
    origin: Url,
}

impl PageReference {
    /// Creates the reference for the first page of a series
    ///
    /// Only `http` and `https` URLs are accepted.
    pub fn new(url: Url) -> Result<Self, ConfigError> {
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidUrl(format!(
                "'{}' must use http or https",
                url
            )));
        }

        let origin = Url::parse(&url.origin().ascii_serialization())
            .map_err(|e| ConfigError::InvalidUrl(format!("'{}': {}", url, e)))?;

        Ok(Self { url, origin })
    }

    /// Parses and validates a first-page URL
    pub fn parse(url: &str) -> Result<Self, ConfigError> {
        let parsed = Url::parse(url)
            .map_err(|e| ConfigError::InvalidUrl(format!("'{}': {}", url, e)))?;
        Self::new(parsed)
    }

    /// A reference to another page of the same series
    pub fn follow(&self, url: Url) -> Self {
        Self {
            url,
            origin: self.origin.clone(),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }
}

/// Headers sent with every request of a traversal
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestContext {
    headers: HeaderMap,
}

impl RequestContext {
    /// Builds a context from `(name, value)` pairs; later duplicates win
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut headers = HeaderMap::new();

        for (name, value) in pairs {
            let (name, value) = (name.as_ref(), value.as_ref());
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ConfigError::InvalidHeader(format!("invalid header name '{}'", name)))?;
            let header_value = HeaderValue::from_str(value).map_err(|_| {
                ConfigError::InvalidHeader(format!("invalid value for header '{}'", name))
            })?;
            headers.insert(header_name, header_value);
        }

        Ok(Self { headers })
    }

    /// Builds a context from a flat `key value key value ...` list
    pub fn from_flat_args(args: &[String]) -> Result<Self, ConfigError> {
        if args.len() % 2 != 0 {
            return Err(ConfigError::InvalidHeader(
                "Uneven number of header arguments. Header arguments must come in pairs of two (--headers 'key' 'value' 'key' 'value')".to_string(),
            ));
        }

        Self::from_pairs(args.chunks_exact(2).map(|pair| (&pair[0], &pair[1])))
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}

/// Parses a CSS selector, reporting failures as configuration errors
pub fn parse_selector(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

/// Everything needed to download one series
#[derive(Debug, Clone)]
pub struct SeriesRequest {
    /// Label used in logs
    pub name: String,

    /// Where the traversal starts
    pub first_page: PageReference,

    /// Selector for the image element; its `src` attribute is downloaded
    pub image_selector: Selector,

    /// Selector for the next-page link; its `href` attribute is followed
    pub next_selector: Selector,

    /// Upper bound on the number of pages produced
    pub max_pages: usize,

    /// Attempts per page fetch and per image fetch
    pub max_attempts: usize,

    /// Headers for every request
    pub context: RequestContext,

    /// If set, raw images are also written here
    pub image_output_dir: Option<PathBuf>,
}

impl SeriesRequest {
    /// Creates a request with default limits and no headers
    ///
    /// # Example
    ///
    /// ```
    /// use sturdywcdl::SeriesRequest;
    ///
    /// let request = SeriesRequest::new("https://comics.com/1", "#comic img", "a.next")
    ///     .unwrap()
    ///     .with_max_pages(50);
    /// assert_eq!(request.first_page.origin().as_str(), "https://comics.com/");
    /// ```
    pub fn new(
        first_page_url: &str,
        image_selector: &str,
        next_selector: &str,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            name: first_page_url.to_string(),
            first_page: PageReference::parse(first_page_url)?,
            image_selector: parse_selector(image_selector)?,
            next_selector: parse_selector(next_selector)?,
            max_pages: DEFAULT_MAX_PAGES,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            context: RequestContext::default(),
            image_output_dir: None,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_context(mut self, context: RequestContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_image_output_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.image_output_dir = dir;
        self
    }
}
