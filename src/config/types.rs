use crate::crawler::{
    FetchSettings, RequestContext, SeriesRequest, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_PAGES,
};
use crate::ConfigError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for sturdywcdl
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub download: DownloadConfig,
    #[serde(default)]
    pub series: Vec<SeriesEntry>,
}

impl Config {
    /// A configuration downloading a single series with default settings
    pub fn single(entry: SeriesEntry) -> Self {
        Self {
            download: DownloadConfig::default(),
            series: vec![entry],
        }
    }
}

/// Settings shared by every series
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadConfig {
    /// Maximum number of pages per series
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: usize,

    /// Attempts per page fetch and per image fetch
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: usize,

    /// Maximum number of series downloaded at the same time
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// User agent override
    #[serde(rename = "user-agent", default)]
    pub user_agent: Option<String>,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            max_pages: default_max_pages(),
            max_attempts: default_max_attempts(),
            concurrency: default_concurrency(),
            user_agent: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl DownloadConfig {
    /// HTTP client settings derived from this configuration
    pub fn fetch_settings(&self) -> FetchSettings {
        let mut settings = FetchSettings {
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            ..FetchSettings::default()
        };
        if let Some(user_agent) = &self.user_agent {
            settings.user_agent = user_agent.clone();
        }
        settings
    }
}

/// One series to download
#[derive(Debug, Clone, Deserialize)]
pub struct SeriesEntry {
    /// Label used in logs
    pub name: String,

    /// URL of the first page
    #[serde(rename = "first-page-url")]
    pub first_page_url: String,

    /// CSS selector for the image element
    #[serde(rename = "image-selector")]
    pub image_selector: String,

    /// CSS selector for the next-page link
    #[serde(rename = "next-selector")]
    pub next_selector: String,

    /// Path of the PDF to write
    #[serde(rename = "output-file")]
    pub output_file: PathBuf,

    /// Directory for the raw downloaded images
    #[serde(rename = "image-output-dir", default)]
    pub image_output_dir: Option<PathBuf>,

    /// Overrides `download.max-pages` for this series
    #[serde(rename = "max-pages", default)]
    pub max_pages: Option<usize>,

    /// Headers sent with every request of this series
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl SeriesEntry {
    /// Builds the traversal request for this series
    pub fn to_request(&self, download: &DownloadConfig) -> Result<SeriesRequest, ConfigError> {
        let request = SeriesRequest::new(
            &self.first_page_url,
            &self.image_selector,
            &self.next_selector,
        )?
        .with_name(self.name.clone())
        .with_max_pages(self.max_pages.unwrap_or(download.max_pages))
        .with_max_attempts(download.max_attempts)
        .with_context(RequestContext::from_pairs(&self.headers)?)
        .with_image_output_dir(self.image_output_dir.clone());

        Ok(request)
    }
}

fn default_max_pages() -> usize {
    DEFAULT_MAX_PAGES
}

fn default_max_attempts() -> usize {
    DEFAULT_MAX_ATTEMPTS
}

fn default_concurrency() -> usize {
    10
}

fn default_request_timeout_secs() -> u64 {
    60
}
