use crate::config::types::{Config, DownloadConfig, SeriesEntry};
use crate::ConfigError;
use std::collections::HashSet;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_download_config(&config.download)?;
    validate_series(&config.series, &config.download)?;
    Ok(())
}

/// Validates the shared download settings
fn validate_download_config(config: &DownloadConfig) -> Result<(), ConfigError> {
    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max-pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.max_attempts < 1 || config.max_attempts > 100 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be between 1 and 100, got {}",
            config.max_attempts
        )));
    }

    if config.concurrency < 1 || config.concurrency > 64 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 64, got {}",
            config.concurrency
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request-timeout-secs must be >= 1".to_string(),
        ));
    }

    if let Some(user_agent) = &config.user_agent {
        if user_agent.trim().is_empty() {
            return Err(ConfigError::Validation(
                "user-agent cannot be empty".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates the series entries
///
/// Building the traversal request checks the first-page URL, both selectors,
/// and the headers.
fn validate_series(entries: &[SeriesEntry], download: &DownloadConfig) -> Result<(), ConfigError> {
    if entries.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[series]] entry is required".to_string(),
        ));
    }

    let mut names = HashSet::new();
    let mut output_paths = HashSet::new();
    for entry in entries {
        if entry.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "series name cannot be empty".to_string(),
            ));
        }

        if !names.insert(entry.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate series name '{}'",
                entry.name
            )));
        }

        if entry.output_file.as_os_str().is_empty() {
            return Err(ConfigError::Validation(format!(
                "series '{}' must have an output-file",
                entry.name
            )));
        }

        // Series run concurrently, so no two may write to the same place
        if !output_paths.insert(entry.output_file.as_path()) {
            return Err(ConfigError::Validation(format!(
                "series '{}' writes to output-file '{}', which another series already uses",
                entry.name,
                entry.output_file.display()
            )));
        }

        if let Some(dir) = &entry.image_output_dir {
            if !output_paths.insert(dir.as_path()) {
                return Err(ConfigError::Validation(format!(
                    "series '{}' writes to image-output-dir '{}', which another series already uses",
                    entry.name,
                    dir.display()
                )));
            }
        }

        if entry.max_pages == Some(0) {
            return Err(ConfigError::Validation(format!(
                "series '{}': max-pages must be >= 1",
                entry.name
            )));
        }

        entry.to_request(download)?;
    }

    Ok(())
}
