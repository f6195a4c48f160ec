use crate::config::types::{ChunkerSettings, Config, CrawlerSettings, OutputConfig};
use crate::targets::validate_targets;
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_settings(&config.crawler)?;
    validate_chunker_settings(&config.chunker)?;
    validate_output_config(&config.output)?;
    validate_targets(&config.crawl_targets())?;
    Ok(())
}

/// Validates crawl settings
pub fn validate_crawler_settings(settings: &CrawlerSettings) -> Result<(), ConfigError> {
    if settings.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            settings.max_pages
        )));
    }

    if settings.concurrency < 1 || settings.concurrency > 100 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 100, got {}",
            settings.concurrency
        )));
    }

    if settings.batch_size < 1 || settings.batch_size > 10 {
        return Err(ConfigError::Validation(format!(
            "batch_size must be between 1 and 10, got {}",
            settings.batch_size
        )));
    }

    if settings.max_attempts < 1 || settings.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be between 1 and 10, got {}",
            settings.max_attempts
        )));
    }

    if settings.page_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "page_timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates chunker settings
pub fn validate_chunker_settings(settings: &ChunkerSettings) -> Result<(), ConfigError> {
    if settings.chunk_size < 1 {
        return Err(ConfigError::Validation(
            "chunk_size must be >= 1".to_string(),
        ));
    }

    if settings.chunk_overlap >= settings.chunk_size {
        return Err(ConfigError::Validation(format!(
            "chunk_overlap ({}) must be smaller than chunk_size ({})",
            settings.chunk_overlap, settings.chunk_size
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("chunks_path", &config.chunks_path),
        ("failures_path", &config.failures_path),
        ("summary_path", &config.summary_path),
    ] {
        if value.is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }
    }

    Ok(())
}
