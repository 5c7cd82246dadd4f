use crate::config::types::{Config, CrawlerConfig, OutputConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    if let Some(user_agent) = &config.user_agent {
        validate_user_agent_config(user_agent)?;
    }
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    validate_name("name", &config.name)?;

    let root_url = config.root_url();
    let url = Url::parse(root_url).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid root-url '{}': {}", root_url, e))
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "root-url '{}' must use HTTP or HTTPS scheme",
            root_url
        )));
    }

    if config.delay_ms > 3_600_000 {
        return Err(ConfigError::Validation(format!(
            "delay-ms must be <= 3600000, got {}",
            config.delay_ms
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    validate_name("crawler-name", &config.crawler_name)?;

    if config.crawler_version.is_empty() {
        return Err(ConfigError::Validation(
            "crawler-version cannot be empty".to_string(),
        ));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact-url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.data_dir.is_empty() {
        return Err(ConfigError::Validation(
            "data-dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Names end up in file names, so only alphanumerics and hyphens are allowed
fn validate_name(field: &str, name: &str) -> Result<(), ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::Validation(format!("{} cannot be empty", field)));
    }

    if !name.chars().all(|c| c.is_alphanumeric() || c == '-') {
        return Err(ConfigError::Validation(format!(
            "{} must contain only alphanumeric characters and hyphens, got '{}'",
            field, name
        )));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact-email cannot be empty".to_string(),
        ));
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
