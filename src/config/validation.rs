use super::models::Config;
use thiserror::Error;

/// Hard ceiling for `server.max_body_bytes`
pub const MAX_BODY_LIMIT: usize = 64 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("max_body_bytes must be positive")]
    ZeroBodyLimit,

    #[error("max_body_bytes ({actual}) exceeds limit of 64MB ({limit})")]
    BodyLimitTooLarge { actual: usize, limit: usize },

    #[error("logging filter must not be empty")]
    EmptyLogFilter,
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_body_limit(config)?;
    validate_logging(config)?;
    Ok(())
}

fn validate_body_limit(config: &Config) -> Result<(), ValidationError> {
    let actual = config.server.max_body_bytes;
    if actual == 0 {
        return Err(ValidationError::ZeroBodyLimit);
    }
    if actual > MAX_BODY_LIMIT {
        return Err(ValidationError::BodyLimitTooLarge {
            actual,
            limit: MAX_BODY_LIMIT,
        });
    }
    Ok(())
}

fn validate_logging(config: &Config) -> Result<(), ValidationError> {
    if config.logging.filter.trim().is_empty() {
        return Err(ValidationError::EmptyLogFilter);
    }
    Ok(())
}
