//! Configuration error types.

/// Errors produced while loading or validating a publish configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid options file: {0}")]
    Parse(#[from] toml::de::Error),

    /// One or more required fields are missing or empty.
    #[error("the configuration is incorrect: missing {}", .0.join(", "))]
    Invalid(Vec<&'static str>),
}
