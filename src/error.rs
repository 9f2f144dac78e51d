//! Error types for entlink.

use thiserror::Error;

/// Result type for entlink operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for entlink operations.
///
/// Only [`Error::LanguageNotLoaded`] and [`Error::InvalidInput`] abort a
/// disambiguation call. Scoring and model failures are recovered inside the
/// pipeline: the affected candidate gets a zero score and the call goes on.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// No knowledge base is loaded for the requested language.
    #[error("No knowledge base loaded for language '{0}'")]
    LanguageNotLoaded(String),

    /// Invalid configuration value.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Ranker or selector construction failed.
    #[error("Model initialization failed: {0}")]
    ModelInit(String),

    /// Scoring one candidate failed.
    #[error("Scoring failed: {0}")]
    Scoring(String),

    /// Relatedness context could not be built.
    #[error("Context error: {0}")]
    Context(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Parse error.
    #[error("Parse error: {0}")]
    Parse(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from the core types.
    #[error(transparent)]
    Core(#[from] entlink_core::Error),
}

impl Error {
    /// Create a missing-language error.
    pub fn language_not_loaded(lang: impl Into<String>) -> Self {
        Error::LanguageNotLoaded(lang.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a model initialization error.
    pub fn model_init(msg: impl Into<String>) -> Self {
        Error::ModelInit(msg.into())
    }

    /// Create a scoring error.
    pub fn scoring(msg: impl Into<String>) -> Self {
        Error::Scoring(msg.into())
    }

    /// Create a context error.
    pub fn context(msg: impl Into<String>) -> Self {
        Error::Context(msg.into())
    }

    /// Create an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Error::Parse(msg.into())
    }

    /// Whether this error aborts a whole request rather than one candidate.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::LanguageNotLoaded(_) | Error::InvalidInput(_) | Error::Core(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Parse(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}
