use thiserror::Error;

/// Top-level error type for the Parla system.
///
/// Every stage collaborator (transcriber, retriever, generator, synthesizer)
/// reports failures through this type. The orchestrator decides per stage
/// whether a variant is fatal or only degrades the result.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParlaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transcription error: {0}")]
    Transcription(String),

    #[error("Retrieval error: {0}")]
    Retrieval(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Synthesis error: {0}")]
    Synthesis(String),

    #[error("Provider returned HTTP {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for ParlaError {
    fn from(err: toml::de::Error) -> Self {
        ParlaError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for ParlaError {
    fn from(err: toml::ser::Error) -> Self {
        ParlaError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for ParlaError {
    fn from(err: serde_json::Error) -> Self {
        ParlaError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Parla operations.
pub type Result<T> = std::result::Result<T, ParlaError>;
