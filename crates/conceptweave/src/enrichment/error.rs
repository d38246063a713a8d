use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnrichmentError {
    #[error("No model credential available: {0}")]
    MissingCredential(String),

    #[error("Model provider rejected the credential ({status}): {message}")]
    Auth { status: u16, message: String },

    #[error("Model provider rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("Model provider returned {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("Request to model provider failed: {0}")]
    Transport(String),

    #[error("Model call timed out after {0}s")]
    Timeout(u64),

    #[error("Model returned an empty response")]
    EmptyResponse,

    #[error("Model output did not match the expected format: {0}")]
    ContractViolation(String),
}

pub type Result<T> = std::result::Result<T, EnrichmentError>;
