use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Config(#[from] reckon_core::errors::ConfigError),

    #[error(transparent)]
    Domain(#[from] reckon_core::errors::DomainError),

    #[error("Request to '{endpoint}' failed: {message}")]
    Transport { endpoint: String, message: String },

    #[error("Platform returned HTTP {status} for '{endpoint}': {body}")]
    HttpStatus {
        status: u16,
        endpoint: String,
        body: String,
    },

    #[error("Could not decode response from '{endpoint}': {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("No access token available. Set RECKON_ACCESS_TOKEN or [platform] access_token in config.toml.")]
    MissingCredentials,

    #[error("Invalid workspace '{0}'. Expected 'namespace/workspace'.")]
    InvalidWorkspace(String),

    #[error("Submission '{submission_id}' was still active after {polls} polls.")]
    WaitExhausted { submission_id: String, polls: u32 },

    #[error("Operation cancelled.")]
    Cancelled,
}

impl ClientError {
    /// Network failures, timeouts, 408, 429 and 5xx are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Transport { .. } => true,
            ClientError::HttpStatus { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }
}

pub fn is_retryable_status(status: u16) -> bool {
    status == 408 || status == 429 || (500..600).contains(&status)
}

pub type Result<T> = std::result::Result<T, ClientError>;
