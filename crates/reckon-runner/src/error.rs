use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] reckon_core::errors::ConfigError),

    #[error(transparent)]
    Domain(#[from] reckon_core::errors::DomainError),

    #[error(transparent)]
    Client(#[from] reckon_client::error::ClientError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("Unknown workspace '{0}'. Use 'namespace/workspace' or add an alias with 'reckon workspace add'.")]
    UnknownWorkspace(String),

    #[error("No workspace given. Pass --workspace <namespace/workspace|alias>.")]
    MissingWorkspace,

    #[error("Background worker panicked")]
    WorkerPanicked,

    #[error("{failed} of {total} operations failed")]
    PartialFailure { failed: usize, total: usize },
}
