use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("I/O error on path '{path}': {source}")]
    PathIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse JSON document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Failed to serialize TOML configuration: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    General(String),

    #[error("Could not determine the XDG {0} directory.")]
    XdgDirectoryNotFound(&'static str),

    #[error("Price table at '{path}' is invalid: {reason}")]
    InvalidPriceTable { path: PathBuf, reason: String },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Submission '{submission_id}' has unsupported entity type '{entity_type}'. Expected one of: sample, sample_set, participant, participant_set.")]
    UnsupportedSubmissionShape {
        submission_id: String,
        entity_type: String,
    },

    #[error("Unexpected record shape from the platform: {0}")]
    UnexpectedPlatformShape(String),

    #[error("Incomplete metadata for '{subject}': missing {missing}")]
    IncompleteMetadata { subject: String, missing: String },

    #[error("No price entry for machine class '{machine_class}' (preemptible: {preemptible}).")]
    MissingPriceEntry {
        machine_class: String,
        preemptible: bool,
    },

    #[error("Attempt ordering violated for task '{task}' shard {shard}: {detail}")]
    AttemptOrderViolation {
        task: String,
        shard: i64,
        detail: String,
    },

    #[error("Execution '{workflow_id}' has status '{status}'; cost is only estimated for succeeded executions.")]
    ExecutionNotSucceeded { workflow_id: String, status: String },

    #[error("Unknown workflow status '{0}'.")]
    UnknownStatus(String),
}

impl DomainError {
    pub fn incomplete(subject: impl Into<String>, missing: impl Into<String>) -> Self {
        DomainError::IncompleteMetadata {
            subject: subject.into(),
            missing: missing.into(),
        }
    }
}
