//! Workspace aliases and pending submissions kept between invocations.

use crate::error::CliError;
use reckon_client::Workspace;
use reckon_core::{config, constants::files};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub aliases: BTreeMap<String, Workspace>,
    /// Submission ids to follow with `wait`, keyed by `namespace/workspace`.
    #[serde(default)]
    pub pending: BTreeMap<String, BTreeSet<String>>,
}

impl Session {
    /// An alias wins over a literal `namespace/workspace`.
    pub fn resolve_workspace(&self, raw: &str) -> Result<Workspace, CliError> {
        if let Some(workspace) = self.aliases.get(raw) {
            return Ok(workspace.clone());
        }
        raw.parse()
            .map_err(|_| CliError::UnknownWorkspace(raw.to_string()))
    }

    pub fn add_pending<I>(&mut self, workspace: &Workspace, submission_ids: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let entry = self.pending.entry(workspace.to_string()).or_default();
        let before = entry.len();
        entry.extend(submission_ids);
        entry.len() - before
    }

    pub fn remove_pending(&mut self, workspace: &Workspace, submission_id: &str) {
        let key = workspace.to_string();
        if let Some(ids) = self.pending.get_mut(&key) {
            ids.remove(submission_id);
            if ids.is_empty() {
                self.pending.remove(&key);
            }
        }
    }

    pub fn pending_for(&self, workspace: &Workspace) -> Vec<String> {
        self.pending
            .get(&workspace.to_string())
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default()
    }
}

pub trait SessionStore {
    fn load(&self) -> Result<Session, CliError>;
    fn save(&self, session: &Session) -> Result<(), CliError>;
}

/// Session kept as one JSON document, rewritten wholesale on every save.
pub struct JsonSessionStore {
    path: PathBuf,
}

impl JsonSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_location() -> Result<Self, CliError> {
        Ok(Self::new(config::config_dir()?.join(files::SESSION)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for JsonSessionStore {
    fn load(&self) -> Result<Session, CliError> {
        if !self.path.exists() {
            return Ok(Session::default());
        }
        let content = fs_err::read_to_string(&self.path)?;
        match serde_json::from_str(&content) {
            Ok(session) => Ok(session),
            Err(e) => {
                tracing::warn!(
                    "Failed to read session file at {}: {}. Starting with an empty session.",
                    self.path.display(),
                    e
                );
                Ok(Session::default())
            }
        }
    }

    fn save(&self, session: &Session) -> Result<(), CliError> {
        if let Some(parent) = self.path.parent() {
            fs_err::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(session)?;
        fs_err::write(&self.path, json)?;
        tracing::debug!("Saved session to {}", self.path.display());
        Ok(())
    }
}
