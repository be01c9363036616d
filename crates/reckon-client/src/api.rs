use crate::error::{ClientError, Result};
use async_trait::async_trait;
use reckon_core::model::{
    Entity, EntityKind, MethodConfig, SubmissionDetail, SubmissionSummary, WorkflowMetadata,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Workspace {
    pub namespace: String,
    pub name: String,
}

impl Workspace {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Workspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

impl FromStr for Workspace {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('/') {
            Some((ns, ws)) if !ns.is_empty() && !ws.is_empty() && !ws.contains('/') => {
                Ok(Workspace::new(ns, ws))
            }
            _ => Err(ClientError::InvalidWorkspace(s.to_string())),
        }
    }
}

/// The remote execution platform as seen by this crate.
#[async_trait]
pub trait PlatformApi: Send + Sync {
    async fn list_submissions(&self, workspace: &Workspace) -> Result<Vec<SubmissionSummary>>;

    async fn get_submission(
        &self,
        workspace: &Workspace,
        submission_id: &str,
    ) -> Result<SubmissionDetail>;

    async fn get_workflow_metadata(
        &self,
        workspace: &Workspace,
        submission_id: &str,
        workflow_id: &str,
    ) -> Result<WorkflowMetadata>;

    async fn get_method_config(
        &self,
        workspace: &Workspace,
        config_namespace: &str,
        config_name: &str,
    ) -> Result<MethodConfig>;

    async fn list_entities(&self, workspace: &Workspace, kind: EntityKind) -> Result<Vec<Entity>>;

    async fn update_entity_attributes(
        &self,
        workspace: &Workspace,
        kind: EntityKind,
        entity_id: &str,
        attributes: &BTreeMap<String, Value>,
    ) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_workspace() {
        let ws: Workspace = "broad-lab/rnaseq-2024".parse().unwrap();
        assert_eq!(ws.namespace, "broad-lab");
        assert_eq!(ws.name, "rnaseq-2024");
        assert_eq!(ws.to_string(), "broad-lab/rnaseq-2024");
    }

    #[test]
    fn test_parse_workspace_rejects_malformed() {
        for bad in ["plain", "/ws", "ns/", "a/b/c"] {
            assert!(matches!(
                bad.parse::<Workspace>(),
                Err(ClientError::InvalidWorkspace(_))
            ));
        }
    }
}
