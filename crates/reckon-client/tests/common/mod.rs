#![allow(dead_code)]
use async_trait::async_trait;
use reckon_client::error::{ClientError, Result};
use reckon_client::{PlatformApi, Workspace};
use reckon_core::config::{Config, PollConfig};
use reckon_core::model::{
    Entity, EntityKind, MethodConfig, SubmissionDetail, SubmissionSummary, WorkflowMetadata,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub fn workspace() -> Workspace {
    Workspace::new("broad", "rnaseq")
}

pub fn fast_config() -> Config {
    Config {
        poll: PollConfig {
            initial_interval_secs: 0,
            max_interval_secs: 0,
            max_polls: 5,
        },
        ..Default::default()
    }
}

/// In-memory platform holding wire payloads keyed the way the REST interface addresses them.
#[derive(Default)]
pub struct FakePlatform {
    submissions: Vec<Value>,
    details: HashMap<String, Value>,
    metadata: HashMap<String, Value>,
    configs: HashMap<String, Value>,
    entities: Mutex<Vec<Value>>,
    rejected_attributes: HashSet<String>,
    scripted_details: Mutex<VecDeque<Value>>,
    pub writes: Mutex<Vec<(String, BTreeMap<String, Value>)>>,
    pub detail_requests: AtomicUsize,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submission(mut self, summary: Value, detail: Value) -> Self {
        let id = summary["submissionId"].as_str().unwrap_or_default().to_string();
        self.submissions.push(summary);
        self.details.insert(id, detail);
        self
    }

    /// A submission whose detail request fails.
    pub fn broken_submission(mut self, summary: Value) -> Self {
        self.submissions.push(summary);
        self
    }

    pub fn metadata(mut self, metadata: Value) -> Self {
        let id = metadata["id"].as_str().unwrap_or_default().to_string();
        self.metadata.insert(id, metadata);
        self
    }

    pub fn method_config(mut self, config: Value) -> Self {
        let key = format!(
            "{}/{}",
            config["namespace"].as_str().unwrap_or_default(),
            config["name"].as_str().unwrap_or_default()
        );
        self.configs.insert(key, config);
        self
    }

    pub fn entity(mut self, entity: Value) -> Self {
        self.entities.get_mut().unwrap().push(entity);
        self
    }

    /// Current attributes of a stored entity, written values included.
    pub fn attributes_of(&self, kind: EntityKind, name: &str) -> Value {
        self.entities
            .lock()
            .unwrap()
            .iter()
            .find(|e| e["entityType"].as_str() == Some(kind.as_str()) && e["name"].as_str() == Some(name))
            .map(|e| e["attributes"].clone())
            .unwrap_or(Value::Null)
    }

    pub fn reject_attribute(mut self, attribute: &str) -> Self {
        self.rejected_attributes.insert(attribute.to_string());
        self
    }

    /// Successive detail responses for polling; the last one repeats.
    pub fn poll_sequence(self, details: Vec<Value>) -> Self {
        *self.scripted_details.lock().unwrap() = details.into();
        self
    }

    pub fn written(&self) -> Vec<(String, BTreeMap<String, Value>)> {
        let mut writes = self.writes.lock().unwrap().clone();
        writes.sort_by_key(|(entity, attrs)| (entity.clone(), attrs.keys().cloned().collect::<Vec<_>>()));
        writes
    }
}

fn not_found(endpoint: String) -> ClientError {
    ClientError::HttpStatus {
        status: 404,
        endpoint,
        body: "not found".to_string(),
    }
}

fn decode<T: DeserializeOwned>(endpoint: String, value: &Value) -> Result<T> {
    serde_json::from_value(value.clone()).map_err(|source| ClientError::Decode { endpoint, source })
}

#[async_trait]
impl PlatformApi for FakePlatform {
    async fn list_submissions(&self, _workspace: &Workspace) -> Result<Vec<SubmissionSummary>> {
        self.submissions
            .iter()
            .map(|s| decode("submissions".into(), s))
            .collect()
    }

    async fn get_submission(
        &self,
        _workspace: &Workspace,
        submission_id: &str,
    ) -> Result<SubmissionDetail> {
        self.detail_requests.fetch_add(1, Ordering::SeqCst);
        let endpoint = format!("submissions/{}", submission_id);
        {
            let mut scripted = self.scripted_details.lock().unwrap();
            if scripted.len() > 1 {
                let next = scripted.pop_front().unwrap();
                return decode(endpoint, &next);
            }
            if let Some(last) = scripted.front() {
                return decode(endpoint, last);
            }
        }
        match self.details.get(submission_id) {
            Some(detail) => decode(endpoint, detail),
            None => Err(not_found(endpoint)),
        }
    }

    async fn get_workflow_metadata(
        &self,
        _workspace: &Workspace,
        submission_id: &str,
        workflow_id: &str,
    ) -> Result<WorkflowMetadata> {
        let endpoint = format!("submissions/{}/workflows/{}", submission_id, workflow_id);
        match self.metadata.get(workflow_id) {
            Some(md) => decode(endpoint, md),
            None => Err(not_found(endpoint)),
        }
    }

    async fn get_method_config(
        &self,
        _workspace: &Workspace,
        config_namespace: &str,
        config_name: &str,
    ) -> Result<MethodConfig> {
        let key = format!("{}/{}", config_namespace, config_name);
        match self.configs.get(&key) {
            Some(config) => decode(format!("method_configs/{}", key), config),
            None => Err(not_found(format!("method_configs/{}", key))),
        }
    }

    async fn list_entities(&self, _workspace: &Workspace, kind: EntityKind) -> Result<Vec<Entity>> {
        self.entities
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e["entityType"].as_str() == Some(kind.as_str()))
            .map(|e| decode(format!("entityQuery/{}", kind), e))
            .collect()
    }

    async fn update_entity_attributes(
        &self,
        _workspace: &Workspace,
        kind: EntityKind,
        entity_id: &str,
        attributes: &BTreeMap<String, Value>,
    ) -> Result<()> {
        if attributes.keys().any(|a| self.rejected_attributes.contains(a)) {
            return Err(ClientError::HttpStatus {
                status: 400,
                endpoint: format!("entities/{}/{}", kind, entity_id),
                body: "attribute rejected".to_string(),
            });
        }
        {
            let mut entities = self.entities.lock().unwrap();
            let stored = entities.iter_mut().find(|e| {
                e["entityType"].as_str() == Some(kind.as_str()) && e["name"].as_str() == Some(entity_id)
            });
            match stored.and_then(|e| e["attributes"].as_object_mut()) {
                Some(current) => {
                    for (attr, value) in attributes {
                        current.insert(attr.clone(), value.clone());
                    }
                }
                None => return Err(not_found(format!("entities/{}/{}", kind, entity_id))),
            }
        }
        self.writes
            .lock()
            .unwrap()
            .push((entity_id.to_string(), attributes.clone()));
        Ok(())
    }
}
