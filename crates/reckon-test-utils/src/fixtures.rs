//! Builders for platform payloads as they arrive over the wire.
//!
//! Times are given in minutes relative to 2018-03-01T00:00:00Z.

use chrono::{DateTime, Duration, SecondsFormat, TimeZone, Utc};
use serde_json::{json, Map, Value};

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2018, 3, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

pub fn ts(minutes: i64) -> String {
    (base_time() + Duration::minutes(minutes)).to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[derive(Debug, Clone)]
pub struct AttemptBuilder {
    span: Option<(i64, Option<i64>)>,
    quota: Vec<(i64, i64)>,
    machine: Option<String>,
    preemptible: bool,
    status: Option<String>,
    job: Option<String>,
    shard: i64,
    attempt: u32,
    cache_hit: bool,
    outputs: Map<String, Value>,
    stderr: Option<String>,
}

pub fn attempt() -> AttemptBuilder {
    AttemptBuilder {
        span: None,
        quota: Vec::new(),
        machine: None,
        preemptible: false,
        status: None,
        job: None,
        shard: -1,
        attempt: 1,
        cache_hit: false,
        outputs: Map::new(),
        stderr: None,
    }
}

impl AttemptBuilder {
    pub fn span(mut self, start: i64, end: i64) -> Self {
        self.span = Some((start, Some(end)));
        self
    }

    /// Started but not finished.
    pub fn running_since(mut self, start: i64) -> Self {
        self.span = Some((start, None));
        self
    }

    pub fn quota(mut self, start: i64, end: i64) -> Self {
        self.quota.push((start, end));
        self
    }

    pub fn machine(mut self, class: &str) -> Self {
        self.machine = Some(class.to_string());
        self
    }

    pub fn preemptible(mut self, preemptible: bool) -> Self {
        self.preemptible = preemptible;
        self
    }

    pub fn status(mut self, status: &str) -> Self {
        self.status = Some(status.to_string());
        self
    }

    pub fn job(mut self, job_id: &str) -> Self {
        self.job = Some(job_id.to_string());
        self
    }

    pub fn shard(mut self, index: i64) -> Self {
        self.shard = index;
        self
    }

    pub fn attempt(mut self, n: u32) -> Self {
        self.attempt = n;
        self
    }

    pub fn cache_hit(mut self) -> Self {
        self.cache_hit = true;
        self
    }

    pub fn output(mut self, key: &str, value: Value) -> Self {
        self.outputs.insert(key.to_string(), value);
        self
    }

    pub fn stderr(mut self, path: &str) -> Self {
        self.stderr = Some(path.to_string());
        self
    }

    pub fn build(self) -> Value {
        let mut obj = Map::new();
        if let Some((start, end)) = self.span {
            obj.insert("start".into(), json!(ts(start)));
            if let Some(end) = end {
                obj.insert("end".into(), json!(ts(end)));
            }
        }
        obj.insert("preemptible".into(), json!(self.preemptible));
        obj.insert("shardIndex".into(), json!(self.shard));
        obj.insert("attempt".into(), json!(self.attempt));
        if let Some(status) = self.status {
            obj.insert("executionStatus".into(), json!(status));
        }
        if let Some(job) = self.job {
            obj.insert("jobId".into(), json!(job));
        }
        if let Some(stderr) = self.stderr {
            obj.insert("stderr".into(), json!(stderr));
        }
        obj.insert("callCaching".into(), json!({ "hit": self.cache_hit }));
        if let Some(machine) = self.machine {
            obj.insert(
                "jes".into(),
                json!({ "machineType": format!("us-central1-b/{}", machine) }),
            );
        }
        let events: Vec<Value> = self
            .quota
            .iter()
            .map(|(s, e)| {
                json!({
                    "description": "waiting for quota",
                    "startTime": ts(*s),
                    "endTime": ts(*e),
                })
            })
            .collect();
        obj.insert("executionEvents".into(), Value::Array(events));
        if !self.outputs.is_empty() {
            obj.insert("outputs".into(), Value::Object(self.outputs));
        }
        Value::Object(obj)
    }
}

#[derive(Debug, Clone)]
pub struct WorkflowBuilder {
    id: String,
    name: String,
    status: String,
    span: Option<(i64, i64)>,
    calls: Map<String, Value>,
    outputs: Map<String, Value>,
}

pub fn workflow(id: &str, name: &str, status: &str) -> WorkflowBuilder {
    WorkflowBuilder {
        id: id.to_string(),
        name: name.to_string(),
        status: status.to_string(),
        span: None,
        calls: Map::new(),
        outputs: Map::new(),
    }
}

impl WorkflowBuilder {
    pub fn span(mut self, start: i64, end: i64) -> Self {
        self.span = Some((start, end));
        self
    }

    pub fn call(mut self, name: &str, attempts: Vec<Value>) -> Self {
        self.calls.insert(name.to_string(), Value::Array(attempts));
        self
    }

    pub fn output(mut self, key: &str, value: Value) -> Self {
        self.outputs.insert(key.to_string(), value);
        self
    }

    pub fn build(self) -> Value {
        let mut obj = Map::new();
        obj.insert("id".into(), json!(self.id));
        obj.insert("workflowName".into(), json!(self.name));
        obj.insert("status".into(), json!(self.status));
        if let Some((start, end)) = self.span {
            obj.insert("start".into(), json!(ts(start)));
            obj.insert("end".into(), json!(ts(end)));
        }
        obj.insert("calls".into(), Value::Object(self.calls));
        if !self.outputs.is_empty() {
            obj.insert("outputs".into(), Value::Object(self.outputs));
        }
        Value::Object(obj)
    }
}

#[derive(Debug, Clone)]
pub struct SubmissionBuilder {
    id: String,
    configuration: String,
    namespace: String,
    entity: (String, String),
    at: i64,
    status: String,
    counts: Map<String, Value>,
}

pub fn submission(id: &str, configuration: &str) -> SubmissionBuilder {
    SubmissionBuilder {
        id: id.to_string(),
        configuration: configuration.to_string(),
        namespace: "broad".to_string(),
        entity: ("sample".to_string(), "S1".to_string()),
        at: 0,
        status: "Done".to_string(),
        counts: Map::new(),
    }
}

impl SubmissionBuilder {
    pub fn entity(mut self, entity_type: &str, name: &str) -> Self {
        self.entity = (entity_type.to_string(), name.to_string());
        self
    }

    pub fn namespace(mut self, namespace: &str) -> Self {
        self.namespace = namespace.to_string();
        self
    }

    pub fn at(mut self, minutes: i64) -> Self {
        self.at = minutes;
        self
    }

    pub fn status(mut self, status: &str) -> Self {
        self.status = status.to_string();
        self
    }

    pub fn count(mut self, workflow_status: &str, n: u32) -> Self {
        self.counts.insert(workflow_status.to_string(), json!(n));
        self
    }

    pub fn build(self) -> Value {
        json!({
            "submissionId": self.id,
            "submissionDate": ts(self.at),
            "submissionEntity": {"entityType": self.entity.0, "entityName": self.entity.1},
            "methodConfigurationNamespace": self.namespace,
            "methodConfigurationName": self.configuration,
            "status": self.status,
            "workflowStatuses": Value::Object(self.counts),
        })
    }
}

/// A workflow entry of a submission detail. `member` is the `(entityType, entityName)` it ran on.
pub fn workflow_ref(workflow_id: Option<&str>, status: &str, member: Option<(&str, &str)>) -> Value {
    let mut obj = Map::new();
    if let Some(id) = workflow_id {
        obj.insert("workflowId".into(), json!(id));
    }
    obj.insert("status".into(), json!(status));
    if let Some((kind, name)) = member {
        obj.insert(
            "workflowEntity".into(),
            json!({"entityType": kind, "entityName": name}),
        );
    }
    Value::Object(obj)
}

pub fn submission_detail(workflows: Vec<Value>) -> Value {
    json!({ "workflows": workflows })
}

pub fn entity(entity_type: &str, name: &str, attributes: Value) -> Value {
    json!({"name": name, "entityType": entity_type, "attributes": attributes})
}

pub fn method_config(namespace: &str, name: &str, outputs: &[(&str, &str)]) -> Value {
    let outputs: Map<String, Value> = outputs
        .iter()
        .map(|(k, v)| (k.to_string(), json!(v)))
        .collect();
    json!({"namespace": namespace, "name": name, "outputs": outputs})
}
