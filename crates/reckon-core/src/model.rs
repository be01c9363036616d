use crate::constants::{entity_types, execution_status};
use crate::errors::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub enum WorkflowStatus {
    Submitted,
    #[serde(alias = "Launching")]
    Queued,
    #[serde(alias = "Aborting")]
    Running,
    Succeeded,
    Failed,
    Aborted,
}

impl WorkflowStatus {
    pub const ALL: [WorkflowStatus; 6] = [
        WorkflowStatus::Succeeded,
        WorkflowStatus::Running,
        WorkflowStatus::Failed,
        WorkflowStatus::Aborted,
        WorkflowStatus::Submitted,
        WorkflowStatus::Queued,
    ];

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WorkflowStatus::Succeeded | WorkflowStatus::Failed | WorkflowStatus::Aborted
        )
    }

    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStatus::Submitted => "Submitted",
            WorkflowStatus::Queued => "Queued",
            WorkflowStatus::Running => "Running",
            WorkflowStatus::Succeeded => "Succeeded",
            WorkflowStatus::Failed => "Failed",
            WorkflowStatus::Aborted => "Aborted",
        }
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for WorkflowStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Submitted" => Ok(WorkflowStatus::Submitted),
            "Queued" | "Launching" => Ok(WorkflowStatus::Queued),
            "Running" | "Aborting" => Ok(WorkflowStatus::Running),
            "Succeeded" => Ok(WorkflowStatus::Succeeded),
            "Failed" => Ok(WorkflowStatus::Failed),
            "Aborted" => Ok(WorkflowStatus::Aborted),
            _ => Err(DomainError::UnknownStatus(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Sample,
    SampleSet,
    Participant,
    ParticipantSet,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Sample => entity_types::SAMPLE,
            EntityKind::SampleSet => entity_types::SAMPLE_SET,
            EntityKind::Participant => entity_types::PARTICIPANT,
            EntityKind::ParticipantSet => entity_types::PARTICIPANT_SET,
        }
    }

    pub fn is_set(&self) -> bool {
        matches!(self, EntityKind::SampleSet | EntityKind::ParticipantSet)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEntityKindError(pub String);

impl fmt::Display for ParseEntityKindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid entity type: '{}'. Valid values are: sample, sample_set, participant, participant_set",
            self.0
        )
    }
}

impl std::error::Error for ParseEntityKindError {}

impl FromStr for EntityKind {
    type Err = ParseEntityKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            entity_types::SAMPLE => Ok(EntityKind::Sample),
            entity_types::SAMPLE_SET => Ok(EntityKind::SampleSet),
            entity_types::PARTICIPANT => Ok(EntityKind::Participant),
            entity_types::PARTICIPANT_SET => Ok(EntityKind::ParticipantSet),
            _ => Err(ParseEntityKindError(s.to_string())),
        }
    }
}

/// How a submission maps onto the entities whose status it determines.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubmissionShape {
    /// One entity, one workflow.
    Single,
    /// A set entity processed by a single workflow; status belongs to the set.
    SetShared,
    /// A set entity fanned out into one workflow per member; status belongs to each member.
    SetPerMember,
}

impl fmt::Display for SubmissionShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionShape::Single => write!(f, "single"),
            SubmissionShape::SetShared => write!(f, "set-shared"),
            SubmissionShape::SetPerMember => write!(f, "set-per-member"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRef {
    pub entity_type: String,
    pub entity_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionSummary {
    pub submission_id: String,
    pub submission_date: DateTime<Utc>,
    pub submission_entity: EntityRef,
    #[serde(default)]
    pub method_configuration_namespace: String,
    pub method_configuration_name: String,
    pub status: String,
    #[serde(default)]
    pub workflow_statuses: BTreeMap<String, u32>,
}

impl SubmissionSummary {
    pub fn workflow_count(&self, status: WorkflowStatus) -> u32 {
        self.workflow_statuses
            .get(status.as_str())
            .copied()
            .unwrap_or(0)
    }

    /// True while any workflow of the submission is still running or waiting to start.
    pub fn is_active(&self) -> bool {
        self.workflow_count(WorkflowStatus::Running) > 0
            || self.workflow_count(WorkflowStatus::Submitted) > 0
            || self.workflow_count(WorkflowStatus::Queued) > 0
    }

    pub fn matches_configuration(&self, filter: Option<&str>) -> bool {
        filter.is_none_or(|f| self.method_configuration_name.contains(f))
    }

    pub fn qualified_configuration(&self) -> String {
        format!(
            "{}/{}",
            self.method_configuration_namespace, self.method_configuration_name
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRef {
    #[serde(default)]
    pub workflow_id: Option<String>,
    pub status: WorkflowStatus,
    #[serde(default)]
    pub workflow_entity: Option<EntityRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionDetail {
    #[serde(default)]
    pub workflows: Vec<WorkflowRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowRun {
    pub workflow_id: Option<String>,
    pub status: WorkflowStatus,
    pub entity_id: String,
    pub entity_kind: EntityKind,
}

/// A submission combined with its workflow list, classified into a [`SubmissionShape`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionHistory {
    pub submission_id: String,
    pub submitted_at: DateTime<Utc>,
    pub configuration: String,
    pub configuration_namespace: String,
    pub entity_kind: EntityKind,
    pub entity_id: String,
    pub shape: SubmissionShape,
    pub workflows: Vec<WorkflowRun>,
}

impl SubmissionHistory {
    pub fn classify(
        summary: &SubmissionSummary,
        detail: &SubmissionDetail,
    ) -> Result<Self, DomainError> {
        let entity_kind = parse_kind(&summary.submission_id, &summary.submission_entity)?;

        let first = detail.workflows.first().ok_or_else(|| {
            DomainError::incomplete(format!("submission {}", summary.submission_id), "workflows")
        })?;

        let shape = if !entity_kind.is_set() {
            SubmissionShape::Single
        } else if detail.workflows.len() == 1 {
            SubmissionShape::SetShared
        } else {
            SubmissionShape::SetPerMember
        };

        let workflows = match shape {
            SubmissionShape::Single | SubmissionShape::SetShared => {
                if detail.workflows.len() > 1 {
                    tracing::debug!(
                        "Submission {} for {} '{}' has {} workflows; using the first",
                        summary.submission_id,
                        entity_kind,
                        summary.submission_entity.entity_name,
                        detail.workflows.len()
                    );
                }
                vec![WorkflowRun {
                    workflow_id: first.workflow_id.clone(),
                    status: first.status,
                    entity_id: summary.submission_entity.entity_name.clone(),
                    entity_kind,
                }]
            }
            SubmissionShape::SetPerMember => detail
                .workflows
                .iter()
                .map(|w| {
                    let member = w.workflow_entity.as_ref().ok_or_else(|| {
                        DomainError::UnexpectedPlatformShape(format!(
                            "workflow {} of set submission {} has no workflowEntity",
                            w.workflow_id.as_deref().unwrap_or("<unlaunched>"),
                            summary.submission_id
                        ))
                    })?;
                    Ok(WorkflowRun {
                        workflow_id: w.workflow_id.clone(),
                        status: w.status,
                        entity_id: member.entity_name.clone(),
                        entity_kind: parse_kind(&summary.submission_id, member)?,
                    })
                })
                .collect::<Result<Vec<_>, DomainError>>()?,
        };

        Ok(Self {
            submission_id: summary.submission_id.clone(),
            submitted_at: summary.submission_date,
            configuration: summary.method_configuration_name.clone(),
            configuration_namespace: summary.method_configuration_namespace.clone(),
            entity_kind,
            entity_id: summary.submission_entity.entity_name.clone(),
            shape,
            workflows,
        })
    }
}

fn parse_kind(submission_id: &str, entity: &EntityRef) -> Result<EntityKind, DomainError> {
    entity
        .entity_type
        .parse()
        .map_err(|_| DomainError::UnsupportedSubmissionShape {
            submission_id: submission_id.to_string(),
            entity_type: entity.entity_type.clone(),
        })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionEvent {
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallCaching {
    #[serde(default)]
    pub hit: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendInfo {
    #[serde(default)]
    pub machine_type: Option<String>,
}

/// One physical run of a task as reported in the platform's call metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallAttempt {
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub preemptible: bool,
    #[serde(default)]
    pub shard_index: Option<i64>,
    #[serde(default)]
    pub attempt: Option<u32>,
    #[serde(default)]
    pub execution_status: Option<String>,
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub call_caching: Option<CallCaching>,
    #[serde(default)]
    pub execution_events: Vec<ExecutionEvent>,
    #[serde(default)]
    pub jes: Option<BackendInfo>,
    #[serde(default)]
    pub outputs: Option<BTreeMap<String, Value>>,
    #[serde(default)]
    pub stderr: Option<String>,
    #[serde(default)]
    pub failures: Option<Value>,
}

impl CallAttempt {
    /// Shard index of a fanned-out call. The platform reports `-1` for calls that are not scattered.
    pub fn shard(&self) -> Option<i64> {
        self.shard_index.filter(|idx| *idx >= 0)
    }

    pub fn is_cache_hit(&self) -> bool {
        self.call_caching.as_ref().is_some_and(|c| c.hit)
    }

    pub fn is_done(&self) -> bool {
        self.execution_status.as_deref() == Some(execution_status::DONE)
    }

    pub fn is_failed(&self) -> bool {
        self.execution_status.as_deref() == Some(execution_status::FAILED)
    }

    /// Machine class without its zone qualifier, e.g. `n1-standard-4`.
    pub fn machine_class(&self) -> Option<&str> {
        self.jes
            .as_ref()
            .and_then(|j| j.machine_type.as_deref())
            .and_then(|m| m.rsplit('/').next())
            .filter(|m| !m.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowMetadata {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub workflow_name: String,
    pub status: WorkflowStatus,
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub calls: Option<BTreeMap<String, Vec<CallAttempt>>>,
    #[serde(default)]
    pub outputs: Option<BTreeMap<String, Value>>,
}

impl WorkflowMetadata {
    pub fn calls(&self) -> Result<&BTreeMap<String, Vec<CallAttempt>>, DomainError> {
        self.calls
            .as_ref()
            .ok_or_else(|| DomainError::incomplete(format!("workflow {}", self.id), "calls"))
    }

    /// Workflow outputs, if the platform recorded any.
    pub fn recorded_outputs(&self) -> Option<&BTreeMap<String, Value>> {
        self.outputs.as_ref().filter(|o| !o.is_empty())
    }
}

/// Short task name: the segment after the last `.` of a qualified call name.
pub fn short_name(qualified: &str) -> &str {
    qualified.rsplit('.').next().unwrap_or(qualified)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub name: String,
    #[serde(default)]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

impl Entity {
    pub fn is_missing(&self, attribute: &str) -> bool {
        self.attributes.get(attribute).is_none_or(Value::is_null)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MethodConfig {
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub outputs: BTreeMap<String, String>,
}

/// Resolved latest execution of one entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityStatusRecord {
    pub entity_id: String,
    pub entity_kind: EntityKind,
    pub status: WorkflowStatus,
    pub workflow_id: Option<String>,
    pub submission_id: String,
    pub submitted_at: DateTime<Utc>,
    pub configuration: String,
    pub shape: SubmissionShape,
}
