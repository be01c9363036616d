use crate::errors::DomainError;
use crate::model::{EntityKind, EntityStatusRecord, SubmissionHistory, WorkflowRun};
use std::collections::BTreeMap;

/// Entity names are only unique within one entity type.
pub type EntityKey = (EntityKind, String);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusResolution {
    pub records: BTreeMap<EntityKey, EntityStatusRecord>,
}

impl StatusResolution {
    /// First record named `entity_id`, whatever its type.
    pub fn get(&self, entity_id: &str) -> Option<&EntityStatusRecord> {
        self.records.values().find(|r| r.entity_id == entity_id)
    }

    pub fn get_of(&self, kind: EntityKind, entity_id: &str) -> Option<&EntityStatusRecord> {
        self.records.get(&(kind, entity_id.to_string()))
    }

    /// The entity's name, qualified with its type when another type resolved the same name.
    pub fn label(&self, kind: EntityKind, entity_id: &str) -> String {
        let shared = self
            .records
            .keys()
            .any(|(k, id)| *k != kind && id == entity_id);
        if shared {
            format!("{}:{}", kind, entity_id)
        } else {
            entity_id.to_string()
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn offer(&mut self, history: &SubmissionHistory, run: &WorkflowRun) {
        let candidate = EntityStatusRecord {
            entity_id: run.entity_id.clone(),
            entity_kind: run.entity_kind,
            status: run.status,
            workflow_id: run.workflow_id.clone(),
            submission_id: history.submission_id.clone(),
            submitted_at: history.submitted_at,
            configuration: history.configuration.clone(),
            shape: history.shape,
        };
        let key = (run.entity_kind, run.entity_id.clone());
        match self.records.get(&key) {
            Some(current) if !supersedes(&candidate, current) => {}
            _ => {
                self.records.insert(key, candidate);
            }
        }
    }
}

/// Latest submission wins; equal timestamps fall back to submission id, then workflow id.
fn supersedes(candidate: &EntityStatusRecord, current: &EntityStatusRecord) -> bool {
    let key = |r: &EntityStatusRecord| {
        (
            r.submitted_at,
            r.submission_id.clone(),
            r.workflow_id.clone(),
        )
    };
    key(candidate) > key(current)
}

/// Resolves the latest execution of every entity touched by `history`.
pub fn resolve(history: &[SubmissionHistory], configuration_filter: Option<&str>) -> StatusResolution {
    let mut resolution = StatusResolution::default();
    for submission in matching(history, configuration_filter) {
        for run in &submission.workflows {
            resolution.offer(submission, run);
        }
    }
    tracing::debug!(
        "Resolved latest status for {} entities from {} submissions",
        resolution.len(),
        history.len()
    );
    resolution
}

/// Like [`resolve`], but every contributing submission must produce entities of `kind`.
pub fn resolve_for_kind(
    history: &[SubmissionHistory],
    configuration_filter: Option<&str>,
    kind: EntityKind,
) -> Result<StatusResolution, DomainError> {
    let mut resolution = StatusResolution::default();
    for submission in matching(history, configuration_filter) {
        if submission.entity_kind != kind {
            return Err(DomainError::UnsupportedSubmissionShape {
                submission_id: submission.submission_id.clone(),
                entity_type: submission.entity_kind.to_string(),
            });
        }
        for run in &submission.workflows {
            if run.entity_kind != kind {
                return Err(DomainError::UnsupportedSubmissionShape {
                    submission_id: submission.submission_id.clone(),
                    entity_type: run.entity_kind.to_string(),
                });
            }
            resolution.offer(submission, run);
        }
    }
    Ok(resolution)
}

fn matching<'a>(
    history: &'a [SubmissionHistory],
    configuration_filter: Option<&'a str>,
) -> impl Iterator<Item = &'a SubmissionHistory> {
    history
        .iter()
        .filter(move |s| configuration_filter.is_none_or(|f| s.configuration.contains(f)))
}
