//! Orchestrates platform requests for the resolver, aggregator and patch planner.
//!
//! Per-entity and per-submission fetches run through a bounded pool. A failure for one of
//! them is recorded in the returned report and never aborts the rest. Only failures that
//! affect the whole request, such as listing submissions, are returned as errors.

use crate::api::{PlatformApi, Workspace};
use crate::error::{ClientError, Result};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use reckon_core::aggregate::{aggregate, group_by_workflow, ExecutionStats, WorkflowStats};
use reckon_core::config::{Config, PollConfig};
use reckon_core::errors::{ConfigError, DomainError};
use reckon_core::model::{
    short_name, EntityKind, EntityStatusRecord, SubmissionHistory, SubmissionSummary,
    WorkflowMetadata, WorkflowStatus,
};
use reckon_core::patch::{plan_repairs, select_incomplete, OutputMap, OutputRepair, RepairSource};
use reckon_core::pricing::PriceTable;
use reckon_core::reconcile::AttemptOrdering;
use reckon_core::status::{resolve, resolve_for_kind, EntityKey, StatusResolution};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const WAITING_STATE: &str = "Waiting";

#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    FetchingSubmissions { total: usize },
    SubmissionFetched,
    FetchingMetadata { total: usize },
    MetadataFetched { entity_id: String },
    WritingAttributes { total: usize },
    AttributeWritten {
        entity_id: String,
        attribute: String,
        ok: bool,
    },
    Polled {
        poll: u32,
        pending: usize,
        total: usize,
    },
}

#[derive(Debug, Clone, Default)]
pub struct SubmissionFilter {
    pub active_only: bool,
    pub configuration: Option<String>,
    pub entity: Option<String>,
    pub submission_id: Option<String>,
}

impl SubmissionFilter {
    pub fn matches(&self, summary: &SubmissionSummary) -> bool {
        (!self.active_only || summary.is_active())
            && summary.matches_configuration(self.configuration.as_deref())
            && self
                .entity
                .as_ref()
                .is_none_or(|e| &summary.submission_entity.entity_name == e)
            && self
                .submission_id
                .as_ref()
                .is_none_or(|id| &summary.submission_id == id)
    }
}

/// A submission or entity left out of a report, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Unresolved {
    pub id: String,
    pub reason: String,
}

impl Unresolved {
    fn new(id: impl Into<String>, reason: impl ToString) -> Self {
        Self {
            id: id.into(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HistoryReport {
    pub history: Vec<SubmissionHistory>,
    pub skipped: Vec<Unresolved>,
}

#[derive(Debug, Clone, Default)]
pub struct StatusReport {
    pub resolution: StatusResolution,
    pub skipped: Vec<Unresolved>,
}

impl StatusReport {
    pub fn counts(&self) -> BTreeMap<WorkflowStatus, usize> {
        let mut counts = BTreeMap::new();
        for record in self.resolution.records.values() {
            *counts.entry(record.status).or_insert(0) += 1;
        }
        counts
    }
}

#[derive(Debug, Clone, Default)]
pub struct StatsReport {
    pub workflows: BTreeMap<String, WorkflowStats>,
    /// Entities whose latest execution did not succeed; reported with status only.
    pub not_succeeded: Vec<EntityStatusRecord>,
    pub failures: Vec<Unresolved>,
    pub skipped: Vec<Unresolved>,
}

#[derive(Debug, Clone, Default)]
pub struct TaskStateReport {
    pub tasks: Vec<String>,
    /// entity id → task → execution status of the task's last attempt.
    pub states: BTreeMap<String, BTreeMap<String, String>>,
    /// task → execution status → number of entities.
    pub summary: BTreeMap<String, BTreeMap<String, usize>>,
    /// entity id → task → stderr location of a failed final attempt.
    pub stderr: BTreeMap<String, BTreeMap<String, String>>,
    pub status_counts: BTreeMap<WorkflowStatus, usize>,
    pub failures: Vec<Unresolved>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WriteFailure {
    pub entity_id: String,
    pub attribute: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct PatchReport {
    pub dry_run: bool,
    pub incomplete: usize,
    /// Entities whose latest execution succeeded but whose outputs were never written.
    pub succeeded_unwritten: usize,
    pub repairs: Vec<OutputRepair>,
    /// Repaired entities per task name.
    pub per_task: BTreeMap<String, usize>,
    pub written: usize,
    pub failed_writes: Vec<WriteFailure>,
    pub unresolved: Vec<Unresolved>,
    pub skipped: Vec<Unresolved>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WaitOutcome {
    pub submission_id: String,
    pub polls: u32,
    pub statuses: BTreeMap<WorkflowStatus, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputRecord {
    pub submission_id: String,
    pub submitted_at: DateTime<Utc>,
    pub workflow_id: String,
    pub outputs: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default)]
pub struct OutputHistory {
    /// Most recent first.
    pub runs: Vec<OutputRecord>,
    pub skipped: Vec<Unresolved>,
}

#[derive(Clone)]
pub struct Client {
    api: Arc<dyn PlatformApi>,
    prices: Arc<PriceTable>,
    ordering: AttemptOrdering,
    concurrency: usize,
    poll: PollConfig,
    events: Option<Sender<ClientEvent>>,
}

impl Client {
    pub fn new(api: Arc<dyn PlatformApi>, config: &Config) -> Result<Self> {
        let prices = config.price_table()?;
        Ok(Self {
            api,
            prices: Arc::new(prices),
            ordering: config.reconcile.attempt_ordering,
            concurrency: config.platform.concurrency.max(1),
            poll: config.poll.clone(),
            events: None,
        })
    }

    pub fn with_events(mut self, sender: Sender<ClientEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    pub fn prices(&self) -> &PriceTable {
        &self.prices
    }

    fn emit(&self, event: ClientEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }

    /// Submission summaries matching `filter`, most recent first.
    pub async fn submissions(
        &self,
        workspace: &Workspace,
        filter: &SubmissionFilter,
    ) -> Result<Vec<SubmissionSummary>> {
        let mut submissions: Vec<SubmissionSummary> = self
            .api
            .list_submissions(workspace)
            .await?
            .into_iter()
            .filter(|s| filter.matches(s))
            .collect();
        submissions.sort_by(|a, b| {
            (b.submission_date, &b.submission_id).cmp(&(a.submission_date, &a.submission_id))
        });
        Ok(submissions)
    }

    pub async fn submission_history(
        &self,
        workspace: &Workspace,
        configuration: Option<&str>,
    ) -> Result<HistoryReport> {
        let summaries: Vec<SubmissionSummary> = self
            .api
            .list_submissions(workspace)
            .await?
            .into_iter()
            .filter(|s| s.matches_configuration(configuration))
            .collect();
        tracing::info!(
            "Fetching {} submissions of '{}' in {}",
            summaries.len(),
            configuration.unwrap_or("*"),
            workspace
        );
        self.emit(ClientEvent::FetchingSubmissions {
            total: summaries.len(),
        });

        let fetched: Vec<(String, Result<SubmissionHistory>)> = stream::iter(summaries)
            .map(|summary| async move {
                let outcome = self.classified(workspace, &summary).await;
                self.emit(ClientEvent::SubmissionFetched);
                (summary.submission_id, outcome)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut report = HistoryReport::default();
        for (submission_id, outcome) in fetched {
            match outcome {
                Ok(history) => report.history.push(history),
                Err(e) => {
                    tracing::warn!("Skipping submission {}: {}", submission_id, e);
                    report.skipped.push(Unresolved::new(submission_id, e));
                }
            }
        }
        report
            .history
            .sort_by(|a, b| (a.submitted_at, &a.submission_id).cmp(&(b.submitted_at, &b.submission_id)));
        report.skipped.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(report)
    }

    async fn classified(
        &self,
        workspace: &Workspace,
        summary: &SubmissionSummary,
    ) -> Result<SubmissionHistory> {
        let detail = self
            .api
            .get_submission(workspace, &summary.submission_id)
            .await?;
        Ok(SubmissionHistory::classify(summary, &detail)?)
    }

    /// Latest execution per entity. Set kinds only accept set submissions; a non-set kind
    /// keeps the records of that kind, member runs of set submissions included.
    pub async fn entity_statuses(
        &self,
        workspace: &Workspace,
        configuration: Option<&str>,
        kind: Option<EntityKind>,
    ) -> Result<StatusReport> {
        let history = self.submission_history(workspace, configuration).await?;
        let resolution = match kind {
            Some(kind) if kind.is_set() => resolve_for_kind(&history.history, None, kind)?,
            Some(kind) => {
                let mut resolution = resolve(&history.history, None);
                resolution.records.retain(|_, r| r.entity_kind == kind);
                resolution
            }
            None => resolve(&history.history, None),
        };
        Ok(StatusReport {
            resolution,
            skipped: history.skipped,
        })
    }

    async fn fetch_metadata(
        &self,
        workspace: &Workspace,
        records: &[&EntityStatusRecord],
    ) -> Vec<(EntityKey, Result<WorkflowMetadata>)> {
        self.emit(ClientEvent::FetchingMetadata {
            total: records.len(),
        });
        let mut fetched: Vec<(EntityKey, Result<WorkflowMetadata>)> = stream::iter(records.iter().copied())
            .map(|record| async move {
                let result = match record.workflow_id.as_deref() {
                    Some(workflow_id) => {
                        self.api
                            .get_workflow_metadata(workspace, &record.submission_id, workflow_id)
                            .await
                    }
                    None => Err(DomainError::incomplete(
                        format!("entity {}", record.entity_id),
                        "workflow id (the workflow never launched)",
                    )
                    .into()),
                };
                if let Err(e) = &result {
                    tracing::warn!("Metadata fetch failed for {}: {}", record.entity_id, e);
                }
                self.emit(ClientEvent::MetadataFetched {
                    entity_id: record.entity_id.clone(),
                });
                ((record.entity_kind, record.entity_id.clone()), result)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;
        fetched.sort_by(|a, b| a.0.cmp(&b.0));
        fetched
    }

    pub async fn stats(&self, workspace: &Workspace, configuration: &str) -> Result<StatsReport> {
        let status = self
            .entity_statuses(workspace, Some(configuration), None)
            .await?;
        let (succeeded, not_succeeded): (Vec<&EntityStatusRecord>, Vec<&EntityStatusRecord>) = status
            .resolution
            .records
            .values()
            .partition(|r| r.status == WorkflowStatus::Succeeded);

        let mut report = StatsReport {
            not_succeeded: not_succeeded.into_iter().cloned().collect(),
            skipped: status.skipped.clone(),
            ..Default::default()
        };

        let mut executions: Vec<(String, ExecutionStats)> = Vec::new();
        for ((kind, entity_id), fetched) in self.fetch_metadata(workspace, &succeeded).await {
            let entity_id = status.resolution.label(kind, &entity_id);
            match fetched.and_then(|md| Ok(aggregate(&md, &self.prices, self.ordering)?)) {
                Ok(stats) => executions.push((entity_id, stats)),
                Err(e) => report.failures.push(Unresolved::new(entity_id, e)),
            }
        }
        tracing::info!(
            "Aggregated {} executions ({} failed, {} not succeeded)",
            executions.len(),
            report.failures.len(),
            report.not_succeeded.len()
        );
        report.workflows = group_by_workflow(executions);
        Ok(report)
    }

    /// Per-task execution states of each entity's latest run.
    pub async fn task_states(
        &self,
        workspace: &Workspace,
        configuration: &str,
        kind: Option<EntityKind>,
        include_succeeded: bool,
    ) -> Result<TaskStateReport> {
        let status = self
            .entity_statuses(workspace, Some(configuration), kind)
            .await?;
        let selected: Vec<&EntityStatusRecord> = status
            .resolution
            .records
            .values()
            .filter(|r| include_succeeded || r.status != WorkflowStatus::Succeeded)
            .collect();

        let mut report = TaskStateReport {
            status_counts: status.counts(),
            ..Default::default()
        };
        let mut tasks = BTreeSet::new();
        for ((kind, entity_id), fetched) in self.fetch_metadata(workspace, &selected).await {
            let entity_id = status.resolution.label(kind, &entity_id);
            match fetched {
                Ok(md) => {
                    let states: BTreeMap<String, String> = md
                        .calls
                        .iter()
                        .flatten()
                        .map(|(task, attempts)| {
                            let state = attempts
                                .last()
                                .and_then(|a| a.execution_status.clone())
                                .unwrap_or_else(|| WAITING_STATE.to_string());
                            (short_name(task).to_string(), state)
                        })
                        .collect();
                    let failed_logs: BTreeMap<String, String> = md
                        .calls
                        .iter()
                        .flatten()
                        .filter_map(|(task, attempts)| {
                            let last = attempts.last().filter(|a| a.is_failed())?;
                            Some((short_name(task).to_string(), last.stderr.clone()?))
                        })
                        .collect();
                    if !failed_logs.is_empty() {
                        report.stderr.insert(entity_id.clone(), failed_logs);
                    }
                    tasks.extend(states.keys().cloned());
                    report.states.insert(entity_id, states);
                }
                Err(e) => report.failures.push(Unresolved::new(entity_id, e)),
            }
        }
        report.tasks = tasks.into_iter().collect();

        for states in report.states.values_mut() {
            for task in &report.tasks {
                let state = states
                    .entry(task.clone())
                    .or_insert_with(|| WAITING_STATE.to_string());
                *report
                    .summary
                    .entry(task.clone())
                    .or_default()
                    .entry(state.clone())
                    .or_insert(0) += 1;
            }
        }
        Ok(report)
    }

    /// Writes back outputs that finished tasks produced but that never reached the entity.
    pub async fn patch(
        &self,
        workspace: &Workspace,
        config_namespace: &str,
        configuration: &str,
        kind: EntityKind,
        dry_run: bool,
    ) -> Result<PatchReport> {
        let method = self
            .api
            .get_method_config(workspace, config_namespace, configuration)
            .await?;
        let outputs = OutputMap::from_config(&method);
        if outputs.is_empty() {
            return Err(ConfigError::General(format!(
                "Configuration '{}/{}' declares no entity outputs",
                config_namespace, configuration
            ))
            .into());
        }

        let entities = self.api.list_entities(workspace, kind).await?;
        let incomplete = select_incomplete(&entities, &outputs);
        tracing::info!(
            "{} of {} {} entities are missing outputs of '{}'",
            incomplete.len(),
            entities.len(),
            kind,
            configuration
        );

        let mut report = PatchReport {
            dry_run,
            incomplete: incomplete.len(),
            ..Default::default()
        };
        if incomplete.is_empty() {
            return Ok(report);
        }

        let status = self
            .entity_statuses(workspace, Some(configuration), Some(kind))
            .await?;
        report.skipped = status.skipped.clone();

        let mut targets = Vec::new();
        for entity in incomplete {
            match status.resolution.get_of(kind, &entity.name) {
                Some(record) => targets.push((entity, record)),
                None => report
                    .unresolved
                    .push(Unresolved::new(&entity.name, "no execution of this configuration")),
            }
        }
        report.succeeded_unwritten = targets
            .iter()
            .filter(|(_, r)| r.status == WorkflowStatus::Succeeded)
            .count();
        if report.succeeded_unwritten > 0 {
            tracing::warn!(
                "Attributes from {} successful executions were not written to the workspace",
                report.succeeded_unwritten
            );
        }

        let records: Vec<&EntityStatusRecord> = targets.iter().map(|(_, r)| *r).collect();
        let mut fetched: HashMap<EntityKey, Result<WorkflowMetadata>> = self
            .fetch_metadata(workspace, &records)
            .await
            .into_iter()
            .collect();

        for (entity, _) in &targets {
            let planned = match fetched.remove(&(kind, entity.name.clone())) {
                Some(Ok(md)) => plan_repairs(entity, &md, &outputs).map_err(ClientError::from),
                Some(Err(e)) => Err(e),
                None => Err(DomainError::incomplete(format!("entity {}", entity.name), "metadata").into()),
            };
            match planned {
                Ok(repairs) => report.repairs.extend(repairs),
                Err(e) => report.unresolved.push(Unresolved::new(&entity.name, e)),
            }
        }

        for repair in &report.repairs {
            let key = match &repair.source {
                RepairSource::WorkflowOutputs => "workflow outputs".to_string(),
                RepairSource::Task(task) => task.clone(),
            };
            *report.per_task.entry(key).or_insert(0) += 1;
        }

        if !dry_run {
            self.write_repairs(workspace, kind, &mut report).await;
        }
        Ok(report)
    }

    /// One request per attribute, so a rejected value never blocks its siblings.
    async fn write_repairs(&self, workspace: &Workspace, kind: EntityKind, report: &mut PatchReport) {
        let writes: Vec<(String, String, Value)> = report
            .repairs
            .iter()
            .flat_map(|r| {
                r.attributes
                    .iter()
                    .map(move |(attr, value)| (r.entity_id.clone(), attr.clone(), value.clone()))
            })
            .collect();
        self.emit(ClientEvent::WritingAttributes {
            total: writes.len(),
        });

        let results: Vec<(String, String, Result<()>)> = stream::iter(writes)
            .map(|(entity_id, attribute, value)| async move {
                let single = BTreeMap::from([(attribute.clone(), value)]);
                let result = self
                    .api
                    .update_entity_attributes(workspace, kind, &entity_id, &single)
                    .await;
                self.emit(ClientEvent::AttributeWritten {
                    entity_id: entity_id.clone(),
                    attribute: attribute.clone(),
                    ok: result.is_ok(),
                });
                (entity_id, attribute, result)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        for (entity_id, attribute, result) in results {
            match result {
                Ok(()) => report.written += 1,
                Err(e) => {
                    tracing::error!("Failed to write {}.{}: {}", entity_id, attribute, e);
                    report.failed_writes.push(WriteFailure {
                        entity_id,
                        attribute,
                        reason: e.to_string(),
                    });
                }
            }
        }
        report
            .failed_writes
            .sort_by(|a, b| (&a.entity_id, &a.attribute).cmp(&(&b.entity_id, &b.attribute)));
    }

    /// Polls a submission with growing intervals until none of its workflows are active.
    pub async fn wait_for_submission(
        &self,
        workspace: &Workspace,
        submission_id: &str,
        max_polls: Option<u32>,
        cancel: &CancellationToken,
    ) -> Result<WaitOutcome> {
        let max_polls = max_polls.unwrap_or(self.poll.max_polls).max(1);
        let max_interval = Duration::from_secs(self.poll.max_interval_secs);
        let mut interval = Duration::from_secs(self.poll.initial_interval_secs).min(max_interval);

        for poll in 1..=max_polls {
            let detail = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ClientError::Cancelled),
                detail = self.api.get_submission(workspace, submission_id) => detail?,
            };
            let mut statuses = BTreeMap::new();
            for workflow in &detail.workflows {
                *statuses.entry(workflow.status).or_insert(0) += 1;
            }
            let pending = detail
                .workflows
                .iter()
                .filter(|w| w.status.is_active())
                .count();
            self.emit(ClientEvent::Polled {
                poll,
                pending,
                total: detail.workflows.len(),
            });
            tracing::debug!(
                "Submission {} poll {}: {} of {} workflows active",
                submission_id,
                poll,
                pending,
                detail.workflows.len()
            );

            if pending == 0 && !detail.workflows.is_empty() {
                tracing::info!("Submission {} finished after {} polls", submission_id, poll);
                return Ok(WaitOutcome {
                    submission_id: submission_id.to_string(),
                    polls: poll,
                    statuses,
                });
            }
            if poll == max_polls {
                break;
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ClientError::Cancelled),
                _ = tokio::time::sleep(interval) => {}
            }
            interval = interval.saturating_mul(2).min(max_interval);
        }

        Err(ClientError::WaitExhausted {
            submission_id: submission_id.to_string(),
            polls: max_polls,
        })
    }

    /// Outputs of every succeeded submission of `configuration` for one entity.
    pub async fn output_history(
        &self,
        workspace: &Workspace,
        configuration: &str,
        entity_id: &str,
    ) -> Result<OutputHistory> {
        let summaries: Vec<SubmissionSummary> = self
            .api
            .list_submissions(workspace)
            .await?
            .into_iter()
            .filter(|s| {
                s.matches_configuration(Some(configuration))
                    && s.submission_entity.entity_name == entity_id
                    && s.workflow_count(WorkflowStatus::Succeeded) > 0
            })
            .collect();

        let fetched: Vec<(String, Result<OutputRecord>)> = stream::iter(summaries)
            .map(|summary| async move {
                let outcome = self.succeeded_outputs(workspace, &summary).await;
                (summary.submission_id, outcome)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut history = OutputHistory::default();
        for (submission_id, outcome) in fetched {
            match outcome {
                Ok(record) => history.runs.push(record),
                Err(e) => history.skipped.push(Unresolved::new(submission_id, e)),
            }
        }
        history.runs.sort_by(|a, b| {
            (b.submitted_at, &b.submission_id).cmp(&(a.submitted_at, &a.submission_id))
        });
        Ok(history)
    }

    async fn succeeded_outputs(
        &self,
        workspace: &Workspace,
        summary: &SubmissionSummary,
    ) -> Result<OutputRecord> {
        let detail = self
            .api
            .get_submission(workspace, &summary.submission_id)
            .await?;
        let workflow_id = detail
            .workflows
            .iter()
            .filter(|w| w.status == WorkflowStatus::Succeeded)
            .find_map(|w| w.workflow_id.clone())
            .ok_or_else(|| {
                DomainError::incomplete(
                    format!("submission {}", summary.submission_id),
                    "succeeded workflow id",
                )
            })?;
        let metadata = self
            .api
            .get_workflow_metadata(workspace, &summary.submission_id, &workflow_id)
            .await?;
        let outputs = metadata
            .recorded_outputs()
            .map(|o| {
                o.iter()
                    .map(|(k, v)| (history_key(k), v.clone()))
                    .collect()
            })
            .unwrap_or_default();
        Ok(OutputRecord {
            submission_id: summary.submission_id.clone(),
            submitted_at: summary.submission_date,
            workflow_id,
            outputs,
        })
    }
}

/// `workflow.task.output` becomes `task_output`.
fn history_key(qualified: &str) -> String {
    match qualified.split_once('.') {
        Some((_, rest)) => rest.replace('.', "_"),
        None => qualified.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_key() {
        assert_eq!(history_key("rnaseq.align.bam"), "align_bam");
        assert_eq!(history_key("rnaseq.counts"), "counts");
        assert_eq!(history_key("bare"), "bare");
    }

    #[test]
    fn test_submission_filter() {
        let summary: SubmissionSummary = serde_json::from_value(serde_json::json!({
            "submissionId": "sub-9",
            "submissionDate": "2018-03-01T12:00:00Z",
            "submissionEntity": {"entityType": "sample", "entityName": "S1"},
            "methodConfigurationNamespace": "broad",
            "methodConfigurationName": "rnaseq_v2",
            "status": "Submitted",
            "workflowStatuses": {"Running": 1}
        }))
        .unwrap();
        assert!(SubmissionFilter::default().matches(&summary));
        let active = SubmissionFilter {
            active_only: true,
            configuration: Some("rnaseq".into()),
            entity: Some("S1".into()),
            submission_id: Some("sub-9".into()),
        };
        assert!(active.matches(&summary));
        let other_entity = SubmissionFilter {
            entity: Some("S2".into()),
            ..Default::default()
        };
        assert!(!other_entity.matches(&summary));
    }
}
