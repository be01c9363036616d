use crate::errors::DomainError;
use crate::model::{short_name, CallAttempt, WorkflowMetadata, WorkflowStatus};
use crate::pricing::{core_count, PriceTable};
use crate::reconcile::{reconcile, AttemptOrdering};
use crate::timing::{billable_hours, wall_hours, workflow_hours};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskStats {
    /// Billable hours of the final attempts.
    pub billable_time_h: f64,
    /// Billable hours of every attempt, preempted ones included.
    pub total_attempts_time_h: f64,
    pub max_single_preemption_time_h: Option<f64>,
    pub attempt_count: usize,
    pub last_machine_class: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    /// `None` when the price of a machine class used by the task is unknown.
    pub estimated_cost: Option<f64>,
    pub cpu_hours: Option<f64>,
    pub job_ids: Vec<String>,
    pub cache_hit: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnresolvedTask {
    pub task: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionStats {
    pub workflow_id: String,
    pub workflow_name: String,
    pub per_task: BTreeMap<String, TaskStats>,
    pub total_runtime_h: f64,
    pub total_cpu_h: f64,
    pub total_cost: f64,
    pub start_time: DateTime<Utc>,
    pub cost_unknown: Vec<String>,
    pub unresolved_tasks: Vec<UnresolvedTask>,
}

pub fn aggregate(
    metadata: &WorkflowMetadata,
    prices: &PriceTable,
    ordering: AttemptOrdering,
) -> Result<ExecutionStats, DomainError> {
    if metadata.status != WorkflowStatus::Succeeded {
        return Err(DomainError::ExecutionNotSucceeded {
            workflow_id: metadata.id.clone(),
            status: metadata.status.to_string(),
        });
    }
    let subject = format!("workflow {}", metadata.id);
    let start_time = metadata
        .start
        .ok_or_else(|| DomainError::incomplete(&subject, "start"))?;
    let total_runtime_h =
        workflow_hours(metadata).ok_or_else(|| DomainError::incomplete(&subject, "end"))?;

    let mut per_task = BTreeMap::new();
    let mut cost_unknown = Vec::new();
    let mut unresolved_tasks = Vec::new();

    for (qualified, attempts) in metadata.calls()? {
        let key = if per_task.contains_key(short_name(qualified)) {
            qualified.clone()
        } else {
            short_name(qualified).to_string()
        };
        match task_stats(qualified, attempts, prices, ordering) {
            Ok(stats) => {
                if stats.estimated_cost.is_none() {
                    cost_unknown.push(key.clone());
                }
                per_task.insert(key, stats);
            }
            Err(e) => {
                tracing::warn!(
                    "Skipping task '{}' of workflow {}: {}",
                    qualified,
                    metadata.id,
                    e
                );
                unresolved_tasks.push(UnresolvedTask {
                    task: key,
                    reason: e.to_string(),
                });
            }
        }
    }

    let total_cost = per_task.values().filter_map(|t| t.estimated_cost).sum();
    let total_cpu_h = per_task.values().filter_map(|t| t.cpu_hours).sum();

    Ok(ExecutionStats {
        workflow_id: metadata.id.clone(),
        workflow_name: metadata.workflow_name.clone(),
        per_task,
        total_runtime_h,
        total_cpu_h,
        total_cost,
        start_time,
        cost_unknown,
        unresolved_tasks,
    })
}

pub fn task_stats(
    task: &str,
    attempts: &[CallAttempt],
    prices: &PriceTable,
    ordering: AttemptOrdering,
) -> Result<TaskStats, DomainError> {
    let reconciled = reconcile(task, attempts, ordering)?;
    let billed: Vec<&CallAttempt> = attempts.iter().filter(|a| !a.is_cache_hit()).collect();
    let final_billed: Vec<&CallAttempt> = reconciled
        .finals
        .iter()
        .copied()
        .filter(|a| !a.is_cache_hit())
        .collect();

    let billable_time_h = final_billed.iter().map(|a| billable_hours(a)).sum();
    let total_attempts_time_h = billed.iter().map(|a| billable_hours(a)).sum();
    let max_single_preemption_time_h = reconciled
        .preempted
        .iter()
        .filter(|a| !a.is_cache_hit())
        .filter_map(|a| wall_hours(a))
        .reduce(f64::max);

    let estimated_cost = match billed
        .iter()
        .map(|a| attempt_cost(a, prices))
        .sum::<Result<f64, DomainError>>()
    {
        Ok(cost) => Some(cost),
        Err(e) => {
            tracing::warn!("Cost unknown for task '{}': {}", task, e);
            None
        }
    };

    let cpu_hours = final_billed
        .iter()
        .map(|a| {
            a.machine_class()
                .and_then(core_count)
                .map(|cores| billable_hours(a) * f64::from(cores))
        })
        .sum::<Option<f64>>();

    Ok(TaskStats {
        billable_time_h,
        total_attempts_time_h,
        max_single_preemption_time_h,
        attempt_count: billed.len(),
        last_machine_class: attempts
            .last()
            .and_then(|a| a.machine_class())
            .map(str::to_string),
        start_time: attempts.iter().filter_map(|a| a.start).min(),
        estimated_cost,
        cpu_hours,
        job_ids: reconciled
            .finals
            .iter()
            .filter_map(|a| a.job_id.clone())
            .collect(),
        cache_hit: billed.is_empty(),
    })
}

fn attempt_cost(attempt: &CallAttempt, prices: &PriceTable) -> Result<f64, DomainError> {
    let machine_class = attempt.machine_class().unwrap_or("<unspecified>");
    let rate = prices.hourly_rate(machine_class, attempt.preemptible)?;
    Ok(billable_hours(attempt) * rate)
}

/// Succeeded executions of one workflow, keyed by entity id.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WorkflowStats {
    pub workflow_name: String,
    pub executions: BTreeMap<String, ExecutionStats>,
}

impl WorkflowStats {
    /// Longest single execution; executions run side by side so this approximates wall time.
    pub fn max_runtime_h(&self) -> f64 {
        self.executions
            .values()
            .map(|e| e.total_runtime_h)
            .fold(0.0, f64::max)
    }

    pub fn total_cpu_h(&self) -> f64 {
        self.executions.values().map(|e| e.total_cpu_h).sum()
    }

    pub fn total_cost(&self) -> f64 {
        self.executions.values().map(|e| e.total_cost).sum()
    }
}

pub fn group_by_workflow(
    stats: impl IntoIterator<Item = (String, ExecutionStats)>,
) -> BTreeMap<String, WorkflowStats> {
    let mut groups: BTreeMap<String, WorkflowStats> = BTreeMap::new();
    for (entity_id, execution) in stats {
        let group = groups
            .entry(execution.workflow_name.clone())
            .or_insert_with(|| WorkflowStats {
                workflow_name: execution.workflow_name.clone(),
                executions: BTreeMap::new(),
            });
        group.executions.insert(entity_id, execution);
    }
    groups
}
