//! Conversions from platform timestamps to billable durations.

use crate::constants::events;
use crate::model::{CallAttempt, WorkflowMetadata};
use chrono::{DateTime, Utc};

const SECONDS_PER_HOUR: f64 = 3600.0;

pub fn hours_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_milliseconds() as f64 / 1000.0 / SECONDS_PER_HOUR
}

/// Wall-clock hours of an attempt, or `None` while it is still running.
pub fn wall_hours(attempt: &CallAttempt) -> Option<f64> {
    match (attempt.start, attempt.end) {
        (Some(start), Some(end)) => Some(hours_between(start, end)),
        _ => None,
    }
}

/// Hours spent in "waiting for quota" events, clamped to the attempt's own interval.
pub fn quota_wait_hours(attempt: &CallAttempt) -> f64 {
    let (Some(start), Some(end)) = (attempt.start, attempt.end) else {
        return 0.0;
    };
    attempt
        .execution_events
        .iter()
        .filter(|e| e.description == events::WAITING_FOR_QUOTA)
        .map(|e| {
            let from = e.start_time.max(start);
            let to = e.end_time.min(end);
            if to > from {
                hours_between(from, to)
            } else {
                0.0
            }
        })
        .sum()
}

/// Billable hours of an attempt: wall time minus quota waits. Unfinished attempts bill nothing.
pub fn billable_hours(attempt: &CallAttempt) -> f64 {
    match wall_hours(attempt) {
        Some(wall) => (wall - quota_wait_hours(attempt)).max(0.0),
        None => {
            tracing::debug!(
                "Attempt {} has no end time; counting zero billable hours",
                attempt.job_id.as_deref().unwrap_or("<no job id>")
            );
            0.0
        }
    }
}

pub fn workflow_hours(metadata: &WorkflowMetadata) -> Option<f64> {
    match (metadata.start, metadata.end) {
        (Some(start), Some(end)) => Some(hours_between(start, end)),
        _ => None,
    }
}
