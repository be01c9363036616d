//! Splits a task's raw attempt log into final attempts and their preempted antecedents.
//!
//! The platform appends attempts to a call's log as they happen. For a plain call the last
//! entry is the one that counts. For a scattered call every shard index has its own history
//! and the last entry seen for an index is that shard's final attempt.

use crate::errors::DomainError;
use crate::model::CallAttempt;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// How attempts within one shard are put in chronological order. A plain call always
/// keeps the platform's list order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttemptOrdering {
    /// Trust the order in which the platform listed the attempts.
    #[default]
    ListOrder,
    /// Sort each shard's attempts by their start timestamp first.
    StartTime,
}

impl fmt::Display for AttemptOrdering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptOrdering::ListOrder => write!(f, "list-order"),
            AttemptOrdering::StartTime => write!(f, "start-time"),
        }
    }
}

impl FromStr for AttemptOrdering {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "list-order" => Ok(AttemptOrdering::ListOrder),
            "start-time" => Ok(AttemptOrdering::StartTime),
            _ => Err(format!(
                "invalid attempt ordering: '{}'. Valid values are: list-order, start-time",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation<'a> {
    /// One attempt per shard (exactly one for a plain call), in order of first appearance.
    pub finals: Vec<&'a CallAttempt>,
    pub preempted: Vec<&'a CallAttempt>,
    pub sharded: bool,
}

impl Reconciliation<'_> {
    pub fn total(&self) -> usize {
        self.finals.len() + self.preempted.len()
    }
}

const UNSHARDED: i64 = -1;

pub fn reconcile<'a>(
    task: &str,
    attempts: &'a [CallAttempt],
    ordering: AttemptOrdering,
) -> Result<Reconciliation<'a>, DomainError> {
    let first = attempts.first().ok_or_else(|| {
        DomainError::UnexpectedPlatformShape(format!("task '{}' has no attempts", task))
    })?;
    let sharded = first.shard().is_some();
    if attempts.iter().any(|a| a.shard().is_some() != sharded) {
        return Err(DomainError::UnexpectedPlatformShape(format!(
            "task '{}' mixes sharded and unsharded attempts",
            task
        )));
    }

    let mut shard_order: Vec<i64> = Vec::new();
    let mut by_shard: HashMap<i64, Vec<&'a CallAttempt>> = HashMap::new();
    for attempt in attempts {
        let key = attempt.shard().unwrap_or(UNSHARDED);
        by_shard
            .entry(key)
            .or_insert_with(|| {
                shard_order.push(key);
                Vec::new()
            })
            .push(attempt);
    }

    let mut finals = Vec::with_capacity(shard_order.len());
    let mut preempted = Vec::with_capacity(attempts.len() - shard_order.len());

    for key in shard_order {
        let Some(mut log) = by_shard.remove(&key) else {
            continue;
        };
        if sharded && ordering == AttemptOrdering::StartTime {
            log.sort_by_key(|a| a.start);
        }
        let Some((last, earlier)) = log.split_last() else {
            continue;
        };
        if sharded {
            check_shard_order(task, key, earlier, last, ordering)?;
        }
        finals.push(*last);
        preempted.extend(earlier.iter().copied());
    }

    Ok(Reconciliation {
        finals,
        preempted,
        sharded,
    })
}

fn check_shard_order(
    task: &str,
    shard: i64,
    earlier: &[&CallAttempt],
    last: &CallAttempt,
    ordering: AttemptOrdering,
) -> Result<(), DomainError> {
    let violation = if !last.is_done() && earlier.iter().any(|a| a.is_done()) {
        Some(format!(
            "an earlier attempt completed but the final attempt is '{}'",
            last.execution_status.as_deref().unwrap_or("unknown")
        ))
    } else if ordering == AttemptOrdering::ListOrder
        && last
            .start
            .is_some_and(|final_start| earlier.iter().any(|a| a.start.is_some_and(|s| s > final_start)))
    {
        Some("an earlier attempt started after the final attempt".to_string())
    } else {
        None
    };

    match violation {
        Some(detail) => {
            tracing::warn!(
                "Attempt log of task '{}' shard {} is out of order: {}",
                task,
                shard,
                detail
            );
            Err(DomainError::AttemptOrderViolation {
                task: task.to_string(),
                shard,
                detail,
            })
        }
        None => Ok(()),
    }
}
