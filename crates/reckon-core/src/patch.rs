//! Recovers entity attributes that a finished task produced but that were never written back.
//!
//! An execution that fails after some of its tasks completed leaves the outputs of those
//! tasks in the call metadata only. Planning a repair compares the entity's attributes
//! against the configuration's declared outputs and proposes values for the missing ones.

use crate::constants::attributes;
use crate::errors::DomainError;
use crate::model::{short_name, CallAttempt, Entity, MethodConfig, WorkflowMetadata, WorkflowStatus};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Declared outputs of a method configuration: output key → entity attribute.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputMap {
    entries: Vec<(String, String)>,
}

impl OutputMap {
    pub fn from_config(config: &MethodConfig) -> Self {
        let entries = config
            .outputs
            .iter()
            .filter_map(|(key, target)| match target.strip_prefix(attributes::ENTITY_PREFIX) {
                Some(attr) if !attr.is_empty() => {
                    Some((short_name(key).to_string(), attr.to_string()))
                }
                _ => {
                    tracing::debug!(
                        "Ignoring output '{}' of configuration '{}': target '{}' is not an entity attribute",
                        key,
                        config.name,
                        target
                    );
                    None
                }
            })
            .collect();
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn attribute_for(&self, output_key: &str) -> Option<&str> {
        let key = short_name(output_key);
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, attr)| attr.as_str())
    }

    fn position(&self, output_key: &str) -> Option<usize> {
        let key = short_name(output_key);
        self.entries.iter().position(|(k, _)| k == key)
    }

    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(_, attr)| attr.as_str())
    }
}

pub fn missing_attributes(entity: &Entity, outputs: &OutputMap) -> BTreeSet<String> {
    outputs
        .attributes()
        .filter(|attr| entity.is_missing(attr))
        .map(str::to_string)
        .collect()
}

pub fn select_incomplete<'a>(entities: &'a [Entity], outputs: &OutputMap) -> Vec<&'a Entity> {
    entities
        .iter()
        .filter(|e| !missing_attributes(e, outputs).is_empty())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "task", rename_all = "kebab-case")]
pub enum RepairSource {
    WorkflowOutputs,
    Task(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputRepair {
    pub entity_id: String,
    pub source: RepairSource,
    pub attributes: BTreeMap<String, Value>,
}

impl OutputRepair {
    pub fn apply_to(&self, entity: &mut Entity) {
        for (attr, value) in &self.attributes {
            entity.attributes.insert(attr.clone(), value.clone());
        }
    }
}

/// Plans the writes that fill `entity`'s missing attributes from its latest execution.
pub fn plan_repairs(
    entity: &Entity,
    metadata: &WorkflowMetadata,
    outputs: &OutputMap,
) -> Result<Vec<OutputRepair>, DomainError> {
    let mut missing = missing_attributes(entity, outputs);
    if missing.is_empty() {
        return Ok(Vec::new());
    }

    if metadata.status == WorkflowStatus::Succeeded {
        if let Some(values) = complete_workflow_outputs(metadata, outputs) {
            let attributes: BTreeMap<String, Value> = values
                .into_iter()
                .filter(|(attr, _)| missing.contains(attr))
                .collect();
            if attributes.is_empty() {
                return Ok(Vec::new());
            }
            tracing::info!(
                "Workflow {} succeeded but {} attributes of '{}' were never written",
                metadata.id,
                attributes.len(),
                entity.name
            );
            return Ok(vec![OutputRepair {
                entity_id: entity.name.clone(),
                source: RepairSource::WorkflowOutputs,
                attributes,
            }]);
        }
    }

    let mut candidates: Vec<(usize, &str, &BTreeMap<String, Value>)> = metadata
        .calls()?
        .iter()
        .filter_map(|(task, attempts)| {
            let outputs_of_task = finished_outputs(attempts)?;
            let order = outputs_of_task
                .keys()
                .map(|k| outputs.position(k))
                .collect::<Option<Vec<_>>>()?
                .into_iter()
                .min()?;
            Some((order, task.as_str(), outputs_of_task))
        })
        .collect();
    candidates.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

    let mut repairs = Vec::new();
    for (_, task, task_outputs) in candidates {
        let attributes: BTreeMap<String, Value> = task_outputs
            .iter()
            .filter_map(|(k, v)| {
                let attr = outputs.attribute_for(k)?;
                missing.contains(attr).then(|| (attr.to_string(), v.clone()))
            })
            .collect();
        if attributes.is_empty() {
            continue;
        }
        for attr in attributes.keys() {
            missing.remove(attr);
        }
        repairs.push(OutputRepair {
            entity_id: entity.name.clone(),
            source: RepairSource::Task(short_name(task).to_string()),
            attributes,
        });
    }
    Ok(repairs)
}

/// Workflow outputs mapped onto attributes, if they cover every declared attribute.
fn complete_workflow_outputs(
    metadata: &WorkflowMetadata,
    outputs: &OutputMap,
) -> Option<BTreeMap<String, Value>> {
    let recorded = metadata.recorded_outputs()?;
    let mapped: BTreeMap<String, Value> = recorded
        .iter()
        .filter_map(|(k, v)| outputs.attribute_for(k).map(|a| (a.to_string(), v.clone())))
        .collect();
    outputs
        .attributes()
        .all(|attr| mapped.contains_key(attr))
        .then_some(mapped)
}

/// Outputs of an unsharded task's final attempt. A single shard's outputs never stand in
/// for the whole task.
fn finished_outputs(attempts: &[CallAttempt]) -> Option<&BTreeMap<String, Value>> {
    let last = attempts.last()?;
    if last.shard().is_some() {
        return None;
    }
    last.outputs.as_ref().filter(|o| !o.is_empty())
}
