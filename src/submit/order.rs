//! Submitter order resolution.
//!
//! The submission order is persisted per pipeline so users can reorder
//! stages. Resolution rehydrates the persisted entries and heals the list:
//! unknown classes and orphaned custom-task entries are dropped, missing
//! built-in stages and custom tasks are appended. The result always contains
//! every required stage exactly once.

use std::collections::BTreeSet;
use tracing::warn;

use crate::config::{PipelineSettings, SubmitterEntry};
use crate::submit::stages::{StageKind, Submitter};

/// Built-in stages in canonical chain order.
const CANONICAL_STAGES: [StageKind; 5] = [
    StageKind::InputScene,
    StageKind::RenderScene,
    StageKind::Rendering,
    StageKind::Compositing,
    StageKind::DeliveryCopy,
];

/// Resolve the submission chain for a pipeline.
pub fn ordered_submitters(settings: &PipelineSettings) -> Vec<Submitter> {
    let mut resolved: Vec<Submitter> = Vec::new();
    let mut seen: BTreeSet<String> = BTreeSet::new();

    for entry in &settings.submitters {
        if seen.contains(&entry.name) {
            warn!(name = %entry.name, "duplicate submitter entry dropped");
            continue;
        }
        let Some(kind) = StageKind::from_class_name(&entry.class_name) else {
            warn!(
                name = %entry.name,
                class = %entry.class_name,
                "unknown submitter class dropped"
            );
            continue;
        };

        let submitter = if kind == StageKind::CustomTask {
            match settings.custom_tasks.iter().find(|t| t.name == entry.name) {
                Some(task) => Submitter::custom(task.clone()),
                None => {
                    warn!(name = %entry.name, "custom task entry without task settings dropped");
                    continue;
                }
            }
        } else {
            Submitter {
                name: entry.name.clone(),
                kind,
                custom_task: None,
            }
        };

        seen.insert(entry.name.clone());
        resolved.push(submitter);
    }

    for kind in CANONICAL_STAGES {
        if seen.insert(kind.stage_name().to_string()) {
            resolved.push(Submitter::stage(kind));
        }
    }

    for task in &settings.custom_tasks {
        if seen.insert(task.name.clone()) {
            resolved.push(Submitter::custom(task.clone()));
        }
    }

    resolved
}

/// Entries to persist for a resolved chain.
pub fn submitter_entries(submitters: &[Submitter]) -> Vec<SubmitterEntry> {
    submitters
        .iter()
        .map(|submitter| SubmitterEntry {
            name: submitter.name.clone(),
            class_name: submitter.kind.class_name().to_string(),
        })
        .collect()
}
