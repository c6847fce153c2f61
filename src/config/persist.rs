//! Configuration persistence using toml_edit to preserve formatting and comments.
//!
//! Submitter-order and custom-task edits come from user reordering, so only
//! the affected pipeline section is rewritten; everything else in the file
//! keeps its layout.

use super::{CustomTaskConfig, SubmitterEntry};
use anyhow::{Context, Result};
use std::path::Path;
use toml_edit::DocumentMut;

/// Update just the submitter order of one pipeline in the config file
pub fn update_submitters(path: &Path, pipeline: &str, submitters: &[SubmitterEntry]) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut doc: DocumentMut = content
        .parse()
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    // Serialize submitters to TOML
    let submitters_toml = toml::to_string(&SubmittersWrapper {
        submitters: submitters.to_vec(),
    })
    .with_context(|| "Failed to serialize submitters")?;
    let submitters_doc: DocumentMut = submitters_toml
        .parse()
        .with_context(|| "Failed to parse serialized submitters")?;

    let table = pipeline_table(&mut doc, pipeline, path)?;

    // Replace the submitters array
    if let Some(item) = submitters_doc.get("submitters") {
        table["submitters"] = item.clone();
    } else {
        table.remove("submitters");
    }

    std::fs::write(path, doc.to_string())
        .with_context(|| format!("Failed to write config file: {:?}", path))?;

    Ok(())
}

/// Update just the custom tasks of one pipeline in the config file
pub fn update_custom_tasks(
    path: &Path,
    pipeline: &str,
    custom_tasks: &[CustomTaskConfig],
) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut doc: DocumentMut = content
        .parse()
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    // Serialize custom tasks to TOML
    let tasks_toml = toml::to_string(&CustomTasksWrapper {
        custom_tasks: custom_tasks.to_vec(),
    })
    .with_context(|| "Failed to serialize custom tasks")?;
    let tasks_doc: DocumentMut = tasks_toml
        .parse()
        .with_context(|| "Failed to parse serialized custom tasks")?;

    let table = pipeline_table(&mut doc, pipeline, path)?;

    // Replace the custom_tasks array
    if let Some(item) = tasks_doc.get("custom_tasks") {
        table["custom_tasks"] = item.clone();
    } else {
        table.remove("custom_tasks");
    }

    std::fs::write(path, doc.to_string())
        .with_context(|| format!("Failed to write config file: {:?}", path))?;

    Ok(())
}

/// Find the `[[pipelines]]` table with the given name.
fn pipeline_table<'a>(
    doc: &'a mut DocumentMut,
    pipeline: &str,
    path: &Path,
) -> Result<&'a mut toml_edit::Table> {
    doc.get_mut("pipelines")
        .and_then(|item| item.as_array_of_tables_mut())
        .with_context(|| format!("No [[pipelines]] section in config file: {:?}", path))?
        .iter_mut()
        .find(|table| {
            table.get("name").and_then(|v| v.as_str()) == Some(pipeline)
                || table
                    .get("name")
                    .and_then(|v| v.as_str())
                    .map(farmline_common::collection_name)
                    .as_deref()
                    == Some(pipeline)
        })
        .with_context(|| format!("Pipeline '{}' not found in config file: {:?}", pipeline, path))
}

// Wrapper structs for serialization
#[derive(serde::Serialize)]
struct SubmittersWrapper {
    submitters: Vec<SubmitterEntry>,
}

#[derive(serde::Serialize)]
struct CustomTasksWrapper {
    custom_tasks: Vec<CustomTaskConfig>,
}
