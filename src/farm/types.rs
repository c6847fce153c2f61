use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Identifier of a submitted farm job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub String);

impl JobId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// One expected output of a job: target directory plus file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPair {
    pub directory: PathBuf,
    pub filename: String,
}

/// Typed description of one farm job.
///
/// The farm itself speaks a flat key-value format; [`JobInfo::to_wire`] does
/// the flattening so the rest of the code never handles raw wire keys.
#[derive(Debug, Clone, PartialEq)]
pub struct JobInfo {
    pub plugin: String,
    pub name: String,
    pub batch_name: String,
    pub priority: u8,
    pub pool: String,
    pub secondary_pool: Option<String>,
    pub group: Option<String>,
    pub initial_status: String,
    pub dependencies: Vec<JobId>,
    pub outputs: Vec<OutputPair>,
    pub task_timeout_minutes: Option<u32>,
    pub whitelist: Vec<String>,
    pub blacklist: Vec<String>,
}

impl JobInfo {
    /// Flatten to the farm's wire keys. Empty optional fields are omitted
    /// entirely; output pairs become numbered
    /// `OutputDirectoryN`/`OutputFilenameN` keys.
    pub fn to_wire(&self) -> BTreeMap<String, String> {
        let mut wire = BTreeMap::new();
        wire.insert("Plugin".to_string(), self.plugin.clone());
        wire.insert("Name".to_string(), self.name.clone());
        wire.insert("BatchName".to_string(), self.batch_name.clone());
        wire.insert("Priority".to_string(), self.priority.to_string());
        wire.insert("InitialStatus".to_string(), self.initial_status.clone());

        if !self.pool.is_empty() {
            wire.insert("Pool".to_string(), self.pool.clone());
        }
        if let Some(pool) = self.secondary_pool.as_ref().filter(|p| !p.is_empty()) {
            wire.insert("SecondaryPool".to_string(), pool.clone());
        }
        if let Some(group) = self.group.as_ref().filter(|g| !g.is_empty()) {
            wire.insert("Group".to_string(), group.clone());
        }
        if !self.dependencies.is_empty() {
            let joined: Vec<&str> = self.dependencies.iter().map(JobId::as_str).collect();
            wire.insert("JobDependencies".to_string(), joined.join(","));
        }
        for (index, output) in self.outputs.iter().enumerate() {
            wire.insert(
                format!("OutputDirectory{}", index),
                output.directory.to_string_lossy().into_owned(),
            );
            wire.insert(format!("OutputFilename{}", index), output.filename.clone());
        }
        if let Some(timeout) = self.task_timeout_minutes {
            wire.insert("TaskTimeoutMinutes".to_string(), timeout.to_string());
        }
        if !self.whitelist.is_empty() {
            wire.insert("Whitelist".to_string(), self.whitelist.join(","));
        }
        if !self.blacklist.is_empty() {
            wire.insert("Blacklist".to_string(), self.blacklist.join(","));
        }
        wire
    }
}

/// Plugin-specific job parameters, already in wire form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginInfo(pub BTreeMap<String, String>);

impl PluginInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }
}
