//! Shared domain types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Field map of one document: column name to stringified cell value.
///
/// `None` marks a column whose source cell was empty, as opposed to a column
/// that was absent from the table entirely. Ordered so that serialized field
/// blobs and hash inputs are deterministic.
pub type FieldMap = BTreeMap<String, Option<String>>;

/// Pipeline kind, selecting the default stage set and the DCC plugin family
/// used when building farm jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineKind {
    Max,
    Maya,
}

impl PipelineKind {
    /// Scene file extension produced by this kind's scene-building stages.
    pub fn scene_extension(&self) -> &'static str {
        match self {
            PipelineKind::Max => "max",
            PipelineKind::Maya => "ma",
        }
    }
}

impl std::str::FromStr for PipelineKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "max" | "3dsmax" => Ok(Self::Max),
            "maya" => Ok(Self::Maya),
            _ => Err(format!("Unknown pipeline kind: {}", s)),
        }
    }
}

impl std::fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineKind::Max => write!(f, "max"),
            PipelineKind::Maya => write!(f, "maya"),
        }
    }
}

/// Derive the document collection name for a pipeline display name.
///
/// Collection names are the display name with spaces removed, so
/// "Interior Shots" and "InteriorShots" address the same collection.
pub fn collection_name(display_name: &str) -> String {
    display_name.chars().filter(|c| !c.is_whitespace()).collect()
}
