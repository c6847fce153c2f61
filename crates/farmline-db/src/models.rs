//! Internal Rust models matching the database schema.
//!
//! This module provides strongly-typed Rust structures that map to database
//! tables. All models use types from farmline-common where appropriate.

use chrono::{DateTime, Utc};
use farmline_common::FieldMap;
use serde::{Deserialize, Serialize};

/// Pipeline collection model.
///
/// One row per synced collection. `live_generation` designates which
/// generation of documents observers see; `columns` records every header
/// column ever observed for the collection, in first-seen order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Collection {
    pub name: String,
    pub live_generation: i64,
    pub columns: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Synced document model, one per deliverable-per-perspective.
///
/// `sid` is unique within one generation of a collection. `mapping` holds the
/// sid of the canonical document when this one is a duplicate (same resolved
/// rendering output), and is `None` for canonical documents. `fields` carries
/// every table-derived column; empty source cells stay `None` so callers can
/// tell "blank in the sheet" from "column absent".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub collection: String,
    pub generation: i64,
    pub sid: String,
    pub perspective: String,
    pub mapping: Option<String>,
    pub preview: Option<String>,
    pub fields: FieldMap,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Create a new document in the given collection and generation.
    pub fn new(collection: impl Into<String>, generation: i64, sid: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            collection: collection.into(),
            generation,
            sid: sid.into(),
            perspective: String::new(),
            mapping: None,
            preview: None,
            fields: FieldMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Look up a field by column name, treating empty cells as absent.
    pub fn field(&self, column: &str) -> Option<&str> {
        self.fields
            .get(column)
            .and_then(|v| v.as_deref())
            .filter(|v| !v.is_empty())
    }
}
