//! Database query modules.
//!
//! This module organizes all database operations into logical groups:
//! - collections: Collection bookkeeping and the live-generation pointer
//! - documents: Document upserts, listing, and generation cleanup

use chrono::{DateTime, NaiveDateTime, Utc};

pub mod collections;
pub mod documents;

/// Parse a stored timestamp.
///
/// Rows written from Rust carry RFC 3339; rows created through SQL column
/// defaults carry SQLite's `datetime('now')` format.
pub(crate) fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|naive| naive.and_utc())
        })
        .unwrap_or_default()
}
