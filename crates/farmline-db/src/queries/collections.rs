//! Collection bookkeeping queries.
//!
//! A collection row tracks which document generation is live and which header
//! columns have been observed across reloads. The live-generation pointer is
//! what makes a reload commit atomic: staged rows become visible the moment
//! the pointer moves.

use chrono::Utc;
use farmline_common::{Error, Result};
use rusqlite::Connection;

use crate::models::Collection;
use crate::queries::parse_timestamp;

/// Parse a collection from a database row.
fn parse_collection_row(row: &rusqlite::Row) -> rusqlite::Result<Collection> {
    let columns_json: String = row.get(2)?;

    Ok(Collection {
        name: row.get(0)?,
        live_generation: row.get(1)?,
        columns: serde_json::from_str(&columns_json).unwrap_or_default(),
        created_at: parse_timestamp(&row.get::<_, String>(3)?),
        updated_at: parse_timestamp(&row.get::<_, String>(4)?),
    })
}

/// Get a collection by name.
///
/// # Returns
///
/// * `Ok(Some(Collection))` - The collection if found
/// * `Ok(None)` - If the collection does not exist
/// * `Err(Error)` - If a database error occurs
pub fn get_collection(conn: &Connection, name: &str) -> Result<Option<Collection>> {
    let result = conn.query_row(
        "SELECT name, live_generation, columns, created_at, updated_at
         FROM collections WHERE name = :name",
        rusqlite::named_params! { ":name": name },
        parse_collection_row,
    );

    match result {
        Ok(collection) => Ok(Some(collection)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// Get a collection by name, creating it with defaults if missing.
///
/// A fresh collection starts at live generation 1 with no recorded columns.
///
/// # Arguments
///
/// * `conn` - Database connection
/// * `name` - Collection name
///
/// # Returns
///
/// * `Ok(Collection)` - The existing or newly created collection
/// * `Err(Error)` - If a database error occurs
pub fn ensure_collection(conn: &Connection, name: &str) -> Result<Collection> {
    if let Some(existing) = get_collection(conn, name)? {
        return Ok(existing);
    }

    let now = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO collections (name, live_generation, columns, created_at, updated_at)
         VALUES (:name, 1, '[]', :now, :now)",
        rusqlite::named_params! { ":name": name, ":now": now },
    )
    .map_err(|e| Error::database(e.to_string()))?;

    get_collection(conn, name)?
        .ok_or_else(|| Error::internal(format!("collection '{}' vanished after insert", name)))
}

/// List all collections, ordered by name.
pub fn list_collections(conn: &Connection) -> Result<Vec<Collection>> {
    let mut stmt = conn
        .prepare(
            "SELECT name, live_generation, columns, created_at, updated_at
             FROM collections ORDER BY name ASC",
        )
        .map_err(|e| Error::database(e.to_string()))?;

    let rows = stmt
        .query_map([], parse_collection_row)
        .map_err(|e| Error::database(e.to_string()))?;

    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| Error::database(e.to_string()))
}

/// Move the collection's live-generation pointer.
///
/// # Returns
///
/// * `Ok(())` - If the pointer was updated
/// * `Err(Error::NotFound)` - If the collection does not exist
pub fn set_live_generation(conn: &Connection, name: &str, generation: i64) -> Result<()> {
    let updated = conn
        .execute(
            "UPDATE collections SET live_generation = :generation, updated_at = :now
             WHERE name = :name",
            rusqlite::named_params! {
                ":name": name,
                ":generation": generation,
                ":now": Utc::now().to_rfc3339(),
            },
        )
        .map_err(|e| Error::database(e.to_string()))?;

    if updated == 0 {
        return Err(Error::not_found(format!("collection '{}'", name)));
    }
    Ok(())
}

/// Merge newly observed header columns into the collection's column record.
///
/// Existing columns keep their position; columns not seen before are appended
/// in observation order. Returns the merged list.
pub fn merge_columns(conn: &Connection, name: &str, observed: &[String]) -> Result<Vec<String>> {
    let collection = get_collection(conn, name)?
        .ok_or_else(|| Error::not_found(format!("collection '{}'", name)))?;

    let mut merged = collection.columns;
    for column in observed {
        if !merged.iter().any(|c| c == column) {
            merged.push(column.clone());
        }
    }

    let columns_json =
        serde_json::to_string(&merged).map_err(|e| Error::internal(e.to_string()))?;
    conn.execute(
        "UPDATE collections SET columns = :columns, updated_at = :now WHERE name = :name",
        rusqlite::named_params! {
            ":name": name,
            ":columns": columns_json,
            ":now": Utc::now().to_rfc3339(),
        },
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(merged)
}
