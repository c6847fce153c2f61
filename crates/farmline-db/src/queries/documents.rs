//! Document queries.
//!
//! Documents are addressed by (collection, generation, sid). Reload passes
//! upsert by sid; duplicate detection and perspective handling happen upstream
//! in the sync layer, so these queries stay plain CRUD plus the generation
//! cleanup that runs at commit time.

use farmline_common::{Error, Result};
use rusqlite::Connection;

use crate::models::Document;
use crate::queries::parse_timestamp;

/// Parse a document from a database row.
fn parse_document_row(row: &rusqlite::Row) -> rusqlite::Result<Document> {
    let fields_json: String = row.get(6)?;

    Ok(Document {
        collection: row.get(0)?,
        generation: row.get(1)?,
        sid: row.get(2)?,
        perspective: row.get(3)?,
        mapping: row.get(4)?,
        preview: row.get(5)?,
        fields: serde_json::from_str(&fields_json).unwrap_or_default(),
        created_at: parse_timestamp(&row.get::<_, String>(7)?),
        updated_at: parse_timestamp(&row.get::<_, String>(8)?),
    })
}

const DOCUMENT_COLUMNS: &str = "collection, generation, sid, perspective, mapping, preview, \
                                fields, created_at, updated_at";

/// Insert or update a document.
///
/// If a document with the same (collection, generation, sid) exists it is
/// overwritten; `created_at` is preserved across updates.
///
/// # Arguments
///
/// * `conn` - Database connection
/// * `document` - Document to upsert
///
/// # Returns
///
/// * `Ok(())` - If the operation succeeded
/// * `Err(Error)` - If a database error occurs
pub fn upsert_document(conn: &Connection, document: &Document) -> Result<()> {
    let fields_json =
        serde_json::to_string(&document.fields).map_err(|e| Error::internal(e.to_string()))?;

    conn.execute(
        "INSERT INTO documents (
            collection, generation, sid, perspective, mapping, preview,
            fields, created_at, updated_at
         ) VALUES (
            :collection, :generation, :sid, :perspective, :mapping, :preview,
            :fields, :created_at, :updated_at
         )
         ON CONFLICT(collection, generation, sid) DO UPDATE SET
            perspective = :perspective,
            mapping = :mapping,
            preview = :preview,
            fields = :fields,
            updated_at = :updated_at",
        rusqlite::named_params! {
            ":collection": &document.collection,
            ":generation": document.generation,
            ":sid": &document.sid,
            ":perspective": &document.perspective,
            ":mapping": &document.mapping,
            ":preview": &document.preview,
            ":fields": fields_json,
            ":created_at": document.created_at.to_rfc3339(),
            ":updated_at": document.updated_at.to_rfc3339(),
        },
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(())
}

/// Get a document by sid within one generation of a collection.
///
/// # Returns
///
/// * `Ok(Some(Document))` - The document if found
/// * `Ok(None)` - If the document does not exist
/// * `Err(Error)` - If a database error occurs
pub fn get_document(
    conn: &Connection,
    collection: &str,
    generation: i64,
    sid: &str,
) -> Result<Option<Document>> {
    let result = conn.query_row(
        &format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents
             WHERE collection = :collection AND generation = :generation AND sid = :sid"
        ),
        rusqlite::named_params! {
            ":collection": collection,
            ":generation": generation,
            ":sid": sid,
        },
        parse_document_row,
    );

    match result {
        Ok(document) => Ok(Some(document)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// List all documents in one generation of a collection, ordered by sid.
pub fn list_documents(
    conn: &Connection,
    collection: &str,
    generation: i64,
) -> Result<Vec<Document>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents
             WHERE collection = :collection AND generation = :generation
             ORDER BY sid ASC"
        ))
        .map_err(|e| Error::database(e.to_string()))?;

    let rows = stmt
        .query_map(
            rusqlite::named_params! { ":collection": collection, ":generation": generation },
            parse_document_row,
        )
        .map_err(|e| Error::database(e.to_string()))?;

    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| Error::database(e.to_string()))
}

/// List the sids in one generation of a collection, ordered by sid.
pub fn list_sids(conn: &Connection, collection: &str, generation: i64) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare(
            "SELECT sid FROM documents
             WHERE collection = :collection AND generation = :generation
             ORDER BY sid ASC",
        )
        .map_err(|e| Error::database(e.to_string()))?;

    let rows = stmt
        .query_map(
            rusqlite::named_params! { ":collection": collection, ":generation": generation },
            |row| row.get::<_, String>(0),
        )
        .map_err(|e| Error::database(e.to_string()))?;

    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| Error::database(e.to_string()))
}

/// Count documents in one generation of a collection.
pub fn count_documents(conn: &Connection, collection: &str, generation: i64) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM documents
         WHERE collection = :collection AND generation = :generation",
        rusqlite::named_params! { ":collection": collection, ":generation": generation },
        |row| row.get(0),
    )
    .map_err(|e| Error::database(e.to_string()))
}

/// Delete every document of the collection older than the given generation.
///
/// Runs at reload commit: once the live pointer has moved, superseded
/// generations are dead weight.
///
/// # Returns
///
/// * `Ok(usize)` - Number of documents deleted
pub fn purge_older_generations(
    conn: &Connection,
    collection: &str,
    keep_generation: i64,
) -> Result<usize> {
    conn.execute(
        "DELETE FROM documents
         WHERE collection = :collection AND generation < :keep",
        rusqlite::named_params! { ":collection": collection, ":keep": keep_generation },
    )
    .map_err(|e| Error::database(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{init_memory_pool, PooledConnection};
    use crate::queries::collections;
    use chrono::Utc;

    fn setup_test_db() -> PooledConnection {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        collections::ensure_collection(&conn, "Test").unwrap();
        conn
    }

    fn sample(sid: &str, generation: i64) -> Document {
        let mut doc = Document::new("Test", generation, sid);
        doc.fields.insert("Name".into(), Some("John".into()));
        doc.fields.insert("Notes".into(), None);
        doc
    }

    #[test]
    fn test_upsert_and_get_roundtrip() {
        let conn = setup_test_db();
        let doc = sample("john_Test", 1);
        upsert_document(&conn, &doc).unwrap();

        let stored = get_document(&conn, "Test", 1, "john_Test")
            .unwrap()
            .unwrap();
        assert_eq!(stored.sid, "john_Test");
        assert_eq!(stored.fields.get("Name"), Some(&Some("John".to_string())));
        // Empty source cells survive the JSON roundtrip as None
        assert_eq!(stored.fields.get("Notes"), Some(&None));
        assert!(stored.mapping.is_none());
    }

    #[test]
    fn test_upsert_overwrites_but_keeps_created_at() {
        let conn = setup_test_db();
        let doc = sample("john_Test", 1);
        upsert_document(&conn, &doc).unwrap();
        let first = get_document(&conn, "Test", 1, "john_Test")
            .unwrap()
            .unwrap();

        let mut updated = sample("john_Test", 1);
        updated.mapping = Some("bob_Test".into());
        updated.created_at = Utc::now();
        upsert_document(&conn, &updated).unwrap();

        let second = get_document(&conn, "Test", 1, "john_Test")
            .unwrap()
            .unwrap();
        assert_eq!(second.mapping.as_deref(), Some("bob_Test"));
        assert_eq!(second.created_at, first.created_at);
    }

    #[test]
    fn test_get_document_wrong_generation() {
        let conn = setup_test_db();
        upsert_document(&conn, &sample("john_Test", 1)).unwrap();

        assert!(get_document(&conn, "Test", 2, "john_Test")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_list_documents_ordered() {
        let conn = setup_test_db();
        upsert_document(&conn, &sample("b_Test", 1)).unwrap();
        upsert_document(&conn, &sample("a_Test", 1)).unwrap();
        upsert_document(&conn, &sample("c_Test", 2)).unwrap();

        let sids: Vec<String> = list_documents(&conn, "Test", 1)
            .unwrap()
            .into_iter()
            .map(|d| d.sid)
            .collect();
        assert_eq!(sids, vec!["a_Test".to_string(), "b_Test".to_string()]);
        assert_eq!(list_sids(&conn, "Test", 2).unwrap(), vec!["c_Test"]);
    }

    #[test]
    fn test_purge_older_generations() {
        let conn = setup_test_db();
        upsert_document(&conn, &sample("a_Test", 1)).unwrap();
        upsert_document(&conn, &sample("b_Test", 1)).unwrap();
        upsert_document(&conn, &sample("a_Test", 2)).unwrap();

        let purged = purge_older_generations(&conn, "Test", 2).unwrap();
        assert_eq!(purged, 2);
        assert_eq!(count_documents(&conn, "Test", 1).unwrap(), 0);
        assert_eq!(count_documents(&conn, "Test", 2).unwrap(), 1);
    }
}
