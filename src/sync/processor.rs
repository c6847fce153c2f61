//! Row processor: one table pass for one pipeline.
//!
//! Turns data rows into documents of a single generation. Row-level issues
//! (skip predicates, hook rejections, duplicate sids) are non-fatal and land
//! in the pass stats; database failures and cancellation abort the pass so
//! the surrounding transaction can roll back.

use anyhow::Result;
use farmline_common::{Error, FieldMap};
use farmline_db::models::Document;
use farmline_db::queries::documents;
use rusqlite::Connection;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

use crate::config::CompiledSettings;
use crate::naming::{self, identity, MergedView};
use crate::sync::hooks::{HookDecision, PipelineHooks};
use crate::table::ProductTable;

/// Counters for one processed pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PassStats {
    pub rows_seen: usize,
    pub rows_skipped: usize,
    pub documents_written: usize,
    pub duplicates_mapped: usize,
    pub warnings: Vec<String>,
}

/// Process every data row of a table into documents of one generation.
///
/// Per row: stringify cells under the named header columns, apply skip
/// predicates, run the pre-process hook, fan out over the perspective set,
/// and per perspective compute the sid, detect rendering-output duplicates
/// (first sight is canonical, later ones get `mapping` set), resolve the
/// preview, and upsert by sid.
pub fn process_rows(
    conn: &Connection,
    table: &dyn ProductTable,
    compiled: &CompiledSettings,
    generation: i64,
    hooks: &dyn PipelineHooks,
    progress: &dyn Fn(f32, &str),
    cancel: &AtomicBool,
) -> Result<PassStats> {
    let columns: Vec<(usize, &str)> = table
        .header()
        .iter()
        .enumerate()
        .filter_map(|(index, name)| name.as_deref().map(|n| (index, n)))
        .collect();

    let rows = table.rows();
    let total = rows.len().max(1);

    let mut stats = PassStats::default();
    let mut seen_sids: HashSet<String> = HashSet::new();
    let mut rendering_to_document: HashMap<String, String> = HashMap::new();

    for (row_index, row) in rows.iter().enumerate() {
        if cancel.load(Ordering::Relaxed) {
            return Err(Error::Cancelled.into());
        }
        stats.rows_seen += 1;

        // Stringify and zip under the named header columns; empty cells stay
        // None in the field map
        let mut fields = FieldMap::new();
        let mut raw_values: Vec<String> = Vec::new();
        for (column_index, name) in &columns {
            let value = row
                .get(*column_index)
                .and_then(|cell| cell.to_string_value());
            if let Some(ref v) = value {
                raw_values.push(v.clone());
            }
            fields.insert((*name).to_string(), value);
        }

        if raw_values.is_empty() {
            // Fully blank row, common at the end of hand-edited sheets
            stats.rows_skipped += 1;
            continue;
        }

        if let Some(rule) = compiled.matches_skip_rule(&fields) {
            debug!(row = row_index, %rule, "row skipped by predicate");
            stats.rows_skipped += 1;
            continue;
        }

        match hooks.pre_process(&mut fields) {
            HookDecision::Accept => {}
            HookDecision::Reject(reason) => {
                warn!(row = row_index, %reason, "row rejected by pipeline hook");
                stats
                    .warnings
                    .push(format!("row {}: {}", row_index + 1, reason));
                stats.rows_skipped += 1;
                continue;
            }
        }

        // Perspective fan-out: an explicit row value pins exactly one
        let perspectives: Vec<String> = match fields
            .get(&compiled.settings.perspective_column)
            .and_then(|v| v.as_deref())
            .filter(|v| !v.is_empty())
        {
            Some(explicit) => vec![explicit.to_string()],
            None if !compiled.settings.perspectives.is_empty() => {
                compiled.settings.perspectives.clone()
            }
            None => vec![String::new()],
        };

        for perspective in &perspectives {
            let mut doc_fields = fields.clone();
            doc_fields.insert("perspective".to_string(), Some(perspective.clone()));

            let sid = {
                let view = MergedView::new(&doc_fields, compiled.view());
                identity::compute_sid(
                    &view,
                    compiled.template_for("sid_template", perspective),
                    &raw_values,
                    perspective,
                    &compiled.collection,
                )
            };
            doc_fields.insert("sid".to_string(), Some(sid.clone()));

            let mut document = Document::new(compiled.collection.clone(), generation, sid);
            document.perspective = perspective.clone();
            document.fields = doc_fields;

            match hooks.post_process(&mut document) {
                HookDecision::Accept => {}
                HookDecision::Reject(reason) => {
                    warn!(row = row_index, %perspective, %reason, "perspective rejected by pipeline hook");
                    stats
                        .warnings
                        .push(format!("row {} [{}]: {}", row_index + 1, perspective, reason));
                    continue;
                }
            }

            // First sight of a sid wins; later duplicates in the pass are dropped
            if !seen_sids.insert(document.sid.clone()) {
                warn!(sid = %document.sid, row = row_index, "duplicate sid in pass, skipped");
                stats
                    .warnings
                    .push(format!("row {}: duplicate sid '{}'", row_index + 1, document.sid));
                continue;
            }

            let rendering = naming::rendering_name(compiled, &document.fields, perspective);
            match rendering_to_document.get(&rendering) {
                Some(canonical) => {
                    document.mapping = Some(canonical.clone());
                    stats.duplicates_mapped += 1;
                }
                None => {
                    rendering_to_document.insert(rendering, document.sid.clone());
                    document.mapping = None;
                }
            }

            let preview = naming::preview_name(compiled, &document.fields, perspective);
            document
                .fields
                .insert("preview".to_string(), Some(preview.clone()));
            document.preview = Some(preview);

            documents::upsert_document(conn, &document)?;
            stats.documents_written += 1;
        }

        progress(
            (row_index + 1) as f32 / total as f32,
            &format!("{}/{} rows", row_index + 1, rows.len()),
        );
    }

    Ok(stats)
}
