//! Transactional table reload.
//!
//! A reload stages all rows into a target generation inside one transaction.
//! In replace mode the target is the successor of the live generation; the
//! live pointer only moves after the pass succeeds, so readers never observe
//! a half-loaded collection and a failed pass leaves the previous data
//! untouched.

use anyhow::{Context, Result};
use farmline_db::queries::{collections, documents};
use rusqlite::Connection;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use tracing::{debug, info};

use crate::config::CompiledSettings;
use crate::sync::hooks::PipelineHooks;
use crate::sync::processor::process_rows;
use crate::table;

/// Options for one reload run.
#[derive(Debug, Clone, Default)]
pub struct ReloadOptions {
    /// Workbook sheet to read. Defaults to the first sheet; ignored for
    /// delimited files.
    pub sheet: Option<String>,
    /// Stage into a fresh generation and retire the current one on success
    /// instead of upserting into the live generation.
    pub replace_existing: bool,
    /// Run the full pass and report, then roll everything back.
    pub dry_run: bool,
    /// Field delimiter override for delimited files.
    pub delimiter: Option<u8>,
}

/// Outcome of one reload run.
#[derive(Debug, Clone)]
pub struct ReloadReport {
    pub collection: String,
    pub generation: i64,
    pub rows_seen: usize,
    pub rows_skipped: usize,
    pub documents_written: usize,
    pub duplicates_mapped: usize,
    pub warnings: Vec<String>,
}

/// Reload a product table into the pipeline's collection.
///
/// The entire run, including the live-generation flip and the purge of
/// retired generations, happens in one transaction. Errors and cancellation
/// roll it back; `dry_run` rolls back unconditionally after reporting.
pub fn reload_table(
    conn: &mut Connection,
    table_path: &Path,
    options: &ReloadOptions,
    compiled: &CompiledSettings,
    hooks: &dyn PipelineHooks,
    progress: &dyn Fn(f32, &str),
    cancel: &AtomicBool,
) -> Result<ReloadReport> {
    let table = table::open_table(table_path, options.sheet.as_deref(), options.delimiter)
        .with_context(|| format!("Failed to open table {}", table_path.display()))?;
    let observed_columns: Vec<String> = table
        .header
        .iter()
        .filter_map(|name| name.clone())
        .collect();

    info!(
        collection = %compiled.collection,
        table = %table_path.display(),
        rows = table.rows.len(),
        replace = options.replace_existing,
        dry_run = options.dry_run,
        "starting reload"
    );

    let tx = conn.transaction()?;

    let collection = collections::ensure_collection(&tx, &compiled.collection)?;
    let live = collection.live_generation;
    let target_generation =
        if options.replace_existing && documents::count_documents(&tx, &compiled.collection, live)? > 0 {
            live + 1
        } else {
            live
        };

    let stats = process_rows(
        &tx,
        &table,
        compiled,
        target_generation,
        hooks,
        progress,
        cancel,
    )?;

    if target_generation != live {
        collections::set_live_generation(&tx, &compiled.collection, target_generation)?;
    }
    let purged = documents::purge_older_generations(&tx, &compiled.collection, target_generation)?;
    if purged > 0 {
        debug!(collection = %compiled.collection, purged, "retired previous generations");
    }
    collections::merge_columns(&tx, &compiled.collection, &observed_columns)?;

    if options.dry_run {
        tx.rollback()?;
    } else {
        tx.commit()?;
    }

    let report = ReloadReport {
        collection: compiled.collection.clone(),
        generation: target_generation,
        rows_seen: stats.rows_seen,
        rows_skipped: stats.rows_skipped,
        documents_written: stats.documents_written,
        duplicates_mapped: stats.duplicates_mapped,
        warnings: stats.warnings,
    };

    info!(
        collection = %report.collection,
        generation = report.generation,
        written = report.documents_written,
        skipped = report.rows_skipped,
        mapped = report.duplicates_mapped,
        "reload finished"
    );

    Ok(report)
}
