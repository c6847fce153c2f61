//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which creates an in-memory DB and a compiled
//! "Test" pipeline rooted in a scratch directory, plus CSV fixtures for
//! reload runs.

use std::io::Write;
use std::path::Path;
use std::sync::atomic::AtomicBool;

use tempfile::{NamedTempFile, TempDir};

use farmline::config::{CompiledSettings, PipelineSettings};
use farmline::sync::{hooks_for, reload_table, ReloadOptions, ReloadReport};
use farmline_common::PipelineKind;
use farmline_db::pool::{get_conn, init_memory_pool, DbPool, PooledConnection};

/// Test harness wrapping an in-memory database and one compiled pipeline
/// whose output root lives in a scratch directory.
pub struct TestHarness {
    pub db: DbPool,
    pub compiled: CompiledSettings,
    _root: TempDir,
}

impl TestHarness {
    /// Create a harness for a Max pipeline named "Test" with default settings.
    pub fn new() -> Self {
        Self::with_settings(|_| {})
    }

    /// Create a harness with adjusted pipeline settings.
    pub fn with_settings(mutate: impl FnOnce(&mut PipelineSettings)) -> Self {
        let root = TempDir::new().expect("failed to create scratch dir");
        let mut settings = PipelineSettings {
            name: "Test".to_string(),
            kind: PipelineKind::Max,
            output_root: root.path().to_path_buf(),
            ..Default::default()
        };
        mutate(&mut settings);

        Self {
            db: init_memory_pool().expect("failed to create in-memory pool"),
            compiled: CompiledSettings::compile(settings).expect("failed to compile settings"),
            _root: root,
        }
    }

    /// Get a database connection from the pool.
    pub fn conn(&self) -> PooledConnection {
        get_conn(&self.db).expect("failed to get db connection")
    }

    /// Run one reload of the given table into the harness pipeline.
    pub fn reload(&self, table: &Path, options: &ReloadOptions) -> anyhow::Result<ReloadReport> {
        let mut conn = self.conn();
        let hooks = hooks_for(self.compiled.settings.kind);
        reload_table(
            &mut conn,
            table,
            options,
            &self.compiled,
            hooks.as_ref(),
            &|_, _| {},
            &AtomicBool::new(false),
        )
    }
}

/// Write CSV content to a temp file carrying a `.csv` suffix.
pub fn write_csv(content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".csv")
        .tempfile()
        .expect("failed to create temp csv");
    file.write_all(content.as_bytes())
        .expect("failed to write csv");
    file.flush().expect("failed to flush csv");
    file
}
