//! Worker: runs sync and submission tasks off the caller's thread.
//!
//! Table reloads are blocking (file IO plus a long write transaction) and go
//! through `spawn_blocking`; submission is IO-bound on the farm API and runs
//! on the async runtime. One coarse cancel flag covers both, polled between
//! rows and between documents.

use anyhow::{Context, Result};
use farmline_common::Error;
use farmline_db::models::Document;
use farmline_db::pool::DbPool;
use farmline_db::queries::{collections, documents};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::CompiledSettings;
use crate::farm::client::FarmClient;
use crate::submit::order::ordered_submitters;
use crate::submit::sequencer::{run_chain, SubmittedJob};
use crate::sync::{hooks_for, reload_table, ProgressCallback, ReloadOptions, ReloadReport};

pub struct Worker {
    pool: DbPool,
    cancel: Arc<AtomicBool>,
}

impl Worker {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get a clone of the cancel flag for external control.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn request_cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Run one table reload on a blocking worker thread.
    pub async fn reload(
        &self,
        table_path: PathBuf,
        options: ReloadOptions,
        compiled: CompiledSettings,
        progress: ProgressCallback,
    ) -> Result<ReloadReport> {
        let pool = self.pool.clone();
        let cancel = Arc::clone(&self.cancel);
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            let hooks = hooks_for(compiled.settings.kind);
            reload_table(
                &mut conn,
                &table_path,
                &options,
                &compiled,
                hooks.as_ref(),
                &|fraction, message| progress(fraction, message),
                &cancel,
            )
        })
        .await
        .context("Reload task panicked")?
    }

    /// Submit documents through their stage chains.
    ///
    /// `sids` empty means every document of the live generation; `stages`
    /// narrows the resolved chain by stage name.
    pub async fn submit(
        &self,
        farm: &dyn FarmClient,
        compiled: &CompiledSettings,
        sids: &[String],
        stages: Option<&[String]>,
        progress: ProgressCallback,
    ) -> Result<Vec<(String, Vec<SubmittedJob>)>> {
        let selected = self.load_documents(compiled, sids)?;
        let mut chain = ordered_submitters(&compiled.settings);
        if let Some(filter) = stages {
            chain.retain(|submitter| filter.iter().any(|name| name == &submitter.name));
            if chain.is_empty() {
                anyhow::bail!("No stages left after filtering");
            }
        }

        let total = selected.len().max(1);
        let mut results = Vec::new();
        for (index, document) in selected.iter().enumerate() {
            if self.cancel.load(Ordering::Relaxed) {
                return Err(Error::Cancelled.into());
            }
            let submitted = run_chain(farm, compiled, document, &chain).await?;
            progress((index + 1) as f32 / total as f32, &document.sid);
            results.push((document.sid.clone(), submitted));
        }
        Ok(results)
    }

    fn load_documents(
        &self,
        compiled: &CompiledSettings,
        sids: &[String],
    ) -> Result<Vec<Document>> {
        let conn = self.pool.get()?;
        let collection = collections::get_collection(&conn, &compiled.collection)?
            .ok_or_else(|| Error::not_found(format!("collection '{}'", compiled.collection)))?;
        let generation = collection.live_generation;

        if sids.is_empty() {
            return Ok(documents::list_documents(
                &conn,
                &compiled.collection,
                generation,
            )?);
        }

        sids.iter()
            .map(|sid| -> Result<Document> {
                documents::get_document(&conn, &compiled.collection, generation, sid)?.ok_or_else(
                    || {
                        Error::not_found(format!(
                            "document '{}' in collection '{}'",
                            sid, compiled.collection
                        ))
                        .into()
                    },
                )
            })
            .collect()
    }
}
