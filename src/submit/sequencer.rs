//! Submission sequencer: run one document through the ordered chain.

use anyhow::{Context, Result};
use farmline_db::models::Document;
use tracing::{debug, info};

use crate::config::CompiledSettings;
use crate::farm::client::FarmClient;
use crate::farm::types::JobId;
use crate::submit::stages::Submitter;

/// One submitted stage of a chain.
#[derive(Debug, Clone)]
pub struct SubmittedJob {
    pub stage: String,
    pub job_id: JobId,
}

/// Submit the chain for one document, stage by stage.
///
/// Each job depends on the previously submitted one; stages that build no
/// job (mapped duplicates on render-type stages) are skipped without
/// breaking the chain. A submission failure aborts the rest of the chain,
/// already-submitted jobs stay on the farm.
pub async fn run_chain(
    farm: &dyn FarmClient,
    compiled: &CompiledSettings,
    document: &Document,
    submitters: &[Submitter],
) -> Result<Vec<SubmittedJob>> {
    let mut submitted = Vec::new();
    let mut last_job: Option<JobId> = None;

    for submitter in submitters {
        let Some((mut job, plugin)) = submitter.build_job(document, compiled)? else {
            debug!(stage = %submitter.name, sid = %document.sid, "stage skipped");
            continue;
        };

        if let Some(dependency) = &last_job {
            job.dependencies.push(dependency.clone());
        }

        let job_id = farm.submit(&job, &plugin).await.with_context(|| {
            format!(
                "Failed to submit stage '{}' for {}",
                submitter.name, document.sid
            )
        })?;
        debug!(stage = %submitter.name, sid = %document.sid, job = %job_id, "job submitted");

        last_job = Some(job_id.clone());
        submitted.push(SubmittedJob {
            stage: submitter.name.clone(),
            job_id,
        });
    }

    info!(
        sid = %document.sid,
        jobs = submitted.len(),
        "submission chain finished"
    );
    Ok(submitted)
}
