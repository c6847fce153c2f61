mod cli;

use farmline::{config, farm, submit, sync, worker};
use farmline_db::pool::{init_pool, DbPool};
use farmline_db::queries::{collections, documents};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "farmline=trace,farmline_db=debug,farmline_common=debug,farmline_template=debug"
                .to_string()
        } else {
            "farmline=debug,farmline_db=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Sync {
            table,
            pipeline,
            sheet,
            replace,
            dry_run,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(sync_table(
                &table,
                &pipeline,
                sheet,
                replace,
                dry_run,
                cli.config.as_deref(),
            ))
        }
        Commands::Submit {
            pipeline,
            sids,
            all,
            stages,
            dry_run,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(submit_documents(
                &pipeline,
                sids,
                all,
                stages,
                dry_run,
                cli.config.as_deref(),
            ))
        }
        Commands::Stages { pipeline } => show_stages(&pipeline, cli.config.as_deref()),
        Commands::Docs { pipeline } => list_docs(&pipeline, cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("farmline {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Open the database next to the config file unless the config names a path.
fn open_pool(config: &config::Config, config_path: Option<&Path>) -> Result<DbPool> {
    let db_path: PathBuf = config.database.clone().unwrap_or_else(|| {
        config_path
            .and_then(|p| p.parent())
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_default())
            .join("farmline.db")
    });
    tracing::info!("Opening database at {}", db_path.display());
    Ok(init_pool(&db_path.to_string_lossy())?)
}

fn print_progress(fraction: f32, message: &str) {
    print!("\r  {:>5.1}% {}", fraction * 100.0, message);
    let _ = std::io::stdout().flush();
}

/// Flip the worker's cancel flag on Ctrl-C so long passes stop between rows.
fn install_cancel_handler(worker: &worker::Worker) {
    let cancel = worker.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nInterrupted, stopping after the current row");
            cancel.store(true, Ordering::Relaxed);
        }
    });
}

async fn sync_table(
    table: &Path,
    pipeline: &str,
    sheet: Option<String>,
    replace: bool,
    dry_run: bool,
    config_path: Option<&Path>,
) -> Result<()> {
    if !table.exists() {
        anyhow::bail!("Table file does not exist: {:?}", table);
    }

    let config = config::load_config_or_default(config_path)?;
    let compiled = config::compile_pipeline(&config, pipeline)?;
    let pool = open_pool(&config, config_path)?;
    let worker = worker::Worker::new(pool);
    install_cancel_handler(&worker);

    let options = sync::ReloadOptions {
        sheet,
        replace_existing: replace,
        dry_run,
        delimiter: None,
    };

    println!("Syncing {} into '{}'", table.display(), compiled.collection);
    let report = worker
        .reload(
            table.to_path_buf(),
            options,
            compiled,
            Box::new(print_progress),
        )
        .await?;
    println!();

    println!(
        "Collection: {} (generation {})",
        report.collection, report.generation
    );
    println!(
        "Rows: {} seen, {} skipped",
        report.rows_seen, report.rows_skipped
    );
    println!(
        "Documents: {} written, {} mapped to duplicates",
        report.documents_written, report.duplicates_mapped
    );
    for warning in &report.warnings {
        println!("  warning: {}", warning);
    }
    if dry_run {
        println!("\n[DRY RUN] Nothing was written");
    }

    Ok(())
}

async fn submit_documents(
    pipeline: &str,
    sids: Vec<String>,
    all: bool,
    stages: Vec<String>,
    dry_run: bool,
    config_path: Option<&Path>,
) -> Result<()> {
    if sids.is_empty() && !all {
        anyhow::bail!("Specify --sid at least once, or --all for every document");
    }

    let config = config::load_config_or_default(config_path)?;
    if !dry_run && !config.farm.enabled {
        anyhow::bail!("Farm submission is disabled in the config; use --dry-run to preview");
    }
    let compiled = config::compile_pipeline(&config, pipeline)?;

    // Resolve the chain up front and write the healed order back so the next
    // run starts from a clean list
    let ordered = submit::ordered_submitters(&compiled.settings);
    let entries = submit::submitter_entries(&ordered);
    if entries != compiled.settings.submitters {
        if let Some(path) = config::find_config_file(config_path) {
            config::persist::update_submitters(&path, &compiled.settings.name, &entries)
                .context("Failed to persist the healed submitter order")?;
            tracing::info!("Healed submitter order written to {}", path.display());
        }
    }

    let pool = open_pool(&config, config_path)?;
    let worker = worker::Worker::new(pool);
    install_cancel_handler(&worker);

    let recording = farm::RecordingFarm::new();
    let http;
    let farm_client: &dyn farm::FarmClient = if dry_run {
        &recording
    } else {
        http = farm::HttpFarmClient::new(&config.farm);
        &http
    };

    let stage_filter = if stages.is_empty() {
        None
    } else {
        Some(stages.as_slice())
    };

    let results = worker
        .submit(
            farm_client,
            &compiled,
            &sids,
            stage_filter,
            Box::new(print_progress),
        )
        .await?;
    println!();

    for (sid, jobs) in &results {
        println!("{}:", sid);
        for job in jobs {
            println!("  {} -> {}", job.stage, job.job_id);
        }
        if jobs.is_empty() {
            println!("  (no stages apply)");
        }
    }

    if dry_run {
        println!("\n[DRY RUN] Would submit {} jobs:", recording.len());
        for (job, _) in recording.submitted() {
            println!("  {} [{}] priority {}", job.name, job.plugin, job.priority);
        }
    }

    Ok(())
}

fn show_stages(pipeline: &str, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let compiled = config::compile_pipeline(&config, pipeline)?;

    let ordered = submit::ordered_submitters(&compiled.settings);
    println!("Submission order for '{}':", compiled.settings.name);
    for (index, submitter) in ordered.iter().enumerate() {
        let priority = (compiled.settings.base_priority as i16
            + submitter.kind.priority_offset())
        .clamp(0, 100);
        println!(
            "  {}. {} ({}, priority {})",
            index + 1,
            submitter.name,
            submitter.kind.class_name(),
            priority
        );
    }

    Ok(())
}

fn list_docs(pipeline: &str, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let compiled = config::compile_pipeline(&config, pipeline)?;
    let pool = open_pool(&config, config_path)?;
    let conn = pool.get()?;

    let Some(collection) = collections::get_collection(&conn, &compiled.collection)? else {
        println!("Collection '{}' has not been synced yet", compiled.collection);
        let known = collections::list_collections(&conn)?;
        if !known.is_empty() {
            let names: Vec<&str> = known.iter().map(|c| c.name.as_str()).collect();
            println!("Synced collections: {}", names.join(", "));
        }
        return Ok(());
    };

    let docs = documents::list_documents(&conn, &collection.name, collection.live_generation)?;
    println!(
        "{} documents in '{}' (generation {}):",
        docs.len(),
        collection.name,
        collection.live_generation
    );
    for doc in &docs {
        print!("  {}", doc.sid);
        if !doc.perspective.is_empty() {
            print!(" [{}]", doc.perspective);
        }
        if let Some(ref mapping) = doc.mapping {
            print!(" -> maps to {}", mapping);
        }
        println!();
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path
        .map(Path::to_path_buf)
        .or_else(|| config::find_config_file(None))
    {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(&p)?;
            println!("✓ Configuration is valid");
            println!(
                "  Farm: {} (enabled: {})",
                config.farm.url, config.farm.enabled
            );
            println!("  Pipelines: {}", config.pipelines.len());
            for pipeline in &config.pipelines {
                println!(
                    "    {} -> collection '{}' ({}, {} custom tasks)",
                    pipeline.name,
                    pipeline.collection(),
                    pipeline.kind,
                    pipeline.custom_tasks.len()
                );
            }
        }
        None => {
            println!("No config file found, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!(
                "  Farm: {} (enabled: {})",
                config.farm.url, config.farm.enabled
            );
        }
    }

    Ok(())
}
