use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "farmline")]
#[command(author, version, about = "Render pipeline sync and farm submission tool")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sync a product table into a pipeline's document collection
    Sync {
        /// Table file (.csv, .tsv, .txt, .xlsx, .xls, .ods)
        #[arg(required = true)]
        table: PathBuf,

        /// Pipeline name or collection name
        #[arg(short, long)]
        pipeline: String,

        /// Workbook sheet to read (first sheet if not specified)
        #[arg(long)]
        sheet: Option<String>,

        /// Replace the current documents instead of updating in place
        #[arg(long)]
        replace: bool,

        /// Run the full pass and report without writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Submit documents to the render farm
    Submit {
        /// Pipeline name or collection name
        #[arg(short, long)]
        pipeline: String,

        /// Document to submit (repeatable)
        #[arg(long = "sid")]
        sids: Vec<String>,

        /// Submit every document of the live generation
        #[arg(long)]
        all: bool,

        /// Stage names to submit, comma separated (default: all stages)
        #[arg(long, value_delimiter = ',')]
        stages: Vec<String>,

        /// Record the jobs without sending them to the farm
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the resolved submitter order of a pipeline
    Stages {
        /// Pipeline name or collection name
        #[arg(short, long)]
        pipeline: String,
    },

    /// List the synced documents of a pipeline
    Docs {
        /// Pipeline name or collection name
        #[arg(short, long)]
        pipeline: String,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
