//! Table synchronization: ingest a product table into document collections.
//!
//! A sync run opens the table, stages every row into one generation inside a
//! single database transaction and flips the collection's live generation on
//! success. Any failure, including cancellation, rolls the whole run back.

pub mod hooks;
pub mod processor;
pub mod reload;

pub use hooks::{hooks_for, HookDecision, PipelineHooks};
pub use processor::{process_rows, PassStats};
pub use reload::{reload_table, ReloadOptions, ReloadReport};

/// Progress callback: completion fraction in `0.0..=1.0` plus a short label.
pub type ProgressCallback = Box<dyn Fn(f32, &str) + Send + Sync>;
