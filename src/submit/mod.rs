//! Farm job submission.
//!
//! [`order`] resolves the persisted submitter sequence and heals it,
//! [`stages`] builds one farm job per stage and document, and [`sequencer`]
//! drives a document through the ordered stages with dependency chaining.

pub mod order;
pub mod sequencer;
pub mod stages;

pub use order::{ordered_submitters, submitter_entries};
pub use sequencer::{run_chain, SubmittedJob};
pub use stages::{StageKind, Submitter};
