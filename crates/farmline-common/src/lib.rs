//! Farmline-common: error and domain types shared across the farmline crates.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{collection_name, FieldMap, PipelineKind};
