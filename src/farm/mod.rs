//! Render farm access.
//!
//! [`types`] carries the typed job description and its flattening to the
//! farm's flat key-value wire format; [`client`] talks to the farm's HTTP
//! API and provides the in-memory recorder used by tests and dry runs.

pub mod client;
pub mod types;

pub use client::{FarmClient, HttpFarmClient, RecordingFarm};
pub use types::{JobId, JobInfo, OutputPair, PluginInfo};
