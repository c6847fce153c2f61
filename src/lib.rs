//! Farmline - Render pipeline sync and farm submission tool
//!
//! This library crate exposes the core functionality for integration testing.

pub mod config;
pub mod farm;
pub mod naming;
pub mod submit;
pub mod sync;
pub mod table;
pub mod worker;
