//! Farmline-DB: Database schema, migrations, and query operations
//!
//! This crate provides database functionality for farmline using SQLite
//! with rusqlite and r2d2 connection pooling.
//!
//! # Modules
//!
//! - `migrations` - Database schema migrations
//! - `pool` - Connection pool management
//! - `models` - Rust models matching database schema
//! - `queries` - Database query operations
//!
//! # Example
//!
//! ```no_run
//! use farmline_db::pool::{init_pool, get_conn};
//! use farmline_db::queries::collections;
//!
//! let pool = init_pool("/var/lib/farmline/db.sqlite").unwrap();
//! let conn = get_conn(&pool).unwrap();
//!
//! let collection = collections::ensure_collection(&conn, "Spots").unwrap();
//! println!("live generation: {}", collection.live_generation);
//! ```

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
