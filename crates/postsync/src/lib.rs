//! Additive Postgres schema synchronization for Rust entities.
//!
//! This crate provides:
//! - Entity registration (types implementing [`Entity`], collected through `inventory`)
//! - Schema introspection of a live database
//! - Schema diffing and SQL generation
//! - A one-shot synchronizer that creates missing tables, columns and indices
//!
//! # Naming Convention
//!
//! Table names are whatever the entity declares; indices default to
//! `idx_{table}_{columns}` (see [`index_name`]).
//!
//! # Synchronizing
//!
//! ```ignore
//! postsync::config::load_dotenv()?;
//! let config = postsync::Config::from_env()?;
//! let report = postsync::run(&config, postsync::Schema::collect()).await?;
//! ```
//!
//! Synchronization is additive only. Drops, renames and alterations of
//! existing columns are detected and reported, never executed.

pub mod config;
mod diff;
mod error;
pub mod introspect;
pub mod schema;
mod sync;
mod traced;

pub use config::{Config, ConfigError};
pub use diff::{Change, SchemaDiff, SchemaDiffExt, TableDiff, diff_schemas};
pub use error::Error;
pub use introspect::{introspect, introspect_tables};
pub use schema::{
    Column, Entity, Index, PgType, Schema, SchemaCodegen, Table, TableDef, index_name,
    quote_ident,
};
pub use sync::{SchemaSync, SkippedChange, SyncReport, connect, run};
pub use traced::{ClientExt, TracedClient};

// Re-export inventory so entity crates can register tables
pub use inventory;

/// Result type for postsync operations.
pub type Result<T> = std::result::Result<T, Error>;
