//! # sqlsnap
//!
//! Deterministic schema snapshots for SQL Server databases
//!
//! This crate provides a CLI tool and library for scripting the schema of a
//! live SQL Server database (tables, views, stored procedures, functions,
//! synonyms) into a stable, diff-friendly text document suitable as a
//! baseline for snapshot-style testing.

pub mod config;
pub mod error;
pub mod schema;
pub mod settings;
pub mod snapshot;
pub mod source;

pub mod prelude {
    pub use crate::config::DbConfig;
    pub use crate::error::SqlSnapError;
    pub use crate::schema::{ObjectKind, SchemaObject, ScriptOptions};
    pub use crate::settings::{NameFilter, SchemaSettings};
    pub use crate::snapshot::{SnapshotBuilder, NO_MATCHES_SENTINEL};
    pub use crate::source::{MssqlSchemaSource, SchemaSource};
}

pub use source::MssqlSchemaSource;
