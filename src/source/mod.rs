//! Schema sources
//!
//! A schema source is the live-server capability the snapshot builder
//! consumes: per object kind, an enumeration of named objects with their
//! system-object flag, and a scripting operation producing raw DDL lines
//! for one object. The builder never mutates what a source returns.

use crate::error::SqlSnapError;
use crate::schema::{ObjectKind, SchemaObject, ScriptOptions};

/// Live-server handle the builder renders from.
///
/// `&mut self` makes exclusive use explicit: a source accumulates
/// handle-local state (an open connection, in-flight query streams) and must
/// not be shared between concurrent builds.
#[allow(async_fn_in_trait)]
pub trait SchemaSource {
    /// Enumerate all objects of one kind, in the backing store's stable
    /// order. Name and system flag are fetched together, one round-trip
    /// per kind.
    async fn objects(&mut self, kind: ObjectKind) -> Result<Vec<SchemaObject>, SqlSnapError>;

    /// Produce the raw DDL lines for one object.
    async fn script(
        &mut self,
        object: &SchemaObject,
        options: &ScriptOptions,
    ) -> Result<Vec<String>, SqlSnapError>;
}

mod mssql;

pub use mssql::MssqlSchemaSource;
