//! Snapshot building
//!
//! This module assembles the snapshot document: one section per enabled
//! object kind, in a fixed order, each section holding a fenced block per
//! eligible object. The Tables section is post-processed to scrub default
//! option clauses. The result is deterministic: the same database state
//! always produces byte-identical output.

use tracing::{debug, info, trace};

use crate::config::DbConfig;
use crate::error::SqlSnapError;
use crate::schema::{ObjectKind, ScriptOptions};
use crate::settings::SchemaSettings;
use crate::source::{MssqlSchemaSource, SchemaSource};

pub mod render;
pub mod scrub;

/// Returned when every section came up empty.
pub const NO_MATCHES_SENTINEL: &str = "-- No matching items found";

/// Builds schema snapshot documents.
pub struct SnapshotBuilder {
    settings: SchemaSettings,
}

impl SnapshotBuilder {
    pub fn new(settings: SchemaSettings) -> Self {
        Self { settings }
    }

    /// Open a connection from `config`, build the snapshot, and release the
    /// connection when done. Connecting is the only suspension point beyond
    /// the metadata queries themselves.
    pub async fn build_from_config(&self, config: &DbConfig) -> Result<String, SqlSnapError> {
        info!(
            connection = ?config.redacted_connection_string(),
            "Connecting to SQL Server"
        );
        let mut source = MssqlSchemaSource::connect(config).await?;
        self.build(&mut source).await
    }

    /// Build the snapshot from an already-open source.
    ///
    /// Sections and objects are rendered strictly in sequence; ordering in
    /// the output document depends on it. The first enumeration or
    /// scripting error aborts the whole build.
    pub async fn build<S: SchemaSource>(&self, source: &mut S) -> Result<String, SqlSnapError> {
        let options = ScriptOptions::default();
        let mut buffer = String::new();

        for kind in ObjectKind::ALL {
            if !self.settings.kind_enabled(kind) {
                debug!(kind = ?kind, "Kind disabled, skipping");
                continue;
            }

            self.append_section(&mut buffer, source, kind, &options)
                .await?;

            if kind == ObjectKind::Table {
                scrub::scrub_table_settings(&mut buffer);
            }
        }

        let result = buffer.trim_end();
        if result.is_empty() {
            info!("No matching objects, returning sentinel");
            return Ok(NO_MATCHES_SENTINEL.to_string());
        }

        Ok(result.to_string())
    }

    /// Emit the section for one kind: heading, one block per eligible
    /// object in enumeration order, one trailing blank line. Kinds with no
    /// eligible objects contribute nothing at all.
    async fn append_section<S: SchemaSource>(
        &self,
        buffer: &mut String,
        source: &mut S,
        kind: ObjectKind,
        options: &ScriptOptions,
    ) -> Result<(), SqlSnapError> {
        let objects = source.objects(kind).await?;
        let total = objects.len();

        let eligible: Vec<_> = objects
            .into_iter()
            .filter(|object| self.settings.includes(object))
            .collect();
        debug!(kind = ?kind, total = total, eligible = eligible.len(), "Enumerated objects");

        if eligible.is_empty() {
            return Ok(());
        }

        buffer.push_str("## ");
        buffer.push_str(kind.type_name());
        buffer.push_str("s\n");

        for object in &eligible {
            trace!(kind = ?kind, name = ?object.name, "Scripting object");
            let lines = source.script(object, options).await?;
            render::append_block(buffer, &object.name, &lines);
        }

        buffer.push('\n');
        Ok(())
    }
}
