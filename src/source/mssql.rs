//! SQL Server schema source
//!
//! Enumerates schema objects from the system catalog views and scripts each
//! one as DDL text in the shape the server's own tooling emits, so the
//! downstream scrubbing rules apply cleanly. All metadata is queried fresh
//! per build; nothing is cached on the handle.

use tiberius::{AuthMethod, Client, Config, Row};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::{debug, info, trace};

use super::SchemaSource;
use crate::config::DbConfig;
use crate::error::SqlSnapError;
use crate::schema::{ObjectKind, SchemaObject, ScriptOptions};

type SqlClient = Client<Compat<TcpStream>>;

/// Option list scripted on inline PRIMARY KEY / UNIQUE constraints.
const CONSTRAINT_OPTIONS: &str = "PAD_INDEX = OFF, STATISTICS_NORECOMPUTE = OFF, \
     IGNORE_DUP_KEY = OFF, ALLOW_ROW_LOCKS = ON, ALLOW_PAGE_LOCKS = ON, \
     OPTIMIZE_FOR_SEQUENTIAL_KEY = OFF";

/// Option list scripted on standalone CREATE INDEX statements.
const INDEX_OPTIONS: &str = "PAD_INDEX = OFF, STATISTICS_NORECOMPUTE = OFF, \
     SORT_IN_TEMPDB = OFF, DROP_EXISTING = OFF, ONLINE = OFF, \
     ALLOW_ROW_LOCKS = ON, IGNORE_DUP_KEY = OFF, ALLOW_PAGE_LOCKS = ON, \
     OPTIMIZE_FOR_SEQUENTIAL_KEY = OFF";

/// Schema source over a live SQL Server connection.
pub struct MssqlSchemaSource {
    client: SqlClient,
}

impl MssqlSchemaSource {
    /// Open a connection to the server and initial catalog named by
    /// `config`. Unreachable host, bad credentials, and a missing catalog
    /// all surface here as connection errors, before any rendering starts.
    pub async fn connect(config: &DbConfig) -> Result<Self, SqlSnapError> {
        let mut tiberius_config = Config::new();
        tiberius_config.host(&config.host);
        tiberius_config.port(config.port);
        tiberius_config.database(&config.database);
        tiberius_config.authentication(AuthMethod::sql_server(&config.user, &config.password));
        tiberius_config.trust_cert();

        let tcp = TcpStream::connect(tiberius_config.get_addr())
            .await
            .map_err(|e| {
                SqlSnapError::Connection(format!(
                    "{}: {}",
                    config.redacted_connection_string(),
                    e
                ))
            })?;
        tcp.set_nodelay(true)
            .map_err(|e| SqlSnapError::Connection(e.to_string()))?;

        let client = Client::connect(tiberius_config, tcp.compat_write())
            .await
            .map_err(|e| {
                SqlSnapError::Connection(format!(
                    "{}: {}",
                    config.redacted_connection_string(),
                    e
                ))
            })?;

        info!(database = ?config.database, "Connected to SQL Server");
        Ok(Self::from_client(client))
    }

    /// Wrap an already-open client.
    pub fn from_client(client: SqlClient) -> Self {
        Self { client }
    }

    async fn query_rows(
        &mut self,
        sql: &str,
        object_id: i32,
    ) -> Result<Vec<Row>, tiberius::error::Error> {
        self.client
            .query(sql, &[&object_id])
            .await?
            .into_first_result()
            .await
    }
}

impl SchemaSource for MssqlSchemaSource {
    async fn objects(&mut self, kind: ObjectKind) -> Result<Vec<SchemaObject>, SqlSnapError> {
        trace!(kind = ?kind, "Enumerating objects");

        let rows = self
            .client
            .simple_query(enumeration_query(kind))
            .await
            .map_err(|e| enumeration_error(kind, &e))?
            .into_first_result()
            .await
            .map_err(|e| enumeration_error(kind, &e))?;

        let mut objects = Vec::with_capacity(rows.len());
        for row in &rows {
            objects.push(SchemaObject {
                kind,
                object_id: row
                    .get::<i32, _>("object_id")
                    .ok_or_else(|| enumeration_error(kind, &"object_id was NULL"))?,
                schema: required_str(row, "schema_name")
                    .ok_or_else(|| enumeration_error(kind, &"schema_name was NULL"))?,
                name: required_str(row, "name")
                    .ok_or_else(|| enumeration_error(kind, &"name was NULL"))?,
                is_system: row.get::<bool, _>("is_ms_shipped").unwrap_or(false),
            });
        }

        debug!(kind = ?kind, count = objects.len(), "Enumerated objects");
        Ok(objects)
    }

    async fn script(
        &mut self,
        object: &SchemaObject,
        options: &ScriptOptions,
    ) -> Result<Vec<String>, SqlSnapError> {
        trace!(kind = ?object.kind, name = ?object.name, "Scripting object");
        match object.kind {
            ObjectKind::Table => self.script_table(object, options).await,
            ObjectKind::View | ObjectKind::StoredProcedure | ObjectKind::UserDefinedFunction => {
                self.script_module(object).await
            }
            ObjectKind::Synonym => self.script_synonym(object).await,
        }
    }
}

/// One batched query per kind fetches name, schema, and system flag
/// together, avoiding a round-trip per object per field. Enumeration order
/// is the stable name order the catalog returns.
fn enumeration_query(kind: ObjectKind) -> &'static str {
    match kind {
        ObjectKind::Table => {
            "SELECT t.object_id, s.name AS schema_name, t.name, t.is_ms_shipped \
             FROM sys.tables t JOIN sys.schemas s ON s.schema_id = t.schema_id \
             ORDER BY t.name"
        }
        ObjectKind::View => {
            "SELECT v.object_id, s.name AS schema_name, v.name, v.is_ms_shipped \
             FROM sys.views v JOIN sys.schemas s ON s.schema_id = v.schema_id \
             ORDER BY v.name"
        }
        ObjectKind::StoredProcedure => {
            "SELECT p.object_id, s.name AS schema_name, p.name, p.is_ms_shipped \
             FROM sys.procedures p JOIN sys.schemas s ON s.schema_id = p.schema_id \
             ORDER BY p.name"
        }
        ObjectKind::UserDefinedFunction => {
            "SELECT o.object_id, s.name AS schema_name, o.name, o.is_ms_shipped \
             FROM sys.objects o JOIN sys.schemas s ON s.schema_id = o.schema_id \
             WHERE o.type IN ('FN', 'IF', 'TF') \
             ORDER BY o.name"
        }
        // Synonyms have no system-object concept; scripted flag is constant
        ObjectKind::Synonym => {
            "SELECT sy.object_id, s.name AS schema_name, sy.name, \
             CAST(0 AS bit) AS is_ms_shipped \
             FROM sys.synonyms sy JOIN sys.schemas s ON s.schema_id = sy.schema_id \
             ORDER BY sy.name"
        }
    }
}

fn enumeration_error(kind: ObjectKind, cause: &dyn std::fmt::Display) -> SqlSnapError {
    SqlSnapError::Connection(format!("Failed to enumerate {}s: {}", kind.type_name(), cause))
}

fn scripting_error(object: &SchemaObject, message: impl Into<String>) -> SqlSnapError {
    SqlSnapError::Scripting {
        kind: object.kind.type_name(),
        name: object.name.clone(),
        message: message.into(),
    }
}

fn required_str(row: &Row, column: &str) -> Option<String> {
    row.get::<&str, _>(column).map(str::to_string)
}

impl MssqlSchemaSource {
    /// Views, procedures, and functions are stored as modules; the script
    /// is the stored definition prefixed with the environment-setting
    /// statements the server's own scripter emits for them.
    async fn script_module(&mut self, object: &SchemaObject) -> Result<Vec<String>, SqlSnapError> {
        let sql = "SELECT m.definition, m.uses_ansi_nulls, m.uses_quoted_identifier \
                   FROM sys.sql_modules m WHERE m.object_id = @P1";
        let rows = self
            .query_rows(sql, object.object_id)
            .await
            .map_err(|e| scripting_error(object, e.to_string()))?;
        let row = rows
            .first()
            .ok_or_else(|| scripting_error(object, "module definition not found"))?;

        let definition = row.get::<&str, _>("definition").ok_or_else(|| {
            scripting_error(object, "definition is NULL (insufficient permissions?)")
        })?;

        let mut lines = Vec::new();
        if row.get::<bool, _>("uses_ansi_nulls").unwrap_or(false) {
            lines.push("SET ANSI_NULLS ON".to_string());
        }
        if row.get::<bool, _>("uses_quoted_identifier").unwrap_or(false) {
            lines.push("SET QUOTED_IDENTIFIER ON".to_string());
        }
        lines.extend(
            definition
                .split('\n')
                .map(|line| line.trim_end_matches('\r').to_string()),
        );
        Ok(lines)
    }

    async fn script_synonym(&mut self, object: &SchemaObject) -> Result<Vec<String>, SqlSnapError> {
        let sql = "SELECT base_object_name FROM sys.synonyms WHERE object_id = @P1";
        let rows = self
            .query_rows(sql, object.object_id)
            .await
            .map_err(|e| scripting_error(object, e.to_string()))?;
        let base = rows
            .first()
            .and_then(|row| row.get::<&str, _>("base_object_name"))
            .ok_or_else(|| scripting_error(object, "synonym base object not found"))?;

        Ok(vec![format!(
            "CREATE SYNONYM [{}].[{}] FOR {}",
            object.schema, object.name, base
        )])
    }

    async fn script_table(
        &mut self,
        object: &SchemaObject,
        options: &ScriptOptions,
    ) -> Result<Vec<String>, SqlSnapError> {
        let columns = self.table_columns(object).await?;
        if columns.is_empty() {
            return Err(scripting_error(object, "table has no visible columns"));
        }
        let indexes = self.table_indexes(object).await?;

        let mut lines = vec![
            "SET ANSI_NULLS ON".to_string(),
            "SET QUOTED_IDENTIFIER ON".to_string(),
        ];
        lines.extend(create_table_statement(object, &columns, &indexes));

        if options.indexes {
            for index in indexes
                .iter()
                .filter(|i| !i.is_primary_key && !i.is_unique_constraint)
            {
                lines.extend(create_index_statement(object, index));
            }
        }

        for default in self.default_constraints(object).await? {
            lines.push(format!(
                "ALTER TABLE [{}].[{}] ADD  CONSTRAINT [{}]  DEFAULT {} FOR [{}]",
                object.schema, object.name, default.name, default.definition, default.column
            ));
        }

        for fk in self.foreign_keys(object).await? {
            lines.extend(foreign_key_statement(object, &fk));
        }

        if options.change_tracking {
            if let Some(track_columns) = self.change_tracking(object).await? {
                lines.push(format!(
                    "ALTER TABLE [{}].[{}] ENABLE CHANGE_TRACKING WITH(TRACK_COLUMNS_UPDATED = {})",
                    object.schema,
                    object.name,
                    if track_columns { "ON" } else { "OFF" }
                ));
            }
        }

        if options.triggers {
            lines.extend(self.trigger_statements(object).await?);
        }

        Ok(lines)
    }

    async fn table_columns(&mut self, object: &SchemaObject) -> Result<Vec<TableColumn>, SqlSnapError> {
        let sql = "SELECT c.name, t.name AS type_name, c.max_length, c.[precision], c.scale, \
                   c.is_nullable, c.is_identity, \
                   CAST(ISNULL(ic.seed_value, 1) AS bigint) AS seed_value, \
                   CAST(ISNULL(ic.increment_value, 1) AS bigint) AS increment_value, \
                   cc.definition AS computed_definition, \
                   ISNULL(cc.is_persisted, 0) AS is_persisted \
                   FROM sys.columns c \
                   JOIN sys.types t ON t.user_type_id = c.user_type_id \
                   LEFT JOIN sys.identity_columns ic \
                     ON ic.object_id = c.object_id AND ic.column_id = c.column_id \
                   LEFT JOIN sys.computed_columns cc \
                     ON cc.object_id = c.object_id AND cc.column_id = c.column_id \
                   WHERE c.object_id = @P1 \
                   ORDER BY c.column_id";
        let rows = self
            .query_rows(sql, object.object_id)
            .await
            .map_err(|e| scripting_error(object, e.to_string()))?;

        let mut columns = Vec::with_capacity(rows.len());
        for row in &rows {
            columns.push(TableColumn {
                name: required_str(row, "name")
                    .ok_or_else(|| scripting_error(object, "column name was NULL"))?,
                type_name: required_str(row, "type_name")
                    .ok_or_else(|| scripting_error(object, "column type was NULL"))?,
                max_length: row.get::<i16, _>("max_length").unwrap_or(0),
                precision: row.get::<u8, _>("precision").unwrap_or(0),
                scale: row.get::<u8, _>("scale").unwrap_or(0),
                is_nullable: row.get::<bool, _>("is_nullable").unwrap_or(true),
                is_identity: row.get::<bool, _>("is_identity").unwrap_or(false),
                seed: row.get::<i64, _>("seed_value").unwrap_or(1),
                increment: row.get::<i64, _>("increment_value").unwrap_or(1),
                computed: required_str(row, "computed_definition"),
                is_persisted: row.get::<bool, _>("is_persisted").unwrap_or(false),
            });
        }
        Ok(columns)
    }

    async fn table_indexes(&mut self, object: &SchemaObject) -> Result<Vec<TableIndex>, SqlSnapError> {
        let sql = "SELECT i.index_id, i.name, i.is_primary_key, i.is_unique_constraint, \
                   i.is_unique, i.type_desc \
                   FROM sys.indexes i \
                   WHERE i.object_id = @P1 AND i.index_id > 0 AND i.is_hypothetical = 0 \
                   ORDER BY i.index_id";
        let rows = self
            .query_rows(sql, object.object_id)
            .await
            .map_err(|e| scripting_error(object, e.to_string()))?;

        let mut indexes = Vec::with_capacity(rows.len());
        for row in &rows {
            let index_id = row.get::<i32, _>("index_id").unwrap_or(0);
            let name = match required_str(row, "name") {
                Some(name) => name,
                None => continue,
            };
            let mut index = TableIndex {
                name,
                is_primary_key: row.get::<bool, _>("is_primary_key").unwrap_or(false),
                is_unique_constraint: row.get::<bool, _>("is_unique_constraint").unwrap_or(false),
                is_unique: row.get::<bool, _>("is_unique").unwrap_or(false),
                clustered: required_str(row, "type_desc").as_deref() == Some("CLUSTERED"),
                key_columns: Vec::new(),
                included_columns: Vec::new(),
            };
            self.index_columns(object, index_id, &mut index).await?;
            indexes.push(index);
        }
        Ok(indexes)
    }

    async fn index_columns(
        &mut self,
        object: &SchemaObject,
        index_id: i32,
        index: &mut TableIndex,
    ) -> Result<(), SqlSnapError> {
        let sql = "SELECT c.name, ic.is_descending_key, ic.is_included_column \
                   FROM sys.index_columns ic \
                   JOIN sys.columns c \
                     ON c.object_id = ic.object_id AND c.column_id = ic.column_id \
                   WHERE ic.object_id = @P1 AND ic.index_id = @P2 \
                   ORDER BY ic.key_ordinal, ic.index_column_id";
        let rows = self
            .client
            .query(sql, &[&object.object_id, &index_id])
            .await
            .map_err(|e| scripting_error(object, e.to_string()))?
            .into_first_result()
            .await
            .map_err(|e| scripting_error(object, e.to_string()))?;

        for row in &rows {
            let column = required_str(row, "name")
                .ok_or_else(|| scripting_error(object, "index column name was NULL"))?;
            if row.get::<bool, _>("is_included_column").unwrap_or(false) {
                index.included_columns.push(column);
            } else {
                let descending = row.get::<bool, _>("is_descending_key").unwrap_or(false);
                index.key_columns.push((column, descending));
            }
        }
        Ok(())
    }

    async fn default_constraints(
        &mut self,
        object: &SchemaObject,
    ) -> Result<Vec<DefaultConstraint>, SqlSnapError> {
        let sql = "SELECT dc.name, c.name AS column_name, dc.definition \
                   FROM sys.default_constraints dc \
                   JOIN sys.columns c \
                     ON c.object_id = dc.parent_object_id AND c.column_id = dc.parent_column_id \
                   WHERE dc.parent_object_id = @P1 \
                   ORDER BY dc.name";
        let rows = self
            .query_rows(sql, object.object_id)
            .await
            .map_err(|e| scripting_error(object, e.to_string()))?;

        let mut defaults = Vec::with_capacity(rows.len());
        for row in &rows {
            defaults.push(DefaultConstraint {
                name: required_str(row, "name")
                    .ok_or_else(|| scripting_error(object, "default constraint name was NULL"))?,
                column: required_str(row, "column_name")
                    .ok_or_else(|| scripting_error(object, "default constraint column was NULL"))?,
                definition: required_str(row, "definition")
                    .ok_or_else(|| scripting_error(object, "default constraint body was NULL"))?,
            });
        }
        Ok(defaults)
    }

    async fn foreign_keys(&mut self, object: &SchemaObject) -> Result<Vec<ForeignKey>, SqlSnapError> {
        let sql = "SELECT fk.object_id AS fk_id, fk.name, rs.name AS ref_schema, \
                   rt.name AS ref_table, fk.delete_referential_action_desc, \
                   fk.update_referential_action_desc \
                   FROM sys.foreign_keys fk \
                   JOIN sys.tables rt ON rt.object_id = fk.referenced_object_id \
                   JOIN sys.schemas rs ON rs.schema_id = rt.schema_id \
                   WHERE fk.parent_object_id = @P1 \
                   ORDER BY fk.name";
        let rows = self
            .query_rows(sql, object.object_id)
            .await
            .map_err(|e| scripting_error(object, e.to_string()))?;

        let mut keys = Vec::with_capacity(rows.len());
        for row in &rows {
            keys.push(ForeignKey {
                fk_id: row
                    .get::<i32, _>("fk_id")
                    .ok_or_else(|| scripting_error(object, "foreign key id was NULL"))?,
                name: required_str(row, "name")
                    .ok_or_else(|| scripting_error(object, "foreign key name was NULL"))?,
                ref_schema: required_str(row, "ref_schema")
                    .ok_or_else(|| scripting_error(object, "referenced schema was NULL"))?,
                ref_table: required_str(row, "ref_table")
                    .ok_or_else(|| scripting_error(object, "referenced table was NULL"))?,
                delete_action: required_str(row, "delete_referential_action_desc")
                    .unwrap_or_else(|| "NO_ACTION".to_string()),
                update_action: required_str(row, "update_referential_action_desc")
                    .unwrap_or_else(|| "NO_ACTION".to_string()),
                columns: Vec::new(),
            });
        }

        for key in &mut keys {
            let sql = "SELECT pc.name AS parent_column, rc.name AS referenced_column \
                       FROM sys.foreign_key_columns fkc \
                       JOIN sys.columns pc \
                         ON pc.object_id = fkc.parent_object_id \
                        AND pc.column_id = fkc.parent_column_id \
                       JOIN sys.columns rc \
                         ON rc.object_id = fkc.referenced_object_id \
                        AND rc.column_id = fkc.referenced_column_id \
                       WHERE fkc.constraint_object_id = @P1 \
                       ORDER BY fkc.constraint_column_id";
            let rows = self
                .client
                .query(sql, &[&key.fk_id])
                .await
                .map_err(|e| scripting_error(object, e.to_string()))?
                .into_first_result()
                .await
                .map_err(|e| scripting_error(object, e.to_string()))?;
            for row in &rows {
                let parent = required_str(row, "parent_column")
                    .ok_or_else(|| scripting_error(object, "foreign key column was NULL"))?;
                let referenced = required_str(row, "referenced_column")
                    .ok_or_else(|| scripting_error(object, "referenced column was NULL"))?;
                key.columns.push((parent, referenced));
            }
        }
        Ok(keys)
    }

    async fn change_tracking(&mut self, object: &SchemaObject) -> Result<Option<bool>, SqlSnapError> {
        let sql = "SELECT is_track_columns_updated_on FROM sys.change_tracking_tables \
                   WHERE object_id = @P1";
        let rows = self
            .query_rows(sql, object.object_id)
            .await
            .map_err(|e| scripting_error(object, e.to_string()))?;
        Ok(rows
            .first()
            .map(|row| row.get::<bool, _>("is_track_columns_updated_on").unwrap_or(false)))
    }

    async fn trigger_statements(&mut self, object: &SchemaObject) -> Result<Vec<String>, SqlSnapError> {
        let sql = "SELECT t.name, m.definition, m.uses_ansi_nulls, m.uses_quoted_identifier \
                   FROM sys.triggers t \
                   JOIN sys.sql_modules m ON m.object_id = t.object_id \
                   WHERE t.parent_id = @P1 AND t.is_ms_shipped = 0 \
                   ORDER BY t.name";
        let rows = self
            .query_rows(sql, object.object_id)
            .await
            .map_err(|e| scripting_error(object, e.to_string()))?;

        let mut lines = Vec::new();
        for row in &rows {
            let name = required_str(row, "name")
                .ok_or_else(|| scripting_error(object, "trigger name was NULL"))?;
            let definition = row
                .get::<&str, _>("definition")
                .ok_or_else(|| scripting_error(object, format!("trigger '{name}' definition is NULL")))?;

            if row.get::<bool, _>("uses_ansi_nulls").unwrap_or(false) {
                lines.push("SET ANSI_NULLS ON".to_string());
            }
            if row.get::<bool, _>("uses_quoted_identifier").unwrap_or(false) {
                lines.push("SET QUOTED_IDENTIFIER ON".to_string());
            }
            lines.extend(
                definition
                    .split('\n')
                    .map(|line| line.trim_end_matches('\r').to_string()),
            );
            lines.push(format!(
                "ALTER TABLE [{}].[{}] ENABLE TRIGGER [{}]",
                object.schema, object.name, name
            ));
        }
        Ok(lines)
    }
}

struct TableColumn {
    name: String,
    type_name: String,
    max_length: i16,
    precision: u8,
    scale: u8,
    is_nullable: bool,
    is_identity: bool,
    seed: i64,
    increment: i64,
    computed: Option<String>,
    is_persisted: bool,
}

struct TableIndex {
    name: String,
    is_primary_key: bool,
    is_unique_constraint: bool,
    is_unique: bool,
    clustered: bool,
    /// (column name, descending) in key ordinal order
    key_columns: Vec<(String, bool)>,
    included_columns: Vec<String>,
}

struct DefaultConstraint {
    name: String,
    column: String,
    definition: String,
}

struct ForeignKey {
    fk_id: i32,
    name: String,
    ref_schema: String,
    ref_table: String,
    delete_action: String,
    update_action: String,
    /// (parent column, referenced column) pairs
    columns: Vec<(String, String)>,
}

/// Render the type portion of a column declaration, resolving length,
/// precision, and scale the way the engine's scripter prints them.
/// Collation clauses are never emitted.
fn format_sql_type(type_name: &str, max_length: i16, precision: u8, scale: u8) -> String {
    match type_name {
        "varchar" | "char" | "varbinary" | "binary" => {
            if max_length == -1 {
                format!("[{type_name}](max)")
            } else {
                format!("[{type_name}]({max_length})")
            }
        }
        // nchar/nvarchar lengths are stored in bytes, two per character
        "nvarchar" | "nchar" => {
            if max_length == -1 {
                format!("[{type_name}](max)")
            } else {
                format!("[{type_name}]({})", max_length / 2)
            }
        }
        "decimal" | "numeric" => format!("[{type_name}]({precision}, {scale})"),
        "datetime2" | "time" | "datetimeoffset" => format!("[{type_name}]({scale})"),
        _ => format!("[{type_name}]"),
    }
}

fn column_line(column: &TableColumn) -> String {
    if let Some(definition) = &column.computed {
        let persisted = if column.is_persisted { " PERSISTED" } else { "" };
        return format!("\t[{}]  AS {}{}", column.name, definition, persisted);
    }

    let sql_type = format_sql_type(
        &column.type_name,
        column.max_length,
        column.precision,
        column.scale,
    );
    let identity = if column.is_identity {
        format!(" IDENTITY({},{})", column.seed, column.increment)
    } else {
        String::new()
    };
    let nullability = if column.is_nullable { "NULL" } else { "NOT NULL" };
    format!("\t[{}] {}{} {}", column.name, sql_type, identity, nullability)
}

/// The CREATE TABLE statement with column list and inline PRIMARY KEY /
/// UNIQUE constraints, in the layout the engine's scripter uses.
fn create_table_statement(
    object: &SchemaObject,
    columns: &[TableColumn],
    indexes: &[TableIndex],
) -> Vec<String> {
    let constraints: Vec<&TableIndex> = indexes
        .iter()
        .filter(|i| i.is_primary_key || i.is_unique_constraint)
        .collect();

    let mut lines = Vec::new();
    lines.push(format!("CREATE TABLE [{}].[{}](", object.schema, object.name));

    let last_column = columns.len().saturating_sub(1);
    for (position, column) in columns.iter().enumerate() {
        let mut line = column_line(column);
        if position != last_column || !constraints.is_empty() {
            line.push(',');
        }
        lines.push(line);
    }

    let last_constraint = constraints.len().saturating_sub(1);
    for (position, constraint) in constraints.iter().enumerate() {
        let kind = if constraint.is_primary_key {
            "PRIMARY KEY"
        } else {
            "UNIQUE"
        };
        let layout = if constraint.clustered {
            "CLUSTERED"
        } else {
            "NONCLUSTERED"
        };
        lines.push(format!(" CONSTRAINT [{}] {} {} ", constraint.name, kind, layout));
        lines.push("(".to_string());
        lines.extend(key_column_lines(&constraint.key_columns));
        let trailer = if position == last_constraint { "" } else { "," };
        lines.push(format!(
            ")WITH ({}) ON [PRIMARY]{}",
            CONSTRAINT_OPTIONS, trailer
        ));
    }

    if columns.iter().any(is_lob_column) {
        lines.push(") ON [PRIMARY] TEXTIMAGE_ON [PRIMARY]".to_string());
    } else {
        lines.push(") ON [PRIMARY]".to_string());
    }
    lines
}

fn key_column_lines(key_columns: &[(String, bool)]) -> Vec<String> {
    let last = key_columns.len().saturating_sub(1);
    key_columns
        .iter()
        .enumerate()
        .map(|(position, (name, descending))| {
            let direction = if *descending { "DESC" } else { "ASC" };
            let trailer = if position == last { "" } else { "," };
            format!("\t[{name}] {direction}{trailer}")
        })
        .collect()
}

fn create_index_statement(object: &SchemaObject, index: &TableIndex) -> Vec<String> {
    let unique = if index.is_unique { "UNIQUE " } else { "" };
    let layout = if index.clustered {
        "CLUSTERED"
    } else {
        "NONCLUSTERED"
    };

    let mut lines = Vec::new();
    lines.push(format!(
        "CREATE {}{} INDEX [{}] ON [{}].[{}]",
        unique, layout, index.name, object.schema, object.name
    ));
    lines.push("(".to_string());
    lines.extend(key_column_lines(&index.key_columns));

    if index.included_columns.is_empty() {
        lines.push(format!(")WITH ({}) ON [PRIMARY]", INDEX_OPTIONS));
    } else {
        lines.push(")".to_string());
        let included: Vec<String> = index
            .included_columns
            .iter()
            .map(|name| format!("[{name}]"))
            .collect();
        lines.push(format!(
            "INCLUDE({}) WITH ({}) ON [PRIMARY]",
            included.join(","),
            INDEX_OPTIONS
        ));
    }
    lines
}

fn foreign_key_statement(object: &SchemaObject, fk: &ForeignKey) -> Vec<String> {
    let parent_columns: Vec<String> = fk.columns.iter().map(|(p, _)| format!("[{p}]")).collect();
    let referenced_columns: Vec<String> =
        fk.columns.iter().map(|(_, r)| format!("[{r}]")).collect();

    let mut lines = Vec::new();
    lines.push(format!(
        "ALTER TABLE [{}].[{}]  WITH CHECK ADD  CONSTRAINT [{}] FOREIGN KEY({})",
        object.schema,
        object.name,
        fk.name,
        parent_columns.join(", ")
    ));
    lines.push(format!(
        "REFERENCES [{}].[{}] ({})",
        fk.ref_schema,
        fk.ref_table,
        referenced_columns.join(", ")
    ));
    if fk.delete_action != "NO_ACTION" {
        lines.push(format!("ON DELETE {}", fk.delete_action.replace('_', " ")));
    }
    if fk.update_action != "NO_ACTION" {
        lines.push(format!("ON UPDATE {}", fk.update_action.replace('_', " ")));
    }
    lines.push(format!(
        "ALTER TABLE [{}].[{}] CHECK CONSTRAINT [{}]",
        object.schema, object.name, fk.name
    ));
    lines
}

fn is_lob_column(column: &TableColumn) -> bool {
    column.max_length == -1
        || matches!(column.type_name.as_str(), "text" | "ntext" | "image" | "xml")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_object(name: &str) -> SchemaObject {
        SchemaObject {
            kind: ObjectKind::Table,
            schema: "dbo".to_string(),
            name: name.to_string(),
            is_system: false,
            object_id: 100,
        }
    }

    fn int_column(name: &str, nullable: bool) -> TableColumn {
        TableColumn {
            name: name.to_string(),
            type_name: "int".to_string(),
            max_length: 4,
            precision: 10,
            scale: 0,
            is_nullable: nullable,
            is_identity: false,
            seed: 1,
            increment: 1,
            computed: None,
            is_persisted: false,
        }
    }

    #[test]
    fn test_format_sql_type() {
        assert_eq!(format_sql_type("int", 4, 10, 0), "[int]");
        assert_eq!(format_sql_type("varchar", 50, 0, 0), "[varchar](50)");
        assert_eq!(format_sql_type("varchar", -1, 0, 0), "[varchar](max)");
        assert_eq!(format_sql_type("nvarchar", 100, 0, 0), "[nvarchar](50)");
        assert_eq!(format_sql_type("nvarchar", -1, 0, 0), "[nvarchar](max)");
        assert_eq!(format_sql_type("decimal", 9, 18, 2), "[decimal](18, 2)");
        assert_eq!(format_sql_type("datetime2", 8, 27, 7), "[datetime2](7)");
        assert_eq!(format_sql_type("uniqueidentifier", 16, 0, 0), "[uniqueidentifier]");
    }

    #[test]
    fn test_identity_column_line() {
        let mut column = int_column("Id", false);
        column.is_identity = true;
        assert_eq!(column_line(&column), "\t[Id] [int] IDENTITY(1,1) NOT NULL");
    }

    #[test]
    fn test_nullable_column_line() {
        let mut column = int_column("Qty", true);
        column.type_name = "nvarchar".to_string();
        column.max_length = 100;
        assert_eq!(column_line(&column), "\t[Qty] [nvarchar](50) NULL");
    }

    #[test]
    fn test_computed_column_line() {
        let mut column = int_column("Total", true);
        column.computed = Some("([Price]*[Qty])".to_string());
        assert_eq!(column_line(&column), "\t[Total]  AS ([Price]*[Qty])");

        column.is_persisted = true;
        assert_eq!(column_line(&column), "\t[Total]  AS ([Price]*[Qty]) PERSISTED");
    }

    #[test]
    fn test_create_table_without_constraints() {
        let lines = create_table_statement(
            &table_object("Orders"),
            &[int_column("Id", false), int_column("Qty", true)],
            &[],
        );
        assert_eq!(
            lines,
            vec![
                "CREATE TABLE [dbo].[Orders](".to_string(),
                "\t[Id] [int] NOT NULL,".to_string(),
                "\t[Qty] [int] NULL".to_string(),
                ") ON [PRIMARY]".to_string(),
            ]
        );
    }

    #[test]
    fn test_create_table_with_primary_key() {
        let pk = TableIndex {
            name: "PK_Orders".to_string(),
            is_primary_key: true,
            is_unique_constraint: false,
            is_unique: true,
            clustered: true,
            key_columns: vec![("Id".to_string(), false)],
            included_columns: vec![],
        };
        let lines = create_table_statement(&table_object("Orders"), &[int_column("Id", false)], &[pk]);
        assert_eq!(
            lines,
            vec![
                "CREATE TABLE [dbo].[Orders](".to_string(),
                "\t[Id] [int] NOT NULL,".to_string(),
                " CONSTRAINT [PK_Orders] PRIMARY KEY CLUSTERED ".to_string(),
                "(".to_string(),
                "\t[Id] ASC".to_string(),
                format!(")WITH ({CONSTRAINT_OPTIONS}) ON [PRIMARY]"),
                ") ON [PRIMARY]".to_string(),
            ]
        );
    }

    #[test]
    fn test_create_table_textimage_for_lob_columns() {
        let mut column = int_column("Body", true);
        column.type_name = "nvarchar".to_string();
        column.max_length = -1;
        let lines = create_table_statement(&table_object("Notes"), &[column], &[]);
        assert_eq!(lines.last().unwrap(), ") ON [PRIMARY] TEXTIMAGE_ON [PRIMARY]");
    }

    #[test]
    fn test_create_index_statement() {
        let index = TableIndex {
            name: "IX_Orders_CustomerId".to_string(),
            is_primary_key: false,
            is_unique_constraint: false,
            is_unique: false,
            clustered: false,
            key_columns: vec![("CustomerId".to_string(), false), ("PlacedAt".to_string(), true)],
            included_columns: vec![],
        };
        let lines = create_index_statement(&table_object("Orders"), &index);
        assert_eq!(
            lines,
            vec![
                "CREATE NONCLUSTERED INDEX [IX_Orders_CustomerId] ON [dbo].[Orders]".to_string(),
                "(".to_string(),
                "\t[CustomerId] ASC,".to_string(),
                "\t[PlacedAt] DESC".to_string(),
                format!(")WITH ({INDEX_OPTIONS}) ON [PRIMARY]"),
            ]
        );
    }

    #[test]
    fn test_create_index_with_included_columns() {
        let index = TableIndex {
            name: "IX_Orders_Status".to_string(),
            is_primary_key: false,
            is_unique_constraint: false,
            is_unique: true,
            clustered: false,
            key_columns: vec![("Status".to_string(), false)],
            included_columns: vec!["Total".to_string()],
        };
        let lines = create_index_statement(&table_object("Orders"), &index);
        assert_eq!(lines[0], "CREATE UNIQUE NONCLUSTERED INDEX [IX_Orders_Status] ON [dbo].[Orders]");
        assert_eq!(
            lines.last().unwrap(),
            &format!("INCLUDE([Total]) WITH ({INDEX_OPTIONS}) ON [PRIMARY]")
        );
    }

    #[test]
    fn test_foreign_key_statement() {
        let fk = ForeignKey {
            fk_id: 1,
            name: "FK_Orders_Customers".to_string(),
            ref_schema: "dbo".to_string(),
            ref_table: "Customers".to_string(),
            delete_action: "CASCADE".to_string(),
            update_action: "NO_ACTION".to_string(),
            columns: vec![("CustomerId".to_string(), "Id".to_string())],
        };
        let lines = foreign_key_statement(&table_object("Orders"), &fk);
        assert_eq!(
            lines,
            vec![
                "ALTER TABLE [dbo].[Orders]  WITH CHECK ADD  CONSTRAINT [FK_Orders_Customers] FOREIGN KEY([CustomerId])".to_string(),
                "REFERENCES [dbo].[Customers] ([Id])".to_string(),
                "ON DELETE CASCADE".to_string(),
                "ALTER TABLE [dbo].[Orders] CHECK CONSTRAINT [FK_Orders_Customers]".to_string(),
            ]
        );
    }

    #[test]
    fn test_enumeration_queries_are_name_ordered() {
        for kind in ObjectKind::ALL {
            assert!(enumeration_query(kind).contains("ORDER BY"));
        }
    }
}
