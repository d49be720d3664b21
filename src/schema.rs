//! Schema object types
//!
//! These types represent the schema entities retrieved from a live database
//! and form the contract between the schema source (produces) and the
//! snapshot builder (consumes).

use std::fmt;

/// The kinds of schema objects that can appear in a snapshot.
///
/// `ALL` fixes the section order of the output document: structural objects
/// first, then programmable objects, then synonyms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Table,
    View,
    StoredProcedure,
    UserDefinedFunction,
    Synonym,
}

impl ObjectKind {
    /// All kinds in the fixed order sections are emitted.
    pub const ALL: [ObjectKind; 5] = [
        ObjectKind::Table,
        ObjectKind::View,
        ObjectKind::StoredProcedure,
        ObjectKind::UserDefinedFunction,
        ObjectKind::Synonym,
    ];

    /// Singular type name, used for section headings (`## <name>s`)
    /// and error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            ObjectKind::Table => "Table",
            ObjectKind::View => "View",
            ObjectKind::StoredProcedure => "StoredProcedure",
            ObjectKind::UserDefinedFunction => "UserDefinedFunction",
            ObjectKind::Synonym => "Synonym",
        }
    }

    /// Whether the engine has a system-object concept for this kind.
    ///
    /// Synonyms have none; a source must report them as non-system rather
    /// than branching on kind inside the filtering logic.
    pub fn supports_system_flag(&self) -> bool {
        !matches!(self, ObjectKind::Synonym)
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// A named schema entity enumerated from the live database.
///
/// Objects are transient: fetched fresh per build and never cached across
/// builds. The builder treats them as read-only views over server state.
#[derive(Debug, Clone)]
pub struct SchemaObject {
    pub kind: ObjectKind,
    /// Owning schema (e.g. `dbo`), used when scripting DDL.
    pub schema: String,
    /// Bare object name; this is what appears in the `###` heading.
    pub name: String,
    /// System-object flag; always `false` for kinds without the concept.
    pub is_system: bool,
    /// Engine object id, used to look up definitions when scripting.
    pub object_id: i32,
}

/// Rendering options handed to the schema source when scripting an object.
///
/// This is a fixed bundle, constant across all object kinds and not
/// user-configurable.
#[derive(Debug, Clone, Copy)]
pub struct ScriptOptions {
    /// Emit change-tracking state for tables that have it enabled.
    pub change_tracking: bool,
    /// Never emit COLLATE clauses.
    pub no_collation: bool,
    /// Script triggers along with their parent table.
    pub triggers: bool,
    /// Script nonclustered indexes along with their parent table.
    pub indexes: bool,
}

impl Default for ScriptOptions {
    fn default() -> Self {
        Self {
            change_tracking: true,
            no_collation: true,
            triggers: true,
            indexes: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_order_is_fixed() {
        assert_eq!(
            ObjectKind::ALL,
            [
                ObjectKind::Table,
                ObjectKind::View,
                ObjectKind::StoredProcedure,
                ObjectKind::UserDefinedFunction,
                ObjectKind::Synonym,
            ]
        );
    }

    #[test]
    fn test_type_names() {
        assert_eq!(ObjectKind::Table.type_name(), "Table");
        assert_eq!(ObjectKind::UserDefinedFunction.type_name(), "UserDefinedFunction");
    }

    #[test]
    fn test_synonyms_have_no_system_flag() {
        assert!(!ObjectKind::Synonym.supports_system_flag());
        for kind in [
            ObjectKind::Table,
            ObjectKind::View,
            ObjectKind::StoredProcedure,
            ObjectKind::UserDefinedFunction,
        ] {
            assert!(kind.supports_system_flag());
        }
    }

    #[test]
    fn test_script_options_defaults() {
        let options = ScriptOptions::default();
        assert!(options.change_tracking);
        assert!(options.no_collation);
        assert!(options.triggers);
        assert!(options.indexes);
    }
}
