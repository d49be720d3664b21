//! Snapshot settings
//!
//! `SchemaSettings` selects which object kinds a snapshot covers and which
//! object names are included. It is constructed once per build invocation
//! and is read-only to the builder.

use std::fmt;
use std::sync::Arc;

use crate::schema::{ObjectKind, SchemaObject};

/// Name-inclusion predicate applied to every candidate object.
pub type IncludePredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Configuration for one snapshot build.
///
/// All five kind flags default to true and the name predicate defaults to
/// always-include, so `SchemaSettings::default()` snapshots everything that
/// is not a system object.
#[derive(Clone)]
pub struct SchemaSettings {
    pub tables: bool,
    pub views: bool,
    pub stored_procedures: bool,
    pub user_defined_functions: bool,
    pub synonyms: bool,
    include: IncludePredicate,
}

impl Default for SchemaSettings {
    fn default() -> Self {
        Self {
            tables: true,
            views: true,
            stored_procedures: true,
            user_defined_functions: true,
            synonyms: true,
            include: Arc::new(|_| true),
        }
    }
}

impl fmt::Debug for SchemaSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaSettings")
            .field("tables", &self.tables)
            .field("views", &self.views)
            .field("stored_procedures", &self.stored_procedures)
            .field("user_defined_functions", &self.user_defined_functions)
            .field("synonyms", &self.synonyms)
            .finish_non_exhaustive()
    }
}

impl SchemaSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tables(mut self, enabled: bool) -> Self {
        self.tables = enabled;
        self
    }

    pub fn with_views(mut self, enabled: bool) -> Self {
        self.views = enabled;
        self
    }

    pub fn with_stored_procedures(mut self, enabled: bool) -> Self {
        self.stored_procedures = enabled;
        self
    }

    pub fn with_user_defined_functions(mut self, enabled: bool) -> Self {
        self.user_defined_functions = enabled;
        self
    }

    pub fn with_synonyms(mut self, enabled: bool) -> Self {
        self.synonyms = enabled;
        self
    }

    /// Replace the name-inclusion predicate.
    pub fn with_include<F>(mut self, include: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.include = Arc::new(include);
        self
    }

    /// Whether a kind's section is built at all.
    pub fn kind_enabled(&self, kind: ObjectKind) -> bool {
        match kind {
            ObjectKind::Table => self.tables,
            ObjectKind::View => self.views,
            ObjectKind::StoredProcedure => self.stored_procedures,
            ObjectKind::UserDefinedFunction => self.user_defined_functions,
            ObjectKind::Synonym => self.synonyms,
        }
    }

    /// Whether an enumerated object is eligible for the snapshot.
    ///
    /// System objects are never eligible, regardless of the predicate.
    /// Pure and order-preserving: callers filter without re-sorting.
    pub fn includes(&self, object: &SchemaObject) -> bool {
        !object.is_system && (self.include)(&object.name)
    }
}

/// Include/exclude name lists, the CLI's way of building a predicate.
#[derive(Debug, Default, Clone)]
pub struct NameFilter {
    /// Only include these names (if Some)
    pub include: Option<Vec<String>>,
    /// Exclude these names
    pub exclude: Option<Vec<String>>,
}

impl NameFilter {
    /// Check if an object name should be included
    pub fn should_include(&self, name: &str) -> bool {
        if let Some(include) = &self.include {
            if !include.iter().any(|n| n == name) {
                return false;
            }
        }

        if let Some(exclude) = &self.exclude {
            if exclude.iter().any(|n| n == name) {
                return false;
            }
        }

        true
    }

    /// Turn the lists into a predicate for `SchemaSettings::with_include`.
    pub fn into_predicate(self) -> impl Fn(&str) -> bool + Send + Sync + 'static {
        move |name| self.should_include(name)
    }
}
