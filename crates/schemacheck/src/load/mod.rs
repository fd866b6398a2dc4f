//! Schema loaders.
//!
//! A loader reads one source of truth and returns a canonical [`Schema`]:
//!
//! - [`ExportLoader`] reads the production CSV export
//! - [`IntrospectionLoader`] queries a live database through an [`Introspector`]
//!
//! Both record facts into a fresh [`SchemaBuilder`](crate::SchemaBuilder),
//! apply the normalizer to every column, and drop views, the migration
//! bookkeeping table and any ignored tables.

mod export;
mod introspect;

pub use export::ExportLoader;
pub use introspect::{ColumnRow, IndexRow, IntrospectionLoader, Introspector, TableRow};

use crate::{Result, Schema};
use serde::Serialize;

/// Table used by Laravel-style migration runners to track applied migrations.
pub const DEFAULT_BOOKKEEPING_TABLE: &str = "migrations";

/// Tables a loader must leave out of the canonical schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Name of the migration bookkeeping table (exact match).
    pub bookkeeping_table: String,
    /// Additional tables to leave out (exact match).
    pub ignore_tables: Vec<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            bookkeeping_table: DEFAULT_BOOKKEEPING_TABLE.to_string(),
            ignore_tables: Vec::new(),
        }
    }
}

impl LoadOptions {
    /// Returns true if `table` must not appear in a canonical schema.
    pub fn excludes(&self, table: &str) -> bool {
        table == self.bookkeeping_table || self.ignore_tables.iter().any(|t| t == table)
    }
}

/// Informational counters gathered while loading. Never part of the comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadStats {
    /// Raw rows read from the source (CSV data rows, or introspected columns).
    pub rows: usize,
    /// Rows dropped because they could not be parsed.
    pub skipped_rows: usize,
    /// Tables in the resulting schema.
    pub tables: usize,
    /// Distinct views left out.
    pub views: usize,
}

/// A schema together with the counters gathered while loading it.
#[derive(Debug, Clone, Default)]
pub struct Loaded {
    pub schema: Schema,
    pub stats: LoadStats,
}

/// A source of a canonical schema.
#[allow(async_fn_in_trait)]
pub trait SchemaLoader {
    /// Short description of the source, for logs and reports.
    fn describe(&self) -> String;

    /// Load the canonical schema.
    async fn load(&self) -> Result<Loaded>;
}
