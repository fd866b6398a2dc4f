//! Canonical schema model.
//!
//! Both loaders produce a [`Schema`]: tables, their columns and their named
//! indexes, in the order they were first seen in the source. Every value has
//! already been through [`crate::normalize`], so two schemas can be compared
//! field by field.
//!
//! Schemas are assembled with a [`SchemaBuilder`] scoped to a single load and
//! are never mutated afterwards.

use indexmap::IndexMap;
use serde::Serialize;

/// A canonical column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Column {
    /// Normalized type expression (`int unsigned`, `varchar(255)`).
    #[serde(rename = "type")]
    pub column_type: String,
    pub nullable: bool,
    /// Normalized default; `None` means no default.
    pub default: Option<String>,
    /// Key role marker (`PRI`, `UNI`, `MUL`), passed through as-is.
    pub key: String,
    /// Lowercased attribute marker such as `auto_increment`.
    pub extra: String,
}

impl Column {
    pub fn new(column_type: impl Into<String>, nullable: bool) -> Self {
        Self {
            column_type: column_type.into(),
            nullable,
            ..Default::default()
        }
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn with_extra(mut self, extra: impl Into<String>) -> Self {
        self.extra = extra.into();
        self
    }
}

/// A canonical index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Index {
    pub unique: bool,
    /// Columns in declaration order, without duplicates.
    pub columns: Vec<String>,
}

impl Index {
    pub fn new(unique: bool, columns: &[&str]) -> Self {
        let mut index = Self {
            unique,
            columns: Vec::with_capacity(columns.len()),
        };
        for column in columns {
            index.push_column(column);
        }
        index
    }

    fn push_column(&mut self, column: &str) {
        if !self.columns.iter().any(|c| c == column) {
            self.columns.push(column.to_string());
        }
    }
}

/// A canonical table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Table {
    pub columns: IndexMap<String, Column>,
    pub indexes: IndexMap<String, Index>,
}

/// A canonical schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Schema {
    pub tables: IndexMap<String, Table>,
}

impl Schema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    /// Total number of columns across all tables.
    pub fn column_count(&self) -> usize {
        self.tables.values().map(|t| t.columns.len()).sum()
    }
}

/// Accumulates raw facts for one load and turns them into a [`Schema`].
///
/// Tables are created on first mention but only survive [`build`] if at least
/// one column was recorded for them.
///
/// [`build`]: SchemaBuilder::build
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    tables: IndexMap<String, Table>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a column. A column seen again keeps its position and takes the
    /// latest attributes.
    pub fn column(&mut self, table: &str, name: &str, column: Column) {
        self.table_mut(table)
            .columns
            .insert(name.to_string(), column);
    }

    /// Append `column` to index `index` of `table`.
    ///
    /// The index is created on first sight with the given `unique` flag; later
    /// calls only add columns.
    pub fn index_column(&mut self, table: &str, index: &str, unique: bool, column: &str) {
        self.table_mut(table)
            .indexes
            .entry(index.to_string())
            .or_insert_with(|| Index {
                unique,
                columns: Vec::new(),
            })
            .push_column(column);
    }

    /// Number of tables that currently have at least one column.
    pub fn table_count(&self) -> usize {
        self.tables.values().filter(|t| !t.columns.is_empty()).count()
    }

    pub fn build(self) -> Schema {
        let tables = self
            .tables
            .into_iter()
            .filter(|(_, table)| !table.columns.is_empty())
            .collect();
        Schema { tables }
    }

    fn table_mut(&mut self, name: &str) -> &mut Table {
        self.tables.entry(name.to_string()).or_default()
    }
}
