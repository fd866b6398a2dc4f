//! Schema diffing - compare the expected (production) schema against the
//! actual (migrated) schema.
//!
//! Findings come out in a fixed order:
//!
//! 1. tables missing from the actual schema, in expected order
//! 2. extra tables in the actual schema, in actual order
//! 3. for each table present in both (expected order), a [`TableDiff`] with
//!    missing columns, extra columns, column attribute differences and
//!    missing indexes, in that order
//!
//! Tables without findings are left out. Extra indexes are never reported:
//! a migration that adds an index production lacks is harmless, one that
//! forgets an index production relies on is not.
//!
//! ### Example
//!
//! ```text
//! missing table audit_log (7 columns)
//! orders:
//!   missing column shipped_at timestamp
//!   column status: default pending -> (none)
//!   missing UNIQUE index uniq_order_no (order_no)
//! ```

use crate::{Column, Index, Schema, Table};
use serde::Serialize;
use std::fmt;

/// A diff between two schemas.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SchemaDiff {
    /// Tables present in expected but not in actual.
    pub missing_tables: Vec<MissingTable>,
    /// Tables present in actual but not in expected.
    pub extra_tables: Vec<ExtraTable>,
    /// Findings for tables present in both.
    pub table_diffs: Vec<TableDiff>,
    /// Aggregate counts over every finding.
    pub counts: DiffCounts,
}

impl SchemaDiff {
    /// Returns true if no finding of any kind was produced.
    pub fn is_clean(&self) -> bool {
        self.counts.total() == 0
    }

    /// Total number of findings.
    pub fn finding_count(&self) -> usize {
        self.counts.total()
    }
}

/// A table the migrations never created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingTable {
    pub table: String,
    /// Number of columns the table has in the expected schema.
    pub columns: usize,
}

/// A table the migrations created that production does not have.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtraTable {
    pub table: String,
    /// Number of columns the table has in the actual schema.
    pub columns: usize,
}

/// Findings for a single table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableDiff {
    /// Table name.
    pub table: String,
    /// List of findings.
    pub changes: Vec<Change>,
}

/// A single finding within a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Change {
    /// A column present in expected but not in actual.
    MissingColumn { column: String, expected_type: String },
    /// A column present in actual but not in expected.
    ExtraColumn { column: String, actual_type: String },
    /// A column present in both whose attributes differ.
    ColumnDiff {
        column: String,
        attributes: Vec<AttributeDiff>,
    },
    /// An index present in expected with no index of that name in actual.
    MissingIndex {
        index: String,
        unique: bool,
        columns: Vec<String>,
    },
}

/// A single attribute difference, expected value first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "attribute", rename_all = "snake_case")]
pub enum AttributeDiff {
    Type { expected: String, actual: String },
    Nullable { expected: bool, actual: bool },
    Default {
        expected: Option<String>,
        actual: Option<String>,
    },
    Extra { expected: String, actual: String },
}

/// Aggregate finding counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffCounts {
    pub missing_tables: usize,
    pub extra_tables: usize,
    pub missing_columns: usize,
    pub extra_columns: usize,
    pub column_diffs: usize,
    pub missing_indexes: usize,
}

impl DiffCounts {
    pub fn total(&self) -> usize {
        self.missing_tables
            + self.extra_tables
            + self.missing_columns
            + self.extra_columns
            + self.column_diffs
            + self.missing_indexes
    }

    fn record(&mut self, change: &Change) {
        match change {
            Change::MissingColumn { .. } => self.missing_columns += 1,
            Change::ExtraColumn { .. } => self.extra_columns += 1,
            Change::ColumnDiff { .. } => self.column_diffs += 1,
            Change::MissingIndex { .. } => self.missing_indexes += 1,
        }
    }
}

/// Compare `expected` against `actual`.
///
/// Pure function of its inputs: no I/O, no errors. Names are compared
/// exactly and case-sensitively.
pub fn compare(expected: &Schema, actual: &Schema) -> SchemaDiff {
    let mut diff = SchemaDiff::default();

    for (name, table) in &expected.tables {
        if !actual.tables.contains_key(name) {
            diff.missing_tables.push(MissingTable {
                table: name.clone(),
                columns: table.columns.len(),
            });
        }
    }

    for (name, table) in &actual.tables {
        if !expected.tables.contains_key(name) {
            diff.extra_tables.push(ExtraTable {
                table: name.clone(),
                columns: table.columns.len(),
            });
        }
    }

    for (name, expected_table) in &expected.tables {
        let Some(actual_table) = actual.tables.get(name) else {
            continue;
        };
        let changes = diff_table(expected_table, actual_table);
        if !changes.is_empty() {
            diff.table_diffs.push(TableDiff {
                table: name.clone(),
                changes,
            });
        }
    }

    diff.counts.missing_tables = diff.missing_tables.len();
    diff.counts.extra_tables = diff.extra_tables.len();
    for table_diff in &diff.table_diffs {
        for change in &table_diff.changes {
            diff.counts.record(change);
        }
    }

    diff
}

impl Schema {
    /// Compare this (expected) schema against `actual`. See [`compare`].
    pub fn diff(&self, actual: &Schema) -> SchemaDiff {
        compare(self, actual)
    }
}

/// Diff two tables with the same name.
fn diff_table(expected: &Table, actual: &Table) -> Vec<Change> {
    let mut changes = Vec::new();

    for (name, column) in &expected.columns {
        if !actual.columns.contains_key(name) {
            changes.push(Change::MissingColumn {
                column: name.clone(),
                expected_type: column.column_type.clone(),
            });
        }
    }

    for (name, column) in &actual.columns {
        if !expected.columns.contains_key(name) {
            changes.push(Change::ExtraColumn {
                column: name.clone(),
                actual_type: column.column_type.clone(),
            });
        }
    }

    for (name, expected_column) in &expected.columns {
        let Some(actual_column) = actual.columns.get(name) else {
            continue;
        };
        let attributes = diff_column(expected_column, actual_column);
        if !attributes.is_empty() {
            changes.push(Change::ColumnDiff {
                column: name.clone(),
                attributes,
            });
        }
    }

    changes.extend(missing_indexes(&expected.indexes, &actual.indexes));

    changes
}

/// Attribute differences in fixed order: type, nullable, default, extra.
fn diff_column(expected: &Column, actual: &Column) -> Vec<AttributeDiff> {
    let mut attributes = Vec::new();

    if expected.column_type != actual.column_type {
        attributes.push(AttributeDiff::Type {
            expected: expected.column_type.clone(),
            actual: actual.column_type.clone(),
        });
    }

    if expected.nullable != actual.nullable {
        attributes.push(AttributeDiff::Nullable {
            expected: expected.nullable,
            actual: actual.nullable,
        });
    }

    if expected.default != actual.default {
        attributes.push(AttributeDiff::Default {
            expected: expected.default.clone(),
            actual: actual.default.clone(),
        });
    }

    // An empty expected extra matches anything: engines disagree on implicit extras.
    if !expected.extra.is_empty() && expected.extra != actual.extra {
        attributes.push(AttributeDiff::Extra {
            expected: expected.extra.clone(),
            actual: actual.extra.clone(),
        });
    }

    attributes
}

/// Indexes are matched by name only.
fn missing_indexes<'a>(
    expected: &'a indexmap::IndexMap<String, Index>,
    actual: &'a indexmap::IndexMap<String, Index>,
) -> impl Iterator<Item = Change> + 'a {
    expected
        .iter()
        .filter(|(name, _)| !actual.contains_key(*name))
        .map(|(name, index)| Change::MissingIndex {
            index: name.clone(),
            unique: index.unique,
            columns: index.columns.clone(),
        })
}

impl fmt::Display for MissingTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "missing table {} ({} columns)", self.table, self.columns)
    }
}

impl fmt::Display for ExtraTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "extra table {} ({} columns)", self.table, self.columns)
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Change::MissingColumn {
                column,
                expected_type,
            } => write!(f, "missing column {} {}", column, expected_type),
            Change::ExtraColumn {
                column,
                actual_type,
            } => write!(f, "extra column {} {}", column, actual_type),
            Change::ColumnDiff { column, attributes } => {
                write!(f, "column {}: ", column)?;
                for (i, attribute) in attributes.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", attribute)?;
                }
                Ok(())
            }
            Change::MissingIndex {
                index,
                unique,
                columns,
            } => {
                let unique = if *unique { "UNIQUE " } else { "" };
                write!(
                    f,
                    "missing {}index {} ({})",
                    unique,
                    index,
                    columns.join(", ")
                )
            }
        }
    }
}

impl fmt::Display for AttributeDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeDiff::Type { expected, actual } => {
                write!(f, "type {} -> {}", expected, actual)
            }
            AttributeDiff::Nullable { expected, actual } => {
                let nullability = |n: bool| if n { "nullable" } else { "not null" };
                write!(f, "{} -> {}", nullability(*expected), nullability(*actual))
            }
            AttributeDiff::Default { expected, actual } => {
                let expected = expected.as_deref().unwrap_or("(none)");
                let actual = actual.as_deref().unwrap_or("(none)");
                write!(f, "default {} -> {}", expected, actual)
            }
            AttributeDiff::Extra { expected, actual } => {
                let actual = if actual.is_empty() { "(none)" } else { actual };
                write!(f, "extra {} -> {}", expected, actual)
            }
        }
    }
}

impl fmt::Display for SchemaDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_clean() {
            return writeln!(f, "Schemas match.");
        }
        for table in &self.missing_tables {
            writeln!(f, "{}", table)?;
        }
        for table in &self.extra_tables {
            writeln!(f, "{}", table)?;
        }
        for table_diff in &self.table_diffs {
            writeln!(f, "{}:", table_diff.table)?;
            for change in &table_diff.changes {
                writeln!(f, "  {}", change)?;
            }
        }
        Ok(())
    }
}
