//! Loader for a live database.
//!
//! The loader does not talk to a database itself. It drives an
//! [`Introspector`], which returns the raw rows MySQL's `SHOW FULL TABLES`,
//! `SHOW COLUMNS` and `SHOW INDEX` describe, and turns them into a canonical
//! schema.

use super::{LoadOptions, LoadStats, Loaded, SchemaLoader};
use crate::normalize::{normalize_default, normalize_extra, normalize_type};
use crate::{Column, Error, Result, SchemaBuilder};
use tracing::{debug, info};

/// A table as listed by the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub name: String,
    /// `BASE TABLE`, `VIEW`, ...; `None` when the introspector cannot tell.
    pub table_type: Option<String>,
}

/// A column as described by `SHOW COLUMNS`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnRow {
    /// `Field`
    pub field: String,
    /// `Type`
    pub column_type: String,
    /// `Null`: `YES` or `NO`
    pub null: String,
    /// `Default`
    pub default: Option<String>,
    /// `Key`
    pub key: String,
    /// `Extra`
    pub extra: String,
}

/// One (index, column) pair as described by `SHOW INDEX`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexRow {
    /// `Key_name`
    pub key_name: String,
    /// `Non_unique`: `0` for unique indexes
    pub non_unique: String,
    /// `Column_name`; `None` for functional key parts
    pub column_name: Option<String>,
}

/// Raw schema access to a live database.
#[allow(async_fn_in_trait)]
pub trait Introspector {
    type Error: std::error::Error + Send + Sync + 'static;

    /// List every table and view visible on the connection.
    async fn tables(&self) -> std::result::Result<Vec<TableRow>, Self::Error>;

    /// Columns of `table`, in ordinal order.
    async fn columns(&self, table: &str) -> std::result::Result<Vec<ColumnRow>, Self::Error>;

    /// Index rows of `table`, in key-part order within each index.
    async fn indexes(&self, table: &str) -> std::result::Result<Vec<IndexRow>, Self::Error>;
}

/// Builds a canonical schema from an [`Introspector`].
pub struct IntrospectionLoader<'a, I> {
    introspector: &'a I,
    options: LoadOptions,
}

impl<'a, I: Introspector> IntrospectionLoader<'a, I> {
    pub fn new(introspector: &'a I, options: LoadOptions) -> Self {
        Self {
            introspector,
            options,
        }
    }

    async fn read(&self) -> Result<Loaded> {
        let tables = self
            .introspector
            .tables()
            .await
            .map_err(Error::connection)?;

        let mut builder = SchemaBuilder::new();
        let mut stats = LoadStats::default();

        for table in &tables {
            if table.is_view() {
                debug!(table = %table.name, "skipping view");
                stats.views += 1;
                continue;
            }
            if self.options.excludes(&table.name) {
                debug!(table = %table.name, "skipping excluded table");
                continue;
            }

            let columns = self
                .introspector
                .columns(&table.name)
                .await
                .map_err(Error::connection)?;
            stats.rows += columns.len();
            for row in &columns {
                builder.column(&table.name, &row.field, canonical_column(row));
            }

            let indexes = self
                .introspector
                .indexes(&table.name)
                .await
                .map_err(Error::connection)?;
            for row in &indexes {
                let Some(column) = row.column_name.as_deref() else {
                    continue;
                };
                builder.index_column(&table.name, &row.key_name, is_falsy(&row.non_unique), column);
            }
        }

        stats.tables = builder.table_count();

        info!(
            rows = stats.rows,
            tables = stats.tables,
            views = stats.views,
            "introspected live schema"
        );

        Ok(Loaded {
            schema: builder.build(),
            stats,
        })
    }
}

impl<I: Introspector> SchemaLoader for IntrospectionLoader<'_, I> {
    fn describe(&self) -> String {
        "live database".to_string()
    }

    async fn load(&self) -> Result<Loaded> {
        self.read().await
    }
}

impl TableRow {
    pub fn new(name: impl Into<String>, table_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table_type: Some(table_type.into()),
        }
    }

    pub fn is_view(&self) -> bool {
        self.table_type
            .as_deref()
            .is_some_and(|t| t.trim().eq_ignore_ascii_case("VIEW"))
    }
}

fn canonical_column(row: &ColumnRow) -> Column {
    Column {
        column_type: normalize_type(&row.column_type),
        nullable: row.null.trim().eq_ignore_ascii_case("YES"),
        default: normalize_default(row.default.as_deref()),
        key: row.key.clone(),
        extra: normalize_extra(&row.extra),
    }
}

fn is_falsy(value: &str) -> bool {
    matches!(value.trim(), "" | "0")
}
