//! Loader for the production schema export.
//!
//! The export is a CSV file with one row per column fact (and one extra row
//! per index membership), typically produced by joining
//! `information_schema.COLUMNS` with `information_schema.STATISTICS`.

use super::{LoadOptions, LoadStats, Loaded, SchemaLoader};
use crate::normalize::{normalize_default, normalize_extra, normalize_type};
use crate::{Column, Error, Result, SchemaBuilder};
use indexmap::IndexSet;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Reads a canonical schema from a CSV export.
#[derive(Debug, Clone)]
pub struct ExportLoader {
    path: PathBuf,
    options: LoadOptions,
}

impl ExportLoader {
    pub fn new(path: impl Into<PathBuf>, options: LoadOptions) -> Self {
        Self {
            path: path.into(),
            options,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the export file.
    pub fn read(&self) -> Result<Loaded> {
        if !self.path.exists() {
            return Err(Error::NotFound {
                path: self.path.clone(),
            });
        }
        let file = File::open(&self.path).map_err(|source| Error::Io {
            path: self.path.clone(),
            source,
        })?;
        self.parse(BufReader::new(file))
    }

    /// Parse export content from any reader.
    pub fn parse<R: Read>(&self, source: R) -> Result<Loaded> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(source);
        let mut records = reader.records();

        let header: Vec<String> = match records.next() {
            Some(record) => record
                .map_err(|e| Error::malformed(&self.path, e))?
                .iter()
                .map(header_name)
                .collect(),
            None => return Err(Error::malformed(&self.path, "missing header row")),
        };

        let mut builder = SchemaBuilder::new();
        let mut views: IndexSet<String> = IndexSet::new();
        let mut stats = LoadStats::default();

        for record in records {
            let record = record.map_err(|e| Error::malformed(&self.path, e))?;
            stats.rows += 1;

            if record.len() != header.len() {
                debug!(
                    line = record.position().map(|p| p.line()),
                    fields = record.len(),
                    expected = header.len(),
                    "skipping row with mismatched field count"
                );
                stats.skipped_rows += 1;
                continue;
            }

            let row = Row::new(&header, &record);
            self.apply(&row, &mut builder, &mut views);
        }

        stats.tables = builder.table_count();
        stats.views = views.len();

        info!(
            path = %self.path.display(),
            rows = stats.rows,
            skipped = stats.skipped_rows,
            tables = stats.tables,
            views = stats.views,
            "loaded schema export"
        );

        Ok(Loaded {
            schema: builder.build(),
            stats,
        })
    }

    fn apply(&self, row: &Row<'_>, builder: &mut SchemaBuilder, views: &mut IndexSet<String>) {
        let Some(table) = row.non_empty("table_name") else {
            return;
        };

        if row
            .get("table_type")
            .is_some_and(|t| t.trim().eq_ignore_ascii_case("VIEW"))
        {
            views.insert(table.to_string());
            return;
        }

        if self.options.excludes(table) {
            return;
        }

        // Table-level records carry no column.
        let Some(column) = row.non_empty("column_name") else {
            return;
        };

        let raw_type = row
            .non_empty("column_type")
            .or_else(|| row.get("data_type"))
            .unwrap_or_default();
        let nullable = row
            .get("is_nullable")
            .unwrap_or("NO")
            .trim()
            .eq_ignore_ascii_case("YES");
        // NULL is spelled out; an empty cell is an empty-string default.
        let default = normalize_default(row.get("column_default"));

        builder.column(
            table,
            column,
            Column {
                column_type: normalize_type(raw_type),
                nullable,
                default,
                key: row.get("column_key").unwrap_or_default().to_string(),
                extra: normalize_extra(row.get("extra").unwrap_or_default()),
            },
        );

        if let Some(index) = row.non_empty("index_name") {
            let unique = row.get("non_unique").unwrap_or("1") == "0";
            builder.index_column(table, index, unique, column);
        }
    }
}

impl SchemaLoader for ExportLoader {
    fn describe(&self) -> String {
        format!("export {}", self.path.display())
    }

    async fn load(&self) -> Result<Loaded> {
        self.read()
    }
}

/// Header names are matched case-insensitively, ignoring whitespace and BOMs.
fn header_name(raw: &str) -> String {
    raw.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
        .to_ascii_lowercase()
}

/// One data row keyed by normalized header name.
struct Row<'r> {
    fields: HashMap<&'r str, &'r str>,
}

impl<'r> Row<'r> {
    fn new(header: &'r [String], record: &'r csv::StringRecord) -> Self {
        let fields = header
            .iter()
            .map(String::as_str)
            .zip(record.iter())
            .collect();
        Self { fields }
    }

    fn get(&self, field: &str) -> Option<&'r str> {
        self.fields.get(field).copied()
    }

    fn non_empty(&self, field: &str) -> Option<&'r str> {
        self.get(field).map(str::trim).filter(|v| !v.is_empty())
    }
}
