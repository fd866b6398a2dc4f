//! MySQL introspection through `information_schema`.
//!
//! Every value is cast to text so rows decode the same way on MySQL and
//! MariaDB regardless of the server's column types and collations.

use schemacheck::Introspector;
use schemacheck::load::{ColumnRow, IndexRow, TableRow};
use sqlx::mysql::{MySqlPool, MySqlPoolOptions, MySqlRow};
use tracing::Instrument;

const TABLES: &str = "\
SELECT CAST(TABLE_NAME AS CHAR) AS name, CAST(TABLE_TYPE AS CHAR) AS table_type
FROM information_schema.TABLES
WHERE TABLE_SCHEMA = DATABASE()
ORDER BY TABLE_NAME";

const COLUMNS: &str = "\
SELECT CAST(COLUMN_NAME AS CHAR) AS `Field`,
       CAST(COLUMN_TYPE AS CHAR) AS `Type`,
       CAST(IS_NULLABLE AS CHAR) AS `Null`,
       CAST(COLUMN_DEFAULT AS CHAR) AS `Default`,
       CAST(COLUMN_KEY AS CHAR) AS `Key`,
       CAST(EXTRA AS CHAR) AS `Extra`
FROM information_schema.COLUMNS
WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?
ORDER BY ORDINAL_POSITION";

const INDEXES: &str = "\
SELECT CAST(INDEX_NAME AS CHAR) AS `Key_name`,
       CAST(NON_UNIQUE AS CHAR) AS `Non_unique`,
       CAST(COLUMN_NAME AS CHAR) AS `Column_name`
FROM information_schema.STATISTICS
WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?
ORDER BY INDEX_NAME, SEQ_IN_INDEX";

/// Introspects the database a connection URL points at.
pub struct MySqlIntrospector {
    pool: MySqlPool,
}

impl MySqlIntrospector {
    /// Prepare a pool for `url` without connecting yet. The first query
    /// connects, so migrations that drop and recreate the database run first.
    ///
    /// The database named in the URL is the one introspected.
    pub fn connect_lazy(url: &str) -> Result<Self, sqlx::Error> {
        let pool = MySqlPoolOptions::new().max_connections(1).connect_lazy(url)?;
        Ok(Self { pool })
    }

    /// Close the connection pool.
    pub async fn close(self) {
        self.pool.close().await;
    }

    async fn fetch<O>(
        &self,
        name: &'static str,
        sql: &'static str,
        table: Option<&str>,
    ) -> Result<Vec<O>, sqlx::Error>
    where
        O: for<'r> sqlx::FromRow<'r, MySqlRow> + Send + Unpin,
    {
        let span = tracing::debug_span!(
            "db.query",
            query = name,
            table = table,
            rows = tracing::field::Empty,
        );
        let mut query = sqlx::query_as::<_, O>(sql);
        if let Some(table) = table {
            query = query.bind(table);
        }
        let rows = query.fetch_all(&self.pool).instrument(span.clone()).await?;
        span.record("rows", rows.len());
        Ok(rows)
    }
}

impl Introspector for MySqlIntrospector {
    type Error = sqlx::Error;

    async fn tables(&self) -> Result<Vec<TableRow>, sqlx::Error> {
        let rows: Vec<(String, Option<String>)> = self.fetch("tables", TABLES, None).await?;
        Ok(rows
            .into_iter()
            .map(|(name, table_type)| TableRow { name, table_type })
            .collect())
    }

    async fn columns(&self, table: &str) -> Result<Vec<ColumnRow>, sqlx::Error> {
        let rows: Vec<(
            String,
            String,
            String,
            Option<String>,
            Option<String>,
            Option<String>,
        )> = self.fetch("columns", COLUMNS, Some(table)).await?;

        Ok(rows
            .into_iter()
            .map(|(field, column_type, null, default, key, extra)| ColumnRow {
                field,
                column_type,
                null,
                default,
                key: key.unwrap_or_default(),
                extra: extra.unwrap_or_default(),
            })
            .collect())
    }

    async fn indexes(&self, table: &str) -> Result<Vec<IndexRow>, sqlx::Error> {
        let rows: Vec<(String, String, Option<String>)> =
            self.fetch("indexes", INDEXES, Some(table)).await?;

        Ok(rows
            .into_iter()
            .map(|(key_name, non_unique, column_name)| IndexRow {
                key_name,
                non_unique,
                column_name,
            })
            .collect())
    }
}
