//! End-to-end runs: a CSV export on disk against an in-memory introspector.

use schemacheck::load::{ColumnRow, IndexRow, TableRow};
use schemacheck::{
    AttributeDiff, BoxError, Change, Error, ExportLoader, IntrospectionLoader, Introspector,
    LoadOptions, MigrationRunner, verify,
};
use std::cell::Cell;
use std::collections::HashMap;
use std::convert::Infallible;
use std::io::Write;

const EXPORT: &str = "\u{feff}TABLE_NAME,TABLE_TYPE,COLUMN_NAME,COLUMN_TYPE,DATA_TYPE,IS_NULLABLE,COLUMN_DEFAULT,COLUMN_KEY,EXTRA,INDEX_NAME,NON_UNIQUE
users,BASE TABLE,id,int(11),int,NO,NULL,PRI,auto_increment,PRIMARY,0
users,BASE TABLE,email,varchar(255),varchar,NO,NULL,UNI,,users_email_unique,0
users,BASE TABLE,created_at,timestamp,timestamp,YES,CURRENT_TIMESTAMP,,,,
users,BASE TABLE,nickname,varchar(64),varchar,NO,,,,,
orders,BASE TABLE,id,bigint(20) unsigned,bigint,NO,NULL,PRI,auto_increment,PRIMARY,0
orders,BASE TABLE,order_no,varchar(32),varchar,NO,NULL,UNI,,uniq_order_no,0
orders,BASE TABLE,status,varchar(16),varchar,NO,'pending',,,,
orders,BASE TABLE,broken,row
active_users,VIEW,id,int(11),int,NO,,,,,
migrations,BASE TABLE,id,int(10) unsigned,int,NO,,PRI,auto_increment,PRIMARY,0
";

#[derive(Default)]
struct MemoryIntrospector {
    tables: Vec<TableRow>,
    columns: HashMap<String, Vec<ColumnRow>>,
    indexes: HashMap<String, Vec<IndexRow>>,
    calls: Cell<usize>,
}

impl MemoryIntrospector {
    fn table(mut self, name: &str, columns: &[(&str, &str, &str, Option<&str>, &str)]) -> Self {
        self.tables.push(TableRow::new(name, "BASE TABLE"));
        self.columns.insert(
            name.to_string(),
            columns
                .iter()
                .map(|(field, ty, null, default, extra)| ColumnRow {
                    field: field.to_string(),
                    column_type: ty.to_string(),
                    null: null.to_string(),
                    default: default.map(str::to_string),
                    key: String::new(),
                    extra: extra.to_string(),
                })
                .collect(),
        );
        self
    }

    fn index(mut self, table: &str, name: &str, non_unique: &str, columns: &[&str]) -> Self {
        let rows = self.indexes.entry(table.to_string()).or_default();
        for column in columns {
            rows.push(IndexRow {
                key_name: name.to_string(),
                non_unique: non_unique.to_string(),
                column_name: Some(column.to_string()),
            });
        }
        self
    }

    fn view(mut self, name: &str) -> Self {
        self.tables.push(TableRow::new(name, "VIEW"));
        self
    }
}

impl Introspector for MemoryIntrospector {
    type Error = Infallible;

    async fn tables(&self) -> Result<Vec<TableRow>, Infallible> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.tables.clone())
    }

    async fn columns(&self, table: &str) -> Result<Vec<ColumnRow>, Infallible> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.columns.get(table).cloned().unwrap_or_default())
    }

    async fn indexes(&self, table: &str) -> Result<Vec<IndexRow>, Infallible> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.indexes.get(table).cloned().unwrap_or_default())
    }
}

/// A runner that records the target it was asked to migrate.
#[derive(Default)]
struct RecordingRunner {
    fail: bool,
    target: std::cell::RefCell<Option<String>>,
}

impl MigrationRunner for RecordingRunner {
    async fn run(&self, target: &str) -> Result<(), BoxError> {
        self.target.replace(Some(target.to_string()));
        if self.fail {
            return Err("SQLSTATE[42S01]: Base table or view already exists".into());
        }
        Ok(())
    }
}

fn export_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(EXPORT.as_bytes()).unwrap();
    file
}

/// The shadow database as a correct set of migrations would leave it.
fn migrated() -> MemoryIntrospector {
    MemoryIntrospector::default()
        .table(
            "migrations",
            &[("id", "int unsigned", "NO", None, "auto_increment")],
        )
        .table(
            "users",
            &[
                ("id", "int", "NO", None, "auto_increment"),
                ("email", "varchar(255)", "NO", None, ""),
                (
                    "created_at",
                    "timestamp",
                    "YES",
                    Some("CURRENT_TIMESTAMP"),
                    "DEFAULT_GENERATED",
                ),
                ("nickname", "varchar(64)", "NO", Some(""), ""),
            ],
        )
        .index("users", "PRIMARY", "0", &["id"])
        .index("users", "users_email_unique", "0", &["email"])
        .table(
            "orders",
            &[
                ("id", "bigint unsigned", "NO", None, "auto_increment"),
                ("order_no", "varchar(32)", "NO", None, ""),
                ("status", "varchar(16)", "NO", Some("pending"), ""),
            ],
        )
        .index("orders", "PRIMARY", "0", &["id"])
        .index("orders", "uniq_order_no", "0", &["order_no"])
        .view("active_users")
}

#[tokio::test]
async fn test_matching_migrations_are_clean() {
    let file = export_file();
    let introspector = migrated();
    let runner = RecordingRunner::default();

    let verification = verify(
        &runner,
        "mysql://root@localhost/shadow",
        &ExportLoader::new(file.path(), LoadOptions::default()),
        &IntrospectionLoader::new(&introspector, LoadOptions::default()),
    )
    .await
    .unwrap();

    assert!(verification.is_clean(), "{}", verification.diff);
    assert_eq!(
        runner.target.borrow().as_deref(),
        Some("mysql://root@localhost/shadow")
    );
    assert_eq!(verification.expected_stats.rows, 10);
    assert_eq!(verification.expected_stats.skipped_rows, 1);
    assert_eq!(verification.expected_stats.tables, 2);
    assert_eq!(verification.expected_stats.views, 1);
    assert_eq!(verification.actual_stats.tables, 2);
    assert_eq!(verification.actual_stats.views, 1);
}

#[tokio::test]
async fn test_missing_unique_index_is_reported() {
    let file = export_file();
    let mut introspector = migrated();
    introspector.indexes.insert(
        "orders".to_string(),
        vec![IndexRow {
            key_name: "PRIMARY".to_string(),
            non_unique: "0".to_string(),
            column_name: Some("id".to_string()),
        }],
    );

    let verification = verify(
        &None::<RecordingRunner>,
        "mysql://root@localhost/shadow",
        &ExportLoader::new(file.path(), LoadOptions::default()),
        &IntrospectionLoader::new(&introspector, LoadOptions::default()),
    )
    .await
    .unwrap();

    let diff = &verification.diff;
    assert_eq!(diff.counts.total(), 1);
    assert_eq!(diff.table_diffs[0].table, "orders");
    assert_eq!(
        diff.table_diffs[0].changes,
        [Change::MissingIndex {
            index: "uniq_order_no".to_string(),
            unique: true,
            columns: vec!["order_no".to_string()],
        }]
    );
}

#[tokio::test]
async fn test_failed_migration_aborts_before_loading() {
    let introspector = migrated();
    let runner = RecordingRunner {
        fail: true,
        ..Default::default()
    };

    let err = verify(
        &runner,
        "mysql://root@localhost/shadow",
        &ExportLoader::new("/nonexistent/production.csv", LoadOptions::default()),
        &IntrospectionLoader::new(&introspector, LoadOptions::default()),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, Error::Migration(ref message) if message.contains("42S01")));
    assert_eq!(introspector.calls.get(), 0);
}

#[tokio::test]
async fn test_missing_export_is_fatal() {
    let introspector = migrated();

    let err = verify(
        &None::<RecordingRunner>,
        "mysql://root@localhost/shadow",
        &ExportLoader::new("/nonexistent/production.csv", LoadOptions::default()),
        &IntrospectionLoader::new(&introspector, LoadOptions::default()),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, Error::NotFound { .. }));
    assert_eq!(introspector.calls.get(), 0);
}

#[tokio::test]
async fn test_ignored_tables_are_left_out_of_both_sides() {
    let file = export_file();
    let introspector = migrated().table("telescope_entries", &[("id", "bigint", "NO", None, "")]);
    let options = LoadOptions {
        ignore_tables: vec!["telescope_entries".to_string()],
        ..Default::default()
    };

    let verification = verify(
        &None::<RecordingRunner>,
        "mysql://root@localhost/shadow",
        &ExportLoader::new(file.path(), options.clone()),
        &IntrospectionLoader::new(&introspector, options),
    )
    .await
    .unwrap();

    assert!(verification.is_clean(), "{}", verification.diff);
}

#[tokio::test]
async fn test_empty_string_default_matches_across_loaders() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(
        b"table_name,column_name,column_type,is_nullable,column_default\n\
          users,nickname,varchar(64),NO,\n\
          users,bio,text,YES,NULL\n",
    )
    .unwrap();
    let introspector = MemoryIntrospector::default().table(
        "users",
        &[
            ("nickname", "varchar(64)", "NO", Some(""), ""),
            ("bio", "text", "YES", None, ""),
        ],
    );

    let verification = verify(
        &None::<RecordingRunner>,
        "mysql://root@localhost/shadow",
        &ExportLoader::new(file.path(), LoadOptions::default()),
        &IntrospectionLoader::new(&introspector, LoadOptions::default()),
    )
    .await
    .unwrap();

    assert!(verification.is_clean(), "{}", verification.diff);
}

#[tokio::test]
async fn test_dropped_empty_string_default_is_reported() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(
        b"table_name,column_name,column_type,is_nullable,column_default\n\
          users,nickname,varchar(64),NO,\n",
    )
    .unwrap();
    let introspector = MemoryIntrospector::default()
        .table("users", &[("nickname", "varchar(64)", "NO", None, "")]);

    let verification = verify(
        &None::<RecordingRunner>,
        "mysql://root@localhost/shadow",
        &ExportLoader::new(file.path(), LoadOptions::default()),
        &IntrospectionLoader::new(&introspector, LoadOptions::default()),
    )
    .await
    .unwrap();

    assert_eq!(
        verification.diff.table_diffs[0].changes,
        [Change::ColumnDiff {
            column: "nickname".to_string(),
            attributes: vec![AttributeDiff::Default {
                expected: Some("''".to_string()),
                actual: None,
            }],
        }]
    );
}
