//! Configuration schema for schemacheck.
//!
//! The CLI reads this from `.config/schemacheck.toml`:
//!
//! ```toml
//! database_url = "mysql://root@127.0.0.1:3306/shadow"
//! bookkeeping_table = "migrations"
//! ignore_tables = ["telescope_entries"]
//!
//! [migrate]
//! command = ["php", "artisan", "migrate:fresh", "--force"]
//! timeout_secs = 300
//! ```
//!
//! Every key is optional.

use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Connection URL of the shadow database the migrations run against.
    pub database_url: Option<String>,

    /// Table the migration tool uses for its own bookkeeping.
    /// `None` keeps the loader default.
    pub bookkeeping_table: Option<String>,

    /// Tables left out of both schemas.
    pub ignore_tables: Vec<String>,

    /// How to run the migrations.
    pub migrate: MigrateConfig,
}

/// Migration command configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MigrateConfig {
    /// Program and arguments. It receives the target in `DATABASE_URL`.
    /// Empty means migrations are not run.
    pub command: Vec<String>,

    /// Kill the command after this many seconds.
    pub timeout_secs: Option<u64>,
}

impl MigrateConfig {
    /// Program and arguments, if a command is configured.
    pub fn argv(&self) -> Option<(&str, &[String])> {
        self.command
            .split_first()
            .map(|(program, args)| (program.as_str(), args))
    }
}
