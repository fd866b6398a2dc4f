//! Configuration file handling for schemacheck.
//!
//! Looks for `.config/schemacheck.toml` in the current directory or any parent
//! directory. Not finding one is fine: every key has a default or can come
//! from the environment and the command line.

pub use schemacheck_config::Config;

use schemacheck::LoadOptions;
use schemacheck_config::MigrateConfig;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = ".config/schemacheck.toml";

/// Load configuration from `explicit` if given, otherwise search up the
/// directory tree from the current directory.
pub fn load(explicit: Option<&Path>) -> Result<(Config, Option<PathBuf>), ConfigError> {
    match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Ok((parse(path)?, Some(path.to_path_buf())))
        }
        None => {
            let cwd = std::env::current_dir().map_err(|source| ConfigError::Io {
                path: PathBuf::from("."),
                source,
            })?;
            load_from(&cwd)
        }
    }
}

/// Load configuration starting from a specific directory.
pub fn load_from(start: &Path) -> Result<(Config, Option<PathBuf>), ConfigError> {
    match find_config_file(start) {
        Some(path) => Ok((parse(&path)?, Some(path))),
        None => Ok((Config::default(), None)),
    }
}

fn parse(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Find `.config/schemacheck.toml` by searching up the directory tree.
fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_FILE);
        if config_path.is_file() {
            return Some(config_path);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Everything a run needs, after every configuration layer is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub database_url: String,
    pub options: LoadOptions,
    /// `None` when migrations are skipped.
    pub migrate: Option<MigrateConfig>,
}

impl Settings {
    /// Apply command-line values on top of `config`.
    ///
    /// `database_url` is the flag value, which clap has already merged with
    /// the `DATABASE_URL` environment variable.
    pub fn resolve(
        config: Config,
        database_url: Option<String>,
        skip_migrations: bool,
    ) -> Result<Self, ConfigError> {
        let database_url = database_url
            .or(config.database_url)
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::MissingDatabaseUrl)?;

        let migrate = if skip_migrations {
            None
        } else if config.migrate.argv().is_some() {
            Some(config.migrate)
        } else {
            return Err(ConfigError::MissingMigrateCommand);
        };

        let mut options = LoadOptions {
            ignore_tables: config.ignore_tables,
            ..Default::default()
        };
        if let Some(table) = config.bookkeeping_table {
            options.bookkeeping_table = table;
        }

        Ok(Self {
            database_url,
            options,
            migrate,
        })
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file {} does not exist", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("no database URL: pass --database-url, set DATABASE_URL, or add database_url to .config/schemacheck.toml")]
    MissingDatabaseUrl,

    #[error("no migration command: add [migrate] command to .config/schemacheck.toml, or pass --skip-migrations")]
    MissingMigrateCommand,
}
