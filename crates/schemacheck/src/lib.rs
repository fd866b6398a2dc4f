//! Verify that a set of migrations reproduces a production MySQL schema.
//!
//! This crate provides:
//! - Normalization of column types and defaults into a canonical form
//! - Loaders for a production CSV export and for a live database
//! - A structural diff between the two canonical schemas
//!
//! # Example
//!
//! ```ignore
//! use schemacheck::{ExportLoader, IntrospectionLoader, LoadOptions};
//!
//! let expected = ExportLoader::new("production.csv", LoadOptions::default());
//! let actual = IntrospectionLoader::new(&introspector, LoadOptions::default());
//!
//! let verification = schemacheck::verify(&runner, &database_url, &expected, &actual).await?;
//! if !verification.is_clean() {
//!     print!("{}", verification.diff);
//! }
//! ```
//!
//! # Canonical form
//!
//! Both sources describe the same column in different text. Before anything
//! is compared, every column goes through [`normalize`]:
//!
//! | raw                                  | canonical           |
//! |--------------------------------------|---------------------|
//! | `INT(11) UNSIGNED`                   | `int unsigned`      |
//! | `varchar(255) CHARACTER SET utf8mb4` | `varchar(255)`      |
//! | `current_timestamp()`                | `CURRENT_TIMESTAMP` |
//! | `'abc'`                              | `abc`               |

mod diff;
mod error;
pub mod load;
mod migrate;
pub mod normalize;
mod schema;
mod verify;

pub use diff::{
    AttributeDiff, Change, DiffCounts, ExtraTable, MissingTable, SchemaDiff, TableDiff, compare,
};
pub use error::{BoxError, Error};
pub use load::{
    ExportLoader, IntrospectionLoader, Introspector, LoadOptions, LoadStats, Loaded, SchemaLoader,
};
pub use migrate::MigrationRunner;
pub use schema::{Column, Index, Schema, SchemaBuilder, Table};
pub use verify::{Verification, verify};

/// Result type for schemacheck operations.
pub type Result<T> = std::result::Result<T, Error>;
