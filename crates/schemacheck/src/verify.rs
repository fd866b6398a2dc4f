//! One verification run: migrate, load both schemas, compare.

use crate::load::{LoadStats, SchemaLoader};
use crate::migrate::MigrationRunner;
use crate::{Error, Result, SchemaDiff, compare};
use serde::Serialize;
use tracing::{Instrument, info, info_span};

/// Outcome of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct Verification {
    /// Where the expected schema came from.
    pub expected_source: String,
    pub expected_stats: LoadStats,
    /// Where the actual schema came from.
    pub actual_source: String,
    pub actual_stats: LoadStats,
    pub diff: SchemaDiff,
}

impl Verification {
    pub fn is_clean(&self) -> bool {
        self.diff.is_clean()
    }
}

/// Run the migrations against `target`, then compare `expected` to `actual`.
///
/// Any failure aborts the run before a report exists: a failed migration
/// means neither schema is loaded, and a failed load means nothing is
/// compared.
pub async fn verify<M, E, A>(
    runner: &M,
    target: &str,
    expected: &E,
    actual: &A,
) -> Result<Verification>
where
    M: MigrationRunner,
    E: SchemaLoader,
    A: SchemaLoader,
{
    runner
        .run(target)
        .instrument(info_span!("migrate"))
        .await
        .map_err(|e| Error::Migration(e.to_string()))?;

    let expected_source = expected.describe();
    let expected_loaded = expected
        .load()
        .instrument(info_span!("load", source = %expected_source))
        .await?;

    let actual_source = actual.describe();
    let actual_loaded = actual
        .load()
        .instrument(info_span!("load", source = %actual_source))
        .await?;

    let diff = compare(&expected_loaded.schema, &actual_loaded.schema);
    info!(
        findings = diff.finding_count(),
        clean = diff.is_clean(),
        "comparison finished"
    );

    Ok(Verification {
        expected_source,
        expected_stats: expected_loaded.stats,
        actual_source,
        actual_stats: actual_loaded.stats,
        diff,
    })
}
