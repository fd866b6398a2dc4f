//! Migration runner seam.
//!
//! Running migrations is not this crate's business: a runner resets the
//! shadow database and applies every migration, then reports success or
//! failure. [`verify`](crate::verify) refuses to load anything if it fails.

use crate::BoxError;

/// Resets a database and applies all migrations to it.
#[allow(async_fn_in_trait)]
pub trait MigrationRunner {
    /// Migrate the database identified by `target` (a connection URL).
    async fn run(&self, target: &str) -> Result<(), BoxError>;
}

/// `None` skips the migration step entirely.
impl<R: MigrationRunner> MigrationRunner for Option<R> {
    async fn run(&self, target: &str) -> Result<(), BoxError> {
        match self {
            Some(runner) => runner.run(target).await,
            None => {
                tracing::info!("skipping migrations, comparing the database as-is");
                Ok(())
            }
        }
    }
}
