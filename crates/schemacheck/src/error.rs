use std::path::PathBuf;
use thiserror::Error;

/// Boxed error returned by introspectors and migration runners.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("schema export not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("cannot open schema export {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed schema export {}: {message}", path.display())]
    MalformedInput { path: PathBuf, message: String },

    #[error("introspection failed: {0}")]
    Connection(#[source] BoxError),

    #[error("migrations failed: {0}")]
    Migration(String),
}

impl Error {
    pub(crate) fn malformed(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Error::MalformedInput {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub(crate) fn connection(err: impl Into<BoxError>) -> Self {
        Error::Connection(err.into())
    }
}
