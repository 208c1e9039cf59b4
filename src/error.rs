//! Unified infrastructure error type.

/// The error type returned by folio's fallible setup and serving operations.
///
/// Request-level failures (a missing book, a malformed body) are expressed as
/// HTTP [`Response`](crate::Response) values, not as `Error`s. This type
/// surfaces what stops the process from serving at all: a bad configuration
/// value, or a listener that cannot bind.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("config: {key}: {reason}")]
    Config { key: &'static str, reason: String },
}

impl Error {
    pub(crate) fn config(key: &'static str, reason: impl ToString) -> Self {
        Self::Config { key, reason: reason.to_string() }
    }
}
