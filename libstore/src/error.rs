//! Objects related to reporting errors from this library

/// A list of error types that can occur within this library
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("no store data found: the location table is empty")]
    EmptyTable,

    #[error("store name must not be empty")]
    EmptyName,

    #[error("invalid coordinate ({0}, {1}): out of range")]
    InvalidCoordinate(f64, f64),

    #[error("missing required column '{}'", .0)]
    MissingColumn(&'static str),

    #[error("invalid record on line {line}: {reason}")]
    InvalidRecord { line: u64, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("failed to replace store file: {0}")]
    Persist(#[source] std::io::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// A convenience type alias for a [Result] with [Error] as its error type
pub type Result<T, E = Error> = std::result::Result<T, E>;
