use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the load/filter/aggregate pipeline.
///
/// Everything is detected synchronously at the call that triggers it; there
/// is no retry or recovery logic anywhere in this crate.
#[derive(Debug, Error)]
pub enum ReportError {
    /// A required source file is missing or unreadable.
    #[error("cannot open source file {}: {source}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A join column is absent from one of the source tables.
    #[error("table {table} is missing required column {column:?}")]
    SchemaMismatch { table: String, column: String },

    /// An occurrence date does not have the `DD/MM/YYYY` shape.
    #[error("malformed occurrence date {value:?}")]
    MalformedDate { value: String },

    /// The caller asked for a column the joined table does not have.
    #[error("unknown column {0:?}")]
    UnknownColumn(String),

    /// A filter boundary could not be parsed as an ISO date.
    #[error("invalid filter date {value:?}")]
    InvalidDate { value: String },

    /// A record inside an otherwise readable source file failed to parse.
    #[error("malformed record in {table}: {source}")]
    Csv {
        table: String,
        #[source]
        source: csv::Error,
    },

    /// Writing a report or export file failed.
    #[error("failed to write {}: {message}", path.display())]
    Export { path: PathBuf, message: String },
}
