//! Centralized error types for mailkpi.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the mailkpi library.
#[derive(Error, Debug)]
pub enum MailKpiError {
    /// I/O error with the associated file path.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The mail store root does not exist.
    #[error("Mail store not found: {0}")]
    StoreNotFound(PathBuf),

    /// The folder exists but its items cannot be listed in received order.
    #[error("Folder '{folder}' cannot be sorted by received time")]
    FolderUnsortable { folder: String },

    /// A message could not be decoded.
    #[error("MIME decoding error: {0}")]
    MimeError(String),

    /// The attachment referenced by a handle is gone or belongs to another client.
    #[error("Attachment '{0}' could not be resolved")]
    AttachmentNotFound(String),

    /// `max_emails` was neither `-1` nor a positive number.
    #[error("Invalid message limit {0}: use -1 for no limit or a positive number")]
    InvalidMessageLimit(i64),

    /// Month offsets point into the past only.
    #[error("Invalid month offset {0}: the offset must be zero or negative")]
    InvalidMonthOffset(i32),

    /// An attachment filename pattern is not a valid regular expression.
    #[error("Invalid attachment pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },

    /// Neither a case report nor a survey report pattern was given.
    #[error("At least one report must be specified!")]
    NoReportSpecified,

    /// No attachment matched any of the given patterns.
    #[error("No specified report found!")]
    NothingFound,

    /// A required column is absent from a report CSV.
    #[error("The column '{column}' is missing in the {report}. Please ensure that the specified report is correct and contains the required columns.")]
    MissingColumn {
        report: &'static str,
        column: &'static str,
    },

    /// A cell could not be parsed in the expected format.
    #[error("Invalid value '{value}' in column '{column}' of the {report} (row {row})")]
    InvalidValue {
        report: &'static str,
        column: &'static str,
        row: usize,
        value: String,
    },

    /// The CSV itself is malformed.
    #[error("Malformed {report}: {source}")]
    Csv {
        report: &'static str,
        source: csv::Error,
    },
}

/// Convenience alias for `Result<T, MailKpiError>`.
pub type Result<T> = std::result::Result<T, MailKpiError>;

impl MailKpiError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// `true` for the report outcomes the CLI treats as a clean exit.
    pub fn is_benign(&self) -> bool {
        matches!(self, Self::NoReportSpecified | Self::NothingFound)
    }
}

/// Allow `?` on `std::io::Error` when no path context is available
/// (rare, prefer `MailKpiError::io`).
impl From<std::io::Error> for MailKpiError {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            path: PathBuf::from("<unknown>"),
            source,
        }
    }
}
