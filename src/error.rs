use std::io;
use std::path::PathBuf;

/// Result alias used by every pipeline stage.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures that abort a pipeline stage.
///
/// Every variant names the file it happened in, so the binary can report
/// which input to fix. Per-term failures of the rank-sum test are not
/// represented here: the comparator turns them into sentinel values.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("CSV error on {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("invalid configuration in {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("malformed document record at {}:{line}: {reason}", .path.display())]
    MalformedRecord {
        path: PathBuf,
        line: usize,
        reason: String,
    },
    #[error("document `{filename}` appears more than once in {}", .path.display())]
    DuplicateDocument { path: PathBuf, filename: String },
    #[error("malformed frequency table {}: {reason}", .path.display())]
    MalformedTable { path: PathBuf, reason: String },
    #[error(
        "cannot sample {requested} filenames from {}: only {available} available",
        .path.display()
    )]
    SampleTooLarge {
        path: PathBuf,
        requested: usize,
        available: usize,
    },
    #[error("term `{term}` has relative frequencies but no total_count in {}", .path.display())]
    MissingTotal { path: PathBuf, term: String },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Error::Csv {
            path: path.into(),
            source,
        }
    }
}
