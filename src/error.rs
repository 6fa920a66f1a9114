use std::io;
use std::path::PathBuf;

/// Failures that end a run. Everything recoverable is logged and skipped
/// where it happens instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("could not open services file {}: {source}", .path.display())]
    ServicesOpen { path: PathBuf, source: io::Error },

    #[error("could not open flow input {}: {source}", .path.display())]
    FlowsOpen { path: PathBuf, source: io::Error },

    #[error("could not open pcap file {}: {source}", .path.display())]
    CaptureOpen { path: PathBuf, source: pcap::Error },

    #[error("could not read IANA source {}: {source}", .path.display())]
    IanaRead { path: PathBuf, source: csv::Error },

    #[error("could not read report {}: {source}", .path.display())]
    ReportRead { path: PathBuf, source: csv::Error },

    #[error("could not write {}: {source}", .path.display())]
    Output { path: PathBuf, source: io::Error },

    #[error("could not draw chart {}: {message}", .path.display())]
    Chart { path: PathBuf, message: String },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Why a single input line was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },

    #[error("invalid {field}: {value:?}")]
    Number { field: &'static str, value: String },

    #[error("empty service name")]
    EmptyName,
}
