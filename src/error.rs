//! Crate-wide error taxonomy
//!
//! Every fallible operation in the supervisor, the stores and the API returns
//! [`Result`]. Duplicate starts are deliberately *not* an error: they collapse
//! into `StartOutcome { already_running: true }` at the supervisor level.

use std::fmt;
use std::io;

/// Result type for runhub operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur across the supervisor and its stores
#[derive(Debug)]
pub enum Error {
    /// Unit or version does not exist
    NotFound(String),
    /// Bad input (invalid version number, empty name, bad channel key, ...)
    Validation(String),
    /// Spawn failure or non-zero exit
    ProcessFailure(String),
    /// Bounded wait elapsed (connection verification, graceful stop)
    Timeout(String),
    Io(io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotFound(what) => write!(f, "{} not found", what),
            Error::Validation(msg) => write!(f, "Validation error: {}", msg),
            Error::ProcessFailure(msg) => write!(f, "Process failure: {}", msg),
            Error::Timeout(msg) => write!(f, "Timed out: {}", msg),
            Error::Io(e) => write!(f, "IO error: {}", e),
            Error::Json(e) => write!(f, "JSON error: {}", e),
        }
    }
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e)
    }
}

impl Error {
    /// Convenience constructor for missing units
    pub fn unit_not_found(id: &str) -> Self {
        Error::NotFound(format!("Unit {}", id))
    }

    /// Convenience constructor for missing versions
    pub fn version_not_found(version: u64) -> Self {
        Error::NotFound(format!("Version {}", version))
    }

    /// True when this error maps to a 404 at the API boundary
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Rebuild an owned copy of this error, keeping its taxonomy.
    ///
    /// `Io` keeps its kind with the message as text; `Json` degrades to
    /// `ProcessFailure` carrying the message (the source error is not
    /// cloneable). Used where an error crosses a shared future.
    pub(crate) fn duplicate(&self) -> Error {
        match self {
            Error::NotFound(s) => Error::NotFound(s.clone()),
            Error::Validation(s) => Error::Validation(s.clone()),
            Error::ProcessFailure(s) => Error::ProcessFailure(s.clone()),
            Error::Timeout(s) => Error::Timeout(s.clone()),
            Error::Io(e) => Error::Io(io::Error::new(e.kind(), e.to_string())),
            Error::Json(e) => Error::ProcessFailure(format!("JSON error: {}", e)),
        }
    }
}
