//! Error types shared by table parsing, library loading and composition queries.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for weak rate operations
#[derive(Error, Debug)]
pub enum RateError {
    /// Table text does not describe a rectangular, monotone grid, or a row
    /// failed numeric parsing. `line` is 1-based; `None` for whole-table problems.
    #[error("Malformed rate table{}: {message}", .line.map(|l| format!(" (line {})", l)).unwrap_or_default())]
    MalformedTable { line: Option<usize>, message: String },

    /// A table source could not be turned into a rate of the library
    #[error("Failed to load '{identifier}': {message}")]
    LibraryLoad { identifier: String, message: String },

    /// Composition query for a nuclide it does not hold
    #[error("Unknown nuclide '{0}' in composition")]
    UnknownNuclide(String),

    /// String that does not name a nuclide
    #[error("Invalid nuclide '{0}'")]
    InvalidNuclide(String),

    /// Negative or non-finite mass fraction
    #[error("Invalid mass fraction {value} for {nuclide}")]
    InvalidFraction { nuclide: String, value: f64 },

    /// Normalization of a composition whose fractions sum to zero
    #[error("Cannot normalize a composition with zero total mass fraction")]
    EmptyComposition,

    /// Unknown library keyword or unset data path
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O failure while reading table files
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON (de)serialization failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Type alias for Results using RateError
pub type Result<T> = std::result::Result<T, RateError>;

impl RateError {
    /// Malformed table error tied to a specific line
    pub fn malformed_at(line: usize, message: impl Into<String>) -> Self {
        Self::MalformedTable {
            line: Some(line),
            message: message.into(),
        }
    }

    /// Malformed table error about the table as a whole
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedTable {
            line: None,
            message: message.into(),
        }
    }

    pub fn library_load(identifier: impl Into<String>, message: impl Into<String>) -> Self {
        Self::LibraryLoad {
            identifier: identifier.into(),
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
