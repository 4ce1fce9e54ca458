//! Editor error types
//!
//! Error codes follow the SAVECRAFT_CATEGORY_NAME format:
//! - SAVECRAFT_NOT_FOUND (ERROR)
//! - SAVECRAFT_PARSE_ERROR (ERROR)
//! - SAVECRAFT_UNSUPPORTED_LAYOUT (ERROR)
//! - SAVECRAFT_MALFORMED_IDENTIFIER (ERROR)
//! - SAVECRAFT_INVALID_VALUE (ERROR)
//! - SAVECRAFT_INVALID_INPUT (ERROR)
//! - SAVECRAFT_IO_ERROR (ERROR)
//! - SAVECRAFT_ROLLBACK_FAILED (FATAL)
//!
//! Every variant names the file or field it concerns. The codec and the
//! projections never recover on their own; only the persistence layer rolls
//! back, and it still returns the original failure afterwards.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::nbt::NbtError;

/// Severity levels for editor errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Operation fails, the save file is intact
    Error,
    /// Automatic recovery failed; manual restore from the backup is required
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Errors raised while resolving, reading, editing, or saving player data.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("cannot parse tag tree in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: NbtError,
    },

    #[error("unsupported save layout in {}: {reason}", path.display())]
    UnsupportedLayout { path: PathBuf, reason: String },

    #[error("malformed player identifier {input:?}: {reason}")]
    MalformedIdentifier { input: String, reason: String },

    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("I/O error while trying to {action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(
        "save of {} failed ({original}) and rollback also failed ({rollback}); restore manually from {}",
        path.display(),
        backup.display()
    )]
    RollbackFailed {
        path: PathBuf,
        backup: PathBuf,
        original: Box<EditorError>,
        rollback: Box<EditorError>,
    },
}

impl EditorError {
    /// Creates an I/O error, mapping `NotFound` to the dedicated variant
    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            return EditorError::NotFound { path };
        }
        EditorError::Io {
            action,
            path,
            source,
        }
    }

    /// Creates an I/O error that is never remapped to `NotFound`
    pub fn io_raw(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        EditorError::Io {
            action,
            path: path.into(),
            source,
        }
    }

    pub fn parse(path: impl Into<PathBuf>, source: NbtError) -> Self {
        EditorError::Parse {
            path: path.into(),
            source,
        }
    }

    pub fn unsupported(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        EditorError::UnsupportedLayout {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn malformed_identifier(input: impl Into<String>, reason: impl Into<String>) -> Self {
        EditorError::MalformedIdentifier {
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        EditorError::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_input(reason: impl Into<String>) -> Self {
        EditorError::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            EditorError::NotFound { .. } => "SAVECRAFT_NOT_FOUND",
            EditorError::Parse { .. } => "SAVECRAFT_PARSE_ERROR",
            EditorError::UnsupportedLayout { .. } => "SAVECRAFT_UNSUPPORTED_LAYOUT",
            EditorError::MalformedIdentifier { .. } => "SAVECRAFT_MALFORMED_IDENTIFIER",
            EditorError::InvalidValue { .. } => "SAVECRAFT_INVALID_VALUE",
            EditorError::InvalidInput { .. } => "SAVECRAFT_INVALID_INPUT",
            EditorError::Io { .. } => "SAVECRAFT_IO_ERROR",
            EditorError::RollbackFailed { .. } => "SAVECRAFT_ROLLBACK_FAILED",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            EditorError::RollbackFailed { .. } => Severity::Fatal,
            _ => Severity::Error,
        }
    }

    /// Returns true if the save file may need manual recovery
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

/// Result type for editor operations
pub type EditorResult<T> = Result<T, EditorError>;
