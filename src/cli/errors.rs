//! CLI-specific error types
//!
//! Editor failures keep their own SAVECRAFT_* code; the CLI adds codes only
//! for its own argument and stdout problems.

use std::fmt;
use std::io;

use crate::errors::EditorError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Arguments parsed but make no sense together
    InvalidArgument,
    /// I/O error writing to stdout
    IoError,
    /// Failure reported by the editor, carrying its code
    Editor(&'static str),
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgument => "SAVECRAFT_CLI_INVALID_ARGUMENT",
            Self::IoError => "SAVECRAFT_CLI_IO_ERROR",
            Self::Editor(code) => code,
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
    fatal: bool,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            fatal: false,
        }
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::InvalidArgument, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// True when the save file may need manual restore from its backup
    pub fn is_fatal(&self) -> bool {
        self.fatal
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = if self.fatal { "FATAL" } else { "ERROR" };
        write!(f, "[{}] {}: {}", severity, self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<EditorError> for CliError {
    fn from(e: EditorError) -> Self {
        Self {
            code: CliErrorCode::Editor(e.code()),
            message: e.to_string(),
            fatal: e.is_fatal(),
        }
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
