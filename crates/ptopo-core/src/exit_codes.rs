//! Exit codes for the ptopo CLI.
//!
//! Exit codes communicate the query outcome without requiring output parsing.

use ptopo_common::Error;

/// Exit codes for ptopo operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Query answered with a value
    Clean = 0,

    /// Query answered with "none" (no terminal, no owning session)
    NoneFound = 1,

    /// Configuration error
    ConfigError = 10,

    /// I/O error
    IoError = 13,

    /// Named process does not exist
    NoSuchProcess = 20,

    /// Record present but not in the expected shape
    MalformedRecord = 21,

    /// Caller lacks rights to a process or device
    PermissionDenied = 22,

    /// Path is not a terminal device
    NotATerminal = 23,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Check if this exit code indicates success.
    pub fn is_success(self) -> bool {
        matches!(self, ExitCode::Clean | ExitCode::NoneFound)
    }

    /// Check if this exit code indicates an error requiring attention.
    pub fn is_error(self) -> bool {
        (self as i32) >= 10
    }
}

impl From<&Error> for ExitCode {
    fn from(err: &Error) -> Self {
        match err {
            Error::Config(_) => ExitCode::ConfigError,
            Error::NoSuchProcess { .. } => ExitCode::NoSuchProcess,
            Error::MalformedRecord { .. } => ExitCode::MalformedRecord,
            Error::PermissionDenied { .. } => ExitCode::PermissionDenied,
            Error::NotATerminal { .. } => ExitCode::NotATerminal,
            Error::Io(_) => ExitCode::IoError,
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}
