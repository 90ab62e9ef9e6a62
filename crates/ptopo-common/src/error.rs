//! Error types for process topology lookups.

use crate::id::Pid;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for topology operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Which per-process record a parse failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// `/proc/<pid>/status` key/value record.
    Status,
    /// `/proc/<pid>/stat` positional record.
    Stat,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Status => write!(f, "status"),
            RecordKind::Stat => write!(f, "stat"),
        }
    }
}

/// Unified error type for topology queries.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    // Lookup errors (20-29)
    #[error("process {pid} not found")]
    NoSuchProcess { pid: Pid },

    #[error("malformed {record} record for process {pid}: {reason}")]
    MalformedRecord {
        pid: Pid,
        record: RecordKind,
        reason: String,
    },

    #[error("permission denied accessing {target}")]
    PermissionDenied { target: String },

    #[error("{} is not a terminal", .path.display())]
    NotATerminal { path: PathBuf },

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Returns the error code for this error type.
    /// Used for detailed error reporting in JSON output.
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::NoSuchProcess { .. } => 20,
            Error::MalformedRecord { .. } => 21,
            Error::PermissionDenied { .. } => 22,
            Error::NotATerminal { .. } => 23,
            Error::Io(_) => 60,
        }
    }

    /// Short machine-readable class name.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config(_) => "config",
            Error::NoSuchProcess { .. } => "no_such_process",
            Error::MalformedRecord { .. } => "malformed_record",
            Error::PermissionDenied { .. } => "permission_denied",
            Error::NotATerminal { .. } => "not_a_terminal",
            Error::Io(_) => "io",
        }
    }

    /// Build a `MalformedRecord` error.
    pub fn malformed(pid: Pid, record: RecordKind, reason: impl Into<String>) -> Self {
        Error::MalformedRecord {
            pid,
            record,
            reason: reason.into(),
        }
    }

    /// Classify an I/O failure that happened while reading a record of `pid`.
    ///
    /// A vanished `/proc/<pid>` shows up as `ENOENT`, and `ESRCH` when the
    /// process exits between open and read.
    pub fn for_pid(err: io::Error, pid: Pid) -> Self {
        if err.kind() == io::ErrorKind::NotFound || err.raw_os_error() == Some(libc::ESRCH) {
            return Error::NoSuchProcess { pid };
        }
        if is_permission_error(&err) {
            return Error::PermissionDenied {
                target: format!("process {pid}"),
            };
        }
        Error::Io(err)
    }

    /// Classify an I/O failure that happened while opening or querying a
    /// terminal device.
    pub fn for_terminal(err: io::Error, path: &Path) -> Self {
        if is_permission_error(&err) {
            return Error::PermissionDenied {
                target: path.display().to_string(),
            };
        }
        match err.raw_os_error() {
            Some(libc::ENOTTY) | Some(libc::ENOENT) | Some(libc::ENXIO) | Some(libc::ENODEV) => {
                Error::NotATerminal {
                    path: path.to_path_buf(),
                }
            }
            _ if err.kind() == io::ErrorKind::NotFound => Error::NotATerminal {
                path: path.to_path_buf(),
            },
            _ => Error::Io(err),
        }
    }

    /// True for errors that mean the process is simply gone.
    pub fn is_no_such_process(&self) -> bool {
        matches!(self, Error::NoSuchProcess { .. })
    }
}

fn is_permission_error(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::PermissionDenied || err.raw_os_error() == Some(libc::EPERM)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_pid_maps_not_found() {
        let err = io::Error::from(io::ErrorKind::NotFound);
        assert!(matches!(Error::for_pid(err, 42), Error::NoSuchProcess { pid: 42 }));

        let err = io::Error::from_raw_os_error(libc::ESRCH);
        assert!(Error::for_pid(err, 7).is_no_such_process());
    }

    #[test]
    fn test_for_pid_maps_permission() {
        let err = io::Error::from_raw_os_error(libc::EACCES);
        let mapped = Error::for_pid(err, 1);
        assert_eq!(mapped.kind(), "permission_denied");
        assert_eq!(mapped.to_string(), "permission denied accessing process 1");
    }

    #[test]
    fn test_for_terminal_maps_enotty() {
        let path = Path::new("/dev/null");
        let err = io::Error::from_raw_os_error(libc::ENOTTY);
        let mapped = Error::for_terminal(err, path);
        assert!(matches!(mapped, Error::NotATerminal { .. }));
        assert_eq!(mapped.to_string(), "/dev/null is not a terminal");
    }

    #[test]
    fn test_for_terminal_maps_permission() {
        let path = Path::new("/dev/pts/0");
        let err = io::Error::from_raw_os_error(libc::EPERM);
        assert_eq!(Error::for_terminal(err, path).code(), 22);
    }

    #[test]
    fn test_malformed_display() {
        let err = Error::malformed(12, RecordKind::Status, "missing field PPid");
        assert_eq!(
            err.to_string(),
            "malformed status record for process 12: missing field PPid"
        );
        assert_eq!(err.code(), 21);
    }
}
