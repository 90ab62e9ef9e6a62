//! Process topology common types and errors.
//!
//! This crate provides foundational types shared across ptopo crates:
//! - PID aliases for processes, process groups, and sessions
//! - The unified error taxonomy for topology lookups
//! - Output format selection and schema versioning

pub mod error;
pub mod id;
pub mod output;
pub mod schema;

pub use error::{Error, RecordKind, Result};
pub use id::{is_valid_pid, parse_pid, GroupId, Pid, SessionId, PID_MAX_LIMIT};
pub use output::OutputFormat;
pub use schema::SCHEMA_VERSION;
