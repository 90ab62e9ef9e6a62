//! Raw record parsing: `/proc/<pid>/status`, `/proc/<pid>/stat`, and the
//! terminal device number carried in the latter.

pub mod proc_parsers;
pub mod tty;

pub use proc_parsers::{parse_tty_nr, stat_fields_after_comm, StatusFields};
pub use tty::{DeviceClass, DeviceNumber, DEFAULT_PTS_DIR, PTS_MAJOR};
