//! Parsers for /proc filesystem entries (Linux-only).
//!
//! Two records are read per process:
//! - `/proc/<pid>/status`: one `Field:\tvalue` pair per line
//! - `/proc/<pid>/stat`: a single line of positional fields
//!
//! Both parsers work on already-read text so they can be fed from a live
//! procfs or from fabricated records.

use ptopo_common::{Error, Pid, RecordKind, Result};
use std::collections::HashMap;
use tracing::trace;

/// Separator between a status field name and its value.
const STATUS_SEPARATOR: &str = ":\t";

/// Index of `tty_nr` among the fields that follow the closing `)` of comm.
///
/// Overall it is field 7 (1-based); after `pid` and `(comm)` are consumed
/// the remaining order is `state ppid pgrp session tty_nr ...`.
const TTY_NR_INDEX: usize = 4;

/// Field name to raw value mapping for one read of `/proc/<pid>/status`.
///
/// Lookups of absent fields fail with `MalformedRecord` instead of
/// defaulting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusFields {
    pid: Pid,
    fields: HashMap<String, String>,
}

impl StatusFields {
    /// Parse the text of a status record read for `pid`.
    ///
    /// Each line is split on the first `:\t` only. Trailing whitespace on the
    /// value is stripped. Lines without the separator carry no field and are
    /// skipped.
    pub fn parse(pid: Pid, content: &str) -> Self {
        let mut fields = HashMap::new();
        for line in content.lines() {
            match line.split_once(STATUS_SEPARATOR) {
                Some((name, value)) => {
                    fields.insert(name.to_string(), value.trim_end().to_string());
                }
                None if line.trim().is_empty() => {}
                None => trace!(pid, line, "status line without separator skipped"),
            }
        }
        Self { pid, fields }
    }

    /// PID the record was read for.
    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// Raw value of a field, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Raw value of a field that must be present.
    pub fn require(&self, name: &str) -> Result<&str> {
        self.get(name).ok_or_else(|| {
            Error::malformed(self.pid, RecordKind::Status, format!("missing field {name}"))
        })
    }

    /// First whitespace-separated integer of a field.
    ///
    /// `NSpgid`, `NSpid` and `Uid` can hold several tab-separated values;
    /// the first is the one relative to the namespace of the procfs mount.
    pub fn require_int<T: std::str::FromStr>(&self, name: &str) -> Result<T> {
        let raw = self.require(name)?;
        raw.split_ascii_whitespace()
            .next()
            .and_then(|first| first.parse::<T>().ok())
            .ok_or_else(|| {
                Error::malformed(
                    self.pid,
                    RecordKind::Status,
                    format!("field {name} is not an integer: {raw:?}"),
                )
            })
    }

    /// Number of fields in the record.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Fields of `/proc/<pid>/stat` that follow the process name.
///
/// The name is wrapped in parentheses and may itself contain spaces and
/// parentheses, so splitting starts after the first `)`. Returns `None` when
/// there is no `)` at all.
pub fn stat_fields_after_comm(content: &str) -> Option<Vec<&str>> {
    let close = content.find(')')?;
    Some(content[close + 1..].split_ascii_whitespace().collect())
}

/// Extract the packed controlling terminal device number (`tty_nr`).
///
/// Returns `None` for a record with no `)`, too few fields, or an
/// unparsable number. The kernel prints `tty_nr` as a signed int; the
/// value is reinterpreted as the 32-bit device number it encodes.
pub fn parse_tty_nr(content: &str) -> Option<u32> {
    let fields = stat_fields_after_comm(content)?;
    let raw = fields.get(TTY_NR_INDEX)?;
    raw.parse::<i64>().ok().map(|n| n as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATUS: &str = "Name:\tbash\n\
        Umask:\t0022\n\
        State:\tS (sleeping)\n\
        Tgid:\t4242\n\
        Pid:\t4242\n\
        PPid:\t4200\n\
        Uid:\t1000\t1000\t1000\t1000\n\
        NSpid:\t4242\n\
        NSpgid:\t4242\n\
        NSsid:\t4242\n";

    #[test]
    fn status_parses_fields() {
        let fields = StatusFields::parse(4242, STATUS);
        assert_eq!(fields.pid(), 4242);
        assert_eq!(fields.get("Name"), Some("bash"));
        assert_eq!(fields.get("State"), Some("S (sleeping)"));
        assert_eq!(fields.require_int::<i32>("PPid").unwrap(), 4200);
        assert_eq!(fields.require_int::<u32>("Uid").unwrap(), 1000);
        assert_eq!(fields.len(), 10);
    }

    #[test]
    fn status_splits_on_first_separator_only() {
        let fields = StatusFields::parse(1, "Name:\tweird:\tname:\tx\n");
        assert_eq!(fields.get("Name"), Some("weird:\tname:\tx"));
    }

    #[test]
    fn status_strips_trailing_whitespace() {
        let fields = StatusFields::parse(1, "Name:\tdaemon  \t\r\nPPid:\t0\n");
        assert_eq!(fields.get("Name"), Some("daemon"));
        assert_eq!(fields.require_int::<i32>("PPid").unwrap(), 0);
    }

    #[test]
    fn status_missing_field_is_malformed() {
        let fields = StatusFields::parse(9, "Name:\tx\n");
        let err = fields.require("NSpgid").unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedRecord { pid: 9, record: RecordKind::Status, .. }
        ));
    }

    #[test]
    fn status_non_numeric_field_is_malformed() {
        let fields = StatusFields::parse(9, "PPid:\tabc\nNSpgid:\t\n");
        assert!(fields.require_int::<i32>("PPid").is_err());
        assert!(fields.require_int::<i32>("NSpgid").is_err());
    }

    #[test]
    fn status_nested_namespace_uses_first_value() {
        let fields = StatusFields::parse(7000, "NSpgid:\t7000\t12\n");
        assert_eq!(fields.require_int::<i32>("NSpgid").unwrap(), 7000);
    }

    #[test]
    fn status_skips_lines_without_separator() {
        let fields = StatusFields::parse(1, "garbage\n\nPid:\t1\n");
        assert_eq!(fields.len(), 1);
        assert!(!fields.is_empty());
    }

    #[test]
    fn stat_tty_nr_simple() {
        let stat = "4242 (bash) S 4200 4242 4242 34822 4300 4194560 0 0 0 0 1 2 0 0 20 0 1 0 100";
        assert_eq!(parse_tty_nr(stat), Some(34822));
    }

    #[test]
    fn stat_comm_with_spaces() {
        // Spaces inside the name must not shift the positional fields.
        let stat = "77 (tmux: server) S 1 77 77 0 -1 4194560 0";
        let fields = stat_fields_after_comm(stat).unwrap();
        assert_eq!(fields[0], "S");
        assert_eq!(parse_tty_nr(stat), Some(0));
    }

    #[test]
    fn stat_split_happens_at_first_close_paren() {
        // A `)` inside the name ends the name early; fields shift by one.
        let stat = "5 (x) y) S 1 5 5 34816 -1";
        let fields = stat_fields_after_comm(stat).unwrap();
        assert_eq!(fields[0], "y)");
        assert_eq!(parse_tty_nr(stat), Some(5));
    }

    #[test]
    fn stat_without_close_paren_is_none() {
        assert_eq!(stat_fields_after_comm("12 (broken S 1 2 3 4"), None);
        assert_eq!(parse_tty_nr("12 (broken S 1 2 3 4"), None);
    }

    #[test]
    fn stat_truncated_is_none() {
        assert_eq!(parse_tty_nr("12 (x) S 1 2"), None);
    }

    #[test]
    fn stat_unparsable_tty_is_none() {
        assert_eq!(parse_tty_nr("12 (x) S 1 2 3 pts 5"), None);
    }

    #[test]
    fn stat_negative_tty_nr_reinterpreted() {
        assert_eq!(parse_tty_nr("12 (x) S 1 2 3 -1 5"), Some(u32::MAX));
    }
}
