//! In-memory process table for exercising topology queries without a live
//! procfs.
//!
//! Records are rendered in the same textual formats the kernel produces, so
//! the full parse path runs against fixtures too.

use super::provider::ProcessInfoProvider;
use crate::collect::{DeviceNumber, PTS_MAJOR};
use ptopo_common::{Error, GroupId, Pid, Result, SessionId};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// One fabricated process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureProcess {
    pub pid: Pid,
    pub name: String,
    pub ppid: Pid,
    pub pgid: GroupId,
    pub sid: SessionId,
    pub uid: u32,
    /// Packed device number written into the stat record.
    pub tty_nr: u32,
}

impl FixtureProcess {
    /// A process that leads its own group and session, with no terminal.
    pub fn new(pid: Pid, name: &str) -> Self {
        Self {
            pid,
            name: name.to_string(),
            ppid: 0,
            pgid: pid,
            sid: pid,
            uid: 0,
            tty_nr: 0,
        }
    }

    pub fn parent(mut self, ppid: Pid) -> Self {
        self.ppid = ppid;
        self
    }

    pub fn group(mut self, pgid: GroupId) -> Self {
        self.pgid = pgid;
        self
    }

    pub fn session(mut self, sid: SessionId) -> Self {
        self.sid = sid;
        self
    }

    pub fn uid(mut self, uid: u32) -> Self {
        self.uid = uid;
        self
    }

    /// Attach `/dev/pts/<minor>` as controlling terminal.
    pub fn pts(mut self, minor: u32) -> Self {
        self.tty_nr = DeviceNumber {
            major: PTS_MAJOR,
            minor,
        }
        .encode();
        self
    }

    /// Attach an arbitrary device as controlling terminal.
    pub fn tty_nr(mut self, tty_nr: u32) -> Self {
        self.tty_nr = tty_nr;
        self
    }

    fn status_text(&self) -> String {
        format!(
            "Name:\t{name}\n\
             Umask:\t0022\n\
             State:\tS (sleeping)\n\
             Tgid:\t{pid}\n\
             Ngid:\t0\n\
             Pid:\t{pid}\n\
             PPid:\t{ppid}\n\
             TracerPid:\t0\n\
             Uid:\t{uid}\t{uid}\t{uid}\t{uid}\n\
             NSpid:\t{pid}\n\
             NSpgid:\t{pgid}\n\
             NSsid:\t{sid}\n",
            name = self.name,
            pid = self.pid,
            ppid = self.ppid,
            uid = self.uid,
            pgid = self.pgid,
            sid = self.sid,
        )
    }

    fn stat_text(&self) -> String {
        format!(
            "{pid} ({name}) S {ppid} {pgid} {sid} {tty} -1 4194560 0 0 0 0 0 0 0 0 20 0 1 0 100\n",
            pid = self.pid,
            name = self.name,
            ppid = self.ppid,
            pgid = self.pgid,
            sid = self.sid,
            tty = self.tty_nr as i32,
        )
    }
}

/// Fabricated terminal device state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixtureTerminal {
    pub session: SessionId,
    pub foreground: GroupId,
}

/// Provider answering from an in-memory table.
#[derive(Debug, Clone, Default)]
pub struct FixtureProvider {
    processes: BTreeMap<Pid, FixtureProcess>,
    raw_status: BTreeMap<Pid, String>,
    raw_stat: BTreeMap<Pid, String>,
    vanished: BTreeSet<Pid>,
    terminals: BTreeMap<PathBuf, FixtureTerminal>,
    denied: BTreeSet<PathBuf>,
}

impl FixtureProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_process(mut self, process: FixtureProcess) -> Self {
        self.processes.insert(process.pid, process);
        self
    }

    /// Replace the rendered status record of `pid` with raw text.
    pub fn with_raw_status(mut self, pid: Pid, text: &str) -> Self {
        self.raw_status.insert(pid, text.to_string());
        self
    }

    /// Replace the rendered stat record of `pid` with raw text.
    pub fn with_raw_stat(mut self, pid: Pid, text: &str) -> Self {
        self.raw_stat.insert(pid, text.to_string());
        self
    }

    /// List `pid` during enumeration but fail every record read, as for a
    /// process that exits between the directory scan and the read.
    pub fn with_vanished(mut self, pid: Pid) -> Self {
        self.vanished.insert(pid);
        self
    }

    pub fn with_terminal(mut self, path: impl Into<PathBuf>, session: SessionId, foreground: GroupId) -> Self {
        self.terminals.insert(path.into(), FixtureTerminal { session, foreground });
        self
    }

    /// Make opening `path` fail with `PermissionDenied`.
    pub fn with_denied_terminal(mut self, path: impl Into<PathBuf>) -> Self {
        self.denied.insert(path.into());
        self
    }

    fn process(&self, pid: Pid) -> Result<&FixtureProcess> {
        if self.vanished.contains(&pid) {
            return Err(Error::NoSuchProcess { pid });
        }
        self.processes.get(&pid).ok_or(Error::NoSuchProcess { pid })
    }

    fn terminal(&self, path: &Path) -> Result<&FixtureTerminal> {
        if self.denied.contains(path) {
            return Err(Error::PermissionDenied {
                target: path.display().to_string(),
            });
        }
        self.terminals.get(path).ok_or_else(|| Error::NotATerminal {
            path: path.to_path_buf(),
        })
    }
}

impl ProcessInfoProvider for FixtureProvider {
    fn read_status(&self, pid: Pid) -> Result<String> {
        let process = self.process(pid)?;
        Ok(self
            .raw_status
            .get(&pid)
            .cloned()
            .unwrap_or_else(|| process.status_text()))
    }

    fn read_stat(&self, pid: Pid) -> Result<String> {
        let process = self.process(pid)?;
        Ok(self
            .raw_stat
            .get(&pid)
            .cloned()
            .unwrap_or_else(|| process.stat_text()))
    }

    fn session_of(&self, pid: Pid) -> Result<SessionId> {
        Ok(self.process(pid)?.sid)
    }

    fn pid_entries(&self) -> Result<Vec<Pid>> {
        let mut pids: BTreeSet<Pid> = self.processes.keys().copied().collect();
        pids.extend(self.vanished.iter().copied());
        Ok(pids.into_iter().collect())
    }

    fn foreground_group(&self, path: &Path) -> Result<GroupId> {
        Ok(self.terminal(path)?.foreground)
    }

    fn terminal_session(&self, path: &Path) -> Result<SessionId> {
        Ok(self.terminal(path)?.session)
    }

    fn terminal_paths(&self) -> Result<Vec<PathBuf>> {
        let mut paths: Vec<PathBuf> = self.terminals.keys().cloned().collect();
        paths.extend(self.denied.iter().cloned());
        paths.sort();
        paths.dedup();
        Ok(paths)
    }
}
