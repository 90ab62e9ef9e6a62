//! Process information providers.
//!
//! `ProcessInfoProvider` is the seam between topology queries and the
//! operating system. `LiveProvider` reads procfs and calls the session and
//! terminal primitives directly; `FixtureProvider` (see `fixture`) serves a
//! fabricated process table.

use ptopo_common::{is_valid_pid, parse_pid, Error, GroupId, Pid, Result, SessionId};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Raw process and terminal facts.
///
/// Every call reads current state; implementations keep no cache.
pub trait ProcessInfoProvider {
    /// Text of `/proc/<pid>/status`.
    fn read_status(&self, pid: Pid) -> Result<String>;

    /// Text of `/proc/<pid>/stat`.
    fn read_stat(&self, pid: Pid) -> Result<String>;

    /// PID of the session leader of `pid` (`getsid(2)`).
    fn session_of(&self, pid: Pid) -> Result<SessionId>;

    /// Candidate PIDs: every numeric entry of the process directory.
    ///
    /// An entry may vanish before its records are read.
    fn pid_entries(&self) -> Result<Vec<Pid>>;

    /// Foreground process group of the terminal at `path` (`tcgetpgrp(3)`).
    fn foreground_group(&self, path: &Path) -> Result<GroupId>;

    /// Session attached to the terminal at `path` (`tcgetsid(3)`).
    fn terminal_session(&self, path: &Path) -> Result<SessionId>;

    /// Pseudo-terminal slave devices currently present.
    fn terminal_paths(&self) -> Result<Vec<PathBuf>>;
}

impl<P: ProcessInfoProvider + ?Sized> ProcessInfoProvider for &P {
    fn read_status(&self, pid: Pid) -> Result<String> {
        (**self).read_status(pid)
    }

    fn read_stat(&self, pid: Pid) -> Result<String> {
        (**self).read_stat(pid)
    }

    fn session_of(&self, pid: Pid) -> Result<SessionId> {
        (**self).session_of(pid)
    }

    fn pid_entries(&self) -> Result<Vec<Pid>> {
        (**self).pid_entries()
    }

    fn foreground_group(&self, path: &Path) -> Result<GroupId> {
        (**self).foreground_group(path)
    }

    fn terminal_session(&self, path: &Path) -> Result<SessionId> {
        (**self).terminal_session(path)
    }

    fn terminal_paths(&self) -> Result<Vec<PathBuf>> {
        (**self).terminal_paths()
    }
}

/// Provider backed by a mounted procfs and libc.
#[derive(Debug, Clone)]
pub struct LiveProvider {
    proc_root: PathBuf,
    pts_dir: PathBuf,
}

impl Default for LiveProvider {
    fn default() -> Self {
        Self::new("/proc", crate::collect::DEFAULT_PTS_DIR)
    }
}

impl LiveProvider {
    pub fn new(proc_root: impl Into<PathBuf>, pts_dir: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: proc_root.into(),
            pts_dir: pts_dir.into(),
        }
    }

    pub fn proc_root(&self) -> &Path {
        &self.proc_root
    }

    pub fn pts_dir(&self) -> &Path {
        &self.pts_dir
    }

    fn read_record(&self, pid: Pid, name: &str) -> Result<String> {
        let path = self.proc_root.join(pid.to_string()).join(name);
        trace!(pid, path = %path.display(), "reading process record");
        fs::read_to_string(&path).map_err(|e| Error::for_pid(e, pid))
    }

    /// Open a terminal for a query without making it our controlling
    /// terminal. The handle is closed when the returned `File` drops.
    fn open_terminal(path: &Path) -> Result<File> {
        OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NOCTTY)
            .open(path)
            .map_err(|e| Error::for_terminal(e, path))
    }
}

impl ProcessInfoProvider for LiveProvider {
    fn read_status(&self, pid: Pid) -> Result<String> {
        self.read_record(pid, "status")
    }

    fn read_stat(&self, pid: Pid) -> Result<String> {
        self.read_record(pid, "stat")
    }

    fn session_of(&self, pid: Pid) -> Result<SessionId> {
        // getsid(0) answers for the caller.
        if !is_valid_pid(pid) {
            return Err(Error::NoSuchProcess { pid });
        }
        // SAFETY: getsid has no memory-safety preconditions.
        let sid = unsafe { libc::getsid(pid as libc::pid_t) };
        if sid < 0 {
            let err = io::Error::last_os_error();
            debug!(pid, error = %err, "getsid failed");
            return Err(Error::for_pid(err, pid));
        }
        Ok(sid)
    }

    fn pid_entries(&self) -> Result<Vec<Pid>> {
        let mut pids = Vec::new();
        for entry in fs::read_dir(&self.proc_root)? {
            // An entry that errors mid-iteration belongs to a process that
            // is already gone.
            let Ok(entry) = entry else {
                continue;
            };
            if let Some(pid) = entry.file_name().to_str().and_then(parse_pid) {
                pids.push(pid);
            }
        }
        Ok(pids)
    }

    fn foreground_group(&self, path: &Path) -> Result<GroupId> {
        let tty = Self::open_terminal(path)?;
        // SAFETY: the descriptor is owned by `tty` and open for this call.
        let pgrp = unsafe { libc::tcgetpgrp(tty.as_raw_fd()) };
        if pgrp < 0 {
            return Err(Error::for_terminal(io::Error::last_os_error(), path));
        }
        Ok(pgrp)
    }

    fn terminal_session(&self, path: &Path) -> Result<SessionId> {
        let tty = Self::open_terminal(path)?;
        // SAFETY: the descriptor is owned by `tty` and open for this call.
        let sid = unsafe { libc::tcgetsid(tty.as_raw_fd()) };
        if sid < 0 {
            return Err(Error::for_terminal(io::Error::last_os_error(), path));
        }
        Ok(sid)
    }

    fn terminal_paths(&self) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(&self.pts_dir)? {
            let entry = entry?;
            // `ptmx` shares the directory but is the master multiplexer.
            let is_slave = entry
                .file_name()
                .to_str()
                .is_some_and(|name| !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit()));
            if is_slave {
                paths.push(entry.path());
            }
        }
        paths.sort_by_key(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.parse::<u32>().ok())
                .unwrap_or(u32::MAX)
        });
        Ok(paths)
    }
}
