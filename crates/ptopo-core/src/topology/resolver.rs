//! Process, group, session and controlling-terminal queries.
//!
//! Groups and sessions are named by the PID of their leader, so every
//! relationship here comes back as a plain PID. Nothing is cached: each
//! call re-reads the records it needs.

use super::provider::{LiveProvider, ProcessInfoProvider};
use crate::collect::{parse_tty_nr, DeviceClass, StatusFields, DEFAULT_PTS_DIR};
use ptopo_common::{is_valid_pid, Error, GroupId, Pid, RecordKind, Result, SessionId};
use ptopo_config::TopologyConfig;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// One process with its place in the group/session hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessInfo {
    pub pid: Pid,
    pub name: String,
    pub ppid: Pid,
    pub pgid: GroupId,
    pub sid: SessionId,
    pub uid: u32,
    pub tty: Option<PathBuf>,
}

impl ProcessInfo {
    pub fn is_group_leader(&self) -> bool {
        self.pid == self.pgid
    }

    pub fn is_session_leader(&self) -> bool {
        self.pid == self.sid
    }
}

/// Answers topology questions against a `ProcessInfoProvider`.
#[derive(Debug, Clone)]
pub struct TopologyResolver<P> {
    provider: P,
    pts_dir: PathBuf,
}

impl TopologyResolver<LiveProvider> {
    /// Resolver over the real `/proc` and `/dev/pts`.
    pub fn live() -> Self {
        Self::new(LiveProvider::default())
    }

    /// Resolver over the locations named in `config`.
    pub fn from_config(config: &TopologyConfig) -> Self {
        Self::new(LiveProvider::new(&config.proc_root, &config.pts_dir)).with_pts_dir(&config.pts_dir)
    }
}

impl<P: ProcessInfoProvider> TopologyResolver<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            pts_dir: PathBuf::from(DEFAULT_PTS_DIR),
        }
    }

    /// Directory used to name pseudo-terminal devices.
    pub fn with_pts_dir(mut self, pts_dir: impl Into<PathBuf>) -> Self {
        self.pts_dir = pts_dir.into();
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn pts_dir(&self) -> &Path {
        &self.pts_dir
    }

    /// Read and parse the status record of `pid`.
    pub fn status_fields(&self, pid: Pid) -> Result<StatusFields> {
        let content = self.provider.read_status(pid)?;
        Ok(StatusFields::parse(pid, &content))
    }

    /// PID of the parent (`PPid`). 0 for PID 1 and namespace roots.
    pub fn parent_pid(&self, pid: Pid) -> Result<Pid> {
        self.status_fields(pid)?.require_int("PPid")
    }

    /// PID of the process group leader (`NSpgid`).
    pub fn group_id(&self, pid: Pid) -> Result<GroupId> {
        self.status_fields(pid)?.require_int("NSpgid")
    }

    /// PID of the session leader, from the session-id primitive.
    pub fn session_id(&self, pid: Pid) -> Result<SessionId> {
        self.provider.session_of(pid)
    }

    pub fn is_group_leader(&self, pid: Pid) -> Result<bool> {
        Ok(pid == self.group_id(pid)?)
    }

    pub fn is_session_leader(&self, pid: Pid) -> Result<bool> {
        Ok(pid == self.session_id(pid)?)
    }

    /// Every process currently visible.
    ///
    /// Each call rescans. PIDs come from the `Pid` field of each status
    /// record, in directory order. A process that exits between the scan
    /// and the read is left out, as is a record whose `Pid` is out of range.
    pub fn list_pids(&self) -> Result<impl Iterator<Item = Pid> + '_> {
        let entries = self.provider.pid_entries()?;
        Ok(entries.into_iter().filter_map(move |entry| {
            let pid = self
                .status_fields(entry)
                .and_then(|f| f.require_int::<Pid>("Pid"))
                .and_then(|pid| {
                    if is_valid_pid(pid) {
                        Ok(pid)
                    } else {
                        Err(Error::malformed(entry, RecordKind::Status, format!("Pid {pid} out of range")))
                    }
                });
            match pid {
                Ok(pid) => Some(pid),
                Err(e) if e.is_no_such_process() => {
                    debug!(pid = entry, "process exited during enumeration");
                    None
                }
                Err(e) => {
                    warn!(pid = entry, error = %e, "skipping unreadable process");
                    None
                }
            }
        }))
    }

    /// Controlling terminal of `pid`, when it is a pseudo-terminal.
    ///
    /// A missing process is an error. A stat record that cannot be decoded,
    /// or a terminal of any other device class, is `None`.
    pub fn controlling_terminal(&self, pid: Pid) -> Result<Option<PathBuf>> {
        Ok(self.terminal_class(pid)?.and_then(|class| class.device_path(&self.pts_dir)))
    }

    /// Decoded class of the controlling terminal device of `pid`.
    pub fn terminal_class(&self, pid: Pid) -> Result<Option<DeviceClass>> {
        let stat = self.provider.read_stat(pid)?;
        match parse_tty_nr(&stat) {
            Some(tty_nr) => {
                let class = DeviceClass::from_tty_nr(tty_nr);
                trace!(pid, tty_nr, ?class, "decoded controlling terminal");
                Ok(Some(class))
            }
            None => {
                debug!(pid, "stat record has no decodable tty_nr");
                Ok(None)
            }
        }
    }

    /// Snapshot of `pid` combining its status, stat and session.
    pub fn process_info(&self, pid: Pid) -> Result<ProcessInfo> {
        let status = self.status_fields(pid)?;
        Ok(ProcessInfo {
            pid,
            name: status.require("Name")?.to_string(),
            ppid: status.require_int("PPid")?,
            pgid: status.require_int("NSpgid")?,
            sid: self.session_id(pid)?,
            uid: status.require_int("Uid")?,
            tty: self.controlling_terminal(pid)?,
        })
    }

    /// `pid` and its ancestors, root first.
    ///
    /// The walk ends at a parent of 0. A PID met twice ends it as well.
    pub fn ancestry(&self, pid: Pid) -> Result<Vec<ProcessInfo>> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = pid;
        while current != 0 && seen.insert(current) {
            let info = self.process_info(current)?;
            current = info.ppid;
            chain.push(info);
        }
        chain.reverse();
        Ok(chain)
    }

    /// Snapshots of every visible process, skipping ones that exit mid-scan.
    pub fn all_processes(&self) -> Result<Vec<ProcessInfo>> {
        let mut out = Vec::new();
        for pid in self.list_pids()? {
            match self.process_info(pid) {
                Ok(info) => out.push(info),
                Err(e) if e.is_no_such_process() => {
                    debug!(pid, "process exited before snapshot");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(out)
    }

    /// Processes whose real UID is `uid`.
    pub fn processes_of_user(&self, uid: u32) -> Result<Vec<ProcessInfo>> {
        Ok(self
            .all_processes()?
            .into_iter()
            .filter(|info| info.uid == uid)
            .collect())
    }

    /// Visible processes bucketed by process group.
    pub fn groups(&self) -> Result<BTreeMap<GroupId, Vec<Pid>>> {
        let mut groups: BTreeMap<GroupId, Vec<Pid>> = BTreeMap::new();
        for pid in self.list_pids()? {
            match self.group_id(pid) {
                Ok(pgid) => groups.entry(pgid).or_default().push(pid),
                Err(e) if e.is_no_such_process() => continue,
                Err(e) => return Err(e),
            }
        }
        for members in groups.values_mut() {
            members.sort_unstable();
        }
        Ok(groups)
    }

    /// Process groups bucketed by session.
    ///
    /// The session of a group is taken from its members, so a group whose
    /// leader has exited still lands in the right session.
    pub fn sessions(&self) -> Result<BTreeMap<SessionId, BTreeSet<GroupId>>> {
        let mut sessions: BTreeMap<SessionId, BTreeSet<GroupId>> = BTreeMap::new();
        for pid in self.list_pids()? {
            let membership = self
                .group_id(pid)
                .and_then(|pgid| self.session_id(pid).map(|sid| (pgid, sid)));
            match membership {
                Ok((pgid, sid)) => {
                    sessions.entry(sid).or_default().insert(pgid);
                }
                Err(e) if e.is_no_such_process() => continue,
                Err(Error::PermissionDenied { target }) => {
                    debug!(pid, %target, "session not visible");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(sessions)
    }
}
