//! Terminal-centric queries: which session owns a terminal, and which
//! process group sits in its foreground.

use super::provider::ProcessInfoProvider;
use super::resolver::TopologyResolver;
use ptopo_common::{Error, GroupId, Result, SessionId};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Everything known about one pseudo-terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TerminalReport {
    pub path: PathBuf,
    /// Session of the first process found with this controlling terminal.
    pub session: Option<SessionId>,
    /// Session the kernel reports for the device (`tcgetsid`).
    pub device_session: Option<SessionId>,
    /// Foreground process group (`tcgetpgrp`).
    pub foreground_group: Option<GroupId>,
    /// Failures of the device queries, by error kind and message.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

/// Terminal queries built on a `TopologyResolver`.
#[derive(Debug)]
pub struct SessionTerminalLocator<'a, P> {
    resolver: &'a TopologyResolver<P>,
}

impl<P: ProcessInfoProvider> TopologyResolver<P> {
    pub fn locator(&self) -> SessionTerminalLocator<'_, P> {
        SessionTerminalLocator::new(self)
    }
}

impl<'a, P: ProcessInfoProvider> SessionTerminalLocator<'a, P> {
    pub fn new(resolver: &'a TopologyResolver<P>) -> Self {
        Self { resolver }
    }

    /// Session of the first process whose controlling terminal is `path`.
    ///
    /// Linear scan over all processes. Processes that exit or hide their
    /// session during the scan are skipped.
    pub fn session_for_terminal(&self, path: &Path) -> Result<Option<SessionId>> {
        for pid in self.resolver.list_pids()? {
            let matched = match self.resolver.controlling_terminal(pid) {
                Ok(tty) => tty.as_deref() == Some(path),
                Err(e) if skippable(&e) => {
                    debug!(pid, error = %e, "skipping process during terminal scan");
                    continue;
                }
                Err(e) => return Err(e),
            };
            if !matched {
                continue;
            }
            match self.resolver.session_id(pid) {
                Ok(sid) => return Ok(Some(sid)),
                Err(e) if skippable(&e) => {
                    debug!(pid, error = %e, "terminal owner vanished before session lookup");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }

    /// Foreground process group of the terminal at `path`.
    ///
    /// The device is opened for the duration of the query only. The kernel
    /// answers only for the caller's own controlling terminal; for any
    /// other terminal this fails with `NotATerminal`.
    pub fn foreground_group_for_terminal(&self, path: &Path) -> Result<GroupId> {
        self.resolver.provider().foreground_group(path)
    }

    /// Session the kernel attaches to the terminal at `path`.
    pub fn device_session(&self, path: &Path) -> Result<SessionId> {
        self.resolver.provider().terminal_session(path)
    }

    /// Report every pseudo-terminal present.
    ///
    /// Device query failures are recorded per terminal instead of ending
    /// the listing.
    pub fn terminals(&self) -> Result<Vec<TerminalReport>> {
        let mut reports = Vec::new();
        for path in self.resolver.provider().terminal_paths()? {
            let mut errors = Vec::new();
            let device_session = self
                .device_session(&path)
                .map_err(|e| errors.push(format!("{}: {e}", e.kind())))
                .ok();
            let foreground_group = self
                .foreground_group_for_terminal(&path)
                .map_err(|e| errors.push(format!("{}: {e}", e.kind())))
                .ok();
            let session = self.session_for_terminal(&path)?;
            reports.push(TerminalReport {
                path,
                session,
                device_session,
                foreground_group,
                errors,
            });
        }
        Ok(reports)
    }
}

fn skippable(err: &Error) -> bool {
    matches!(err, Error::NoSuchProcess { .. } | Error::PermissionDenied { .. })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::fixture::{FixtureProcess, FixtureProvider};

    fn provider() -> FixtureProvider {
        FixtureProvider::new()
            .with_process(FixtureProcess::new(1, "init"))
            .with_process(FixtureProcess::new(500, "bash").parent(1).pts(6))
            .with_process(
                FixtureProcess::new(510, "top")
                    .parent(500)
                    .session(500)
                    .pts(6),
            )
            .with_process(FixtureProcess::new(600, "zsh").parent(1).pts(7))
            .with_terminal("/dev/pts/6", 500, 510)
            .with_terminal("/dev/pts/7", 600, 600)
    }

    #[test]
    fn session_for_terminal_finds_owner() {
        let r = TopologyResolver::new(provider());
        let sid = r.locator().session_for_terminal(Path::new("/dev/pts/6")).unwrap();
        assert_eq!(sid, Some(500));

        // The answer is backed by a process that really has that terminal.
        let owner = r
            .list_pids()
            .unwrap()
            .find(|&pid| r.controlling_terminal(pid).unwrap().as_deref() == Some(Path::new("/dev/pts/6")))
            .unwrap();
        assert_eq!(r.session_id(owner).unwrap(), 500);
    }

    #[test]
    fn session_for_unused_terminal_is_none() {
        let r = TopologyResolver::new(provider());
        assert_eq!(r.locator().session_for_terminal(Path::new("/dev/pts/42")).unwrap(), None);
    }

    #[test]
    fn session_scan_skips_vanished() {
        let r = TopologyResolver::new(provider().with_vanished(2));
        assert_eq!(
            r.locator().session_for_terminal(Path::new("/dev/pts/7")).unwrap(),
            Some(600)
        );
    }

    #[test]
    fn foreground_group_of_known_terminal() {
        let r = TopologyResolver::new(provider());
        assert_eq!(
            r.locator().foreground_group_for_terminal(Path::new("/dev/pts/6")).unwrap(),
            510
        );
    }

    #[test]
    fn foreground_group_errors_are_distinct() {
        let r = TopologyResolver::new(provider().with_denied_terminal("/dev/pts/9"));
        let locator = r.locator();
        assert!(matches!(
            locator.foreground_group_for_terminal(Path::new("/dev/pts/9")),
            Err(Error::PermissionDenied { .. })
        ));
        assert!(matches!(
            locator.foreground_group_for_terminal(Path::new("/dev/null")),
            Err(Error::NotATerminal { .. })
        ));
    }

    #[test]
    fn terminals_report_each_device() {
        let r = TopologyResolver::new(provider().with_denied_terminal("/dev/pts/9"));
        let reports = r.locator().terminals().unwrap();
        assert_eq!(reports.len(), 3);

        assert_eq!(
            reports[0],
            TerminalReport {
                path: PathBuf::from("/dev/pts/6"),
                session: Some(500),
                device_session: Some(500),
                foreground_group: Some(510),
                errors: vec![],
            }
        );

        let denied = &reports[2];
        assert_eq!(denied.path, PathBuf::from("/dev/pts/9"));
        assert_eq!(denied.session, None);
        assert_eq!(denied.foreground_group, None);
        assert_eq!(denied.errors.len(), 2);
        assert!(denied.errors[0].starts_with("permission_denied"));
    }
}
