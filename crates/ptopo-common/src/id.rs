//! Process, group, and session identities.
//!
//! Groups and sessions have no identifier space of their own. A group is
//! named by the PID of its leader, and so is a session, so all three are
//! plain integer aliases.

/// Kernel process ID (`pid_t`).
pub type Pid = i32;

/// A process group, named by the PID of its leader.
pub type GroupId = Pid;

/// A session, named by the PID of its leader.
pub type SessionId = Pid;

/// Upper bound of `/proc/sys/kernel/pid_max` on 64-bit Linux (2^22).
pub const PID_MAX_LIMIT: Pid = 4_194_304;

/// Check that a PID lies inside the range the kernel can hand out.
pub fn is_valid_pid(pid: Pid) -> bool {
    pid > 0 && pid <= PID_MAX_LIMIT
}

/// Parse a PID from a decimal string, rejecting anything out of range.
///
/// Used for `/proc` directory entries, where names like `self`, `sys`
/// or `thread-self` must be skipped.
pub fn parse_pid(s: &str) -> Option<Pid> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse::<Pid>().ok().filter(|&pid| is_valid_pid(pid))
}
