//! Process topology core.
//!
//! Answers, for a running Linux system, which process is the parent of a
//! PID, which group and session it belongs to, which pseudo-terminal it is
//! attached to, and which session and foreground group own a terminal.
//!
//! ```no_run
//! use ptopo_core::TopologyResolver;
//!
//! let resolver = TopologyResolver::live();
//! let me = std::process::id() as i32;
//! println!("parent  {}", resolver.parent_pid(me)?);
//! println!("group   {}", resolver.group_id(me)?);
//! println!("session {}", resolver.session_id(me)?);
//! println!("tty     {:?}", resolver.controlling_terminal(me)?);
//! # Ok::<(), ptopo_common::Error>(())
//! ```

pub mod cli;
pub mod collect;
pub mod exit_codes;
pub mod logging;
pub mod topology;

pub use exit_codes::ExitCode;
pub use topology::{
    FixtureProcess, FixtureProvider, LiveProvider, ProcessInfo, ProcessInfoProvider,
    SessionTerminalLocator, TerminalReport, TopologyResolver,
};
