//! Process/group/session/terminal topology.
//!
//! ```text
//! ProcessInfoProvider ──► TopologyResolver ──► SessionTerminalLocator
//!  (raw records,            (parent, group,       (terminal → session,
//!   OS primitives)           session, tty)         foreground group)
//! ```

pub mod fixture;
pub mod locator;
pub mod provider;
pub mod resolver;

pub use fixture::{FixtureProcess, FixtureProvider, FixtureTerminal};
pub use locator::{SessionTerminalLocator, TerminalReport};
pub use provider::{LiveProvider, ProcessInfoProvider};
pub use resolver::{ProcessInfo, TopologyResolver};
