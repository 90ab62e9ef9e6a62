//! Command-line surface over the topology queries.
//!
//! Every subcommand prints either aligned text or one JSON document and
//! returns an `ExitCode`. Errors are reported with their class so callers
//! can tell a vanished process from a permission problem.

use crate::exit_codes::ExitCode;
use crate::topology::{ProcessInfo, ProcessInfoProvider, TopologyResolver};
use clap::{Parser, Subcommand};
use ptopo_common::{Error, OutputFormat, Pid, Result, SCHEMA_VERSION};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

/// Inspect process, group, session and terminal relationships.
#[derive(Parser, Debug)]
#[command(name = "ptopo", version, about)]
pub struct Cli {
    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Config file (otherwise $PTOPO_CONFIG, then the XDG config dir)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parent, group, session and terminal of one process
    Show {
        /// Process ID (defaults to this process)
        pid: Option<Pid>,
    },
    /// Ancestor chain of a process, root first
    Tree {
        /// Process ID (defaults to this process)
        pid: Option<Pid>,
    },
    /// Every visible PID
    Pids,
    /// Processes bucketed by process group
    Groups,
    /// Process groups bucketed by session
    Sessions,
    /// Owning session and foreground group of a terminal
    Terminal {
        /// Terminal device path, e.g. /dev/pts/6
        path: PathBuf,
    },
    /// Every pseudo-terminal with its session and foreground group
    Terminals,
    /// Processes owned by a user
    Ps {
        /// Real UID to filter on (defaults to the caller's)
        #[arg(long)]
        uid: Option<u32>,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Show { .. } => "show",
            Commands::Tree { .. } => "tree",
            Commands::Pids => "pids",
            Commands::Groups => "groups",
            Commands::Sessions => "sessions",
            Commands::Terminal { .. } => "terminal",
            Commands::Terminals => "terminals",
            Commands::Ps { .. } => "ps",
        }
    }
}

/// Run the command dispatcher.
pub fn run<P: ProcessInfoProvider>(
    format: OutputFormat,
    command: &Commands,
    resolver: &TopologyResolver<P>,
) -> ExitCode {
    let name = command.name();
    let result = match command {
        Commands::Show { pid } => run_show(format, resolver, pid.unwrap_or_else(self_pid)),
        Commands::Tree { pid } => run_tree(format, resolver, pid.unwrap_or_else(self_pid)),
        Commands::Pids => run_pids(format, resolver),
        Commands::Groups => run_groups(format, resolver),
        Commands::Sessions => run_sessions(format, resolver),
        Commands::Terminal { path } => run_terminal(format, resolver, path),
        Commands::Terminals => run_terminals(format, resolver),
        Commands::Ps { uid } => run_ps(format, resolver, uid.unwrap_or_else(real_uid)),
    };
    result.unwrap_or_else(|e| report_error(format, name, &e))
}

/// Print an error in the selected format and map it to an exit code.
pub fn report_error(format: OutputFormat, command: &str, err: &Error) -> ExitCode {
    match format {
        OutputFormat::Json => print_json(&envelope(
            command,
            json!({
                "error": {
                    "kind": err.kind(),
                    "code": err.code(),
                    "message": err.to_string(),
                }
            }),
        )),
        OutputFormat::Text => eprintln!("ptopo {command}: {err}"),
    }
    ExitCode::from(err)
}

fn self_pid() -> Pid {
    std::process::id() as Pid
}

fn real_uid() -> u32 {
    // SAFETY: getuid cannot fail and has no preconditions.
    unsafe { libc::getuid() }
}

fn envelope(command: &str, body: Value) -> Value {
    let mut out = json!({
        "schema_version": SCHEMA_VERSION,
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "command": command,
    });
    if let (Some(obj), Value::Object(fields)) = (out.as_object_mut(), body) {
        obj.extend(fields);
    }
    out
}

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("ptopo: failed to encode output: {e}"),
    }
}

fn display_tty(tty: &Option<PathBuf>) -> String {
    tty.as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<none>".to_string())
}

fn run_show<P: ProcessInfoProvider>(
    format: OutputFormat,
    resolver: &TopologyResolver<P>,
    pid: Pid,
) -> Result<ExitCode> {
    let info = resolver.process_info(pid)?;
    match format {
        OutputFormat::Json => print_json(&envelope(
            "show",
            json!({
                "process": info,
                "is_group_leader": info.is_group_leader(),
                "is_session_leader": info.is_session_leader(),
            }),
        )),
        OutputFormat::Text => {
            println!("pid      {}", info.pid);
            println!("name     {}", info.name);
            println!("parent   {}", info.ppid);
            println!("group    {}", info.pgid);
            println!("session  {}", info.sid);
            println!("terminal {}", display_tty(&info.tty));
            println!();
            println!("is group leader   {}", info.is_group_leader());
            println!("is session leader {}", info.is_session_leader());
        }
    }
    Ok(ExitCode::Clean)
}

fn run_tree<P: ProcessInfoProvider>(
    format: OutputFormat,
    resolver: &TopologyResolver<P>,
    pid: Pid,
) -> Result<ExitCode> {
    let chain = resolver.ancestry(pid)?;
    match format {
        OutputFormat::Json => print_json(&envelope("tree", json!({ "ancestry": chain }))),
        OutputFormat::Text => {
            for (depth, info) in chain.iter().enumerate() {
                println!("{:indent$}{}", "", tree_line(info), indent = depth * 2);
            }
        }
    }
    Ok(ExitCode::Clean)
}

fn tree_line(info: &ProcessInfo) -> String {
    let leader = if info.is_group_leader() { ", leader" } else { "" };
    format!(
        "{}  {} (group: {}{}, session: {}, tty: {})",
        info.pid,
        info.name,
        info.pgid,
        leader,
        info.sid,
        display_tty(&info.tty)
    )
}

fn run_pids<P: ProcessInfoProvider>(
    format: OutputFormat,
    resolver: &TopologyResolver<P>,
) -> Result<ExitCode> {
    let pids: Vec<Pid> = resolver.list_pids()?.collect();
    match format {
        OutputFormat::Json => print_json(&envelope(
            "pids",
            json!({ "pids": pids, "count": pids.len() }),
        )),
        OutputFormat::Text => {
            for pid in &pids {
                println!("{pid}");
            }
        }
    }
    Ok(ExitCode::Clean)
}

fn run_groups<P: ProcessInfoProvider>(
    format: OutputFormat,
    resolver: &TopologyResolver<P>,
) -> Result<ExitCode> {
    let groups = resolver.groups()?;
    match format {
        OutputFormat::Json => {
            let list: Vec<Value> = groups
                .iter()
                .map(|(pgid, members)| json!({ "pgid": pgid, "members": members }))
                .collect();
            print_json(&envelope("groups", json!({ "groups": list })));
        }
        OutputFormat::Text => {
            for (pgid, members) in &groups {
                let n = members.len();
                println!("{}: {} process{}", pgid, n, if n == 1 { "" } else { "es" });
            }
        }
    }
    Ok(ExitCode::Clean)
}

fn run_sessions<P: ProcessInfoProvider>(
    format: OutputFormat,
    resolver: &TopologyResolver<P>,
) -> Result<ExitCode> {
    let sessions = resolver.sessions()?;
    match format {
        OutputFormat::Json => {
            let list: Vec<Value> = sessions
                .iter()
                .map(|(sid, groups)| json!({ "sid": sid, "groups": groups }))
                .collect();
            print_json(&envelope("sessions", json!({ "sessions": list })));
        }
        OutputFormat::Text => {
            for (sid, groups) in &sessions {
                println!("{sid}");
                for pgid in groups {
                    println!("  {pgid}");
                }
            }
        }
    }
    Ok(ExitCode::Clean)
}

fn run_terminal<P: ProcessInfoProvider>(
    format: OutputFormat,
    resolver: &TopologyResolver<P>,
    path: &Path,
) -> Result<ExitCode> {
    let locator = resolver.locator();
    let session = locator.session_for_terminal(path)?;
    let foreground = locator.foreground_group_for_terminal(path);

    match format {
        OutputFormat::Json => {
            let fg = match &foreground {
                Ok(pgid) => json!(pgid),
                Err(e) => json!({ "kind": e.kind(), "code": e.code(), "message": e.to_string() }),
            };
            print_json(&envelope(
                "terminal",
                json!({ "path": path, "session": session, "foreground_group": fg }),
            ));
        }
        OutputFormat::Text => {
            println!("{}:", path.display());
            match session {
                Some(sid) => println!("  session: {sid}"),
                None => println!("  session: <none>"),
            }
            match &foreground {
                Ok(pgid) => println!("  fg grp:  {pgid}"),
                Err(e) => println!("  fg grp:  <{e}>"),
            }
        }
    }

    match (foreground, session) {
        (Err(e), _) => Ok(ExitCode::from(&e)),
        (Ok(_), None) => Ok(ExitCode::NoneFound),
        (Ok(_), Some(_)) => Ok(ExitCode::Clean),
    }
}

fn run_terminals<P: ProcessInfoProvider>(
    format: OutputFormat,
    resolver: &TopologyResolver<P>,
) -> Result<ExitCode> {
    let reports = resolver.locator().terminals()?;
    match format {
        OutputFormat::Json => print_json(&envelope("terminals", json!({ "terminals": reports }))),
        OutputFormat::Text => {
            let show = |v: Option<Pid>| v.map_or_else(|| "<unknown>".to_string(), |v| v.to_string());
            for report in &reports {
                println!("{}", report.path.display());
                println!("  session: {}", show(report.session));
                println!("  device:  {}", show(report.device_session));
                println!("  fg grp:  {}", show(report.foreground_group));
            }
        }
    }
    Ok(ExitCode::Clean)
}

fn run_ps<P: ProcessInfoProvider>(
    format: OutputFormat,
    resolver: &TopologyResolver<P>,
    uid: u32,
) -> Result<ExitCode> {
    let processes = resolver.processes_of_user(uid)?;
    match format {
        OutputFormat::Json => print_json(&envelope(
            "ps",
            json!({ "uid": uid, "processes": processes }),
        )),
        OutputFormat::Text => {
            for info in &processes {
                println!("{}  {}", info.pid, info.name);
            }
        }
    }
    Ok(ExitCode::Clean)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{FixtureProcess, FixtureProvider};

    fn resolver() -> TopologyResolver<FixtureProvider> {
        TopologyResolver::new(
            FixtureProvider::new()
                .with_process(FixtureProcess::new(1, "init"))
                .with_process(FixtureProcess::new(40, "sh").parent(1).pts(2))
                .with_terminal("/dev/pts/2", 40, 40),
        )
    }

    #[test]
    fn cli_parses_global_format_after_subcommand() {
        let cli = Cli::try_parse_from(["ptopo", "show", "42", "--format", "json"]).unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(matches!(cli.command, Commands::Show { pid: Some(42) }));
    }

    #[test]
    fn cli_rejects_non_numeric_pid() {
        assert!(Cli::try_parse_from(["ptopo", "show", "abc"]).is_err());
    }

    #[test]
    fn show_missing_pid_maps_to_exit_code() {
        let code = run(OutputFormat::Json, &Commands::Show { pid: Some(9999) }, &resolver());
        assert_eq!(code, ExitCode::NoSuchProcess);
    }

    #[test]
    fn terminal_with_owner_is_clean() {
        let cmd = Commands::Terminal { path: PathBuf::from("/dev/pts/2") };
        assert_eq!(run(OutputFormat::Text, &cmd, &resolver()), ExitCode::Clean);
    }

    #[test]
    fn terminal_not_a_tty_is_reported() {
        let cmd = Commands::Terminal { path: PathBuf::from("/dev/pts/5") };
        assert_eq!(run(OutputFormat::Text, &cmd, &resolver()), ExitCode::NotATerminal);
    }

    #[test]
    fn envelope_merges_body() {
        let v = envelope("pids", json!({ "count": 3 }));
        assert_eq!(v["command"], "pids");
        assert_eq!(v["count"], 3);
        assert_eq!(v["schema_version"], SCHEMA_VERSION);
    }

    #[test]
    fn tree_line_marks_group_leaders() {
        let info = resolver().process_info(40).unwrap();
        assert_eq!(
            tree_line(&info),
            "40  sh (group: 40, leader, session: 40, tty: /dev/pts/2)"
        );
    }
}
