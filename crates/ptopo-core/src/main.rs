//! ptopo - process topology inspector.

use clap::Parser;
use ptopo_common::Error;
use ptopo_config::resolve_config;
use ptopo_core::cli::{self, Cli};
use ptopo_core::{logging, ExitCode, TopologyResolver};
use tracing::debug;

fn main() {
    let args = Cli::parse();

    let resolved = match resolve_config(args.config.as_deref()) {
        Ok(resolved) => resolved,
        Err(e) => {
            let code = cli::report_error(args.format, "config", &Error::Config(e.to_string()));
            std::process::exit(code.as_i32());
        }
    };

    logging::init(&resolved.config.log_level, resolved.config.log_format);
    debug!(
        source = %resolved.source,
        proc_root = %resolved.config.proc_root.display(),
        "starting"
    );

    let resolver = TopologyResolver::from_config(&resolved.config);
    let code: ExitCode = cli::run(args.format, &args.command, &resolver);
    std::process::exit(code.as_i32());
}
