//! kiln CLI.
//!
//! Builds container images for a tree of interdependent components and
//! pushes them to a registry, in dependency order, with a bounded worker
//! pool.

// The CLI prints the summary and diagnostics to stdout/stderr.
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;
mod commands;
mod logging;
mod shutdown;

use clap::Parser;

/// Exit code for a run whose summary reports failure.
const EXIT_FAILURE: i32 = 1;
/// Exit code for an interrupted run (128 + SIGINT).
const EXIT_SIGINT: i32 = 130;

fn main() {
    let cli = cli::Cli::parse();
    logging::init(&cli.log_level, &cli.log_format);

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("Fatal: failed to create async runtime: {err}");
            std::process::exit(EXIT_FAILURE);
        }
    };

    let code = runtime.block_on(run(cli));
    std::process::exit(code);
}

async fn run(cli: cli::Cli) -> i32 {
    let cancel = shutdown::install_signal_handlers();

    let result = match cli.command {
        cli::Command::Build(args) => commands::build::run(&cli.config, args, cancel).await,
        cli::Command::List(args) => commands::list::run(&cli.config, args).await,
    };

    match result {
        Ok(code) => code,
        Err(report) => {
            eprintln!("{report:?}");
            EXIT_FAILURE
        }
    }
}
