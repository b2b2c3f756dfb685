//! `vkdispatch` command-line entry point.
use anyhow::Result;
use clap::Parser;

use vkdispatch::cli::{Cli, Command};
use vkdispatch::commands;
use vkdispatch::logging::{self, Logger};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = Cli::parse();
    logging::init_subscriber(args.verbose);
    let log = Logger::new();

    match args.command {
        Command::Resolve(opts) => commands::resolve::run(&args.global, &opts, &log),
        Command::Inspect(opts) => commands::inspect::run(&args.global, &opts, &log),
        Command::Version => commands::version::run(),
    }
}
