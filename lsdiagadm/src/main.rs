// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use anyhow::Result;
use clap::{Parser, Subcommand};
use lsdiag::snapshot::Snapshot;
use slog::Drain;
use slog::Logger;
use std::path::PathBuf;

mod trace;
mod validate;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "link-state network diagnostics",
    long_about = None,
    infer_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Snapshot file holding the captured databases
    #[arg(short, long, env = "LSDIAG_SNAPSHOT")]
    snapshot: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Trace all equal-cost forwarding paths between two endpoints.
    Trace(trace::TraceCommand),

    /// Validate the computed link-state view against the flooded one.
    Validate(validate::ValidateCommand),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let log = init_logger();

    let snapshot = Snapshot::from_file(&cli.snapshot)?;

    match cli.command {
        Commands::Trace(cmd) => trace::run(cmd, &snapshot, log)?,
        Commands::Validate(cmd) => validate::run(cmd, &snapshot)?,
    }
    Ok(())
}

fn init_logger() -> Logger {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_envlogger::new(drain).fuse();
    let drain = slog_async::Async::new(drain)
        .chan_size(0x2000)
        .build()
        .fuse();
    slog::Logger::root(drain, slog::o!())
}
