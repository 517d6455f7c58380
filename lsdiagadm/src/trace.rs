// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use anyhow::Result;
use clap::Args;
use colored::*;
use lsdiag::prefixes::PrefixIndex;
use lsdiag::service::LinkStateClient;
use lsdiag::snapshot::Snapshot;
use lsdiag::trace::{resolve_destination, TraceConfig, Tracer};
use lsdiag::TracedPath;
use slog::Logger;
use std::io::{stdout, Write};
use std::time::Duration;
use tabwriter::TabWriter;

#[derive(Debug, Args)]
pub struct TraceCommand {
    /// Source node name
    src: String,

    /// Destination node name, address or prefix
    dst: String,

    /// Maximum number of hops to explore
    #[arg(long, default_value_t = lsdiag::DEFAULT_MAX_HOPS)]
    max_hops: usize,

    /// TCP port of the hardware forwarding agent
    #[arg(long, default_value_t = lsdiag::DEFAULT_FIB_AGENT_PORT)]
    fib_port: u16,

    /// Timeout for each hardware agent query
    #[arg(long, default_value = "5s", value_parser = humantime::parse_duration)]
    fib_timeout: Duration,
}

pub fn run(cmd: TraceCommand, snapshot: &Snapshot, log: Logger) -> Result<()> {
    let prefixes = PrefixIndex::new(snapshot.prefix_dbs()?);
    let dst = resolve_destination(&prefixes, &cmd.dst)?;

    let config = TraceConfig {
        max_hops: cmd.max_hops,
        fib_port: cmd.fib_port,
        fib_timeout: cmd.fib_timeout,
    };
    let tracer = Tracer::new(snapshot, &prefixes, snapshot, config, log)?;
    let paths = tracer.trace(&cmd.src, dst)?;

    print_paths(&paths)
}

fn print_paths(paths: &[TracedPath]) -> Result<()> {
    if paths.is_empty() {
        println!("No paths found.");
        return Ok(());
    }

    println!(
        "{} path{} found.",
        paths.len(),
        if paths.len() == 1 { "" } else { "s" }
    );

    for (idx, path) in paths.iter().enumerate() {
        println!();
        println!(
            "Path {}{}",
            idx + 1,
            // a star marks paths fully confirmed in hardware
            if path.fib_confirmed { "  *" } else { "" }
        );

        let mut tw = TabWriter::new(stdout());
        writeln!(
            &mut tw,
            "{}\t{}\t{}\t{}\t{}",
            "Hop".dimmed(),
            "Node".dimmed(),
            "Interface".dimmed(),
            "Metric".dimmed(),
            "Next Hop".dimmed(),
        )?;
        for hop in &path.hops {
            writeln!(
                &mut tw,
                "{}\t{}\t{}\t{}\t{}",
                hop.index, hop.node, hop.ifname, hop.metric, hop.nexthop,
            )?;
        }
        tw.flush()?;
    }

    Ok(())
}
