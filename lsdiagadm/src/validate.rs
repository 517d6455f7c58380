// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use anyhow::Result;
use clap::Args;
use colored::*;
use lsdiag::snapshot::Snapshot;
use lsdiag::validate::{self, ValidationReport};
use std::io::{stdout, Write};
use tabwriter::TabWriter;

#[derive(Debug, Args)]
pub struct ValidateCommand {
    /// Emit the report as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(cmd: ValidateCommand, snapshot: &Snapshot) -> Result<()> {
    let report = validate::run(snapshot)?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report)?;
    }

    print_badge("adjacency", report.adjacency_passed());
    print_badge("prefix", report.prefix_passed());
    if !report.passed() {
        std::process::exit(1);
    }
    Ok(())
}

fn print_badge(db: &str, passed: bool) {
    if passed {
        println!(
            "{} {db} dbs match between the computed and flooded views",
            "PASS".black().on_green()
        );
    } else {
        println!(
            "{} {db} dbs do not match between the computed and flooded views",
            "FAIL".black().on_red()
        );
    }
}

fn print_report(report: &ValidationReport) -> Result<()> {
    for node in &report.missing_adjacency_nodes {
        println!(
            "node {node}'s adjacency db is missing from the computed view"
        );
    }
    for node in &report.missing_prefix_nodes {
        println!("node {node}'s prefix db is missing from the computed view");
    }

    for delta in &report.adjacency_deltas {
        println!(
            "node {}'s adjacency db is out of sync with the flooded view",
            delta.node
        );
        let mut tw = TabWriter::new(stdout());
        writeln!(
            &mut tw,
            "{}\t{}\t{}\t{}",
            "State".dimmed(),
            "Neighbor".dimmed(),
            "Interface".dimmed(),
            "Next Hop".dimmed(),
        )?;
        for adj in &delta.only_computed {
            writeln!(
                &mut tw,
                "computed only\t{}\t{}\t{}",
                adj.neighbor, adj.ifname, adj.nexthop_v6,
            )?;
        }
        for adj in &delta.only_flooded {
            writeln!(
                &mut tw,
                "flooded only\t{}\t{}\t{}",
                adj.neighbor, adj.ifname, adj.nexthop_v6,
            )?;
        }
        for change in &delta.changed {
            writeln!(
                &mut tw,
                "changed\t{}\t{}\t{} != {}",
                change.computed.neighbor,
                change.computed.ifname,
                change.computed.nexthop_v6,
                change.flooded.nexthop_v6,
            )?;
        }
        tw.flush()?;
    }

    for delta in &report.prefix_deltas {
        println!(
            "node {}'s prefix db is out of sync with the flooded view",
            delta.node
        );
        let mut tw = TabWriter::new(stdout());
        writeln!(
            &mut tw,
            "{}\t{}\t{}",
            "State".dimmed(),
            "Prefix".dimmed(),
            "Type".dimmed(),
        )?;
        for entry in &delta.only_computed {
            writeln!(
                &mut tw,
                "computed only\t{}\t{}",
                entry.prefix, entry.kind,
            )?;
        }
        for entry in &delta.only_flooded {
            writeln!(&mut tw, "flooded only\t{}\t{}", entry.prefix, entry.kind)?;
        }
        tw.flush()?;
    }

    for node in &report.adjacency_nodes.only_computed {
        println!("node {node}'s adjacency db is computed but never flooded");
    }
    for node in &report.adjacency_nodes.only_flooded {
        println!("node {node}'s adjacency db is flooded but never computed");
    }
    for node in &report.prefix_nodes.only_computed {
        println!("node {node}'s prefix db is computed but never flooded");
    }
    for node in &report.prefix_nodes.only_flooded {
        println!("node {node}'s prefix db is flooded but never computed");
    }

    Ok(())
}
