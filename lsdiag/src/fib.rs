// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use slog::{debug, Logger};
use std::collections::HashMap;
use std::net::IpAddr;
use std::time::Duration;

use crate::prefixes::PrefixIndex;
use crate::service::FibAgent;
use crate::types::{FibNextHop, Prefix};

/// Live-FIB results resolved so far in one trace, keyed by node. A node is
/// queried at most once per trace; an entry may be empty when the query
/// failed or the route is not programmed.
#[derive(Debug, Default)]
pub struct FibCache {
    routes: HashMap<String, Vec<FibNextHop>>,
}

impl FibCache {
    pub fn contains(&self, node: &str) -> bool {
        self.routes.contains_key(node)
    }

    pub fn insert(&mut self, node: &str, nexthops: Vec<FibNextHop>) {
        self.routes.insert(node.to_string(), nexthops);
    }

    /// Whether a simulated next hop is programmed in the node's hardware.
    /// Unknown nodes confirm nothing.
    pub fn confirms(&self, node: &str, address: IpAddr, ifname: &str) -> bool {
        self.routes
            .get(node)
            .map(|nexthops| {
                nexthops
                    .iter()
                    .any(|nh| nh.address == address && nh.ifname == ifname)
            })
            .unwrap_or(false)
    }
}

/// Queries a node's hardware forwarding agent over its loopback address.
/// Every failure mode degrades to "no confirmation available": a node with
/// no resolvable loopback, an unreachable agent, or a route missing from
/// the reply all yield an empty next-hop set, never an error.
pub struct FibProbe<'a, A: FibAgent> {
    agent: &'a A,
    prefixes: &'a PrefixIndex,
    port: u16,
    timeout: Duration,
    log: Logger,
}

impl<'a, A: FibAgent> FibProbe<'a, A> {
    pub fn new(
        agent: &'a A,
        prefixes: &'a PrefixIndex,
        port: u16,
        timeout: Duration,
        log: Logger,
    ) -> Self {
        Self {
            agent,
            prefixes,
            port,
            timeout,
            log,
        }
    }

    /// The hardware next hops a node has programmed for a destination
    /// prefix.
    pub fn nexthops(&self, node: &str, destination: &Prefix) -> Vec<FibNextHop> {
        let Some(loopback) = self.prefixes.loopback(node) else {
            debug!(self.log, "fib: no loopback for node {node}");
            return Vec::new();
        };

        let routes = match self.agent.route_table(
            IpAddr::V6(loopback),
            self.port,
            self.timeout,
        ) {
            Ok(routes) => routes,
            Err(e) => {
                debug!(self.log, "fib: query to {node} ({loopback}) failed: {e}");
                return Vec::new();
            }
        };

        routes
            .into_iter()
            .find(|r| r.destination == *destination)
            .map(|r| r.nexthops)
            .unwrap_or_default()
    }
}
