// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Depth-first enumeration of all equal-cost forwarding paths between two
//! endpoints, with each hop cross-checked against the live hardware state
//! of the node that forwards it.

use slog::{debug, warn, Logger};
use std::collections::HashSet;
use std::net::IpAddr;
use std::time::Duration;

use crate::error::Error;
use crate::fib::{FibCache, FibProbe};
use crate::lookup::{ecmp_nexthops, longest_match};
use crate::prefixes::PrefixIndex;
use crate::service::{FibAgent, LinkStateClient};
use crate::topology::TopologyIndex;
use crate::types::{AddressFamily, Hop, Prefix, TracedPath};
use crate::{DEFAULT_FIB_AGENT_PORT, DEFAULT_MAX_HOPS};

#[derive(Debug, Clone, Copy)]
pub struct TraceConfig {
    /// Branches beyond this hop count are discarded.
    pub max_hops: usize,
    /// TCP port of the hardware forwarding agent on each node.
    pub fib_port: u16,
    /// Timeout for each hardware agent query.
    pub fib_timeout: Duration,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            max_hops: DEFAULT_MAX_HOPS,
            fib_port: DEFAULT_FIB_AGENT_PORT,
            fib_timeout: Duration::from_secs(5),
        }
    }
}

/// Resolve a trace destination argument: a known node name maps to its
/// loopback, otherwise the argument must parse as an address or as a
/// prefix (taken at its network address).
pub fn resolve_destination(
    prefixes: &PrefixIndex,
    dst: &str,
) -> Result<IpAddr, Error> {
    if prefixes.contains_node(dst) {
        return prefixes
            .loopback(dst)
            .map(IpAddr::V6)
            .ok_or_else(|| Error::NoLoopback(dst.to_string()));
    }
    if let Ok(addr) = dst.parse::<IpAddr>() {
        return Ok(addr);
    }
    if let Ok(prefix) = dst.parse::<Prefix>() {
        return Ok(Prefix::new(prefix.addr(), prefix.length()).addr());
    }
    Err(Error::Destination(dst.to_string()))
}

pub struct Tracer<'a, C: LinkStateClient, A: FibAgent> {
    client: &'a C,
    topology: TopologyIndex,
    prefixes: &'a PrefixIndex,
    probe: FibProbe<'a, A>,
    max_hops: usize,
    log: Logger,
}

impl<'a, C: LinkStateClient, A: FibAgent> Tracer<'a, C, A> {
    pub fn new(
        client: &'a C,
        prefixes: &'a PrefixIndex,
        agent: &'a A,
        config: TraceConfig,
        log: Logger,
    ) -> Result<Self, Error> {
        let topology =
            TopologyIndex::from_adjacency_dbs(&client.adjacency_dbs()?);
        if topology.is_empty() {
            warn!(log, "no adjacencies in the computed view");
        }
        let probe = FibProbe::new(
            agent,
            prefixes,
            config.fib_port,
            config.fib_timeout,
            log.clone(),
        );
        Ok(Self {
            client,
            topology,
            prefixes,
            probe,
            max_hops: config.max_hops,
            log,
        })
    }

    /// Enumerate every equal-cost path from `src` towards `dst`, in
    /// depth-first discovery order. Each returned path is tagged with
    /// whether all of its hops were confirmed in live hardware state.
    pub fn trace(
        &self,
        src: &str,
        dst: IpAddr,
    ) -> Result<Vec<TracedPath>, Error> {
        debug!(self.log, "trace: {src} -> {dst}");

        let mut paths = Vec::new();
        let mut visited = HashSet::from([src.to_string()]);
        let mut hops = Vec::new();
        let mut cache = FibCache::default();

        self.step(
            src,
            dst,
            1,
            &mut visited,
            &mut hops,
            true,
            &mut cache,
            &mut paths,
        )?;
        Ok(paths)
    }

    /// One frame of the backtracking search. The visited set and hop
    /// buffer are rolled back on every exit from a descent, the cycle
    /// abort included.
    #[allow(clippy::too_many_arguments)]
    fn step(
        &self,
        cur: &str,
        dst: IpAddr,
        hop: usize,
        visited: &mut HashSet<String>,
        hops: &mut Vec<Hop>,
        on_fib: bool,
        cache: &mut FibCache,
        paths: &mut Vec<TracedPath>,
    ) -> Result<(), Error> {
        if hop > self.max_hops {
            return Ok(());
        }

        let local_len = self.prefixes.local_match_len(cur, dst);
        let table = self.client.route_table(cur)?;
        let route = longest_match(&table, dst)?;

        let candidates = match route {
            // Forward only while the route is at least as specific as
            // anything this node advertises itself; otherwise the
            // destination originates here.
            Some(route) if route.destination.length() >= local_len => {
                if on_fib && !cache.contains(cur) {
                    cache.insert(
                        cur,
                        self.probe.nexthops(cur, &route.destination),
                    );
                }
                ecmp_nexthops(route, AddressFamily::of(dst))
            }
            _ => Vec::new(),
        };

        if candidates.is_empty() {
            // Arriving here from the source itself is not a path.
            if hop > 1 {
                paths.push(TracedPath {
                    hops: hops.clone(),
                    fib_confirmed: on_fib,
                });
            }
            return Ok(());
        }

        for nh in candidates {
            let neighbor = self
                .topology
                .neighbor(cur, &nh.ifname, nh.address)
                .ok_or_else(|| Error::UnknownNeighbor {
                    node: cur.to_string(),
                    ifname: nh.ifname.clone(),
                    nexthop: nh.address,
                })?
                .to_string();

            if visited.contains(&neighbor) {
                debug!(
                    self.log,
                    "trace: cycle at {neighbor}, abandoning branch"
                );
                return Ok(());
            }

            hops.push(Hop {
                index: hop,
                node: neighbor.clone(),
                ifname: nh.ifname.clone(),
                metric: nh.metric,
                nexthop: nh.address,
            });
            visited.insert(neighbor.clone());

            let confirmed =
                on_fib && cache.confirms(cur, nh.address, &nh.ifname);
            self.step(
                &neighbor,
                dst,
                hop + 1,
                visited,
                hops,
                confirmed,
                cache,
                paths,
            )?;

            visited.remove(&neighbor);
            hops.pop();
        }

        Ok(())
    }
}
