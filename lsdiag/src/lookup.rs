// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use itertools::Itertools;
use std::net::IpAddr;

use crate::error::Error;
use crate::types::{AddressFamily, NextHop, Route, RouteTable};

/// Find the longest-prefix-match route for an address in a node's RIB.
///
/// Two containing routes with the same maximal prefix length violate the
/// one-route-per-length invariant and abort the whole operation. ECMP is
/// carried as multiple next hops on a single route, so an equal-length
/// collision is corrupt data, not multipath.
pub fn longest_match<'a>(
    table: &'a RouteTable,
    addr: IpAddr,
) -> Result<Option<&'a Route>, Error> {
    let mut best: Option<&Route> = None;

    for route in &table.routes {
        if !route.destination.contains(addr) {
            continue;
        }
        match best {
            Some(b) if route.destination.length() == b.destination.length() => {
                return Err(Error::DuplicatePrefix {
                    node: table.node.clone(),
                    prefix: route.destination,
                });
            }
            Some(b) if route.destination.length() < b.destination.length() => {}
            _ => best = Some(route),
        }
    }

    Ok(best)
}

/// The equal-cost next-hop set of a route for one address family: next
/// hops of the wrong family are dropped before minimum-metric filtering.
pub fn ecmp_nexthops(route: &Route, family: AddressFamily) -> Vec<&NextHop> {
    route
        .nexthops
        .iter()
        .filter(|nh| AddressFamily::of(nh.address) == family)
        .min_set_by_key(|nh| nh.metric)
}
