// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::types::Prefix;
use std::net::IpAddr;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Two routes on one node match a destination at the same maximal
    /// prefix length. This is a data-integrity failure, never resolved
    /// silently.
    #[error("duplicate prefix {prefix} in route table of node {node}")]
    DuplicatePrefix { node: String, prefix: Prefix },

    #[error("{0} is not a known node name, address or prefix")]
    Destination(String),

    #[error("no loopback address found for node {0}")]
    NoLoopback(String),

    /// A computed route points at a next hop with no corresponding
    /// adjacency.
    #[error("no adjacency on node {node} over {ifname} to {nexthop}")]
    UnknownNeighbor {
        node: String,
        ifname: String,
        nexthop: IpAddr,
    },

    #[error("service error {0}")]
    Service(#[from] anyhow::Error),
}
