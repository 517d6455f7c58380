// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::{BTreeMap, HashMap};
use std::net::IpAddr;

use crate::types::AdjacencyDatabase;

/// Lookup from (node, outgoing interface, next-hop address) to the
/// neighboring node name. Built once from the adjacency databases,
/// read-only while tracing.
#[derive(Debug, Default)]
pub struct TopologyIndex {
    index: HashMap<(String, String, IpAddr), String>,
}

impl TopologyIndex {
    pub fn from_adjacency_dbs(
        dbs: &BTreeMap<String, AdjacencyDatabase>,
    ) -> Self {
        let mut index = HashMap::new();
        for db in dbs.values() {
            for adj in &db.adjacencies {
                // A link is reachable by either next-hop family.
                index.insert(
                    (
                        db.node.clone(),
                        adj.ifname.clone(),
                        IpAddr::V4(adj.nexthop_v4),
                    ),
                    adj.neighbor.clone(),
                );
                index.insert(
                    (
                        db.node.clone(),
                        adj.ifname.clone(),
                        IpAddr::V6(adj.nexthop_v6),
                    ),
                    adj.neighbor.clone(),
                );
            }
        }
        Self { index }
    }

    pub fn neighbor(
        &self,
        node: &str,
        ifname: &str,
        nexthop: IpAddr,
    ) -> Option<&str> {
        self.index
            .get(&(node.to_string(), ifname.to_string(), nexthop))
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
