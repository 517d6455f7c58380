// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! An offline capture of both link-state views plus per-node hardware
//! tables, loadable from a JSON file. Implements the service traits so the
//! tracer and validator can run against captured state.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

use crate::service::{FibAgent, FloodedRecord, LinkStateClient, RecordFilter};
use crate::types::{
    AdjacencyDatabase, FibRoute, PrefixDatabase, RouteTable,
};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Computed adjacency databases, keyed by node name.
    pub adjacency_dbs: BTreeMap<String, AdjacencyDatabase>,

    /// Computed prefix databases, keyed by node name.
    pub prefix_dbs: BTreeMap<String, PrefixDatabase>,

    /// Computed RIBs, keyed by node name.
    pub route_tables: BTreeMap<String, RouteTable>,

    /// Flooded database entries, keyed by flooded key.
    #[serde(default)]
    pub flooded: BTreeMap<String, FloodedRecord>,

    /// Hardware forwarding tables, keyed by the loopback address the
    /// agent answers on.
    #[serde(default)]
    pub fib: BTreeMap<IpAddr, Vec<FibRoute>>,
}

impl Snapshot {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&content)?)
    }
}

impl LinkStateClient for Snapshot {
    fn adjacency_dbs(&self) -> Result<BTreeMap<String, AdjacencyDatabase>> {
        Ok(self.adjacency_dbs.clone())
    }

    fn prefix_dbs(&self) -> Result<BTreeMap<String, PrefixDatabase>> {
        Ok(self.prefix_dbs.clone())
    }

    fn route_table(&self, node: &str) -> Result<RouteTable> {
        self.route_tables
            .get(node)
            .cloned()
            .ok_or_else(|| anyhow!("no route table for node {node}"))
    }

    fn flooded_records(
        &self,
        filter: RecordFilter,
    ) -> Result<BTreeMap<String, FloodedRecord>> {
        Ok(self
            .flooded
            .iter()
            .filter(|(_, record)| filter.matches(record))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

impl FibAgent for Snapshot {
    fn route_table(
        &self,
        loopback: IpAddr,
        _port: u16,
        _timeout: Duration,
    ) -> Result<Vec<FibRoute>> {
        self.fib
            .get(&loopback)
            .cloned()
            .ok_or_else(|| anyhow!("no hardware agent at {loopback}"))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::types::{Adjacency, PrefixEntry, PrefixType};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;

    #[test]
    fn json_round_trip_through_traits() {
        let mut snap = Snapshot::default();
        snap.adjacency_dbs.insert(
            "a".to_string(),
            AdjacencyDatabase {
                node: "a".to_string(),
                adjacencies: vec![Adjacency {
                    neighbor: "b".to_string(),
                    ifname: "eth0".to_string(),
                    nexthop_v4: "10.0.0.2".parse().unwrap(),
                    nexthop_v6: "fe80::2".parse().unwrap(),
                }],
            },
        );
        snap.prefix_dbs.insert(
            "a".to_string(),
            PrefixDatabase {
                node: "a".to_string(),
                entries: BTreeSet::from([PrefixEntry {
                    prefix: "fd00::a/128".parse().unwrap(),
                    kind: PrefixType::Loopback,
                }]),
            },
        );
        snap.flooded.insert(
            "adj:a".to_string(),
            FloodedRecord::Adjacency(
                snap.adjacency_dbs.get("a").unwrap().clone(),
            ),
        );
        snap.fib.insert("fd00::a".parse().unwrap(), vec![]);

        let json = serde_json::to_string(&snap).unwrap();
        let loaded: Snapshot = serde_json::from_str(&json).unwrap();

        assert_eq!(loaded.adjacency_dbs().unwrap(), snap.adjacency_dbs);
        assert_eq!(loaded.prefix_dbs().unwrap(), snap.prefix_dbs);
        assert_eq!(
            loaded.flooded_records(RecordFilter::All).unwrap().len(),
            1
        );
        assert!(loaded
            .flooded_records(RecordFilter::Prefix)
            .unwrap()
            .is_empty());
        assert!(LinkStateClient::route_table(&loaded, "a").is_err());
        assert!(FibAgent::route_table(
            &loaded,
            "fd00::a".parse().unwrap(),
            0,
            Duration::from_secs(1)
        )
        .unwrap()
        .is_empty());
    }
}
