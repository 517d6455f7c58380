// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cross-validation of the computed link-state view against the flooded
//! one. Divergence is the validator's normal output, returned as data;
//! only a failed database fetch is an error.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::Error;
use crate::service::{FloodedRecord, LinkStateClient, RecordFilter};
use crate::types::{
    Adjacency, AdjacencyDatabase, PrefixDatabase, PrefixEntry,
};

/// An adjacency present in both views but with differing link state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AdjacencyChange {
    pub computed: Adjacency,
    pub flooded: Adjacency,
}

/// Structural delta between one node's computed and flooded adjacency
/// lists, keyed by (neighbor, interface).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AdjacencyDelta {
    pub node: String,
    pub only_computed: Vec<Adjacency>,
    pub only_flooded: Vec<Adjacency>,
    pub changed: Vec<AdjacencyChange>,
}

impl AdjacencyDelta {
    pub fn is_empty(&self) -> bool {
        self.only_computed.is_empty()
            && self.only_flooded.is_empty()
            && self.changed.is_empty()
    }
}

/// Symmetric difference of one node's prefix entries across the views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PrefixDelta {
    pub node: String,
    pub only_computed: Vec<PrefixEntry>,
    pub only_flooded: Vec<PrefixEntry>,
}

impl PrefixDelta {
    pub fn is_empty(&self) -> bool {
        self.only_computed.is_empty() && self.only_flooded.is_empty()
    }
}

/// Symmetric difference between the node sets of the two views for one
/// database type.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema,
)]
pub struct NodeSetDiff {
    pub only_computed: Vec<String>,
    pub only_flooded: Vec<String>,
}

impl NodeSetDiff {
    pub fn is_empty(&self) -> bool {
        self.only_computed.is_empty() && self.only_flooded.is_empty()
    }

    fn between(
        computed: &BTreeSet<String>,
        flooded: &BTreeSet<String>,
    ) -> Self {
        Self {
            only_computed: computed.difference(flooded).cloned().collect(),
            only_flooded: flooded.difference(computed).cloned().collect(),
        }
    }
}

#[derive(
    Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema,
)]
pub struct ValidationReport {
    /// Flooded adjacency records whose owner is absent from the computed
    /// view.
    pub missing_adjacency_nodes: Vec<String>,
    pub adjacency_deltas: Vec<AdjacencyDelta>,

    /// Flooded prefix records whose owner is absent from the computed
    /// view.
    pub missing_prefix_nodes: Vec<String>,
    pub prefix_deltas: Vec<PrefixDelta>,

    pub adjacency_nodes: NodeSetDiff,
    pub prefix_nodes: NodeSetDiff,
}

impl ValidationReport {
    /// The adjacency databases of both views agree.
    pub fn adjacency_passed(&self) -> bool {
        self.missing_adjacency_nodes.is_empty()
            && self.adjacency_deltas.is_empty()
            && self.adjacency_nodes.is_empty()
    }

    /// The prefix databases of both views agree.
    pub fn prefix_passed(&self) -> bool {
        self.missing_prefix_nodes.is_empty()
            && self.prefix_deltas.is_empty()
            && self.prefix_nodes.is_empty()
    }

    pub fn passed(&self) -> bool {
        self.adjacency_passed() && self.prefix_passed()
    }
}

/// Fetch both views through the service client and validate them.
pub fn run<C: LinkStateClient>(client: &C) -> Result<ValidationReport, Error> {
    let computed_adj = client.adjacency_dbs()?;
    let computed_prefix = client.prefix_dbs()?;
    let flooded = client.flooded_records(RecordFilter::All)?;
    Ok(validate(&computed_adj, &computed_prefix, &flooded))
}

/// Diff the computed adjacency/prefix databases against the flooded ones.
pub fn validate(
    computed_adj: &BTreeMap<String, AdjacencyDatabase>,
    computed_prefix: &BTreeMap<String, PrefixDatabase>,
    flooded: &BTreeMap<String, FloodedRecord>,
) -> ValidationReport {
    let mut report = ValidationReport::default();
    let mut flooded_adj_nodes = BTreeSet::new();
    let mut flooded_prefix_nodes = BTreeSet::new();

    for record in flooded.values() {
        match record {
            FloodedRecord::Adjacency(flooded_db) => {
                flooded_adj_nodes.insert(flooded_db.node.clone());
                match computed_adj.get(&flooded_db.node) {
                    None => report
                        .missing_adjacency_nodes
                        .push(flooded_db.node.clone()),
                    Some(computed_db) => {
                        let delta = adjacency_delta(computed_db, flooded_db);
                        if !delta.is_empty() {
                            report.adjacency_deltas.push(delta);
                        }
                    }
                }
            }
            FloodedRecord::Prefix(flooded_db) => {
                flooded_prefix_nodes.insert(flooded_db.node.clone());
                match computed_prefix.get(&flooded_db.node) {
                    None => report
                        .missing_prefix_nodes
                        .push(flooded_db.node.clone()),
                    Some(computed_db) => {
                        let delta = prefix_delta(computed_db, flooded_db);
                        if !delta.is_empty() {
                            report.prefix_deltas.push(delta);
                        }
                    }
                }
            }
        }
    }

    // Nodes carrying no adjacencies have nothing to flood.
    let computed_adj_nodes: BTreeSet<String> = computed_adj
        .values()
        .filter(|db| !db.adjacencies.is_empty())
        .map(|db| db.node.clone())
        .collect();
    let computed_prefix_nodes: BTreeSet<String> =
        computed_prefix.keys().cloned().collect();

    report.adjacency_nodes =
        NodeSetDiff::between(&computed_adj_nodes, &flooded_adj_nodes);
    report.prefix_nodes =
        NodeSetDiff::between(&computed_prefix_nodes, &flooded_prefix_nodes);

    report
}

fn adjacency_delta(
    computed: &AdjacencyDatabase,
    flooded: &AdjacencyDatabase,
) -> AdjacencyDelta {
    let computed_by_link: BTreeMap<(String, String), &Adjacency> = computed
        .adjacencies
        .iter()
        .map(|a| ((a.neighbor.clone(), a.ifname.clone()), a))
        .collect();
    let flooded_by_link: BTreeMap<(String, String), &Adjacency> = flooded
        .adjacencies
        .iter()
        .map(|a| ((a.neighbor.clone(), a.ifname.clone()), a))
        .collect();

    let mut delta = AdjacencyDelta {
        node: computed.node.clone(),
        only_computed: Vec::new(),
        only_flooded: Vec::new(),
        changed: Vec::new(),
    };

    for (link, c) in &computed_by_link {
        match flooded_by_link.get(link) {
            None => delta.only_computed.push((*c).clone()),
            Some(f) if f != c => delta.changed.push(AdjacencyChange {
                computed: (*c).clone(),
                flooded: (*f).clone(),
            }),
            Some(_) => {}
        }
    }
    for (link, f) in &flooded_by_link {
        if !computed_by_link.contains_key(link) {
            delta.only_flooded.push((*f).clone());
        }
    }

    delta
}

fn prefix_delta(
    computed: &PrefixDatabase,
    flooded: &PrefixDatabase,
) -> PrefixDelta {
    PrefixDelta {
        node: computed.node.clone(),
        only_computed: computed
            .entries
            .difference(&flooded.entries)
            .cloned()
            .collect(),
        only_flooded: flooded
            .entries
            .difference(&computed.entries)
            .cloned()
            .collect(),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::types::{Prefix, PrefixType};
    use pretty_assertions::assert_eq;

    fn adjacency(neighbor: &str, ifname: &str, v6: &str) -> Adjacency {
        Adjacency {
            neighbor: neighbor.to_string(),
            ifname: ifname.to_string(),
            nexthop_v4: "0.0.0.0".parse().unwrap(),
            nexthop_v6: v6.parse().unwrap(),
        }
    }

    fn adj_db(node: &str, adjacencies: Vec<Adjacency>) -> AdjacencyDatabase {
        AdjacencyDatabase {
            node: node.to_string(),
            adjacencies,
        }
    }

    fn prefix_db(node: &str, prefixes: Vec<(&str, PrefixType)>) -> PrefixDatabase {
        PrefixDatabase {
            node: node.to_string(),
            entries: prefixes
                .into_iter()
                .map(|(p, kind)| PrefixEntry {
                    prefix: p.parse::<Prefix>().unwrap(),
                    kind,
                })
                .collect(),
        }
    }

    fn consistent_views() -> (
        BTreeMap<String, AdjacencyDatabase>,
        BTreeMap<String, PrefixDatabase>,
        BTreeMap<String, FloodedRecord>,
    ) {
        let a_adj = adj_db("a", vec![adjacency("b", "eth0", "fe80::b")]);
        let b_adj = adj_db("b", vec![adjacency("a", "eth0", "fe80::a")]);
        let a_prefix = prefix_db(
            "a",
            vec![("fd00::a/128", PrefixType::PrefixAllocator)],
        );
        let b_prefix = prefix_db(
            "b",
            vec![("fd00::b/128", PrefixType::PrefixAllocator)],
        );

        let computed_adj = BTreeMap::from([
            ("a".to_string(), a_adj.clone()),
            ("b".to_string(), b_adj.clone()),
        ]);
        let computed_prefix = BTreeMap::from([
            ("a".to_string(), a_prefix.clone()),
            ("b".to_string(), b_prefix.clone()),
        ]);
        let flooded = BTreeMap::from([
            ("adj:a".to_string(), FloodedRecord::Adjacency(a_adj)),
            ("adj:b".to_string(), FloodedRecord::Adjacency(b_adj)),
            ("prefix:a".to_string(), FloodedRecord::Prefix(a_prefix)),
            ("prefix:b".to_string(), FloodedRecord::Prefix(b_prefix)),
        ]);
        (computed_adj, computed_prefix, flooded)
    }

    #[test]
    fn consistent_views_pass() {
        let (adj, prefix, flooded) = consistent_views();
        let report = validate(&adj, &prefix, &flooded);
        assert!(report.passed());
        assert_eq!(report, ValidationReport::default());
    }

    #[test]
    fn flooded_node_missing_from_computed() {
        let (adj, prefix, mut flooded) = consistent_views();
        flooded.insert(
            "adj:c".to_string(),
            FloodedRecord::Adjacency(adj_db(
                "c",
                vec![adjacency("a", "eth0", "fe80::a")],
            )),
        );

        let report = validate(&adj, &prefix, &flooded);
        assert!(!report.passed());
        assert_eq!(report.missing_adjacency_nodes, vec!["c".to_string()]);
        // c also shows up in the adjacency node-set diff
        assert_eq!(report.adjacency_nodes.only_flooded, vec!["c".to_string()]);
    }

    #[test]
    fn pass_status_is_per_database_type() {
        let (adj, prefix, mut flooded) = consistent_views();
        flooded.insert(
            "adj:c".to_string(),
            FloodedRecord::Adjacency(adj_db(
                "c",
                vec![adjacency("a", "eth0", "fe80::a")],
            )),
        );

        // only the adjacency dbs diverge
        let report = validate(&adj, &prefix, &flooded);
        assert!(!report.adjacency_passed());
        assert!(report.prefix_passed());
        assert!(!report.passed());
    }

    #[test]
    fn adjacency_out_of_sync() {
        let (mut adj, prefix, flooded) = consistent_views();
        // computed view carries an extra link and a changed next hop
        let db = adj.get_mut("a").unwrap();
        db.adjacencies[0].nexthop_v6 = "fe80::beef".parse().unwrap();
        db.adjacencies.push(adjacency("c", "eth1", "fe80::c"));

        let report = validate(&adj, &prefix, &flooded);
        assert!(!report.passed());
        assert_eq!(report.adjacency_deltas.len(), 1);

        let delta = &report.adjacency_deltas[0];
        assert_eq!(delta.node, "a");
        assert_eq!(delta.only_computed.len(), 1);
        assert_eq!(delta.only_computed[0].neighbor, "c");
        assert!(delta.only_flooded.is_empty());
        assert_eq!(delta.changed.len(), 1);
        assert_eq!(
            delta.changed[0].flooded.nexthop_v6,
            "fe80::b".parse::<std::net::Ipv6Addr>().unwrap()
        );
    }

    #[test]
    fn prefix_out_of_sync() {
        let (adj, mut prefix, flooded) = consistent_views();
        prefix.get_mut("b").unwrap().entries.insert(PrefixEntry {
            prefix: "2001:db8::/64".parse().unwrap(),
            kind: PrefixType::Static,
        });

        let report = validate(&adj, &prefix, &flooded);
        assert!(!report.passed());
        assert_eq!(report.prefix_deltas.len(), 1);
        assert_eq!(report.prefix_deltas[0].node, "b");
        assert_eq!(report.prefix_deltas[0].only_computed.len(), 1);
        assert!(report.prefix_deltas[0].only_flooded.is_empty());
    }

    #[test]
    fn node_set_discrepancy() {
        let (mut adj, prefix, flooded) = consistent_views();
        adj.insert(
            "d".to_string(),
            adj_db("d", vec![adjacency("a", "eth0", "fe80::a")]),
        );
        // nodes with zero adjacencies are not expected to flood
        adj.insert("e".to_string(), adj_db("e", vec![]));

        let report = validate(&adj, &prefix, &flooded);
        assert!(!report.passed());
        assert_eq!(report.adjacency_nodes.only_computed, vec!["d".to_string()]);
        assert!(report.adjacency_nodes.only_flooded.is_empty());
        assert!(report.prefix_nodes.is_empty());
    }

    #[test]
    fn reporting_is_symmetric() {
        // swapping the sources swaps the delta sides, not their content
        let (adj, prefix, _) = consistent_views();
        let mut other_adj = adj.clone();
        other_adj.get_mut("a").unwrap().adjacencies[0].nexthop_v6 =
            "fe80::beef".parse().unwrap();

        let flooded_from = |dbs: &BTreeMap<String, AdjacencyDatabase>| {
            dbs.iter()
                .map(|(node, db)| {
                    (
                        format!("adj:{node}"),
                        FloodedRecord::Adjacency(db.clone()),
                    )
                })
                .collect::<BTreeMap<_, _>>()
        };

        let fwd = validate(&adj, &prefix, &flooded_from(&other_adj));
        let rev = validate(&other_adj, &prefix, &flooded_from(&adj));

        assert_eq!(fwd.adjacency_deltas.len(), 1);
        assert_eq!(rev.adjacency_deltas.len(), 1);
        assert_eq!(
            fwd.adjacency_deltas[0].changed[0].computed,
            rev.adjacency_deltas[0].changed[0].flooded
        );
        assert_eq!(
            fwd.adjacency_deltas[0].changed[0].flooded,
            rev.adjacency_deltas[0].changed[0].computed
        );
    }
}
