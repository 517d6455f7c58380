// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Abstract collaborators the diagnostic core reads from. The wire
//! transport and the deserialization of flooded values live behind these
//! traits. All calls are blocking; a failed database fetch is fatal to the
//! whole operation, a failed hardware query is absorbed by the caller.

use anyhow::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::time::Duration;

use crate::types::{
    AdjacencyDatabase, FibRoute, PrefixDatabase, RouteTable,
};

/// One entry of the flooded link-state database, already deserialized and
/// tagged with its record type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum FloodedRecord {
    Adjacency(AdjacencyDatabase),
    Prefix(PrefixDatabase),
}

impl FloodedRecord {
    pub fn node(&self) -> &str {
        match self {
            Self::Adjacency(db) => &db.node,
            Self::Prefix(db) => &db.node,
        }
    }
}

/// Key filter for flooded database dumps.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RecordFilter {
    Adjacency,
    Prefix,
    All,
}

impl RecordFilter {
    pub fn matches(&self, record: &FloodedRecord) -> bool {
        match (self, record) {
            (Self::All, _) => true,
            (Self::Adjacency, FloodedRecord::Adjacency(_)) => true,
            (Self::Prefix, FloodedRecord::Prefix(_)) => true,
            _ => false,
        }
    }
}

/// Read access to the computed link-state view and the flooded database.
pub trait LinkStateClient {
    /// Computed adjacency databases, keyed by node name.
    fn adjacency_dbs(&self) -> Result<BTreeMap<String, AdjacencyDatabase>>;

    /// Computed prefix databases, keyed by node name.
    fn prefix_dbs(&self) -> Result<BTreeMap<String, PrefixDatabase>>;

    /// A node's computed RIB.
    fn route_table(&self, node: &str) -> Result<RouteTable>;

    /// Flooded database entries matching the filter, keyed by flooded key.
    fn flooded_records(
        &self,
        filter: RecordFilter,
    ) -> Result<BTreeMap<String, FloodedRecord>>;
}

/// Live query against a node's hardware forwarding agent, addressed by the
/// node's loopback.
pub trait FibAgent {
    fn route_table(
        &self,
        loopback: IpAddr,
        port: u16,
        timeout: Duration,
    ) -> Result<Vec<FibRoute>>;
}
