// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv6Addr};

use crate::types::{
    AddressFamily, Prefix, Prefix6, PrefixDatabase, PrefixType,
};

/// Derivation of a loopback address from an allocated IPv6 prefix. The
/// default encodes the convention that allocated prefixes carry zeroed
/// host bits and the node answers on host address 1. Deployments with a
/// different allocation convention supply their own policy.
pub trait LoopbackPolicy {
    fn derive(&self, prefix: &Prefix6) -> Ipv6Addr;
}

/// `/128` allocations are used as-is, shorter ones get the low host bit
/// forced to 1.
#[derive(Debug, Default, Copy, Clone)]
pub struct HostBitOne;

impl LoopbackPolicy for HostBitOne {
    fn derive(&self, prefix: &Prefix6) -> Ipv6Addr {
        if prefix.length == 128 {
            prefix.value
        } else {
            Ipv6Addr::from_bits(prefix.value.to_bits() | 1)
        }
    }
}

/// Per-node view of advertised prefixes: loopbacks and allocated pool
/// prefixes. Built once from the computed prefix databases.
#[derive(Debug, Default)]
pub struct PrefixIndex {
    dbs: BTreeMap<String, PrefixDatabase>,
}

impl PrefixIndex {
    pub fn new(dbs: BTreeMap<String, PrefixDatabase>) -> Self {
        Self { dbs }
    }

    pub fn contains_node(&self, node: &str) -> bool {
        self.dbs.contains_key(node)
    }

    /// All prefixes a node advertises in the given family.
    pub fn node_prefixes(
        &self,
        node: &str,
        family: AddressFamily,
    ) -> Vec<Prefix> {
        let Some(db) = self.dbs.get(node) else {
            return Vec::new();
        };
        db.entries
            .iter()
            .map(|e| e.prefix)
            .filter(|p| p.family() == family)
            .collect()
    }

    /// Length of the longest prefix the node itself advertises that
    /// contains `addr`, or 0 when none does. Used as the local-origination
    /// depth check while tracing.
    pub fn local_match_len(&self, node: &str, addr: IpAddr) -> u8 {
        self.node_prefixes(node, AddressFamily::of(addr))
            .iter()
            .filter(|p| p.contains(addr))
            .map(|p| p.length())
            .max()
            .unwrap_or(0)
    }

    /// Resolve a node's loopback address with the default allocator
    /// policy.
    pub fn loopback(&self, node: &str) -> Option<Ipv6Addr> {
        self.loopback_with(node, &HostBitOne)
    }

    /// Resolve a node's loopback address. Allocated prefixes win over
    /// plain loopback entries; only IPv6 entries are considered.
    pub fn loopback_with(
        &self,
        node: &str,
        policy: &dyn LoopbackPolicy,
    ) -> Option<Ipv6Addr> {
        let db = self.dbs.get(node)?;

        for entry in &db.entries {
            let Prefix::V6(p6) = entry.prefix else {
                continue;
            };
            if entry.kind == PrefixType::PrefixAllocator {
                return Some(policy.derive(&p6));
            }
        }

        for entry in &db.entries {
            let Prefix::V6(p6) = entry.prefix else {
                continue;
            };
            if entry.kind == PrefixType::Loopback {
                return Some(p6.value);
            }
        }

        None
    }
}
