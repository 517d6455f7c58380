// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Diagnostic engine for a link-state routed network: equal-cost path
//! tracing with live hardware cross-checks, and consistency validation of
//! the computed link-state view against the flooded one.

pub mod error;
pub mod fib;
pub mod lookup;
pub mod prefixes;
pub mod service;
pub mod snapshot;
pub mod topology;
pub mod trace;
pub mod types;
pub mod validate;

pub use error::Error;
pub use types::*;

/// Default TCP port of the per-node hardware forwarding agent.
pub const DEFAULT_FIB_AGENT_PORT: u16 = 60100;

/// Default bound on path length during tracing.
pub const DEFAULT_MAX_HOPS: usize = 10;
