//! # Deterministic Topology Generation
//!
//! Single source of truth for the known network topologies and the seeded
//! generator that turns a topology name into controllers, switches, links,
//! an initial assignment, and a normalized distance matrix. The same name
//! always yields the identical network: every random choice flows from one
//! fixed-seed [`rand_chacha::ChaCha8Rng`].
//!
//! Known topologies:
//! - Atlanta (15 nodes, 22 edges, 3 controllers)
//! - ARN (30 nodes, 29 edges, 4 controllers)
//! - Germany50 (50 nodes, 88 edges, 5 controllers)
//! - Interroute (110 nodes, 159 edges, 7 controllers)
//! - Custom 9-switch test network (9 nodes, 8 edges, 3 controllers)

pub mod builder;
pub mod graph;
pub mod layout;

use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use types::CapacityVector;

pub use builder::{load, LoadedTopology};

/// Static description of a known topology.
#[derive(Debug, Clone)]
pub struct TopologySpec {
    pub key: &'static str,
    pub display_name: &'static str,
    pub nodes: usize,
    pub edges: usize,
    pub controllers: usize,
    pub capacities: &'static [CapacityVector],
}

const ATLANTA_CAPACITIES: &[CapacityVector] = &[
    CapacityVector { cpu: 2000.0, mem: 4096.0, bw: 1000.0 },
    CapacityVector { cpu: 2000.0, mem: 4096.0, bw: 1000.0 },
    CapacityVector { cpu: 2500.0, mem: 4096.0, bw: 1200.0 },
];

const ARN_CAPACITIES: &[CapacityVector] = &[
    CapacityVector { cpu: 2500.0, mem: 4096.0, bw: 1200.0 },
    CapacityVector { cpu: 2500.0, mem: 4096.0, bw: 1200.0 },
    CapacityVector { cpu: 2500.0, mem: 4096.0, bw: 1200.0 },
    CapacityVector { cpu: 3000.0, mem: 8192.0, bw: 1500.0 },
];

const GERMANY50_CAPACITIES: &[CapacityVector] = &[
    CapacityVector { cpu: 3000.0, mem: 8192.0, bw: 1500.0 },
    CapacityVector { cpu: 3000.0, mem: 8192.0, bw: 1500.0 },
    CapacityVector { cpu: 3000.0, mem: 8192.0, bw: 1500.0 },
    CapacityVector { cpu: 3500.0, mem: 8192.0, bw: 2000.0 },
    CapacityVector { cpu: 4000.0, mem: 16384.0, bw: 2000.0 },
];

const INTERROUTE_CAPACITIES: &[CapacityVector] = &[
    CapacityVector { cpu: 4000.0, mem: 16384.0, bw: 2000.0 },
    CapacityVector { cpu: 4000.0, mem: 16384.0, bw: 2000.0 },
    CapacityVector { cpu: 4000.0, mem: 16384.0, bw: 2000.0 },
    CapacityVector { cpu: 4000.0, mem: 16384.0, bw: 2000.0 },
    CapacityVector { cpu: 4000.0, mem: 16384.0, bw: 2000.0 },
    CapacityVector { cpu: 5000.0, mem: 32768.0, bw: 3000.0 },
    CapacityVector { cpu: 5000.0, mem: 32768.0, bw: 3000.0 },
];

const CUSTOM_CAPACITIES: &[CapacityVector] = &[
    CapacityVector { cpu: 100.0, mem: 4096.0, bw: 100.0 },
    CapacityVector { cpu: 100.0, mem: 4096.0, bw: 100.0 },
    CapacityVector { cpu: 100.0, mem: 4096.0, bw: 100.0 },
];

/// Catalogue of known topologies, keyed by lookup name.
pub static TOPOLOGIES: Lazy<BTreeMap<&'static str, TopologySpec>> = Lazy::new(|| {
    let mut map = BTreeMap::new();
    map.insert(
        "atlanta",
        TopologySpec {
            key: "atlanta",
            display_name: "Atlanta",
            nodes: 15,
            edges: 22,
            controllers: 3,
            capacities: ATLANTA_CAPACITIES,
        },
    );
    map.insert(
        "arn",
        TopologySpec {
            key: "arn",
            display_name: "ARN",
            nodes: 30,
            edges: 29,
            controllers: 4,
            capacities: ARN_CAPACITIES,
        },
    );
    map.insert(
        "germany50",
        TopologySpec {
            key: "germany50",
            display_name: "Germany50",
            nodes: 50,
            edges: 88,
            controllers: 5,
            capacities: GERMANY50_CAPACITIES,
        },
    );
    map.insert(
        "interroute",
        TopologySpec {
            key: "interroute",
            display_name: "Interroute",
            nodes: 110,
            edges: 159,
            controllers: 7,
            capacities: INTERROUTE_CAPACITIES,
        },
    );
    map.insert(
        "custom",
        TopologySpec {
            key: "custom",
            display_name: "Custom 9-Switch",
            nodes: 9,
            edges: 8,
            controllers: 3,
            capacities: CUSTOM_CAPACITIES,
        },
    );
    map
});

/// Look up a topology spec; unknown names fall back to `atlanta`.
pub fn spec_for(name: &str) -> &'static TopologySpec {
    TOPOLOGIES
        .get(name)
        .unwrap_or_else(|| &TOPOLOGIES["atlanta"])
}

/// Whether `name` identifies a known topology.
pub fn is_known(name: &str) -> bool {
    TOPOLOGIES.contains_key(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogue_is_consistent() {
        for spec in TOPOLOGIES.values() {
            assert_eq!(spec.capacities.len(), spec.controllers);
            // A connected graph needs at least nodes - 1 edges
            assert!(spec.edges >= spec.nodes - 1);
            for cap in spec.capacities {
                assert!(cap.cpu > 0.0 && cap.mem > 0.0 && cap.bw > 0.0);
            }
        }
    }

    #[test]
    fn unknown_name_falls_back_to_atlanta() {
        assert_eq!(spec_for("nonexistent").key, "atlanta");
        assert_eq!(spec_for("interroute").key, "interroute");
    }
}
