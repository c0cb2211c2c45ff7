//! Topology assembly
//!
//! Turns a catalogue entry into entity-ready controllers and switches:
//! generate the graph, lay it out, place controllers on the highest-degree
//! sites, assign every switch to its nearest controller, and precompute the
//! normalized switch-to-controller distance matrix.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;

use config::balancing::{
    DISTANCE_NORMALIZER, GENERATOR_SEED, LAYOUT_X_MAX, LAYOUT_X_MIN, LAYOUT_Y_MAX, LAYOUT_Y_MIN,
};
use types::{Controller, Switch};

use crate::{graph, layout, spec_for};

/// Everything the state store needs to initialize from a topology name.
#[derive(Debug, Clone)]
pub struct LoadedTopology {
    pub key: String,
    pub display_name: String,
    pub controllers: Vec<Controller>,
    pub switches: Vec<Switch>,
    /// Infrastructure edges between switch ids.
    pub links: Vec<(String, String)>,
    /// `distances[switch_id][controller_id]`, normalized into [0,1].
    pub distances: HashMap<String, HashMap<String, f64>>,
}

/// Build the named topology. Unknown names fall back to the default; the
/// same name always produces the identical network.
pub fn load(name: &str) -> LoadedTopology {
    let spec = spec_for(name);
    let mut rng = ChaCha8Rng::seed_from_u64(GENERATOR_SEED);

    let edges = graph::generate(spec.nodes, spec.edges, &mut rng);
    let raw_positions = layout::spring_layout(spec.nodes, &edges, &mut rng);
    let positions = layout::scale_positions(
        &raw_positions,
        LAYOUT_X_MIN,
        LAYOUT_X_MAX,
        LAYOUT_Y_MIN,
        LAYOUT_Y_MAX,
    );

    // Controller sites: highest-degree nodes, ties by node index
    let degrees = graph::degrees(spec.nodes, &edges);
    let mut by_degree: Vec<usize> = (0..spec.nodes).collect();
    by_degree.sort_by(|&a, &b| degrees[b].cmp(&degrees[a]).then(a.cmp(&b)));
    let sites = &by_degree[..spec.controllers];

    let controllers: Vec<Controller> = sites
        .iter()
        .enumerate()
        .map(|(i, &node)| {
            let (x, y) = positions[node];
            Controller::new(format!("c{}", i + 1), spec.capacities[i], x, y)
        })
        .collect();

    // Every node is exposed as a switch, controller sites included
    let mut switches: Vec<Switch> = Vec::with_capacity(spec.nodes);
    for node in 0..spec.nodes {
        let (x, y) = positions[node];
        let owner = nearest_controller(&controllers, x, y);
        switches.push(Switch::new(
            format!("s{}", node + 1),
            (node + 1) as u64,
            owner,
            x,
            y,
        ));
    }

    let links = edges
        .iter()
        .map(|&(u, v)| (format!("s{}", u + 1), format!("s{}", v + 1)))
        .collect();

    let mut distances: HashMap<String, HashMap<String, f64>> = HashMap::new();
    for sw in &switches {
        let row = distances.entry(sw.id.clone()).or_default();
        for ctrl in &controllers {
            row.insert(ctrl.id.clone(), normalized_distance(sw, ctrl));
        }
    }

    LoadedTopology {
        key: spec.key.to_string(),
        display_name: spec.display_name.to_string(),
        controllers,
        switches,
        links,
        distances,
    }
}

/// Nearest controller by Euclidean distance; ties go to the
/// lexicographically smaller controller id.
fn nearest_controller(controllers: &[Controller], x: f64, y: f64) -> String {
    let mut sorted: Vec<&Controller> = controllers.iter().collect();
    sorted.sort_by(|a, b| a.id.cmp(&b.id));

    let mut best: Option<(&Controller, f64)> = None;
    for ctrl in sorted {
        let dx = x - ctrl.x;
        let dy = y - ctrl.y;
        let dist = (dx * dx + dy * dy).sqrt();
        match best {
            Some((_, best_dist)) if dist >= best_dist => {}
            _ => best = Some((ctrl, dist)),
        }
    }
    best.map(|(c, _)| c.id.clone()).unwrap_or_default()
}

fn normalized_distance(sw: &Switch, ctrl: &Controller) -> f64 {
    let dx = sw.x - ctrl.x;
    let dy = sw.y - ctrl.y;
    ((dx * dx + dy * dy).sqrt() / DISTANCE_NORMALIZER).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atlanta_counts_match_catalogue() {
        let topo = load("atlanta");
        assert_eq!(topo.controllers.len(), 3);
        assert_eq!(topo.switches.len(), 15);
        assert_eq!(topo.links.len(), 22);
    }

    #[test]
    fn interroute_counts_match_catalogue() {
        let topo = load("interroute");
        assert_eq!(topo.controllers.len(), 7);
        assert_eq!(topo.switches.len(), 110);
        assert_eq!(topo.links.len(), 159);
    }

    #[test]
    fn loading_is_deterministic() {
        let a = load("atlanta");
        let b = load("atlanta");

        let ids_a: Vec<_> = a.controllers.iter().map(|c| (&c.id, c.x, c.y)).collect();
        let ids_b: Vec<_> = b.controllers.iter().map(|c| (&c.id, c.x, c.y)).collect();
        assert_eq!(ids_a, ids_b);

        let assign_a: Vec<_> = a.switches.iter().map(|s| (&s.id, &s.controller_id)).collect();
        let assign_b: Vec<_> = b.switches.iter().map(|s| (&s.id, &s.controller_id)).collect();
        assert_eq!(assign_a, assign_b);

        assert_eq!(a.links, b.links);
        assert_eq!(a.distances, b.distances);
    }

    #[test]
    fn every_switch_assigned_to_nearest_controller() {
        let topo = load("germany50");
        for sw in &topo.switches {
            let assigned = topo
                .controllers
                .iter()
                .find(|c| c.id == sw.controller_id)
                .expect("owner exists");
            let assigned_dist =
                ((sw.x - assigned.x).powi(2) + (sw.y - assigned.y).powi(2)).sqrt();
            for ctrl in &topo.controllers {
                let dist = ((sw.x - ctrl.x).powi(2) + (sw.y - ctrl.y).powi(2)).sqrt();
                assert!(assigned_dist <= dist + 1e-9);
            }
        }
    }

    #[test]
    fn distances_are_normalized() {
        let topo = load("arn");
        for row in topo.distances.values() {
            for &d in row.values() {
                assert!((0.0..=1.0).contains(&d));
            }
        }
    }

    #[test]
    fn switch_positions_fall_inside_layout_rectangle() {
        let topo = load("custom");
        for sw in &topo.switches {
            assert!((100.0..=900.0).contains(&sw.x));
            assert!((100.0..=500.0).contains(&sw.y));
        }
    }

    #[test]
    fn unknown_topology_falls_back_to_default() {
        let topo = load("definitely-not-a-topology");
        assert_eq!(topo.key, "atlanta");
        assert_eq!(topo.controllers.len(), 3);
    }
}
