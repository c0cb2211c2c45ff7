//! In-memory state store
//!
//! Registry of controllers and switches plus the secondary indexes the
//! engine needs: dpid resolution, per-controller domains, the normalized
//! distance matrix, capped migration history, and the bounded snapshot
//! ring. The store has no interior locking; the engine's mutex serializes
//! every access, and [`CoreState::reassign`] is the only place ownership
//! changes.

use ringbuffer::{AllocRingBuffer, RingBuffer};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use config::balancing::{HISTORY_CAP, TIMESERIES_CAPACITY};
use topology::LoadedTopology;
use types::{Controller, LoadSnapshot, MigrationRecord, Switch};

use crate::load_model;

pub struct CoreState {
    pub topology_key: String,
    pub topology_name: String,

    /// BTreeMaps so every iteration is in id order; the planner's
    /// deterministic tie-break depends on this.
    pub controllers: BTreeMap<String, Controller>,
    pub switches: BTreeMap<String, Switch>,

    dpid_index: HashMap<u64, String>,
    domains: HashMap<String, BTreeSet<String>>,
    distances: HashMap<String, HashMap<String, f64>>,

    /// Infrastructure edges between switch ids.
    pub links: Vec<(String, String)>,

    history: VecDeque<MigrationRecord>,
    series: AllocRingBuffer<LoadSnapshot>,

    /// Telemetry entries dropped because the reporting controller no longer
    /// owns the switch.
    pub stale_drops: u64,
    /// Telemetry entries (or whole reports) that referenced an unknown
    /// controller or dpid.
    pub unknown_drops: u64,
}

impl CoreState {
    pub fn from_topology(topo: LoadedTopology) -> Self {
        let mut controllers = BTreeMap::new();
        for ctrl in topo.controllers {
            controllers.insert(ctrl.id.clone(), ctrl);
        }

        let mut switches = BTreeMap::new();
        let mut dpid_index = HashMap::new();
        let mut domains: HashMap<String, BTreeSet<String>> = HashMap::new();
        for id in controllers.keys() {
            domains.insert(id.clone(), BTreeSet::new());
        }
        for sw in topo.switches {
            dpid_index.insert(sw.dpid, sw.id.clone());
            domains
                .entry(sw.controller_id.clone())
                .or_default()
                .insert(sw.id.clone());
            switches.insert(sw.id.clone(), sw);
        }

        Self {
            topology_key: topo.key,
            topology_name: topo.display_name,
            controllers,
            switches,
            dpid_index,
            domains,
            distances: topo.distances,
            links: topo.links,
            history: VecDeque::new(),
            series: AllocRingBuffer::new(TIMESERIES_CAPACITY),
            stale_drops: 0,
            unknown_drops: 0,
        }
    }

    pub fn switch_id_for_dpid(&self, dpid: u64) -> Option<&String> {
        self.dpid_index.get(&dpid)
    }

    /// Switch ids owned by a controller, in id order.
    pub fn domain(&self, controller_id: &str) -> Option<&BTreeSet<String>> {
        self.domains.get(controller_id)
    }

    pub fn domain_size(&self, controller_id: &str) -> usize {
        self.domains.get(controller_id).map_or(0, |d| d.len())
    }

    /// Normalized distance from a switch to a controller.
    pub fn distance(&self, switch_id: &str, controller_id: &str) -> f64 {
        self.distances
            .get(switch_id)
            .and_then(|row| row.get(controller_id))
            .copied()
            .unwrap_or(1.0)
    }

    /// Transfer ownership of a switch and recompute both involved
    /// controllers. Returns false (and changes nothing) if the switch or
    /// target is unknown or the switch already belongs to the target.
    pub fn reassign(&mut self, switch_id: &str, target_id: &str) -> bool {
        if !self.controllers.contains_key(target_id) {
            return false;
        }
        let source_id = match self.switches.get(switch_id) {
            Some(sw) if sw.controller_id != target_id => sw.controller_id.clone(),
            _ => return false,
        };

        if let Some(domain) = self.domains.get_mut(&source_id) {
            domain.remove(switch_id);
        }
        self.domains
            .entry(target_id.to_string())
            .or_default()
            .insert(switch_id.to_string());
        if let Some(sw) = self.switches.get_mut(switch_id) {
            sw.controller_id = target_id.to_string();
        }

        load_model::recompute_controller(self, &source_id);
        load_model::recompute_controller(self, target_id);
        true
    }

    /// Append a migration record, dropping the oldest past the cap.
    pub fn record_migration(&mut self, record: MigrationRecord) {
        if self.history.len() >= HISTORY_CAP {
            self.history.pop_front();
        }
        self.history.push_back(record);
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn history_iter(&self) -> impl Iterator<Item = &MigrationRecord> {
        self.history.iter()
    }

    /// Up to the last `limit` records, oldest first.
    pub fn history_tail(&self, limit: usize) -> Vec<MigrationRecord> {
        let skip = self.history.len().saturating_sub(limit);
        self.history.iter().skip(skip).cloned().collect()
    }

    pub fn push_snapshot(&mut self, snapshot: LoadSnapshot) {
        self.series.enqueue(snapshot);
    }

    pub fn latest_snapshot(&self) -> Option<LoadSnapshot> {
        self.series.iter().last().cloned()
    }

    /// Up to the last `limit` snapshots, oldest first.
    pub fn snapshots_tail(&self, limit: usize) -> Vec<LoadSnapshot> {
        let len = self.series.len();
        let skip = len.saturating_sub(limit);
        self.series.iter().skip(skip).cloned().collect()
    }

    pub fn snapshots_len(&self) -> usize {
        self.series.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> CoreState {
        CoreState::from_topology(topology::load("custom"))
    }

    #[test]
    fn indexes_are_consistent_after_load() {
        let state = state();
        assert_eq!(state.switches.len(), 9);
        assert_eq!(state.controllers.len(), 3);

        // dpid index covers every switch
        for sw in state.switches.values() {
            assert_eq!(state.switch_id_for_dpid(sw.dpid), Some(&sw.id));
        }

        // Domains partition the switch set
        let total: usize = state
            .controllers
            .keys()
            .map(|id| state.domain_size(id))
            .sum();
        assert_eq!(total, state.switches.len());
    }

    #[test]
    fn reassign_moves_domain_membership() {
        let mut state = state();
        let (switch_id, old_owner) = {
            let sw = state.switches.values().next().unwrap();
            (sw.id.clone(), sw.controller_id.clone())
        };
        let new_owner = state
            .controllers
            .keys()
            .find(|id| **id != old_owner)
            .unwrap()
            .clone();

        let before_old = state.domain_size(&old_owner);
        let before_new = state.domain_size(&new_owner);

        assert!(state.reassign(&switch_id, &new_owner));

        assert_eq!(state.switches[&switch_id].controller_id, new_owner);
        assert_eq!(state.domain_size(&old_owner), before_old - 1);
        assert_eq!(state.domain_size(&new_owner), before_new + 1);
        assert!(!state.domain(&old_owner).unwrap().contains(&switch_id));
        assert!(state.domain(&new_owner).unwrap().contains(&switch_id));
    }

    #[test]
    fn reassign_rejects_unknown_target_and_noop_moves() {
        let mut state = state();
        let (switch_id, owner) = {
            let sw = state.switches.values().next().unwrap();
            (sw.id.clone(), sw.controller_id.clone())
        };
        assert!(!state.reassign(&switch_id, "c99"));
        assert!(!state.reassign(&switch_id, &owner));
        assert!(!state.reassign("s99", "c1"));
    }

    #[test]
    fn snapshot_ring_is_bounded() {
        let mut state = state();
        for i in 0..(TIMESERIES_CAPACITY + 40) {
            state.push_snapshot(LoadSnapshot {
                timestamp: chrono::Utc::now(),
                controllers: Vec::new(),
                average_load: i as f64,
                global_imbalance: 0.0,
            });
        }
        assert_eq!(state.snapshots_len(), TIMESERIES_CAPACITY);

        // Oldest entries were evicted, newest retained
        let tail = state.snapshots_tail(1);
        assert_eq!(tail[0].average_load, (TIMESERIES_CAPACITY + 39) as f64);
    }
}
