//! # Load-Balancing Engine - Coordination and Decision Hub
//!
//! ## Purpose
//!
//! Central orchestration engine that owns the state store, consumes
//! telemetry (live or simulated), classifies controller saturation,
//! selects at most one switch migration per tick, drives the external
//! actuator, and publishes snapshots on the push channel.
//!
//! ## Architecture Role
//!
//! ```text
//! Telemetry Ingest ──► [State Store] ──► Load Model ──► Migration Planner
//!        ▲                  │                                 │
//!   REST boundary           │ snapshot                        ▼
//!        │                  ▼                            Actuator call
//!   WebSocket push ◄── Control Loop ◄─────────────────── commit + record
//! ```
//!
//! One process-wide mutex guards the store. Each tick holds it for the
//! simulate/recompute/plan phase, releases it across the (blocking,
//! bounded) actuator invocation, then re-acquires it to validate and
//! commit the decision. The broadcast send happens entirely outside the
//! lock so a slow WebSocket consumer can never stall the loop.

use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use config::balancing::{ACTUATOR_TIMEOUT_SECS, SPEED_MAX, SPEED_MIN, TIMESERIES_CAPACITY};
use config::ServiceConfig;
use types::{
    ComparisonView, ControllerLoad, ControllerView, IngestOutcome, LinkView, LoadSnapshot,
    MigrationPlan, MigrationRecord, PushMessage, StateUpdate, SummaryView, SwitchView,
    TelemetryReport, TopologyNode, TopologyView, TrafficSummary,
};

use crate::actuator::MigrationActuator;
use crate::error::{BalancerError, Result};
use crate::simulator::{TrafficPattern, TrafficSimulator};
use crate::state::CoreState;
use crate::{load_model, planner, telemetry};

/// Everything guarded by the engine lock.
struct Core {
    state: CoreState,
    simulator: Option<TrafficSimulator>,
    simulator_seed: u64,
    auto_migration: bool,
    speed: f64,
}

/// The single owning object of the balancing core. Shared across the
/// control loop and every REST/WebSocket handler via `Arc`.
pub struct Engine {
    core: Mutex<Core>,
    actuator: Arc<dyn MigrationActuator>,
    updates: broadcast::Sender<StateUpdate>,
}

impl Engine {
    pub fn new(config: &ServiceConfig, actuator: Arc<dyn MigrationActuator>) -> Self {
        let topo = topology::load(&config.topology);
        info!(
            topology = %topo.display_name,
            controllers = topo.controllers.len(),
            switches = topo.switches.len(),
            "engine initialized"
        );

        let simulator = if config.simulator.enabled {
            let pattern = TrafficPattern::parse(&config.simulator.pattern).unwrap_or_else(|| {
                warn!(
                    pattern = %config.simulator.pattern,
                    "unknown traffic pattern in configuration, using wave"
                );
                TrafficPattern::Wave
            });
            Some(TrafficSimulator::new(
                pattern,
                config.simulator.intensity,
                config.simulator.seed,
            ))
        } else {
            None
        };

        let (updates, _) = broadcast::channel(64);

        Self {
            core: Mutex::new(Core {
                state: CoreState::from_topology(topo),
                simulator,
                simulator_seed: config.simulator.seed,
                auto_migration: config.auto_migration,
                speed: config.speed.clamp(SPEED_MIN, SPEED_MAX),
            }),
            actuator,
            updates,
        }
    }

    /// Receiver for per-tick state updates.
    pub fn subscribe(&self) -> broadcast::Receiver<StateUpdate> {
        self.updates.subscribe()
    }

    /// Sleep time between ticks: `1 / speed`, so always within [0.1s, 10s].
    pub fn polling_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.core.lock().speed)
    }

    pub fn auto_migration(&self) -> bool {
        self.core.lock().auto_migration
    }

    /// One control-loop tick: simulate, recompute, plan, actuate, commit,
    /// snapshot, publish. Returns the published update.
    pub async fn tick(&self) -> Result<StateUpdate> {
        // Phase 1 (locked): advance traffic, recompute levels, plan
        let (plan, level_changes) = {
            let mut core = self.core.lock();
            let core = &mut *core;
            if let Some(sim) = core.simulator.as_mut() {
                sim.advance(&mut core.state);
            }
            let changes = load_model::recompute_all(&mut core.state);
            let plan = if core.auto_migration {
                planner::plan(&core.state)
            } else {
                None
            };
            (plan, changes)
        };

        // Phase 2 (unlocked): drive the external actuator
        let migration = match plan {
            Some(plan) => self.execute(plan).await,
            None => None,
        };

        // Phase 3 (locked): snapshot into the ring
        let snapshot = {
            let mut core = self.core.lock();
            let snapshot = build_snapshot(&core.state);
            core.state.push_snapshot(snapshot.clone());
            snapshot
        };

        let update = StateUpdate {
            snapshot,
            migration,
            level_changes,
        };
        // Receivers may lag or be absent; neither stalls the loop
        let _ = self.updates.send(update.clone());
        Ok(update)
    }

    /// Force one planner invocation immediately, regardless of the
    /// auto-migration flag.
    pub async fn trigger_migration(&self) -> Option<MigrationRecord> {
        let plan = {
            let mut core = self.core.lock();
            let core = &mut *core;
            load_model::recompute_all(&mut core.state);
            planner::plan(&core.state)
        };
        match plan {
            Some(plan) => self.execute(plan).await,
            None => {
                info!("no feasible migration");
                None
            }
        }
    }

    /// Apply one telemetry report under the lock.
    pub fn ingest(&self, report: &TelemetryReport) -> IngestOutcome {
        let mut core = self.core.lock();
        telemetry::apply_report(&mut core.state, report, Utc::now())
    }

    /// Set or toggle auto-migration; returns the new value.
    pub fn set_auto(&self, enabled: Option<bool>) -> bool {
        let mut core = self.core.lock();
        core.auto_migration = enabled.unwrap_or(!core.auto_migration);
        info!(enabled = core.auto_migration, "auto-migration updated");
        core.auto_migration
    }

    /// Set the loop speed; returns the new polling interval in seconds.
    pub fn set_speed(&self, speed: f64) -> Result<f64> {
        if !speed.is_finite() || !(SPEED_MIN..=SPEED_MAX).contains(&speed) {
            return Err(BalancerError::SpeedOutOfRange {
                speed,
                min: SPEED_MIN,
                max: SPEED_MAX,
            });
        }
        self.core.lock().speed = speed;
        info!(speed, "loop speed updated");
        Ok(1.0 / speed)
    }

    /// Reinitialize the core with a named topology. History, time-series,
    /// and simulator tick count restart; auto/speed settings survive.
    pub fn set_topology(&self, name: &str) -> Result<TopologyView> {
        if !topology::is_known(name) {
            return Err(BalancerError::UnknownTopology {
                name: name.to_string(),
            });
        }
        let topo = topology::load(name);
        let mut core = self.core.lock();
        let core = &mut *core;
        core.state = CoreState::from_topology(topo);
        if let Some(sim) = core.simulator.as_mut() {
            *sim = TrafficSimulator::new(sim.pattern(), sim.intensity(), core.simulator_seed);
        }
        info!(topology = %name, "core reinitialized");
        Ok(topology_view(&core.state))
    }

    /// Change the simulator pattern/intensity.
    pub fn set_traffic(&self, pattern: &str, intensity: Option<f64>) -> Result<TrafficSummary> {
        let parsed = TrafficPattern::parse(pattern).ok_or_else(|| BalancerError::UnknownPattern {
            pattern: pattern.to_string(),
        })?;
        let mut core = self.core.lock();
        let core = &mut *core;
        let sim = core
            .simulator
            .as_mut()
            .ok_or(BalancerError::SimulatorDisabled)?;
        let intensity = intensity.unwrap_or_else(|| sim.intensity());
        sim.set_pattern(parsed, intensity);
        info!(pattern = %parsed.as_str(), intensity = sim.intensity(), "traffic updated");
        Ok(traffic_summary(&core.state, sim))
    }

    // ------------------------------------------------------------------
    //  Read-only views
    // ------------------------------------------------------------------

    pub fn topology_view(&self) -> TopologyView {
        topology_view(&self.core.lock().state)
    }

    pub fn controllers_view(&self) -> Vec<ControllerView> {
        let core = self.core.lock();
        core.state
            .controllers
            .values()
            .map(|c| ControllerView {
                id: c.id.clone(),
                load_percentage: round2(c.load_percentage),
                level: c.level,
                level_label: c.level.label().to_string(),
                cpu_util: c.cpu_util,
                mem_util: c.mem_util,
                bw_util: c.bw_util,
                domain_size: core.state.domain_size(&c.id),
                capacity_cpu: c.capacity.cpu,
                capacity_mem: c.capacity.mem,
                capacity_bw: c.capacity.bw,
                active: c.active,
                reported_cpu: c.reported_cpu,
                reported_mem: c.reported_mem,
            })
            .collect()
    }

    pub fn switches_view(&self) -> Vec<SwitchView> {
        let core = self.core.lock();
        core.state
            .switches
            .values()
            .map(|sw| {
                let usage = core
                    .state
                    .controllers
                    .get(&sw.controller_id)
                    .map(|ctrl| load_model::switch_usage(sw, ctrl))
                    .unwrap_or(0.0);
                SwitchView {
                    id: sw.id.clone(),
                    dpid: sw.dpid,
                    controller_id: sw.controller_id.clone(),
                    packet_in_rate: round2(sw.packet_in_rate),
                    load_cpu: round2(sw.load_cpu),
                    load_mem: round2(sw.load_mem),
                    load_bw: round2(sw.load_bw),
                    resource_usage: round2(usage * 100.0),
                }
            })
            .collect()
    }

    pub fn summary(&self) -> SummaryView {
        let core = self.core.lock();
        let state = &core.state;
        let loads: Vec<f64> = state
            .controllers
            .values()
            .filter(|c| c.active)
            .map(|c| c.load_percentage)
            .collect();
        let average = if loads.is_empty() {
            0.0
        } else {
            loads.iter().sum::<f64>() / loads.len() as f64
        };
        SummaryView {
            controller_count: state.controllers.len(),
            switch_count: state.switches.len(),
            total_packet_rate: round2(
                state.switches.values().map(|s| s.packet_in_rate).sum::<f64>(),
            ),
            average_load: round2(average),
            global_imbalance: load_model::global_imbalance(&loads),
            domain_sizes: state
                .controllers
                .keys()
                .map(|id| (id.clone(), state.domain_size(id)))
                .collect(),
            migrations_total: state.history_len(),
            auto_migration: core.auto_migration,
        }
    }

    /// Up to the last `limit` snapshots, oldest first.
    pub fn timeseries(&self, limit: Option<usize>) -> Vec<LoadSnapshot> {
        let limit = limit.unwrap_or(TIMESERIES_CAPACITY);
        self.core.lock().state.snapshots_tail(limit)
    }

    /// Up to the last `limit` migration records, oldest first.
    pub fn history(&self, limit: Option<usize>) -> Vec<MigrationRecord> {
        let limit = limit.unwrap_or(50);
        self.core.lock().state.history_tail(limit)
    }

    pub fn comparison(&self) -> ComparisonView {
        let core = self.core.lock();
        let state = &core.state;
        let count = state.history_len();
        if count == 0 {
            return ComparisonView {
                migrations: 0,
                average_cost: 0.0,
                average_improvement_pct: 0.0,
            };
        }
        let total_cost: f64 = state.history_iter().map(|r| r.cost).sum();
        let mut improvements = 0usize;
        let improvement_sum: f64 = state
            .history_iter()
            .filter(|r| r.imbalance_before > 0.0)
            .map(|r| {
                improvements += 1;
                (r.imbalance_before - r.imbalance_after) / r.imbalance_before * 100.0
            })
            .sum();
        ComparisonView {
            migrations: count,
            average_cost: total_cost / count as f64,
            average_improvement_pct: if improvements == 0 {
                0.0
            } else {
                improvement_sum / improvements as f64
            },
        }
    }

    pub fn traffic_summary(&self) -> Result<TrafficSummary> {
        let core = self.core.lock();
        let sim = core
            .simulator
            .as_ref()
            .ok_or(BalancerError::SimulatorDisabled)?;
        Ok(traffic_summary(&core.state, sim))
    }

    /// Greeting for a newly connected WebSocket client.
    pub fn hello(&self) -> PushMessage {
        let core = self.core.lock();
        PushMessage::Hello {
            topology: topology_view(&core.state),
            snapshot: core.state.latest_snapshot(),
        }
    }

    // ------------------------------------------------------------------
    //  Decision execution
    // ------------------------------------------------------------------

    /// Actuate a planned migration outside the lock, then re-acquire it to
    /// validate and commit. Failure or timeout leaves state untouched.
    async fn execute(&self, plan: MigrationPlan) -> Option<MigrationRecord> {
        let timeout = Duration::from_secs(ACTUATOR_TIMEOUT_SECS);
        let call = self
            .actuator
            .migrate(&plan.switch_id, &plan.source_id, &plan.target_id);
        match tokio::time::timeout(timeout, call).await {
            Err(_) => {
                error!(
                    switch_id = %plan.switch_id,
                    timeout_secs = ACTUATOR_TIMEOUT_SECS,
                    "actuator timed out, migration abandoned"
                );
                None
            }
            Ok(Err(e)) => {
                error!(switch_id = %plan.switch_id, error = %e, "actuator failed, migration abandoned");
                None
            }
            Ok(Ok(())) => {
                let mut core = self.core.lock();
                commit(&mut core.state, &plan)
            }
        }
    }
}

/// Validate a plan against current ownership and apply it.
fn commit(state: &mut CoreState, plan: &MigrationPlan) -> Option<MigrationRecord> {
    let still_owned = state
        .switches
        .get(&plan.switch_id)
        .map(|sw| sw.controller_id == plan.source_id)
        .unwrap_or(false);
    if !still_owned {
        warn!(
            switch_id = %plan.switch_id,
            source_id = %plan.source_id,
            "ownership changed during actuation, decision dropped"
        );
        return None;
    }

    let source_before = state.controllers[&plan.source_id].load_percentage;
    let target_before = state.controllers[&plan.target_id].load_percentage;
    let imbalance_before = load_model::pairwise_imbalance(source_before, target_before);

    if !state.reassign(&plan.switch_id, &plan.target_id) {
        return None;
    }

    let source_after = state.controllers[&plan.source_id].load_percentage;
    let target_after = state.controllers[&plan.target_id].load_percentage;
    let record = MigrationRecord {
        timestamp: Utc::now(),
        switch_id: plan.switch_id.clone(),
        source_id: plan.source_id.clone(),
        target_id: plan.target_id.clone(),
        source_load_before: source_before,
        source_load_after: source_after,
        target_load_before: target_before,
        target_load_after: target_after,
        cost: plan.cost,
        efficiency: plan.efficiency,
        imbalance_before,
        imbalance_after: load_model::pairwise_imbalance(source_after, target_after),
    };
    state.record_migration(record.clone());
    info!(
        switch_id = %record.switch_id,
        source_id = %record.source_id,
        target_id = %record.target_id,
        "migration committed"
    );
    Some(record)
}

fn build_snapshot(state: &CoreState) -> LoadSnapshot {
    let controllers: Vec<ControllerLoad> = state
        .controllers
        .values()
        .map(|c| ControllerLoad {
            id: c.id.clone(),
            load_percentage: c.load_percentage,
            level: c.level,
            cpu_util: c.cpu_util,
            mem_util: c.mem_util,
            bw_util: c.bw_util,
            domain_size: state.domain_size(&c.id),
        })
        .collect();

    let loads: Vec<f64> = state
        .controllers
        .values()
        .filter(|c| c.active)
        .map(|c| c.load_percentage)
        .collect();
    let average_load = if loads.is_empty() {
        0.0
    } else {
        loads.iter().sum::<f64>() / loads.len() as f64
    };

    LoadSnapshot {
        timestamp: Utc::now(),
        controllers,
        average_load,
        global_imbalance: load_model::global_imbalance(&loads),
    }
}

fn topology_view(state: &CoreState) -> TopologyView {
    let mut nodes = Vec::with_capacity(state.controllers.len() + state.switches.len());

    for c in state.controllers.values() {
        nodes.push(TopologyNode::Controller {
            id: c.id.clone(),
            x: c.x,
            y: c.y,
            load: round2(c.load_percentage),
            level: c.level.value(),
            level_label: c.level.label().to_string(),
            level_color: c.level.color().to_string(),
            active: c.active,
            capacity_cpu: c.capacity.cpu,
            capacity_mem: c.capacity.mem,
            capacity_bw: c.capacity.bw,
            switch_count: state.domain_size(&c.id),
        });
    }

    for sw in state.switches.values() {
        let usage = state
            .controllers
            .get(&sw.controller_id)
            .map(|ctrl| load_model::switch_usage(sw, ctrl))
            .unwrap_or(0.0);
        nodes.push(TopologyNode::Switch {
            id: sw.id.clone(),
            x: sw.x,
            y: sw.y,
            controller_id: sw.controller_id.clone(),
            load_cpu: round2(sw.load_cpu),
            load_mem: round2(sw.load_mem),
            load_bw: round2(sw.load_bw),
            packet_in_rate: round2(sw.packet_in_rate),
            resource_usage: round2(usage * 100.0),
        });
    }

    let mut links: Vec<LinkView> = state
        .links
        .iter()
        .map(|(u, v)| LinkView {
            source: u.clone(),
            target: v.clone(),
            link_type: None,
        })
        .collect();

    // Domain edges: switch to owning controller
    for sw in state.switches.values() {
        links.push(LinkView {
            source: sw.id.clone(),
            target: sw.controller_id.clone(),
            link_type: Some("domain".to_string()),
        });
    }

    TopologyView {
        topology_name: state.topology_name.clone(),
        nodes,
        links,
    }
}

fn traffic_summary(state: &CoreState, sim: &TrafficSimulator) -> TrafficSummary {
    let rates: Vec<f64> = state.switches.values().map(|s| s.packet_in_rate).collect();
    let total: f64 = rates.iter().sum();
    let avg = if rates.is_empty() {
        0.0
    } else {
        total / rates.len() as f64
    };
    let max = rates.iter().copied().fold(0.0f64, f64::max);
    TrafficSummary {
        total_pps: round2(total),
        avg_pps: round2(avg),
        max_pps: round2(max),
        pattern: sim.pattern().as_str().to_string(),
        intensity: sim.intensity(),
        tick: sim.tick_count(),
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::testing::FailingActuator;
    use crate::actuator::LoggingActuator;
    use std::collections::HashMap;
    use std::sync::atomic::Ordering;

    fn test_config() -> ServiceConfig {
        let mut config = ServiceConfig::default();
        config.topology = "custom".to_string();
        config.simulator.enabled = false;
        config.auto_migration = true;
        config
    }

    fn engine_with(config: ServiceConfig) -> Engine {
        Engine::new(&config, Arc::new(LoggingActuator))
    }

    /// Push heavy traffic onto one controller's domain via telemetry.
    fn overload_first_controller(engine: &Engine) -> (String, u64) {
        let core = engine.core.lock();
        let ctrl_id = core.state.controllers.keys().next().unwrap().clone();
        let switches: HashMap<String, u64> = core
            .state
            .domain(&ctrl_id)
            .unwrap()
            .iter()
            .map(|sid| (core.state.switches[sid].dpid.to_string(), 100u64))
            .collect();
        let first_dpid = core.state.domain(&ctrl_id).unwrap().iter().next().map(|sid| core.state.switches[sid].dpid).unwrap();
        drop(core);

        engine.ingest(&TelemetryReport {
            controller_id: ctrl_id.clone(),
            cpu: 20.0,
            memory: 10.0,
            switches,
        });
        (ctrl_id, first_dpid)
    }

    #[tokio::test]
    async fn tick_publishes_snapshot_and_fills_ring() {
        let engine = engine_with(test_config());
        let mut rx = engine.subscribe();

        let update = engine.tick().await.unwrap();
        assert_eq!(update.snapshot.controllers.len(), 3);

        let received = rx.recv().await.unwrap();
        assert_eq!(received.snapshot.controllers.len(), 3);

        assert_eq!(engine.timeseries(None).len(), 1);
    }

    #[tokio::test]
    async fn overload_triggers_auto_migration() {
        let engine = engine_with(test_config());
        let (ctrl_id, _) = overload_first_controller(&engine);

        let update = engine.tick().await.unwrap();
        let record = update.migration.expect("migration expected");
        assert_eq!(record.source_id, ctrl_id);
        assert_ne!(record.target_id, ctrl_id);
        // Committed migrations never worsen the pair
        assert!(record.imbalance_after <= record.imbalance_before + 1e-9);
        assert_eq!(engine.history(None).len(), 1);

        let summary = engine.summary();
        assert_eq!(summary.migrations_total, 1);
    }

    #[tokio::test]
    async fn auto_migration_disabled_means_no_moves() {
        let mut config = test_config();
        config.auto_migration = false;
        let engine = engine_with(config);
        overload_first_controller(&engine);

        let update = engine.tick().await.unwrap();
        assert!(update.migration.is_none());
        assert!(engine.history(None).is_empty());
    }

    #[tokio::test]
    async fn actuator_failure_leaves_state_untouched() {
        let failing = Arc::new(FailingActuator::default());
        let engine = Engine::new(&test_config(), failing.clone());
        let (ctrl_id, _) = overload_first_controller(&engine);

        let update = engine.tick().await.unwrap();
        assert!(update.migration.is_none());
        assert!(engine.history(None).is_empty());
        assert_eq!(failing.calls.load(Ordering::SeqCst), 1);

        // The overloaded controller still owns its whole domain
        let core = engine.core.lock();
        assert!(core
            .state
            .switches
            .values()
            .filter(|s| s.controller_id == ctrl_id)
            .count() > 0);
    }

    #[tokio::test]
    async fn trigger_returns_none_when_balanced() {
        let engine = engine_with(test_config());
        assert!(engine.trigger_migration().await.is_none());
    }

    #[tokio::test]
    async fn trigger_ignores_auto_flag() {
        let mut config = test_config();
        config.auto_migration = false;
        let engine = engine_with(config);
        overload_first_controller(&engine);

        let record = engine.trigger_migration().await;
        assert!(record.is_some());
    }

    #[test]
    fn speed_controls_polling_interval() {
        let engine = engine_with(test_config());
        let interval = engine.set_speed(2.0).unwrap();
        assert!((interval - 0.5).abs() < 1e-12);
        assert_eq!(engine.polling_interval(), Duration::from_secs_f64(0.5));

        assert!(engine.set_speed(0.0).is_err());
        assert!(engine.set_speed(11.0).is_err());
        assert!(engine.set_speed(f64::NAN).is_err());
    }

    #[test]
    fn topology_switch_reinitializes_state() {
        let engine = engine_with(test_config());
        let view = engine.set_topology("arn").unwrap();
        assert_eq!(view.topology_name, "ARN");
        assert_eq!(engine.switches_view().len(), 30);
        assert!(engine.history(None).is_empty());

        assert!(engine.set_topology("unknown-topology").is_err());
    }

    #[test]
    fn topology_view_contains_domain_links() {
        let engine = engine_with(test_config());
        let view = engine.topology_view();
        let domain_links = view
            .links
            .iter()
            .filter(|l| l.link_type.as_deref() == Some("domain"))
            .count();
        assert_eq!(domain_links, 9);
        // 8 infrastructure edges for the custom tree
        assert_eq!(view.links.len() - domain_links, 8);
    }

    #[test]
    fn traffic_controls_require_simulator() {
        let engine = engine_with(test_config());
        assert!(matches!(
            engine.traffic_summary(),
            Err(BalancerError::SimulatorDisabled)
        ));

        let mut config = test_config();
        config.simulator.enabled = true;
        let engine = engine_with(config);
        let summary = engine.set_traffic("stress", Some(2.0)).unwrap();
        assert_eq!(summary.pattern, "stress");
        assert_eq!(summary.intensity, 2.0);
        assert!(engine.set_traffic("tsunami", None).is_err());
    }
}
