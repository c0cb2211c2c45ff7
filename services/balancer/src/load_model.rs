//! Load model
//!
//! Pure computation over state snapshots: weighted per-switch resource
//! usage, composite controller load, saturation classification, pair-wise
//! and global imbalance, and migration cost/efficiency. Nothing in this
//! module performs I/O; the only mutation is writing derived fields back
//! through the entity setters in the recompute helpers.

use config::balancing::{
    COST_EPSILON, IMBALANCE_FLOOR, LEVEL_HIGH_MAX, LEVEL_IDLE_MAX, LEVEL_NORMAL_MAX,
    MIN_IMBALANCE_DELTA, WEIGHT_BW, WEIGHT_CPU, WEIGHT_MEM,
};
use types::{CapacityVector, Controller, LevelChange, SaturationLevel, Switch};

use crate::state::CoreState;

/// Composite load and per-resource utilizations of one controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregateLoad {
    pub load_percentage: f64,
    pub cpu_util: f64,
    pub mem_util: f64,
    pub bw_util: f64,
}

/// Aggregate a controller's summed per-resource load against its capacity.
///
/// The composite percentage weighs the raw capacity ratios and clamps the
/// result into [0,100]; the per-resource utilizations clamp individually
/// into [0,1] for observability.
pub fn aggregate_load(cpu_sum: f64, mem_sum: f64, bw_sum: f64, cap: CapacityVector) -> AggregateLoad {
    let cpu_ratio = cpu_sum / cap.cpu;
    let mem_ratio = mem_sum / cap.mem;
    let bw_ratio = bw_sum / cap.bw;

    let composite =
        100.0 * (WEIGHT_CPU * cpu_ratio + WEIGHT_MEM * mem_ratio + WEIGHT_BW * bw_ratio);

    AggregateLoad {
        load_percentage: composite.clamp(0.0, 100.0),
        cpu_util: cpu_ratio.clamp(0.0, 1.0),
        mem_util: mem_ratio.clamp(0.0, 1.0),
        bw_util: bw_ratio.clamp(0.0, 1.0),
    }
}

/// Weighted resource usage fraction of one switch on a controller, in
/// [0,1]. Works both for the current owner and as the projection onto a
/// prospective migration target.
pub fn switch_usage(sw: &Switch, ctrl: &Controller) -> f64 {
    let cpu = (sw.load_cpu / ctrl.capacity.cpu).clamp(0.0, 1.0);
    let mem = (sw.load_mem / ctrl.capacity.mem).clamp(0.0, 1.0);
    let bw = (sw.load_bw / ctrl.capacity.bw).clamp(0.0, 1.0);
    WEIGHT_CPU * cpu + WEIGHT_MEM * mem + WEIGHT_BW * bw
}

/// Classify a composite load into a saturation level.
pub fn classify(load: f64) -> SaturationLevel {
    if load < LEVEL_IDLE_MAX {
        SaturationLevel::Idle
    } else if load < LEVEL_NORMAL_MAX {
        SaturationLevel::Normal
    } else if load < LEVEL_HIGH_MAX {
        SaturationLevel::High
    } else {
        SaturationLevel::Overload
    }
}

/// Pair-wise imbalance between two composite loads: the normalized load
/// difference, or zero when both loads sit at the floor.
pub fn pairwise_imbalance(a: f64, b: f64) -> f64 {
    let max = a.max(b);
    if max > IMBALANCE_FLOOR {
        (a - b).abs() / max
    } else {
        0.0
    }
}

/// Maximum pair-wise imbalance over all pairs of loads; zero when fewer
/// than two are given. Callers pass the loads of active controllers only.
pub fn global_imbalance(loads: &[f64]) -> f64 {
    let mut worst = 0.0f64;
    for i in 0..loads.len() {
        for j in (i + 1)..loads.len() {
            worst = worst.max(pairwise_imbalance(loads[i], loads[j]));
        }
    }
    worst
}

/// Distance-weighted migration cost. The epsilon keeps idle switches from
/// migrating for free.
pub fn migration_cost(distance: f64, usage_on_source: f64) -> f64 {
    distance * (usage_on_source + COST_EPSILON)
}

/// Predicted composite loads after moving a switch: the source sheds its
/// usage share, the target absorbs its projected share, both clamped to
/// the valid range.
pub fn predicted_loads(
    source_load: f64,
    target_load: f64,
    usage_on_source: f64,
    usage_on_target: f64,
) -> (f64, f64) {
    let source_after = (source_load - 100.0 * usage_on_source).max(0.0);
    let target_after = (target_load + 100.0 * usage_on_target).min(100.0);
    (source_after, target_after)
}

/// Migration efficiency: cost per unit of pair-wise imbalance reduction.
/// `None` means the move would not reduce imbalance enough to be feasible.
pub fn migration_efficiency(cost: f64, dc_before: f64, dc_after: f64) -> Option<f64> {
    let delta = dc_before - dc_after;
    if delta > MIN_IMBALANCE_DELTA {
        Some(cost / delta)
    } else {
        None
    }
}

/// Recompute one controller's aggregates and level from its current domain.
pub fn recompute_controller(state: &mut CoreState, controller_id: &str) {
    let (mut cpu, mut mem, mut bw) = (0.0, 0.0, 0.0);
    if let Some(domain) = state.domain(controller_id) {
        for switch_id in domain {
            if let Some(sw) = state.switches.get(switch_id) {
                cpu += sw.load_cpu;
                mem += sw.load_mem;
                bw += sw.load_bw;
            }
        }
    }

    if let Some(ctrl) = state.controllers.get_mut(controller_id) {
        let agg = aggregate_load(cpu, mem, bw, ctrl.capacity);
        ctrl.set_utilization(agg.cpu_util, agg.mem_util, agg.bw_util);
        ctrl.set_load_percentage(agg.load_percentage);
        ctrl.level = classify(ctrl.load_percentage);
    }
}

/// Recompute every controller; returns the level transitions this pass
/// caused, in controller id order.
pub fn recompute_all(state: &mut CoreState) -> Vec<LevelChange> {
    let ids: Vec<String> = state.controllers.keys().cloned().collect();
    let mut changes = Vec::new();
    for id in ids {
        let previous = state.controllers[&id].level;
        recompute_controller(state, &id);
        let current = state.controllers[&id].level;
        if previous != current {
            changes.push(LevelChange {
                controller_id: id,
                previous,
                current,
            });
        }
    }
    changes
}
