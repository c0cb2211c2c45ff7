//! Migration planner
//!
//! Greedy single-migration policy: scan every (source, switch, target)
//! candidate, reject moves that would push the target into HIGH, and keep
//! the feasible candidate with the lowest migration efficiency. Iteration
//! runs in controller id then switch id order, and only a strictly better
//! efficiency replaces the incumbent, so ties resolve to the
//! lexicographically smallest ids.

use tracing::debug;

use config::balancing::LEVEL_HIGH_MAX;
use types::MigrationPlan;

use crate::load_model;
use crate::state::CoreState;

/// Select at most one migration. `None` means there is no source, no
/// target, or no candidate that both passes the safety filter and reduces
/// pair-wise imbalance.
pub fn plan(state: &CoreState) -> Option<MigrationPlan> {
    let sources: Vec<&str> = state
        .controllers
        .values()
        .filter(|c| c.active && c.level.is_overloaded())
        .map(|c| c.id.as_str())
        .collect();

    let targets: Vec<&str> = state
        .controllers
        .values()
        .filter(|c| c.active && c.level.is_underloaded())
        .map(|c| c.id.as_str())
        .collect();

    if sources.is_empty() || targets.is_empty() {
        return None;
    }

    let mut best: Option<MigrationPlan> = None;

    for &source_id in &sources {
        let source = &state.controllers[source_id];
        let Some(domain) = state.domain(source_id) else {
            continue;
        };

        for switch_id in domain {
            let sw = &state.switches[switch_id];
            let usage_on_source = load_model::switch_usage(sw, source);

            for &target_id in &targets {
                if target_id == source_id {
                    continue;
                }
                let target = &state.controllers[target_id];
                let usage_on_target = load_model::switch_usage(sw, target);

                let (predicted_source, predicted_target) = load_model::predicted_loads(
                    source.load_percentage,
                    target.load_percentage,
                    usage_on_source,
                    usage_on_target,
                );

                // Safety filter: never push the target into HIGH
                if predicted_target >= LEVEL_HIGH_MAX {
                    continue;
                }

                let dc_before =
                    load_model::pairwise_imbalance(source.load_percentage, target.load_percentage);
                let dc_after = load_model::pairwise_imbalance(predicted_source, predicted_target);

                let cost =
                    load_model::migration_cost(state.distance(switch_id, target_id), usage_on_source);

                let Some(efficiency) = load_model::migration_efficiency(cost, dc_before, dc_after)
                else {
                    continue;
                };

                debug!(
                    switch_id = %switch_id,
                    source_id = %source_id,
                    target_id = %target_id,
                    efficiency,
                    "candidate evaluated"
                );

                let better = best
                    .as_ref()
                    .map(|b| efficiency < b.efficiency)
                    .unwrap_or(true);
                if better {
                    best = Some(MigrationPlan {
                        switch_id: switch_id.clone(),
                        source_id: source_id.to_string(),
                        target_id: target_id.to_string(),
                        cost,
                        efficiency,
                        predicted_source_load: predicted_source,
                        predicted_target_load: predicted_target,
                        dc_before,
                    });
                }
            }
        }
    }

    best
}
