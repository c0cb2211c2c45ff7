//! Telemetry ingest
//!
//! Applies one per-window agent report to the state store. Entries from a
//! controller that no longer owns the switch are dropped, which keeps
//! history monotonic with respect to assignment changes: after a migration
//! the old owner keeps reporting the switch for a window or two, and those
//! writes must not leak into the new owner's domain.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use config::balancing::CONVERSION;
use types::{IngestOutcome, TelemetryReport};

use crate::load_model;
use crate::state::CoreState;

/// Apply a report. Unknown controllers drop the whole report; unknown
/// dpids and stale owners drop individual entries. All drops are counted
/// on the store for diagnostics.
pub fn apply_report(
    state: &mut CoreState,
    report: &TelemetryReport,
    now: DateTime<Utc>,
) -> IngestOutcome {
    let mut outcome = IngestOutcome::default();

    if !state.controllers.contains_key(&report.controller_id) {
        warn!(
            controller_id = %report.controller_id,
            "telemetry from unknown controller, dropping report"
        );
        state.unknown_drops += 1;
        return outcome;
    }

    if let Some(ctrl) = state.controllers.get_mut(&report.controller_id) {
        ctrl.record_report(report.cpu, report.memory, now);
    }

    for (dpid_str, &count) in &report.switches {
        let resolved = dpid_str
            .parse::<u64>()
            .ok()
            .and_then(|dpid| state.switch_id_for_dpid(dpid).cloned());
        let switch_id = match resolved {
            Some(id) => id,
            None => {
                debug!(dpid = %dpid_str, "telemetry for unknown dpid, dropping entry");
                state.unknown_drops += 1;
                outcome.dropped_unknown += 1;
                continue;
            }
        };

        let owner_matches = state
            .switches
            .get(&switch_id)
            .map(|sw| sw.controller_id == report.controller_id)
            .unwrap_or(false);
        if !owner_matches {
            debug!(
                switch_id = %switch_id,
                reporter = %report.controller_id,
                "stale telemetry from non-owner, dropping entry"
            );
            state.stale_drops += 1;
            outcome.dropped_stale += 1;
            continue;
        }

        // The window is defined to be one second, so the count is the rate
        if let Some(sw) = state.switches.get_mut(&switch_id) {
            sw.apply_rate(count as f64, &CONVERSION);
            outcome.accepted += 1;
        }
    }

    load_model::recompute_controller(state, &report.controller_id);
    outcome
}
