//! Telemetry wire payload pushed by per-controller agents

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One per-window report from a controller agent. `switches` maps datapath
/// ids (as decimal strings, matching the agent wire format) to the packet-in
/// count observed in the last one-second window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryReport {
    pub controller_id: String,
    /// Process cpu percent of the reporting agent. Observational only.
    #[serde(default)]
    pub cpu: f64,
    /// Process memory percent of the reporting agent. Observational only.
    #[serde(default)]
    pub memory: f64,
    #[serde(default)]
    pub switches: HashMap<String, u64>,
}

/// Summary of how one report was applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestOutcome {
    /// Entries applied to switches owned by the reporting controller.
    pub accepted: usize,
    /// Entries rejected because the recorded owner differs from the
    /// reporting controller (stale cross-domain writes after a migration).
    pub dropped_stale: usize,
    /// Entries whose dpid resolved to no known switch.
    pub dropped_unknown: usize,
}
