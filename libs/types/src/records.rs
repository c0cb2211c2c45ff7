//! Migration planning and history records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single candidate selected by the planner, together with its decision
/// diagnostics. Holding a plan does not imply the migration happened; the
/// control loop still has to actuate and commit it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationPlan {
    pub switch_id: String,
    pub source_id: String,
    pub target_id: String,
    /// Distance-weighted resource usage of the switch on its source.
    pub cost: f64,
    /// Cost divided by pair-wise imbalance reduction; lower is better.
    pub efficiency: f64,
    pub predicted_source_load: f64,
    pub predicted_target_load: f64,
    pub dc_before: f64,
}

/// Immutable record of one committed migration, appended to history in
/// actuation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationRecord {
    pub timestamp: DateTime<Utc>,
    pub switch_id: String,
    pub source_id: String,
    pub target_id: String,
    pub source_load_before: f64,
    pub source_load_after: f64,
    pub target_load_before: f64,
    pub target_load_after: f64,
    pub cost: f64,
    pub efficiency: f64,
    /// Pair-wise imbalance between source and target before/after commit.
    pub imbalance_before: f64,
    pub imbalance_after: f64,
}
