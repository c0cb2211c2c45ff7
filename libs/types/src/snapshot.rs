//! Periodic load snapshots and the push-channel payload

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::level::SaturationLevel;
use crate::records::MigrationRecord;
use crate::views::TopologyView;

/// Per-controller slice of a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerLoad {
    pub id: String,
    pub load_percentage: f64,
    pub level: SaturationLevel,
    pub cpu_util: f64,
    pub mem_util: f64,
    pub bw_util: f64,
    pub domain_size: usize,
}

/// One entry of the bounded time-series ring, built at the end of every
/// control-loop tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadSnapshot {
    pub timestamp: DateTime<Utc>,
    pub controllers: Vec<ControllerLoad>,
    pub average_load: f64,
    pub global_imbalance: f64,
}

/// A controller crossing a saturation threshold during a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelChange {
    pub controller_id: String,
    pub previous: SaturationLevel,
    pub current: SaturationLevel,
}

/// Payload emitted on the push channel after every tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateUpdate {
    pub snapshot: LoadSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migration: Option<MigrationRecord>,
    pub level_changes: Vec<LevelChange>,
}

/// Everything a dashboard client can receive, tagged on the wire with
/// `msg_type`. `Hello` greets a new connection with the current topology
/// and the most recent snapshot; `StateUpdate` follows on every tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "msg_type", rename_all = "snake_case")]
pub enum PushMessage {
    Hello {
        topology: TopologyView,
        snapshot: Option<LoadSnapshot>,
    },
    StateUpdate(StateUpdate),
}
