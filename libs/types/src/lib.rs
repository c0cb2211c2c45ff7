//! # SDNLB Unified Types Library
//!
//! Shared vocabulary for the load-balancing controller: entity records for
//! control planes and switches, saturation levels, migration records, load
//! snapshots, and the JSON payloads exchanged on the REST/WebSocket
//! boundary.
//!
//! ## Design Philosophy
//!
//! - **Plain records**: controllers and switches are explicit structs with
//!   fixed fields; no inheritance, no duck typing. A controller's identity
//!   is its string id plus a [`SaturationLevel`] value.
//! - **Clamp at the setter**: every numeric field with a contract range
//!   ([0,1] utilizations, [0,100] composite load, non-negative rates) is
//!   clamped where it is written, never by downstream readers.
//! - **Wire types are views**: REST and push payloads are dedicated
//!   serde structs derived from state, so internal layout can change
//!   without breaking the dashboard contract.

pub mod entities;
pub mod level;
pub mod records;
pub mod snapshot;
pub mod telemetry;
pub mod views;

pub use entities::{CapacityVector, Controller, ConversionFactors, Switch};
pub use level::SaturationLevel;
pub use records::{MigrationPlan, MigrationRecord};
pub use snapshot::{ControllerLoad, LevelChange, LoadSnapshot, PushMessage, StateUpdate};
pub use telemetry::{IngestOutcome, TelemetryReport};
pub use views::{
    ComparisonView, ControllerView, LinkView, SummaryView, SwitchView, TopologyNode,
    TopologyView, TrafficSummary,
};
