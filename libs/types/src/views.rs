//! Read-only JSON views served on the query surface
//!
//! Shapes follow the dashboard contract: topology nodes carry a `type` tag
//! so controllers and switches render from one list, and numeric fields are
//! pre-rounded by the producer where the dashboard expects it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::level::SaturationLevel;

/// One node of the topology view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TopologyNode {
    Controller {
        id: String,
        x: f64,
        y: f64,
        load: f64,
        level: u8,
        level_label: String,
        level_color: String,
        active: bool,
        capacity_cpu: f64,
        capacity_mem: f64,
        capacity_bw: f64,
        switch_count: usize,
    },
    Switch {
        id: String,
        x: f64,
        y: f64,
        controller_id: String,
        load_cpu: f64,
        load_mem: f64,
        load_bw: f64,
        packet_in_rate: f64,
        /// Usage fraction on the current owner, as a percentage.
        resource_usage: f64,
    },
}

/// Infrastructure or domain edge of the topology view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkView {
    pub source: String,
    pub target: String,
    /// `"domain"` for switch-to-owner edges; absent for infrastructure.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub link_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologyView {
    pub topology_name: String,
    pub nodes: Vec<TopologyNode>,
    pub links: Vec<LinkView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerView {
    pub id: String,
    pub load_percentage: f64,
    pub level: SaturationLevel,
    pub level_label: String,
    pub cpu_util: f64,
    pub mem_util: f64,
    pub bw_util: f64,
    pub domain_size: usize,
    pub capacity_cpu: f64,
    pub capacity_mem: f64,
    pub capacity_bw: f64,
    pub active: bool,
    pub reported_cpu: f64,
    pub reported_mem: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwitchView {
    pub id: String,
    pub dpid: u64,
    pub controller_id: String,
    pub packet_in_rate: f64,
    pub load_cpu: f64,
    pub load_mem: f64,
    pub load_bw: f64,
    /// Usage fraction on the current owner, as a percentage.
    pub resource_usage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryView {
    pub controller_count: usize,
    pub switch_count: usize,
    pub total_packet_rate: f64,
    pub average_load: f64,
    pub global_imbalance: f64,
    pub domain_sizes: BTreeMap<String, usize>,
    pub migrations_total: usize,
    pub auto_migration: bool,
}

/// Aggregate over migration history for the comparison endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonView {
    pub migrations: usize,
    pub average_cost: f64,
    /// Mean of `(imbalance_before - imbalance_after) / imbalance_before`
    /// over history, as a percentage.
    pub average_improvement_pct: f64,
}

/// Current state of the embedded traffic simulator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrafficSummary {
    pub total_pps: f64,
    pub avg_pps: f64,
    pub max_pps: f64,
    pub pattern: String,
    pub intensity: f64,
    pub tick: u64,
}
