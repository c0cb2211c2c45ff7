//! Entity records for control planes and data-plane switches
//!
//! Both entities are plain records owned by the state store. Fields with a
//! contract range are written through clamping setters; readers never need
//! to re-validate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::level::SaturationLevel;

/// Per-controller capacity vector. All components are strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapacityVector {
    pub cpu: f64,
    pub mem: f64,
    pub bw: f64,
}

/// Fixed factors mapping a packet-in rate (req/s) to per-resource
/// consumption on the owning controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConversionFactors {
    pub cpu: f64,
    pub mem: f64,
    pub bw: f64,
}

/// A control plane instance owning a disjoint domain of switches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Controller {
    /// Stable string id (`c1`, `c2`, ...).
    pub id: String,
    /// Placement in layout space, used only for distance computation.
    pub x: f64,
    pub y: f64,
    pub capacity: CapacityVector,

    /// Per-resource utilization of the aggregated domain load, each in [0,1].
    pub cpu_util: f64,
    pub mem_util: f64,
    pub bw_util: f64,
    /// Composite weighted load in [0,100].
    pub load_percentage: f64,
    pub level: SaturationLevel,

    pub active: bool,
    /// Process-level metrics reported by the telemetry agent. Observational
    /// only; they never feed the migration decision.
    pub reported_cpu: f64,
    pub reported_mem: f64,
    pub last_report: Option<DateTime<Utc>>,
}

impl Controller {
    pub fn new(id: impl Into<String>, capacity: CapacityVector, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            capacity,
            cpu_util: 0.0,
            mem_util: 0.0,
            bw_util: 0.0,
            load_percentage: 0.0,
            level: SaturationLevel::Idle,
            active: true,
            reported_cpu: 0.0,
            reported_mem: 0.0,
            last_report: None,
        }
    }

    /// Write per-resource utilizations, clamped into [0,1].
    pub fn set_utilization(&mut self, cpu: f64, mem: f64, bw: f64) {
        self.cpu_util = cpu.clamp(0.0, 1.0);
        self.mem_util = mem.clamp(0.0, 1.0);
        self.bw_util = bw.clamp(0.0, 1.0);
    }

    /// Write the composite load, clamped into [0,100].
    pub fn set_load_percentage(&mut self, load: f64) {
        self.load_percentage = load.clamp(0.0, 100.0);
    }

    /// Record the observational process metrics from a telemetry report.
    pub fn record_report(&mut self, cpu: f64, mem: f64, at: DateTime<Utc>) {
        self.reported_cpu = cpu.max(0.0);
        self.reported_mem = mem.max(0.0);
        self.last_report = Some(at);
    }
}

/// A managed data-plane element. Owned by exactly one controller at any
/// instant; ownership changes only through the state store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Switch {
    /// Stable string id (`s1`, `s2`, ...).
    pub id: String,
    /// Numeric datapath id used on the telemetry wire.
    pub dpid: u64,
    pub x: f64,
    pub y: f64,
    /// Id of the owning controller.
    pub controller_id: String,

    /// Packet-in requests per second over the last telemetry window.
    pub packet_in_rate: f64,
    /// Projected per-resource consumption on the current owner.
    pub load_cpu: f64,
    pub load_mem: f64,
    pub load_bw: f64,
}

impl Switch {
    pub fn new(
        id: impl Into<String>,
        dpid: u64,
        controller_id: impl Into<String>,
        x: f64,
        y: f64,
    ) -> Self {
        Self {
            id: id.into(),
            dpid,
            x,
            y,
            controller_id: controller_id.into(),
            packet_in_rate: 0.0,
            load_cpu: 0.0,
            load_mem: 0.0,
            load_bw: 0.0,
        }
    }

    /// Record a new packet-in rate and project the per-resource loads from
    /// it. Negative rates are clamped to zero.
    pub fn apply_rate(&mut self, rate: f64, factors: &ConversionFactors) {
        let rate = rate.max(0.0);
        self.packet_in_rate = rate;
        self.load_cpu = rate * factors.cpu;
        self.load_mem = rate * factors.mem;
        self.load_bw = rate * factors.bw;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capacity() -> CapacityVector {
        CapacityVector {
            cpu: 2000.0,
            mem: 4096.0,
            bw: 1000.0,
        }
    }

    #[test]
    fn utilization_setter_clamps() {
        let mut ctrl = Controller::new("c1", capacity(), 0.0, 0.0);
        ctrl.set_utilization(1.7, -0.2, 0.5);
        assert_eq!(ctrl.cpu_util, 1.0);
        assert_eq!(ctrl.mem_util, 0.0);
        assert_eq!(ctrl.bw_util, 0.5);

        ctrl.set_load_percentage(140.0);
        assert_eq!(ctrl.load_percentage, 100.0);
    }

    #[test]
    fn rate_projection_uses_factors() {
        let mut sw = Switch::new("s1", 1, "c1", 0.0, 0.0);
        let factors = ConversionFactors {
            cpu: 1.5,
            mem: 0.4,
            bw: 0.25,
        };
        sw.apply_rate(30.0, &factors);
        assert_eq!(sw.packet_in_rate, 30.0);
        assert_eq!(sw.load_cpu, 45.0);
        assert_eq!(sw.load_mem, 12.0);
        assert_eq!(sw.load_bw, 7.5);

        sw.apply_rate(-5.0, &factors);
        assert_eq!(sw.packet_in_rate, 0.0);
        assert_eq!(sw.load_cpu, 0.0);
    }
}
