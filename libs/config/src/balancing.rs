//! Fixed constants of the balancing algorithm
//!
//! Every tunable of the load model, planner, and topology generator lives
//! here so the numbers are written exactly once.

use types::ConversionFactors;

/// Weight of the cpu component in the composite load. The three weights
/// sum to 1.
pub const WEIGHT_CPU: f64 = 0.4;
pub const WEIGHT_MEM: f64 = 0.3;
pub const WEIGHT_BW: f64 = 0.3;

/// Composite load below this is IDLE.
pub const LEVEL_IDLE_MAX: f64 = 25.0;
/// Composite load below this (and at least [`LEVEL_IDLE_MAX`]) is NORMAL.
pub const LEVEL_NORMAL_MAX: f64 = 50.0;
/// Composite load below this is HIGH; at or above it is OVERLOAD. Also the
/// planner's safety ceiling: a migration may not push the predicted target
/// load to this value or beyond.
pub const LEVEL_HIGH_MAX: f64 = 75.0;

/// Factors projecting a packet-in rate (req/s) onto cpu/mem/bw consumption.
pub const CONVERSION: ConversionFactors = ConversionFactors {
    cpu: 1.5,
    mem: 0.4,
    bw: 0.25,
};

/// Added to a switch's resource usage when pricing a migration, so idle
/// switches never cost exactly zero.
pub const COST_EPSILON: f64 = 1e-3;

/// Minimum pair-wise imbalance reduction for a candidate to be feasible.
pub const MIN_IMBALANCE_DELTA: f64 = 1e-3;

/// Pair-wise imbalance is defined as zero when the larger of the two loads
/// does not exceed this floor.
pub const IMBALANCE_FLOOR: f64 = 0.01;

/// Switch-to-controller Euclidean distances are divided by this before
/// entering the cost function. Strictly exceeds the layout diagonal, so
/// normalized distances stay in [0,1].
pub const DISTANCE_NORMALIZER: f64 = 1000.0;

/// Layout rectangle the topology generator scales positions into.
pub const LAYOUT_X_MIN: f64 = 100.0;
pub const LAYOUT_X_MAX: f64 = 900.0;
pub const LAYOUT_Y_MIN: f64 = 100.0;
pub const LAYOUT_Y_MAX: f64 = 500.0;

/// Seed for all deterministic generation (graph, layout, simulator default).
pub const GENERATOR_SEED: u64 = 42;

/// Capacity of the snapshot time-series ring.
pub const TIMESERIES_CAPACITY: usize = 120;

/// Migration history cap; the oldest records are dropped beyond this.
pub const HISTORY_CAP: usize = 100_000;

/// Clamp bounds for the control-loop speed multiplier. The polling
/// interval is `1 / speed`, so the interval stays within [0.1s, 10s].
pub const SPEED_MIN: f64 = 0.1;
pub const SPEED_MAX: f64 = 10.0;

/// Upper bound on one actuator invocation.
pub const ACTUATOR_TIMEOUT_SECS: u64 = 10;

/// Clamp bounds for the traffic simulator's intensity multiplier.
pub const INTENSITY_MIN: f64 = 0.1;
pub const INTENSITY_MAX: f64 = 5.0;
