//! Controller saturation levels

use serde::{Deserialize, Serialize};

/// Discrete saturation level of a controller, derived from its composite
/// load percentage against the fixed thresholds (25 / 50 / 75).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SaturationLevel {
    Idle,
    Normal,
    High,
    Overload,
}

impl SaturationLevel {
    /// Numeric rank used by the dashboard (0 = IDLE .. 3 = OVERLOAD).
    pub fn value(self) -> u8 {
        match self {
            SaturationLevel::Idle => 0,
            SaturationLevel::Normal => 1,
            SaturationLevel::High => 2,
            SaturationLevel::Overload => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SaturationLevel::Idle => "IDLE",
            SaturationLevel::Normal => "NORMAL",
            SaturationLevel::High => "HIGH",
            SaturationLevel::Overload => "OVERLOAD",
        }
    }

    /// Display color for topology rendering.
    pub fn color(self) -> &'static str {
        match self {
            SaturationLevel::Idle => "#9e9e9e",
            SaturationLevel::Normal => "#4caf50",
            SaturationLevel::High => "#ff9800",
            SaturationLevel::Overload => "#f44336",
        }
    }

    /// A controller in HIGH or OVERLOAD is a migration source candidate.
    pub fn is_overloaded(self) -> bool {
        matches!(self, SaturationLevel::High | SaturationLevel::Overload)
    }

    /// A controller in IDLE or NORMAL can accept migrated switches.
    pub fn is_underloaded(self) -> bool {
        matches!(self, SaturationLevel::Idle | SaturationLevel::Normal)
    }
}

impl Default for SaturationLevel {
    fn default() -> Self {
        SaturationLevel::Idle
    }
}

impl std::fmt::Display for SaturationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
