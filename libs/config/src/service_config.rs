//! Service Configuration Module
//!
//! Provides configuration loading for the balancer service. Supports TOML
//! files with `SDNLB_`-prefixed environment variable overrides (e.g.
//! `SDNLB_TOPOLOGY=germany50`).

use anyhow::{bail, Context, Result};
use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::balancing::{INTENSITY_MAX, INTENSITY_MIN, SPEED_MAX, SPEED_MIN};

/// Main service configuration structure.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ServiceConfig {
    /// HTTP/WebSocket bind address.
    pub bind_address: String,

    /// HTTP/WebSocket port.
    pub port: u16,

    /// Initial topology name (`SDNLB_TOPOLOGY` overrides).
    pub topology: String,

    /// Control-loop speed multiplier; polling interval is `1 / speed`.
    pub speed: f64,

    /// Whether the control loop migrates on its own each tick.
    pub auto_migration: bool,

    /// Enable CORS on the REST surface (the dashboard is served elsewhere).
    pub enable_cors: bool,

    /// Maximum concurrent WebSocket connections.
    pub max_connections: usize,

    /// Embedded traffic simulator settings.
    pub simulator: SimulatorConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct SimulatorConfig {
    /// When enabled the control loop drives synthetic traffic instead of
    /// waiting for live telemetry.
    pub enabled: bool,

    /// Traffic pattern: uniform | hotspot | burst | wave | stress.
    pub pattern: String,

    /// Global intensity multiplier, clamped to [0.1, 5.0].
    pub intensity: f64,

    /// Seed for the simulator's jitter.
    pub seed: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 5000,
            topology: "atlanta".to_string(),
            speed: 1.0,
            auto_migration: true,
            enable_cors: true,
            max_connections: 1000,
            simulator: SimulatorConfig::default(),
        }
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            pattern: "wave".to_string(),
            intensity: 1.0,
            seed: crate::balancing::GENERATOR_SEED,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from an optional TOML file with environment
    /// overrides applied on top.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            info!("Loading configuration file: {:?}", path);
            builder = builder.add_source(File::from(path).required(true));
        }

        // Override with environment variables (SDNLB_ prefix)
        builder = builder.add_source(
            Environment::with_prefix("SDNLB")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        let config: ServiceConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values the REST surface would also reject.
    pub fn validate(&self) -> Result<()> {
        if !(SPEED_MIN..=SPEED_MAX).contains(&self.speed) {
            bail!(
                "speed {} out of range [{}, {}]",
                self.speed,
                SPEED_MIN,
                SPEED_MAX
            );
        }
        if !(INTENSITY_MIN..=INTENSITY_MAX).contains(&self.simulator.intensity) {
            bail!(
                "simulator intensity {} out of range [{}, {}]",
                self.simulator.intensity,
                INTENSITY_MIN,
                INTENSITY_MAX
            );
        }
        Ok(())
    }
}

/// Convenience function to load configuration with defaults.
pub fn load_config(path: Option<&Path>) -> Result<ServiceConfig> {
    ServiceConfig::load(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.topology, "atlanta");
        assert_eq!(config.port, 5000);
        assert!(config.auto_migration);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_toml_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("balancer.toml");

        let config_content = r#"
topology = "germany50"
port = 8080
speed = 2.0

[simulator]
enabled = false
pattern = "hotspot"
"#;

        fs::write(&config_path, config_content).unwrap();

        let config = ServiceConfig::load(Some(&config_path)).unwrap();

        assert_eq!(config.topology, "germany50");
        assert_eq!(config.port, 8080);
        assert_eq!(config.speed, 2.0);
        assert!(!config.simulator.enabled);
        assert_eq!(config.simulator.pattern, "hotspot");
        // Untouched fields keep their defaults
        assert_eq!(config.bind_address, "0.0.0.0");
    }

    #[test]
    fn test_speed_out_of_range_rejected() {
        let config = ServiceConfig {
            speed: 50.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
