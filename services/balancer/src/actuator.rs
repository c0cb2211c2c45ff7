//! Migration actuator seam
//!
//! The physical re-homing of a switch (e.g. pointing it at a different
//! controller endpoint) is an external mechanism. The engine only depends
//! on this narrow interface; implementations are swapped at wiring time.

use async_trait::async_trait;
use tracing::info;

use crate::error::Result;

/// Performs the physical re-homing of one switch.
#[async_trait]
pub trait MigrationActuator: Send + Sync {
    /// Move `switch_id` from `source_id` to `target_id`. An `Err` (or a
    /// timeout enforced by the caller) leaves engine state untouched.
    async fn migrate(&self, switch_id: &str, source_id: &str, target_id: &str) -> Result<()>;
}

/// Default actuator: records the command and reports success. Stands in
/// for the external reassignment mechanism in simulation deployments.
#[derive(Debug, Default, Clone)]
pub struct LoggingActuator;

#[async_trait]
impl MigrationActuator for LoggingActuator {
    async fn migrate(&self, switch_id: &str, source_id: &str, target_id: &str) -> Result<()> {
        info!(
            switch_id = %switch_id,
            source_id = %source_id,
            target_id = %target_id,
            "actuating switch migration"
        );
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::error::BalancerError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Test double that fails every call and counts invocations.
    #[derive(Debug, Default)]
    pub struct FailingActuator {
        pub calls: AtomicUsize,
    }

    #[async_trait]
    impl MigrationActuator for FailingActuator {
        async fn migrate(&self, _switch_id: &str, _source_id: &str, _target_id: &str) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(BalancerError::ActuatorFailed {
                message: "injected failure".to_string(),
            })
        }
    }
}
