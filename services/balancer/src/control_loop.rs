//! Periodic control-loop driver
//!
//! Sleeps the engine's polling interval between ticks and contains every
//! tick failure: a failed tick is logged and skipped, never fatal. The
//! interval is re-read each iteration so speed changes take effect on the
//! next tick.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};

use crate::engine::Engine;

/// Run ticks until the shutdown signal flips. Cooperative: the signal is
/// checked between sleeps, never mid-tick.
pub async fn run(engine: Arc<Engine>, mut shutdown: watch::Receiver<bool>) {
    info!("control loop started");
    loop {
        let interval = engine.polling_interval();
        tokio::select! {
            _ = tokio::time::sleep(interval) => {
                if let Err(e) = engine.tick().await {
                    error!(error = %e, "tick failed, skipping");
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!("control loop stopping");
                    break;
                }
            }
        }
    }
}
