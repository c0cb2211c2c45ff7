//! WebSocket client registry
//!
//! Tracks the per-client push channels for the dashboard boundary. The
//! manager owns the whole client lifecycle: registration creates the
//! channel and delivers the greeting before any tick update can be
//! observed, broadcast fans a [`PushMessage`] out to every registered
//! sender, and senders whose receiving connection has gone away are pruned
//! on the next broadcast.

use std::collections::HashMap;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use types::PushMessage;

use crate::error::{BalancerError, Result};

/// Registry of connected dashboard clients, keyed by connection id.
pub struct ClientManager {
    senders: RwLock<HashMap<Uuid, mpsc::UnboundedSender<PushMessage>>>,
    max_connections: usize,
}

impl ClientManager {
    pub fn new(max_connections: usize) -> Self {
        Self {
            senders: RwLock::new(HashMap::new()),
            max_connections,
        }
    }

    /// Register a new connection: allocate its channel, queue the greeting
    /// so it precedes any broadcast, and hand back the connection id plus
    /// the receiving end for the socket pump. Fails when the connection
    /// cap is reached.
    pub async fn register(
        &self,
        greeting: PushMessage,
    ) -> Result<(Uuid, mpsc::UnboundedReceiver<PushMessage>)> {
        let mut senders = self.senders.write().await;

        if senders.len() >= self.max_connections {
            return Err(BalancerError::ConnectionLimit {
                max: self.max_connections,
            });
        }

        let (tx, rx) = mpsc::unbounded_channel();
        // The receiver is not pumped yet, so this cannot fail
        let _ = tx.send(greeting);

        let client_id = Uuid::new_v4();
        senders.insert(client_id, tx);
        info!(client_id = %client_id, total = senders.len(), "client connected");
        Ok((client_id, rx))
    }

    /// Drop a connection's sender; the socket pump calls this on close.
    pub async fn unregister(&self, client_id: Uuid) {
        let mut senders = self.senders.write().await;
        if senders.remove(&client_id).is_some() {
            info!(client_id = %client_id, total = senders.len(), "client disconnected");
        }
    }

    /// Fan a push message out to every client, pruning any whose channel
    /// has closed.
    pub async fn broadcast(&self, message: PushMessage) {
        let senders = self.senders.read().await;
        let mut closed = Vec::new();

        for (client_id, sender) in senders.iter() {
            if sender.send(message.clone()).is_err() {
                closed.push(*client_id);
            }
        }

        drop(senders);

        if !closed.is_empty() {
            let mut senders = self.senders.write().await;
            for client_id in closed {
                senders.remove(&client_id);
                debug!(client_id = %client_id, "pruned disconnected client");
            }
        }
    }

    pub async fn client_count(&self) -> usize {
        self.senders.read().await.len()
    }
}
