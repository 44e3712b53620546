//! Process-wide mapping from tunnel id to live [`Tunnel`].
//!
//! A single reader-writer lock guards the map (`spec.md` §4.4): lookups
//! are read-locked, registration/deregistration/shutdown are write-locked.
//! Holders of a `Tunnel` handle must not assume it stays live — all
//! `Tunnel` operations are resilient to `done` firing concurrently.

use std::collections::HashMap;
use std::sync::Arc;

use hookshot_protocol::Envelope;
use tokio::sync::{mpsc, RwLock};
use tracing::info;
use uuid::Uuid;

use crate::store::RequestStore;
use crate::tunnel::Tunnel;

pub struct TunnelRegistry {
    tunnels: RwLock<HashMap<String, Arc<Tunnel>>>,
    pub store: RequestStore,
}

impl TunnelRegistry {
    pub fn new(max_requests: usize) -> Arc<Self> {
        Arc::new(Self {
            tunnels: RwLock::new(HashMap::new()),
            store: RequestStore::new(max_requests),
        })
    }

    /// A fresh, full-entropy (128 bit) identifier, rendered as 32 lowercase
    /// hex characters (no hyphens, so [`Tunnel::short_id`] can simply slice
    /// the first 8).
    fn generate_id() -> String {
        Uuid::new_v4().simple().to_string()
    }

    /// Register a new tunnel. `requested_id` is accepted for protocol
    /// compatibility and discarded (§9) — the registry always assigns its
    /// own identifier.
    pub async fn register(&self, _requested_id: Option<String>) -> (Arc<Tunnel>, mpsc::Receiver<Envelope>) {
        let id = Self::generate_id();
        let (tunnel, outbound_rx) = Tunnel::new(id.clone());
        let tunnel = Arc::new(tunnel);
        self.tunnels.write().await.insert(id, tunnel.clone());
        (tunnel, outbound_rx)
    }

    pub async fn get(&self, id: &str) -> Option<Arc<Tunnel>> {
        self.tunnels.read().await.get(id).cloned()
    }

    /// Fire the tunnel's done signal (once) and remove the registry
    /// entry. Does *not* close the outbound queue — the writer drains and
    /// exits on done (`spec.md` §9 "queue-close discipline").
    pub async fn unregister(&self, id: &str) {
        let removed = self.tunnels.write().await.remove(id);
        if let Some(tunnel) = removed {
            tunnel.close();
            info!(tunnel = tunnel.short_id(), "tunnel deregistered");
        }
    }

    /// Fire done on every tunnel and empty the map. Called during
    /// graceful shutdown.
    pub async fn close_all(&self) {
        let mut tunnels = self.tunnels.write().await;
        for (_, tunnel) in tunnels.drain() {
            tunnel.close();
        }
    }

    pub async fn len(&self) -> usize {
        self.tunnels.read().await.len()
    }
}
