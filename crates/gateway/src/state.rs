use std::{collections::HashMap, sync::Arc, time::Instant};

use tokio::sync::RwLock;

use {storefront_auth::{Identity, TokenVerifier}, storefront_store::Store};

// ── Presence ─────────────────────────────────────────────────────────────────

/// A WebSocket client currently connected to the gateway.
///
/// Carries the identity decoded at handshake time for the whole lifetime of
/// the connection; disconnect logging reads it from here, not from the token.
#[derive(Debug)]
pub struct PresenceEntry {
    pub conn_id: String,
    pub identity: Identity,
    pub connected_at: Instant,
}

// ── Gateway state ────────────────────────────────────────────────────────────

/// Shared runtime state, wrapped in Arc for use across async tasks.
///
/// The verifier is read-only; the store pool synchronizes itself; only the
/// presence registry needs a lock.
pub struct GatewayState {
    pub verifier: TokenVerifier,
    pub store: Store,
    presence: RwLock<HashMap<String, PresenceEntry>>,
    pub version: String,
}

impl GatewayState {
    pub fn new(verifier: TokenVerifier, store: Store) -> Arc<Self> {
        Arc::new(Self {
            verifier,
            store,
            presence: RwLock::new(HashMap::new()),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }

    /// Register a freshly accepted connection.
    pub async fn register_presence(&self, conn_id: &str, identity: Identity) {
        self.presence.write().await.insert(conn_id.to_string(), PresenceEntry {
            conn_id: conn_id.to_string(),
            identity,
            connected_at: Instant::now(),
        });
    }

    /// Remove a connection by id, returning its entry if it was registered.
    pub async fn remove_presence(&self, conn_id: &str) -> Option<PresenceEntry> {
        self.presence.write().await.remove(conn_id)
    }

    pub async fn presence_count(&self) -> usize {
        self.presence.read().await.len()
    }
}
