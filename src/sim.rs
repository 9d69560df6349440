//! In-memory doubles for the engine's collaborators.
//!
//! These back the engine tests and the demo binary, so the whole policy
//! loop can run without a radio stack underneath it.

use crate::traits::{LinkMonitor, PriorityStore, ProfileConnector};
use crate::types::{ConnectionState, PeerAddress, Priority, ProfileKind};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Priority store backed by a hash map
#[derive(Default)]
pub struct MemoryPriorityStore {
    priorities: Mutex<HashMap<(PeerAddress, ProfileKind), Priority>>,
    bonded: Mutex<Vec<PeerAddress>>,
    rejecting: Mutex<bool>,
}

impl MemoryPriorityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a peer to the bonded set
    pub async fn bond(&self, peer: PeerAddress) {
        let mut bonded = self.bonded.lock().await;
        if !bonded.contains(&peer) {
            bonded.push(peer);
        }
    }

    /// Seed a priority directly, bypassing the store contract
    pub async fn seed(&self, peer: PeerAddress, kind: ProfileKind, priority: Priority) {
        self.priorities.lock().await.insert((peer, kind), priority);
    }

    /// Read a priority for assertions
    pub async fn priority(&self, peer: PeerAddress, kind: ProfileKind) -> Priority {
        self.get_priority(peer, kind).await
    }

    /// When true, every `set_priority` reports rejection
    pub async fn set_rejecting(&self, rejecting: bool) {
        *self.rejecting.lock().await = rejecting;
    }
}

#[async_trait]
impl PriorityStore for MemoryPriorityStore {
    async fn get_priority(&self, peer: PeerAddress, kind: ProfileKind) -> Priority {
        self.priorities
            .lock()
            .await
            .get(&(peer, kind))
            .copied()
            .unwrap_or(Priority::Undefined)
    }

    async fn set_priority(
        &self,
        peer: PeerAddress,
        kind: ProfileKind,
        priority: Priority,
    ) -> bool {
        if *self.rejecting.lock().await {
            return false;
        }
        self.priorities.lock().await.insert((peer, kind), priority);
        true
    }

    async fn bonded_peers(&self) -> Vec<PeerAddress> {
        self.bonded.lock().await.clone()
    }
}

/// Connector double: reports a scripted connected set and records every
/// connect the engine issues.
#[derive(Default)]
pub struct SimConnector {
    connected: Mutex<Vec<PeerAddress>>,
    state_overrides: Mutex<HashMap<PeerAddress, ConnectionState>>,
    connects: Mutex<Vec<PeerAddress>>,
    fail_connects: Mutex<bool>,
}

impl SimConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the connected-peer list; members report `Connected`
    pub async fn set_connected(&self, peers: &[PeerAddress]) {
        *self.connected.lock().await = peers.to_vec();
    }

    /// Force a specific state for a peer (e.g. `Connecting`)
    pub async fn set_state(&self, peer: PeerAddress, state: ConnectionState) {
        self.state_overrides.lock().await.insert(peer, state);
    }

    /// When true, `connect` returns an error
    pub async fn set_fail_connects(&self, fail: bool) {
        *self.fail_connects.lock().await = fail;
    }

    /// Every connect issued so far, in order
    pub async fn issued_connects(&self) -> Vec<PeerAddress> {
        self.connects.lock().await.clone()
    }
}

#[async_trait]
impl ProfileConnector for SimConnector {
    async fn connect(&self, peer: PeerAddress) -> Result<()> {
        if *self.fail_connects.lock().await {
            return Err(anyhow!("simulated connect failure for {peer}"));
        }
        self.connects.lock().await.push(peer);
        Ok(())
    }

    async fn connection_state(&self, peer: PeerAddress) -> ConnectionState {
        if self.connected.lock().await.contains(&peer) {
            return ConnectionState::Connected;
        }
        self.state_overrides
            .lock()
            .await
            .get(&peer)
            .copied()
            .unwrap_or(ConnectionState::Disconnected)
    }

    async fn connected_peers(&self) -> Vec<PeerAddress> {
        self.connected.lock().await.clone()
    }
}

/// Link monitor double: link on, quiet mode off, not discovering by default
pub struct SimLink {
    link_on: Mutex<bool>,
    quiet_mode: Mutex<bool>,
    discovering: Mutex<bool>,
    cancellations: Mutex<usize>,
}

impl SimLink {
    pub fn new() -> Self {
        Self {
            link_on: Mutex::new(true),
            quiet_mode: Mutex::new(false),
            discovering: Mutex::new(false),
            cancellations: Mutex::new(0),
        }
    }

    pub async fn set_link_on(&self, on: bool) {
        *self.link_on.lock().await = on;
    }

    pub async fn set_quiet_mode(&self, quiet: bool) {
        *self.quiet_mode.lock().await = quiet;
    }

    pub async fn set_discovering(&self, discovering: bool) {
        *self.discovering.lock().await = discovering;
    }

    /// How many times discovery was cancelled
    pub async fn discovery_cancellations(&self) -> usize {
        *self.cancellations.lock().await
    }
}

impl Default for SimLink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LinkMonitor for SimLink {
    async fn is_link_on(&self) -> bool {
        *self.link_on.lock().await
    }

    async fn is_quiet_mode(&self) -> bool {
        *self.quiet_mode.lock().await
    }

    async fn is_discovering(&self) -> bool {
        *self.discovering.lock().await
    }

    async fn cancel_discovery(&self) {
        *self.cancellations.lock().await += 1;
        *self.discovering.lock().await = false;
    }
}
