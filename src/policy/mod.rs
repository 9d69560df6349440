//! Connection policy engine: event queue, inbound handle, and decision logic.

mod engine;

pub use engine::PolicyEngine;

use crate::types::{ConnectionState, PeerAddress, ProfileKind, ServiceId};
use tokio::sync::mpsc;
use tracing::warn;

/// Typed events consumed by the single engine worker, strictly in arrival
/// order. Timer variants are re-injected by the engine's own sleep tasks so
/// they serialize with ordinary events.
#[derive(Debug, Clone)]
pub enum PolicyEvent {
    /// The shared link reached the fully-usable on state
    LinkTurnedOn,
    /// Service discovery completed for a peer
    ServiceDiscovered {
        peer: PeerAddress,
        services: Vec<ServiceId>,
    },
    /// A profile connection changed state
    ProfileStateChanged {
        peer: PeerAddress,
        kind: ProfileKind,
        prev: ConnectionState,
        next: ConnectionState,
    },
    /// Link-up debounce elapsed; run the auto-connect sequence
    AutoConnectTimer,
    /// Follow-on delay elapsed for a queued peer
    FollowOnTimer { peer: PeerAddress },
}

/// Cloneable inbound surface for the event source. All methods are
/// fire-and-forget; delivery failure only means the engine has stopped.
#[derive(Clone)]
pub struct PolicyHandle {
    tx: mpsc::UnboundedSender<PolicyEvent>,
}

impl PolicyHandle {
    pub(crate) fn new(tx: mpsc::UnboundedSender<PolicyEvent>) -> Self {
        Self { tx }
    }

    /// Report that the link transitioned to on
    pub fn link_turned_on(&self) {
        self.send(PolicyEvent::LinkTurnedOn);
    }

    /// Report completed service discovery for a peer
    pub fn service_discovered(&self, peer: PeerAddress, services: Vec<ServiceId>) {
        self.send(PolicyEvent::ServiceDiscovered { peer, services });
    }

    /// Report a profile connection-state transition
    pub fn profile_state_changed(
        &self,
        peer: PeerAddress,
        kind: ProfileKind,
        prev: ConnectionState,
        next: ConnectionState,
    ) {
        self.send(PolicyEvent::ProfileStateChanged {
            peer,
            kind,
            prev,
            next,
        });
    }

    fn send(&self, event: PolicyEvent) {
        if self.tx.send(event).is_err() {
            warn!("policy engine is not running, dropping event");
        }
    }
}
