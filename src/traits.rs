//! Collaborator trait seams for the policy engine.
//!
//! The engine is constructed with exactly the store, link monitor, and
//! connectors it needs, so each can be substituted with a test double.
//! Implementations must return promptly: the engine runs on a single
//! worker and a blocked call delays all subsequent event processing.

use crate::types::{ConnectionState, PeerAddress, Priority, ProfileKind};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Persisted per (peer, profile) priority values and the bonded-peer set
#[async_trait]
pub trait PriorityStore: Send + Sync {
    async fn get_priority(&self, peer: PeerAddress, kind: ProfileKind) -> Priority;

    /// Returns false when the store rejects the value; the engine logs and
    /// keeps going, leaving the stored value authoritative.
    async fn set_priority(&self, peer: PeerAddress, kind: ProfileKind, priority: Priority)
        -> bool;

    async fn bonded_peers(&self) -> Vec<PeerAddress>;
}

/// One native profile implementation (audio, handsfree, network)
#[async_trait]
pub trait ProfileConnector: Send + Sync {
    /// Fire-and-forget connect; completion is observed later through a
    /// profile-state-changed event, never through this return value.
    async fn connect(&self, peer: PeerAddress) -> Result<()>;

    async fn connection_state(&self, peer: PeerAddress) -> ConnectionState;

    async fn connected_peers(&self) -> Vec<PeerAddress>;
}

/// State of the shared radio link and its discovery process
#[async_trait]
pub trait LinkMonitor: Send + Sync {
    /// True when the link is fully usable, not merely low-energy-only
    async fn is_link_on(&self) -> bool;

    /// True while auto-connects are suppressed (e.g. setup flows)
    async fn is_quiet_mode(&self) -> bool;

    async fn is_discovering(&self) -> bool;

    async fn cancel_discovery(&self);
}

/// The per-profile connector handles the engine was built with. `None`
/// means the profile is not running on this build; every operation on it
/// degrades to a silent no-op.
#[derive(Default, Clone)]
pub struct Connectors {
    pub handsfree: Option<Arc<dyn ProfileConnector>>,
    pub audio_sink: Option<Arc<dyn ProfileConnector>>,
    pub audio_source: Option<Arc<dyn ProfileConnector>>,
    pub network_access: Option<Arc<dyn ProfileConnector>>,
}

impl Connectors {
    pub fn get(&self, kind: ProfileKind) -> Option<&Arc<dyn ProfileConnector>> {
        match kind {
            ProfileKind::Handsfree => self.handsfree.as_ref(),
            ProfileKind::AudioSink => self.audio_sink.as_ref(),
            ProfileKind::AudioSource => self.audio_source.as_ref(),
            ProfileKind::NetworkAccess => self.network_access.as_ref(),
        }
    }
}
