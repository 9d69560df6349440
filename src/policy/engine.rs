//! Decision logic: link-up auto-connect, cross-profile follow-on, and
//! auto-connect priority promotion.
//!
//! The engine should stay as decoupled from the native stack as possible:
//! it only reads link and profile state through the collaborator traits and
//! issues connects back through them. All state lives on one worker task,
//! so no event is ever processed concurrently with another.

use super::{PolicyEvent, PolicyHandle};
use crate::config::PolicyConfig;
use crate::traits::{Connectors, LinkMonitor, PriorityStore, ProfileConnector};
use crate::types::{ConnectionState, PeerAddress, Priority, ProfileKind, ServiceId};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// The connection policy engine. Constructed with its collaborators, then
/// driven by [`run`](PolicyEngine::run) on a dedicated task; the returned
/// [`PolicyHandle`] is the only way in.
pub struct PolicyEngine {
    store: Arc<dyn PriorityStore>,
    link: Arc<dyn LinkMonitor>,
    connectors: Connectors,
    config: PolicyConfig,
    events: mpsc::UnboundedReceiver<PolicyEvent>,
    /// Sender handed to timer tasks so their firings queue as ordinary events
    timer_tx: mpsc::UnboundedSender<PolicyEvent>,
    /// Peers with a follow-on timer in flight; re-queueing is a no-op
    queued_follow_on: HashSet<PeerAddress>,
    /// True while a link-up debounce timer is in flight
    auto_connect_pending: bool,
}

impl PolicyEngine {
    pub fn new(
        store: Arc<dyn PriorityStore>,
        link: Arc<dyn LinkMonitor>,
        connectors: Connectors,
        config: PolicyConfig,
    ) -> (Self, PolicyHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = PolicyHandle::new(tx.clone());
        let engine = Self {
            store,
            link,
            connectors,
            config,
            events: rx,
            timer_tx: tx,
            queued_follow_on: HashSet::new(),
            auto_connect_pending: false,
        };
        (engine, handle)
    }

    /// Consume and process events one at a time, in arrival order
    pub async fn run(mut self) {
        while let Some(event) = self.events.recv().await {
            self.handle_event(event).await;
        }
    }

    async fn handle_event(&mut self, event: PolicyEvent) {
        match event {
            PolicyEvent::LinkTurnedOn => self.schedule_auto_connect().await,
            PolicyEvent::ServiceDiscovered { peer, services } => {
                self.init_profile_priorities(peer, &services).await;
            }
            PolicyEvent::ProfileStateChanged {
                peer,
                kind,
                prev,
                next,
            } => self.process_profile_state_changed(peer, kind, prev, next).await,
            PolicyEvent::AutoConnectTimer => {
                self.auto_connect_pending = false;
                self.auto_connect_profiles().await;
            }
            PolicyEvent::FollowOnTimer { peer } => self.connect_other_profiles(peer).await,
        }
    }

    // Auto-connect is debounced so every profile client is up and running
    // before the first connect goes out.
    async fn schedule_auto_connect(&mut self) {
        if self.auto_connect_pending {
            debug!("auto-connect already scheduled");
            return;
        }
        if self.link.is_quiet_mode().await {
            debug!("quiet mode enabled, not scheduling auto-connect");
            return;
        }
        debug!(delay = ?self.config.link_up_debounce, "scheduling auto-connect");
        self.auto_connect_pending = true;
        let tx = self.timer_tx.clone();
        let delay = self.config.link_up_debounce;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(PolicyEvent::AutoConnectTimer);
        });
    }

    async fn auto_connect_profiles(&self) {
        if !self.link.is_link_on().await {
            error!("link is not on, exiting auto-connect");
            return;
        }
        if self.link.is_quiet_mode().await {
            debug!("link is in quiet mode, not initiating auto-connects");
            return;
        }
        debug!("initiating auto-connects on link up");
        for kind in ProfileKind::PHONE_PROFILES {
            self.auto_connect_profile(kind).await;
        }
    }

    async fn auto_connect_profile(&self, kind: ProfileKind) {
        let Some(connector) = self.connectors.get(kind) else {
            error!(%kind, "auto-connect: connector unavailable");
            return;
        };
        for peer in self.store.bonded_peers().await {
            debug!(%peer, %kind, "auto-connect: considering peer");
            if self.store.get_priority(peer, kind).await == Priority::AutoConnect {
                self.cancel_discovery_for_auto_connect().await;
                info!(%peer, %kind, "auto-connecting");
                if let Err(e) = connector.connect(peer).await {
                    warn!(%peer, %kind, "auto-connect failed: {e:#}");
                }
            }
        }
    }

    async fn cancel_discovery_for_auto_connect(&self) {
        if self.link.is_discovering().await {
            self.link.cancel_discovery().await;
        }
    }

    // Set priorities only for profiles actually discovered on the remote,
    // so auto-connect never chases profiles the peer does not support.
    // Never overrides a priority someone already decided on.
    async fn init_profile_priorities(&self, peer: PeerAddress, services: &[ServiceId]) {
        debug!(%peer, "service discovery complete, initializing priorities");
        for kind in ProfileKind::ALL {
            if kind == ProfileKind::NetworkAccess && !self.config.network_autoconnect_enabled {
                continue;
            }
            if self.connectors.get(kind).is_none() {
                continue;
            }
            let supported = kind.service_ids().iter().any(|id| services.contains(id));
            if supported && self.store.get_priority(peer, kind).await == Priority::Undefined {
                debug!(%peer, %kind, "initializing priority to on");
                if !self.store.set_priority(peer, kind, Priority::On).await {
                    warn!(%peer, %kind, "priority store rejected write");
                }
            }
        }
    }

    async fn process_profile_state_changed(
        &mut self,
        peer: PeerAddress,
        kind: ProfileKind,
        prev: ConnectionState,
        next: ConnectionState,
    ) {
        debug!(%peer, %kind, ?prev, ?next, "profile state changed");
        if next == ConnectionState::Connected && kind.is_phone_profile() {
            self.queue_follow_on(peer).await;
            self.promote_auto_connect(peer, kind).await;
        }
    }

    // A freshly connected profile means the peer is receptive; after a
    // peer-class-dependent delay, try to bring up the remaining profiles.
    async fn queue_follow_on(&mut self, peer: PeerAddress) {
        if self.link.is_quiet_mode().await {
            debug!(%peer, "quiet mode enabled, not queueing follow-on");
            return;
        }
        if !self.queued_follow_on.insert(peer) {
            debug!(%peer, "follow-on already queued");
            return;
        }
        let delay = self.config.follow_on_delay_for(&peer);
        debug!(%peer, ?delay, "queueing follow-on check");
        let tx = self.timer_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(PolicyEvent::FollowOnTimer { peer });
        });
    }

    // Promote the newly connected peer to auto-connect for this profile,
    // first demoting any other bonded peer holding auto-connect that is not
    // currently connected on it. Keeps at most one auto-connect peer per
    // profile under normal operation.
    async fn promote_auto_connect(&self, peer: PeerAddress, kind: ProfileKind) {
        let Some(connector) = self.connectors.get(kind) else {
            warn!(%peer, %kind, "promotion: connector unavailable");
            return;
        };
        if self.store.get_priority(peer, kind).await == Priority::AutoConnect {
            debug!(%peer, %kind, "already auto-connect, nothing to promote");
            return;
        }
        let connected = connector.connected_peers().await;
        for other in self.store.bonded_peers().await {
            if self.store.get_priority(other, kind).await >= Priority::AutoConnect
                && !connected.contains(&other)
            {
                debug!(%other, %kind, "demoting previous auto-connect peer");
                if !self.store.set_priority(other, kind, Priority::On).await {
                    warn!(%other, %kind, "priority store rejected demotion");
                }
            }
        }
        info!(%peer, %kind, "promoting to auto-connect");
        if !self.store.set_priority(peer, kind, Priority::AutoConnect).await {
            warn!(%peer, %kind, "priority store rejected promotion");
        }
    }

    // The delayed follow-on check. Connect failures here are not retried;
    // the next qualifying state-changed event re-evaluates from scratch.
    async fn connect_other_profiles(&mut self, peer: PeerAddress) {
        debug!(%peer, "running follow-on check");
        self.queued_follow_on.remove(&peer);

        if !self.link.is_link_on().await {
            warn!(%peer, "link is not on, aborting follow-on");
            return;
        }

        let handsfree_connected = self.connected_list(ProfileKind::Handsfree).await;
        let audio_sink_connected = self.connected_list(ProfileKind::AudioSink).await;
        let network_connected = self.connected_list(ProfileKind::NetworkAccess).await;

        if !handsfree_connected.contains(&peer)
            && !audio_sink_connected.contains(&peer)
            && !network_connected.contains(&peer)
        {
            // Connected then disconnected before the timer fired
            debug!(%peer, "all profiles disconnected, nothing to follow on");
            return;
        }

        let peer_on_handsfree = handsfree_connected.contains(&peer);
        let peer_on_audio_sink = audio_sink_connected.contains(&peer);
        debug!(%peer, peer_on_handsfree, peer_on_audio_sink, "follow-on state");

        // Handsfree, gated on the audio-sink side: retry only once audio is
        // up, or when audio-sink is explicitly off and will never come up.
        // The gating between these two branches is deliberately asymmetric.
        if let Some(handsfree) = self.connectors.get(ProfileKind::Handsfree) {
            let priority = self.store.get_priority(peer, ProfileKind::Handsfree).await;
            let sink_priority = self.store.get_priority(peer, ProfileKind::AudioSink).await;
            if !peer_on_handsfree
                && priority >= Priority::On
                && handsfree.connection_state(peer).await == ConnectionState::Disconnected
                && (peer_on_audio_sink || sink_priority == Priority::Off)
            {
                if !handsfree_connected.is_empty() && self.config.max_handsfree_connections == 1 {
                    info!(%peer, "handsfree already connected elsewhere, not exceeding cap");
                    return;
                }
                info!(%peer, "follow-on: retrying handsfree connection");
                if let Err(e) = handsfree.connect(peer).await {
                    warn!(%peer, "handsfree connect failed: {e:#}");
                }
            }
        }

        // Audio-sink, gated on the handsfree side
        if let Some(audio_sink) = self.connectors.get(ProfileKind::AudioSink) {
            let priority = self.store.get_priority(peer, ProfileKind::AudioSink).await;
            let handsfree_priority = self.store.get_priority(peer, ProfileKind::Handsfree).await;
            if !peer_on_audio_sink
                && priority >= Priority::On
                && audio_sink.connection_state(peer).await == ConnectionState::Disconnected
                && (peer_on_handsfree || handsfree_priority == Priority::Off)
            {
                if !audio_sink_connected.is_empty() && self.config.max_audio_sink_connections == 1
                {
                    info!(%peer, "audio-sink already connected elsewhere, not exceeding cap");
                    return;
                }
                info!(%peer, "follow-on: retrying audio-sink connection");
                if let Err(e) = audio_sink.connect(peer).await {
                    warn!(%peer, "audio-sink connect failed: {e:#}");
                }
            }
        }

        // Network access: no cross-profile gating, no cap
        if let Some(network) = self.connectors.get(ProfileKind::NetworkAccess) {
            if network_connected.is_empty()
                && self.store.get_priority(peer, ProfileKind::NetworkAccess).await
                    >= Priority::On
                && network.connection_state(peer).await == ConnectionState::Disconnected
            {
                info!(%peer, "follow-on: retrying network-access connection");
                if let Err(e) = network.connect(peer).await {
                    warn!(%peer, "network-access connect failed: {e:#}");
                }
            }
        }
    }

    async fn connected_list(&self, kind: ProfileKind) -> Vec<PeerAddress> {
        match self.connectors.get(kind) {
            Some(connector) => connector.connected_peers().await,
            None => Vec::new(),
        }
    }
}
