//! Engine configuration and the peer-quirk delay table.

use crate::types::{Oui, PeerAddress};
use std::time::Duration;

/// Follow-on delay class derived from a peer's vendor prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayClass {
    Default,
    /// Peers known to drop connections when profiles race; wait longer
    Long,
    /// Peers known to expect the next profile quickly
    Reduced,
}

/// Configuration read by the engine at decision time
#[derive(Debug, Clone)]
pub struct PolicyConfig {
    /// Debounce between link-up and the auto-connect sequence
    pub link_up_debounce: Duration,
    /// Follow-on delay for unmatched peers
    pub follow_on_delay: Duration,
    /// Follow-on delay for peers in the long-delay quirk table
    pub follow_on_delay_long: Duration,
    /// Follow-on delay for peers in the reduced-delay quirk table
    pub follow_on_delay_reduced: Duration,
    /// Maximum simultaneous handsfree connections before follow-on skips
    pub max_handsfree_connections: usize,
    /// Maximum simultaneous audio-sink connections before follow-on skips
    pub max_audio_sink_connections: usize,
    /// Vendor prefixes assigned the long delay class, checked first
    pub long_delay_prefixes: Vec<Oui>,
    /// Vendor prefixes assigned the reduced delay class
    pub reduced_delay_prefixes: Vec<Oui>,
    /// Whether discovery may initialize the network-access priority
    pub network_autoconnect_enabled: bool,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            link_up_debounce: Duration::from_millis(500),
            follow_on_delay: Duration::from_millis(6000),
            follow_on_delay_long: Duration::from_millis(10000),
            follow_on_delay_reduced: Duration::from_millis(2000),
            max_handsfree_connections: 1,
            max_audio_sink_connections: 1,
            // Carkit that drops racing profile connects
            long_delay_prefixes: vec![Oui::new([0x00, 0x23, 0x3D])],
            // Headset that expects the next profile promptly
            reduced_delay_prefixes: vec![Oui::new([0x10, 0x4F, 0xA8])],
            network_autoconnect_enabled: true,
        }
    }
}

impl PolicyConfig {
    /// Classify a peer against the quirk tables, long list first. The two
    /// lists are disjoint; first match wins.
    pub fn delay_class(&self, peer: &PeerAddress) -> DelayClass {
        let oui = peer.oui();
        if self.long_delay_prefixes.contains(&oui) {
            DelayClass::Long
        } else if self.reduced_delay_prefixes.contains(&oui) {
            DelayClass::Reduced
        } else {
            DelayClass::Default
        }
    }

    /// Follow-on delay for a peer, per its delay class
    pub fn follow_on_delay_for(&self, peer: &PeerAddress) -> Duration {
        match self.delay_class(peer) {
            DelayClass::Default => self.follow_on_delay,
            DelayClass::Long => self.follow_on_delay_long,
            DelayClass::Reduced => self.follow_on_delay_reduced,
        }
    }
}
