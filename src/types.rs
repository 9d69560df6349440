//! Core identity and policy value types shared across the engine.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error parsing a link-layer address or prefix from its colon form
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressParseError {
    #[error("expected {expected} colon-separated octets, got {got}")]
    WrongLength { expected: usize, got: usize },
    #[error("invalid octet '{0}'")]
    InvalidOctet(String),
}

fn parse_octets<const N: usize>(s: &str) -> Result<[u8; N], AddressParseError> {
    let mut out = [0u8; N];
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != N {
        return Err(AddressParseError::WrongLength {
            expected: N,
            got: parts.len(),
        });
    }
    for (i, part) in parts.iter().enumerate() {
        out[i] = u8::from_str_radix(part, 16)
            .map_err(|_| AddressParseError::InvalidOctet(part.to_string()))?;
    }
    Ok(out)
}

/// Stable 6-byte link-layer identity of a remote peer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerAddress([u8; 6]);

impl PeerAddress {
    pub const fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// Vendor prefix (first three octets), matched against the quirk tables
    pub fn oui(&self) -> Oui {
        Oui([self.0[0], self.0[1], self.0[2]])
    }
}

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

impl FromStr for PeerAddress {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_octets::<6>(s).map(Self)
    }
}

/// Three-octet vendor prefix of a peer address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Oui([u8; 3]);

impl Oui {
    pub const fn new(octets: [u8; 3]) -> Self {
        Self(octets)
    }
}

impl fmt::Display for Oui {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X}:{:02X}:{:02X}", self.0[0], self.0[1], self.0[2])
    }
}

impl FromStr for Oui {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_octets::<3>(s).map(Self)
    }
}

/// The logical profiles the engine coordinates. Closed set: the follow-on
/// algorithm only knows how to sequence these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileKind {
    /// Hands-free voice (we are the gateway)
    Handsfree,
    /// Audio streaming to the peer (peer is the sink)
    AudioSink,
    /// Audio streaming from the peer (peer is the source)
    AudioSource,
    /// Network access over the shared link
    NetworkAccess,
}

impl ProfileKind {
    pub const ALL: [ProfileKind; 4] = [
        ProfileKind::Handsfree,
        ProfileKind::AudioSink,
        ProfileKind::AudioSource,
        ProfileKind::NetworkAccess,
    ];

    /// Profiles whose connection triggers follow-on checks and auto-connect
    /// promotion, in link-up auto-connect order.
    pub const PHONE_PROFILES: [ProfileKind; 3] = [
        ProfileKind::Handsfree,
        ProfileKind::AudioSink,
        ProfileKind::AudioSource,
    ];

    pub fn is_phone_profile(self) -> bool {
        Self::PHONE_PROFILES.contains(&self)
    }

    /// Service-class identifiers that indicate the remote supports this profile
    pub fn service_ids(self) -> &'static [ServiceId] {
        match self {
            ProfileKind::Handsfree => &[ServiceId::HEADSET, ServiceId::HANDSFREE],
            ProfileKind::AudioSink => &[ServiceId::AUDIO_SINK, ServiceId::ADVANCED_AUDIO],
            ProfileKind::AudioSource => &[ServiceId::AUDIO_SOURCE],
            ProfileKind::NetworkAccess => &[ServiceId::PAN_USER],
        }
    }
}

impl fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProfileKind::Handsfree => "handsfree",
            ProfileKind::AudioSink => "audio-sink",
            ProfileKind::AudioSource => "audio-source",
            ProfileKind::NetworkAccess => "network-access",
        };
        write!(f, "{}", name)
    }
}

/// A 16-bit service-class identifier reported by service discovery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServiceId(pub u16);

impl ServiceId {
    pub const HEADSET: ServiceId = ServiceId(0x1108);
    pub const AUDIO_SOURCE: ServiceId = ServiceId(0x110A);
    pub const AUDIO_SINK: ServiceId = ServiceId(0x110B);
    pub const ADVANCED_AUDIO: ServiceId = ServiceId(0x110D);
    pub const PAN_USER: ServiceId = ServiceId(0x1115);
    pub const HANDSFREE: ServiceId = ServiceId(0x111E);
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

/// Persisted per (peer, profile) auto-connect eligibility. The ordering is
/// meaningful: the engine compares against `On` and `AutoConnect` thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    /// Never set; discovery initializes it to `On` for supported profiles
    Undefined,
    /// Explicitly disabled, never auto-connected
    Off,
    /// Eligible for follow-on connects
    On,
    /// Connected on link-up; at most one peer per profile holds this
    AutoConnect,
}

/// Connection state of one profile toward one peer, owned and reported by
/// the profile connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
}
