//! Connection policy engine for multi-profile auto-connect over a shared
//! radio link.
//!
//! The engine watches link and profile state transitions and decides which
//! profiles to (re)connect to which peers, with a link-up debounce, a
//! per-peer-class follow-on delay, and persisted auto-connect priorities.
//! The radio stack, the native profile implementations, and the priority
//! store are injected through the traits in [`traits`].

pub mod config;
pub mod policy;
pub mod sim;
pub mod traits;
pub mod types;

pub use config::{DelayClass, PolicyConfig};
pub use policy::{PolicyEngine, PolicyEvent, PolicyHandle};
pub use traits::{Connectors, LinkMonitor, PriorityStore, ProfileConnector};
pub use types::{
    AddressParseError, ConnectionState, Oui, PeerAddress, Priority, ProfileKind, ServiceId,
};
