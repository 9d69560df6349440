//! Demo: runs the policy engine against in-memory doubles and scripts a
//! link-up, a discovery, and a profile connection so the decision flow can
//! be watched in the logs.

use linkpolicy::sim::{MemoryPriorityStore, SimConnector, SimLink};
use linkpolicy::{
    ConnectionState, Connectors, PolicyConfig, PolicyEngine, Priority, ProfileKind, ServiceId,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()))
        .init();

    // Shorten the timers so the demo runs in a few seconds
    let config = PolicyConfig {
        link_up_debounce: Duration::from_millis(200),
        follow_on_delay: Duration::from_millis(1500),
        ..Default::default()
    };

    let store = Arc::new(MemoryPriorityStore::new());
    let link = Arc::new(SimLink::new());
    let handsfree = Arc::new(SimConnector::new());
    let audio_sink = Arc::new(SimConnector::new());
    let audio_source = Arc::new(SimConnector::new());
    let network = Arc::new(SimConnector::new());

    let connectors = Connectors {
        handsfree: Some(handsfree.clone()),
        audio_sink: Some(audio_sink.clone()),
        audio_source: Some(audio_source.clone()),
        network_access: Some(network.clone()),
    };
    let (engine, handle) = PolicyEngine::new(store.clone(), link.clone(), connectors, config);
    tokio::spawn(engine.run());

    // One previously paired carkit, eligible for auto-connect on handsfree
    let carkit: linkpolicy::PeerAddress = "5C:EE:01:42:AB:10".parse().expect("valid address");
    store.bond(carkit).await;
    store
        .seed(carkit, ProfileKind::Handsfree, Priority::AutoConnect)
        .await;

    info!(%carkit, "radio link coming up");
    handle.link_turned_on();
    tokio::time::sleep(Duration::from_millis(400)).await;
    info!(connects = ?handsfree.issued_connects().await, "auto-connect issued");

    // Discovery reports the peer also supports audio streaming
    handle.service_discovered(carkit, vec![ServiceId::HANDSFREE, ServiceId::AUDIO_SINK]);
    tokio::time::sleep(Duration::from_millis(100)).await;
    info!(
        audio_sink = ?store.priority(carkit, ProfileKind::AudioSink).await,
        "priorities after discovery"
    );

    // The handsfree connect completes; the follow-on check should bring up
    // audio-sink after the delay.
    handsfree.set_connected(&[carkit]).await;
    handle.profile_state_changed(
        carkit,
        ProfileKind::Handsfree,
        ConnectionState::Connecting,
        ConnectionState::Connected,
    );
    tokio::time::sleep(Duration::from_millis(2000)).await;
    info!(connects = ?audio_sink.issued_connects().await, "follow-on issued");
}
