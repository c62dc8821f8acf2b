//! End-to-end session scenarios against the loopback stack

use std::sync::Arc;
use std::time::Duration;

use tokio_test::{assert_err, assert_ok};

use bt_hid_bridge::bluetooth::{
    AdapterState, LoopbackConfig, LoopbackStack, PeerAddress, ProfileConnectionState, StackCall,
};
use bt_hid_bridge::bridge;
use bt_hid_bridge::config::HidConfig;
use bt_hid_bridge::events::{EventBus, SystemEvent};
use bt_hid_bridge::{AppError, ConnectionState, HidSession};

const HOST: &str = "AA:BB:CC:DD:EE:FF";

async fn wait_for(mut cond: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("condition not reached");
}

fn new_session(config: LoopbackConfig) -> (HidSession, LoopbackStack) {
    let stack = LoopbackStack::new(config);
    let session = HidSession::new(
        Arc::new(stack.clone()),
        HidConfig::default(),
        Arc::new(EventBus::new()),
    );
    (session, stack)
}

async fn registered_session() -> (HidSession, LoopbackStack) {
    let (session, stack) = new_session(LoopbackConfig::default());
    assert_ok!(session.initialize().await);
    wait_for(|| session.is_app_registered()).await;
    (session, stack)
}

async fn connected_session() -> (HidSession, LoopbackStack) {
    let (session, stack) = registered_session().await;
    assert_ok!(session.connect(HOST).await);
    assert!(stack.emit_connection_state(&addr(HOST), ProfileConnectionState::Connected));
    wait_for(|| session.connected_peer().is_some()).await;
    stack.clear_calls();
    (session, stack)
}

fn addr(s: &str) -> PeerAddress {
    PeerAddress::parse(s).unwrap()
}

#[tokio::test]
async fn initialize_with_adapter_disabled_issues_no_proxy_request() {
    let (session, stack) = new_session(LoopbackConfig {
        adapter: AdapterState::Disabled,
        ..Default::default()
    });

    let err = assert_err!(session.initialize().await);
    assert!(matches!(err, AppError::AdapterDisabled));
    assert_eq!(err.code(), "BT_DISABLED");
    assert!(stack.calls().is_empty());
}

#[tokio::test]
async fn connect_then_link_up_then_relative_mouse_report() {
    let (session, stack) = registered_session().await;

    assert_ok!(session.connect(HOST).await);
    // Accepted is not linked
    assert!(session.connected_peer().is_none());

    assert!(stack.emit_connection_state(&addr(HOST), ProfileConnectionState::Connected));
    wait_for(|| session.connected_peer().is_some()).await;

    assert_ok!(session.send_mouse_report(1, 10, -10, 0).await);
    assert_eq!(stack.sent_reports(), vec![(2, vec![0x01, 0x0A, 0xF6, 0x00])]);
}

#[tokio::test]
async fn send_while_disconnected_fails_without_stack_call() {
    let (session, stack) = registered_session().await;
    stack.clear_calls();

    let err = assert_err!(session.send_key_report(0x02, 0x04).await);
    assert!(matches!(err, AppError::NotConnected));
    let err = assert_err!(session.release_keys().await);
    assert_eq!(err.code(), "NOT_CONNECTED");
    assert_err!(session.send_mouse_report(0, 1, 1, 0).await);
    assert_err!(session.send_mouse_absolute_report(0, 1, 1, 0).await);

    assert!(stack.calls().is_empty());
}

#[tokio::test]
async fn disconnect_while_disconnected_is_a_noop() {
    let (session, stack) = registered_session().await;
    stack.clear_calls();

    assert_ok!(session.disconnect().await);
    assert!(stack.calls().is_empty());
    assert_eq!(session.connection_state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn invalid_address_is_rejected_before_the_stack() {
    let (session, stack) = registered_session().await;
    stack.clear_calls();

    let err = assert_err!(session.connect("not-an-address").await);
    assert!(matches!(err, AppError::InvalidPeerAddress(_)));
    assert_eq!(err.code(), "NO_DEVICE");
    assert!(stack.calls().is_empty());
}

#[tokio::test]
async fn rejected_connect_leaves_state_untouched() {
    let (session, stack) = registered_session().await;
    stack.update_config(|c| c.accept_connect = false);

    let err = assert_err!(session.connect(HOST).await);
    assert_eq!(err.code(), "CONNECT_FAILED");
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(session.connection_state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn second_host_replaces_first_without_disconnect() {
    let (session, stack) = connected_session().await;
    let mut rx = session.subscribe();
    let other = addr("11:22:33:44:55:66");

    assert!(stack.emit_connection_state(&other, ProfileConnectionState::Connected));
    assert_eq!(
        rx.recv().await.unwrap(),
        SystemEvent::HidConnectionState { state: 2 }
    );
    wait_for(|| session.connected_peer().map(|p| p.address) == Some(other.clone())).await;

    assert_ok!(session.send_key_report(0, 0x04).await);
    assert_eq!(
        stack.calls(),
        vec![StackCall::SendReport {
            address: other,
            report_id: 1,
            data: vec![0, 0, 0x04, 0, 0, 0, 0, 0],
        }]
    );
}

#[tokio::test]
async fn explicit_disconnect_drops_peer() {
    let (session, stack) = connected_session().await;

    assert_ok!(session.disconnect().await);
    assert_eq!(stack.calls(), vec![StackCall::Disconnect(addr(HOST))]);
    wait_for(|| session.connection_state() == ConnectionState::Disconnected).await;

    assert_err!(session.release_keys().await);
}

#[tokio::test]
async fn rejected_disconnect_keeps_peer() {
    let (session, stack) = connected_session().await;
    stack.update_config(|c| c.accept_disconnect = false);

    let err = assert_err!(session.disconnect().await);
    assert!(matches!(err, AppError::DisconnectRejected));
    assert!(session.connected_peer().is_some());

    // Still usable after a failure
    assert_ok!(session.release_keys().await);
}

#[tokio::test]
async fn absolute_report_is_clamped_on_the_wire() {
    let (session, stack) = connected_session().await;

    assert_ok!(session.send_mouse_absolute_report(0x01, -5, 40000, 0).await);
    assert_eq!(
        stack.sent_reports(),
        vec![(3, vec![0x01, 0x00, 0x00, 0xFF, 0x7F, 0x00])]
    );
}

#[tokio::test]
async fn every_connection_callback_is_notified_in_order() {
    let (session, stack) = registered_session().await;
    stack.update_config(|c| c.auto_link = true);
    let mut rx = session.subscribe();

    assert_ok!(session.connect(HOST).await);
    wait_for(|| session.connected_peer().is_some()).await;
    assert_ok!(session.disconnect().await);

    let mut states = Vec::new();
    while states.len() < 4 {
        let SystemEvent::HidConnectionState { state } = rx.recv().await.unwrap();
        states.push(state);
    }
    // connecting, connected, disconnecting, disconnected
    assert_eq!(states, vec![1, 2, 3, 0]);
    wait_for(|| session.connection_state() == ConnectionState::Disconnected).await;
}

#[tokio::test]
async fn bridge_lines_drive_the_session() {
    let (session, stack) = new_session(LoopbackConfig {
        auto_link: true,
        ..Default::default()
    });

    let resp = bridge::handle_line(&session, r#"{"id":1,"op":"initialize"}"#).await;
    assert!(resp.success);
    wait_for(|| session.is_app_registered()).await;

    let line = format!(r#"{{"id":2,"op":"connect","address":"{}"}}"#, HOST);
    let resp = bridge::handle_line(&session, &line).await;
    assert!(resp.success);
    wait_for(|| session.connected_peer().is_some()).await;

    let resp = bridge::handle_line(
        &session,
        r#"{"id":3,"op":"sendMouseReport","buttons":0,"dx":500,"dy":-500,"wheel":1}"#,
    )
    .await;
    assert!(resp.success);
    assert_eq!(stack.sent_reports(), vec![(2, vec![0x00, 0x7F, 0x80, 0x01])]);

    let resp = bridge::handle_line(&session, r#"{"id":4,"op":"bogus"}"#).await;
    assert!(!resp.success);
    assert_eq!(resp.code, Some("SERIALIZATION"));
}
