//! In-memory Bluetooth stack
//!
//! Implements both stack seams without touching a radio. Every call is
//! recorded, every answer is configurable, and connection-state callbacks can
//! be injected to play the part of a host. Used by the CLI bridge and tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, trace};

use super::stack::{BluetoothAdapter, HidDeviceProxy, StackCallbacks};
use super::types::{AdapterState, PeerAddress, ProfileConnectionState, RemoteDevice};
use crate::config::{QosSettings, SdpSettings};

/// Loopback behaviour
#[derive(Debug, Clone)]
pub struct LoopbackConfig {
    /// Reported adapter state
    pub adapter: AdapterState,
    /// Hand out the profile proxy when requested
    pub grant_proxy: bool,
    /// Accept app registration
    pub accept_register: bool,
    /// Accept connect requests
    pub accept_connect: bool,
    /// Accept disconnect requests
    pub accept_disconnect: bool,
    /// Accept reports
    pub accept_send: bool,
    /// Follow accepted connect/disconnect requests with the host's callbacks
    pub auto_link: bool,
}

impl Default for LoopbackConfig {
    fn default() -> Self {
        Self {
            adapter: AdapterState::Enabled,
            grant_proxy: true,
            accept_register: true,
            accept_connect: true,
            accept_disconnect: true,
            accept_send: true,
            auto_link: false,
        }
    }
}

/// A call received by the loopback stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackCall {
    RequestProfileProxy,
    RegisterApp {
        name: String,
        subclass: u8,
        descriptor_len: usize,
    },
    Connect(PeerAddress),
    Disconnect(PeerAddress),
    SendReport {
        address: PeerAddress,
        report_id: u8,
        data: Vec<u8>,
    },
}

struct LoopbackInner {
    config: Mutex<LoopbackConfig>,
    calls: Mutex<Vec<StackCall>>,
    /// Callbacks from the proxy request (service connect/disconnect)
    profile_callbacks: Mutex<Option<StackCallbacks>>,
    /// Callbacks from app registration (app status, connection state)
    app_callbacks: Mutex<Option<StackCallbacks>>,
}

/// In-memory stack acting as both adapter and profile proxy
#[derive(Clone)]
pub struct LoopbackStack {
    inner: Arc<LoopbackInner>,
}

impl LoopbackStack {
    pub fn new(config: LoopbackConfig) -> Self {
        Self {
            inner: Arc::new(LoopbackInner {
                config: Mutex::new(config),
                calls: Mutex::new(Vec::new()),
                profile_callbacks: Mutex::new(None),
                app_callbacks: Mutex::new(None),
            }),
        }
    }

    /// Current configuration
    pub fn config(&self) -> LoopbackConfig {
        self.inner.config.lock().clone()
    }

    /// Change behaviour in place
    pub fn update_config(&self, f: impl FnOnce(&mut LoopbackConfig)) {
        f(&mut self.inner.config.lock());
    }

    /// All calls received so far
    pub fn calls(&self) -> Vec<StackCall> {
        self.inner.calls.lock().clone()
    }

    /// Forget recorded calls
    pub fn clear_calls(&self) {
        self.inner.calls.lock().clear();
    }

    /// Reports handed to the stack, as `(report_id, payload)`
    pub fn sent_reports(&self) -> Vec<(u8, Vec<u8>)> {
        self.inner
            .calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                StackCall::SendReport {
                    report_id, data, ..
                } => Some((*report_id, data.clone())),
                _ => None,
            })
            .collect()
    }

    /// Whether an app has been registered
    pub fn is_app_registered(&self) -> bool {
        self.inner.app_callbacks.lock().is_some()
    }

    /// Play a host changing connection state
    ///
    /// Returns `false` if no app is registered yet.
    pub fn emit_connection_state(
        &self,
        address: &PeerAddress,
        state: ProfileConnectionState,
    ) -> bool {
        let callbacks = self.inner.app_callbacks.lock().clone();
        match callbacks {
            Some(callbacks) => {
                debug!("Loopback: {} -> {}", address, state);
                callbacks.on_connection_state_changed(RemoteDevice::new(address.clone()), state);
                true
            }
            None => false,
        }
    }

    /// Play the profile service going away
    pub fn emit_service_disconnected(&self) -> bool {
        let callbacks = self.inner.profile_callbacks.lock().clone();
        match callbacks {
            Some(callbacks) => {
                *self.inner.app_callbacks.lock() = None;
                callbacks.on_service_disconnected();
                true
            }
            None => false,
        }
    }

    fn record(&self, call: StackCall) {
        trace!("Loopback call: {:?}", call);
        self.inner.calls.lock().push(call);
    }

    fn link_sequence(&self, device: &RemoteDevice, states: [ProfileConnectionState; 2]) {
        if !self.config().auto_link {
            return;
        }
        for state in states {
            self.emit_connection_state(&device.address, state);
        }
    }
}

impl Default for LoopbackStack {
    fn default() -> Self {
        Self::new(LoopbackConfig::default())
    }
}

#[async_trait]
impl BluetoothAdapter for LoopbackStack {
    fn state(&self) -> AdapterState {
        self.inner.config.lock().adapter
    }

    fn remote_device(&self, address: &PeerAddress) -> Option<RemoteDevice> {
        Some(RemoteDevice::new(address.clone()))
    }

    async fn request_profile_proxy(&self, callbacks: StackCallbacks) -> bool {
        self.record(StackCall::RequestProfileProxy);
        if !self.config().grant_proxy {
            return false;
        }
        *self.inner.profile_callbacks.lock() = Some(callbacks.clone());
        callbacks.on_service_connected(Arc::new(self.clone()));
        true
    }
}

#[async_trait]
impl HidDeviceProxy for LoopbackStack {
    async fn register_app(
        &self,
        sdp: &SdpSettings,
        _qos: &QosSettings,
        descriptor: &'static [u8],
        callbacks: StackCallbacks,
    ) -> bool {
        self.record(StackCall::RegisterApp {
            name: sdp.name.clone(),
            subclass: sdp.subclass.as_u8(),
            descriptor_len: descriptor.len(),
        });
        if !self.config().accept_register {
            return false;
        }
        *self.inner.app_callbacks.lock() = Some(callbacks.clone());
        callbacks.on_app_status_changed(None, true);
        true
    }

    async fn connect(&self, device: &RemoteDevice) -> bool {
        self.record(StackCall::Connect(device.address.clone()));
        if !self.config().accept_connect {
            return false;
        }
        self.link_sequence(
            device,
            [
                ProfileConnectionState::Connecting,
                ProfileConnectionState::Connected,
            ],
        );
        true
    }

    async fn disconnect(&self, device: &RemoteDevice) -> bool {
        self.record(StackCall::Disconnect(device.address.clone()));
        if !self.config().accept_disconnect {
            return false;
        }
        self.link_sequence(
            device,
            [
                ProfileConnectionState::Disconnecting,
                ProfileConnectionState::Disconnected,
            ],
        );
        true
    }

    async fn send_report(&self, device: &RemoteDevice, report_id: u8, data: &[u8]) -> bool {
        self.record(StackCall::SendReport {
            address: device.address.clone(),
            report_id,
            data: data.to_vec(),
        });
        self.config().accept_send
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bluetooth::StackEvent;
    use tokio::sync::mpsc;

    fn channel_callbacks() -> (StackCallbacks, mpsc::UnboundedReceiver<StackEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let callbacks = StackCallbacks::new(move |ev| {
            let _ = tx.send(ev);
        });
        (callbacks, rx)
    }

    #[tokio::test]
    async fn test_proxy_request_delivers_service_connected() {
        let stack = LoopbackStack::default();
        let (callbacks, mut rx) = channel_callbacks();

        assert!(stack.request_profile_proxy(callbacks).await);
        assert!(matches!(rx.recv().await, Some(StackEvent::ServiceConnected(_))));
        assert_eq!(stack.calls(), vec![StackCall::RequestProfileProxy]);
    }

    #[tokio::test]
    async fn test_refused_proxy() {
        let stack = LoopbackStack::new(LoopbackConfig {
            grant_proxy: false,
            ..Default::default()
        });
        let (callbacks, mut rx) = channel_callbacks();

        assert!(!stack.request_profile_proxy(callbacks).await);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_auto_link_sequence() {
        let stack = LoopbackStack::new(LoopbackConfig {
            auto_link: true,
            ..Default::default()
        });
        let (callbacks, mut rx) = channel_callbacks();
        assert!(
            stack
                .register_app(
                    &SdpSettings::default(),
                    &QosSettings::default(),
                    crate::hid::HID_REPORT_DESCRIPTOR,
                    callbacks,
                )
                .await
        );
        assert!(matches!(
            rx.recv().await,
            Some(StackEvent::AppStatusChanged {
                registered: true,
                ..
            })
        ));

        let device = RemoteDevice::new(PeerAddress::parse("AA:BB:CC:DD:EE:FF").unwrap());
        assert!(stack.connect(&device).await);

        let mut states = Vec::new();
        while let Ok(StackEvent::ConnectionStateChanged { state, .. }) = rx.try_recv() {
            states.push(state);
        }
        assert_eq!(
            states,
            vec![
                ProfileConnectionState::Connecting,
                ProfileConnectionState::Connected
            ]
        );
    }

    #[tokio::test]
    async fn test_emit_requires_registration() {
        let stack = LoopbackStack::default();
        let addr = PeerAddress::parse("AA:BB:CC:DD:EE:FF").unwrap();
        assert!(!stack.emit_connection_state(&addr, ProfileConnectionState::Connected));
        assert!(!stack.emit_service_disconnected());
    }
}
