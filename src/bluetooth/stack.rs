//! Bluetooth stack traits
//!
//! The platform stack is an external collaborator. The session talks to it
//! through two seams:
//! - [`BluetoothAdapter`]: adapter availability, device resolution and the
//!   HID device profile proxy request
//! - [`HidDeviceProxy`]: the profile proxy handed back asynchronously through
//!   [`StackCallbacks::on_service_connected`]
//!
//! Every call returns the stack's immediate accept/reject answer. Outcomes
//! that complete later (link up, app registered) arrive as callbacks.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use super::types::{AdapterState, PeerAddress, ProfileConnectionState, RemoteDevice};
use crate::config::{QosSettings, SdpSettings};

/// Local Bluetooth adapter
#[async_trait]
pub trait BluetoothAdapter: Send + Sync {
    /// Current adapter availability
    fn state(&self) -> AdapterState;

    /// Resolve an address to a device handle
    fn remote_device(&self, address: &PeerAddress) -> Option<RemoteDevice>;

    /// Ask the stack for the HID device profile proxy
    ///
    /// Returns `false` if the request was refused. On success the proxy is
    /// delivered later through `callbacks`.
    async fn request_profile_proxy(&self, callbacks: StackCallbacks) -> bool;
}

/// HID device profile proxy
#[async_trait]
pub trait HidDeviceProxy: Send + Sync {
    /// Register the HID app (SDP record, report descriptor and QoS)
    ///
    /// App status and connection state changes are reported through
    /// `callbacks` from then on.
    async fn register_app(
        &self,
        sdp: &SdpSettings,
        qos: &QosSettings,
        descriptor: &'static [u8],
        callbacks: StackCallbacks,
    ) -> bool;

    /// Request a connection to a host
    async fn connect(&self, device: &RemoteDevice) -> bool;

    /// Request disconnection from a host
    async fn disconnect(&self, device: &RemoteDevice) -> bool;

    /// Hand one input report to the stack for transmission
    async fn send_report(&self, device: &RemoteDevice, report_id: u8, data: &[u8]) -> bool;
}

/// Callback delivered by the stack
#[derive(Clone)]
pub enum StackEvent {
    /// The HID device profile proxy became available
    ServiceConnected(Arc<dyn HidDeviceProxy>),
    /// The HID device profile proxy went away
    ServiceDisconnected,
    /// App registration status changed
    AppStatusChanged {
        device: Option<RemoteDevice>,
        registered: bool,
    },
    /// Connection state of a host changed
    ConnectionStateChanged {
        device: RemoteDevice,
        state: ProfileConnectionState,
    },
}

impl fmt::Debug for StackEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ServiceConnected(_) => f.write_str("ServiceConnected"),
            Self::ServiceDisconnected => f.write_str("ServiceDisconnected"),
            Self::AppStatusChanged { device, registered } => f
                .debug_struct("AppStatusChanged")
                .field("device", device)
                .field("registered", registered)
                .finish(),
            Self::ConnectionStateChanged { device, state } => f
                .debug_struct("ConnectionStateChanged")
                .field("device", device)
                .field("state", state)
                .finish(),
        }
    }
}

/// Sink the stack uses to report callbacks
///
/// Cheap to clone; delivery never blocks the stack.
#[derive(Clone)]
pub struct StackCallbacks {
    sink: Arc<dyn Fn(StackEvent) + Send + Sync>,
}

impl StackCallbacks {
    pub fn new<F>(sink: F) -> Self
    where
        F: Fn(StackEvent) + Send + Sync + 'static,
    {
        Self {
            sink: Arc::new(sink),
        }
    }

    pub fn on_service_connected(&self, proxy: Arc<dyn HidDeviceProxy>) {
        (self.sink)(StackEvent::ServiceConnected(proxy));
    }

    pub fn on_service_disconnected(&self) {
        (self.sink)(StackEvent::ServiceDisconnected);
    }

    pub fn on_app_status_changed(&self, device: Option<RemoteDevice>, registered: bool) {
        (self.sink)(StackEvent::AppStatusChanged { device, registered });
    }

    pub fn on_connection_state_changed(&self, device: RemoteDevice, state: ProfileConnectionState) {
        (self.sink)(StackEvent::ConnectionStateChanged { device, state });
    }
}

impl fmt::Debug for StackCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StackCallbacks").finish_non_exhaustive()
    }
}
