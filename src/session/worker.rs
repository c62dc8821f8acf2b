//! Session worker
//!
//! The only writer of the connection state and the proxy handle. Stack
//! callbacks and local notices share one queue, so transitions are applied
//! strictly in arrival order.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::state::ConnectionStateMachine;
use super::SessionShared;
use crate::bluetooth::{HidDeviceProxy, RemoteDevice, StackCallbacks, StackEvent};
use crate::config::HidConfig;
use crate::events::NotifierHandle;
use crate::hid::{report_layouts, HID_REPORT_DESCRIPTOR};

/// Message consumed by the worker
#[derive(Debug)]
pub(crate) enum WorkerMessage {
    /// Callback from the stack
    Stack(StackEvent),
    /// A connect request is about to reach the stack
    ConnectRequested(RemoteDevice),
    /// The stack refused a connect request
    ConnectRejected(RemoteDevice),
    /// The stack accepted a disconnect request
    DisconnectAccepted(RemoteDevice),
}

pub(crate) struct SessionWorker {
    pub(crate) config: HidConfig,
    pub(crate) shared: Arc<SessionShared>,
    pub(crate) machine: ConnectionStateMachine,
    pub(crate) callbacks: StackCallbacks,
    pub(crate) notifier: NotifierHandle,
}

impl SessionWorker {
    pub(crate) async fn run(mut self, mut rx: mpsc::UnboundedReceiver<WorkerMessage>) {
        while let Some(message) = rx.recv().await {
            self.handle(message).await;
        }
        debug!("HID session worker stopped");
    }

    async fn handle(&mut self, message: WorkerMessage) {
        match message {
            WorkerMessage::Stack(StackEvent::ServiceConnected(proxy)) => {
                info!("HID device profile proxy connected");
                *self.shared.proxy.write() = Some(proxy.clone());
                self.register_app(proxy).await;
            }
            WorkerMessage::Stack(StackEvent::ServiceDisconnected) => {
                warn!("HID device profile proxy disconnected");
                *self.shared.proxy.write() = None;
                self.shared.app_registered.store(false, Ordering::Release);
                if self.machine.reset() {
                    self.publish_state();
                    // Synthesized: the stack sends no callback for a lost service
                    self.notifier
                        .connection_state(self.machine.state().profile_state());
                }
            }
            WorkerMessage::Stack(StackEvent::AppStatusChanged { device, registered }) => {
                self.shared
                    .app_registered
                    .store(registered, Ordering::Release);
                match (registered, device) {
                    (true, Some(device)) => info!("HID app registered (plugged device: {})", device),
                    (true, None) => info!("HID app registered"),
                    (false, _) => warn!("HID app unregistered"),
                }
            }
            WorkerMessage::Stack(StackEvent::ConnectionStateChanged { device, state }) => {
                debug!("Connection state of {}: {}", device, state);
                if self.machine.stack_state_changed(&device, state) {
                    self.publish_state();
                }
                self.notifier.connection_state(state);
            }
            WorkerMessage::ConnectRequested(device) => {
                if self.machine.connect_requested(device) {
                    self.publish_state();
                }
            }
            WorkerMessage::ConnectRejected(device) => {
                if self.machine.connect_rejected(&device) {
                    self.publish_state();
                }
            }
            WorkerMessage::DisconnectAccepted(device) => {
                if self.machine.disconnect_accepted(&device) {
                    self.publish_state();
                }
            }
        }
    }

    async fn register_app(&self, proxy: Arc<dyn HidDeviceProxy>) {
        if let Ok(layouts) = report_layouts(HID_REPORT_DESCRIPTOR) {
            for layout in &layouts {
                debug!(
                    report_id = layout.report_id,
                    input_bits = layout.input_bits(),
                    "HID report layout"
                );
            }
        }

        let sdp = &self.config.sdp;
        let qos = &self.config.qos;
        info!(
            "Registering HID app '{}' (subclass 0x{:02X}, {} byte descriptor)",
            sdp.name,
            sdp.subclass.as_u8(),
            HID_REPORT_DESCRIPTOR.len()
        );
        let ok = proxy
            .register_app(sdp, qos, HID_REPORT_DESCRIPTOR, self.callbacks.clone())
            .await;
        if !ok {
            error!("Failed to register HID app");
        }
    }

    fn publish_state(&self) {
        let state = self.machine.state().clone();
        info!("HID session state: {:?}", state);
        self.shared.state.store(Arc::new(state));
    }
}
