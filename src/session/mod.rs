//! HID session manager
//!
//! Owns the profile proxy and the tracked peer, and exposes the caller-facing
//! operations.
//!
//! Architecture:
//! ```text
//! Caller --> HidSession ops --> Bluetooth stack
//!                 ^                   |
//!                 | snapshot          | callbacks
//!                 |                   v
//!           ArcSwap<State> <-- SessionWorker --> EventNotifier --> EventBus --> Listener
//! ```
//!
//! Operations run on the caller's task and only read the published state
//! snapshot. All writes happen on the worker task.

pub mod state;
mod worker;

pub use state::{ConnectionState, ConnectionStateMachine};

use arc_swap::ArcSwap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::bluetooth::{
    AdapterState, BluetoothAdapter, HidDeviceProxy, PeerAddress, RemoteDevice, StackCallbacks,
};
use crate::config::HidConfig;
use crate::error::{AppError, Result};
use crate::events::{EventBus, EventNotifier, SystemEvent};
use crate::hid::{HidReport, KeyboardReport, MouseAbsoluteReport, MouseRelativeReport};
use worker::{SessionWorker, WorkerMessage};

/// State written by the worker, read by everyone
pub(crate) struct SessionShared {
    /// Latest connection state snapshot
    pub(crate) state: ArcSwap<ConnectionState>,
    /// HID device profile proxy, once the stack handed it over
    pub(crate) proxy: RwLock<Option<Arc<dyn HidDeviceProxy>>>,
    /// Last app status reported by the stack
    pub(crate) app_registered: AtomicBool,
}

/// HID session bound to one Bluetooth adapter
pub struct HidSession {
    adapter: Arc<dyn BluetoothAdapter>,
    shared: Arc<SessionShared>,
    /// Worker queue sender
    worker_tx: mpsc::UnboundedSender<WorkerMessage>,
    /// Callbacks handed to the stack (feed the worker queue)
    callbacks: StackCallbacks,
    /// Event bus for connection state notifications
    events: Arc<EventBus>,
    notifier: EventNotifier,
    /// Worker task handle
    worker: parking_lot::Mutex<Option<JoinHandle<()>>>,
    /// Serializes sends: at most one report in flight
    send_lock: Mutex<()>,
}

impl HidSession {
    /// Create a session and start its worker and notifier tasks
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(adapter: Arc<dyn BluetoothAdapter>, config: HidConfig, events: Arc<EventBus>) -> Self {
        let shared = Arc::new(SessionShared {
            state: ArcSwap::from_pointee(ConnectionState::Disconnected),
            proxy: RwLock::new(None),
            app_registered: AtomicBool::new(false),
        });

        let (worker_tx, worker_rx) = mpsc::unbounded_channel();
        let callbacks = {
            let tx = worker_tx.clone();
            StackCallbacks::new(move |event| {
                if tx.send(WorkerMessage::Stack(event)).is_err() {
                    debug!("HID session worker stopped, dropping stack callback");
                }
            })
        };

        let notifier = EventNotifier::spawn(events.clone());
        let worker = SessionWorker {
            config,
            shared: shared.clone(),
            machine: ConnectionStateMachine::new(),
            callbacks: callbacks.clone(),
            notifier: notifier.handle(),
        };
        let handle = tokio::spawn(worker.run(worker_rx));

        Self {
            adapter,
            shared,
            worker_tx,
            callbacks,
            events,
            notifier,
            worker: parking_lot::Mutex::new(Some(handle)),
            send_lock: Mutex::new(()),
        }
    }

    /// Check the adapter and request the HID device profile proxy
    ///
    /// Succeeds once the request is accepted. App registration follows on the
    /// worker when the proxy arrives; its outcome is only logged.
    pub async fn initialize(&self) -> Result<()> {
        match self.adapter.state() {
            AdapterState::Missing => return Err(AppError::AdapterUnavailable),
            AdapterState::Disabled => return Err(AppError::AdapterDisabled),
            AdapterState::Enabled => {}
        }

        if !self
            .adapter
            .request_profile_proxy(self.callbacks.clone())
            .await
        {
            warn!("Bluetooth stack refused the HID device profile proxy");
            return Err(AppError::ProxyAcquisitionFailed);
        }

        info!("HID device profile proxy requested");
        Ok(())
    }

    /// Ask the stack to connect to a host
    ///
    /// Success means the request was accepted; link-up is reported later as a
    /// `hidConnectionState` event.
    pub async fn connect(&self, address: &str) -> Result<()> {
        let address = PeerAddress::parse(address)?;
        let device = self
            .adapter
            .remote_device(&address)
            .ok_or_else(|| AppError::InvalidPeerAddress(address.to_string()))?;

        let Some(proxy) = self.proxy() else {
            warn!("Connect to {} requested before the profile proxy is available", device);
            return Err(AppError::ConnectRejected);
        };

        // Queued ahead of any callback the stack raises during the call
        self.post(WorkerMessage::ConnectRequested(device.clone()));
        if !proxy.connect(&device).await {
            warn!("Bluetooth stack rejected connect to {}", device);
            self.post(WorkerMessage::ConnectRejected(device));
            return Err(AppError::ConnectRejected);
        }

        info!("Connect to {} accepted", device);
        Ok(())
    }

    /// Ask the stack to drop the current host
    ///
    /// A no-op when no peer is tracked. A pending connect is aborted the same
    /// way as an established link.
    pub async fn disconnect(&self) -> Result<()> {
        let Some(device) = self.shared.state.load().tracked_peer().cloned() else {
            debug!("Disconnect requested with no tracked peer");
            return Ok(());
        };

        let Some(proxy) = self.proxy() else {
            warn!("Disconnect from {} requested without a profile proxy", device);
            return Err(AppError::DisconnectRejected);
        };

        if !proxy.disconnect(&device).await {
            warn!("Bluetooth stack rejected disconnect from {}", device);
            return Err(AppError::DisconnectRejected);
        }

        info!("Disconnect from {} accepted", device);
        self.post(WorkerMessage::DisconnectAccepted(device));
        Ok(())
    }

    /// Encode a report and hand it to the stack
    ///
    /// Fails with `NotConnected` without touching the stack when no link is up.
    pub async fn send_report(&self, report: HidReport) -> Result<()> {
        let kind = report.kind();
        let payload = report.encode();

        // Peer is read under the lock so a queued send sees the latest link
        let _guard = self.send_lock.lock().await;
        let device = self.connected_peer().ok_or(AppError::NotConnected)?;
        let proxy = self.proxy().ok_or(AppError::SendRejected(kind))?;
        if !proxy.send_report(&device, kind.report_id(), &payload).await {
            debug!("Bluetooth stack rejected {} report", kind);
            return Err(AppError::SendRejected(kind));
        }

        trace!("Sent {} report to {}: {:02X?}", kind, device.address, payload);
        Ok(())
    }

    /// Send a keyboard report with one key pressed
    pub async fn send_key_report(&self, modifier: u8, key_code: u8) -> Result<()> {
        self.send_report(HidReport::Keyboard(KeyboardReport::single(modifier, key_code)))
            .await
    }

    /// Release all keys (all-zero keyboard report)
    pub async fn release_keys(&self) -> Result<()> {
        self.send_report(HidReport::key_release()).await
    }

    /// Send a relative mouse report
    pub async fn send_mouse_report(&self, buttons: u8, dx: i8, dy: i8, wheel: i8) -> Result<()> {
        self.send_report(HidReport::MouseRelative(MouseRelativeReport {
            buttons,
            dx,
            dy,
            wheel,
        }))
        .await
    }

    /// Send an absolute mouse report; coordinates are clamped to 0..=32767
    pub async fn send_mouse_absolute_report(
        &self,
        buttons: u8,
        x: i32,
        y: i32,
        wheel: i8,
    ) -> Result<()> {
        self.send_report(HidReport::MouseAbsolute(MouseAbsoluteReport {
            buttons,
            x,
            y,
            wheel,
        }))
        .await
    }

    /// Latest connection state snapshot
    pub fn connection_state(&self) -> ConnectionState {
        ConnectionState::clone(&self.shared.state.load())
    }

    /// The host the link is up with, if any
    pub fn connected_peer(&self) -> Option<RemoteDevice> {
        self.shared.state.load().connected_peer().cloned()
    }

    /// Whether the profile proxy has been handed over
    pub fn is_profile_ready(&self) -> bool {
        self.shared.proxy.read().is_some()
    }

    /// Whether the stack reported the HID app as registered
    pub fn is_app_registered(&self) -> bool {
        self.shared.app_registered.load(Ordering::Acquire)
    }

    /// Subscribe to connection state notifications
    pub fn subscribe(&self) -> broadcast::Receiver<SystemEvent> {
        self.events.subscribe()
    }

    /// Stop the worker and notifier tasks
    pub fn shutdown(&self) {
        info!("Shutting down HID session");
        if let Some(handle) = self.worker.lock().take() {
            handle.abort();
        }
        self.notifier.shutdown();
    }

    fn proxy(&self) -> Option<Arc<dyn HidDeviceProxy>> {
        self.shared.proxy.read().clone()
    }

    fn post(&self, message: WorkerMessage) {
        if self.worker_tx.send(message).is_err() {
            warn!("HID session worker stopped, dropping local notice");
        }
    }
}

impl Drop for HidSession {
    fn drop(&mut self) {
        if let Some(handle) = self.worker.get_mut().take() {
            handle.abort();
        }
    }
}
