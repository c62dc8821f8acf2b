//! Event system for connection state notifications
//!
//! The session worker hands notifications to an [`EventNotifier`], which
//! publishes them on the [`EventBus`] from its own task. Listeners subscribe
//! to the bus.

pub mod notifier;
pub mod types;

pub use notifier::{EventNotifier, NotifierHandle};
pub use types::SystemEvent;

use tokio::sync::broadcast;

/// Default event channel capacity (ring buffer size)
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Event bus for broadcasting system events
///
/// Uses tokio's broadcast channel to distribute events to every active
/// subscriber.
///
/// # Example
///
/// ```no_run
/// use bt_hid_bridge::events::{EventBus, SystemEvent};
/// use bt_hid_bridge::bluetooth::ProfileConnectionState;
///
/// let bus = EventBus::new();
/// let mut rx = bus.subscribe();
///
/// bus.publish(SystemEvent::connection_state(ProfileConnectionState::Connected));
///
/// tokio::spawn(async move {
///     while let Ok(event) = rx.recv().await {
///         println!("Received event: {:?}", event);
///     }
/// });
/// ```
pub struct EventBus {
    tx: broadcast::Sender<SystemEvent>,
}

impl EventBus {
    /// Create a new event bus
    pub fn new() -> Self {
        Self::with_capacity(EVENT_CHANNEL_CAPACITY)
    }

    /// Create a new event bus with a custom ring buffer size
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish an event to all subscribers
    ///
    /// With no active subscribers the event is dropped.
    pub fn publish(&self, event: SystemEvent) {
        let _ = self.tx.send(event);
    }

    /// Subscribe to events
    ///
    /// The receiver only sees events published after this call. A subscriber
    /// that falls behind the ring buffer gets `Lagged` and misses events.
    pub fn subscribe(&self) -> broadcast::Receiver<SystemEvent> {
        self.tx.subscribe()
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
