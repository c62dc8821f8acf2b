//! Event notifier
//!
//! Decouples the session worker from listeners: the worker pushes into an
//! unbounded queue and returns immediately, a dedicated task drains the queue
//! in order and publishes on the bus. Nothing is retried; a listener that is
//! not subscribed at publish time misses the event.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use super::{EventBus, SystemEvent};
use crate::bluetooth::ProfileConnectionState;

/// Cloneable sending side of the notifier
#[derive(Clone, Debug)]
pub struct NotifierHandle {
    tx: mpsc::UnboundedSender<SystemEvent>,
}

impl NotifierHandle {
    /// Queue an event for delivery (fire-and-forget)
    pub fn notify(&self, event: SystemEvent) {
        if self.tx.send(event).is_err() {
            debug!("Event notifier stopped, dropping event");
        }
    }

    /// Queue a connection state notification
    pub fn connection_state(&self, state: ProfileConnectionState) {
        self.notify(SystemEvent::connection_state(state));
    }
}

/// Delivery task publishing queued events on the bus
pub struct EventNotifier {
    handle: NotifierHandle,
    task: JoinHandle<()>,
}

impl EventNotifier {
    /// Spawn the delivery task
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(bus: Arc<EventBus>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<SystemEvent>();

        let task = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                trace!(
                    event = event.name(),
                    subscribers = bus.subscriber_count(),
                    "Publishing event"
                );
                bus.publish(event);
            }
            debug!("Event notifier stopped");
        });

        Self {
            handle: NotifierHandle { tx },
            task,
        }
    }

    pub fn handle(&self) -> NotifierHandle {
        self.handle.clone()
    }

    /// Stop the delivery task; queued events are dropped
    pub fn shutdown(&self) {
        self.task.abort();
    }
}

impl Drop for EventNotifier {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_delivers_in_order() {
        let bus = Arc::new(EventBus::new());
        let mut rx = bus.subscribe();
        let notifier = EventNotifier::spawn(bus.clone());
        let handle = notifier.handle();

        handle.connection_state(ProfileConnectionState::Connecting);
        handle.connection_state(ProfileConnectionState::Connected);
        handle.connection_state(ProfileConnectionState::Disconnected);

        let mut states = Vec::new();
        for _ in 0..3 {
            match rx.recv().await.unwrap() {
                SystemEvent::HidConnectionState { state } => states.push(state),
            }
        }
        assert_eq!(states, vec![1, 2, 0]);
    }

    #[tokio::test]
    async fn test_notify_after_shutdown_does_not_panic() {
        let bus = Arc::new(EventBus::new());
        let notifier = EventNotifier::spawn(bus);
        let handle = notifier.handle();
        notifier.shutdown();
        drop(notifier);
        tokio::task::yield_now().await;

        handle.connection_state(ProfileConnectionState::Connected);
    }
}
