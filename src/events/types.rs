//! System event types
//!
//! Defines all event types that can be broadcast through the event bus.

use serde::{Deserialize, Serialize};

use crate::bluetooth::ProfileConnectionState;

/// System event enumeration
///
/// Events are tagged with their event name for serialization:
/// ```json
/// {
///   "event": "hidConnectionState",
///   "data": { "state": 2 }
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum SystemEvent {
    /// Host connection state changed
    #[serde(rename = "hidConnectionState")]
    HidConnectionState {
        /// Profile connection state: 0 disconnected, 1 connecting, 2 connected, 3 disconnecting
        state: i32,
    },
}

impl SystemEvent {
    pub fn connection_state(state: ProfileConnectionState) -> Self {
        Self::HidConnectionState {
            state: state.as_i32(),
        }
    }

    /// Event name as seen by listeners
    pub fn name(&self) -> &'static str {
        match self {
            Self::HidConnectionState { .. } => "hidConnectionState",
        }
    }
}
