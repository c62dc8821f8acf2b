//! Connection state machine
//!
//! ```text
//!                 connect accepted
//!  Disconnected ------------------> Connecting(peer)
//!       ^  ^                             |
//!       |  | disconnected(peer)          | connected(peer)
//!       |  +-----------------------------+
//!       |                                v
//!       +------------------------- Connected(peer) <--+
//!        disconnected(peer) /                         | connected(other)
//!        disconnect accepted                          | replaces peer
//!                                                  ---+
//! ```
//!
//! A `connected` callback moves any state to `Connected`. Only `connected`
//! and `disconnected` callbacks drive transitions; `connecting` and
//! `disconnecting` are passed through to listeners but leave the state as is.

use crate::bluetooth::{ProfileConnectionState, RemoteDevice};

/// Session connection state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConnectionState {
    /// No peer tracked
    #[default]
    Disconnected,
    /// Connect request accepted by the stack, link not confirmed
    Connecting(RemoteDevice),
    /// Link confirmed by the stack
    Connected(RemoteDevice),
}

impl ConnectionState {
    /// The connected peer, if the link is up
    pub fn connected_peer(&self) -> Option<&RemoteDevice> {
        match self {
            Self::Connected(device) => Some(device),
            _ => None,
        }
    }

    /// The peer a connect is pending for or established with
    pub fn tracked_peer(&self) -> Option<&RemoteDevice> {
        match self {
            Self::Disconnected => None,
            Self::Connecting(device) | Self::Connected(device) => Some(device),
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected(_))
    }

    /// Equivalent profile connection state
    pub fn profile_state(&self) -> ProfileConnectionState {
        match self {
            Self::Disconnected => ProfileConnectionState::Disconnected,
            Self::Connecting(_) => ProfileConnectionState::Connecting,
            Self::Connected(_) => ProfileConnectionState::Connected,
        }
    }
}

/// Single-peer connection state machine
///
/// Every method returns `true` when the state changed.
#[derive(Debug, Default)]
pub struct ConnectionStateMachine {
    state: ConnectionState,
}

impl ConnectionStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    /// A connect request is about to be handed to the stack
    ///
    /// Applied before the stack call, so callbacks raised during that call
    /// land on the pending peer. Only leaves `Disconnected`.
    pub fn connect_requested(&mut self, device: RemoteDevice) -> bool {
        if self.state != ConnectionState::Disconnected {
            return false;
        }
        self.state = ConnectionState::Connecting(device);
        true
    }

    /// The stack refused a connect request
    ///
    /// Rolls back a pending connect to the same device. A link that came up
    /// in the meantime is kept.
    pub fn connect_rejected(&mut self, device: &RemoteDevice) -> bool {
        match &self.state {
            ConnectionState::Connecting(pending) if pending.same_device(device) => {
                self.state = ConnectionState::Disconnected;
                true
            }
            _ => false,
        }
    }

    /// The stack reported a connection state change
    pub fn stack_state_changed(
        &mut self,
        device: &RemoteDevice,
        state: ProfileConnectionState,
    ) -> bool {
        match state {
            ProfileConnectionState::Connected => {
                if self.state == ConnectionState::Connected(device.clone()) {
                    return false;
                }
                self.state = ConnectionState::Connected(device.clone());
                true
            }
            ProfileConnectionState::Disconnected => self.drop_peer(device),
            ProfileConnectionState::Connecting | ProfileConnectionState::Disconnecting => false,
        }
    }

    /// The stack accepted an explicit disconnect request
    pub fn disconnect_accepted(&mut self, device: &RemoteDevice) -> bool {
        self.drop_peer(device)
    }

    /// Forget any peer (profile service lost)
    pub fn reset(&mut self) -> bool {
        if self.state == ConnectionState::Disconnected {
            return false;
        }
        self.state = ConnectionState::Disconnected;
        true
    }

    fn drop_peer(&mut self, device: &RemoteDevice) -> bool {
        match self.state.tracked_peer() {
            Some(tracked) if tracked.same_device(device) => {
                self.state = ConnectionState::Disconnected;
                true
            }
            _ => false,
        }
    }
}
