//! Bluetooth stack abstraction
//!
//! The platform stack (profile proxy acquisition, SDP registration, radio and
//! link management) stays outside this crate. This module defines the seams
//! the session calls into and the callbacks flowing back, plus an in-memory
//! loopback implementation.

pub mod loopback;
pub mod stack;
pub mod types;

pub use loopback::{LoopbackConfig, LoopbackStack, StackCall};
pub use stack::{BluetoothAdapter, HidDeviceProxy, StackCallbacks, StackEvent};
pub use types::{AdapterState, PeerAddress, ProfileConnectionState, RemoteDevice};
