//! bt-hid-bridge - Bluetooth HID peripheral session engine
//!
//! This crate lets a host computer see the device as a standard keyboard and
//! mouse over the Bluetooth HID profile. It provides the report descriptor,
//! the report encoder and the session managing the profile proxy, the
//! connected host and connection state notifications.

pub mod bluetooth;
pub mod bridge;
pub mod config;
pub mod error;
pub mod events;
pub mod hid;
pub mod session;

pub use error::{AppError, Result};
pub use session::{ConnectionState, HidSession};
