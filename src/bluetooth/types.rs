//! Bluetooth stack data types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{AppError, Result};

/// Bluetooth device address (`XX:XX:XX:XX:XX:XX`, upper case)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PeerAddress(String);

impl PeerAddress {
    /// Parse a six-octet colon-separated address, normalising to upper case
    pub fn parse(address: &str) -> Result<Self> {
        let trimmed = address.trim();
        let octets: Vec<&str> = trimmed.split(':').collect();
        let valid = octets.len() == 6
            && octets
                .iter()
                .all(|o| o.len() == 2 && o.chars().all(|c| c.is_ascii_hexdigit()));
        if !valid {
            return Err(AppError::InvalidPeerAddress(address.to_string()));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for PeerAddress {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PeerAddress {
    type Error = AppError;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<PeerAddress> for String {
    fn from(address: PeerAddress) -> Self {
        address.0
    }
}

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Handle to a remote device resolved by the adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteDevice {
    /// Device address
    pub address: PeerAddress,
    /// Friendly name, if the stack knows it
    pub name: Option<String>,
}

impl RemoteDevice {
    pub fn new(address: PeerAddress) -> Self {
        Self {
            address,
            name: None,
        }
    }

    /// Same physical device (names are informational only)
    pub fn same_device(&self, other: &RemoteDevice) -> bool {
        self.address == other.address
    }
}

impl fmt::Display for RemoteDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} ({})", name, self.address),
            None => write!(f, "{}", self.address),
        }
    }
}

/// Local adapter availability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterState {
    /// No Bluetooth adapter on this system
    Missing,
    /// Adapter present but powered off
    Disabled,
    /// Adapter present and powered on
    Enabled,
}

/// Profile connection state as reported by the stack
///
/// The integer values are the platform constants and are used verbatim as the
/// notification payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileConnectionState {
    Disconnected = 0,
    Connecting = 1,
    Connected = 2,
    Disconnecting = 3,
}

impl ProfileConnectionState {
    pub fn as_i32(&self) -> i32 {
        *self as i32
    }

    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Disconnected),
            1 => Some(Self::Connecting),
            2 => Some(Self::Connected),
            3 => Some(Self::Disconnecting),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnecting => "disconnecting",
        }
    }
}

impl fmt::Display for ProfileConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
