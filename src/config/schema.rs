use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// HID peripheral settings
    pub hid: HidConfig,
    /// Notification settings
    pub events: EventsConfig,
}

/// HID peripheral configuration passed to app registration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HidConfig {
    /// SDP record settings
    pub sdp: SdpSettings,
    /// L2CAP QoS settings
    pub qos: QosSettings,
}

/// HID device subclass advertised in the SDP record
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HidSubclass {
    /// Keyboard
    Keyboard,
    /// Pointing device
    Mouse,
    /// Combo keyboard + pointing device
    #[default]
    Combo,
}

impl HidSubclass {
    /// Raw subclass byte (Bluetooth HID profile, minor device class bits)
    pub fn as_u8(&self) -> u8 {
        match self {
            Self::Keyboard => 0x40,
            Self::Mouse => 0x80,
            Self::Combo => 0xC0,
        }
    }
}

/// SDP record settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SdpSettings {
    /// Service name
    pub name: String,
    /// Service description
    pub description: String,
    /// Provider name
    pub provider: String,
    /// Device subclass
    pub subclass: HidSubclass,
}

impl Default for SdpSettings {
    fn default() -> Self {
        Self {
            name: "Bridge KVM".to_string(),
            description: "Keyboard + Mouse".to_string(),
            provider: "BridgeKVM".to_string(),
            subclass: HidSubclass::Combo,
        }
    }
}

/// QoS service type
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QosServiceType {
    NoTraffic,
    #[default]
    BestEffort,
    Guaranteed,
}

impl QosServiceType {
    pub fn as_u8(&self) -> u8 {
        match self {
            Self::NoTraffic => 0x00,
            Self::BestEffort => 0x01,
            Self::Guaranteed => 0x02,
        }
    }
}

/// QoS settings (best effort, no guarantees requested by default)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct QosSettings {
    pub service_type: QosServiceType,
    pub token_rate: u32,
    pub token_bucket_size: u32,
    pub peak_bandwidth: u32,
    pub latency: u32,
    pub delay_variation: u32,
}

/// Event bus configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EventsConfig {
    /// Broadcast ring buffer size
    pub channel_capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 64,
        }
    }
}
