use serde::Serialize;
use thiserror::Error;

use crate::hid::ReportKind;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bluetooth is not supported")]
    AdapterUnavailable,

    #[error("Bluetooth is disabled")]
    AdapterDisabled,

    #[error("Failed to get HID device profile")]
    ProxyAcquisitionFailed,

    #[error("Invalid device address: {0}")]
    InvalidPeerAddress(String),

    #[error("Failed to connect to device")]
    ConnectRejected,

    #[error("Failed to disconnect")]
    DisconnectRejected,

    #[error("No connected device")]
    NotConnected,

    #[error("Failed to send {0} report")]
    SendRejected(ReportKind),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AppError {
    /// Stable error code reported to callers
    pub fn code(&self) -> &'static str {
        match self {
            Self::AdapterUnavailable => "NO_BLUETOOTH",
            Self::AdapterDisabled => "BT_DISABLED",
            Self::ProxyAcquisitionFailed => "HID_PROXY",
            Self::InvalidPeerAddress(_) => "NO_DEVICE",
            Self::ConnectRejected => "CONNECT_FAILED",
            Self::DisconnectRejected => "DISCONNECT_FAILED",
            Self::NotConnected => "NOT_CONNECTED",
            Self::SendRejected(_) => "SEND_FAILED",
            Self::Config(_) => "CONFIG",
            Self::Io(_) => "IO",
            Self::Serialization(_) => "SERIALIZATION",
        }
    }
}

/// Error response body (unified success format)
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub code: &'static str,
    pub message: String,
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        tracing::debug!(
            error_code = err.code(),
            error_message = %err,
            "Operation failed"
        );

        Self {
            success: false,
            code: err.code(),
            message: err.to_string(),
        }
    }
}

/// Result type alias for session operations
pub type Result<T> = std::result::Result<T, AppError>;
