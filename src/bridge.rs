//! JSON-lines command bridge
//!
//! Maps caller requests onto [`HidSession`] operations. One request object per
//! line in, one response object per line out:
//!
//! ```text
//! {"id":1,"op":"connect","address":"AA:BB:CC:DD:EE:FF"}
//! {"id":1,"success":true}
//! {"id":2,"op":"sendMouseReport","buttons":1,"dx":10,"dy":-10,"wheel":0}
//! {"id":2,"success":false,"code":"NOT_CONNECTED","message":"No connected device"}
//! ```
//!
//! Wide integers for signed report fields are saturated to `i8`.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, ErrorResponse, Result};
use crate::hid::saturate_i8;
use crate::session::HidSession;

/// Caller-facing operation
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum BridgeCommand {
    Initialize,
    Connect {
        address: String,
    },
    Disconnect,
    SendKeyReport {
        modifier: u8,
        #[serde(rename = "keyCode")]
        key_code: u8,
    },
    ReleaseKeys,
    SendMouseReport {
        buttons: u8,
        dx: i32,
        dy: i32,
        #[serde(default)]
        wheel: i32,
    },
    SendMouseAbsoluteReport {
        buttons: u8,
        x: i32,
        y: i32,
        #[serde(default)]
        wheel: i32,
    },
}

/// Request line: an optional correlation ID plus the command
#[derive(Debug, Clone, Deserialize)]
pub struct BridgeRequest {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(flatten)]
    pub command: BridgeCommand,
}

impl BridgeRequest {
    pub fn parse(line: &str) -> Result<Self> {
        Ok(serde_json::from_str(line)?)
    }
}

/// Response line
#[derive(Debug, Serialize)]
pub struct BridgeResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl BridgeResponse {
    pub fn from_result(id: Option<u64>, result: &Result<()>) -> Self {
        match result {
            Ok(()) => Self {
                id,
                success: true,
                code: None,
                message: None,
            },
            Err(err) => Self::from_error(id, err),
        }
    }

    pub fn from_error(id: Option<u64>, err: &AppError) -> Self {
        let body = ErrorResponse::from(err);
        Self {
            id,
            success: body.success,
            code: Some(body.code),
            message: Some(body.message),
        }
    }
}

/// Run one command against the session
pub async fn dispatch(session: &HidSession, command: BridgeCommand) -> Result<()> {
    match command {
        BridgeCommand::Initialize => session.initialize().await,
        BridgeCommand::Connect { address } => session.connect(&address).await,
        BridgeCommand::Disconnect => session.disconnect().await,
        BridgeCommand::SendKeyReport { modifier, key_code } => {
            session.send_key_report(modifier, key_code).await
        }
        BridgeCommand::ReleaseKeys => session.release_keys().await,
        BridgeCommand::SendMouseReport {
            buttons,
            dx,
            dy,
            wheel,
        } => {
            session
                .send_mouse_report(buttons, saturate_i8(dx), saturate_i8(dy), saturate_i8(wheel))
                .await
        }
        BridgeCommand::SendMouseAbsoluteReport {
            buttons,
            x,
            y,
            wheel,
        } => {
            session
                .send_mouse_absolute_report(buttons, x, y, saturate_i8(wheel))
                .await
        }
    }
}

/// Parse a request line, run it and build the response
pub async fn handle_line(session: &HidSession, line: &str) -> BridgeResponse {
    match BridgeRequest::parse(line) {
        Ok(request) => {
            let result = dispatch(session, request.command).await;
            BridgeResponse::from_result(request.id, &result)
        }
        Err(err) => BridgeResponse::from_error(None, &err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        let req = BridgeRequest::parse(r#"{"id":7,"op":"initialize"}"#).unwrap();
        assert_eq!(req.id, Some(7));
        assert_eq!(req.command, BridgeCommand::Initialize);

        let req = BridgeRequest::parse(r#"{"op":"sendKeyReport","modifier":2,"keyCode":4}"#).unwrap();
        assert_eq!(req.id, None);
        assert_eq!(
            req.command,
            BridgeCommand::SendKeyReport {
                modifier: 2,
                key_code: 4
            }
        );

        let req = BridgeRequest::parse(r#"{"op":"sendMouseReport","buttons":1,"dx":300,"dy":-10}"#)
            .unwrap();
        assert_eq!(
            req.command,
            BridgeCommand::SendMouseReport {
                buttons: 1,
                dx: 300,
                dy: -10,
                wheel: 0
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        let err = BridgeRequest::parse(r#"{"op":"fly"}"#).unwrap_err();
        assert_eq!(err.code(), "SERIALIZATION");

        // Button mask does not fit in a byte
        assert!(BridgeRequest::parse(r#"{"op":"sendMouseReport","buttons":256,"dx":0,"dy":0}"#)
            .is_err());
    }

    #[test]
    fn test_response_format() {
        let ok = serde_json::to_string(&BridgeResponse::from_result(Some(1), &Ok(()))).unwrap();
        assert_eq!(ok, r#"{"id":1,"success":true}"#);

        let err = serde_json::to_value(BridgeResponse::from_result(
            None,
            &Err(AppError::NotConnected),
        ))
        .unwrap();
        assert_eq!(err["success"], false);
        assert_eq!(err["code"], "NOT_CONNECTED");
        assert_eq!(err["message"], "No connected device");
        assert!(err.get("id").is_none());
    }
}
