use serde::Deserialize;
use serde_json::json;

use crate::error::AppError;

/// Marker for the `"type": "typing"` tag on inbound frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum TypingTag {
    #[serde(rename = "typing")]
    Typing,
}

/// Inbound WebSocket events from client to server
///
/// The wire contract is asymmetric: a typing frame carries `"type":"typing"`,
/// while a chat frame carries no recognized `type` at all and is selected
/// structurally by its required `message` and `iv` fields. Content and iv are
/// opaque to the relay; clients encrypt and decrypt them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum InboundEvent {
    Typing {
        #[serde(rename = "type")]
        _tag: TypingTag,
    },
    Message {
        message: String,
        iv: String,
    },
}

impl InboundEvent {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        serde_json::from_str(raw).map_err(|e| AppError::MalformedFrame(e.to_string()))
    }
}

/// Outbound WebSocket events from server to client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundEvent {
    Typing {
        username: String,
    },
    /// Chat frames carry no `type` field, matching what deployed clients
    /// already parse.
    Message {
        message: String,
        iv: Option<String>,
        username: String,
    },
    /// Error acknowledgment delivered only to the originating connection.
    Error {
        reason: String,
    },
}

impl OutboundEvent {
    pub fn to_frame(&self) -> String {
        match self {
            OutboundEvent::Typing { username } => json!({
                "type": "typing",
                "username": username,
            })
            .to_string(),
            OutboundEvent::Message {
                message,
                iv,
                username,
            } => json!({
                "message": message,
                "iv": iv,
                "username": username,
            })
            .to_string(),
            OutboundEvent::Error { reason } => json!({
                "type": "error",
                "error": reason,
            })
            .to_string(),
        }
    }
}
