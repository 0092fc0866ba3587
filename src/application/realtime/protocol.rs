//! Wire format of the dashboard push channel.
//!
//! Every frame is a JSON object `{"type": ..., "data": ...}`.

use crate::domain::entities::TicketSummary;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Most recently active tickets, sent once right after authentication
    Baseline(Vec<TicketSummary>),
    /// One changed ticket; clients upsert by id
    NewItem(TicketSummary),
    Auth {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    Ping {
        success: bool,
    },
    Error {
        message: String,
    },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            tracing::error!("Failed to serialise server message: {}", e);
            r#"{"type":"error","data":{"message":"Serialisation failure"}}"#.to_string()
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    Auth { token: String },
    Ping,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    Malformed,
    UnknownType(String),
    MissingToken,
}

impl ProtocolError {
    /// Text sent back to the client in an `error` frame
    pub fn client_message(&self) -> &'static str {
        match self {
            ProtocolError::Malformed => "Invalid message format",
            ProtocolError::UnknownType(_) => "Invalid message type",
            ProtocolError::MissingToken => "Missing token",
        }
    }
}

#[derive(Deserialize)]
struct RawClientMessage {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: serde_json::Value,
}

impl ClientMessage {
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let raw: RawClientMessage =
            serde_json::from_str(text).map_err(|_| ProtocolError::Malformed)?;

        match raw.kind.as_str() {
            "ping" => Ok(ClientMessage::Ping),
            "auth" => raw
                .data
                .get("token")
                .and_then(|t| t.as_str())
                .filter(|t| !t.is_empty())
                .map(|token| ClientMessage::Auth {
                    token: token.to_string(),
                })
                .ok_or(ProtocolError::MissingToken),
            other => Err(ProtocolError::UnknownType(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_server_frames_shape() {
        let auth = serde_json::to_value(ServerMessage::Auth {
            success: true,
            error: None,
        })
        .unwrap();
        assert_eq!(auth, json!({"type": "auth", "data": {"success": true}}));

        let ping = serde_json::to_value(ServerMessage::Ping { success: true }).unwrap();
        assert_eq!(ping, json!({"type": "ping", "data": {"success": true}}));

        let baseline = serde_json::to_value(ServerMessage::Baseline(vec![])).unwrap();
        assert_eq!(baseline, json!({"type": "baseline", "data": []}));

        let err = serde_json::to_value(ServerMessage::error("Invalid message type")).unwrap();
        assert_eq!(
            err,
            json!({"type": "error", "data": {"message": "Invalid message type"}})
        );
    }

    #[test]
    fn test_parse_client_messages() {
        assert_eq!(
            ClientMessage::parse(r#"{"type":"auth","data":{"token":"abc"}}"#),
            Ok(ClientMessage::Auth {
                token: "abc".to_string()
            })
        );
        assert_eq!(
            ClientMessage::parse(r#"{"type":"ping"}"#),
            Ok(ClientMessage::Ping)
        );
        assert_eq!(
            ClientMessage::parse(r#"{"type":"ping","data":{}}"#),
            Ok(ClientMessage::Ping)
        );
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!(ClientMessage::parse("not json"), Err(ProtocolError::Malformed));
        assert_eq!(
            ClientMessage::parse(r#"{"type":"subscribe"}"#),
            Err(ProtocolError::UnknownType("subscribe".to_string()))
        );
        assert_eq!(
            ClientMessage::parse(r#"{"type":"auth","data":{}}"#),
            Err(ProtocolError::MissingToken)
        );
    }
}
