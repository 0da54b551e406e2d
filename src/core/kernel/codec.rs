use crate::core::errors::QuoterError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_tungstenite::tungstenite::Message;

/// One event frame on the wire: a JSON text message `{"event": ..., "data": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireEvent {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl WireEvent {
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    /// Serialize this frame into a WebSocket text message
    pub fn into_message(self) -> Result<Message, QuoterError> {
        Ok(Message::Text(serde_json::to_string(&self)?))
    }
}

/// Codec trait for gateway-specific event encoding/decoding
///
/// Converts between raw WebSocket messages and typed gateway messages.
/// Control frames (ping, pong, close) never reach a codec; they are handled
/// at the transport level.
pub trait WireCodec: Send + Sync + 'static {
    /// The type representing parsed messages from this gateway
    type Message: Send;

    /// Encode a named event and its payload into a WebSocket message
    fn encode_event(&self, event: &str, data: Value) -> Result<Message, QuoterError>;

    /// Decode a raw WebSocket message into a typed message
    ///
    /// # Returns
    /// - `Ok(Some(message))` - successfully decoded message
    /// - `Ok(None)` - message was ignored/filtered by the codec
    /// - `Err(error)` - failed to decode message
    fn decode_message(&self, message: Message) -> Result<Option<Self::Message>, QuoterError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn frame_round_trip() {
        let frame = WireEvent::new("quote_request", json!({"id": "q1"}));
        let message = frame.clone().into_message().unwrap();
        let Message::Text(text) = message else {
            panic!("expected a text frame");
        };
        let parsed: WireEvent = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, frame);
    }

    #[test]
    fn missing_data_defaults_to_null() {
        let parsed: WireEvent = serde_json::from_str(r#"{"event":"auth_ok"}"#).unwrap();
        assert_eq!(parsed.event, "auth_ok");
        assert!(parsed.data.is_null());
    }
}
