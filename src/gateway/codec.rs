use crate::core::errors::QuoterError;
use crate::core::kernel::{WireCodec, WireEvent};
use crate::core::types::{Quote, QuoteResponse};
use serde_json::Value;
use tokio_tungstenite::tungstenite::Message;

pub const EVENT_AUTH: &str = "auth";
pub const EVENT_AUTH_OK: &str = "auth_ok";
pub const EVENT_AUTH_ERROR: &str = "auth_error";
pub const EVENT_QUOTE_REQUEST: &str = "quote_request";
pub const EVENT_QUOTE_RESPONSE: &str = "quote_response";

/// Typed messages for the quoting gateway's event vocabulary
#[derive(Debug, Clone)]
pub enum GatewayMessage {
    AuthOk,
    AuthError { reason: String },
    QuoteRequest(Quote),
    Unknown(WireEvent),
}

/// Quoting gateway codec implementation
///
/// The event-name match below is the single routing table for inbound
/// events; there is no dynamic callback registration anywhere.
pub struct GatewayCodec;

impl GatewayCodec {
    pub fn new() -> Self {
        Self
    }

    fn decode_quote(data: &Value) -> Result<Quote, QuoterError> {
        Ok(Quote {
            id: require_str(data, "id")?,
            source_asset: require_str(data, "source_asset")?,
            destination_asset: require_str(data, "destination_asset")?,
            deposit_amount: require_str(data, "deposit_amount")?,
        })
    }
}

fn require_str(data: &Value, key: &str) -> Result<String, QuoterError> {
    data.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| QuoterError::MalformedQuote(format!("missing field `{}`", key)))
}

impl WireCodec for GatewayCodec {
    type Message = GatewayMessage;

    fn encode_event(&self, event: &str, data: Value) -> Result<Message, QuoterError> {
        WireEvent::new(event, data).into_message()
    }

    fn decode_message(&self, message: Message) -> Result<Option<Self::Message>, QuoterError> {
        match message {
            Message::Text(text) => {
                let frame: WireEvent = serde_json::from_str(&text)?;

                let decoded = match frame.event.as_str() {
                    EVENT_AUTH_OK => Some(GatewayMessage::AuthOk),
                    EVENT_AUTH_ERROR => Some(GatewayMessage::AuthError {
                        reason: frame
                            .data
                            .get("reason")
                            .and_then(Value::as_str)
                            .unwrap_or("unspecified")
                            .to_string(),
                    }),
                    EVENT_QUOTE_REQUEST => Some(GatewayMessage::QuoteRequest(Self::decode_quote(
                        &frame.data,
                    )?)),
                    _ => None,
                };

                Ok(Some(
                    decoded.unwrap_or_else(|| GatewayMessage::Unknown(frame)),
                ))
            }
            _ => Ok(None), // ignore non-text messages
        }
    }
}

impl Default for GatewayCodec {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the outbound frame for one priced response
pub fn encode_quote_response(response: &QuoteResponse) -> Result<WireEvent, QuoterError> {
    Ok(WireEvent::new(
        EVENT_QUOTE_RESPONSE,
        serde_json::to_value(response)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::QuotedAmounts;
    use serde_json::json;

    fn decode(codec: &GatewayCodec, frame: Value) -> Result<Option<GatewayMessage>, QuoterError> {
        codec.decode_message(Message::Text(frame.to_string()))
    }

    #[test]
    fn decodes_quote_request() {
        let codec = GatewayCodec::new();
        let frame = json!({
            "event": "quote_request",
            "data": {
                "id": "q1",
                "source_asset": "BTC",
                "destination_asset": "USDC",
                "deposit_amount": "0.5"
            }
        });

        let Some(GatewayMessage::QuoteRequest(quote)) = decode(&codec, frame).unwrap() else {
            panic!("expected a quote request");
        };
        assert_eq!(quote.id, "q1");
        assert_eq!(quote.source_asset, "BTC");
        assert_eq!(quote.destination_asset, "USDC");
        assert_eq!(quote.deposit_amount, "0.5");
    }

    #[test]
    fn missing_deposit_amount_is_malformed() {
        let codec = GatewayCodec::new();
        let frame = json!({
            "event": "quote_request",
            "data": {
                "id": "q1",
                "source_asset": "BTC",
                "destination_asset": "USDC"
            }
        });

        let err = decode(&codec, frame).unwrap_err();
        assert!(matches!(err, QuoterError::MalformedQuote(_)));
        assert!(err.to_string().contains("deposit_amount"));
    }

    #[test]
    fn non_string_amount_is_malformed() {
        let codec = GatewayCodec::new();
        let frame = json!({
            "event": "quote_request",
            "data": {
                "id": "q1",
                "source_asset": "BTC",
                "destination_asset": "USDC",
                "deposit_amount": 0.5
            }
        });

        assert!(matches!(
            decode(&codec, frame),
            Err(QuoterError::MalformedQuote(_))
        ));
    }

    #[test]
    fn decodes_auth_outcomes() {
        let codec = GatewayCodec::new();

        assert!(matches!(
            decode(&codec, json!({"event": "auth_ok"})).unwrap(),
            Some(GatewayMessage::AuthOk)
        ));

        let Some(GatewayMessage::AuthError { reason }) = decode(
            &codec,
            json!({"event": "auth_error", "data": {"reason": "bad signature"}}),
        )
        .unwrap() else {
            panic!("expected auth_error");
        };
        assert_eq!(reason, "bad signature");
    }

    #[test]
    fn unknown_events_are_preserved() {
        let codec = GatewayCodec::new();
        let Some(GatewayMessage::Unknown(frame)) =
            decode(&codec, json!({"event": "heartbeat", "data": {}})).unwrap()
        else {
            panic!("expected unknown event");
        };
        assert_eq!(frame.event, "heartbeat");
    }

    #[test]
    fn response_frame_preserves_id() {
        let response = QuoteResponse::new(
            "q-9".to_string(),
            QuotedAmounts {
                intermediate_amount: "100".to_string(),
                egress_amount: "99".to_string(),
            },
        );

        let frame = encode_quote_response(&response).unwrap();
        assert_eq!(frame.event, EVENT_QUOTE_RESPONSE);
        assert_eq!(frame.data["id"], "q-9");
        assert_eq!(frame.data["intermediate_amount"], "100");
        assert_eq!(frame.data["egress_amount"], "99");
    }
}
