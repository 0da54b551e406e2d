use crate::core::errors::QuoterError;
use crate::core::kernel::codec::WireCodec;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use tracing::{instrument, warn};

/// Bidirectional, ordered event channel - pure transport layer
///
/// The trait knows nothing about authentication or quoting; it moves named
/// events with JSON payloads. The session layer drives the handshake on top.
#[async_trait]
pub trait EventChannel: Send {
    /// The type of decoded inbound messages
    type Message: Send;

    /// Open the channel, failing with `ConnectionTimeout` if the endpoint
    /// does not accept within `timeout`
    async fn connect(&mut self, timeout: Duration) -> Result<(), QuoterError>;

    /// Send one named event with its payload
    async fn emit(&mut self, event: &str, data: Value) -> Result<(), QuoterError>;

    /// Receive the next decoded inbound message
    ///
    /// `None` means the far end closed the channel.
    async fn next_event(&mut self) -> Option<Result<Self::Message, QuoterError>>;

    /// Close the channel; idempotent
    async fn close(&mut self) -> Result<(), QuoterError>;

    /// Check if the channel is alive
    fn is_connected(&self) -> bool;
}

type WsStream = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Tungstenite-based event channel
pub struct TungsteniteChannel<C: WireCodec> {
    url: String,
    gateway_name: String,
    codec: C,
    write: Option<futures_util::stream::SplitSink<WsStream, Message>>,
    read: Option<futures_util::stream::SplitStream<WsStream>>,
    connected: bool,
}

impl<C: WireCodec> TungsteniteChannel<C> {
    /// Create a new channel against `url`
    ///
    /// # Arguments
    /// * `url` - the WebSocket URL to connect to
    /// * `gateway_name` - name of the gateway for logging/tracing
    /// * `codec` - the codec decoding inbound frames
    pub fn new(url: String, gateway_name: String, codec: C) -> Self {
        Self {
            url,
            gateway_name,
            codec,
            write: None,
            read: None,
            connected: false,
        }
    }

    async fn send_raw(&mut self, msg: Message) -> Result<(), QuoterError> {
        use futures_util::SinkExt;

        if !self.connected {
            return Err(QuoterError::Network("Channel not connected".to_string()));
        }

        let write = self
            .write
            .as_mut()
            .ok_or_else(|| QuoterError::Network("Channel write half not available".to_string()))?;

        write.send(msg).await.map_err(|e| {
            self.connected = false;
            QuoterError::Network(format!("Failed to send event frame: {}", e))
        })?;

        Ok(())
    }

    async fn next_raw(&mut self) -> Option<Result<Message, QuoterError>> {
        use futures_util::StreamExt;

        loop {
            if !self.connected {
                return None;
            }

            let next = self.read.as_mut()?.next().await;
            match next {
                Some(Ok(Message::Ping(data))) => {
                    // Pings are answered at the transport level.
                    if let Err(e) = self.send_raw(Message::Pong(data)).await {
                        warn!(gateway = %self.gateway_name, "Failed to send pong response: {}", e);
                    }
                }
                Some(Ok(Message::Pong(_))) => {}
                Some(Ok(Message::Close(_))) => {
                    self.connected = false;
                    return None;
                }
                Some(Ok(message)) => return Some(Ok(message)),
                Some(Err(e)) => {
                    self.connected = false;
                    return Some(Err(QuoterError::Network(format!(
                        "Channel error: {}",
                        e
                    ))));
                }
                None => {
                    self.connected = false;
                    return None;
                }
            }
        }
    }
}

#[async_trait]
impl<C: WireCodec> EventChannel for TungsteniteChannel<C> {
    type Message = C::Message;

    #[instrument(skip(self), fields(gateway = %self.gateway_name, url = %self.url))]
    async fn connect(&mut self, timeout: Duration) -> Result<(), QuoterError> {
        use futures_util::StreamExt;

        let connection_future = tokio::time::timeout(timeout, connect_async(&self.url));

        let (ws_stream, _) = connection_future
            .await
            .map_err(|_| {
                QuoterError::ConnectionTimeout(format!(
                    "No connection to {} within {:?}",
                    self.url, timeout
                ))
            })?
            .map_err(|e| QuoterError::Network(format!("Connection failed: {}", e)))?;

        let (write, read) = ws_stream.split();
        self.write = Some(write);
        self.read = Some(read);
        self.connected = true;

        Ok(())
    }

    async fn emit(&mut self, event: &str, data: Value) -> Result<(), QuoterError> {
        let msg = self.codec.encode_event(event, data)?;
        self.send_raw(msg).await
    }

    async fn next_event(&mut self) -> Option<Result<Self::Message, QuoterError>> {
        loop {
            match self.next_raw().await {
                Some(Ok(raw)) => match self.codec.decode_message(raw) {
                    Ok(Some(decoded)) => return Some(Ok(decoded)),
                    Ok(None) => {} // codec chose to ignore this message
                    Err(e) => return Some(Err(e)),
                },
                Some(Err(e)) => return Some(Err(e)),
                None => return None,
            }
        }
    }

    #[instrument(skip(self), fields(gateway = %self.gateway_name))]
    async fn close(&mut self) -> Result<(), QuoterError> {
        use futures_util::SinkExt;

        if let Some(write) = self.write.as_mut() {
            let _ = write.send(Message::Close(None)).await;
        }
        self.connected = false;
        self.write = None;
        self.read = None;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}
