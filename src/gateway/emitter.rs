use crate::core::kernel::WireEvent;
use crate::core::session::SessionState;
use crate::core::types::QuoteResponse;
use crate::gateway::codec::encode_quote_response;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Sends priced responses back over the channel, gated by session state.
///
/// A response for a session that has already ended is stale and must not be
/// delivered to a new session: the send is dropped, not queued or retried.
#[derive(Clone)]
pub struct ResponseEmitter {
    outbound: mpsc::Sender<WireEvent>,
    state: Arc<SessionState>,
}

impl ResponseEmitter {
    pub(crate) fn new(outbound: mpsc::Sender<WireEvent>, state: Arc<SessionState>) -> Self {
        Self { outbound, state }
    }

    /// Queue one response for delivery; drops it if the session has ended.
    pub async fn send(&self, response: QuoteResponse) {
        if !self.state.is_connected() {
            debug!(quote_id = %response.id, "Session disconnected, dropping quote response");
            return;
        }

        let frame = match encode_quote_response(&response) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(quote_id = %response.id, "Failed to encode quote response: {}", e);
                return;
            }
        };

        // The receiver closes with the session; a stale response dies here.
        if self.outbound.send(frame).await.is_err() {
            debug!(quote_id = %response.id, "Outbound queue closed, dropping quote response");
        }
    }
}
