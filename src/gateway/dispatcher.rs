use crate::core::traits::QuoteHandler;
use crate::core::types::{Quote, QuoteResponse};
use crate::gateway::codec::GatewayMessage;
use crate::gateway::emitter::ResponseEmitter;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, warn};

/// Routes decoded gateway messages to the pricing handler.
///
/// Each quote request becomes its own task, so receipt of the next event is
/// never blocked by in-progress pricing. Handler failures and panics are
/// contained per request; the affected quote simply receives no response.
pub struct EventDispatcher<H: QuoteHandler> {
    handler: Arc<H>,
    emitter: ResponseEmitter,
    tasks: JoinSet<()>,
    // Ids with a pricing task still running; reused ids are surfaced, not fixed.
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl<H: QuoteHandler> EventDispatcher<H> {
    pub fn new(handler: Arc<H>, emitter: ResponseEmitter) -> Self {
        Self {
            handler,
            emitter,
            tasks: JoinSet::new(),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Route one decoded message; never fails the session.
    pub fn dispatch(&mut self, message: GatewayMessage) {
        match message {
            GatewayMessage::QuoteRequest(quote) => self.spawn_quote_task(quote),
            GatewayMessage::AuthOk => {
                debug!("Ignoring auth_ok outside the handshake");
            }
            GatewayMessage::AuthError { reason } => {
                warn!(%reason, "Gateway sent auth_error outside the handshake");
            }
            GatewayMessage::Unknown(frame) => {
                debug!(event = %frame.event, "Ignoring unknown gateway event");
            }
        }
    }

    fn spawn_quote_task(&mut self, quote: Quote) {
        let fresh = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(quote.id.clone());
        if !fresh {
            // The gateway owes us unique ids; a reused one means the later
            // response wins on the wire. Detectable, deliberately not masked.
            warn!(quote_id = %quote.id, "Duplicate quote id while a previous request is in flight");
        }

        let handler = Arc::clone(&self.handler);
        let emitter = self.emitter.clone();
        let in_flight = Arc::clone(&self.in_flight);

        self.tasks.spawn(async move {
            match handler.quote(&quote).await {
                Ok(amounts) => {
                    emitter
                        .send(QuoteResponse::new(quote.id.clone(), amounts))
                        .await;
                }
                Err(e) => {
                    warn!(quote_id = %quote.id, "Quote handler failed, no response sent: {}", e);
                }
            }
            in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&quote.id);
        });
    }

    /// Await the next finished pricing task
    pub async fn join_next(&mut self) -> Option<Result<(), JoinError>> {
        self.tasks.join_next().await
    }

    pub fn has_tasks(&self) -> bool {
        !self.tasks.is_empty()
    }

    /// Abandon all in-flight pricing tasks (the disconnect policy: their
    /// responses must not reach a later session anyway).
    pub fn abandon(&mut self) {
        self.tasks.abort_all();
    }
}

/// Log one reaped task outcome; a panicking handler is contained here.
pub fn observe_task(joined: Result<(), JoinError>) {
    if let Err(e) = joined {
        if e.is_panic() {
            error!("Quote handler task panicked: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::QuoterError;
    use crate::core::session::SessionState;
    use crate::core::types::QuotedAmounts;
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    struct EchoHandler {
        delay_ms: u64,
    }

    #[async_trait]
    impl QuoteHandler for EchoHandler {
        async fn quote(&self, quote: &Quote) -> Result<QuotedAmounts, QuoterError> {
            if self.delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            }
            if quote.deposit_amount == "fail" {
                return Err(QuoterError::Handler("no price".to_string()));
            }
            Ok(QuotedAmounts {
                intermediate_amount: format!("i-{}", quote.id),
                egress_amount: format!("e-{}", quote.id),
            })
        }
    }

    fn quote(id: &str, deposit: &str) -> Quote {
        Quote {
            id: id.to_string(),
            source_asset: "BTC".to_string(),
            destination_asset: "USDC".to_string(),
            deposit_amount: deposit.to_string(),
        }
    }

    fn dispatcher(
        delay_ms: u64,
    ) -> (
        EventDispatcher<EchoHandler>,
        mpsc::Receiver<crate::core::kernel::WireEvent>,
    ) {
        let (tx, rx) = mpsc::channel(16);
        let state = Arc::new(SessionState::new());
        state.set_connected(true);
        let emitter = ResponseEmitter::new(tx, state);
        (
            EventDispatcher::new(Arc::new(EchoHandler { delay_ms }), emitter),
            rx,
        )
    }

    #[tokio::test]
    async fn quote_request_produces_matching_response() {
        let (mut dispatcher, mut rx) = dispatcher(0);
        dispatcher.dispatch(GatewayMessage::QuoteRequest(quote("q1", "1.0")));

        let frame = timeout(Duration::from_secs(1), rx.recv()).await.unwrap().unwrap();
        assert_eq!(frame.data["id"], "q1");
        assert_eq!(frame.data["intermediate_amount"], "i-q1");
        assert_eq!(frame.data["egress_amount"], "e-q1");
    }

    #[tokio::test]
    async fn handler_failure_is_contained() {
        let (mut dispatcher, mut rx) = dispatcher(0);
        dispatcher.dispatch(GatewayMessage::QuoteRequest(quote("bad", "fail")));
        dispatcher.dispatch(GatewayMessage::QuoteRequest(quote("good", "1.0")));

        // Only the good quote answers; the failed one is silent.
        let frame = timeout(Duration::from_secs(1), rx.recv()).await.unwrap().unwrap();
        assert_eq!(frame.data["id"], "good");
        while dispatcher.has_tasks() {
            dispatcher.join_next().await;
        }
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn concurrent_quotes_may_complete_out_of_order() {
        // "a" is slowed down inside the handler; "b" overtakes it.
        struct SlowFirst;
        #[async_trait]
        impl QuoteHandler for SlowFirst {
            async fn quote(&self, quote: &Quote) -> Result<QuotedAmounts, QuoterError> {
                if quote.id == "a" {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
                Ok(QuotedAmounts {
                    intermediate_amount: quote.id.clone(),
                    egress_amount: quote.id.clone(),
                })
            }
        }

        let (tx, mut rx) = mpsc::channel(16);
        let state = Arc::new(SessionState::new());
        state.set_connected(true);
        let mut dispatcher =
            EventDispatcher::new(Arc::new(SlowFirst), ResponseEmitter::new(tx, state));

        dispatcher.dispatch(GatewayMessage::QuoteRequest(quote("a", "1")));
        dispatcher.dispatch(GatewayMessage::QuoteRequest(quote("b", "1")));

        let first = timeout(Duration::from_secs(1), rx.recv()).await.unwrap().unwrap();
        let second = timeout(Duration::from_secs(1), rx.recv()).await.unwrap().unwrap();

        // Submitted a-then-b, completed b-then-a; each response matches its own id.
        assert_eq!(first.data["id"], "b");
        assert_eq!(second.data["id"], "a");
        assert_eq!(first.data["intermediate_amount"], "b");
        assert_eq!(second.data["intermediate_amount"], "a");
    }

    #[tokio::test]
    async fn duplicate_ids_are_surfaced_but_still_served() {
        let (mut dispatcher, mut rx) = dispatcher(0);
        dispatcher.dispatch(GatewayMessage::QuoteRequest(quote("dup", "1.0")));
        dispatcher.dispatch(GatewayMessage::QuoteRequest(quote("dup", "2.0")));

        // Last-write-wins is the gateway's problem; both answers go out.
        let first = timeout(Duration::from_secs(1), rx.recv()).await.unwrap().unwrap();
        let second = timeout(Duration::from_secs(1), rx.recv()).await.unwrap().unwrap();
        assert_eq!(first.data["id"], "dup");
        assert_eq!(second.data["id"], "dup");
    }

    #[tokio::test]
    async fn abandoned_tasks_send_nothing() {
        let (mut dispatcher, mut rx) = dispatcher(200);
        dispatcher.dispatch(GatewayMessage::QuoteRequest(quote("q1", "1.0")));
        dispatcher.abandon();

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(rx.try_recv().is_err());
    }
}
