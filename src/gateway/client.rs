use crate::core::config::QuoterConfig;
use crate::core::errors::QuoterError;
use crate::core::kernel::{Ed25519Signer, EventChannel, WireEvent};
use crate::core::session::SessionState;
use crate::core::traits::QuoteHandler;
use crate::core::types::AuthPayload;
use crate::gateway::codec::{GatewayMessage, EVENT_AUTH};
use crate::gateway::dispatcher::{self, EventDispatcher};
use crate::gateway::emitter::ResponseEmitter;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{timeout, Instant};
use tracing::{debug, info, instrument, warn};

/// Handle for requesting disconnection from outside the session task.
///
/// Cloneable and cheap; `disconnect` is idempotent and a no-op when no
/// session is running.
#[derive(Clone)]
pub struct SessionHandle {
    state: Arc<SessionState>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl SessionHandle {
    /// Request a graceful close of the running session.
    pub fn disconnect(&self) {
        // No receiver means no session; nothing to do.
        let _ = self.shutdown.send(true);
    }

    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }
}

/// Market maker quoting client
///
/// Owns one session at a time: builds the signed credential, drives the
/// connect-and-authenticate handshake under the configured timeout, then
/// pumps gateway events until either side ends the session. The instance can
/// be reused for a fresh attempt afterwards; every attempt signs a fresh
/// credential.
pub struct QuoterClient<H, C>
where
    H: QuoteHandler,
    C: EventChannel<Message = GatewayMessage>,
{
    config: QuoterConfig,
    handler: Arc<H>,
    channel: C,
    state: Arc<SessionState>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl<H, C> QuoterClient<H, C>
where
    H: QuoteHandler,
    C: EventChannel<Message = GatewayMessage>,
{
    /// Create a client over an already-constructed channel
    pub fn with_channel(config: QuoterConfig, handler: H, channel: C) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            config,
            handler: Arc::new(handler),
            channel,
            state: Arc::new(SessionState::new()),
            shutdown: Arc::new(shutdown),
        }
    }

    /// Get a disconnect handle usable from other tasks
    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            state: Arc::clone(&self.state),
            shutdown: Arc::clone(&self.shutdown),
        }
    }

    /// Run one full session: connect, authenticate, serve quotes, tear down.
    ///
    /// Blocks until the session ends. Signing, timeout, and rejection
    /// failures surface from here; per-event failures never do.
    #[instrument(skip(self), fields(endpoint = %self.config.endpoint, market_maker_id = %self.config.market_maker_id))]
    pub async fn run(&mut self) -> Result<(), QuoterError> {
        let budget = Duration::from_millis(self.config.connect_timeout_ms);
        let deadline = Instant::now() + budget;

        // Signing happens before any network I/O; bad key material never dials.
        let signer = Ed25519Signer::from_key_material(
            self.config.signing_key(),
            self.config.key_password_secret(),
        )?;
        let auth = AuthPayload::new(&signer, &self.config.market_maker_id)?;

        self.channel.connect(remaining(deadline)).await?;

        if let Err(e) = self.authenticate(&auth, deadline, budget).await {
            let _ = self.channel.close().await;
            return Err(e);
        }

        self.state.set_connected(true);
        // The hook runs before the first quote request is dispatched.
        self.handler.on_connect();
        info!("Quoting session established");

        let result = self.pump_events().await;

        self.state.set_connected(false);
        let _ = self.channel.close().await;
        info!("Quoting session ended");
        result
    }

    /// Present the credential and wait for the gateway's verdict.
    async fn authenticate(
        &mut self,
        auth: &AuthPayload,
        deadline: Instant,
        budget: Duration,
    ) -> Result<(), QuoterError> {
        self.channel
            .emit(EVENT_AUTH, serde_json::to_value(auth)?)
            .await?;

        loop {
            match timeout(remaining(deadline), self.channel.next_event()).await {
                Err(_) => {
                    return Err(QuoterError::ConnectionTimeout(format!(
                        "No auth confirmation within {:?}",
                        budget
                    )));
                }
                Ok(None) => {
                    return Err(QuoterError::Network(
                        "Gateway closed the connection during authentication".to_string(),
                    ));
                }
                Ok(Some(Ok(GatewayMessage::AuthOk))) => return Ok(()),
                Ok(Some(Ok(GatewayMessage::AuthError { reason }))) => {
                    return Err(QuoterError::AuthRejected(reason));
                }
                Ok(Some(Ok(other))) => {
                    debug!(?other, "Ignoring gateway event before auth confirmation");
                }
                Ok(Some(Err(e))) => return Err(e),
            }
        }
    }

    /// Serve the connected session until it ends.
    async fn pump_events(&mut self) -> Result<(), QuoterError> {
        let (outbound_tx, mut outbound_rx) = mpsc::channel::<WireEvent>(self.config.outbound_buffer);
        let emitter = ResponseEmitter::new(outbound_tx, Arc::clone(&self.state));
        let mut dispatcher = EventDispatcher::new(Arc::clone(&self.handler), emitter);
        let mut shutdown_rx = self.shutdown.subscribe();

        // Each select round resolves to one step; acting outside the select
        // keeps the channel and dispatcher free of overlapping borrows.
        enum Step {
            Shutdown,
            Outbound(WireEvent),
            OutboundClosed,
            Inbound(Option<Result<GatewayMessage, QuoterError>>),
            Reaped(Result<(), tokio::task::JoinError>),
        }

        let result = loop {
            let step = tokio::select! {
                _ = shutdown_rx.changed() => Step::Shutdown,
                maybe = outbound_rx.recv() => maybe.map_or(Step::OutboundClosed, Step::Outbound),
                event = self.channel.next_event() => Step::Inbound(event),
                Some(joined) = dispatcher.join_next() => Step::Reaped(joined),
            };

            match step {
                Step::Shutdown => {
                    info!("Disconnect requested");
                    break Ok(());
                }
                Step::Outbound(frame) => {
                    if let Err(e) = self.channel.emit(&frame.event, frame.data).await {
                        warn!("Failed to send response frame: {}", e);
                        break Err(e);
                    }
                }
                // All emitters dropped; nothing left to serve.
                Step::OutboundClosed => break Ok(()),
                Step::Inbound(Some(Ok(message))) => dispatcher.dispatch(message),
                // One bad event never takes the session down.
                Step::Inbound(Some(Err(QuoterError::MalformedQuote(reason)))) => {
                    warn!(%reason, "Dropping malformed quote request");
                }
                Step::Inbound(Some(Err(QuoterError::Json(e)))) => {
                    warn!("Dropping unparseable gateway frame: {}", e);
                }
                Step::Inbound(Some(Err(e))) => break Err(e),
                Step::Inbound(None) => {
                    info!("Gateway closed the session");
                    break Ok(());
                }
                Step::Reaped(joined) => dispatcher::observe_task(joined),
            }
        };

        // Abandon-and-drop: in-flight pricing must not outlive the session.
        dispatcher.abandon();
        result
    }
}

fn remaining(deadline: Instant) -> Duration {
    deadline.saturating_duration_since(Instant::now())
}
