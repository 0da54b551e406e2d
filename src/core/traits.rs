use crate::core::{
    errors::QuoterError,
    types::{Quote, QuotedAmounts},
};
use async_trait::async_trait;

/// Pricing capability supplied by the integrator.
///
/// Invocations run as concurrent tasks; a slow quote never blocks receipt of
/// the next one. Failures are contained per request - the session stays up and
/// that one quote simply receives no response.
#[async_trait]
pub trait QuoteHandler: Send + Sync + 'static {
    /// Price a single quote request.
    ///
    /// The core imposes no deadline here; an integrator wanting bounded
    /// latency per quote must impose it inside this method.
    async fn quote(&self, quote: &Quote) -> Result<QuotedAmounts, QuoterError>;

    /// Called exactly once, synchronously, after the authenticated handshake
    /// succeeds and before any quote request is dispatched.
    fn on_connect(&self) {}
}
