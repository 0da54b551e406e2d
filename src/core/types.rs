use crate::core::errors::QuoterError;
use crate::core::kernel::signer::Signer;
use base64::{engine::general_purpose, Engine as _};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Protocol revision presented to the gateway at connect time.
pub const CLIENT_VERSION: &str = "1";

/// One pricing inquiry pushed by the gateway.
///
/// `id` is the correlation key for the eventual response. Uniqueness across
/// outstanding requests is the gateway's obligation, not checked here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub id: String,
    pub source_asset: String,
    pub destination_asset: String,
    pub deposit_amount: String,
}

/// The two amounts a handler prices for one quote.
///
/// Amounts are opaque decimal strings, passed through verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotedAmounts {
    pub intermediate_amount: String,
    pub egress_amount: String,
}

/// Priced response for one quote, sent at most once, never retried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteResponse {
    pub id: String,
    pub intermediate_amount: String,
    pub egress_amount: String,
}

impl QuoteResponse {
    #[must_use]
    pub fn new(id: String, amounts: QuotedAmounts) -> Self {
        Self {
            id,
            intermediate_amount: amounts.intermediate_amount,
            egress_amount: amounts.egress_amount,
        }
    }
}

/// Signed authentication credential presented once per connection attempt.
///
/// The signature covers exactly `market_maker_id || decimal(timestamp)`, no
/// delimiter. Built fresh for every attempt - a reused payload would carry a
/// stale timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthPayload {
    pub client_version: String,
    pub timestamp: u64,
    pub market_maker_id: String,
    pub signature: String,
}

impl AuthPayload {
    /// Build a credential for `market_maker_id` at the current wall-clock time.
    pub fn new(signer: &dyn Signer, market_maker_id: &str) -> Result<Self, QuoterError> {
        Self::at(signer, market_maker_id, current_timestamp_ms())
    }

    fn at(signer: &dyn Signer, market_maker_id: &str, timestamp: u64) -> Result<Self, QuoterError> {
        let signature = signer.sign(market_maker_id, timestamp)?;
        Ok(Self {
            client_version: CLIENT_VERSION.to_string(),
            timestamp,
            market_maker_id: market_maker_id.to_string(),
            signature: general_purpose::STANDARD.encode(signature),
        })
    }
}

/// Current wall-clock time as epoch milliseconds.
pub fn current_timestamp_ms() -> u64 {
    // A pre-epoch system clock reads as zero rather than panicking.
    Utc::now().timestamp_millis().max(0) as u64
}
