pub mod core;
pub mod gateway;

pub use crate::core::config::QuoterConfig;
pub use crate::core::errors::QuoterError;
pub use crate::core::traits::QuoteHandler;
pub use crate::core::types::{AuthPayload, Quote, QuoteResponse, QuotedAmounts};
pub use crate::gateway::{build_client, QuoterClient, SessionHandle};
