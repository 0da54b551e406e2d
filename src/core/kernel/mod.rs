/// `quotelink` kernel - transport layer for the quoting session
///
/// The kernel contains only transport logic and generic interfaces; nothing
/// in it knows about quotes or the gateway's event vocabulary.
///
/// # Architecture
///
/// - `EventChannel` / `TungsteniteChannel`: bidirectional, ordered event
///   channel over WebSocket, connect under a caller-supplied timeout
/// - `Signer` / `Ed25519Signer`: authentication credential signing, plus the
///   one-shot key-pair generation helper
/// - `WireCodec` / `WireEvent`: event-frame encoding/decoding, pluggable per
///   gateway dialect
///
/// The session layer (`crate::gateway`) composes these: it drives the auth
/// handshake over a generic channel and routes decoded messages to handlers.
pub mod channel;
pub mod codec;
pub mod signer;

// Re-export key types for convenience
pub use channel::{EventChannel, TungsteniteChannel};
pub use codec::{WireCodec, WireEvent};
pub use signer::{generate_signing_key, Ed25519Signer, Signer};
