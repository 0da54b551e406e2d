pub mod builder;
pub mod client;
pub mod codec;
pub mod dispatcher;
pub mod emitter;

// Re-export main types for easier importing
pub use builder::build_client;
pub use client::{QuoterClient, SessionHandle};
pub use codec::{GatewayCodec, GatewayMessage};
pub use dispatcher::EventDispatcher;
pub use emitter::ResponseEmitter;
