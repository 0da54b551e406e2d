use crate::core::config::QuoterConfig;
use crate::core::kernel::TungsteniteChannel;
use crate::core::traits::QuoteHandler;
use crate::gateway::client::QuoterClient;
use crate::gateway::codec::GatewayCodec;

/// Create a quoting client over the standard WebSocket channel
pub fn build_client<H: QuoteHandler>(
    config: QuoterConfig,
    handler: H,
) -> QuoterClient<H, TungsteniteChannel<GatewayCodec>> {
    let channel = TungsteniteChannel::new(
        config.endpoint.clone(),
        "quote-gateway".to_string(),
        GatewayCodec::new(),
    );

    QuoterClient::with_channel(config, handler, channel)
}
