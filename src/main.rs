use anyhow::Context;
use async_trait::async_trait;
use quotelink::core::config::QuoterConfig;
use quotelink::{build_client, Quote, QuoteHandler, QuotedAmounts, QuoterError};
use rust_decimal::Decimal;
use tracing::info;

/// Demo pricer: quotes every request at a fixed spread off the deposit.
struct FixedSpreadHandler {
    spread_bps: Decimal,
}

#[async_trait]
impl QuoteHandler for FixedSpreadHandler {
    async fn quote(&self, quote: &Quote) -> Result<QuotedAmounts, QuoterError> {
        let deposit: Decimal = quote
            .deposit_amount
            .parse()
            .map_err(|e| QuoterError::Handler(format!("Unparseable deposit_amount: {}", e)))?;

        let egress = deposit * (Decimal::ONE - self.spread_bps / Decimal::from(10_000));

        Ok(QuotedAmounts {
            intermediate_amount: deposit.normalize().to_string(),
            egress_amount: egress.normalize().to_string(),
        })
    }

    fn on_connect(&self) {
        info!("Connected to quoting gateway, serving quotes");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    #[cfg(feature = "env-file")]
    let config = QuoterConfig::from_env_file().context("loading quoter configuration")?;
    #[cfg(not(feature = "env-file"))]
    let config = QuoterConfig::from_env().context("loading quoter configuration")?;

    let mut client = build_client(
        config,
        FixedSpreadHandler {
            spread_bps: Decimal::from(30),
        },
    );

    let handle = client.handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handle.disconnect();
        }
    });

    client.run().await?;
    Ok(())
}
