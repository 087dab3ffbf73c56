//! CLI that drives one custody signing flow end to end.
//!
//! Loads the signer configuration, wires the provider adapter over the
//! configured JSON-RPC endpoint, submits a transaction for signing, and waits
//! for the human approval to complete before printing the signed bytes.

mod metrics;

use alloy_primitives::U256;
use clap::{Parser, Subcommand};
use config::Config;
use custody::RawTransaction;
use provider::{CustodyProvider, NonceTracker};
use std::time::Instant;
use tracing::info;

#[derive(Parser)]
#[command(name = "signer")]
#[command(about = "Sign transactions through a custody approval workflow")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Expose Prometheus metrics on this port
    #[arg(long)]
    metrics_port: Option<u16>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Submit one transaction for signing and wait for approval
    Sign {
        /// Recipient address
        #[arg(long)]
        to: String,

        /// Amount in wei (decimal)
        #[arg(long)]
        value: Option<String>,

        /// Gas limit (decimal)
        #[arg(long, default_value_t = 21_000)]
        gas: u64,

        /// Max fee per gas in wei (decimal)
        #[arg(long)]
        max_fee_per_gas: Option<String>,

        /// Max priority fee per gas in wei (decimal)
        #[arg(long)]
        max_priority_fee_per_gas: Option<String>,

        /// Legacy gas price in wei (decimal)
        #[arg(long)]
        gas_price: Option<String>,

        /// Account nonce; fetched from the node when omitted
        #[arg(long)]
        nonce: Option<u64>,

        /// Call data, 0x-prefixed hex
        #[arg(long)]
        data: Option<String>,
    },
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = Config::from_file(&cli.config)?;
    config.validate()?;

    let metrics = metrics::Metrics::new();
    if let Some(port) = cli.metrics_port {
        metrics::install_prometheus_exporter(port)?;
        info!(port, "Prometheus exporter listening");
    }

    let provider = CustodyProvider::connect(&config.rpc_url, &config, NonceTracker::new())?;
    info!(
        rpc_url = %config.rpc_url,
        address = %provider.address(),
        "Custody provider ready"
    );

    match cli.command {
        Command::Sign {
            to,
            value,
            gas,
            max_fee_per_gas,
            max_priority_fee_per_gas,
            gas_price,
            nonce,
            data,
        } => {
            let tx = RawTransaction {
                from: Some(provider.address().to_string()),
                to: Some(to),
                value: value.as_deref().map(to_hex_quantity).transpose()?,
                gas: Some(format!("0x{gas:x}")),
                gas_price: gas_price.as_deref().map(to_hex_quantity).transpose()?,
                max_fee_per_gas: max_fee_per_gas.as_deref().map(to_hex_quantity).transpose()?,
                max_priority_fee_per_gas: max_priority_fee_per_gas
                    .as_deref()
                    .map(to_hex_quantity)
                    .transpose()?,
                nonce: nonce.map(|n| format!("0x{n:x}")),
                data,
            };

            let started = Instant::now();
            let result = provider.sign_transaction(tx).await;
            metrics.record_sign_request(result.is_ok(), started.elapsed());

            let signed = result?;
            info!(bytes = signed.len(), "Transaction signed");
            println!("{signed}");
        }
    }

    Ok(())
}

/// Render a decimal wei amount as a 0x-prefixed hex quantity.
fn to_hex_quantity(decimal: &str) -> eyre::Result<String> {
    let value = U256::from_str_radix(decimal, 10)
        .map_err(|e| eyre::eyre!("invalid decimal amount `{decimal}`: {e}"))?;
    Ok(format!("0x{value:x}"))
}
