use dexfeed::{load_config, Outcome, StreamListener, TradeDecoder};
use std::env;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    info!("Starting dexfeed - Solana DEX trade decoder");

    let config_path = env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = match load_config(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load config: {}", e);
            info!("Creating default config file...");
            dexfeed::create_default_config(&config_path)?;
            info!("Please edit {} with your gRPC endpoint", config_path);
            return Ok(());
        }
    };

    let (tx_sender, mut tx_receiver) = mpsc::unbounded_channel();
    let decoder = TradeDecoder::with_stream_thresholds(&config.venues);
    let mut listener = StreamListener::new(config.clone(), tx_sender);

    let listener_handle = tokio::spawn(async move {
        if let Err(e) = listener.start().await {
            error!("Listener error: {}", e);
        }
    });

    let decode_handle = tokio::spawn(async move {
        info!("Decoder ready, waiting for transactions...");

        while let Some(transaction_view) = tx_receiver.recv().await {
            match decoder.decode(&transaction_view) {
                Outcome::Trade(record) => {
                    info!(
                        "Trade on {}: {} at {:.9} SOL (signer {}, creator: {})",
                        record.venue,
                        record.token_address,
                        record.token_price,
                        record.signer,
                        record.is_creator
                    );
                    match serde_json::to_string(&record) {
                        Ok(line) => println!("{}", line),
                        Err(e) => warn!("Failed to serialize trade record: {}", e),
                    }
                }
                Outcome::Abstain(reason) => {
                    debug!("Abstained on {}: {}", transaction_view.signature, reason);
                }
            }
        }
    });

    info!("dexfeed is running. Press Ctrl+C to stop.");

    tokio::select! {
        _ = listener_handle => {
            info!("Listener task ended");
        }
        _ = decode_handle => {
            info!("Decoder task ended");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }

    info!("Shutting down...");
    Ok(())
}
