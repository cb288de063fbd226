use crate::monitor::error::{MonitorError, MonitorResult};
use crate::types::MonitorConfig;
use crate::view::{self, RawTransactionView};
use futures::{SinkExt, StreamExt};
use solana_sdk::signature::Signature;
use std::collections::{HashMap, HashSet};
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};
use tracing::{debug, error, info, warn};
use yellowstone_grpc_client::GeyserGrpcClient;
use yellowstone_grpc_proto::prelude::{
    subscribe_update::UpdateOneof, CommitmentLevel, SubscribeRequest,
    SubscribeRequestFilterTransactions, SubscribeRequestPing, SubscribeUpdateTransaction,
};

const DEDUP_CACHE_SIZE: usize = 10_000;
const INITIAL_BACKOFF_MS: u64 = 500;
const MAX_BACKOFF_MS: u64 = 30_000;

/// Subscribes to a Yellowstone geyser endpoint and feeds transaction
/// views to the decoder in arrival order.
///
/// The subscription is filtered server-side to the enabled venues'
/// program ids, with votes and failed transactions excluded. Malformed
/// updates are logged and skipped; they never reach the channel.
pub struct StreamListener {
    config: MonitorConfig,
    seen_signatures: HashSet<Signature>,
    tx_sender: mpsc::UnboundedSender<RawTransactionView>,
}

impl StreamListener {
    /// Create a new stream listener
    pub fn new(config: MonitorConfig, tx_sender: mpsc::UnboundedSender<RawTransactionView>) -> Self {
        Self {
            config,
            seen_signatures: HashSet::new(),
            tx_sender,
        }
    }

    /// Run the subscribe loop, reconnecting with capped backoff until the
    /// configured attempts run out.
    pub async fn start(&mut self) -> MonitorResult<()> {
        info!("Starting geyser stream listener on {}", self.config.grpc_endpoint);

        let mut attempts: u32 = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            match self.run_subscription().await {
                Ok(()) => {
                    // Stream ended cleanly; treat like a disconnect.
                    warn!("Geyser stream ended, reconnecting...");
                }
                Err(MonitorError::ChannelError) => {
                    info!("Downstream channel closed, stopping listener");
                    return Ok(());
                }
                Err(e) => {
                    warn!("Geyser stream error: {}", e);
                }
            }

            attempts += 1;
            if attempts >= self.config.max_reconnect_attempts {
                error!(
                    "Giving up after {} reconnection attempts",
                    self.config.max_reconnect_attempts
                );
                return Err(MonitorError::MaxReconnectAttemptsExceeded);
            }

            debug!("Reconnecting in {}ms (attempt {})", backoff_ms, attempts);
            sleep(Duration::from_millis(backoff_ms)).await;
            backoff_ms = (backoff_ms * 2).min(MAX_BACKOFF_MS);
        }
    }

    /// Connect, subscribe, and pump the stream until it breaks.
    async fn run_subscription(&mut self) -> MonitorResult<()> {
        let mut client = GeyserGrpcClient::build_from_shared(self.config.grpc_endpoint.clone())
            .map_err(|e| MonitorError::ConnectionFailed(e.to_string()))?
            .x_token(self.config.grpc_x_token.clone())
            .map_err(|e| MonitorError::ConnectionFailed(e.to_string()))?
            .connect_timeout(Duration::from_secs(self.config.connection_timeout_secs))
            .timeout(Duration::from_secs(self.config.connection_timeout_secs))
            .connect()
            .await
            .map_err(|e| MonitorError::ConnectionFailed(e.to_string()))?;

        let (mut subscribe_tx, mut stream) = client
            .subscribe()
            .await
            .map_err(|e| MonitorError::ConnectionFailed(e.to_string()))?;

        subscribe_tx
            .send(self.subscribe_request())
            .await
            .map_err(|e| MonitorError::StreamError(e.to_string()))?;

        info!("Subscribed; listening for transactions...");

        while let Some(message) = stream.next().await {
            let update = message.map_err(|e| MonitorError::StreamError(e.to_string()))?;
            match update.update_oneof {
                Some(UpdateOneof::Transaction(tx_update)) => {
                    self.handle_transaction(&tx_update)?;
                }
                Some(UpdateOneof::Ping(_)) => {
                    let reply = SubscribeRequest {
                        ping: Some(SubscribeRequestPing { id: 1 }),
                        ..Default::default()
                    };
                    subscribe_tx
                        .send(reply)
                        .await
                        .map_err(|e| MonitorError::StreamError(e.to_string()))?;
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// The server-side filter for this subscription.
    fn subscribe_request(&self) -> SubscribeRequest {
        let mut transactions = HashMap::new();
        transactions.insert(
            "dexfeed-swaps".to_string(),
            SubscribeRequestFilterTransactions {
                vote: Some(false),
                failed: Some(false),
                signature: None,
                account_include: self
                    .config
                    .venues
                    .iter()
                    .map(|venue| venue.program_id().to_string())
                    .collect(),
                account_exclude: Vec::new(),
                account_required: Vec::new(),
            },
        );

        let commitment = if self.config.use_confirmed_commitment {
            CommitmentLevel::Confirmed
        } else {
            CommitmentLevel::Finalized
        };

        SubscribeRequest {
            transactions,
            commitment: Some(commitment as i32),
            ..Default::default()
        }
    }

    fn handle_transaction(&mut self, update: &SubscribeUpdateTransaction) -> MonitorResult<()> {
        let Some(tx_info) = update.transaction.as_ref() else {
            return Ok(());
        };
        if tx_info.is_vote {
            return Ok(());
        }
        // Failed transactions slip through some endpoints' filters.
        let failed = tx_info
            .meta
            .as_ref()
            .and_then(|meta| meta.err.as_ref())
            .is_some_and(|err| !err.err.is_empty());
        if failed {
            return Ok(());
        }

        let transaction_view = match view::grpc::view_from_geyser(update, None) {
            Ok(transaction_view) => transaction_view,
            Err(e) => {
                warn!("Skipping malformed geyser update at slot {}: {}", update.slot, e);
                return Ok(());
            }
        };

        if self.is_duplicate(&transaction_view.signature) {
            debug!("Skipping duplicate transaction: {}", transaction_view.signature);
            return Ok(());
        }

        self.tx_sender
            .send(transaction_view)
            .map_err(|_| MonitorError::ChannelError)
    }

    /// Check if we've already processed this signature
    fn is_duplicate(&mut self, signature: &Signature) -> bool {
        if self.seen_signatures.contains(signature) {
            return true;
        }

        self.seen_signatures.insert(*signature);

        // Evict a slice of old entries when the cache fills up
        if self.seen_signatures.len() > DEDUP_CACHE_SIZE {
            let to_remove = DEDUP_CACHE_SIZE / 10;
            let signatures_to_remove: Vec<Signature> = self
                .seen_signatures
                .iter()
                .take(to_remove)
                .copied()
                .collect();

            for sig in signatures_to_remove {
                self.seen_signatures.remove(&sig);
            }
        }

        false
    }
}
