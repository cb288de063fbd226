use crate::decode::{Outcome, TradeDecoder, TradeRecord};
use crate::monitor::error::{MonitorError, MonitorResult};
use crate::types::MonitorConfig;
use crate::view;
use solana_client::rpc_client::{GetConfirmedSignaturesForAddress2Config, RpcClient};
use solana_client::rpc_config::RpcTransactionConfig;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_transaction_status::UiTransactionEncoding;
use std::str::FromStr;
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

const SIGNATURE_PAGE_LIMIT: usize = 1_000;
const FETCH_MAX_RETRIES: u32 = 3;

/// Historical backfill over RPC.
///
/// Walks an address's signature history page by page, fetches each
/// transaction JSON-parsed, and runs it through the decoder. Results come
/// back sorted by slot ascending regardless of fetch order.
pub struct Backfill {
    rpc_client: Arc<RpcClient>,
    decoder: TradeDecoder,
}

impl Backfill {
    pub fn new(config: &MonitorConfig) -> Self {
        let commitment = if config.use_confirmed_commitment {
            CommitmentConfig::confirmed()
        } else {
            CommitmentConfig::finalized()
        };

        let rpc_client = Arc::new(RpcClient::new_with_commitment(
            config.rpc_endpoints[0].clone(),
            commitment,
        ));

        Self {
            rpc_client,
            decoder: TradeDecoder::new(&config.venues),
        }
    }

    /// Collect decoded trades for an address.
    ///
    /// Pages backwards from the newest signature (or `before`, when set)
    /// until `until` is reached, the history is exhausted, or `max_pages`
    /// pages have been walked.
    pub async fn collect_for_address(
        &self,
        address: &Pubkey,
        before: Option<Signature>,
        until: Option<Signature>,
        max_pages: usize,
    ) -> MonitorResult<Vec<TradeRecord>> {
        info!("Backfilling trades for {}", address);

        let mut records = Vec::new();
        let mut cursor = before;

        for page in 0..max_pages {
            let entries = self.rpc_client.get_signatures_for_address_with_config(
                address,
                GetConfirmedSignaturesForAddress2Config {
                    before: cursor,
                    until,
                    limit: Some(SIGNATURE_PAGE_LIMIT),
                    commitment: Some(self.rpc_client.commitment()),
                },
            )?;

            if entries.is_empty() {
                break;
            }
            debug!("Page {}: {} signatures", page, entries.len());

            for entry in &entries {
                if entry.err.is_some() {
                    continue;
                }
                let signature = Signature::from_str(&entry.signature)
                    .map_err(|e| MonitorError::ParseError(format!("Invalid signature: {}", e)))?;

                match self.fetch_and_decode(signature).await {
                    Ok(Some(record)) => records.push(record),
                    Ok(None) => {}
                    Err(e) => {
                        warn!("Skipping {} after fetch failure: {}", signature, e);
                    }
                }
            }

            let last = &entries[entries.len() - 1];
            cursor = Some(
                Signature::from_str(&last.signature)
                    .map_err(|e| MonitorError::ParseError(format!("Invalid signature: {}", e)))?,
            );

            if entries.len() < SIGNATURE_PAGE_LIMIT {
                break;
            }
        }

        sort_by_slot(&mut records);
        info!("Backfill found {} trades for {}", records.len(), address);
        Ok(records)
    }

    /// Fetch one transaction with bounded retries and decode it.
    async fn fetch_and_decode(&self, signature: Signature) -> MonitorResult<Option<TradeRecord>> {
        let mut retries = 0;

        let fetched = loop {
            match self.rpc_client.get_transaction_with_config(
                &signature,
                RpcTransactionConfig {
                    encoding: Some(UiTransactionEncoding::JsonParsed),
                    commitment: Some(self.rpc_client.commitment()),
                    max_supported_transaction_version: Some(0),
                },
            ) {
                Ok(fetched) => break fetched,
                Err(e) => {
                    retries += 1;
                    if retries >= FETCH_MAX_RETRIES {
                        return Err(MonitorError::RpcError(e));
                    }
                    warn!(
                        "Retry {}/{} - Error fetching transaction {}: {}",
                        retries, FETCH_MAX_RETRIES, signature, e
                    );
                    sleep(Duration::from_millis(1_000 * retries as u64)).await;
                }
            }
        };

        let transaction_view = match view::rpc::view_from_encoded(&fetched) {
            Ok(transaction_view) => transaction_view,
            Err(e) => {
                warn!("Skipping malformed transaction {}: {}", signature, e);
                return Ok(None);
            }
        };

        match self.decoder.decode(&transaction_view) {
            Outcome::Trade(record) => Ok(Some(record)),
            Outcome::Abstain(reason) => {
                debug!("Abstained on {}: {}", signature, reason);
                Ok(None)
            }
        }
    }
}

fn sort_by_slot(records: &mut [TradeRecord]) {
    records.sort_by_key(|record| record.slot);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{CurveLegs, TradeLegs};
    use crate::types::Venue;

    fn record_at_slot(slot: u64) -> TradeRecord {
        TradeRecord {
            signature: Signature::default(),
            block_time: None,
            slot,
            fee_sol: 0.000005,
            token_price: 0.01,
            token_address: Pubkey::new_unique(),
            is_creator: false,
            signer: Pubkey::new_unique(),
            venue: Venue::PumpFun,
            legs: TradeLegs::Curve(CurveLegs {
                curve_spl_before: 0.0,
                curve_spl_after: 0.0,
                curve_sol_before: 0.0,
                curve_sol_after: 0.0,
                signer_spl_before: 0.0,
                signer_spl_after: 0.0,
                signer_sol_before: 0.0,
                signer_sol_after: 0.0,
            }),
        }
    }

    #[test]
    fn test_records_sorted_by_slot() {
        let mut records = vec![record_at_slot(30), record_at_slot(10), record_at_slot(20)];
        sort_by_slot(&mut records);
        let slots: Vec<u64> = records.iter().map(|r| r.slot).collect();
        assert_eq!(slots, vec![10, 20, 30]);
    }
}
