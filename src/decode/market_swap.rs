use crate::decode::balances::{BalanceSet, CHANGE_EPSILON};
use crate::decode::types::{AbstainReason, Outcome, PoolSideLegs, TradeLegs, TradeRecord};
use crate::types::{addresses, Venue};
use crate::view::RawTransactionView;
use solana_sdk::pubkey::Pubkey;

/// Minimum absolute pool WSOL movement for a trade to be recorded.
pub const MIN_POOL_WSOL_DELTA: f64 = 0.001;

/// Stricter minimum used when decoding the live stream, where tiny swaps
/// are too noisy to be worth recording.
pub const STREAM_MIN_POOL_WSOL_DELTA: f64 = 0.01;

/// Classifies PumpSwap trades.
///
/// PumpSwap pools have no fixed authority, so the market account is found
/// structurally: it is the one owner whose balances changed in exactly
/// two mints, one of them WSOL.
#[derive(Debug)]
pub struct MarketSwapClassifier {
    min_pool_wsol_delta: f64,
}

impl Default for MarketSwapClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl MarketSwapClassifier {
    pub fn new() -> Self {
        Self {
            min_pool_wsol_delta: MIN_POOL_WSOL_DELTA,
        }
    }

    pub fn with_stream_threshold() -> Self {
        Self {
            min_pool_wsol_delta: STREAM_MIN_POOL_WSOL_DELTA,
        }
    }

    pub fn classify(&self, view: &RawTransactionView) -> Outcome {
        self.decode(view).into()
    }

    fn decode(&self, view: &RawTransactionView) -> Result<TradeRecord, AbstainReason> {
        let wsol = addresses::wsol_mint();
        let set = BalanceSet::from_view(view);

        // Candidates must own an entry with a literally nonzero raw
        // amount; zero-amount token accounts created in the same
        // transaction don't count.
        let candidates: Vec<Pubkey> = view
            .required_signers()
            .into_iter()
            .filter(|signer| set.owner_has_nonzero_raw(signer))
            .collect();
        let trade_signer = match candidates.as_slice() {
            [] => return Err(AbstainReason::NoSignerCandidates),
            [only] => *only,
            _ => return Err(AbstainReason::AmbiguousSigner),
        };

        let owner_mints = set.owner_mint_map();
        let two_mint_owners: Vec<Pubkey> = owner_mints
            .iter()
            .filter(|(_, mints)| mints.len() == 2)
            .map(|(owner, _)| *owner)
            .collect();

        let market_account = match two_mint_owners.as_slice() {
            [only] => *only,
            [_, _] => {
                // The signer shows up here too when it paid with WSOL.
                if two_mint_owners.contains(&trade_signer) {
                    *two_mint_owners
                        .iter()
                        .find(|owner| **owner != trade_signer)
                        .ok_or(AbstainReason::AmbiguousMarketAccount)?
                } else {
                    return Err(AbstainReason::AmbiguousMarketAccount);
                }
            }
            _ => return Err(AbstainReason::NoMarketAccount),
        };

        let market_mints = &owner_mints[&market_account];
        if !market_mints.contains(&wsol) {
            return Err(AbstainReason::MarketMissingWsol);
        }
        let token_address = *market_mints
            .iter()
            .find(|mint| **mint != wsol)
            .ok_or(AbstainReason::MarketMissingWsol)?;

        let pool_spl_before = set.pre_ui(&market_account, &token_address);
        let pool_spl_after = set.post_ui(&market_account, &token_address);
        let pool_wsol_before = set.pre_ui(&market_account, &wsol);
        let pool_wsol_after = set.post_ui(&market_account, &wsol);

        if (pool_spl_after - pool_spl_before).abs() < CHANGE_EPSILON {
            return Err(AbstainReason::NegligibleTokenDelta);
        }
        let token_price =
            ((pool_wsol_after - pool_wsol_before) / (pool_spl_after - pool_spl_before)).abs();

        let is_creator = pool_spl_before == 0.0 && pool_wsol_before == 0.0;

        let signer_spl_before = set.pre_ui(&trade_signer, &token_address);
        let signer_spl_after = set.post_ui(&trade_signer, &token_address);
        let (signer_sol_before, signer_sol_after) = view
            .sol_balances(&trade_signer)
            .ok_or(AbstainReason::AccountNotFound)?;

        if signer_spl_after - signer_spl_before == 0.0 {
            return Err(AbstainReason::NoSignerTokenDelta);
        }
        if (pool_wsol_after - pool_wsol_before).abs() < self.min_pool_wsol_delta {
            return Err(AbstainReason::BelowMinSolSize);
        }

        Ok(TradeRecord {
            signature: view.signature,
            block_time: view.block_time,
            slot: view.slot,
            fee_sol: view.fee_sol(),
            token_price,
            token_address,
            is_creator,
            signer: trade_signer,
            venue: Venue::PumpSwap,
            legs: TradeLegs::PoolSide(PoolSideLegs {
                pool_spl_before,
                pool_spl_after,
                pool_wsol_before,
                pool_wsol_after,
                signer_spl_before,
                signer_spl_after,
                signer_sol_before,
                signer_sol_after,
            }),
        })
    }
}
