use crate::decode::balances::{BalanceSet, CHANGE_EPSILON};
use crate::decode::signer;
use crate::decode::types::{AbstainReason, CurveLegs, Outcome, TradeLegs, TradeRecord};
use crate::types::Venue;
use crate::view::RawTransactionView;
use solana_sdk::pubkey::Pubkey;

/// Minimum absolute curve SOL movement for a trade to be recorded.
pub const MIN_CURVE_SOL_DELTA: f64 = 0.001;

/// Classifies pump.fun bonding curve trades.
///
/// A curve trade moves exactly one token between the signer and the curve
/// account, with the SOL side settled natively against the curve's lamport
/// balance, so WSOL entries are noise and get stripped up front.
#[derive(Debug, Default)]
pub struct BondingCurveClassifier;

impl BondingCurveClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, view: &RawTransactionView) -> Outcome {
        self.decode(view).into()
    }

    fn decode(&self, view: &RawTransactionView) -> Result<TradeRecord, AbstainReason> {
        let set = BalanceSet::from_view(view).without_wsol();

        let mut mints = set.mints();
        if mints.len() > 1 {
            return Err(AbstainReason::MultipleTokens);
        }
        let token_address = mints.drain().next().ok_or(AbstainReason::NoTokenChanges)?;

        let candidates = signer::candidates(view, &set);
        let trade_signer = signer::resolve_preferring_non_mint(&candidates, &token_address)?;

        // A plain curve trade touches two token accounts at most: the
        // signer's and the curve's.
        if set.pre.len() > 2 || set.post.len() > 2 {
            return Err(AbstainReason::TooManyBalanceEntries);
        }

        let owners = set.owners();
        if !owners.contains(&trade_signer) {
            return Err(AbstainReason::NoSignerTokenDelta);
        }
        if owners.len() < 2 {
            return Err(AbstainReason::NoCurveAccount);
        }

        let curve_address = unique_non_signer(&owners, &trade_signer)?;

        let curve_spl_before = set.pre_ui_by_owner(&curve_address);
        let curve_spl_after = set.post_ui_by_owner(&curve_address);
        let (curve_sol_before, curve_sol_after) = view
            .sol_balances(&curve_address)
            .ok_or(AbstainReason::AccountNotFound)?;

        if (curve_spl_after - curve_spl_before).abs() < CHANGE_EPSILON {
            return Err(AbstainReason::NegligibleTokenDelta);
        }
        let token_price =
            ((curve_sol_after - curve_sol_before) / (curve_spl_after - curve_spl_before)).abs();

        let signer_spl_before = set.pre_ui_by_owner(&trade_signer);
        let signer_spl_after = set.post_ui_by_owner(&trade_signer);
        let (signer_sol_before, signer_sol_after) = view
            .sol_balances(&trade_signer)
            .ok_or(AbstainReason::AccountNotFound)?;

        if signer_spl_after - signer_spl_before == 0.0 {
            return Err(AbstainReason::NoSignerTokenDelta);
        }
        if (curve_sol_after - curve_sol_before).abs() < MIN_CURVE_SOL_DELTA {
            return Err(AbstainReason::BelowMinSolSize);
        }

        Ok(TradeRecord {
            signature: view.signature,
            block_time: view.block_time,
            slot: view.slot,
            fee_sol: view.fee_sol(),
            token_price,
            token_address,
            is_creator: curve_spl_before == 0.0,
            signer: trade_signer,
            venue: Venue::PumpFun,
            legs: TradeLegs::Curve(CurveLegs {
                curve_spl_before,
                curve_spl_after,
                curve_sol_before,
                curve_sol_after,
                signer_spl_before,
                signer_spl_after,
                signer_sol_before,
                signer_sol_after,
            }),
        })
    }
}

fn unique_non_signer(owners: &[Pubkey], signer: &Pubkey) -> Result<Pubkey, AbstainReason> {
    let mut curve = None;
    for owner in owners {
        if owner == signer {
            continue;
        }
        match curve {
            None => curve = Some(*owner),
            Some(existing) if existing == *owner => {}
            Some(_) => return Err(AbstainReason::MultipleCurveCandidates),
        }
    }
    curve.ok_or(AbstainReason::NoCurveAccount)
}
