pub mod amm_pool;
pub mod balances;
pub mod bonding_curve;
pub mod market_swap;
pub mod signer;
pub mod types;

pub use amm_pool::PoolClassifier;
pub use balances::{BalanceSet, CHANGE_EPSILON};
pub use bonding_curve::BondingCurveClassifier;
pub use market_swap::MarketSwapClassifier;
pub use types::{
    AbstainReason, CurveLegs, Outcome, PoolNetLegs, PoolSideLegs, TradeLegs, TradeRecord,
};

use crate::types::Venue;
use crate::view::RawTransactionView;
use tracing::debug;

enum VenueClassifier {
    Curve(BondingCurveClassifier),
    Pool(PoolClassifier),
    Market(MarketSwapClassifier),
}

impl VenueClassifier {
    fn classify(&self, view: &RawTransactionView) -> Outcome {
        match self {
            VenueClassifier::Curve(c) => c.classify(view),
            VenueClassifier::Pool(c) => c.classify(view),
            VenueClassifier::Market(c) => c.classify(view),
        }
    }
}

/// Routes a transaction view through the enabled venues.
///
/// A venue is only attempted when its program id appears among the
/// transaction's account keys; the first venue that produces a trade
/// wins. Stateless, so the same view always decodes to the same outcome.
pub struct TradeDecoder {
    entries: Vec<(Venue, VenueClassifier)>,
}

impl TradeDecoder {
    pub fn new(venues: &[Venue]) -> Self {
        Self::build(venues, false)
    }

    /// Like `new`, but with the stricter PumpSwap size floor used for
    /// live stream decoding.
    pub fn with_stream_thresholds(venues: &[Venue]) -> Self {
        Self::build(venues, true)
    }

    fn build(venues: &[Venue], stream: bool) -> Self {
        let entries = Venue::all()
            .into_iter()
            .filter(|venue| venues.contains(venue))
            .map(|venue| {
                let classifier = match venue {
                    Venue::PumpFun => VenueClassifier::Curve(BondingCurveClassifier::new()),
                    Venue::RaydiumV4 => VenueClassifier::Pool(PoolClassifier::raydium_v4()),
                    Venue::RaydiumCpmm => VenueClassifier::Pool(PoolClassifier::raydium_cpmm()),
                    Venue::RaydiumLaunchpad => {
                        VenueClassifier::Pool(PoolClassifier::raydium_launchpad())
                    }
                    Venue::MeteoraDbc => VenueClassifier::Pool(PoolClassifier::meteora_dbc()),
                    Venue::PumpSwap => VenueClassifier::Market(if stream {
                        MarketSwapClassifier::with_stream_threshold()
                    } else {
                        MarketSwapClassifier::new()
                    }),
                };
                (venue, classifier)
            })
            .collect();
        Self { entries }
    }

    pub fn decode(&self, view: &RawTransactionView) -> Outcome {
        for (venue, classifier) in &self.entries {
            if !view.contains_program(&venue.program_id()) {
                continue;
            }
            match classifier.classify(view) {
                Outcome::Trade(record) => {
                    debug!(
                        signature = %view.signature,
                        venue = %venue,
                        price = record.token_price,
                        "decoded trade"
                    );
                    return Outcome::Trade(record);
                }
                Outcome::Abstain(reason) => {
                    debug!(signature = %view.signature, venue = %venue, %reason, "venue abstained");
                }
            }
        }
        Outcome::Abstain(AbstainReason::NoVenueMatched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::addresses;
    use crate::view::testing::ViewBuilder;
    use solana_sdk::pubkey::Pubkey;

    /// A pump.fun buy with the program key present.
    fn curve_buy(include_program: bool) -> RawTransactionView {
        let trader = Pubkey::new_unique();
        let curve = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let mut b = ViewBuilder::new();
        let idx_trader = b.account_sol(trader, true, 5.0, 4.0);
        let idx_curve = b.account_sol(curve, false, 10.0, 11.0);
        if include_program {
            b.account_sol(addresses::pump_fun_program(), false, 0.0, 0.0);
        }
        b.pre_token(idx_trader, trader, mint, 0.0);
        b.post_token(idx_trader, trader, mint, 100.0);
        b.pre_token(idx_curve, curve, mint, 1000.0);
        b.post_token(idx_curve, curve, mint, 900.0);
        b.build()
    }

    #[test]
    fn test_decodes_when_program_present() {
        let decoder = TradeDecoder::new(&Venue::all());
        let outcome = decoder.decode(&curve_buy(true));
        let record = outcome.trade().expect("should decode");
        assert_eq!(record.venue, Venue::PumpFun);
    }

    #[test]
    fn test_skips_venue_without_program_key() {
        let decoder = TradeDecoder::new(&Venue::all());
        let outcome = decoder.decode(&curve_buy(false));
        assert_eq!(outcome.abstain_reason(), Some(AbstainReason::NoVenueMatched));
    }

    #[test]
    fn test_disabled_venue_is_not_attempted() {
        let decoder = TradeDecoder::new(&[Venue::PumpSwap]);
        let outcome = decoder.decode(&curve_buy(true));
        assert_eq!(outcome.abstain_reason(), Some(AbstainReason::NoVenueMatched));
    }

    #[test]
    fn test_decode_is_idempotent() {
        let decoder = TradeDecoder::new(&Venue::all());
        let view = curve_buy(true);
        let first = decoder.decode(&view).trade().cloned().unwrap();
        let second = decoder.decode(&view).trade().cloned().unwrap();
        assert_eq!(first.token_price, second.token_price);
        assert_eq!(first.signature, second.signature);
    }
}
