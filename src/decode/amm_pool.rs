use crate::decode::balances::{BalanceSet, CHANGE_EPSILON};
use crate::decode::signer;
use crate::decode::types::{AbstainReason, Outcome, PoolNetLegs, PoolSideLegs, TradeLegs, TradeRecord};
use crate::types::{addresses, Venue};
use crate::view::RawTransactionView;
use solana_sdk::pubkey::Pubkey;

/// Minimum absolute pool WSOL movement for a trade to be recorded.
pub const MIN_POOL_WSOL_DELTA: f64 = 0.001;

/// Classifies swaps against pools held by a fixed program authority.
///
/// Covers Raydium V4, Raydium CPMM, Raydium Launchpad and Meteora DBC.
/// The venues differ only in authority address and in how the signer's
/// SOL side is reported: V4 and CPMM fold the signer's WSOL movement
/// into one net change, the launch venues keep before/after sides.
#[derive(Debug)]
pub struct PoolClassifier {
    venue: Venue,
    authority: Pubkey,
    folds_wsol_into_sol: bool,
}

impl PoolClassifier {
    pub fn raydium_v4() -> Self {
        Self {
            venue: Venue::RaydiumV4,
            authority: addresses::raydium_v4_authority(),
            folds_wsol_into_sol: true,
        }
    }

    pub fn raydium_cpmm() -> Self {
        Self {
            venue: Venue::RaydiumCpmm,
            authority: addresses::raydium_cpmm_authority(),
            folds_wsol_into_sol: true,
        }
    }

    pub fn raydium_launchpad() -> Self {
        Self {
            venue: Venue::RaydiumLaunchpad,
            authority: addresses::raydium_launchpad_authority(),
            folds_wsol_into_sol: false,
        }
    }

    pub fn meteora_dbc() -> Self {
        Self {
            venue: Venue::MeteoraDbc,
            authority: addresses::meteora_dbc_authority(),
            folds_wsol_into_sol: false,
        }
    }

    pub fn venue(&self) -> Venue {
        self.venue
    }

    pub fn classify(&self, view: &RawTransactionView) -> Outcome {
        self.decode(view).into()
    }

    fn decode(&self, view: &RawTransactionView) -> Result<TradeRecord, AbstainReason> {
        let wsol = addresses::wsol_mint();
        let set = BalanceSet::from_view(view);

        let candidates = signer::candidates(view, &set);
        let trade_signer = signer::resolve(view, &candidates)?;

        // 2 mints for a plain swap, 3 when initial liquidity mints an LP
        // receipt to the creator.
        let mints = set.mints();
        if mints.len() != 2 && mints.len() != 3 {
            return Err(AbstainReason::UnexpectedMintCount);
        }

        let authority_mints = set.mints_owned_by(&self.authority);
        if authority_mints.len() != 2 || !authority_mints.contains(&wsol) {
            return Err(AbstainReason::AuthorityNotTwoSided);
        }
        let token_address = *authority_mints
            .iter()
            .find(|mint| **mint != wsol)
            .ok_or(AbstainReason::AuthorityNotTwoSided)?;

        let pool_spl_before = set.pre_ui_excluding_mint(&self.authority, &wsol);
        let pool_spl_after = set.post_ui_excluding_mint(&self.authority, &wsol);
        let pool_wsol_before = set.pre_ui(&self.authority, &wsol);
        let pool_wsol_after = set.post_ui(&self.authority, &wsol);

        if (pool_spl_after - pool_spl_before).abs() < CHANGE_EPSILON {
            return Err(AbstainReason::NegligibleTokenDelta);
        }
        let token_price =
            ((pool_wsol_after - pool_wsol_before) / (pool_spl_after - pool_spl_before)).abs();

        let mut is_creator = false;
        let set = if mints.len() == 3 {
            // Initial liquidity: the only acceptable third-mint change is
            // the signer receiving the first LP tokens into a fresh pool.
            let lp_mint = *mints
                .iter()
                .find(|mint| **mint != wsol && **mint != token_address)
                .ok_or(AbstainReason::NotInitialLiquidity)?;
            let (lp_pre, lp_post) = set.entry_counts(&trade_signer, &lp_mint);
            if lp_pre + lp_post != 1
                || lp_pre != 0
                || pool_wsol_before != 0.0
                || pool_spl_before != 0.0
            {
                return Err(AbstainReason::NotInitialLiquidity);
            }
            is_creator = true;
            set.without_post_entry(&trade_signer, &lp_mint)
        } else {
            set
        };

        let (signer_sol_before, signer_sol_after) = view
            .sol_balances(&trade_signer)
            .ok_or(AbstainReason::AccountNotFound)?;

        let signer_spl_before = set.pre_ui(&trade_signer, &token_address);
        let signer_spl_after = set.post_ui(&trade_signer, &token_address);

        if signer_spl_after - signer_spl_before == 0.0 {
            return Err(AbstainReason::NoSignerTokenDelta);
        }
        if (pool_wsol_after - pool_wsol_before).abs() < MIN_POOL_WSOL_DELTA {
            return Err(AbstainReason::BelowMinSolSize);
        }

        let legs = if self.folds_wsol_into_sol {
            let mut signer_sol_change = signer_sol_after - signer_sol_before;
            if set.mints_owned_by(&trade_signer).contains(&wsol) {
                signer_sol_change +=
                    set.post_ui(&trade_signer, &wsol) - set.pre_ui(&trade_signer, &wsol);
            }
            TradeLegs::PoolNet(PoolNetLegs {
                pool_spl_before,
                pool_spl_after,
                pool_wsol_before,
                pool_wsol_after,
                signer_spl_before,
                signer_spl_after,
                signer_sol_change,
            })
        } else {
            TradeLegs::PoolSide(PoolSideLegs {
                pool_spl_before,
                pool_spl_after,
                pool_wsol_before,
                pool_wsol_after,
                signer_spl_before,
                signer_spl_after,
                signer_sol_before,
                signer_sol_after,
            })
        };

        Ok(TradeRecord {
            signature: view.signature,
            block_time: view.block_time,
            slot: view.slot,
            fee_sol: view.fee_sol(),
            token_price,
            token_address,
            is_creator,
            signer: trade_signer,
            venue: self.venue,
            legs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::testing::ViewBuilder;

    struct PoolTx {
        trader: Pubkey,
        authority: Pubkey,
        mint: Pubkey,
        pool_token_account: Pubkey,
        pool_wsol_account: Pubkey,
    }

    impl PoolTx {
        fn new(authority: Pubkey) -> Self {
            Self {
                trader: Pubkey::new_unique(),
                authority,
                mint: Pubkey::new_unique(),
                pool_token_account: Pubkey::new_unique(),
                pool_wsol_account: Pubkey::new_unique(),
            }
        }

        fn swap(
            &self,
            pool_spl: (f64, f64),
            pool_wsol: (f64, f64),
            trader_spl: (f64, f64),
        ) -> ViewBuilder {
            let mut b = ViewBuilder::new();
            let idx_trader = b.account_sol(self.trader, true, 5.0, 4.0);
            let idx_pool_token = b.account_sol(self.pool_token_account, false, 0.002, 0.002);
            let idx_pool_wsol = b.account_sol(self.pool_wsol_account, false, 0.002, 0.002);
            b.pre_token(idx_trader, self.trader, self.mint, trader_spl.0);
            b.post_token(idx_trader, self.trader, self.mint, trader_spl.1);
            b.pre_token(idx_pool_token, self.authority, self.mint, pool_spl.0);
            b.post_token(idx_pool_token, self.authority, self.mint, pool_spl.1);
            b.pre_token(idx_pool_wsol, self.authority, addresses::wsol_mint(), pool_wsol.0);
            b.post_token(idx_pool_wsol, self.authority, addresses::wsol_mint(), pool_wsol.1);
            b
        }
    }

    #[test]
    fn test_v4_swap_price_and_net_sol_change() {
        let tx = PoolTx::new(addresses::raydium_v4_authority());
        // Pool gains 2 WSOL, releases 200 tokens: price 0.01.
        let view = tx.swap((10_000.0, 9_800.0), (50.0, 52.0), (0.0, 200.0)).build();

        let record = PoolClassifier::raydium_v4()
            .classify(&view)
            .trade()
            .cloned()
            .expect("should classify as trade");
        assert!((record.token_price - 0.01).abs() < 1e-12);
        assert_eq!(record.venue, Venue::RaydiumV4);
        assert_eq!(record.token_address, tx.mint);
        assert!(!record.is_creator);
        match &record.legs {
            TradeLegs::PoolNet(legs) => {
                assert!((legs.signer_sol_change - (-1.0)).abs() < 1e-9);
            }
            other => panic!("unexpected legs: {:?}", other),
        }
    }

    #[test]
    fn test_v4_folds_signer_wsol_into_sol_change() {
        let tx = PoolTx::new(addresses::raydium_v4_authority());
        let mut b = tx.swap((10_000.0, 9_800.0), (50.0, 52.0), (0.0, 200.0));
        // Trader paid from a WSOL account rather than native SOL.
        let idx = b.account_sol(Pubkey::new_unique(), false, 0.002, 0.002);
        b.pre_token(idx, tx.trader, addresses::wsol_mint(), 3.0);
        b.post_token(idx, tx.trader, addresses::wsol_mint(), 1.0);
        let view = b.build();

        let record = PoolClassifier::raydium_v4()
            .classify(&view)
            .trade()
            .cloned()
            .expect("should classify as trade");
        match &record.legs {
            TradeLegs::PoolNet(legs) => {
                // -1 native and -2 WSOL.
                assert!((legs.signer_sol_change - (-3.0)).abs() < 1e-9);
            }
            other => panic!("unexpected legs: {:?}", other),
        }
    }

    #[test]
    fn test_launchpad_reports_sol_sides() {
        let tx = PoolTx::new(addresses::raydium_launchpad_authority());
        let view = tx.swap((10_000.0, 9_800.0), (50.0, 52.0), (0.0, 200.0)).build();

        let record = PoolClassifier::raydium_launchpad()
            .classify(&view)
            .trade()
            .cloned()
            .expect("should classify as trade");
        assert_eq!(record.venue, Venue::RaydiumLaunchpad);
        match &record.legs {
            TradeLegs::PoolSide(legs) => {
                assert!((legs.signer_sol_before - 5.0).abs() < 1e-9);
                assert!((legs.signer_sol_after - 4.0).abs() < 1e-9);
            }
            other => panic!("unexpected legs: {:?}", other),
        }
    }

    #[test]
    fn test_initial_liquidity_marks_creator_and_ignores_lp_receipt() {
        let tx = PoolTx::new(addresses::raydium_cpmm_authority());
        let mut b = tx.swap((0.0, 9_800.0), (0.0, 52.0), (10_000.0, 200.0));
        let lp_mint = Pubkey::new_unique();
        let idx = b.account_sol(Pubkey::new_unique(), false, 0.002, 0.002);
        b.post_token(idx, tx.trader, lp_mint, 700.0);
        let view = b.build();

        let record = PoolClassifier::raydium_cpmm()
            .classify(&view)
            .trade()
            .cloned()
            .expect("should classify as trade");
        assert!(record.is_creator);
        assert_eq!(record.token_address, tx.mint);
        match &record.legs {
            TradeLegs::PoolNet(legs) => {
                assert_eq!(legs.signer_spl_before, 10_000.0);
                assert_eq!(legs.signer_spl_after, 200.0);
            }
            other => panic!("unexpected legs: {:?}", other),
        }
    }

    #[test]
    fn test_three_mints_without_fresh_pool_abstains() {
        let tx = PoolTx::new(addresses::raydium_v4_authority());
        // Pool already funded, so a third mint is not an LP creation.
        let mut b = tx.swap((10_000.0, 9_800.0), (50.0, 52.0), (0.0, 200.0));
        let lp_mint = Pubkey::new_unique();
        let idx = b.account_sol(Pubkey::new_unique(), false, 0.002, 0.002);
        b.post_token(idx, tx.trader, lp_mint, 700.0);
        let view = b.build();

        assert_eq!(
            PoolClassifier::raydium_v4().classify(&view).abstain_reason(),
            Some(AbstainReason::NotInitialLiquidity)
        );
    }

    #[test]
    fn test_lp_receipt_present_before_abstains() {
        let tx = PoolTx::new(addresses::raydium_v4_authority());
        let mut b = tx.swap((0.0, 9_800.0), (0.0, 52.0), (10_000.0, 200.0));
        let lp_mint = Pubkey::new_unique();
        let idx = b.account_sol(Pubkey::new_unique(), false, 0.002, 0.002);
        b.pre_token(idx, tx.trader, lp_mint, 100.0);
        b.post_token(idx, tx.trader, lp_mint, 700.0);
        let view = b.build();

        assert_eq!(
            PoolClassifier::raydium_v4().classify(&view).abstain_reason(),
            Some(AbstainReason::NotInitialLiquidity)
        );
    }

    #[test]
    fn test_wrong_authority_abstains() {
        let tx = PoolTx::new(Pubkey::new_unique());
        let view = tx.swap((10_000.0, 9_800.0), (50.0, 52.0), (0.0, 200.0)).build();

        assert_eq!(
            PoolClassifier::raydium_v4().classify(&view).abstain_reason(),
            Some(AbstainReason::AuthorityNotTwoSided)
        );
    }

    #[test]
    fn test_single_mint_abstains() {
        let mut b = ViewBuilder::new();
        let trader = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let idx = b.account_sol(trader, true, 5.0, 4.0);
        b.pre_token(idx, trader, mint, 0.0);
        b.post_token(idx, trader, mint, 100.0);
        let view = b.build();

        assert_eq!(
            PoolClassifier::raydium_v4().classify(&view).abstain_reason(),
            Some(AbstainReason::UnexpectedMintCount)
        );
    }

    #[test]
    fn test_below_min_pool_wsol_delta_abstains() {
        let tx = PoolTx::new(addresses::meteora_dbc_authority());
        let view = tx
            .swap((10_000.0, 9_999.0), (50.0, 50.0005), (0.0, 1.0))
            .build();

        assert_eq!(
            PoolClassifier::meteora_dbc().classify(&view).abstain_reason(),
            Some(AbstainReason::BelowMinSolSize)
        );
    }

    #[test]
    fn test_zero_signer_spl_delta_abstains() {
        let tx = PoolTx::new(addresses::raydium_v4_authority());
        // Another wallet receives the tokens; the signer only moved WSOL.
        let mut b = ViewBuilder::new();
        let receiver = Pubkey::new_unique();
        let idx_trader = b.account_sol(tx.trader, true, 5.0, 4.0);
        let idx_pool_token = b.account_sol(tx.pool_token_account, false, 0.002, 0.002);
        let idx_pool_wsol = b.account_sol(tx.pool_wsol_account, false, 0.002, 0.002);
        let idx_receiver = b.account_sol(receiver, false, 1.0, 1.0);
        b.pre_token(idx_trader, tx.trader, addresses::wsol_mint(), 3.0);
        b.post_token(idx_trader, tx.trader, addresses::wsol_mint(), 1.0);
        b.pre_token(idx_pool_token, tx.authority, tx.mint, 10_000.0);
        b.post_token(idx_pool_token, tx.authority, tx.mint, 9_800.0);
        b.pre_token(idx_pool_wsol, tx.authority, addresses::wsol_mint(), 50.0);
        b.post_token(idx_pool_wsol, tx.authority, addresses::wsol_mint(), 52.0);
        b.pre_token(idx_receiver, receiver, tx.mint, 0.0);
        b.post_token(idx_receiver, receiver, tx.mint, 200.0);
        let view = b.build();

        assert_eq!(
            PoolClassifier::raydium_v4().classify(&view).abstain_reason(),
            Some(AbstainReason::NoSignerTokenDelta)
        );
    }

    #[test]
    fn test_two_signers_disambiguated_by_zero_sol() {
        let tx = PoolTx::new(addresses::raydium_v4_authority());
        let mut b = tx.swap((10_000.0, 9_800.0), (50.0, 52.0), (0.0, 200.0));
        // Second signer with zero SOL on both sides and a token change.
        let ephemeral = Pubkey::new_unique();
        let idx = b.account_sol(ephemeral, true, 0.0, 0.0);
        b.pre_token(idx, ephemeral, tx.mint, 1.0);
        b.post_token(idx, ephemeral, tx.mint, 2.0);
        let view = b.build();

        let record = PoolClassifier::raydium_v4()
            .classify(&view)
            .trade()
            .cloned()
            .expect("should classify as trade");
        assert_eq!(record.signer, tx.trader);
    }
}
