use crate::types::Venue;
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use thiserror::Error;

/// Result of running a transaction view through a classifier.
///
/// Abstaining is the normal outcome for most transactions; it carries the
/// first precondition that failed so callers can log it without branching.
#[derive(Debug, Clone)]
pub enum Outcome {
    Trade(TradeRecord),
    Abstain(AbstainReason),
}

impl Outcome {
    pub fn is_trade(&self) -> bool {
        matches!(self, Outcome::Trade(_))
    }

    pub fn trade(&self) -> Option<&TradeRecord> {
        match self {
            Outcome::Trade(record) => Some(record),
            Outcome::Abstain(_) => None,
        }
    }

    pub fn abstain_reason(&self) -> Option<AbstainReason> {
        match self {
            Outcome::Trade(_) => None,
            Outcome::Abstain(reason) => Some(*reason),
        }
    }
}

impl From<Result<TradeRecord, AbstainReason>> for Outcome {
    fn from(result: Result<TradeRecord, AbstainReason>) -> Self {
        match result {
            Ok(record) => Outcome::Trade(record),
            Err(reason) => Outcome::Abstain(reason),
        }
    }
}

/// The precondition that made a classifier pass on a transaction.
///
/// Derives Error only for the Display impl; abstains are data, not faults.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbstainReason {
    #[error("no surviving token balance changes")]
    NoTokenChanges,

    #[error("more than one non-WSOL token changed")]
    MultipleTokens,

    #[error("no required signer owns a token change")]
    NoSignerCandidates,

    #[error("two signer candidates and neither could be eliminated")]
    AmbiguousSigner,

    #[error("more than two signer candidates")]
    TooManySigners,

    #[error("signer had no change in the traded token")]
    NoSignerTokenDelta,

    #[error("more than two balance entries on one side")]
    TooManyBalanceEntries,

    #[error("no counterparty account with token changes")]
    NoCurveAccount,

    #[error("more than one non-signer account with token changes")]
    MultipleCurveCandidates,

    #[error("changed mint count is not 2 or 3")]
    UnexpectedMintCount,

    #[error("pool authority does not hold exactly two changed mints including WSOL")]
    AuthorityNotTwoSided,

    #[error("third mint present but not an initial liquidity deposit")]
    NotInitialLiquidity,

    #[error("base token delta too small to price")]
    NegligibleTokenDelta,

    #[error("quote delta below the venue minimum size")]
    BelowMinSolSize,

    #[error("account missing from the transaction key list")]
    AccountNotFound,

    #[error("no account touched exactly two mints")]
    NoMarketAccount,

    #[error("could not tell the market account apart from the signer")]
    AmbiguousMarketAccount,

    #[error("market account did not touch WSOL")]
    MarketMissingWsol,

    #[error("no enabled venue produced a trade")]
    NoVenueMatched,
}

/// Balance legs for a bonding curve trade: the curve account holds the
/// token and native SOL directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveLegs {
    pub curve_spl_before: f64,
    pub curve_spl_after: f64,
    pub curve_sol_before: f64,
    pub curve_sol_after: f64,
    pub signer_spl_before: f64,
    pub signer_spl_after: f64,
    pub signer_sol_before: f64,
    pub signer_sol_after: f64,
}

/// Balance legs for pools reported with a single net signer SOL change
/// that folds in any signer WSOL movement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolNetLegs {
    pub pool_spl_before: f64,
    pub pool_spl_after: f64,
    pub pool_wsol_before: f64,
    pub pool_wsol_after: f64,
    pub signer_spl_before: f64,
    pub signer_spl_after: f64,
    pub signer_sol_change: f64,
}

/// Balance legs for pools reported with signer SOL before/after sides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolSideLegs {
    pub pool_spl_before: f64,
    pub pool_spl_after: f64,
    pub pool_wsol_before: f64,
    pub pool_wsol_after: f64,
    pub signer_spl_before: f64,
    pub signer_spl_after: f64,
    pub signer_sol_before: f64,
    pub signer_sol_after: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TradeLegs {
    Curve(CurveLegs),
    PoolNet(PoolNetLegs),
    PoolSide(PoolSideLegs),
}

/// A decoded swap. Immutable once built; decoding the same view twice
/// yields identical records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    pub signature: Signature,
    pub block_time: Option<i64>,
    pub slot: u64,
    /// Transaction fee in SOL
    pub fee_sol: f64,
    /// Quote-per-base price, always non-negative
    pub token_price: f64,
    /// Mint of the traded token
    pub token_address: Pubkey,
    /// Whether this transaction created the curve or pool it traded on
    pub is_creator: bool,
    pub signer: Pubkey,
    pub venue: Venue,
    pub legs: TradeLegs,
}
