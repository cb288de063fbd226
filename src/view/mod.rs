pub mod grpc;
pub mod rpc;

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use thiserror::Error;

pub const LAMPORTS_PER_SOL: f64 = 1_000_000_000.0;

/// Errors raised while building or validating a transaction view.
///
/// These are structural faults in the input, not classification decisions.
/// A transaction that fails here never reaches the decoders.
#[derive(Error, Debug)]
pub enum ViewError {
    #[error("transaction has no metadata")]
    MissingMeta,

    #[error("transaction has no message body")]
    MissingMessage,

    #[error("unsupported transaction encoding (expected json-parsed)")]
    UnsupportedEncoding,

    #[error("transaction has no account keys")]
    NoAccountKeys,

    #[error("transaction has no signer accounts")]
    NoSigners,

    #[error(
        "lamport balance arrays do not match account keys: {keys} keys, {pre} pre, {post} post"
    )]
    BalanceLengthMismatch { keys: usize, pre: usize, post: usize },

    #[error("token balance references account index {index} but only {keys} keys exist")]
    TokenIndexOutOfRange { index: usize, keys: usize },

    #[error("invalid pubkey in transaction: {0}")]
    InvalidPubkey(String),

    #[error("invalid signature in transaction: {0}")]
    InvalidSignature(String),
}

/// One entry of the transaction's account key list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountKey {
    pub pubkey: Pubkey,
    pub is_signer: bool,
    pub is_writable: bool,
}

/// One pre- or post-transaction SPL token balance entry.
///
/// `ui_amount` is absent for accounts the node reports without a decimal
/// amount; callers treat that as zero. `raw_amount` is the untruncated
/// base-unit amount as the node reported it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenBalance {
    pub account_index: usize,
    pub owner: Pubkey,
    pub mint: Pubkey,
    pub ui_amount: Option<f64>,
    pub raw_amount: String,
}

impl TokenBalance {
    /// UI amount with absence read as zero
    pub fn ui_amount_or_zero(&self) -> f64 {
        self.ui_amount.unwrap_or(0.0)
    }
}

/// Transport-agnostic snapshot of a confirmed transaction.
///
/// Both the RPC and geyser adapters produce this shape; everything
/// downstream works from balance data only and never sees instructions.
#[derive(Debug, Clone)]
pub struct RawTransactionView {
    pub signature: Signature,
    pub slot: u64,
    pub block_time: Option<i64>,
    /// Transaction fee in lamports
    pub fee: u64,
    pub account_keys: Vec<AccountKey>,
    /// Lamport balances, index-aligned with `account_keys`
    pub pre_balances: Vec<u64>,
    pub post_balances: Vec<u64>,
    pub pre_token_balances: Vec<TokenBalance>,
    pub post_token_balances: Vec<TokenBalance>,
}

impl RawTransactionView {
    /// Check the structural invariants every downstream consumer assumes.
    pub fn validate(&self) -> Result<(), ViewError> {
        if self.account_keys.is_empty() {
            return Err(ViewError::NoAccountKeys);
        }
        if !self.account_keys.iter().any(|k| k.is_signer) {
            return Err(ViewError::NoSigners);
        }
        if self.pre_balances.len() != self.account_keys.len()
            || self.post_balances.len() != self.account_keys.len()
        {
            return Err(ViewError::BalanceLengthMismatch {
                keys: self.account_keys.len(),
                pre: self.pre_balances.len(),
                post: self.post_balances.len(),
            });
        }
        for balance in self
            .pre_token_balances
            .iter()
            .chain(self.post_token_balances.iter())
        {
            if balance.account_index >= self.account_keys.len() {
                return Err(ViewError::TokenIndexOutOfRange {
                    index: balance.account_index,
                    keys: self.account_keys.len(),
                });
            }
        }
        Ok(())
    }

    /// Index of an address in the account key list
    pub fn account_index(&self, address: &Pubkey) -> Option<usize> {
        self.account_keys.iter().position(|k| &k.pubkey == address)
    }

    /// Pre/post native SOL balances for an address, in SOL
    pub fn sol_balances(&self, address: &Pubkey) -> Option<(f64, f64)> {
        let index = self.account_index(address)?;
        let pre = *self.pre_balances.get(index)? as f64 / LAMPORTS_PER_SOL;
        let post = *self.post_balances.get(index)? as f64 / LAMPORTS_PER_SOL;
        Some((pre, post))
    }

    /// Addresses of the accounts that had to sign this transaction
    pub fn required_signers(&self) -> Vec<Pubkey> {
        self.account_keys
            .iter()
            .filter(|k| k.is_signer)
            .map(|k| k.pubkey)
            .collect()
    }

    /// Whether a program id appears among the account keys
    pub fn contains_program(&self, program: &Pubkey) -> bool {
        self.account_keys.iter().any(|k| &k.pubkey == program)
    }

    /// Transaction fee in SOL
    pub fn fee_sol(&self) -> f64 {
        self.fee as f64 / LAMPORTS_PER_SOL
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ViewBuilder;
    use super::*;

    #[test]
    fn test_validate_accepts_well_formed_view() {
        let mut b = ViewBuilder::new();
        let signer = Pubkey::new_unique();
        let idx = b.account_sol(signer, true, 1.0, 0.9);
        b.pre_token(idx, signer, Pubkey::new_unique(), 5.0);
        let view = b.build();
        assert!(view.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_key_list() {
        let view = ViewBuilder::new().build();
        assert!(matches!(view.validate(), Err(ViewError::NoAccountKeys)));
    }

    #[test]
    fn test_validate_rejects_missing_signer() {
        let mut b = ViewBuilder::new();
        b.account_sol(Pubkey::new_unique(), false, 1.0, 1.0);
        let view = b.build();
        assert!(matches!(view.validate(), Err(ViewError::NoSigners)));
    }

    #[test]
    fn test_validate_rejects_balance_length_mismatch() {
        let mut b = ViewBuilder::new();
        b.account_sol(Pubkey::new_unique(), true, 1.0, 1.0);
        let mut view = b.build();
        view.post_balances.pop();
        assert!(matches!(
            view.validate(),
            Err(ViewError::BalanceLengthMismatch { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_token_index_out_of_range() {
        let mut b = ViewBuilder::new();
        let owner = Pubkey::new_unique();
        b.account_sol(owner, true, 1.0, 1.0);
        b.post_token(7, owner, Pubkey::new_unique(), 1.0);
        let view = b.build();
        assert!(matches!(
            view.validate(),
            Err(ViewError::TokenIndexOutOfRange { index: 7, .. })
        ));
    }

    #[test]
    fn test_sol_balances_lookup() {
        let mut b = ViewBuilder::new();
        let wallet = Pubkey::new_unique();
        b.account_sol(wallet, true, 2.0, 1.5);
        let view = b.build();

        let (pre, post) = view.sol_balances(&wallet).unwrap();
        assert!((pre - 2.0).abs() < 1e-9);
        assert!((post - 1.5).abs() < 1e-9);
        assert!(view.sol_balances(&Pubkey::new_unique()).is_none());
    }

    #[test]
    fn test_required_signers_and_program_presence() {
        let mut b = ViewBuilder::new();
        let signer = Pubkey::new_unique();
        let program = Pubkey::new_unique();
        b.account_sol(signer, true, 1.0, 1.0);
        b.account_sol(program, false, 0.0, 0.0);
        let view = b.build();

        assert_eq!(view.required_signers(), vec![signer]);
        assert!(view.contains_program(&program));
        assert!(!view.contains_program(&Pubkey::new_unique()));
    }
}
