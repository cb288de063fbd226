use crate::decode::balances::BalanceSet;
use crate::decode::types::AbstainReason;
use crate::view::RawTransactionView;
use solana_sdk::pubkey::Pubkey;

/// Signer candidates: required-signature accounts that own at least one
/// surviving token balance entry. Order follows the account key list.
pub fn candidates(view: &RawTransactionView, set: &BalanceSet) -> Vec<Pubkey> {
    let owners = set.owners();
    let mut out = Vec::new();
    for signer in view.required_signers() {
        if owners.contains(&signer) && !out.contains(&signer) {
            out.push(signer);
        }
    }
    out
}

/// Resolve the trading wallet from the candidate list.
///
/// With two candidates, a signer whose native SOL balance is zero on both
/// sides is a throwaway (ephemeral mint or nonce account) and the other
/// one is the trader. Anything still ambiguous is an abstain.
pub fn resolve(
    view: &RawTransactionView,
    candidates: &[Pubkey],
) -> Result<Pubkey, AbstainReason> {
    match candidates {
        [] => Err(AbstainReason::NoSignerCandidates),
        [only] => Ok(*only),
        [_, _] => {
            let zero_changes: Vec<Pubkey> = candidates
                .iter()
                .filter(|candidate| {
                    matches!(view.sol_balances(candidate), Some((pre, post)) if pre == 0.0 && post == 0.0)
                })
                .copied()
                .collect();
            if zero_changes.len() == 1 {
                Ok(*candidates
                    .iter()
                    .find(|c| **c != zero_changes[0])
                    .unwrap_or(&candidates[0]))
            } else {
                Err(AbstainReason::AmbiguousSigner)
            }
        }
        _ => Err(AbstainReason::TooManySigners),
    }
}

/// Bonding curve variant: on token creation the mint itself co-signs, so
/// with two candidates the one that is not the mint address is the trader.
pub fn resolve_preferring_non_mint(
    candidates: &[Pubkey],
    mint: &Pubkey,
) -> Result<Pubkey, AbstainReason> {
    match candidates {
        [] => Err(AbstainReason::NoSignerCandidates),
        [only] => Ok(*only),
        [_, _] => candidates
            .iter()
            .find(|candidate| *candidate != mint)
            .copied()
            .ok_or(AbstainReason::AmbiguousSigner),
        _ => Err(AbstainReason::TooManySigners),
    }
}
