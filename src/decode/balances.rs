use crate::types::addresses;
use crate::view::{RawTransactionView, TokenBalance};
use solana_sdk::pubkey::Pubkey;
use std::collections::{HashMap, HashSet};

/// Token account deltas smaller than this are treated as no change.
pub const CHANGE_EPSILON: f64 = 1e-9;

/// Normalized pre/post SPL balance entries for one transaction.
///
/// Construction drops every token account whose net UI change across the
/// transaction is negligible, so downstream logic only ever sees accounts
/// that actually moved. Filtering methods return new sets and never touch
/// the underlying view.
#[derive(Debug, Clone)]
pub struct BalanceSet {
    pub pre: Vec<TokenBalance>,
    pub post: Vec<TokenBalance>,
}

impl BalanceSet {
    /// Build the normalized set from a view.
    pub fn from_view(view: &RawTransactionView) -> Self {
        let mut net_by_index: HashMap<usize, f64> = HashMap::new();
        for balance in &view.post_token_balances {
            *net_by_index.entry(balance.account_index).or_default() += balance.ui_amount_or_zero();
        }
        for balance in &view.pre_token_balances {
            *net_by_index.entry(balance.account_index).or_default() -= balance.ui_amount_or_zero();
        }

        let changed =
            |balance: &&TokenBalance| net_by_index[&balance.account_index].abs() >= CHANGE_EPSILON;

        Self {
            pre: view.pre_token_balances.iter().filter(changed).cloned().collect(),
            post: view.post_token_balances.iter().filter(changed).cloned().collect(),
        }
    }

    /// Drop every account that carries the WSOL mint.
    pub fn without_wsol(&self) -> Self {
        let wsol = addresses::wsol_mint();
        let wsol_indexes: HashSet<usize> = self
            .iter_all()
            .filter(|b| b.mint == wsol)
            .map(|b| b.account_index)
            .collect();

        Self {
            pre: self
                .pre
                .iter()
                .filter(|b| !wsol_indexes.contains(&b.account_index))
                .cloned()
                .collect(),
            post: self
                .post
                .iter()
                .filter(|b| !wsol_indexes.contains(&b.account_index))
                .cloned()
                .collect(),
        }
    }

    /// Fee-splitting cleanup: when a mint was changed by two or more
    /// distinct owners, keep only the owner with the larger absolute net
    /// change in that mint. Best effort; not part of any default venue
    /// path.
    pub fn retain_dominant_owner_per_mint(&self) -> Self {
        let mut net: HashMap<(Pubkey, Pubkey), f64> = HashMap::new();
        for balance in &self.post {
            *net.entry((balance.mint, balance.owner)).or_default() += balance.ui_amount_or_zero();
        }
        for balance in &self.pre {
            *net.entry((balance.mint, balance.owner)).or_default() -= balance.ui_amount_or_zero();
        }

        let mut dominant: HashMap<Pubkey, (Pubkey, f64)> = HashMap::new();
        for ((mint, owner), delta) in &net {
            let best = dominant.entry(*mint).or_insert((*owner, delta.abs()));
            if delta.abs() > best.1 {
                *best = (*owner, delta.abs());
            }
        }

        let keep = |balance: &&TokenBalance| {
            dominant
                .get(&balance.mint)
                .is_some_and(|(owner, _)| *owner == balance.owner)
        };

        Self {
            pre: self.pre.iter().filter(keep).cloned().collect(),
            post: self.post.iter().filter(keep).cloned().collect(),
        }
    }

    /// Copy of the set with post entries for one (owner, mint) pair
    /// removed. Used to strip an LP receipt before the signer leg lookups.
    pub fn without_post_entry(&self, owner: &Pubkey, mint: &Pubkey) -> Self {
        Self {
            pre: self.pre.clone(),
            post: self
                .post
                .iter()
                .filter(|b| !(&b.owner == owner && &b.mint == mint))
                .cloned()
                .collect(),
        }
    }

    pub fn iter_all(&self) -> impl Iterator<Item = &TokenBalance> {
        self.pre.iter().chain(self.post.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.pre.is_empty() && self.post.is_empty()
    }

    /// Every owner appearing in pre or post, duplicates included.
    pub fn owners(&self) -> Vec<Pubkey> {
        self.iter_all().map(|b| b.owner).collect()
    }

    /// Distinct mints appearing in pre or post.
    pub fn mints(&self) -> HashSet<Pubkey> {
        self.iter_all().map(|b| b.mint).collect()
    }

    /// Distinct mints held by one owner.
    pub fn mints_owned_by(&self, owner: &Pubkey) -> HashSet<Pubkey> {
        self.iter_all()
            .filter(|b| &b.owner == owner)
            .map(|b| b.mint)
            .collect()
    }

    /// Distinct mints per owner, across pre and post.
    pub fn owner_mint_map(&self) -> HashMap<Pubkey, HashSet<Pubkey>> {
        let mut map: HashMap<Pubkey, HashSet<Pubkey>> = HashMap::new();
        for balance in self.iter_all() {
            map.entry(balance.owner).or_default().insert(balance.mint);
        }
        map
    }

    /// Whether an owner appears among entries with a literally nonzero
    /// raw amount.
    pub fn owner_has_nonzero_raw(&self, owner: &Pubkey) -> bool {
        self.iter_all()
            .any(|b| &b.owner == owner && b.raw_amount != "0")
    }

    /// First pre amount for an owner, any mint; absent reads as zero.
    pub fn pre_ui_by_owner(&self, owner: &Pubkey) -> f64 {
        first_ui(&self.pre, |b| &b.owner == owner)
    }

    pub fn post_ui_by_owner(&self, owner: &Pubkey) -> f64 {
        first_ui(&self.post, |b| &b.owner == owner)
    }

    /// First pre amount for an (owner, mint) pair; absent reads as zero.
    pub fn pre_ui(&self, owner: &Pubkey, mint: &Pubkey) -> f64 {
        first_ui(&self.pre, |b| &b.owner == owner && &b.mint == mint)
    }

    pub fn post_ui(&self, owner: &Pubkey, mint: &Pubkey) -> f64 {
        first_ui(&self.post, |b| &b.owner == owner && &b.mint == mint)
    }

    /// First pre amount for an owner in any mint except the given one.
    pub fn pre_ui_excluding_mint(&self, owner: &Pubkey, excluded: &Pubkey) -> f64 {
        first_ui(&self.pre, |b| &b.owner == owner && &b.mint != excluded)
    }

    pub fn post_ui_excluding_mint(&self, owner: &Pubkey, excluded: &Pubkey) -> f64 {
        first_ui(&self.post, |b| &b.owner == owner && &b.mint != excluded)
    }

    /// How many pre/post entries match an (owner, mint) pair.
    pub fn entry_counts(&self, owner: &Pubkey, mint: &Pubkey) -> (usize, usize) {
        let matcher = |b: &&TokenBalance| &b.owner == owner && &b.mint == mint;
        (
            self.pre.iter().filter(matcher).count(),
            self.post.iter().filter(matcher).count(),
        )
    }
}

fn first_ui(balances: &[TokenBalance], matcher: impl Fn(&&TokenBalance) -> bool) -> f64 {
    balances
        .iter()
        .find(matcher)
        .map(|b| b.ui_amount_or_zero())
        .unwrap_or(0.0)
}
