use crate::view::{AccountKey, RawTransactionView, TokenBalance, ViewError};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_transaction_status::option_serializer::OptionSerializer;
use solana_transaction_status::{
    EncodedConfirmedTransactionWithStatusMeta, EncodedTransaction, UiMessage,
    UiTransactionTokenBalance,
};
use std::str::FromStr;

/// Build a view from a JSON-parsed RPC transaction fetch.
///
/// Expects the transaction to have been requested with
/// `UiTransactionEncoding::JsonParsed`; other encodings do not carry the
/// per-key signer flags this needs.
pub fn view_from_encoded(
    fetched: &EncodedConfirmedTransactionWithStatusMeta,
) -> Result<RawTransactionView, ViewError> {
    let meta = fetched
        .transaction
        .meta
        .as_ref()
        .ok_or(ViewError::MissingMeta)?;

    let ui_transaction = match &fetched.transaction.transaction {
        EncodedTransaction::Json(tx) => tx,
        _ => return Err(ViewError::UnsupportedEncoding),
    };

    let parsed_message = match &ui_transaction.message {
        UiMessage::Parsed(message) => message,
        UiMessage::Raw(_) => return Err(ViewError::UnsupportedEncoding),
    };

    let signature_str = ui_transaction
        .signatures
        .first()
        .ok_or(ViewError::MissingMessage)?;
    let signature = Signature::from_str(signature_str)
        .map_err(|e| ViewError::InvalidSignature(e.to_string()))?;

    let mut account_keys = Vec::with_capacity(parsed_message.account_keys.len());
    for key in &parsed_message.account_keys {
        let pubkey = Pubkey::from_str(&key.pubkey)
            .map_err(|_| ViewError::InvalidPubkey(key.pubkey.clone()))?;
        account_keys.push(AccountKey {
            pubkey,
            is_signer: key.signer,
            is_writable: key.writable,
        });
    }

    let view = RawTransactionView {
        signature,
        slot: fetched.slot,
        block_time: fetched.block_time,
        fee: meta.fee,
        account_keys,
        pre_balances: meta.pre_balances.clone(),
        post_balances: meta.post_balances.clone(),
        pre_token_balances: convert_token_balances(&meta.pre_token_balances)?,
        post_token_balances: convert_token_balances(&meta.post_token_balances)?,
    };

    view.validate()?;
    Ok(view)
}

/// Convert one OptionSerializer-wrapped token balance list.
///
/// None and Skip both mean the node sent no token balances, which is a
/// valid empty list, not an error.
fn convert_token_balances(
    balances: &OptionSerializer<Vec<UiTransactionTokenBalance>>,
) -> Result<Vec<TokenBalance>, ViewError> {
    let balances = match balances {
        OptionSerializer::Some(balances) => balances,
        OptionSerializer::None | OptionSerializer::Skip => return Ok(Vec::new()),
    };

    let mut out = Vec::with_capacity(balances.len());
    for balance in balances {
        let mint = Pubkey::from_str(&balance.mint)
            .map_err(|_| ViewError::InvalidPubkey(balance.mint.clone()))?;

        let owner = match &balance.owner {
            OptionSerializer::Some(owner) => Pubkey::from_str(owner)
                .map_err(|_| ViewError::InvalidPubkey(owner.clone()))?,
            OptionSerializer::None | OptionSerializer::Skip => Pubkey::default(),
        };

        out.push(TokenBalance {
            account_index: balance.account_index as usize,
            owner,
            mint,
            ui_amount: balance.ui_token_amount.ui_amount,
            raw_amount: balance.ui_token_amount.amount.clone(),
        });
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_account_decoder::parse_token::UiTokenAmount;

    fn ui_balance(index: u8, mint: &Pubkey, owner: &Pubkey, ui: f64) -> UiTransactionTokenBalance {
        UiTransactionTokenBalance {
            account_index: index,
            mint: mint.to_string(),
            ui_token_amount: UiTokenAmount {
                ui_amount: Some(ui),
                decimals: 6,
                amount: format!("{}", (ui * 1_000_000.0) as u64),
                ui_amount_string: format!("{}", ui),
            },
            owner: OptionSerializer::Some(owner.to_string()),
            program_id: OptionSerializer::Skip,
        }
    }

    #[test]
    fn test_convert_skip_is_empty() {
        let converted = convert_token_balances(&OptionSerializer::Skip).unwrap();
        assert!(converted.is_empty());
        let converted = convert_token_balances(&OptionSerializer::None).unwrap();
        assert!(converted.is_empty());
    }

    #[test]
    fn test_convert_carries_raw_amount_and_owner() {
        let mint = Pubkey::new_unique();
        let owner = Pubkey::new_unique();
        let converted = convert_token_balances(&OptionSerializer::Some(vec![ui_balance(
            3, &mint, &owner, 1.5,
        )]))
        .unwrap();

        assert_eq!(converted.len(), 1);
        assert_eq!(converted[0].account_index, 3);
        assert_eq!(converted[0].mint, mint);
        assert_eq!(converted[0].owner, owner);
        assert_eq!(converted[0].raw_amount, "1500000");
        assert_eq!(converted[0].ui_amount, Some(1.5));
    }

    #[test]
    fn test_convert_missing_owner_defaults() {
        let mint = Pubkey::new_unique();
        let mut balance = ui_balance(0, &mint, &Pubkey::new_unique(), 1.0);
        balance.owner = OptionSerializer::None;
        let converted = convert_token_balances(&OptionSerializer::Some(vec![balance])).unwrap();
        assert_eq!(converted[0].owner, Pubkey::default());
    }

    #[test]
    fn test_convert_rejects_bad_mint() {
        let mut balance = ui_balance(0, &Pubkey::new_unique(), &Pubkey::new_unique(), 1.0);
        balance.mint = "not-a-pubkey".to_string();
        let result = convert_token_balances(&OptionSerializer::Some(vec![balance]));
        assert!(matches!(result, Err(ViewError::InvalidPubkey(_))));
    }
}
