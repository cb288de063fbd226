use crate::view::{AccountKey, RawTransactionView, TokenBalance, ViewError};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use yellowstone_grpc_proto::prelude::{
    Message, MessageHeader, SubscribeUpdateTransaction, TokenBalance as ProtoTokenBalance,
};

/// Build a view from a geyser transaction update.
///
/// Geyser pushes the raw wire message, so signer/writable flags have to be
/// reconstructed from the message header, and address-table accounts come
/// from the meta's loaded address lists (never signers, writability per
/// list). Geyser updates carry no block time; callers pass one if they
/// know it.
pub fn view_from_geyser(
    update: &SubscribeUpdateTransaction,
    block_time: Option<i64>,
) -> Result<RawTransactionView, ViewError> {
    let tx_info = update.transaction.as_ref().ok_or(ViewError::MissingMeta)?;
    let meta = tx_info.meta.as_ref().ok_or(ViewError::MissingMeta)?;
    let transaction = tx_info
        .transaction
        .as_ref()
        .ok_or(ViewError::MissingMessage)?;
    let message = transaction
        .message
        .as_ref()
        .ok_or(ViewError::MissingMessage)?;
    let header = message.header.as_ref().ok_or(ViewError::MissingMessage)?;

    let signature_bytes: &[u8] = if !tx_info.signature.is_empty() {
        &tx_info.signature
    } else {
        transaction
            .signatures
            .first()
            .map(|s| s.as_slice())
            .ok_or(ViewError::MissingMessage)?
    };
    let signature = Signature::try_from(signature_bytes)
        .map_err(|_| ViewError::InvalidSignature(bs58::encode(signature_bytes).into_string()))?;

    let mut account_keys = static_account_keys(message, header)?;
    for raw in &meta.loaded_writable_addresses {
        account_keys.push(AccountKey {
            pubkey: pubkey_from_bytes(raw)?,
            is_signer: false,
            is_writable: true,
        });
    }
    for raw in &meta.loaded_readonly_addresses {
        account_keys.push(AccountKey {
            pubkey: pubkey_from_bytes(raw)?,
            is_signer: false,
            is_writable: false,
        });
    }

    let view = RawTransactionView {
        signature,
        slot: update.slot,
        block_time,
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

/// Static message keys with signer/writable flags derived from the header.
fn static_account_keys(
    message: &Message,
    header: &MessageHeader,
) -> Result<Vec<AccountKey>, ViewError> {
    let total = message.account_keys.len();
    let num_signers = header.num_required_signatures as usize;
    let num_readonly_signed = header.num_readonly_signed_accounts as usize;
    let num_readonly_unsigned = header.num_readonly_unsigned_accounts as usize;

    let mut keys = Vec::with_capacity(total);
    for (index, raw) in message.account_keys.iter().enumerate() {
        let is_signer = index < num_signers;
        let is_writable = if is_signer {
            index < num_signers.saturating_sub(num_readonly_signed)
        } else {
            index < total.saturating_sub(num_readonly_unsigned)
        };
        keys.push(AccountKey {
            pubkey: pubkey_from_bytes(raw)?,
            is_signer,
            is_writable,
        });
    }
    Ok(keys)
}

fn pubkey_from_bytes(raw: &[u8]) -> Result<Pubkey, ViewError> {
    Pubkey::try_from(raw).map_err(|_| ViewError::InvalidPubkey(bs58::encode(raw).into_string()))
}

fn convert_token_balances(balances: &[ProtoTokenBalance]) -> Result<Vec<TokenBalance>, ViewError> {
    let mut out = Vec::with_capacity(balances.len());
    for balance in balances {
        let owner = if balance.owner.is_empty() {
            Pubkey::default()
        } else {
            balance
                .owner
                .parse()
                .map_err(|_| ViewError::InvalidPubkey(balance.owner.clone()))?
        };
        let mint = balance
            .mint
            .parse()
            .map_err(|_| ViewError::InvalidPubkey(balance.mint.clone()))?;

        let (ui_amount, raw_amount) = match balance.ui_token_amount.as_ref() {
            Some(amount) => (Some(amount.ui_amount), amount.amount.clone()),
            None => (None, "0".to_string()),
        };

        out.push(TokenBalance {
            account_index: balance.account_index as usize,
            owner,
            mint,
            ui_amount,
            raw_amount,
        });
    }
    Ok(out)
}
