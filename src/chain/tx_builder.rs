/// Transaction document construction: unsigned document, sign bytes,
/// signature attachment and broadcast body
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use cosmwasm_std::Decimal;
use serde_json::{Map, Value};

use crate::chain::types::{
    AccountMeta, BroadcastBody, BroadcastMode, Coin, PubKey, SignMessage, SignatureEnvelope,
    SignerOutput, StdFee, StdTx, TransactionRequest, SECP256K1_PUBKEY_TYPE,
};
use crate::error::SendError;

/// Build the unsigned document for a request
///
/// The fee is `gas * gas_price.amount` in fixed-point decimal, so there is
/// no rounding drift.
pub fn build_unsigned(request: &TransactionRequest) -> Result<StdTx, SendError> {
    let fee_amount = fee_amount(request.gas, request.gas_price.amount)?;

    Ok(StdTx {
        messages: request.messages.clone(),
        fee: StdFee {
            amount: vec![Coin {
                amount: fee_amount,
                denom: request.gas_price.denom.clone(),
            }],
            gas: request.gas,
        },
        signatures: None,
        memo: request.memo.clone(),
    })
}

fn fee_amount(gas: u64, price: Decimal) -> Result<Decimal, SendError> {
    let gas = Decimal::from_atomics(gas as u128, 0)
        .map_err(|e| SendError::InvalidRequest(format!("gas {} out of range: {}", gas, e)))?;

    gas.checked_mul(price)
        .map_err(|e| SendError::InvalidRequest(format!("fee overflow: {}", e)))
}

/// Document the signer signs over: the unsigned document bound to an
/// account state and a chain
pub fn sign_message(unsigned: &StdTx, account: &AccountMeta, chain_id: &str) -> SignMessage {
    SignMessage {
        account_number: account.account_number,
        chain_id: chain_id.to_string(),
        fee: unsigned.fee.clone(),
        memo: unsigned.memo.clone(),
        msgs: unsigned.messages.clone(),
        sequence: account.sequence,
    }
}

impl SignMessage {
    /// Canonical bytes: compact JSON with every object's keys sorted
    pub fn to_sign_bytes(&self) -> Result<Vec<u8>, SendError> {
        let value = serde_json::to_value(self)?;
        Ok(serde_json::to_vec(&canonicalize(value))?)
    }
}

/// Rebuild objects with their keys in sorted order, at every depth
fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));

            let mut sorted = Map::new();
            for (key, inner) in entries {
                sorted.insert(key, canonicalize(inner));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

/// Return a signed copy of `unsigned` carrying exactly one signature
pub fn attach_signature(unsigned: &StdTx, output: &SignerOutput, account: &AccountMeta) -> StdTx {
    let envelope = SignatureEnvelope {
        signature: BASE64.encode(&output.signature),
        pub_key: PubKey {
            key_type: SECP256K1_PUBKEY_TYPE.to_string(),
            value: BASE64.encode(&output.public_key),
        },
        account_number: account.account_number,
        sequence: account.sequence,
    };

    let mut signed = unsigned.clone();
    signed.signatures = Some(vec![envelope]);
    signed
}

/// JSON body for `POST <base>/txs`
pub fn broadcast_body(signed: &StdTx, mode: &BroadcastMode) -> Result<Value, SendError> {
    let body = BroadcastBody {
        tx: signed.clone(),
        mode: mode.clone(),
    };
    Ok(serde_json::to_value(body)?)
}
