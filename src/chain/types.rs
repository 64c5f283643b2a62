/// Wire and request types for legacy (amino JSON) Cosmos transactions
use cosmwasm_std::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::SendError;

/// Denomination used when the caller does not pick a gas price
pub const DEFAULT_GAS_DENOM: &str = "uatom";

/// Public key type tag expected by the node for secp256k1 signers
pub const SECP256K1_PUBKEY_TYPE: &str = "tendermint/PubKeySecp256k1";

/// Amino JSON encodes 64-bit integers as decimal strings
mod string_u64 {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse::<u64>().map_err(D::Error::custom)
    }
}

/// An amount of a single denomination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub amount: Decimal,
    pub denom: String,
}

/// Price paid per unit of gas
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasPrice {
    pub amount: Decimal,
    pub denom: String,
}

impl GasPrice {
    pub fn new(amount: Decimal, denom: impl Into<String>) -> Self {
        Self {
            amount,
            denom: denom.into(),
        }
    }

    /// Parse a decimal amount such as "0.000000025"
    pub fn parse(amount: &str, denom: impl Into<String>) -> Result<Self, SendError> {
        let amount = Decimal::from_str(amount.trim())
            .map_err(|e| SendError::InvalidRequest(format!("invalid gas price {:?}: {}", amount, e)))?;
        Ok(Self::new(amount, denom))
    }
}

impl Default for GasPrice {
    /// 2.5e-8 uatom
    fn default() -> Self {
        Self {
            amount: Decimal::from_ratio(25u128, 1_000_000_000u128),
            denom: DEFAULT_GAS_DENOM.to_string(),
        }
    }
}

/// What the caller wants to send
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRequest {
    pub gas: u64,
    pub gas_price: GasPrice,
    pub memo: String,
    pub messages: Vec<Value>,
}

impl TransactionRequest {
    /// Create a request with the default gas price and an empty memo
    pub fn new(gas: u64, messages: Vec<Value>) -> Result<Self, SendError> {
        if gas == 0 {
            return Err(SendError::InvalidRequest("gas must be greater than zero".to_string()));
        }

        Ok(Self {
            gas,
            gas_price: GasPrice::default(),
            memo: String::new(),
            messages,
        })
    }

    pub fn with_gas_price(mut self, gas_price: GasPrice) -> Self {
        self.gas_price = gas_price;
        self
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = memo.into();
        self
    }
}

/// Fee section of a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StdFee {
    pub amount: Vec<Coin>,
    #[serde(with = "string_u64")]
    pub gas: u64,
}

/// Transaction document, unsigned while `signatures` is `None`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StdTx {
    #[serde(rename = "msg")]
    pub messages: Vec<Value>,
    pub fee: StdFee,
    pub signatures: Option<Vec<SignatureEnvelope>>,
    pub memo: String,
}

impl StdTx {
    pub fn is_signed(&self) -> bool {
        self.signatures.as_ref().map_or(false, |sigs| !sigs.is_empty())
    }
}

/// Account state the signature is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccountMeta {
    pub account_number: u64,
    pub sequence: u64,
}

/// Document the signer signs over
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignMessage {
    #[serde(with = "string_u64")]
    pub account_number: u64,
    pub chain_id: String,
    pub fee: StdFee,
    pub memo: String,
    pub msgs: Vec<Value>,
    #[serde(with = "string_u64")]
    pub sequence: u64,
}

/// Raw output of a signer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerOutput {
    pub signature: Vec<u8>,
    pub public_key: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PubKey {
    #[serde(rename = "type")]
    pub key_type: String,
    /// Base64 encoded key bytes
    pub value: String,
}

/// Signature entry of a signed transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureEnvelope {
    /// Base64 encoded signature bytes
    pub signature: String,
    pub pub_key: PubKey,
    #[serde(with = "string_u64")]
    pub account_number: u64,
    #[serde(with = "string_u64")]
    pub sequence: u64,
}

/// How long the node holds the broadcast request open
///
/// Unknown values are kept as-is and left for the node to accept or refuse.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BroadcastMode {
    /// Return after CheckTx
    #[default]
    Sync,
    /// Return immediately
    Async,
    /// Return after the block commit
    Block,
    Other(String),
}

impl BroadcastMode {
    pub fn as_str(&self) -> &str {
        match self {
            BroadcastMode::Sync => "sync",
            BroadcastMode::Async => "async",
            BroadcastMode::Block => "block",
            BroadcastMode::Other(mode) => mode,
        }
    }
}

impl From<String> for BroadcastMode {
    fn from(mode: String) -> Self {
        match mode.as_str() {
            "sync" => BroadcastMode::Sync,
            "async" => BroadcastMode::Async,
            "block" => BroadcastMode::Block,
            _ => BroadcastMode::Other(mode),
        }
    }
}

impl From<&str> for BroadcastMode {
    fn from(mode: &str) -> Self {
        BroadcastMode::from(mode.to_string())
    }
}

impl From<BroadcastMode> for String {
    fn from(mode: BroadcastMode) -> Self {
        mode.as_str().to_string()
    }
}

impl fmt::Display for BroadcastMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body posted to `<base>/txs`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastBody {
    pub tx: StdTx,
    pub mode: BroadcastMode,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_gas_price() {
        let price = GasPrice::default();
        assert_eq!(price.amount.to_string(), "0.000000025");
        assert_eq!(price.denom, "uatom");
    }

    #[test]
    fn test_request_rejects_zero_gas() {
        let err = TransactionRequest::new(0, vec![]).unwrap_err();
        assert!(matches!(err, SendError::InvalidRequest(_)));
    }

    #[test]
    fn test_request_defaults() {
        let request = TransactionRequest::new(200_000, vec![json!({"type": "x"})]).unwrap();
        assert_eq!(request.memo, "");
        assert_eq!(request.gas_price, GasPrice::default());

        let request = request.with_memo("hello");
        assert_eq!(request.memo, "hello");
    }

    #[test]
    fn test_gas_price_parse() {
        let price = GasPrice::parse("0.025", "uatom").unwrap();
        assert_eq!(price.amount, Decimal::from_ratio(25u128, 1000u128));
        assert!(GasPrice::parse("abc", "uatom").is_err());
    }

    #[test]
    fn test_broadcast_mode_passthrough() {
        assert_eq!(BroadcastMode::from("block"), BroadcastMode::Block);
        let custom = BroadcastMode::from("commit");
        assert_eq!(custom, BroadcastMode::Other("commit".to_string()));
        assert_eq!(serde_json::to_value(&custom).unwrap(), json!("commit"));
        assert_eq!(serde_json::to_value(BroadcastMode::default()).unwrap(), json!("sync"));
    }

    #[test]
    fn test_integers_serialize_as_strings() {
        let fee = StdFee {
            amount: vec![],
            gas: 200_000,
        };
        let value = serde_json::to_value(&fee).unwrap();
        assert_eq!(value["gas"], json!("200000"));

        let back: StdFee = serde_json::from_value(value).unwrap();
        assert_eq!(back.gas, 200_000);
    }
}
