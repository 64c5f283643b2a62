/// Broadcast reply normalization
///
/// A node answers `POST /txs` in several shapes: an object with a `txhash`,
/// a failure object, an array of either, a bare JSON string, or nothing
/// usable at all (the transport failed). Replies are decoded into a
/// `BroadcastReply` first and then classified into a single outcome.
use serde_json::{Map, Value};

use crate::chain::traits::CodeLookup;
use crate::error::{SendError, TransportError};

/// Message used when a failure object carries no readable text
pub const GENERIC_REJECTION: &str = "transaction rejected";

/// Message used when the node answers with an empty array
pub const EMPTY_RESULT: &str = "no broadcast result returned";

/// A broadcast the node accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    pub hash: String,
}

/// Fields of a single reply object that matter for classification
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TxReply {
    pub txhash: Option<String>,
    pub code: Option<Value>,
    pub codespace: Option<String>,
    pub raw_log: Option<String>,
    pub message: Option<String>,
    pub error: Option<String>,
}

impl TxReply {
    fn from_object(object: &Map<String, Value>) -> Self {
        let text = |key: &str| object.get(key).and_then(Value::as_str).map(str::to_string);

        Self {
            txhash: text("txhash").filter(|hash| !hash.is_empty()),
            code: object.get("code").cloned(),
            codespace: text("codespace"),
            raw_log: text("raw_log"),
            message: text("message"),
            error: text("error"),
        }
    }

    /// Best readable description of a rejection
    fn rejection_text(&self) -> String {
        [&self.message, &self.error, &self.raw_log]
            .into_iter()
            .flatten()
            .find(|text| !text.is_empty())
            .cloned()
            .unwrap_or_else(|| GENERIC_REJECTION.to_string())
    }

    fn code_status(&self) -> CodeStatus {
        CodeStatus::of(self.code.as_ref())
    }
}

/// Interpretation of a reply's `code` field
#[derive(Debug, Clone, PartialEq)]
enum CodeStatus {
    /// Absent, null, zero, false or empty
    Clear,
    Failed(u32),
    /// Truthy but not an integer
    Invalid(Value),
}

impl CodeStatus {
    fn of(code: Option<&Value>) -> Self {
        let Some(code) = code else {
            return CodeStatus::Clear;
        };

        match code {
            Value::Null | Value::Bool(false) => CodeStatus::Clear,
            Value::Number(number) => {
                if let Some(n) = number.as_u64() {
                    Self::from_u64(n)
                } else if number.as_f64() == Some(0.0) {
                    CodeStatus::Clear
                } else {
                    CodeStatus::Invalid(code.clone())
                }
            }
            Value::String(s) => {
                let s = s.trim();
                if s.is_empty() {
                    CodeStatus::Clear
                } else {
                    match s.parse::<u64>() {
                        Ok(n) => Self::from_u64(n),
                        Err(_) => CodeStatus::Invalid(code.clone()),
                    }
                }
            }
            _ => CodeStatus::Invalid(code.clone()),
        }
    }

    fn from_u64(n: u64) -> Self {
        if n == 0 {
            CodeStatus::Clear
        } else {
            CodeStatus::Failed(u32::try_from(n).unwrap_or(u32::MAX))
        }
    }
}

/// Decoded shape of a broadcast reply
#[derive(Debug, Clone, PartialEq)]
pub enum BroadcastReply {
    /// Object with a non-empty `txhash`
    Accepted(TxReply),
    /// Object without a `txhash`
    Rejected(TxReply),
    Batch(Vec<BroadcastReply>),
    /// Bare JSON string
    Text(String),
    /// Number, boolean or null
    Unexpected(Value),
}

impl BroadcastReply {
    pub fn decode(value: &Value) -> Self {
        match value {
            Value::Object(object) => {
                let reply = TxReply::from_object(object);
                if reply.txhash.is_some() {
                    BroadcastReply::Accepted(reply)
                } else {
                    BroadcastReply::Rejected(reply)
                }
            }
            Value::Array(items) => BroadcastReply::Batch(items.iter().map(Self::decode).collect()),
            Value::String(text) => BroadcastReply::Text(text.clone()),
            other => BroadcastReply::Unexpected(other.clone()),
        }
    }

    /// Classify the reply; a non-zero `code` wins over everything else in
    /// the same object
    pub fn classify(&self, codes: &dyn CodeLookup) -> Result<Accepted, SendError> {
        match self {
            BroadcastReply::Accepted(reply) => {
                check_code(reply, codes)?;
                let hash = reply.txhash.clone().unwrap_or_default();
                Ok(Accepted { hash })
            }
            BroadcastReply::Rejected(reply) => {
                check_code(reply, codes)?;
                Err(SendError::MalformedResponse(reply.rejection_text()))
            }
            BroadcastReply::Batch(items) => {
                let mut first = None;
                for item in items {
                    let accepted = item.classify(codes)?;
                    first.get_or_insert(accepted);
                }
                first.ok_or_else(|| SendError::MalformedResponse(EMPTY_RESULT.to_string()))
            }
            BroadcastReply::Text(text) => Err(SendError::MalformedResponse(error_text(text))),
            BroadcastReply::Unexpected(value) => Err(SendError::MalformedResponse(format!(
                "unexpected broadcast result: {}",
                value
            ))),
        }
    }
}

fn check_code(reply: &TxReply, codes: &dyn CodeLookup) -> Result<(), SendError> {
    match reply.code_status() {
        CodeStatus::Clear => Ok(()),
        CodeStatus::Failed(code) => {
            let message = codes.message_for(code);
            log::warn!(
                "Node reported code {} ({}): {}",
                code,
                reply.codespace.as_deref().unwrap_or("sdk"),
                reply.raw_log.as_deref().unwrap_or(&message)
            );
            Err(SendError::ChainRejection {
                code,
                codespace: reply.codespace.clone(),
                raw_log: reply.raw_log.clone(),
                message,
            })
        }
        CodeStatus::Invalid(value) => Err(SendError::MalformedResponse(format!(
            "invalid result code: {}",
            value
        ))),
    }
}

/// Pull a readable message out of error text
///
/// Text of the form `<prefix>: <json>` (first `:` before the first `{`)
/// has its JSON `message` extracted; anything else is returned verbatim.
pub fn error_text(raw: &str) -> String {
    let (Some(colon), Some(brace)) = (raw.find(':'), raw.find('{')) else {
        return raw.to_string();
    };
    if colon > brace {
        return raw.to_string();
    }

    let fragment = raw[colon + 1..].trim();
    match serde_json::from_str::<Value>(fragment) {
        Ok(parsed) => parsed
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| raw.to_string()),
        Err(e) => format!("failed to parse error payload {:?}: {}", fragment, e),
    }
}

/// Message carried by a transport failure
pub fn transport_message(failure: &TransportError) -> String {
    match &failure.message {
        Some(message) => message.clone(),
        None => error_text(&failure.raw),
    }
}

/// Turn whatever the transport produced into an accepted hash or an error
pub fn normalize(
    reply: &Result<Value, TransportError>,
    codes: &dyn CodeLookup,
) -> Result<Accepted, SendError> {
    match reply {
        Err(failure) => Err(SendError::Transport(transport_message(failure))),
        Ok(value) => BroadcastReply::decode(value).classify(codes),
    }
}
