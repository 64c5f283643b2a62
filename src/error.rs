/// Error taxonomy for the send/confirm lifecycle
use thiserror::Error;

/// Failure raised by a transport before any JSON body was available
///
/// `message` is set when the failing layer already produced a readable
/// message; otherwise only `raw` is available and the response normalizer
/// has to dig the message out of it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{raw}")]
pub struct TransportError {
    pub message: Option<String>,
    pub raw: String,
}

impl TransportError {
    /// Error whose text still needs to be interpreted
    pub fn raw(raw: impl Into<String>) -> Self {
        Self {
            message: None,
            raw: raw.into(),
        }
    }

    /// Error that already carries a readable message
    pub fn with_message(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            raw: message.clone(),
            message: Some(message),
        }
    }
}

/// Errors surfaced by `TxSender::send` and `SendHandle::check_inclusion`
#[derive(Debug, Error)]
pub enum SendError {
    /// Network or HTTP failure before a JSON reply was available
    #[error("Error sending: {0}")]
    Transport(String),

    /// JSON reply that is neither a valid result array nor an object with a hash
    #[error("Error sending: {0}")]
    MalformedResponse(String),

    /// Well-formed reply whose `code` reports a failed execution
    #[error("Error sending: {message}")]
    ChainRejection {
        code: u32,
        codespace: Option<String>,
        raw_log: Option<String>,
        message: String,
    },

    /// Propagated unchanged from the signer
    #[error(transparent)]
    Signing(anyhow::Error),

    /// Account lookup failed, nothing was signed
    #[error("account lookup failed: {0}")]
    AccountLookup(anyhow::Error),

    #[error("invalid transaction request: {0}")]
    InvalidRequest(String),

    #[error("failed to encode transaction: {0}")]
    Encoding(#[from] serde_json::Error),

    /// The poller ran out of attempts without seeing the transaction
    #[error("transaction {hash} was not included after {attempts} attempts")]
    InclusionTimeout { hash: String, attempts: u32 },

    /// The poll was stopped through its abort channel
    #[error("waiting for transaction {hash} was aborted after {attempts} attempts")]
    InclusionAborted { hash: String, attempts: u32 },
}

impl SendError {
    /// True when the node accepted the envelope but the execution failed
    pub fn is_chain_rejection(&self) -> bool {
        matches!(self, SendError::ChainRejection { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_rejection_display() {
        let err = SendError::ChainRejection {
            code: 4,
            codespace: Some("sdk".to_string()),
            raw_log: None,
            message: "insufficient funds".to_string(),
        };
        assert_eq!(err.to_string(), "Error sending: insufficient funds");
        assert!(err.is_chain_rejection());
    }

    #[test]
    fn test_signing_error_is_transparent() {
        let err = SendError::Signing(anyhow::anyhow!("ledger locked"));
        assert_eq!(err.to_string(), "ledger locked");
    }

    #[test]
    fn test_transport_error_constructors() {
        let raw = TransportError::raw("connection refused");
        assert_eq!(raw.message, None);
        assert_eq!(raw.to_string(), "connection refused");

        let with_message = TransportError::with_message("bad gateway");
        assert_eq!(with_message.message.as_deref(), Some("bad gateway"));
    }
}
