/// REST (LCD) client for a Cosmos node: broadcast transport, account
/// lookup and transaction lookup
use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value};
use std::time::Duration;

use crate::chain::traits::{AccountLookup, Transport, TxQuery};
use crate::chain::types::AccountMeta;
use crate::error::TransportError;

/// Wrapper keys under which account implementations nest their base account
const ACCOUNT_WRAPPERS: &[&str] = &[
    "result",
    "account",
    "value",
    "base_account",
    "BaseAccount",
    "base_vesting_account",
    "BaseVestingAccount",
];

#[derive(Clone)]
pub struct LcdClient {
    client: Client,
    base_url: String,
}

impl LcdClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Join a path onto the base URL
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl Transport for LcdClient {
    async fn post_json(&self, url: &str, body: &Value) -> std::result::Result<Value, TransportError> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| TransportError::raw(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| TransportError::raw(format!("failed to read response body: {}", e)))?;

        match serde_json::from_str::<Value>(&text) {
            Ok(value) => {
                if !status.is_success() {
                    log::debug!("Node answered HTTP {} with a JSON body", status);
                }
                Ok(value)
            }
            Err(_) => {
                let text = text.trim();
                if text.is_empty() {
                    Err(TransportError::raw(format!("HTTP {}", status)))
                } else {
                    Err(TransportError::raw(text))
                }
            }
        }
    }
}

#[async_trait]
impl AccountLookup for LcdClient {
    async fn account(&self, address: &str) -> Result<AccountMeta> {
        let url = self.url(&format!("/auth/accounts/{}", address));
        log::debug!("Fetching account from {}", url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            bail!("account {} not found (HTTP {})", address, response.status());
        }

        let body: Value = response.json().await?;
        let account = parse_account(&body).map_err(|e| anyhow!("account {}: {}", address, e))?;

        log::info!(
            "Account {}: account_number={}, sequence={}",
            address,
            account.account_number,
            account.sequence
        );
        Ok(account)
    }
}

#[async_trait]
impl TxQuery for LcdClient {
    async fn tx(&self, hash: &str) -> Result<Value> {
        let url = self.url(&format!("/txs/{}", hash));

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            bail!("transaction {} not found (HTTP {})", hash, response.status());
        }

        Ok(response.json().await?)
    }
}

/// Extract account number and sequence from an account query reply
///
/// Handles the legacy `{result: {type, value: {...}}}` shape, the
/// `{account: {...}}` shape, and account types that nest the base account
/// (vesting accounts, eth accounts).
pub fn parse_account(body: &Value) -> Result<AccountMeta> {
    let base = find_base_account(body, 0).ok_or_else(|| anyhow!("no account in response"))?;

    // Unknown addresses come back as an empty base account
    if let Some(address) = base.get("address").and_then(Value::as_str) {
        if address.is_empty() {
            bail!("account does not exist");
        }
    }

    let account_number = base
        .get("account_number")
        .and_then(as_u64)
        .ok_or_else(|| anyhow!("missing account_number"))?;
    let sequence = match base.get("sequence") {
        None | Some(Value::Null) => 0,
        Some(value) => as_u64(value).ok_or_else(|| anyhow!("invalid sequence: {}", value))?,
    };

    Ok(AccountMeta {
        account_number,
        sequence,
    })
}

fn find_base_account(value: &Value, depth: usize) -> Option<&Map<String, Value>> {
    let object = value.as_object()?;
    if object.contains_key("account_number") {
        return Some(object);
    }
    if depth >= 4 {
        return None;
    }

    ACCOUNT_WRAPPERS
        .iter()
        .filter_map(|key| object.get(*key))
        .find_map(|inner| find_base_account(inner, depth + 1))
}

/// Numbers arrive either as JSON numbers or as decimal strings
fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_legacy_account() {
        let body = json!({
            "height": "123",
            "result": {
                "type": "cosmos-sdk/BaseAccount",
                "value": {
                    "address": "cosmos1abc",
                    "public_key": null,
                    "account_number": "17",
                    "sequence": "4"
                }
            }
        });
        let account = parse_account(&body).unwrap();
        assert_eq!(account.account_number, 17);
        assert_eq!(account.sequence, 4);
    }

    #[test]
    fn test_parse_grpc_gateway_account() {
        let body = json!({
            "account": {
                "@type": "/cosmos.auth.v1beta1.BaseAccount",
                "address": "cosmos1abc",
                "account_number": 8,
                "sequence": 0
            }
        });
        let account = parse_account(&body).unwrap();
        assert_eq!(account.account_number, 8);
        assert_eq!(account.sequence, 0);
    }

    #[test]
    fn test_parse_nested_vesting_account() {
        let body = json!({
            "result": {
                "type": "cosmos-sdk/DelayedVestingAccount",
                "value": {
                    "BaseVestingAccount": {
                        "BaseAccount": {
                            "address": "cosmos1vest",
                            "account_number": "99",
                            "sequence": "12"
                        }
                    }
                }
            }
        });
        let account = parse_account(&body).unwrap();
        assert_eq!(account.account_number, 99);
        assert_eq!(account.sequence, 12);
    }

    #[test]
    fn test_parse_eth_account() {
        let body = json!({
            "account": {
                "@type": "/injective.types.v1beta1.EthAccount",
                "base_account": {
                    "address": "inj1abc",
                    "account_number": "3",
                    "sequence": "7"
                },
                "code_hash": "xyz"
            }
        });
        let account = parse_account(&body).unwrap();
        assert_eq!(account.account_number, 3);
        assert_eq!(account.sequence, 7);
    }

    #[test]
    fn test_unknown_account_is_error() {
        let body = json!({
            "result": {
                "type": "cosmos-sdk/BaseAccount",
                "value": {"address": "", "public_key": null, "account_number": "0", "sequence": "0"}
            }
        });
        assert!(parse_account(&body).is_err());
        assert!(parse_account(&json!({"error": "not found"})).is_err());
    }

    #[test]
    fn test_url_join() {
        let client = LcdClient::new("http://localhost:1317/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.url("/txs"), "http://localhost:1317/txs");
        assert_eq!(client.base_url(), "http://localhost:1317/");
    }
}
