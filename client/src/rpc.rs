//! JSON-RPC client for an MJVS ledger gateway.
//!
//! Every request is a `POST` of a JSON object carrying an `action` field plus
//! the action's parameters. The gateway answers with `{"result": …}` on
//! success or `{"error": "…"}` on failure; contract reverts additionally set
//! `"rejected": true` so they can be told apart from transport problems.

use mjvs_types::{
    Address, BlockNumber, CandidateId, CandidateResult, Election, ElectionId, RawLog, TxReceipt,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use crate::call::{ContractCall, EncryptedInput, LogPayload};
use crate::error::ClientError;
use crate::traits::{DecryptionOracle, ElectionContract, EncryptionSdk, Ledger};

/// Default timeout for ordinary gateway requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for the long-poll `await_decryption_oracle` action.
const DEFAULT_ORACLE_TIMEOUT: Duration = Duration::from_secs(300);

/// HTTP client for a ledger gateway.
///
/// Wraps `reqwest::Client` with the gateway URL and provides typed methods
/// for each action the orchestrator needs.
#[derive(Clone)]
pub struct RpcClient {
    http: reqwest::Client,
    gateway_url: String,
    oracle_timeout: Duration,
}

impl RpcClient {
    /// Create a client targeting the given gateway URL (e.g. `http://127.0.0.1:8545`).
    pub fn new(gateway_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .map_err(|e| ClientError::Transport(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            gateway_url: gateway_url.into(),
            oracle_timeout: DEFAULT_ORACLE_TIMEOUT,
        })
    }

    /// Override how long a single `await_decryption_oracle` request may block.
    pub fn with_oracle_timeout(mut self, timeout: Duration) -> Self {
        self.oracle_timeout = timeout;
        self
    }

    pub fn gateway_url(&self) -> &str {
        &self.gateway_url
    }

    async fn rpc_call(
        &self,
        action: &str,
        params: serde_json::Value,
        timeout: Duration,
    ) -> Result<serde_json::Value, ClientError> {
        let mut body = params;
        body.as_object_mut()
            .ok_or_else(|| ClientError::InvalidResponse("params must be a JSON object".into()))?
            .insert("action".to_string(), serde_json::json!(action));

        tracing::trace!(action, "gateway request");

        let response = self
            .http
            .post(&self.gateway_url)
            .timeout(timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ClientError::Transport(format!("{action}: request timed out: {e}"))
                } else if e.is_connect() {
                    ClientError::Transport(format!("{action}: connection failed: {e}"))
                } else {
                    ClientError::Transport(format!("{action}: {e}"))
                }
            })?;

        if !response.status().is_success() {
            return Err(ClientError::Transport(format!(
                "{action}: gateway returned HTTP {}",
                response.status()
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ClientError::InvalidResponse(format!("{action}: invalid JSON: {e}")))?;

        unwrap_envelope(json)
    }

    async fn typed_call<T: DeserializeOwned>(
        &self,
        action: &str,
        params: serde_json::Value,
    ) -> Result<T, ClientError> {
        let result = self.rpc_call(action, params, DEFAULT_TIMEOUT).await?;
        serde_json::from_value(result)
            .map_err(|e| ClientError::InvalidResponse(format!("{action}: {e}")))
    }
}

/// Split a gateway envelope into its `result` or a typed error.
fn unwrap_envelope(json: serde_json::Value) -> Result<serde_json::Value, ClientError> {
    if let Some(err) = json.get("error").and_then(|e| e.as_str()) {
        let rejected = json
            .get("rejected")
            .and_then(|r| r.as_bool())
            .unwrap_or(false);
        let not_found = json
            .get("not_found")
            .and_then(|r| r.as_bool())
            .unwrap_or(false);
        return Err(if rejected {
            ClientError::Rejected(err.to_string())
        } else if not_found {
            ClientError::NotFound(err.to_string())
        } else {
            ClientError::Transport(format!("gateway error: {err}"))
        });
    }
    Ok(json.get("result").cloned().unwrap_or(json))
}

/// Response from the `deploy` action.
#[derive(Debug, Clone, Deserialize)]
struct DeployResult {
    contract_address: Address,
    receipt: TxReceipt,
}

#[derive(Debug, Clone, Deserialize)]
struct AccountsResult {
    accounts: Vec<Address>,
}

#[derive(Debug, Clone, Deserialize)]
struct BlockNumberResult {
    block_number: BlockNumber,
}

#[derive(Debug, Clone, Deserialize)]
struct CandidateNumberResult {
    candidate_number: u32,
}

/// A log as the gateway reports it: position plus the already-parsed event body.
#[derive(Debug, Clone, Deserialize)]
struct WireLog {
    address: Address,
    block_number: BlockNumber,
    log_index: u32,
    event: LogPayload,
}

#[derive(Debug, Clone, Deserialize)]
struct LogsResult {
    #[serde(default)]
    logs: Vec<WireLog>,
}

impl From<WireLog> for RawLog {
    fn from(w: WireLog) -> Self {
        RawLog {
            address: w.address,
            block_number: w.block_number,
            log_index: w.log_index,
            payload: w.event.to_bytes(),
        }
    }
}

impl Ledger for RpcClient {
    async fn deploy(&self, signer: &Address) -> Result<(Address, TxReceipt), ClientError> {
        let resp: DeployResult = self
            .typed_call("deploy", serde_json::json!({ "signer": signer }))
            .await?;
        Ok((resp.contract_address, resp.receipt))
    }

    async fn accounts(&self) -> Result<Vec<Address>, ClientError> {
        let resp: AccountsResult = self.typed_call("accounts", serde_json::json!({})).await?;
        Ok(resp.accounts)
    }

    async fn send_transaction(
        &self,
        signer: &Address,
        contract: &Address,
        call: &ContractCall,
    ) -> Result<TxReceipt, ClientError> {
        self.typed_call(
            "send_transaction",
            serde_json::json!({ "signer": signer, "contract": contract, "call": call }),
        )
        .await
    }

    async fn block_number(&self) -> Result<BlockNumber, ClientError> {
        let resp: BlockNumberResult = self
            .typed_call("block_number", serde_json::json!({}))
            .await?;
        Ok(resp.block_number)
    }

    async fn get_logs(
        &self,
        contract: &Address,
        from: BlockNumber,
        to: BlockNumber,
    ) -> Result<Vec<RawLog>, ClientError> {
        let resp: LogsResult = self
            .typed_call(
                "get_logs",
                serde_json::json!({ "contract": contract, "from_block": from, "to_block": to }),
            )
            .await?;
        Ok(resp.logs.into_iter().map(RawLog::from).collect())
    }
}

impl ElectionContract for RpcClient {
    async fn election(&self, contract: &Address, id: ElectionId) -> Result<Election, ClientError> {
        self.typed_call(
            "election",
            serde_json::json!({ "contract": contract, "election_id": id }),
        )
        .await
    }

    async fn candidate_number(
        &self,
        contract: &Address,
        id: ElectionId,
    ) -> Result<u32, ClientError> {
        let resp: CandidateNumberResult = self
            .typed_call(
                "candidate_number",
                serde_json::json!({ "contract": contract, "election_id": id }),
            )
            .await?;
        Ok(resp.candidate_number)
    }

    async fn candidate_result(
        &self,
        contract: &Address,
        id: ElectionId,
        candidate: CandidateId,
    ) -> Result<CandidateResult, ClientError> {
        self.typed_call(
            "candidate_result",
            serde_json::json!({
                "contract": contract,
                "election_id": id,
                "candidate_id": candidate,
            }),
        )
        .await
    }
}

impl EncryptionSdk for RpcClient {
    async fn encrypt_grades(
        &self,
        contract: &Address,
        signer: &Address,
        grades: &[u8],
    ) -> Result<EncryptedInput, ClientError> {
        self.typed_call(
            "encrypt_input",
            serde_json::json!({ "contract": contract, "signer": signer, "values": grades }),
        )
        .await
    }
}

impl DecryptionOracle for RpcClient {
    async fn await_decryption(&self) -> Result<(), ClientError> {
        self.rpc_call(
            "await_decryption_oracle",
            serde_json::json!({}),
            self.oracle_timeout,
        )
        .await
        .map(|_| ())
    }
}
