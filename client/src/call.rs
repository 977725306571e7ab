//! State-changing contract calls and the shapes that travel with them.

use mjvs_types::{
    CandidateId, CiphertextHandle, ElectionId, EventRecord, EventValue, InputProof, RawLog,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A state-changing call on the election contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "camelCase")]
pub enum ContractCall {
    CreateElection {
        candidate_number: u32,
        label: String,
    },
    SetVotingState {
        election_id: ElectionId,
        open: bool,
    },
    Vote {
        election_id: ElectionId,
        handles: Vec<CiphertextHandle>,
        proof: InputProof,
    },
    RequestResult {
        election_id: ElectionId,
        candidate_id: CandidateId,
    },
}

impl ContractCall {
    /// Short name used in logs and error messages.
    pub fn method(&self) -> &'static str {
        match self {
            ContractCall::CreateElection { .. } => "createElection",
            ContractCall::SetVotingState { .. } => "setVotingState",
            ContractCall::Vote { .. } => "vote",
            ContractCall::RequestResult { .. } => "requestResult",
        }
    }
}

/// Output of the encryption collaborator: one handle per cleartext value
/// and a proof binding them to the contract and signer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedInput {
    pub handles: Vec<CiphertextHandle>,
    pub proof: InputProof,
}

/// JSON body carried in a [`RawLog`] payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogPayload {
    pub name: String,
    #[serde(default)]
    pub fields: BTreeMap<String, EventValue>,
}

impl LogPayload {
    pub fn to_bytes(&self) -> Vec<u8> {
        // A map of plain enums always serializes.
        serde_json::to_vec(self).unwrap_or_default()
    }

    /// Decode a raw log into an [`EventRecord`]. Returns `None` for payloads
    /// that are not election contract events.
    pub fn decode(log: &RawLog) -> Option<EventRecord> {
        let payload: LogPayload = serde_json::from_slice(&log.payload).ok()?;
        Some(EventRecord {
            name: payload.name,
            block_number: log.block_number,
            log_index: log.log_index,
            fields: payload.fields,
        })
    }
}
