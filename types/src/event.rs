//! Raw and decoded ledger logs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::address::Address;
use crate::receipt::BlockNumber;

/// Event names emitted by the election contract.
pub mod names {
    pub const NEW_ELECTION: &str = "newElection";
    pub const VOTING_STATE_CHANGED: &str = "votingStateChanged";
    pub const VOTE_CAST: &str = "voteCast";
    pub const VOTE_DECRYPTED: &str = "voteDecrypted";
}

/// Field names used by the election contract's events.
pub mod fields {
    pub const ELECTION_OWNER: &str = "electionOwner";
    pub const ELECTION_LABEL: &str = "electionLabel";
    pub const ELECTION_ID: &str = "electionId";
    pub const CANDIDATE_ID: &str = "candidateId";
    pub const VOTING_OPEN: &str = "votingOpen";
    pub const VOTER: &str = "voter";
}

/// A log as fetched from the ledger, before decoding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLog {
    pub address: Address,
    pub block_number: BlockNumber,
    /// Position of the log within its block.
    pub log_index: u32,
    pub payload: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventValue {
    Uint(u64),
    Bool(bool),
    Text(String),
    Address(Address),
}

/// A decoded event: its name plus named fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub name: String,
    pub block_number: BlockNumber,
    pub log_index: u32,
    #[serde(default)]
    pub fields: BTreeMap<String, EventValue>,
}

impl EventRecord {
    pub fn new(name: impl Into<String>, block_number: BlockNumber, log_index: u32) -> Self {
        Self {
            name: name.into(),
            block_number,
            log_index,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: &str, value: EventValue) -> Self {
        self.fields.insert(name.to_string(), value);
        self
    }

    pub fn uint(&self, field: &str) -> Option<u64> {
        match self.fields.get(field) {
            Some(EventValue::Uint(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn boolean(&self, field: &str) -> Option<bool> {
        match self.fields.get(field) {
            Some(EventValue::Bool(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        match self.fields.get(field) {
            Some(EventValue::Text(v)) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn address(&self, field: &str) -> Option<Address> {
        match self.fields.get(field) {
            Some(EventValue::Address(v)) => Some(*v),
            _ => None,
        }
    }
}
