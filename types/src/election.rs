//! Election identifiers and the client-side view of an election.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::address::Address;

/// Election id assigned by the contract. Only ever learned from the
/// `newElection` event, never from a receipt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElectionId(pub u64);

impl fmt::Display for ElectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Zero-based candidate index within one election.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateId(pub u32);

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Election {
    pub id: ElectionId,
    pub label: String,
    pub owner: Address,
    /// Always at least 1.
    pub candidate_number: u32,
    pub voting_open: bool,
    /// Accepted ballots, licit or not.
    pub vote_count: u64,
}

impl Election {
    /// Candidate ids in decryption order.
    pub fn candidates(&self) -> impl Iterator<Item = CandidateId> {
        (0..self.candidate_number).map(CandidateId)
    }
}
