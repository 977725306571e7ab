//! Encrypted ballots.
//!
//! Ciphertext handles and proofs are produced by the encryption collaborator
//! and are opaque here; nothing in the workspace inspects their content.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::address::Address;
use crate::election::ElectionId;

/// Opaque 32-byte handle to one encrypted grade.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CiphertextHandle(pub [u8; 32]);

impl CiphertextHandle {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for CiphertextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CiphertextHandle({})", hex::encode(&self.0[..4]))
    }
}

/// Validity proof bound to a set of handles, a contract and a signer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputProof(pub Vec<u8>);

/// One voter's complete set of per-candidate grades for one election.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ballot {
    pub election_id: ElectionId,
    pub voter: Address,
    /// One handle per candidate, in candidate order.
    pub ciphertexts: Vec<CiphertextHandle>,
    pub proof: InputProof,
}
