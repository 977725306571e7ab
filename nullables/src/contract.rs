//! In-memory model of the election contract's rules.
//!
//! This is a test double, not a reference for the real contract. It keeps
//! tallies in cleartext and applies the same per-bit counting the real
//! contract applies to encrypted grades.

use mjvs_client::{ContractCall, LogPayload};
use mjvs_types::event::{fields, names};
use mjvs_types::{
    Address, CandidateId, CandidateResult, CiphertextHandle, Election, ElectionId, EventValue,
    InputProof, GRADE_COUNT,
};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

pub const REJECT_ALREADY_VOTED: &str = "This address have already voted.";
pub const REJECT_VOTING_CLOSED: &str = "Voting is closed for this election.";

/// What applying a call did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CallOutcome {
    /// Mined successfully; the events are emitted in the transaction's block.
    Success(Vec<LogPayload>),
    /// Mined, but reverted on-chain.
    Failed(String),
    /// Refused before inclusion.
    Rejected(String),
}

#[derive(Clone, Debug)]
struct ElectionState {
    owner: Address,
    label: String,
    candidate_number: u32,
    voting_open: bool,
    voters: HashSet<Address>,
    vote_count: u64,
    tallies: Vec<[u64; GRADE_COUNT]>,
    results: Vec<[u64; GRADE_COUNT]>,
}

/// One deployed election contract.
#[derive(Clone, Debug)]
pub struct SimulatedContract {
    address: Address,
    elections: Vec<ElectionState>,
    pending_decryptions: VecDeque<(ElectionId, CandidateId)>,
}

impl SimulatedContract {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            elections: Vec::new(),
            pending_decryptions: VecDeque::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// The proof the encryption double produces for `signer` on this contract.
    pub fn expected_proof(contract: &Address, signer: &Address) -> InputProof {
        let mut bytes = Vec::with_capacity(40);
        bytes.extend_from_slice(contract.as_bytes());
        bytes.extend_from_slice(signer.as_bytes());
        InputProof(bytes)
    }

    pub fn apply(
        &mut self,
        signer: &Address,
        call: &ContractCall,
        ciphertexts: &HashMap<CiphertextHandle, u8>,
    ) -> CallOutcome {
        match call {
            ContractCall::CreateElection {
                candidate_number,
                label,
            } => self.create_election(signer, *candidate_number, label),
            ContractCall::SetVotingState { election_id, open } => {
                self.set_voting_state(signer, *election_id, *open)
            }
            ContractCall::Vote {
                election_id,
                handles,
                proof,
            } => self.vote(signer, *election_id, handles, proof, ciphertexts),
            ContractCall::RequestResult {
                election_id,
                candidate_id,
            } => self.request_result(*election_id, *candidate_id),
        }
    }

    fn create_election(&mut self, signer: &Address, candidate_number: u32, label: &str) -> CallOutcome {
        if candidate_number == 0 {
            return CallOutcome::Rejected("Candidate number must be positive.".into());
        }
        let id = self.elections.len() as u64;
        self.elections.push(ElectionState {
            owner: *signer,
            label: label.to_string(),
            candidate_number,
            voting_open: false,
            voters: HashSet::new(),
            vote_count: 0,
            tallies: vec![[0; GRADE_COUNT]; candidate_number as usize],
            results: vec![[0; GRADE_COUNT]; candidate_number as usize],
        });
        CallOutcome::Success(vec![event(
            names::NEW_ELECTION,
            [
                (fields::ELECTION_OWNER, EventValue::Address(*signer)),
                (fields::ELECTION_LABEL, EventValue::Text(label.to_string())),
                (fields::ELECTION_ID, EventValue::Uint(id)),
            ],
        )])
    }

    fn set_voting_state(&mut self, signer: &Address, id: ElectionId, open: bool) -> CallOutcome {
        let Some(election) = self.elections.get_mut(id.0 as usize) else {
            return CallOutcome::Failed(format!("no election {id}"));
        };
        if election.owner != *signer {
            return CallOutcome::Failed("only the election owner can change its voting state".into());
        }
        election.voting_open = open;
        CallOutcome::Success(vec![event(
            names::VOTING_STATE_CHANGED,
            [
                (fields::ELECTION_ID, EventValue::Uint(id.0)),
                (fields::VOTING_OPEN, EventValue::Bool(open)),
            ],
        )])
    }

    fn vote(
        &mut self,
        signer: &Address,
        id: ElectionId,
        handles: &[CiphertextHandle],
        proof: &InputProof,
        ciphertexts: &HashMap<CiphertextHandle, u8>,
    ) -> CallOutcome {
        let expected_proof = Self::expected_proof(&self.address, signer);
        let Some(election) = self.elections.get_mut(id.0 as usize) else {
            return CallOutcome::Rejected(format!("Election {id} does not exist."));
        };
        if !election.voting_open {
            return CallOutcome::Rejected(REJECT_VOTING_CLOSED.into());
        }
        if election.voters.contains(signer) {
            return CallOutcome::Rejected(REJECT_ALREADY_VOTED.into());
        }
        if handles.len() != election.candidate_number as usize {
            return CallOutcome::Rejected("One grade per candidate is required.".into());
        }
        if *proof != expected_proof {
            return CallOutcome::Rejected("Invalid input proof.".into());
        }
        let mut values = Vec::with_capacity(handles.len());
        for handle in handles {
            match ciphertexts.get(handle) {
                Some(v) => values.push(*v),
                None => return CallOutcome::Rejected("Unknown ciphertext handle.".into()),
            }
        }

        // Each set grade bit adds one to its bucket, whatever else is set.
        for (tally, value) in election.tallies.iter_mut().zip(values) {
            for (bit, bucket) in tally.iter_mut().enumerate() {
                if value & (1 << bit) != 0 {
                    *bucket += 1;
                }
            }
        }
        election.voters.insert(*signer);
        election.vote_count += 1;

        CallOutcome::Success(vec![event(
            names::VOTE_CAST,
            [
                (fields::ELECTION_ID, EventValue::Uint(id.0)),
                (fields::VOTER, EventValue::Address(*signer)),
            ],
        )])
    }

    fn request_result(&mut self, id: ElectionId, candidate: CandidateId) -> CallOutcome {
        let Some(election) = self.elections.get(id.0 as usize) else {
            return CallOutcome::Failed(format!("no election {id}"));
        };
        if candidate.0 >= election.candidate_number {
            return CallOutcome::Failed(format!("no candidate {candidate} in election {id}"));
        }
        self.pending_decryptions.push_back((id, candidate));
        CallOutcome::Success(Vec::new())
    }

    /// Oracle side: publish every pending tally and return the fulfilment events.
    pub fn fulfil_pending(&mut self) -> Vec<LogPayload> {
        let mut events = Vec::new();
        while let Some((id, candidate)) = self.pending_decryptions.pop_front() {
            let election = &mut self.elections[id.0 as usize];
            let idx = candidate.0 as usize;
            election.results[idx] = election.tallies[idx];
            events.push(event(
                names::VOTE_DECRYPTED,
                [
                    (fields::ELECTION_ID, EventValue::Uint(id.0)),
                    (fields::CANDIDATE_ID, EventValue::Uint(candidate.0 as u64)),
                ],
            ));
        }
        events
    }

    pub fn has_pending_decryptions(&self) -> bool {
        !self.pending_decryptions.is_empty()
    }

    pub fn election(&self, id: ElectionId) -> Option<Election> {
        self.elections.get(id.0 as usize).map(|e| Election {
            id,
            label: e.label.clone(),
            owner: e.owner,
            candidate_number: e.candidate_number,
            voting_open: e.voting_open,
            vote_count: e.vote_count,
        })
    }

    pub fn result(&self, id: ElectionId, candidate: CandidateId) -> Option<CandidateResult> {
        self.elections
            .get(id.0 as usize)?
            .results
            .get(candidate.0 as usize)
            .map(|counts| CandidateResult::new(*counts))
    }

    /// Overwrite a published result, bypassing the tally. Used to model a
    /// defective decryption.
    pub fn set_result(&mut self, id: ElectionId, candidate: CandidateId, counts: [u64; GRADE_COUNT]) {
        if let Some(slot) = self
            .elections
            .get_mut(id.0 as usize)
            .and_then(|e| e.results.get_mut(candidate.0 as usize))
        {
            *slot = counts;
        }
    }
}

fn event<const N: usize>(name: &str, values: [(&str, EventValue); N]) -> LogPayload {
    LogPayload {
        name: name.to_string(),
        fields: values
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect::<BTreeMap<_, _>>(),
    }
}
