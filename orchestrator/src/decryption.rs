//! Sequential per-candidate decryption.
//!
//! Each candidate walks `Idle -> RequestSent -> AwaitingOracle -> Fulfilled`
//! before the next one starts. The oracle and the event index correlate on
//! (election, candidate) only, so at most one request is ever outstanding.

use mjvs_client::{ContractCall, DecryptionOracle, ElectionContract, Ledger};
use mjvs_types::event::{fields, names};
use mjvs_types::{CandidateId, ElectionId};
use std::fmt;

use crate::cancel::CancellationToken;
use crate::config::OrchestratorConfig;
use crate::correlator::EventCorrelator;
use crate::error::OrchestratorError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecryptionPhase {
    Idle,
    RequestSent,
    AwaitingOracle,
    Fulfilled,
}

impl fmt::Display for DecryptionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DecryptionPhase::Idle => "idle",
            DecryptionPhase::RequestSent => "request-sent",
            DecryptionPhase::AwaitingOracle => "awaiting-oracle",
            DecryptionPhase::Fulfilled => "fulfilled",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecryptionStatus {
    Pending,
    Fulfilled,
    TimedOut,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecryptionRequest {
    pub election: ElectionId,
    pub candidate: CandidateId,
    pub status: DecryptionStatus,
    pub phase: DecryptionPhase,
}

impl DecryptionRequest {
    fn new(election: ElectionId, candidate: CandidateId) -> Self {
        Self {
            election,
            candidate,
            status: DecryptionStatus::Pending,
            phase: DecryptionPhase::Idle,
        }
    }

    fn advance(&mut self, phase: DecryptionPhase) {
        tracing::debug!(
            election = %self.election,
            candidate = %self.candidate,
            from = %self.phase,
            to = %phase,
            "decryption phase"
        );
        self.phase = phase;
        if phase == DecryptionPhase::Fulfilled {
            self.status = DecryptionStatus::Fulfilled;
        }
    }
}

pub struct DecryptionOrchestrator<'a, L, C, O> {
    ledger: &'a L,
    contract: &'a C,
    oracle: &'a O,
    config: &'a OrchestratorConfig,
}

impl<'a, L, C, O> DecryptionOrchestrator<'a, L, C, O>
where
    L: Ledger,
    C: ElectionContract,
    O: DecryptionOracle,
{
    pub fn new(ledger: &'a L, contract: &'a C, oracle: &'a O, config: &'a OrchestratorConfig) -> Self {
        Self {
            ledger,
            contract,
            oracle,
            config,
        }
    }

    /// Decrypt every candidate of `election`, in candidate order.
    ///
    /// Any failure aborts the whole workflow; requests already fulfilled
    /// stay published but are not returned.
    pub async fn decrypt_election(
        &self,
        election: ElectionId,
        cancel: &CancellationToken,
    ) -> Result<Vec<DecryptionRequest>, OrchestratorError> {
        let candidates = self
            .contract
            .candidate_number(&self.config.contract, election)
            .await?;
        tracing::info!(%election, candidates, "decryption workflow started");

        let mut fulfilled = Vec::with_capacity(candidates as usize);
        for candidate in (0..candidates).map(CandidateId) {
            let mut request = DecryptionRequest::new(election, candidate);
            self.run(&mut request, cancel).await?;
            fulfilled.push(request);
        }

        tracing::info!(%election, "decryption workflow complete");
        Ok(fulfilled)
    }

    async fn run(
        &self,
        request: &mut DecryptionRequest,
        cancel: &CancellationToken,
    ) -> Result<(), OrchestratorError> {
        let call = ContractCall::RequestResult {
            election_id: request.election,
            candidate_id: request.candidate,
        };
        let receipt = self
            .ledger
            .send_transaction(&self.config.signer, &self.config.contract, &call)
            .await?;
        request.advance(DecryptionPhase::RequestSent);
        if !receipt.succeeded() {
            return Err(OrchestratorError::TransactionFailed {
                operation: call.method(),
                tx_hash: receipt.tx_hash,
            });
        }

        let correlator = EventCorrelator::new(
            self.ledger,
            self.config.contract,
            self.config.timeouts.poll_interval,
        );
        let (election, candidate) = (request.election.0, request.candidate.0 as u64);
        let token = correlator.register_after(
            receipt.block_number,
            names::VOTE_DECRYPTED,
            move |e| {
                e.uint(fields::ELECTION_ID) == Some(election)
                    && e.uint(fields::CANDIDATE_ID) == Some(candidate)
            },
            self.config.timeouts.decryption,
        );
        request.advance(DecryptionPhase::AwaitingOracle);

        let oracle_timeout = self.config.timeouts.oracle;
        tokio::select! {
            done = tokio::time::timeout(oracle_timeout, self.oracle.await_decryption()) => match done {
                Ok(result) => result?,
                Err(_) => {
                    tracing::warn!(
                        election = %request.election,
                        candidate = %request.candidate,
                        waited = ?oracle_timeout,
                        "oracle did not complete"
                    );
                    return Err(OrchestratorError::OracleTimeout { waited: oracle_timeout });
                }
            },
            _ = cancel.cancelled() => return Err(OrchestratorError::Cancelled),
        }

        match correlator.wait(token, cancel).await {
            Ok(_) => {
                request.advance(DecryptionPhase::Fulfilled);
                tracing::info!(election = %request.election, candidate = %request.candidate, "candidate decrypted");
                Ok(())
            }
            Err(e) => {
                if matches!(e, OrchestratorError::EventTimeout { .. }) {
                    request.status = DecryptionStatus::TimedOut;
                    tracing::warn!(
                        election = %request.election,
                        candidate = %request.candidate,
                        "decryption request timed out"
                    );
                }
                Err(e)
            }
        }
    }
}
