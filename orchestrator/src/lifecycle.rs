//! Election creation and voting-state control.

use mjvs_client::{ClientError, ContractCall, ElectionContract, Ledger};
use mjvs_types::event::{fields, names};
use mjvs_types::{Election, ElectionId, TxReceipt};

use crate::cancel::CancellationToken;
use crate::config::OrchestratorConfig;
use crate::correlator::EventCorrelator;
use crate::error::OrchestratorError;

pub struct ElectionLifecycleManager<'a, L, C> {
    ledger: &'a L,
    contract: &'a C,
    config: &'a OrchestratorConfig,
}

impl<'a, L: Ledger, C: ElectionContract> ElectionLifecycleManager<'a, L, C> {
    pub fn new(ledger: &'a L, contract: &'a C, config: &'a OrchestratorConfig) -> Self {
        Self {
            ledger,
            contract,
            config,
        }
    }

    fn correlator(&self) -> EventCorrelator<'a, L> {
        EventCorrelator::new(
            self.ledger,
            self.config.contract,
            self.config.timeouts.poll_interval,
        )
    }

    /// Create an election owned by the configured signer.
    ///
    /// The id is assigned by the contract and only learned from the
    /// `newElection` event, so the wait for it is registered before the
    /// transaction goes out.
    pub async fn create_election(
        &self,
        candidate_number: u32,
        label: &str,
        cancel: &CancellationToken,
    ) -> Result<Election, OrchestratorError> {
        if candidate_number == 0 {
            return Err(OrchestratorError::InvalidCandidateNumber);
        }
        let owner = self.config.signer;
        let correlator = self.correlator();

        let wanted_label = label.to_string();
        let token = correlator
            .register(
                names::NEW_ELECTION,
                move |e| {
                    e.address(fields::ELECTION_OWNER) == Some(owner)
                        && e.text(fields::ELECTION_LABEL) == Some(wanted_label.as_str())
                        && e.uint(fields::ELECTION_ID).is_some()
                },
                self.config.timeouts.creation,
            )
            .await?;

        let call = ContractCall::CreateElection {
            candidate_number,
            label: label.to_string(),
        };
        let receipt = self.submit(&call).await?;
        tracing::info!(tx = %receipt.tx_hash, block = receipt.block_number, label, "election creation mined");

        let event = correlator.wait(token, cancel).await?;
        let id = event
            .uint(fields::ELECTION_ID)
            .map(ElectionId)
            .ok_or_else(|| ClientError::Decode("newElection event without electionId".into()))?;

        tracing::info!(election = %id, label, candidate_number, "election created");
        Ok(Election {
            id,
            label: label.to_string(),
            owner,
            candidate_number,
            voting_open: false,
            vote_count: 0,
        })
    }

    /// Open or close voting. Only the election owner may do this; the
    /// contract enforces it and a refusal comes back as a failed receipt.
    pub async fn set_voting_state(
        &self,
        election: ElectionId,
        open: bool,
        cancel: &CancellationToken,
    ) -> Result<TxReceipt, OrchestratorError> {
        let correlator = self.correlator();
        let token = correlator
            .register(
                names::VOTING_STATE_CHANGED,
                move |e| {
                    e.uint(fields::ELECTION_ID) == Some(election.0)
                        && e.boolean(fields::VOTING_OPEN) == Some(open)
                },
                self.config.timeouts.creation,
            )
            .await?;

        let receipt = self
            .submit(&ContractCall::SetVotingState {
                election_id: election,
                open,
            })
            .await?;
        correlator.wait(token, cancel).await?;

        tracing::info!(%election, open, "voting state changed");
        Ok(receipt)
    }

    /// Current contract view of an election.
    pub async fn election(&self, id: ElectionId) -> Result<Election, OrchestratorError> {
        Ok(self.contract.election(&self.config.contract, id).await?)
    }

    async fn submit(&self, call: &ContractCall) -> Result<TxReceipt, OrchestratorError> {
        let receipt = self
            .ledger
            .send_transaction(&self.config.signer, &self.config.contract, call)
            .await?;
        if !receipt.succeeded() {
            tracing::warn!(method = call.method(), tx = %receipt.tx_hash, "transaction failed");
            return Err(OrchestratorError::TransactionFailed {
                operation: call.method(),
                tx_hash: receipt.tx_hash,
            });
        }
        Ok(receipt)
    }
}
