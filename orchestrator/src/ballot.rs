//! Ballot submission.

use mjvs_client::{ContractCall, ElectionContract, EncryptionSdk, Ledger};
use mjvs_types::{Address, Ballot, ElectionId, TxReceipt};

use crate::config::OrchestratorConfig;
use crate::error::OrchestratorError;

pub struct BallotSubmitter<'a, L, C, E> {
    ledger: &'a L,
    contract: &'a C,
    sdk: &'a E,
    config: &'a OrchestratorConfig,
}

impl<'a, L, C, E> BallotSubmitter<'a, L, C, E>
where
    L: Ledger,
    C: ElectionContract,
    E: EncryptionSdk,
{
    pub fn new(ledger: &'a L, contract: &'a C, sdk: &'a E, config: &'a OrchestratorConfig) -> Self {
        Self {
            ledger,
            contract,
            sdk,
            config,
        }
    }

    /// Submit every per-candidate grade of `ballot` in one transaction,
    /// signed by the ballot's voter.
    ///
    /// Ciphertext content is never inspected; a ballot carrying malformed
    /// grades is submitted like any other.
    pub async fn submit_ballot(&self, ballot: &Ballot) -> Result<TxReceipt, OrchestratorError> {
        let expected = self
            .contract
            .candidate_number(&self.config.contract, ballot.election_id)
            .await?;
        if ballot.ciphertexts.len() != expected as usize {
            return Err(OrchestratorError::CandidateCountMismatch {
                election: ballot.election_id,
                expected,
                actual: ballot.ciphertexts.len(),
            });
        }

        let call = ContractCall::Vote {
            election_id: ballot.election_id,
            handles: ballot.ciphertexts.clone(),
            proof: ballot.proof.clone(),
        };
        let receipt = self
            .ledger
            .send_transaction(&ballot.voter, &self.config.contract, &call)
            .await?;
        if !receipt.succeeded() {
            return Err(OrchestratorError::TransactionFailed {
                operation: call.method(),
                tx_hash: receipt.tx_hash,
            });
        }

        tracing::info!(
            election = %ballot.election_id,
            voter = %ballot.voter,
            tx = %receipt.tx_hash,
            "ballot accepted"
        );
        Ok(receipt)
    }

    /// Encrypt cleartext grade values for `voter` and submit them.
    pub async fn cast_ballot(
        &self,
        election: ElectionId,
        voter: Address,
        grades: &[u8],
    ) -> Result<TxReceipt, OrchestratorError> {
        let input = self
            .sdk
            .encrypt_grades(&self.config.contract, &voter, grades)
            .await?;
        tracing::debug!(%election, %voter, handles = input.handles.len(), "grades encrypted");

        let ballot = Ballot {
            election_id: election,
            voter,
            ciphertexts: input.handles,
            proof: input.proof,
        };
        self.submit_ballot(&ballot).await
    }
}
