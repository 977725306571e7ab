//! The top-level facade the command surface drives.

use mjvs_client::{DecryptionOracle, ElectionContract, EncryptionSdk, Ledger};
use mjvs_types::{Address, Election, ElectionId, TxReceipt};

use crate::aggregate::{ElectionResults, ResultAggregator};
use crate::ballot::BallotSubmitter;
use crate::cancel::CancellationToken;
use crate::config::OrchestratorConfig;
use crate::decryption::{DecryptionOrchestrator, DecryptionRequest};
use crate::error::OrchestratorError;
use crate::lifecycle::ElectionLifecycleManager;
use crate::voters::{GradeGenerator, IdentityPool};

/// A ballot cast on behalf of a pool identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CastBallot {
    pub voter: Address,
    /// Cleartext grade values, one per candidate.
    pub grades: Vec<u8>,
    pub receipt: TxReceipt,
}

pub struct ElectionOrchestrator<L, C, E, O> {
    config: OrchestratorConfig,
    ledger: L,
    contract: C,
    sdk: E,
    oracle: O,
    identities: IdentityPool,
    grades: GradeGenerator,
}

impl<L, C, E, O> ElectionOrchestrator<L, C, E, O>
where
    L: Ledger,
    C: ElectionContract,
    E: EncryptionSdk,
    O: DecryptionOracle,
{
    pub fn new(config: OrchestratorConfig, ledger: L, contract: C, sdk: E, oracle: O) -> Self {
        Self {
            config,
            ledger,
            contract,
            sdk,
            oracle,
            identities: IdentityPool::default(),
            grades: GradeGenerator::from_seed(0),
        }
    }

    pub fn with_identities(mut self, identities: IdentityPool) -> Self {
        self.identities = identities;
        self
    }

    pub fn with_grade_seed(mut self, seed: u64) -> Self {
        self.grades = GradeGenerator::from_seed(seed);
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn identities(&self) -> &IdentityPool {
        &self.identities
    }

    pub async fn create_election(
        &self,
        candidate_number: u32,
        label: &str,
        cancel: &CancellationToken,
    ) -> Result<Election, OrchestratorError> {
        self.lifecycle()
            .create_election(candidate_number, label, cancel)
            .await
    }

    pub async fn set_voting_state(
        &self,
        election: ElectionId,
        open: bool,
        cancel: &CancellationToken,
    ) -> Result<TxReceipt, OrchestratorError> {
        self.lifecycle()
            .set_voting_state(election, open, cancel)
            .await
    }

    pub async fn election(&self, election: ElectionId) -> Result<Election, OrchestratorError> {
        self.lifecycle().election(election).await
    }

    pub async fn cast_ballot(
        &self,
        election: ElectionId,
        voter: Address,
        grades: &[u8],
    ) -> Result<TxReceipt, OrchestratorError> {
        BallotSubmitter::new(&self.ledger, &self.contract, &self.sdk, &self.config)
            .cast_ballot(election, voter, grades)
            .await
    }

    /// Cast one random single-grade-per-candidate ballot as the pool
    /// identity at `voter`.
    pub async fn cast_random_ballot(
        &mut self,
        election: ElectionId,
        voter: usize,
    ) -> Result<CastBallot, OrchestratorError> {
        let voter = self.identities.get(voter)?;
        let candidates = self
            .contract
            .candidate_number(&self.config.contract, election)
            .await?;
        let grades = self.grades.ballot(candidates);
        let receipt = self.cast_ballot(election, voter, &grades).await?;
        Ok(CastBallot {
            voter,
            grades,
            receipt,
        })
    }

    pub async fn decrypt_election(
        &self,
        election: ElectionId,
        cancel: &CancellationToken,
    ) -> Result<Vec<DecryptionRequest>, OrchestratorError> {
        DecryptionOrchestrator::new(&self.ledger, &self.contract, &self.oracle, &self.config)
            .decrypt_election(election, cancel)
            .await
    }

    pub async fn get_results(&self, election: ElectionId) -> Result<ElectionResults, OrchestratorError> {
        ResultAggregator::new(&self.contract, &self.config)
            .collect_results(election)
            .await
    }

    fn lifecycle(&self) -> ElectionLifecycleManager<'_, L, C> {
        ElectionLifecycleManager::new(&self.ledger, &self.contract, &self.config)
    }
}
