use mjvs_client::ClientError;
use mjvs_types::{CandidateId, ElectionId, TxHash};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("no deployed contract on record at {}; run `mjvs deploy` first", path.display())]
    ConfigurationMissing { path: PathBuf },

    #[error("{operation} transaction {tx_hash} failed")]
    TransactionFailed {
        operation: &'static str,
        tx_hash: TxHash,
    },

    #[error("timed out after {waited:?} waiting for {event} event")]
    EventTimeout { event: String, waited: Duration },

    #[error("decryption oracle did not complete within {waited:?}")]
    OracleTimeout { waited: Duration },

    #[error("rejected by contract: {0}")]
    BusinessRuleRejection(String),

    #[error("candidate number must be at least 1")]
    InvalidCandidateNumber,

    #[error("election {election} has {expected} candidates, ballot carries {actual} grades")]
    CandidateCountMismatch {
        election: ElectionId,
        expected: u32,
        actual: usize,
    },

    #[error(
        "defective tally: candidate {candidate} has {counted} graded votes but election {election} only recorded {vote_count} ballots"
    )]
    DefectiveTally {
        election: ElectionId,
        candidate: CandidateId,
        counted: u64,
        vote_count: u64,
    },

    #[error("no identity at index {index} (pool has {size})")]
    UnknownIdentity { index: usize, size: usize },

    #[error("operation cancelled")]
    Cancelled,

    #[error("ledger client error: {0}")]
    Client(ClientError),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ClientError> for OrchestratorError {
    /// Contract reverts are business-rule rejections, reported verbatim;
    /// everything else stays a client error.
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Rejected(reason) => OrchestratorError::BusinessRuleRejection(reason),
            other => OrchestratorError::Client(other),
        }
    }
}
