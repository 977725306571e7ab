//! Majority-judgment election orchestration.
//!
//! Drives an external election contract through its lifecycle:
//! - creation and voting-state control, confirmed by correlated events
//! - ballot submission, one transaction per ballot
//! - strictly sequential per-candidate decryption through an oracle
//! - aggregation of the decrypted tallies into comparable percentages
//!
//! Every collaborator is a trait from `mjvs-client`; every component is
//! built from an explicit [`OrchestratorConfig`].

pub mod aggregate;
pub mod ballot;
pub mod cancel;
pub mod config;
pub mod correlator;
pub mod decryption;
pub mod deployment;
pub mod error;
pub mod lifecycle;
pub mod orchestrator;
pub mod voters;

pub use aggregate::{aggregate, AggregateReport, ElectionResults, ResultAggregator};
pub use ballot::BallotSubmitter;
pub use cancel::{CancellationSource, CancellationToken};
pub use config::{ClientConfig, OrchestratorConfig, Timeouts};
pub use correlator::{EventCorrelator, EventWaitToken};
pub use decryption::{DecryptionOrchestrator, DecryptionPhase, DecryptionRequest, DecryptionStatus};
pub use deployment::{deploy_contract, DeploymentRecord};
pub use error::OrchestratorError;
pub use lifecycle::ElectionLifecycleManager;
pub use orchestrator::{CastBallot, ElectionOrchestrator};
pub use voters::{GradeGenerator, IdentityPool};
