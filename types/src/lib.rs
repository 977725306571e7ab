//! Fundamental types for the MJVS election orchestrator.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! addresses, transaction hashes, grades, elections, ballots, candidate results,
//! receipts and decoded ledger events.

pub mod address;
pub mod ballot;
pub mod election;
pub mod error;
pub mod event;
pub mod grade;
pub mod hash;
pub mod receipt;
pub mod result;

pub use address::Address;
pub use ballot::{Ballot, CiphertextHandle, InputProof};
pub use election::{CandidateId, Election, ElectionId};
pub use error::TypesError;
pub use event::{EventRecord, EventValue, RawLog};
pub use grade::{Grade, GRADE_COUNT};
pub use hash::TxHash;
pub use receipt::{BlockNumber, TxReceipt, TxStatus};
pub use result::CandidateResult;
