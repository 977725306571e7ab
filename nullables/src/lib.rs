//! Nullable infrastructure for deterministic testing.
//!
//! Every external collaborator of the orchestrator (ledger, contract views,
//! encryption SDK, decryption oracle) is abstracted behind a trait in
//! `mjvs-client`. This crate provides one in-memory implementation of all of
//! them, [`NullLedger`], that:
//! - mines exactly one block per transaction
//! - simulates the election contract's rules, including duplicate-vote
//!   rejection and per-bit tallying of malformed grades
//! - can be told to fail, stall or drop events programmatically
//! - never touches the filesystem or network
//!
//! Usage: pass `&NullLedger` wherever the orchestrator wants a collaborator.

pub mod contract;
pub mod ledger;

pub use contract::{CallOutcome, SimulatedContract, REJECT_ALREADY_VOTED, REJECT_VOTING_CLOSED};
pub use ledger::NullLedger;
