//! Boundary between the orchestrator and the outside world.
//!
//! The orchestrator never talks to a ledger, an encryption SDK or a
//! decryption oracle directly. It is generic over the traits defined here:
//! - [`Ledger`]: deploy, submit transactions, read heads and logs
//! - [`ElectionContract`]: read-only contract views
//! - [`EncryptionSdk`]: turn cleartext grades into opaque handles + proof
//! - [`DecryptionOracle`]: block until the oracle has serviced a request
//!
//! [`RpcClient`] implements all four against a JSON-RPC ledger gateway.
//! Tests use the in-memory implementation from `mjvs-nullables`.

pub mod call;
pub mod error;
pub mod rpc;
pub mod traits;

pub use call::{ContractCall, EncryptedInput, LogPayload};
pub use error::ClientError;
pub use rpc::RpcClient;
pub use traits::{DecryptionOracle, ElectionContract, EncryptionSdk, Ledger};
