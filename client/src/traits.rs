//! Collaborator traits consumed by the orchestrator.
//!
//! All methods are `async fn` and dispatched statically; the orchestrator
//! drives them from a single task, so the futures need not be `Send`.

#![allow(async_fn_in_trait)]

use mjvs_types::{
    Address, BlockNumber, CandidateId, CandidateResult, Election, ElectionId, EventRecord, RawLog,
    TxReceipt,
};

use crate::call::{ContractCall, EncryptedInput, LogPayload};
use crate::error::ClientError;

/// Transaction submission and log access.
pub trait Ledger {
    /// Deploy a fresh election contract from `signer`.
    async fn deploy(&self, signer: &Address) -> Result<(Address, TxReceipt), ClientError>;

    /// Signer identities the ledger will sign for, in a stable order.
    async fn accounts(&self) -> Result<Vec<Address>, ClientError>;

    /// Submit `call` and wait until it is mined.
    ///
    /// A revert detected before inclusion is `Err(ClientError::Rejected)`.
    /// A mined-but-failed transaction is `Ok` with a failed status.
    async fn send_transaction(
        &self,
        signer: &Address,
        contract: &Address,
        call: &ContractCall,
    ) -> Result<TxReceipt, ClientError>;

    /// Current head.
    async fn block_number(&self) -> Result<BlockNumber, ClientError>;

    /// Logs emitted by `contract` in blocks `from..=to`, in emission order.
    async fn get_logs(
        &self,
        contract: &Address,
        from: BlockNumber,
        to: BlockNumber,
    ) -> Result<Vec<RawLog>, ClientError>;

    /// Decode a raw log into a named event, or `None` if it is not one of ours.
    fn decode_log(&self, log: &RawLog) -> Option<EventRecord> {
        LogPayload::decode(log)
    }
}

/// Read-only views of the election contract.
pub trait ElectionContract {
    async fn election(&self, contract: &Address, id: ElectionId) -> Result<Election, ClientError>;

    async fn candidate_number(&self, contract: &Address, id: ElectionId)
        -> Result<u32, ClientError>;

    async fn candidate_result(
        &self,
        contract: &Address,
        id: ElectionId,
        candidate: CandidateId,
    ) -> Result<CandidateResult, ClientError>;
}

/// Produces ciphertext handles and a validity proof for cleartext grades.
pub trait EncryptionSdk {
    async fn encrypt_grades(
        &self,
        contract: &Address,
        signer: &Address,
        grades: &[u8],
    ) -> Result<EncryptedInput, ClientError>;
}

/// The decryption oracle's completion signal.
pub trait DecryptionOracle {
    /// Resolves once every decryption requested so far has been serviced.
    async fn await_decryption(&self) -> Result<(), ClientError>;
}

impl<T: Ledger> Ledger for &T {
    async fn deploy(&self, signer: &Address) -> Result<(Address, TxReceipt), ClientError> {
        (**self).deploy(signer).await
    }

    async fn accounts(&self) -> Result<Vec<Address>, ClientError> {
        (**self).accounts().await
    }

    async fn send_transaction(
        &self,
        signer: &Address,
        contract: &Address,
        call: &ContractCall,
    ) -> Result<TxReceipt, ClientError> {
        (**self).send_transaction(signer, contract, call).await
    }

    async fn block_number(&self) -> Result<BlockNumber, ClientError> {
        (**self).block_number().await
    }

    async fn get_logs(
        &self,
        contract: &Address,
        from: BlockNumber,
        to: BlockNumber,
    ) -> Result<Vec<RawLog>, ClientError> {
        (**self).get_logs(contract, from, to).await
    }

    fn decode_log(&self, log: &RawLog) -> Option<EventRecord> {
        (**self).decode_log(log)
    }
}

impl<T: ElectionContract> ElectionContract for &T {
    async fn election(&self, contract: &Address, id: ElectionId) -> Result<Election, ClientError> {
        (**self).election(contract, id).await
    }

    async fn candidate_number(
        &self,
        contract: &Address,
        id: ElectionId,
    ) -> Result<u32, ClientError> {
        (**self).candidate_number(contract, id).await
    }

    async fn candidate_result(
        &self,
        contract: &Address,
        id: ElectionId,
        candidate: CandidateId,
    ) -> Result<CandidateResult, ClientError> {
        (**self).candidate_result(contract, id, candidate).await
    }
}

impl<T: EncryptionSdk> EncryptionSdk for &T {
    async fn encrypt_grades(
        &self,
        contract: &Address,
        signer: &Address,
        grades: &[u8],
    ) -> Result<EncryptedInput, ClientError> {
        (**self).encrypt_grades(contract, signer, grades).await
    }
}

impl<T: DecryptionOracle> DecryptionOracle for &T {
    async fn await_decryption(&self) -> Result<(), ClientError> {
        (**self).await_decryption().await
    }
}
