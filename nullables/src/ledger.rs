//! Nullable ledger: an in-memory chain hosting simulated election contracts.

use mjvs_client::{
    ClientError, ContractCall, DecryptionOracle, ElectionContract, EncryptedInput, EncryptionSdk,
    Ledger, LogPayload,
};
use mjvs_types::{
    Address, BlockNumber, CandidateId, CandidateResult, CiphertextHandle, Election, ElectionId,
    RawLog, TxHash, TxReceipt, TxStatus, GRADE_COUNT,
};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::contract::{CallOutcome, SimulatedContract};

/// An in-memory ledger + contract + encryption SDK + oracle.
///
/// Thread-safe so a test can keep inspecting it while the orchestrator runs.
pub struct NullLedger {
    state: Mutex<ChainState>,
}

#[derive(Default)]
struct ChainState {
    head: BlockNumber,
    tx_count: u64,
    accounts: Vec<Address>,
    logs: Vec<RawLog>,
    contracts: HashMap<Address, SimulatedContract>,
    ciphertexts: HashMap<CiphertextHandle, u8>,
    sent: Vec<ContractCall>,
    oracle_calls: u64,
    faults: Faults,
}

#[derive(Default)]
struct Faults {
    /// Methods whose next transaction is mined with a failed status.
    fail_next: HashSet<&'static str>,
    /// Event names that are never indexed.
    suppressed_events: HashSet<String>,
    oracle_stalled: bool,
    log_fetch_broken: bool,
}

impl NullLedger {
    /// A fresh chain at block 0 with `accounts` deterministic signer identities
    /// (`Address::from_low_u64(1..=accounts)`).
    pub fn new(accounts: u64) -> Self {
        let state = ChainState {
            accounts: (1..=accounts).map(Address::from_low_u64).collect(),
            ..Default::default()
        };
        Self {
            state: Mutex::new(state),
        }
    }

    // ── Fault injection ─────────────────────────────────────────────────

    /// Mine the next `method` transaction (e.g. `"requestResult"`) with a failed status.
    pub fn fail_next_transaction(&self, method: &'static str) {
        self.state.lock().unwrap().faults.fail_next.insert(method);
    }

    /// Drop every future event called `name`, as if the indexer lagged forever.
    pub fn suppress_event(&self, name: &str) {
        self.state
            .lock()
            .unwrap()
            .faults
            .suppressed_events
            .insert(name.to_string());
    }

    /// Make `await_decryption` never complete.
    pub fn stall_oracle(&self) {
        self.state.lock().unwrap().faults.oracle_stalled = true;
    }

    /// Make every `get_logs` call fail with a transport error.
    pub fn break_log_fetch(&self) {
        self.state.lock().unwrap().faults.log_fetch_broken = true;
    }

    // ── Direct chain manipulation ───────────────────────────────────────

    /// Mine `n` blocks without transactions.
    pub fn mine_empty_blocks(&self, n: u64) {
        self.state.lock().unwrap().head += n;
    }

    /// Mine one block carrying a single log with the given payload.
    pub fn emit_event(&self, contract: &Address, payload: LogPayload) -> BlockNumber {
        let mut state = self.state.lock().unwrap();
        state.head += 1;
        let block = state.head;
        state.push_logs(contract, block, vec![payload]);
        block
    }

    /// Overwrite a published candidate result.
    pub fn set_result(
        &self,
        contract: &Address,
        id: ElectionId,
        candidate: CandidateId,
        counts: [u64; GRADE_COUNT],
    ) {
        if let Some(c) = self.state.lock().unwrap().contracts.get_mut(contract) {
            c.set_result(id, candidate, counts);
        }
    }

    // ── Inspection ──────────────────────────────────────────────────────

    pub fn head(&self) -> BlockNumber {
        self.state.lock().unwrap().head
    }

    /// Every call submitted so far (including rejected and failed ones).
    pub fn sent_calls(&self) -> Vec<ContractCall> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn oracle_calls(&self) -> u64 {
        self.state.lock().unwrap().oracle_calls
    }

    pub fn identities(&self) -> Vec<Address> {
        self.state.lock().unwrap().accounts.clone()
    }
}

impl Default for NullLedger {
    fn default() -> Self {
        Self::new(20)
    }
}

impl ChainState {
    fn next_tx_hash(&mut self) -> TxHash {
        self.tx_count += 1;
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&self.tx_count.to_be_bytes());
        TxHash::new(bytes)
    }

    fn push_logs(&mut self, contract: &Address, block: BlockNumber, payloads: Vec<LogPayload>) {
        let mut index = 0u32;
        for payload in payloads {
            if self.faults.suppressed_events.contains(&payload.name) {
                tracing::debug!(event = %payload.name, block, "null ledger: event suppressed");
                continue;
            }
            self.logs.push(RawLog {
                address: *contract,
                block_number: block,
                log_index: index,
                payload: payload.to_bytes(),
            });
            index += 1;
        }
    }

    fn mine(&mut self, status: TxStatus) -> TxReceipt {
        self.head += 1;
        TxReceipt {
            tx_hash: self.next_tx_hash(),
            status,
            block_number: self.head,
        }
    }

    fn contract(&self, address: &Address) -> Result<&SimulatedContract, ClientError> {
        self.contracts
            .get(address)
            .ok_or_else(|| ClientError::NotFound(format!("no contract at {address}")))
    }
}

impl Ledger for NullLedger {
    async fn deploy(&self, _signer: &Address) -> Result<(Address, TxReceipt), ClientError> {
        let mut state = self.state.lock().unwrap();
        let address = Address::from_low_u64(0x1000 + state.contracts.len() as u64);
        state
            .contracts
            .insert(address, SimulatedContract::new(address));
        let receipt = state.mine(TxStatus::Success);
        Ok((address, receipt))
    }

    async fn accounts(&self) -> Result<Vec<Address>, ClientError> {
        Ok(self.identities())
    }

    async fn send_transaction(
        &self,
        signer: &Address,
        contract: &Address,
        call: &ContractCall,
    ) -> Result<TxReceipt, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.sent.push(call.clone());

        if state.faults.fail_next.remove(call.method()) {
            return Ok(state.mine(TxStatus::Failed));
        }

        let ChainState {
            contracts,
            ciphertexts,
            ..
        } = &mut *state;
        let target = contracts
            .get_mut(contract)
            .ok_or_else(|| ClientError::NotFound(format!("no contract at {contract}")))?;

        match target.apply(signer, call, ciphertexts) {
            CallOutcome::Rejected(reason) => Err(ClientError::Rejected(reason)),
            CallOutcome::Failed(reason) => {
                tracing::debug!(method = call.method(), %reason, "null ledger: transaction reverted");
                Ok(state.mine(TxStatus::Failed))
            }
            CallOutcome::Success(events) => {
                let receipt = state.mine(TxStatus::Success);
                state.push_logs(contract, receipt.block_number, events);
                Ok(receipt)
            }
        }
    }

    async fn block_number(&self) -> Result<BlockNumber, ClientError> {
        Ok(self.head())
    }

    async fn get_logs(
        &self,
        contract: &Address,
        from: BlockNumber,
        to: BlockNumber,
    ) -> Result<Vec<RawLog>, ClientError> {
        let state = self.state.lock().unwrap();
        if state.faults.log_fetch_broken {
            return Err(ClientError::Transport("log fetch failed".into()));
        }
        Ok(state
            .logs
            .iter()
            .filter(|log| log.address == *contract)
            .filter(|log| log.block_number >= from && log.block_number <= to)
            .cloned()
            .collect())
    }
}

impl ElectionContract for NullLedger {
    async fn election(&self, contract: &Address, id: ElectionId) -> Result<Election, ClientError> {
        let state = self.state.lock().unwrap();
        state
            .contract(contract)?
            .election(id)
            .ok_or_else(|| ClientError::NotFound(format!("no election {id}")))
    }

    async fn candidate_number(
        &self,
        contract: &Address,
        id: ElectionId,
    ) -> Result<u32, ClientError> {
        self.election(contract, id)
            .await
            .map(|election| election.candidate_number)
    }

    async fn candidate_result(
        &self,
        contract: &Address,
        id: ElectionId,
        candidate: CandidateId,
    ) -> Result<CandidateResult, ClientError> {
        let state = self.state.lock().unwrap();
        state
            .contract(contract)?
            .result(id, candidate)
            .ok_or_else(|| ClientError::NotFound(format!("no candidate {candidate} in election {id}")))
    }
}

impl EncryptionSdk for NullLedger {
    /// "Encrypts" by registering each value under a fresh handle.
    async fn encrypt_grades(
        &self,
        contract: &Address,
        signer: &Address,
        grades: &[u8],
    ) -> Result<EncryptedInput, ClientError> {
        let mut state = self.state.lock().unwrap();
        let mut handles = Vec::with_capacity(grades.len());
        for value in grades {
            let mut bytes = [0u8; 32];
            let n = state.ciphertexts.len() as u64 + 1;
            bytes[..8].copy_from_slice(&n.to_be_bytes());
            let handle = CiphertextHandle(bytes);
            state.ciphertexts.insert(handle, *value);
            handles.push(handle);
        }
        Ok(EncryptedInput {
            handles,
            proof: SimulatedContract::expected_proof(contract, signer),
        })
    }
}

impl DecryptionOracle for NullLedger {
    /// Services every pending decryption request, one block per contract.
    async fn await_decryption(&self) -> Result<(), ClientError> {
        let stalled = {
            let mut state = self.state.lock().unwrap();
            state.oracle_calls += 1;
            state.faults.oracle_stalled
        };
        if stalled {
            std::future::pending::<()>().await;
        }

        let mut state = self.state.lock().unwrap();
        let mut addresses: Vec<Address> = state
            .contracts
            .iter()
            .filter(|(_, c)| c.has_pending_decryptions())
            .map(|(a, _)| *a)
            .collect();
        addresses.sort();
        for address in addresses {
            let events = match state.contracts.get_mut(&address) {
                Some(contract) => contract.fulfil_pending(),
                None => continue,
            };
            state.head += 1;
            let block = state.head;
            state.push_logs(&address, block, events);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mjvs_types::event::names;

    async fn deployed() -> (NullLedger, Address, Address) {
        let ledger = NullLedger::new(3);
        let owner = ledger.identities()[0];
        let (contract, _) = ledger.deploy(&owner).await.unwrap();
        (ledger, owner, contract)
    }

    #[tokio::test]
    async fn every_transaction_mines_one_block() {
        let (ledger, owner, contract) = deployed().await;
        assert_eq!(ledger.head(), 1);
        let receipt = ledger
            .send_transaction(
                &owner,
                &contract,
                &ContractCall::CreateElection {
                    candidate_number: 2,
                    label: "Board".into(),
                },
            )
            .await
            .unwrap();
        assert!(receipt.succeeded());
        assert_eq!(receipt.block_number, 2);
        assert_eq!(ledger.head(), 2);
    }

    #[tokio::test]
    async fn logs_are_filtered_by_range_and_decodable() {
        let (ledger, owner, contract) = deployed().await;
        let call = ContractCall::CreateElection {
            candidate_number: 1,
            label: "A".into(),
        };
        ledger.send_transaction(&owner, &contract, &call).await.unwrap();
        ledger.send_transaction(&owner, &contract, &call).await.unwrap();

        let all = ledger.get_logs(&contract, 0, ledger.head()).await.unwrap();
        assert_eq!(all.len(), 2);
        let later = ledger.get_logs(&contract, 3, 3).await.unwrap();
        assert_eq!(later.len(), 1);
        let event = ledger.decode_log(&later[0]).unwrap();
        assert_eq!(event.name, names::NEW_ELECTION);
        assert_eq!(event.uint("electionId"), Some(1));
    }

    #[tokio::test]
    async fn injected_failure_applies_once() {
        let (ledger, owner, contract) = deployed().await;
        ledger.fail_next_transaction("createElection");
        let call = ContractCall::CreateElection {
            candidate_number: 1,
            label: "A".into(),
        };
        let first = ledger.send_transaction(&owner, &contract, &call).await.unwrap();
        let second = ledger.send_transaction(&owner, &contract, &call).await.unwrap();
        assert_eq!(first.status, TxStatus::Failed);
        assert_eq!(second.status, TxStatus::Success);
    }

    #[tokio::test]
    async fn suppressed_events_are_not_indexed() {
        let (ledger, owner, contract) = deployed().await;
        ledger.suppress_event(names::NEW_ELECTION);
        let receipt = ledger
            .send_transaction(
                &owner,
                &contract,
                &ContractCall::CreateElection {
                    candidate_number: 1,
                    label: "A".into(),
                },
            )
            .await
            .unwrap();
        assert!(receipt.succeeded());
        assert!(ledger.get_logs(&contract, 0, ledger.head()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn encryption_proof_matches_contract_expectation() {
        let (ledger, owner, contract) = deployed().await;
        let input = ledger.encrypt_grades(&contract, &owner, &[8, 32]).await.unwrap();
        assert_eq!(input.handles.len(), 2);
        assert_ne!(input.handles[0], input.handles[1]);
        assert_eq!(input.proof, SimulatedContract::expected_proof(&contract, &owner));
    }

    #[tokio::test]
    async fn oracle_publishes_pending_results() {
        let (ledger, owner, contract) = deployed().await;
        let create = ContractCall::CreateElection {
            candidate_number: 1,
            label: "A".into(),
        };
        ledger.send_transaction(&owner, &contract, &create).await.unwrap();
        ledger
            .send_transaction(
                &owner,
                &contract,
                &ContractCall::RequestResult {
                    election_id: ElectionId(0),
                    candidate_id: CandidateId(0),
                },
            )
            .await
            .unwrap();
        let before = ledger.head();
        ledger.await_decryption().await.unwrap();
        assert_eq!(ledger.head(), before + 1);
        assert_eq!(ledger.oracle_calls(), 1);
        let logs = ledger.get_logs(&contract, before + 1, before + 1).await.unwrap();
        assert_eq!(ledger.decode_log(&logs[0]).unwrap().name, names::VOTE_DECRYPTED);
    }

    #[tokio::test]
    async fn broken_log_fetch_is_an_error() {
        let (ledger, _, contract) = deployed().await;
        ledger.break_log_fetch();
        assert!(ledger.get_logs(&contract, 0, 1).await.is_err());
    }

    #[tokio::test]
    async fn unknown_contract_is_not_found() {
        let ledger = NullLedger::new(1);
        let err = ledger
            .election(&Address::from_low_u64(77), ElectionId(0))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::NotFound(_)));
    }
}
