//! Event correlation: turning "wait until the ledger emits a matching log"
//! into a future with a deadline.
//!
//! A wait is registered first, which fixes its watermark (the last block
//! already considered) and its deadline. Waiting then polls the ledger
//! head; every block past the watermark is scanned once, in emission
//! order, and the first event whose name and predicate match resolves the
//! wait. The token is consumed, so each wait yields at most one event.

use mjvs_client::Ledger;
use mjvs_types::{Address, BlockNumber, EventRecord};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

use crate::cancel::CancellationToken;
use crate::error::OrchestratorError;

type Predicate = Box<dyn Fn(&EventRecord) -> bool + Send + Sync>;

/// Correlation state for one pending wait. Owned by the caller that
/// registered it and consumed by [`EventCorrelator::wait`].
pub struct EventWaitToken {
    event: String,
    predicate: Predicate,
    last_checked: BlockNumber,
    deadline: Instant,
    timeout: Duration,
}

impl EventWaitToken {
    pub fn event(&self) -> &str {
        &self.event
    }

    /// Highest block already scanned (or skipped) for this wait.
    pub fn last_checked(&self) -> BlockNumber {
        self.last_checked
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }
}

impl fmt::Debug for EventWaitToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventWaitToken")
            .field("event", &self.event)
            .field("last_checked", &self.last_checked)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

pub struct EventCorrelator<'a, L> {
    ledger: &'a L,
    contract: Address,
    poll_interval: Duration,
}

impl<'a, L: Ledger> EventCorrelator<'a, L> {
    pub fn new(ledger: &'a L, contract: Address, poll_interval: Duration) -> Self {
        Self {
            ledger,
            contract,
            poll_interval,
        }
    }

    /// Register a wait for `event` starting at the current head.
    pub async fn register<P>(
        &self,
        event: &str,
        predicate: P,
        timeout: Duration,
    ) -> Result<EventWaitToken, OrchestratorError>
    where
        P: Fn(&EventRecord) -> bool + Send + Sync + 'static,
    {
        let head = self.ledger.block_number().await?;
        Ok(self.register_after(head, event, predicate, timeout))
    }

    /// Register a wait that ignores every block up to and including `block`.
    pub fn register_after<P>(
        &self,
        block: BlockNumber,
        event: &str,
        predicate: P,
        timeout: Duration,
    ) -> EventWaitToken
    where
        P: Fn(&EventRecord) -> bool + Send + Sync + 'static,
    {
        tracing::debug!(event, after_block = block, ?timeout, "event wait registered");
        EventWaitToken {
            event: event.to_string(),
            predicate: Box::new(predicate),
            last_checked: block,
            deadline: Instant::now() + timeout,
            timeout,
        }
    }

    /// Poll until the token's event is observed, its deadline passes, or
    /// `cancel` fires. Ledger errors abort the wait.
    pub async fn wait(
        &self,
        mut token: EventWaitToken,
        cancel: &CancellationToken,
    ) -> Result<EventRecord, OrchestratorError> {
        loop {
            if cancel.is_cancelled() {
                return Err(OrchestratorError::Cancelled);
            }

            if let Some(event) = self.poll(&mut token).await? {
                tracing::info!(
                    event = %event.name,
                    block = event.block_number,
                    log_index = event.log_index,
                    "correlated event observed"
                );
                return Ok(event);
            }

            let now = Instant::now();
            if now >= token.deadline {
                tracing::warn!(event = %token.event, waited = ?token.timeout, "event wait timed out");
                return Err(OrchestratorError::EventTimeout {
                    event: token.event,
                    waited: token.timeout,
                });
            }

            let nap = self.poll_interval.min(token.deadline - now);
            tokio::select! {
                _ = tokio::time::sleep(nap) => {}
                _ = cancel.cancelled() => return Err(OrchestratorError::Cancelled),
            }
        }
    }

    /// Register at the current head, then wait.
    pub async fn wait_for_event<P>(
        &self,
        event: &str,
        predicate: P,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<EventRecord, OrchestratorError>
    where
        P: Fn(&EventRecord) -> bool + Send + Sync + 'static,
    {
        let token = self.register(event, predicate, timeout).await?;
        self.wait(token, cancel).await
    }

    /// Scan the blocks between the watermark and the head, advancing the
    /// watermark whether or not anything matched.
    async fn poll(
        &self,
        token: &mut EventWaitToken,
    ) -> Result<Option<EventRecord>, OrchestratorError> {
        let head = self.ledger.block_number().await?;
        if head <= token.last_checked {
            tracing::debug!(event = %token.event, head, "no new blocks");
            return Ok(None);
        }

        let logs = self
            .ledger
            .get_logs(&self.contract, token.last_checked + 1, head)
            .await?;
        tracing::debug!(
            event = %token.event,
            from = token.last_checked + 1,
            to = head,
            logs = logs.len(),
            "scanned logs"
        );

        let found = logs
            .iter()
            .filter_map(|log| self.ledger.decode_log(log))
            .find(|event| event.name == token.event && (token.predicate)(event));
        token.last_checked = head;
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mjvs_client::{ContractCall, LogPayload};
    use mjvs_nullables::NullLedger;
    use mjvs_types::event::{fields, names};
    use mjvs_types::EventValue;
    use std::collections::BTreeMap;

    const POLL: Duration = Duration::from_millis(500);

    fn decrypted(election: u64, candidate: u64) -> LogPayload {
        let mut f = BTreeMap::new();
        f.insert(fields::ELECTION_ID.to_string(), EventValue::Uint(election));
        f.insert(fields::CANDIDATE_ID.to_string(), EventValue::Uint(candidate));
        LogPayload {
            name: names::VOTE_DECRYPTED.into(),
            fields: f,
        }
    }

    async fn deployed() -> (NullLedger, Address) {
        let ledger = NullLedger::new(2);
        let owner = ledger.identities()[0];
        let (contract, _) = ledger.deploy(&owner).await.unwrap();
        (ledger, contract)
    }

    #[tokio::test(start_paused = true)]
    async fn resolves_on_matching_event_only() {
        let (ledger, contract) = deployed().await;
        let correlator = EventCorrelator::new(&ledger, contract, POLL);
        let token = correlator
            .register(
                names::VOTE_DECRYPTED,
                |e| e.uint(fields::CANDIDATE_ID) == Some(1),
                Duration::from_secs(10),
            )
            .await
            .unwrap();

        ledger.emit_event(&contract, decrypted(0, 0));
        let wanted = ledger.emit_event(&contract, decrypted(0, 1));

        let event = correlator
            .wait(token, &CancellationToken::never())
            .await
            .unwrap();
        assert_eq!(event.block_number, wanted);
        assert_eq!(event.uint(fields::CANDIDATE_ID), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn events_before_registration_are_ignored() {
        let (ledger, contract) = deployed().await;
        ledger.emit_event(&contract, decrypted(0, 0));
        let correlator = EventCorrelator::new(&ledger, contract, POLL);

        let err = correlator
            .wait_for_event(
                names::VOTE_DECRYPTED,
                |_| true,
                Duration::from_secs(3),
                &CancellationToken::never(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::EventTimeout { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn register_after_sees_blocks_past_the_given_one() {
        let (ledger, contract) = deployed().await;
        let first = ledger.emit_event(&contract, decrypted(0, 0));
        ledger.emit_event(&contract, decrypted(0, 1));
        let correlator = EventCorrelator::new(&ledger, contract, POLL);

        let token = correlator.register_after(first, names::VOTE_DECRYPTED, |_| true, Duration::from_secs(1));
        let event = correlator
            .wait(token, &CancellationToken::never())
            .await
            .unwrap();
        assert_eq!(event.uint(fields::CANDIDATE_ID), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn watermark_advances_without_a_match() {
        let (ledger, contract) = deployed().await;
        let correlator = EventCorrelator::new(&ledger, contract, POLL);
        let mut token = correlator
            .register(names::VOTE_CAST, |_| true, Duration::from_secs(1))
            .await
            .unwrap();
        ledger.mine_empty_blocks(4);

        assert!(correlator.poll(&mut token).await.unwrap().is_none());
        assert_eq!(token.last_checked(), ledger.head());
    }

    #[tokio::test(start_paused = true)]
    async fn event_arriving_mid_wait_is_observed() {
        let (ledger, contract) = deployed().await;
        let correlator = EventCorrelator::new(&ledger, contract, POLL);
        let owner = ledger.identities()[0];

        let token = correlator
            .register(
                names::NEW_ELECTION,
                |e| e.text(fields::ELECTION_LABEL) == Some("Late"),
                Duration::from_secs(30),
            )
            .await
            .unwrap();

        let never = CancellationToken::never();
        let wait = correlator.wait(token, &never);
        let emit = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            ledger
                .send_transaction(
                    &owner,
                    &contract,
                    &ContractCall::CreateElection {
                        candidate_number: 1,
                        label: "Late".into(),
                    },
                )
                .await
                .unwrap();
        };
        let (event, ()) = tokio::join!(wait, emit);
        assert_eq!(event.unwrap().uint(fields::ELECTION_ID), Some(0));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_honours_the_deadline() {
        let (ledger, contract) = deployed().await;
        let correlator = EventCorrelator::new(&ledger, contract, Duration::from_secs(5));
        let started = Instant::now();

        let err = correlator
            .wait_for_event(
                names::VOTE_CAST,
                |_| true,
                Duration::from_secs(12),
                &CancellationToken::never(),
            )
            .await
            .unwrap_err();
        match err {
            OrchestratorError::EventTimeout { event, waited } => {
                assert_eq!(event, names::VOTE_CAST);
                assert_eq!(waited, Duration::from_secs(12));
            }
            other => panic!("expected EventTimeout, got {other:?}"),
        }
        assert_eq!(started.elapsed(), Duration::from_secs(12));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_ends_the_wait() {
        let (ledger, contract) = deployed().await;
        let correlator = EventCorrelator::new(&ledger, contract, POLL);
        let source = crate::cancel::CancellationSource::new();
        let token = source.token();

        let wait = correlator.wait_for_event(names::VOTE_CAST, |_| true, Duration::from_secs(60), &token);
        let cancel = async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            source.cancel();
        };
        let (result, ()) = tokio::join!(wait, cancel);
        assert!(matches!(result, Err(OrchestratorError::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn log_fetch_failure_aborts() {
        let (ledger, contract) = deployed().await;
        let correlator = EventCorrelator::new(&ledger, contract, POLL);
        let token = correlator
            .register(names::VOTE_CAST, |_| true, Duration::from_secs(60))
            .await
            .unwrap();
        ledger.mine_empty_blocks(1);
        ledger.break_log_fetch();

        let err = correlator
            .wait(token, &CancellationToken::never())
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::Client(_)));
    }
}
