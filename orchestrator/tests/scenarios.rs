//! End-to-end election scenarios against the nullable ledger.

use mjvs_client::{ContractCall, ElectionContract, Ledger};
use mjvs_nullables::{NullLedger, REJECT_ALREADY_VOTED};
use mjvs_orchestrator::{
    deploy_contract, CancellationSource, CancellationToken, DecryptionPhase, DecryptionStatus,
    DeploymentRecord, ElectionOrchestrator, IdentityPool, OrchestratorConfig, OrchestratorError,
};
use mjvs_types::event::names;
use mjvs_types::{CandidateId, CandidateResult, Election, Grade};
use std::time::Duration;
use tokio::time::Instant;

type Orchestrator<'a> =
    ElectionOrchestrator<&'a NullLedger, &'a NullLedger, &'a NullLedger, &'a NullLedger>;

async fn deployed(accounts: u64) -> (NullLedger, OrchestratorConfig) {
    let ledger = NullLedger::new(accounts);
    let signer = ledger.identities()[0];
    let contract = deploy_contract(&ledger, &signer).await.unwrap();
    (ledger, OrchestratorConfig::new(contract, signer))
}

fn orchestrator<'a>(ledger: &'a NullLedger, config: &OrchestratorConfig) -> Orchestrator<'a> {
    ElectionOrchestrator::new(config.clone(), ledger, ledger, ledger, ledger)
        .with_identities(IdentityPool::new(ledger.identities()))
}

async fn open_election(orch: &Orchestrator<'_>, candidates: u32) -> Election {
    let never = CancellationToken::never();
    let election = orch.create_election(candidates, "Board", &never).await.unwrap();
    orch.set_voting_state(election.id, true, &never).await.unwrap();
    election
}

#[tokio::test(start_paused = true)]
async fn create_board_election() {
    let (ledger, config) = deployed(3).await;
    let orch = orchestrator(&ledger, &config);

    let election = orch
        .create_election(2, "Board", &CancellationToken::never())
        .await
        .unwrap();
    assert_eq!(election.candidate_number, 2);
    assert!(!election.voting_open);
    assert_eq!(election.label, "Board");
    assert_eq!(orch.election(election.id).await.unwrap(), election);
}

#[tokio::test(start_paused = true)]
async fn one_ballot_per_identity() {
    let (ledger, config) = deployed(3).await;
    let orch = orchestrator(&ledger, &config);
    let election = open_election(&orch, 2).await;
    let voter = ledger.identities()[1];

    // Medium for the first candidate, VeryBad for the second.
    orch.cast_ballot(election.id, voter, &[8, 32]).await.unwrap();
    assert_eq!(orch.election(election.id).await.unwrap().vote_count, 1);

    let err = orch.cast_ballot(election.id, voter, &[8, 32]).await.unwrap_err();
    assert!(matches!(err, OrchestratorError::BusinessRuleRejection(ref r) if r == REJECT_ALREADY_VOTED));
    assert_eq!(orch.election(election.id).await.unwrap().vote_count, 1);
}

#[tokio::test(start_paused = true)]
async fn full_election_round_trip() {
    let (ledger, config) = deployed(4).await;
    let orch = orchestrator(&ledger, &config);
    let never = CancellationToken::never();
    let election = open_election(&orch, 2).await;

    let ballots: [[u8; 2]; 3] = [[8, 32], [1, 4], [8, 64]];
    for (i, ballot) in ballots.iter().enumerate() {
        orch.cast_ballot(election.id, ledger.identities()[i + 1], ballot)
            .await
            .unwrap();
    }
    orch.set_voting_state(election.id, false, &never).await.unwrap();

    let requests = orch.decrypt_election(election.id, &never).await.unwrap();
    assert_eq!(requests.len(), 2);
    for (i, request) in requests.iter().enumerate() {
        assert_eq!(request.candidate, CandidateId(i as u32));
        assert_eq!(request.phase, DecryptionPhase::Fulfilled);
        assert_eq!(request.status, DecryptionStatus::Fulfilled);
    }
    assert_eq!(ledger.oracle_calls(), 2);

    let results = orch.get_results(election.id).await.unwrap();
    assert_eq!(results.results[0].count(Grade::Medium), 2);
    assert_eq!(results.results[0].count(Grade::Excellent), 1);
    assert_eq!(results.results[1].count(Grade::Awful), 1);
    assert_eq!(results.report.total_licit_votes, 3);
    assert_eq!(results.report.total_vote_count, 3);
    assert_eq!(results.report.unaccounted_ballots, 0);
    assert_eq!(results.medians(), vec![Some(Grade::Medium), Some(Grade::VeryBad)]);
}

#[tokio::test(start_paused = true)]
async fn decryption_requests_are_strictly_sequential() {
    let (ledger, config) = deployed(2).await;
    let orch = orchestrator(&ledger, &config);
    let election = open_election(&orch, 3).await;

    orch.decrypt_election(election.id, &CancellationToken::never())
        .await
        .unwrap();

    let requested: Vec<CandidateId> = ledger
        .sent_calls()
        .into_iter()
        .filter_map(|call| match call {
            ContractCall::RequestResult { candidate_id, .. } => Some(candidate_id),
            _ => None,
        })
        .collect();
    assert_eq!(requested, vec![CandidateId(0), CandidateId(1), CandidateId(2)]);
    // One oracle round per candidate means no request was outstanding
    // alongside another.
    assert_eq!(ledger.oracle_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn zero_ballot_candidate_decrypts_to_zeros() {
    let (ledger, config) = deployed(2).await;
    let orch = orchestrator(&ledger, &config);
    let election = open_election(&orch, 1).await;

    orch.decrypt_election(election.id, &CancellationToken::never())
        .await
        .unwrap();
    let results = orch.get_results(election.id).await.unwrap();
    assert_eq!(results.results, vec![CandidateResult::EMPTY]);
    assert!(results.report.percentages[0].iter().all(|p| *p == 0.0));
    assert_eq!(results.medians(), vec![None]);
}

#[tokio::test(start_paused = true)]
async fn failed_decryption_request_aborts_without_waiting() {
    let (ledger, config) = deployed(2).await;
    let orch = orchestrator(&ledger, &config);
    let election = open_election(&orch, 2).await;
    ledger.fail_next_transaction("requestResult");

    let started = Instant::now();
    let err = orch
        .decrypt_election(election.id, &CancellationToken::never())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        OrchestratorError::TransactionFailed { operation: "requestResult", .. }
    ));
    assert_eq!(started.elapsed(), Duration::ZERO);
    assert_eq!(ledger.oracle_calls(), 0);
    let requests = ledger
        .sent_calls()
        .into_iter()
        .filter(|c| matches!(c, ContractCall::RequestResult { .. }))
        .count();
    assert_eq!(requests, 1);
}

#[tokio::test(start_paused = true)]
async fn missing_creation_event_times_out() {
    let (ledger, config) = deployed(2).await;
    let orch = orchestrator(&ledger, &config);
    ledger.suppress_event(names::NEW_ELECTION);

    let started = Instant::now();
    let err = orch
        .create_election(2, "Board", &CancellationToken::never())
        .await
        .unwrap_err();
    match err {
        OrchestratorError::EventTimeout { event, waited } => {
            assert_eq!(event, names::NEW_ELECTION);
            assert_eq!(waited, Duration::from_secs(60));
        }
        other => panic!("expected EventTimeout, got {other:?}"),
    }
    assert_eq!(started.elapsed(), Duration::from_secs(60));
}

#[tokio::test(start_paused = true)]
async fn stalled_oracle_times_out() {
    let (ledger, config) = deployed(2).await;
    let orch = orchestrator(&ledger, &config);
    let election = open_election(&orch, 1).await;
    ledger.stall_oracle();

    let err = orch
        .decrypt_election(election.id, &CancellationToken::never())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        OrchestratorError::OracleTimeout { waited } if waited == Duration::from_secs(180)
    ));
}

#[tokio::test(start_paused = true)]
async fn missing_fulfilment_event_times_out() {
    let (ledger, config) = deployed(2).await;
    let orch = orchestrator(&ledger, &config);
    let election = open_election(&orch, 1).await;
    ledger.suppress_event(names::VOTE_DECRYPTED);

    let err = orch
        .decrypt_election(election.id, &CancellationToken::never())
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestratorError::EventTimeout { ref event, .. } if event == names::VOTE_DECRYPTED));
}

#[tokio::test(start_paused = true)]
async fn only_the_owner_may_toggle() {
    let (ledger, config) = deployed(3).await;
    let owner = orchestrator(&ledger, &config);
    let election = owner
        .create_election(1, "Board", &CancellationToken::never())
        .await
        .unwrap();

    let intruder_config = OrchestratorConfig::new(config.contract, ledger.identities()[2]);
    let intruder = orchestrator(&ledger, &intruder_config);
    let err = intruder
        .set_voting_state(election.id, true, &CancellationToken::never())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        OrchestratorError::TransactionFailed { operation: "setVotingState", .. }
    ));
    assert!(!owner.election(election.id).await.unwrap().voting_open);
}

#[tokio::test(start_paused = true)]
async fn wrong_length_ballot_is_refused_locally() {
    let (ledger, config) = deployed(3).await;
    let orch = orchestrator(&ledger, &config);
    let election = open_election(&orch, 2).await;

    let err = orch
        .cast_ballot(election.id, ledger.identities()[1], &[1, 2, 4])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        OrchestratorError::CandidateCountMismatch { expected: 2, actual: 3, .. }
    ));
    assert_eq!(orch.election(election.id).await.unwrap().vote_count, 0);
}

#[tokio::test(start_paused = true)]
async fn tampered_result_is_a_defective_tally() {
    let (ledger, config) = deployed(3).await;
    let orch = orchestrator(&ledger, &config);
    let election = open_election(&orch, 2).await;
    orch.cast_ballot(election.id, ledger.identities()[1], &[1, 1])
        .await
        .unwrap();
    orch.decrypt_election(election.id, &CancellationToken::never())
        .await
        .unwrap();
    ledger.set_result(&config.contract, election.id, CandidateId(1), [1, 1, 0, 0, 0, 0, 0]);

    let err = orch.get_results(election.id).await.unwrap_err();
    assert!(matches!(
        err,
        OrchestratorError::DefectiveTally { candidate: CandidateId(1), counted: 2, vote_count: 1, .. }
    ));
}

#[tokio::test(start_paused = true)]
async fn ballots_without_a_grade_are_unaccounted() {
    let (ledger, config) = deployed(4).await;
    let orch = orchestrator(&ledger, &config);
    let election = open_election(&orch, 1).await;
    for (i, value) in [0u8, 128, 8].into_iter().enumerate() {
        orch.cast_ballot(election.id, ledger.identities()[i + 1], &[value])
            .await
            .unwrap();
    }
    orch.decrypt_election(election.id, &CancellationToken::never())
        .await
        .unwrap();

    let results = orch.get_results(election.id).await.unwrap();
    assert_eq!(results.report.total_vote_count, 3);
    assert_eq!(results.report.total_licit_votes, 1);
    assert_eq!(results.report.unaccounted_ballots, 2);
    assert_eq!(results.report.percentages[0][Grade::Medium.index()], 100.0);
}

#[tokio::test(start_paused = true)]
async fn multi_bit_ballots_surface_as_defective() {
    let (ledger, config) = deployed(3).await;
    let orch = orchestrator(&ledger, &config);
    let election = open_election(&orch, 1).await;
    // Excellent and VeryGood at once: the contract counts both.
    orch.cast_ballot(election.id, ledger.identities()[1], &[3])
        .await
        .unwrap();
    orch.decrypt_election(election.id, &CancellationToken::never())
        .await
        .unwrap();

    let err = orch.get_results(election.id).await.unwrap_err();
    assert!(matches!(err, OrchestratorError::DefectiveTally { counted: 2, vote_count: 1, .. }));
}

#[tokio::test(start_paused = true)]
async fn cancellation_aborts_a_pending_wait() {
    let (ledger, config) = deployed(2).await;
    let orch = orchestrator(&ledger, &config);
    ledger.suppress_event(names::NEW_ELECTION);
    let source = CancellationSource::new();
    let token = source.token();

    let create = orch.create_election(1, "Board", &token);
    let cancel = async {
        tokio::time::sleep(Duration::from_secs(7)).await;
        source.cancel();
    };
    let (result, ()) = tokio::join!(create, cancel);
    assert!(matches!(result, Err(OrchestratorError::Cancelled)));
}

#[tokio::test(start_paused = true)]
async fn broken_log_fetch_aborts_creation() {
    let (ledger, config) = deployed(2).await;
    let orch = orchestrator(&ledger, &config);
    ledger.break_log_fetch();

    let err = orch
        .create_election(1, "Board", &CancellationToken::never())
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestratorError::Client(_)));
}

#[tokio::test(start_paused = true)]
async fn seeded_random_ballots_are_reproducible() {
    let (ledger_a, config_a) = deployed(4).await;
    let (ledger_b, config_b) = deployed(4).await;
    let mut a = orchestrator(&ledger_a, &config_a).with_grade_seed(11);
    let mut b = orchestrator(&ledger_b, &config_b).with_grade_seed(11);
    let ea = open_election(&a, 3).await;
    let eb = open_election(&b, 3).await;

    for voter in 1..4 {
        let cast_a = a.cast_random_ballot(ea.id, voter).await.unwrap();
        let cast_b = b.cast_random_ballot(eb.id, voter).await.unwrap();
        assert_eq!(cast_a.grades, cast_b.grades);
        assert_eq!(cast_a.grades.len(), 3);
        assert!(cast_a.grades.iter().all(|g| Grade::is_licit_mask(*g)));
    }
    assert_eq!(a.election(ea.id).await.unwrap().vote_count, 3);

    let err = a.cast_random_ballot(ea.id, 99).await.unwrap_err();
    assert!(matches!(err, OrchestratorError::UnknownIdentity { index: 99, size: 4 }));
}

#[tokio::test]
async fn deployment_is_recorded_and_reloaded() {
    let ledger = NullLedger::new(1);
    let signer = ledger.identities()[0];
    let contract = deploy_contract(&ledger, &signer).await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mjvs-deployment.toml");
    DeploymentRecord::new(contract).save(&path).unwrap();
    let reloaded = DeploymentRecord::load(&path).unwrap();
    assert_eq!(reloaded.contract_address, contract);

    let config = OrchestratorConfig::new(reloaded.contract_address, signer);
    assert!(ledger.election(&config.contract, mjvs_types::ElectionId(0)).await.is_err());
    assert_eq!(ledger.block_number().await.unwrap(), 1);
}
