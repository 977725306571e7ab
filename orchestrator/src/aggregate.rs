//! Turning decrypted per-candidate tallies into comparable percentages.

use mjvs_client::ElectionContract;
use mjvs_types::{CandidateId, CandidateResult, Election, ElectionId, Grade, GRADE_COUNT};

use crate::config::OrchestratorConfig;
use crate::error::OrchestratorError;

#[derive(Clone, Debug, PartialEq)]
pub struct AggregateReport {
    /// `percentages[candidate][grade]`, all against the same denominator.
    pub percentages: Vec<[f64; GRADE_COUNT]>,
    pub licit_per_candidate: Vec<u64>,
    /// Normalization total: the first candidate's licit vote count.
    pub total_licit_votes: u64,
    pub total_vote_count: u64,
    /// Ballots recorded by the contract that no licit grade accounts for.
    pub unaccounted_ballots: u64,
}

/// Aggregate the decrypted results of `election`.
///
/// Every candidate is scaled by the first candidate's licit total so the
/// bars share one scale. A zero total yields zero percentages.
pub fn aggregate(
    election: ElectionId,
    results: &[CandidateResult],
    total_vote_count: u64,
) -> Result<AggregateReport, OrchestratorError> {
    let licit_per_candidate: Vec<u64> = results.iter().map(CandidateResult::licit_total).collect();

    if let Some((idx, &counted)) = licit_per_candidate
        .iter()
        .enumerate()
        .find(|&(_, &licit)| licit > total_vote_count)
    {
        tracing::error!(%election, candidate = idx, counted, total_vote_count, "defective tally");
        return Err(OrchestratorError::DefectiveTally {
            election,
            candidate: CandidateId(idx as u32),
            counted,
            vote_count: total_vote_count,
        });
    }

    let total_licit_votes = licit_per_candidate.first().copied().unwrap_or(0);
    let unaccounted_ballots = total_vote_count.saturating_sub(total_licit_votes);
    if unaccounted_ballots > 0 {
        tracing::warn!(
            %election,
            total_vote_count,
            total_licit_votes,
            unaccounted_ballots,
            "ballots with illicit grades present"
        );
    }

    let percentages = results
        .iter()
        .map(|result| {
            let mut row = [0.0; GRADE_COUNT];
            if total_licit_votes > 0 {
                for (pct, count) in row.iter_mut().zip(result.counts) {
                    *pct = 100.0 * count as f64 / total_licit_votes as f64;
                }
            }
            row
        })
        .collect();

    Ok(AggregateReport {
        percentages,
        licit_per_candidate,
        total_licit_votes,
        total_vote_count,
        unaccounted_ballots,
    })
}

/// Everything known about a decrypted election.
#[derive(Clone, Debug, PartialEq)]
pub struct ElectionResults {
    pub election: Election,
    pub results: Vec<CandidateResult>,
    pub report: AggregateReport,
}

impl ElectionResults {
    /// Majority-judgment median per candidate.
    pub fn medians(&self) -> Vec<Option<Grade>> {
        self.results.iter().map(CandidateResult::median_grade).collect()
    }

    /// Raw `{candidate x grade}` count matrix.
    pub fn counts(&self) -> Vec<[u64; GRADE_COUNT]> {
        self.results.iter().map(|r| r.counts).collect()
    }
}

pub struct ResultAggregator<'a, C> {
    contract: &'a C,
    config: &'a OrchestratorConfig,
}

impl<'a, C: ElectionContract> ResultAggregator<'a, C> {
    pub fn new(contract: &'a C, config: &'a OrchestratorConfig) -> Self {
        Self { contract, config }
    }

    /// Read the election and every candidate's published result, then
    /// aggregate them.
    pub async fn collect_results(&self, id: ElectionId) -> Result<ElectionResults, OrchestratorError> {
        let election = self.contract.election(&self.config.contract, id).await?;
        let mut results = Vec::with_capacity(election.candidate_number as usize);
        for candidate in election.candidates() {
            results.push(
                self.contract
                    .candidate_result(&self.config.contract, id, candidate)
                    .await?,
            );
        }
        let report = aggregate(id, &results, election.vote_count)?;
        tracing::info!(
            election = %id,
            votes = election.vote_count,
            licit = report.total_licit_votes,
            "results collected"
        );
        Ok(ElectionResults {
            election,
            results,
            report,
        })
    }
}
