//! Decrypted per-candidate tallies.

use serde::{Deserialize, Serialize};

use crate::grade::{Grade, GRADE_COUNT};

/// Seven grade counts for one candidate, Excellent first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateResult {
    pub counts: [u64; GRADE_COUNT],
}

impl CandidateResult {
    pub const EMPTY: Self = Self {
        counts: [0; GRADE_COUNT],
    };

    pub fn new(counts: [u64; GRADE_COUNT]) -> Self {
        Self { counts }
    }

    pub fn count(&self, grade: Grade) -> u64 {
        self.counts[grade.index()]
    }

    /// Votes attributed to some grade. A malformed multi-bit ballot is counted
    /// once per bit, so this is not necessarily the number of ballots.
    pub fn licit_total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.licit_total() == 0
    }

    /// Majority judgment median: the best grade that at least half of the
    /// counted votes reach or exceed.
    pub fn median_grade(&self) -> Option<Grade> {
        let total = self.licit_total();
        if total == 0 {
            return None;
        }
        let mut cumulative = 0u64;
        for grade in Grade::ALL {
            cumulative += self.count(grade);
            if cumulative * 2 >= total {
                return Some(grade);
            }
        }
        None
    }
}
