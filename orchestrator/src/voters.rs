//! Who votes and what they vote: an explicit identity pool and a seeded
//! grade generator, so exercising runs are reproducible.

use mjvs_types::{Address, Grade};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::OrchestratorError;

/// Ordered signer identities, selected by index.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IdentityPool {
    identities: Vec<Address>,
}

impl IdentityPool {
    pub fn new(identities: Vec<Address>) -> Self {
        Self { identities }
    }

    pub fn get(&self, index: usize) -> Result<Address, OrchestratorError> {
        self.identities
            .get(index)
            .copied()
            .ok_or(OrchestratorError::UnknownIdentity {
                index,
                size: self.identities.len(),
            })
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Address> {
        self.identities.iter()
    }
}

/// Uniform single-grade draws from an explicitly seeded RNG.
pub struct GradeGenerator {
    rng: StdRng,
}

impl GradeGenerator {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn next_grade(&mut self) -> Grade {
        Grade::ALL[self.rng.gen_range(0..Grade::ALL.len())]
    }

    /// One single-bit grade value per candidate.
    pub fn ballot(&mut self, candidates: u32) -> Vec<u8> {
        (0..candidates).map(|_| self.next_grade().bitmask()).collect()
    }
}
