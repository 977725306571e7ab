//! Majority judgment grades and their bitmask encoding.
//!
//! A voter grades every candidate with one of seven ordered grades. On the
//! wire each grade is a single bit of a `u8`:
//!
//! | grade     | bit | value |
//! |-----------|-----|-------|
//! | Excellent | 0   | 1     |
//! | VeryGood  | 1   | 2     |
//! | Good      | 2   | 4     |
//! | Medium    | 3   | 8     |
//! | Bad       | 4   | 16    |
//! | VeryBad   | 5   | 32    |
//! | Awful     | 6   | 64    |
//!
//! Any other plaintext (no bit, several bits, bit 7) is a malformed grade. The
//! contract cannot reject it because it only ever sees ciphertexts.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::TypesError;

/// Number of grades on the majority judgment scale.
pub const GRADE_COUNT: usize = 7;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    Excellent,
    VeryGood,
    Good,
    Medium,
    Bad,
    VeryBad,
    Awful,
}

impl Grade {
    /// All grades, best first.
    pub const ALL: [Grade; GRADE_COUNT] = [
        Grade::Excellent,
        Grade::VeryGood,
        Grade::Good,
        Grade::Medium,
        Grade::Bad,
        Grade::VeryBad,
        Grade::Awful,
    ];

    /// Position on the scale, 0 for Excellent.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// The single-bit plaintext encoding of this grade.
    pub fn bitmask(self) -> u8 {
        1 << self.index()
    }

    /// Decode an exact single-grade bitmask.
    pub fn from_bitmask(mask: u8) -> Result<Self, TypesError> {
        if mask.count_ones() != 1 {
            return Err(TypesError::InvalidGrade(mask));
        }
        Self::from_index(mask.trailing_zeros() as usize).ok_or(TypesError::InvalidGrade(mask))
    }

    /// Whether `mask` encodes exactly one grade.
    pub fn is_licit_mask(mask: u8) -> bool {
        Self::from_bitmask(mask).is_ok()
    }

    pub fn label(self) -> &'static str {
        match self {
            Grade::Excellent => "Excellent",
            Grade::VeryGood => "VGood",
            Grade::Good => "Good",
            Grade::Medium => "Medium",
            Grade::Bad => "Bad",
            Grade::VeryBad => "VBad",
            Grade::Awful => "Awful",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
