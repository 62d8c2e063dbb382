//! View tag computation for efficient scanning.
//!
//! View tags let recipients skip almost every record cheaply:
//! - Each record carries the first byte of `SHA3-256(S)`
//! - The recipient recomputes `S = v·E` and compares that byte
//! - Only matching records pay for the full ownership check
//!
//! ## Efficiency
//!
//! With 1-byte view tags (256 possible values), ~99.6% of foreign records
//! are rejected before any further curve arithmetic.
//!
//! ## Security
//!
//! The tag leaks 8 bits of a hash of the shared secret. That is not enough
//! to link a record to a meta-address.

use claw_core::constants::{HASH_SIZE, VIEW_TAG_SPACE};

/// Returns the view tag for a shared-secret hash `h = SHA3-256(S)`.
pub fn compute_view_tag(shared_hash: &[u8; HASH_SIZE]) -> u8 {
    shared_hash[0]
}

/// View tag distribution tracker.
///
/// Used to check that tags observed in a registry or a benchmark run are
/// spread uniformly.
#[derive(Debug, Clone)]
pub struct ViewTagStats {
    /// Count of each view tag value
    pub distribution: Vec<u64>,
    /// Total number of tags analyzed
    pub total: u64,
}

impl Default for ViewTagStats {
    fn default() -> Self {
        Self {
            distribution: vec![0; VIEW_TAG_SPACE],
            total: 0,
        }
    }
}

impl ViewTagStats {
    /// Creates a new stats tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a view tag.
    pub fn add(&mut self, tag: u8) {
        self.distribution[tag as usize] += 1;
        self.total += 1;
    }

    /// Returns the most common view tag.
    pub fn most_common(&self) -> Option<(u8, u64)> {
        if self.total == 0 {
            return None;
        }
        self.distribution
            .iter()
            .enumerate()
            .max_by_key(|(_, &count)| count)
            .map(|(tag, &count)| (tag as u8, count))
    }

    /// Returns the expected count per tag for a uniform distribution.
    pub fn expected_uniform_count(&self) -> f64 {
        self.total as f64 / VIEW_TAG_SPACE as f64
    }

    /// Computes the chi-squared statistic against the uniform distribution.
    ///
    /// With 255 degrees of freedom, values above ~330 reject uniformity at p = 0.001.
    pub fn chi_squared(&self) -> f64 {
        let expected = self.expected_uniform_count();
        if expected == 0.0 {
            return 0.0;
        }

        self.distribution
            .iter()
            .map(|&observed| {
                let diff = observed as f64 - expected;
                (diff * diff) / expected
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::sha3_256;

    #[test]
    fn test_view_tag_is_first_byte() {
        let h = sha3_256(b"shared secret");
        assert_eq!(compute_view_tag(&h), h[0]);
    }

    #[test]
    fn test_view_tag_distribution_uniform() {
        let mut stats = ViewTagStats::new();
        for i in 0u32..25_600 {
            stats.add(compute_view_tag(&sha3_256(&i.to_le_bytes())));
        }

        assert_eq!(stats.total, 25_600);
        assert!((stats.expected_uniform_count() - 100.0).abs() < f64::EPSILON);
        assert!(stats.chi_squared() < 400.0, "chi2 = {}", stats.chi_squared());
    }

    #[test]
    fn test_most_common_empty() {
        assert!(ViewTagStats::new().most_common().is_none());
    }

    #[test]
    fn test_most_common() {
        let mut stats = ViewTagStats::new();
        stats.add(7);
        stats.add(7);
        stats.add(9);
        assert_eq!(stats.most_common(), Some((7, 2)));
    }
}
