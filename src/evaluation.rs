//! Effectiveness measures against a set of known duplicates.
//!
//! Blocking quality is judged by how many known duplicates still share a block
//! and how much of the brute-force comparison space is left:
//!
//! - *pair completeness* (PC): detected duplicates / known duplicates (recall)
//! - *pair quality* (PQ): detected duplicates / comparisons (precision)
//! - *reduction ratio* (RR): `1 - comparisons / brute-force comparisons`
//!
//! Clusters are judged pairwise: every within-cluster pair is a declared match,
//! giving precision, recall and F1 over the known duplicates.
//!
//! Ratios with a zero denominator are reported as `0.0`.

use std::collections::BTreeSet;

use crate::blocking::{Blocks, CandidatePairs};
use crate::cluster::EquivalenceClusters;
use crate::error::{Error, Result};
use crate::profile::Dataset;

/// Known duplicate pairs of a dataset, in unified profile indices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuplicatePairs {
    pairs: BTreeSet<(usize, usize)>,
    d1_len: usize,
    d2_len: Option<usize>,
}

impl DuplicatePairs {
    /// Validate known duplicates of `dataset`.
    ///
    /// Dirty ER: `(a, b)` are positions in the single collection, in any order.
    /// Clean-clean ER: `a` is a position in the first collection and `b` a
    /// position in the second; `b` is offset into the unified index space.
    pub fn for_dataset(
        dataset: &Dataset,
        pairs: impl IntoIterator<Item = (usize, usize)>,
    ) -> Result<Self> {
        let d1_len = dataset.d1_len();
        let len = dataset.len();
        let mut set = BTreeSet::new();

        for (a, b) in pairs {
            let (left, right) = match dataset.d2_len() {
                Some(d2_len) => {
                    if b >= d2_len {
                        return Err(Error::ProfileOutOfRange {
                            index: d1_len + b,
                            len,
                        });
                    }
                    (a, d1_len + b)
                }
                None => {
                    if a == b {
                        return Err(Error::InvalidDuplicatePair { left: a, right: b });
                    }
                    (a.min(b), a.max(b))
                }
            };
            if left >= d1_len {
                return Err(Error::ProfileOutOfRange { index: left, len });
            }
            if right >= len {
                return Err(Error::ProfileOutOfRange { index: right, len });
            }
            set.insert((left, right));
        }

        Ok(Self {
            pairs: set,
            d1_len,
            d2_len: dataset.d2_len(),
        })
    }

    /// Number of distinct known duplicates.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// True if no duplicates are known.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// True if `{a, b}` (unified indices) is a known duplicate.
    pub fn contains(&self, a: usize, b: usize) -> bool {
        self.pairs.contains(&(a.min(b), a.max(b)))
    }

    /// Known duplicates as `(left, right)` with `left < right`.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.pairs.iter().copied()
    }

    /// Comparisons an exhaustive (non-blocked) run would execute.
    pub fn brute_force_comparisons(&self) -> u64 {
        let n1 = self.d1_len as u64;
        match self.d2_len {
            Some(n2) => n1 * n2 as u64,
            None => n1 * n1.saturating_sub(1) / 2,
        }
    }

    /// Score blocks: a duplicate is detected if both profiles share a block.
    ///
    /// Comparisons are counted per block, redundant ones included.
    pub fn evaluate_blocks(&self, blocks: &Blocks) -> BlockingMeasures {
        let index = blocks.entity_index();
        let empty = Vec::new();
        let detected = self
            .pairs
            .iter()
            .filter(|&&(a, b)| {
                let ba = index.get(a).unwrap_or(&empty);
                let bb = index.get(b).unwrap_or(&empty);
                share_any(ba, bb)
            })
            .count();
        self.blocking_measures(detected, blocks.total_comparisons())
    }

    /// Score deduplicated candidate pairs.
    pub fn evaluate_pairs(&self, pairs: &CandidatePairs) -> BlockingMeasures {
        let detected = self
            .pairs
            .iter()
            .filter(|&&(a, b)| pairs.contains(a, b))
            .count();
        self.blocking_measures(detected, pairs.len() as u64)
    }

    /// Score clusters pairwise.
    ///
    /// For clean-clean ER only cross-collection pairs inside a cluster count as
    /// declared matches.
    pub fn evaluate_clusters(&self, clusters: &EquivalenceClusters) -> ClusteringMeasures {
        let assignments = clusters.assignments();
        let detected = self
            .pairs
            .iter()
            .filter(|(a, b)| {
                matches!((assignments.get(a), assignments.get(b)), (Some(x), Some(y)) if x == y)
            })
            .count();

        let declared: u64 = clusters
            .iter()
            .map(|c| {
                if self.d2_len.is_some() {
                    let first = c.members().iter().filter(|&&m| m < self.d1_len).count() as u64;
                    first * (c.len() as u64 - first)
                } else {
                    let n = c.len() as u64;
                    n * n.saturating_sub(1) / 2
                }
            })
            .sum();

        let precision = ratio(detected as f64, declared as f64);
        let recall = ratio(detected as f64, self.len() as f64);
        ClusteringMeasures {
            existing_duplicates: self.len(),
            detected_duplicates: detected,
            declared_matches: declared,
            precision,
            recall,
            f_measure: harmonic_mean(precision, recall),
        }
    }

    fn blocking_measures(&self, detected: usize, comparisons: u64) -> BlockingMeasures {
        let brute_force = self.brute_force_comparisons();
        BlockingMeasures {
            existing_duplicates: self.len(),
            detected_duplicates: detected,
            comparisons,
            pair_completeness: ratio(detected as f64, self.len() as f64),
            pair_quality: ratio(detected as f64, comparisons as f64),
            reduction_ratio: if brute_force == 0 {
                0.0
            } else {
                1.0 - comparisons as f64 / brute_force as f64
            },
        }
    }
}

/// Quality of a blocking stage's output.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockingMeasures {
    /// Known duplicates.
    pub existing_duplicates: usize,
    /// Known duplicates that remain comparable.
    pub detected_duplicates: usize,
    /// Comparisons left to execute.
    pub comparisons: u64,
    /// Detected / existing duplicates.
    pub pair_completeness: f64,
    /// Detected duplicates / comparisons.
    pub pair_quality: f64,
    /// Share of the brute-force comparisons saved.
    pub reduction_ratio: f64,
}

impl BlockingMeasures {
    /// Harmonic mean of pair completeness and pair quality.
    pub fn f_measure(&self) -> f64 {
        harmonic_mean(self.pair_completeness, self.pair_quality)
    }
}

/// Pairwise quality of equivalence clusters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClusteringMeasures {
    /// Known duplicates.
    pub existing_duplicates: usize,
    /// Known duplicates placed in the same cluster.
    pub detected_duplicates: usize,
    /// Within-cluster pairs declared as matches.
    pub declared_matches: u64,
    /// Detected duplicates / declared matches.
    pub precision: f64,
    /// Detected / existing duplicates.
    pub recall: f64,
    /// Harmonic mean of precision and recall.
    pub f_measure: f64,
}

fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 {
        num / den
    } else {
        0.0
    }
}

fn harmonic_mean(a: f64, b: f64) -> f64 {
    ratio(2.0 * a * b, a + b)
}

/// True if two ascending block lists intersect.
fn share_any(a: &[usize], b: &[usize]) -> bool {
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => return true,
        }
    }
    false
}
