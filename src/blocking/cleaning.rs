//! Block cleaning: block-level reductions of a block collection.
//!
//! | Method | Removes | Idempotent |
//! |---|---|---|
//! | [`SizeBasedPurging`] | blocks above a size cap | yes |
//! | [`RedundantBlockRemoval`] | blocks contained in another block | yes |
//! | [`ComparisonsBasedPurging`] | the most expensive comparison levels | yes |
//! | [`BlockFiltering`] | each profile's largest blocks | no |
//!
//! The default [`BlockCleaningChain`] (size-based purging, then redundant block
//! removal) is idempotent as a whole.

use std::fmt;

use log::debug;

use super::block::{Block, Blocks};
use super::traits::BlockCleaning;
use crate::error::{Error, Result};
use crate::method::MethodInfo;

/// Upper bound on block size for [`SizeBasedPurging`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SizeLimit {
    /// At most this many members.
    Absolute(usize),
    /// At most this fraction of the dataset's profiles, but never below the
    /// purger's minimum size.
    Fraction(f64),
}

/// Discards blocks whose cardinality exceeds a cap.
///
/// Very large blocks usually come from stop-word-like keys: they cost
/// quadratically many comparisons and contribute few duplicates that are not
/// also found in smaller blocks.
#[derive(Debug, Clone, Copy)]
pub struct SizeBasedPurging {
    limit: SizeLimit,
    min_size: usize,
}

/// Blocks this small are never purged by a fractional cap.
const DEFAULT_MIN_SIZE: usize = 10;

impl SizeBasedPurging {
    /// Cap block size at `max_size` members (at least 2).
    pub fn with_max_size(max_size: usize) -> Result<Self> {
        if max_size < 2 {
            return Err(Error::InvalidParameter {
                name: "max_size",
                message: "must be at least 2",
            });
        }
        Ok(Self {
            limit: SizeLimit::Absolute(max_size),
            min_size: 2,
        })
    }

    /// Cap block size at `fraction` of the dataset's profiles; `fraction` in `(0, 1]`.
    ///
    /// The cap never drops below 10 members (see [`with_min_size`](Self::with_min_size)),
    /// so small datasets keep the blocks that hold their duplicates.
    pub fn with_fraction(fraction: f64) -> Result<Self> {
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(Error::InvalidParameter {
                name: "fraction",
                message: "must be in (0, 1]",
            });
        }
        Ok(Self {
            limit: SizeLimit::Fraction(fraction),
            min_size: DEFAULT_MIN_SIZE,
        })
    }

    /// Lower bound for a fractional cap; at least 2.
    ///
    /// Has no effect on an absolute limit.
    pub fn with_min_size(mut self, min_size: usize) -> Self {
        self.min_size = min_size.max(2);
        self
    }

    /// Configured limit.
    pub fn limit(&self) -> SizeLimit {
        self.limit
    }

    /// Largest block size retained for `blocks`.
    pub fn max_block_size(&self, blocks: &Blocks) -> usize {
        match self.limit {
            SizeLimit::Absolute(max) => max,
            SizeLimit::Fraction(f) => {
                ((blocks.num_profiles() as f64 * f).floor() as usize).max(self.min_size)
            }
        }
    }
}

impl Default for SizeBasedPurging {
    fn default() -> Self {
        Self {
            limit: SizeLimit::Fraction(0.5),
            min_size: DEFAULT_MIN_SIZE,
        }
    }
}

impl BlockCleaning for SizeBasedPurging {
    fn clean_blocks(&self, mut blocks: Blocks) -> Blocks {
        let cap = self.max_block_size(&blocks);
        let before = blocks.len();
        blocks.retain(|b| b.size() <= cap);
        debug!(
            "size-based purging: cap {cap}, removed {} of {before} blocks",
            before - blocks.len()
        );
        blocks
    }
}

impl MethodInfo for SizeBasedPurging {
    fn method_name(&self) -> String {
        "Size-based Block Purging".into()
    }

    fn method_configuration(&self) -> String {
        match self.limit {
            SizeLimit::Absolute(max) => format!("max block size={max}"),
            SizeLimit::Fraction(f) => {
                format!("purging fraction={f}, min block size={}", self.min_size)
            }
        }
    }
}

/// Removes every block whose members are all contained in another block.
///
/// Such a block only generates comparisons its superset already generates, so
/// removing it costs no recall. Of several blocks with identical membership the
/// first one is kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct RedundantBlockRemoval;

impl RedundantBlockRemoval {
    /// Create the cleaner.
    pub fn new() -> Self {
        Self
    }
}

impl BlockCleaning for RedundantBlockRemoval {
    fn clean_blocks(&self, mut blocks: Blocks) -> Blocks {
        let n = blocks.len();
        // Supersets are strictly larger, or equal and earlier: visit them first.
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| blocks[b].size().cmp(&blocks[a].size()).then(a.cmp(&b)));

        let mut keep = vec![false; n];
        let mut kept_by_profile: Vec<Vec<usize>> = vec![Vec::new(); blocks.index_bound()];

        for &b in &order {
            let block = &blocks[b];
            let Some(first) = block.members().next() else {
                continue;
            };
            let subsumed = kept_by_profile[first]
                .iter()
                .any(|&k| block.members().all(|m| blocks[k].contains(m)));
            if subsumed {
                continue;
            }
            keep[b] = true;
            for m in block.members() {
                kept_by_profile[m].push(b);
            }
        }

        blocks.retain_flagged(&keep);
        debug!(
            "redundant block removal: removed {} of {n} blocks",
            n - blocks.len()
        );
        blocks
    }
}

impl MethodInfo for RedundantBlockRemoval {
    fn method_name(&self) -> String {
        "Redundant Block Removal".into()
    }

    fn method_configuration(&self) -> String {
        String::new()
    }
}

/// Purges the blocks with the largest comparison counts.
///
/// Blocks are grouped into levels by comparison count. Walking from the most
/// expensive level down, levels are dropped while the cumulative ratio of
/// comparisons to block assignments still grows by more than the smoothing
/// factor from one level to the next.
#[derive(Debug, Clone, Copy)]
pub struct ComparisonsBasedPurging {
    smoothing_factor: f64,
}

struct Level {
    comparisons: u64,
    assignments: f64,
    cumulative_comparisons: f64,
}

impl ComparisonsBasedPurging {
    /// Create the cleaner; `smoothing_factor` must be finite and at least 1.
    pub fn new(smoothing_factor: f64) -> Result<Self> {
        if !(smoothing_factor.is_finite() && smoothing_factor >= 1.0) {
            return Err(Error::InvalidParameter {
                name: "smoothing_factor",
                message: "must be finite and >= 1",
            });
        }
        Ok(Self { smoothing_factor })
    }

    /// Largest per-block comparison count that survives, or `None` to keep all.
    pub fn max_comparisons(&self, blocks: &Blocks) -> Option<u64> {
        let mut stats: Vec<(u64, usize)> =
            blocks.iter().map(|b| (b.comparisons(), b.size())).collect();
        stats.sort_unstable();

        let mut levels: Vec<Level> = Vec::new();
        let (mut assignments, mut comparisons) = (0.0, 0.0);
        for (c, size) in stats {
            assignments += size as f64;
            comparisons += c as f64;
            match levels.last_mut() {
                Some(last) if last.comparisons == c => {
                    last.assignments = assignments;
                    last.cumulative_comparisons = comparisons;
                }
                _ => levels.push(Level {
                    comparisons: c,
                    assignments,
                    cumulative_comparisons: comparisons,
                }),
            }
        }

        if levels.len() < 2 {
            return None;
        }

        // ratio(upper) <= s * ratio(lower), cross-multiplied.
        for pair in levels.windows(2).rev() {
            let (lower, upper) = (&pair[0], &pair[1]);
            if upper.cumulative_comparisons * lower.assignments
                <= self.smoothing_factor * lower.cumulative_comparisons * upper.assignments
            {
                return Some(upper.comparisons);
            }
        }
        Some(levels[0].comparisons)
    }
}

impl Default for ComparisonsBasedPurging {
    fn default() -> Self {
        Self {
            smoothing_factor: 1.025,
        }
    }
}

impl BlockCleaning for ComparisonsBasedPurging {
    fn clean_blocks(&self, mut blocks: Blocks) -> Blocks {
        if let Some(max) = self.max_comparisons(&blocks) {
            let before = blocks.len();
            blocks.retain(|b| b.comparisons() <= max);
            debug!(
                "comparisons-based purging: max {max} comparisons per block, removed {} of {before} blocks",
                before - blocks.len()
            );
        }
        blocks
    }
}

impl MethodInfo for ComparisonsBasedPurging {
    fn method_name(&self) -> String {
        "Comparison-based Block Purging".into()
    }

    fn method_configuration(&self) -> String {
        format!("smoothing factor={}", self.smoothing_factor)
    }
}

/// Keeps every profile only in the smallest `round(ratio * n)` of its `n` blocks.
///
/// Unlike the purging methods this shrinks block membership rather than dropping
/// whole blocks. Blocks left without comparisons are removed.
#[derive(Debug, Clone, Copy)]
pub struct BlockFiltering {
    ratio: f64,
}

impl BlockFiltering {
    /// Create the cleaner; `ratio` must lie in `[0, 1]`.
    pub fn new(ratio: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&ratio) {
            return Err(Error::InvalidParameter {
                name: "ratio",
                message: "must be in [0, 1]",
            });
        }
        Ok(Self { ratio })
    }

    /// Configured filtering ratio.
    pub fn ratio(&self) -> f64 {
        self.ratio
    }
}

impl Default for BlockFiltering {
    fn default() -> Self {
        Self { ratio: 0.8 }
    }
}

impl BlockCleaning for BlockFiltering {
    fn clean_blocks(&self, mut blocks: Blocks) -> Blocks {
        let bound = blocks.index_bound();
        let mut limits = vec![0usize; bound];
        for m in blocks.iter().flat_map(Block::members) {
            limits[m] += 1;
        }
        for limit in &mut limits {
            *limit = (self.ratio * *limit as f64).round() as usize;
        }

        let mut order: Vec<usize> = (0..blocks.len()).collect();
        order.sort_by_key(|&b| (blocks[b].comparisons(), b));

        let mut assigned = vec![0usize; bound];
        let slots = blocks.blocks_mut();
        for b in order {
            slots[b].retain_members(|m| {
                if assigned[m] < limits[m] {
                    assigned[m] += 1;
                    true
                } else {
                    false
                }
            });
        }

        let before = blocks.len();
        blocks.retain(|b| b.comparisons() > 0);
        debug!(
            "block filtering: ratio {}, {} of {before} blocks left",
            self.ratio,
            blocks.len()
        );
        blocks
    }
}

impl MethodInfo for BlockFiltering {
    fn method_name(&self) -> String {
        "Block Filtering".into()
    }

    fn method_configuration(&self) -> String {
        format!("ratio={}", self.ratio)
    }
}

/// Several cleaners applied in sequence.
pub struct BlockCleaningChain {
    stages: Vec<Box<dyn BlockCleaning>>,
}

impl BlockCleaningChain {
    /// An empty chain (a no-op).
    pub fn empty() -> Self {
        Self { stages: Vec::new() }
    }

    /// Append a stage.
    pub fn then(mut self, stage: impl BlockCleaning + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// True if the chain has no stages.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl Default for BlockCleaningChain {
    fn default() -> Self {
        Self::empty()
            .then(SizeBasedPurging::default())
            .then(RedundantBlockRemoval)
    }
}

impl fmt::Debug for BlockCleaningChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.stages.iter().map(|s| s.method_name()))
            .finish()
    }
}

impl BlockCleaning for BlockCleaningChain {
    fn clean_blocks(&self, blocks: Blocks) -> Blocks {
        self.stages
            .iter()
            .fold(blocks, |blocks, stage| stage.clean_blocks(blocks))
    }
}

impl MethodInfo for BlockCleaningChain {
    fn method_name(&self) -> String {
        self.stages
            .iter()
            .map(|s| s.method_name())
            .collect::<Vec<_>>()
            .join("->")
    }

    fn method_configuration(&self) -> String {
        self.stages
            .iter()
            .map(|s| s.method_configuration())
            .filter(|c| !c.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
