//! Comparison cleaning (meta-blocking).
//!
//! The blocks are viewed as a *blocking graph*: one node per profile, one edge
//! per distinct co-blocked pair. Every edge gets a co-occurrence weight from a
//! [`WeightingScheme`], then a [`PruningAlgorithm`] discards the edges least
//! likely to be duplicates. Redundant comparisons (pairs sharing several blocks)
//! disappear as a side effect, since each pair is one edge.
//!
//! The pruning cutoff is the main precision/recall knob of the whole pipeline:
//! a stricter cutoff drops true duplicates, a laxer one leaves more work for the
//! matcher.

use std::collections::BTreeMap;

use log::debug;
use rayon::prelude::*;

use super::block::Blocks;
use super::traits::ComparisonCleaning;
use crate::error::{Error, Result};
use crate::method::MethodInfo;

// Weights are float sums; a pair exactly at the mean must survive rounding.
const CUTOFF_TOLERANCE: f64 = 1e-9;

/// A candidate pair with its co-occurrence weight. `left < right`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Comparison {
    /// Smaller profile index.
    pub left: usize,
    /// Larger profile index.
    pub right: usize,
    /// Co-occurrence weight assigned by comparison cleaning.
    pub weight: f64,
}

impl Comparison {
    /// Create a comparison, ordering the endpoints.
    pub fn new(a: usize, b: usize, weight: f64) -> Self {
        let (left, right) = if a <= b { (a, b) } else { (b, a) };
        Self {
            left,
            right,
            weight,
        }
    }
}

/// Distinct candidate pairs, sorted by `(left, right)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidatePairs {
    comparisons: Vec<Comparison>,
}

impl CandidatePairs {
    /// Collect comparisons; later duplicates of a pair are dropped and self-pairs ignored.
    pub fn new(comparisons: impl IntoIterator<Item = Comparison>) -> Self {
        let mut comparisons: Vec<Comparison> = comparisons
            .into_iter()
            .map(|c| Comparison::new(c.left, c.right, c.weight))
            .filter(|c| c.left != c.right)
            .collect();
        comparisons.sort_by_key(|c| (c.left, c.right));
        comparisons.dedup_by_key(|c| (c.left, c.right));
        Self { comparisons }
    }

    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.comparisons.len()
    }

    /// True if there are no pairs.
    pub fn is_empty(&self) -> bool {
        self.comparisons.is_empty()
    }

    /// Pairs in `(left, right)` order.
    pub fn iter(&self) -> std::slice::Iter<'_, Comparison> {
        self.comparisons.iter()
    }

    /// Pairs as a slice.
    pub fn as_slice(&self) -> &[Comparison] {
        &self.comparisons
    }

    /// Unweighted `(left, right)` pairs.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.comparisons.iter().map(|c| (c.left, c.right))
    }

    /// True if the (unordered) pair is present.
    pub fn contains(&self, a: usize, b: usize) -> bool {
        let key = if a <= b { (a, b) } else { (b, a) };
        self.comparisons
            .binary_search_by_key(&key, |c| (c.left, c.right))
            .is_ok()
    }
}

impl<'a> IntoIterator for &'a CandidatePairs {
    type Item = &'a Comparison;
    type IntoIter = std::slice::Iter<'a, Comparison>;

    fn into_iter(self) -> Self::IntoIter {
        self.comparisons.iter()
    }
}

/// How strongly two profiles co-occur in the blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WeightingScheme {
    /// Aggregate reciprocal comparisons: Σ over common blocks of `1 / comparisons(b)`.
    /// Small blocks are stronger evidence than large ones.
    #[default]
    Arcs,
    /// Common blocks: how many blocks contain both profiles.
    Cbs,
    /// Enhanced common blocks: CBS scaled by how selective each profile's block list is.
    Ecbs,
    /// Jaccard similarity of the two profiles' block lists.
    Js,
}

impl WeightingScheme {
    fn label(self) -> &'static str {
        match self {
            WeightingScheme::Arcs => "ARCS",
            WeightingScheme::Cbs => "CBS",
            WeightingScheme::Ecbs => "ECBS",
            WeightingScheme::Js => "JS",
        }
    }
}

/// Which weighted pairs survive.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PruningAlgorithm {
    /// Keep every distinct pair; only removes redundant comparisons.
    ComparisonPropagation,
    /// Keep pairs with weight at least `mean + k * stddev` of all pair weights.
    WeightedEdgePruning {
        /// Standard deviations above the mean.
        k: f64,
    },
    /// Keep, for every profile, its `max(1, ⌊assignments / profiles⌋)` heaviest pairs.
    CardinalityNodePruning {
        /// Require both endpoints to keep the pair instead of either.
        reciprocal: bool,
    },
}

impl Default for PruningAlgorithm {
    fn default() -> Self {
        PruningAlgorithm::WeightedEdgePruning { k: 0.0 }
    }
}

/// Weighted comparison cleaning over the blocking graph.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetaBlocking {
    weighting: WeightingScheme,
    pruning: PruningAlgorithm,
}

impl MetaBlocking {
    /// Combine a weighting scheme with a pruning algorithm.
    pub fn new(weighting: WeightingScheme, pruning: PruningAlgorithm) -> Result<Self> {
        if let PruningAlgorithm::WeightedEdgePruning { k } = pruning {
            if !k.is_finite() {
                return Err(Error::InvalidParameter {
                    name: "k",
                    message: "must be finite",
                });
            }
        }
        Ok(Self { weighting, pruning })
    }

    /// Keep every distinct co-blocked pair (weights are still reported).
    pub fn comparison_propagation() -> Self {
        Self {
            weighting: WeightingScheme::Cbs,
            pruning: PruningAlgorithm::ComparisonPropagation,
        }
    }

    /// Configured weighting scheme.
    pub fn weighting(&self) -> WeightingScheme {
        self.weighting
    }

    /// Configured pruning algorithm.
    pub fn pruning(&self) -> PruningAlgorithm {
        self.pruning
    }

    fn upper_pairs(&self, graph: &BlockingGraph<'_>) -> Vec<Comparison> {
        (0..graph.profiles())
            .into_par_iter()
            .map_init(
                || Scratch::new(graph.profiles()),
                |scratch, i| {
                    graph
                        .neighbours(i, self.weighting, scratch)
                        .into_iter()
                        .filter(|&(j, _)| j > i)
                        .map(|(j, w)| Comparison::new(i, j, w))
                        .collect::<Vec<_>>()
                },
            )
            .flatten_iter()
            .collect()
    }

    fn weighted_edge_pruning(&self, graph: &BlockingGraph<'_>, k: f64) -> Vec<Comparison> {
        let pairs = self.upper_pairs(graph);
        if pairs.is_empty() {
            return pairs;
        }
        let n = pairs.len() as f64;
        let mean = pairs.iter().map(|c| c.weight).sum::<f64>() / n;
        let variance = pairs.iter().map(|c| (c.weight - mean).powi(2)).sum::<f64>() / n;
        let cutoff = mean + k * variance.sqrt();
        debug!("weighted edge pruning: mean {mean:.6}, cutoff {cutoff:.6} over {} pairs", pairs.len());

        let tolerance = CUTOFF_TOLERANCE * cutoff.abs().max(1.0);
        pairs
            .into_iter()
            .filter(|c| c.weight + tolerance >= cutoff)
            .collect()
    }

    fn cardinality_node_pruning(&self, graph: &BlockingGraph<'_>, reciprocal: bool) -> Vec<Comparison> {
        let profiles = graph.blocks.num_profiles();
        if profiles == 0 {
            return Vec::new();
        }
        let k = (graph.blocks.block_assignments() / profiles).max(1);
        debug!("cardinality node pruning: top {k} pairs per profile");

        let top: Vec<Vec<(usize, f64)>> = (0..graph.profiles())
            .into_par_iter()
            .map_init(
                || Scratch::new(graph.profiles()),
                |scratch, i| {
                    let mut neighbours = graph.neighbours(i, self.weighting, scratch);
                    neighbours.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
                    neighbours.truncate(k);
                    neighbours
                },
            )
            .collect();

        let mut votes: BTreeMap<(usize, usize), (f64, u8)> = BTreeMap::new();
        for (i, kept) in top.into_iter().enumerate() {
            for (j, w) in kept {
                let key = if i < j { (i, j) } else { (j, i) };
                votes.entry(key).or_insert((w, 0)).1 += 1;
            }
        }
        let required = if reciprocal { 2 } else { 1 };
        votes
            .into_iter()
            .filter(|(_, (_, count))| *count >= required)
            .map(|((a, b), (w, _))| Comparison::new(a, b, w))
            .collect()
    }
}

impl ComparisonCleaning for MetaBlocking {
    fn clean_comparisons(&self, blocks: &Blocks) -> CandidatePairs {
        let graph = BlockingGraph::new(blocks);
        let kept = match self.pruning {
            PruningAlgorithm::ComparisonPropagation => self.upper_pairs(&graph),
            PruningAlgorithm::WeightedEdgePruning { k } => self.weighted_edge_pruning(&graph, k),
            PruningAlgorithm::CardinalityNodePruning { reciprocal } => {
                self.cardinality_node_pruning(&graph, reciprocal)
            }
        };
        debug!(
            "{}: retained {} of {} block comparisons",
            self.method_name(),
            kept.len(),
            blocks.total_comparisons()
        );
        CandidatePairs::new(kept)
    }
}

impl MethodInfo for MetaBlocking {
    fn method_name(&self) -> String {
        match self.pruning {
            PruningAlgorithm::ComparisonPropagation => "Comparison Propagation".into(),
            PruningAlgorithm::WeightedEdgePruning { .. } => "Weighted Edge Pruning".into(),
            PruningAlgorithm::CardinalityNodePruning { reciprocal: false } => {
                "Cardinality Node Pruning".into()
            }
            PruningAlgorithm::CardinalityNodePruning { reciprocal: true } => {
                "Reciprocal Cardinality Node Pruning".into()
            }
        }
    }

    fn method_configuration(&self) -> String {
        match self.pruning {
            PruningAlgorithm::WeightedEdgePruning { k } => {
                format!("weighting={}, k={k}", self.weighting.label())
            }
            _ => format!("weighting={}", self.weighting.label()),
        }
    }
}

/// Per-thread accumulators reused across profiles.
struct Scratch {
    common: Vec<u32>,
    arcs: Vec<f64>,
    touched: Vec<usize>,
}

impl Scratch {
    fn new(n: usize) -> Self {
        Self {
            common: vec![0; n],
            arcs: vec![0.0; n],
            touched: Vec::new(),
        }
    }
}

struct BlockingGraph<'a> {
    blocks: &'a Blocks,
    entity_blocks: Vec<Vec<usize>>,
    reciprocal_comparisons: Vec<f64>,
}

impl<'a> BlockingGraph<'a> {
    fn new(blocks: &'a Blocks) -> Self {
        let reciprocal_comparisons = blocks
            .iter()
            .map(|b| match b.comparisons() {
                0 => 0.0,
                c => 1.0 / c as f64,
            })
            .collect();
        Self {
            blocks,
            entity_blocks: blocks.entity_index(),
            reciprocal_comparisons,
        }
    }

    fn profiles(&self) -> usize {
        self.entity_blocks.len()
    }

    /// Weighted neighbours of `i`, sorted by index.
    ///
    /// Common blocks are visited in ascending block order from either endpoint,
    /// so `weight(i, j)` and `weight(j, i)` are bit-identical.
    fn neighbours(&self, i: usize, scheme: WeightingScheme, s: &mut Scratch) -> Vec<(usize, f64)> {
        for &b in &self.entity_blocks[i] {
            let block = &self.blocks[b];
            let partners: &[usize] = match block.d2() {
                Some(d2) if block.d1().binary_search(&i).is_ok() => d2,
                Some(_) => block.d1(),
                None => block.d1(),
            };
            for &j in partners {
                if j == i {
                    continue;
                }
                if s.common[j] == 0 {
                    s.touched.push(j);
                }
                s.common[j] += 1;
                s.arcs[j] += self.reciprocal_comparisons[b];
            }
        }

        s.touched.sort_unstable();
        let total_blocks = self.blocks.len() as f64;
        let blocks_i = self.entity_blocks[i].len() as f64;
        let out = s
            .touched
            .iter()
            .map(|&j| {
                let common = f64::from(s.common[j]);
                let blocks_j = self.entity_blocks[j].len() as f64;
                let w = match scheme {
                    WeightingScheme::Arcs => s.arcs[j],
                    WeightingScheme::Cbs => common,
                    WeightingScheme::Ecbs => {
                        common * (total_blocks / blocks_i).ln() * (total_blocks / blocks_j).ln()
                    }
                    WeightingScheme::Js => common / (blocks_i + blocks_j - common),
                };
                (j, w)
            })
            .collect();

        for &j in &s.touched {
            s.common[j] = 0;
            s.arcs[j] = 0.0;
        }
        s.touched.clear();
        out
    }
}
