//! Greedy correlation clustering.
//!
//! # The Problem
//!
//! Correlation clustering partitions a signed/weighted graph so that similar
//! pairs end up together and dissimilar pairs apart, minimizing disagreements.
//! The exact problem is NP-hard.
//!
//! # This Heuristic
//!
//! 1. Every node starts as a singleton set (array-backed union-find).
//! 2. Edges are sorted by weight, descending; ties by `(min, max)` endpoint.
//! 3. Edges are processed in that order. At the first edge below the threshold
//!    (or of weight zero) processing stops: all remaining edges are lighter.
//!    Otherwise the two endpoints' sets are merged, unconditionally.
//! 4. Each surviving set is one equivalence cluster.
//!
//! Non-candidate pairs are implicitly negative and never examined, since the
//! graph only contains candidate edges. Unlike exact correlation clustering, the
//! cost of negative edges inside a merged cluster is not weighed.
//!
//! # Determinism
//!
//! The edge order is a total order and union-by-size breaks equal sizes towards
//! the smaller node, so identical input gives identical clusters regardless of
//! rayon's thread count.

use log::debug;

use super::traits::EntityClustering;
use super::types::EquivalenceClusters;
use super::util::{self, DenseNodes, UnionFind};
use crate::error::{Error, Result};
use crate::graph::SimilarityGraph;
use crate::method::MethodInfo;

/// Greedy threshold-based correlation clustering.
#[derive(Debug, Clone, Copy)]
pub struct CorrelationClustering {
    threshold: f64,
}

impl CorrelationClustering {
    /// Create a clusterer; `threshold` must be finite and non-negative.
    ///
    /// With threshold `0.0` (the default) every positive-weight edge merges.
    pub fn new(threshold: f64) -> Result<Self> {
        validate_threshold(threshold)?;
        Ok(Self { threshold })
    }
}

impl Default for CorrelationClustering {
    fn default() -> Self {
        Self { threshold: 0.0 }
    }
}

impl EntityClustering for CorrelationClustering {
    fn cluster(&self, graph: &SimilarityGraph) -> EquivalenceClusters {
        let nodes = DenseNodes::of(graph);
        let mut uf = UnionFind::new(nodes.len());
        let mut merges = 0usize;

        for edge in util::edges_by_weight(graph) {
            if !accepts(edge.weight, self.threshold) {
                break;
            }
            let (a, b) = (nodes.position(edge.left), nodes.position(edge.right));
            let (ra, rb) = (uf.find(a), uf.find(b));
            if ra != rb {
                uf.union_roots(ra, rb);
                merges += 1;
            }
        }

        let clusters = nodes.clusters(&mut uf);
        debug!(
            "correlation clustering: {merges} merges, {} clusters over {} nodes",
            clusters.len(),
            nodes.len()
        );
        clusters
    }

    fn similarity_threshold(&self) -> f64 {
        self.threshold
    }
}

impl MethodInfo for CorrelationClustering {
    fn method_name(&self) -> String {
        "Correlation Clustering".into()
    }

    fn method_configuration(&self) -> String {
        format!("similarity threshold={}", self.threshold)
    }
}

pub(super) fn validate_threshold(threshold: f64) -> Result<()> {
    if !(threshold.is_finite() && threshold >= 0.0) {
        return Err(Error::InvalidParameter {
            name: "threshold",
            message: "must be finite and non-negative",
        });
    }
    Ok(())
}

/// Whether an edge of `weight` may merge under `threshold`.
#[inline]
pub(super) fn accepts(weight: f64, threshold: f64) -> bool {
    weight > 0.0 && weight >= threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups(clusters: &EquivalenceClusters) -> Vec<Vec<usize>> {
        clusters.iter().map(|c| c.members().to_vec()).collect()
    }

    #[test]
    fn merges_above_threshold_only() {
        let g = SimilarityGraph::from_edges([(0, 1, 0.9), (2, 3, 0.3)]).unwrap();
        let c = CorrelationClustering::new(0.5).unwrap().cluster(&g);
        assert_eq!(groups(&c), vec![vec![0, 1], vec![2], vec![3]]);
    }

    #[test]
    fn merges_are_transitive() {
        let g = SimilarityGraph::from_edges([(0, 1, 0.9), (1, 2, 0.8), (3, 4, 0.7)]).unwrap();
        let c = CorrelationClustering::default().cluster(&g);
        assert_eq!(groups(&c), vec![vec![0, 1, 2], vec![3, 4]]);
    }

    #[test]
    fn zero_weight_edges_never_merge() {
        let g = SimilarityGraph::from_edges([(0, 1, 0.0), (1, 2, 0.4)]).unwrap();
        let c = CorrelationClustering::default().cluster(&g);
        assert_eq!(groups(&c), vec![vec![0], vec![1, 2]]);
    }

    #[test]
    fn threshold_is_inclusive() {
        let g = SimilarityGraph::from_edges([(0, 1, 0.5)]).unwrap();
        let c = CorrelationClustering::new(0.5).unwrap().cluster(&g);
        assert_eq!(groups(&c), vec![vec![0, 1]]);
    }

    #[test]
    fn empty_graph_no_clusters() {
        let c = CorrelationClustering::default().cluster(&SimilarityGraph::new());
        assert!(c.is_empty());
    }

    #[test]
    fn rejects_invalid_threshold() {
        assert!(CorrelationClustering::new(-0.1).is_err());
        assert!(CorrelationClustering::new(f64::NAN).is_err());
        assert!(CorrelationClustering::new(f64::INFINITY).is_err());
    }

    #[test]
    fn describes_threshold() {
        let c = CorrelationClustering::new(0.25).unwrap();
        assert_eq!(c.method_configuration(), "similarity threshold=0.25");
        assert_eq!(c.similarity_threshold(), 0.25);
    }
}
