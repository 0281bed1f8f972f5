//! Unique mapping clustering for clean-clean ER.
//!
//! When both collections are duplicate-free, every profile matches at most one
//! profile of the other collection. Edges are visited heaviest first (same order
//! as [`CorrelationClustering`](super::CorrelationClustering)) and an edge pairs
//! its endpoints only if neither is already paired.

use log::debug;

use super::correlation::{accepts, validate_threshold};
use super::traits::EntityClustering;
use super::types::EquivalenceClusters;
use super::util::{self, DenseNodes, UnionFind};
use crate::error::Result;
use crate::graph::SimilarityGraph;
use crate::method::MethodInfo;

/// Greedy one-to-one matching; clusters have at most two members.
#[derive(Debug, Clone, Copy)]
pub struct UniqueMappingClustering {
    threshold: f64,
}

impl UniqueMappingClustering {
    /// Create a clusterer; `threshold` must be finite and non-negative.
    pub fn new(threshold: f64) -> Result<Self> {
        validate_threshold(threshold)?;
        Ok(Self { threshold })
    }
}

impl Default for UniqueMappingClustering {
    fn default() -> Self {
        Self { threshold: 0.0 }
    }
}

impl EntityClustering for UniqueMappingClustering {
    fn cluster(&self, graph: &SimilarityGraph) -> EquivalenceClusters {
        let nodes = DenseNodes::of(graph);
        let mut uf = UnionFind::new(nodes.len());
        let mut matched = vec![false; nodes.len()];
        let mut pairs = 0usize;

        for edge in util::edges_by_weight(graph) {
            if !accepts(edge.weight, self.threshold) {
                break;
            }
            let (a, b) = (nodes.position(edge.left), nodes.position(edge.right));
            if matched[a] || matched[b] {
                continue;
            }
            matched[a] = true;
            matched[b] = true;
            uf.union(a, b);
            pairs += 1;
        }

        debug!("unique mapping clustering: {pairs} pairs over {} nodes", nodes.len());
        nodes.clusters(&mut uf)
    }

    fn similarity_threshold(&self) -> f64 {
        self.threshold
    }
}

impl MethodInfo for UniqueMappingClustering {
    fn method_name(&self) -> String {
        "Unique Mapping Clustering".into()
    }

    fn method_configuration(&self) -> String {
        format!("similarity threshold={}", self.threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_profile_matched_once() {
        // 0 and 1 both prefer 2; 0-2 is heavier, so 1 falls back to 3.
        let g = SimilarityGraph::from_edges([(0, 2, 0.9), (1, 2, 0.8), (1, 3, 0.6), (0, 3, 0.5)])
            .unwrap();
        let c = UniqueMappingClustering::default().cluster(&g);
        let groups: Vec<Vec<usize>> = c.iter().map(|c| c.members().to_vec()).collect();
        assert_eq!(groups, vec![vec![0, 2], vec![1, 3]]);
    }

    #[test]
    fn below_threshold_stays_single() {
        let g = SimilarityGraph::from_edges([(0, 2, 0.9), (1, 3, 0.2)]).unwrap();
        let c = UniqueMappingClustering::new(0.5).unwrap().cluster(&g);
        assert_eq!(c.len(), 3);
        assert!(c.iter().all(|c| c.len() <= 2));
    }
}
