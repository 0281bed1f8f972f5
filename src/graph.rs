//! Sparse weighted similarity graph over candidate pairs.
//!
//! Nodes are the profile indices that appear in at least one edge. An absent
//! edge means the pair was never a candidate, which is different from a
//! candidate pair scored `0.0`.

use std::collections::{BTreeSet, HashMap};

use crate::error::{Error, Result};

/// A weighted undirected edge. `left < right`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Edge {
    /// Smaller endpoint.
    pub left: usize,
    /// Larger endpoint.
    pub right: usize,
    /// Similarity weight (finite, non-negative).
    pub weight: f64,
}

/// Similarity graph built incrementally by entity matching.
#[derive(Debug, Clone, Default)]
pub struct SimilarityGraph {
    edges: Vec<Edge>,
    index: HashMap<(usize, usize), usize>,
    nodes: BTreeSet<usize>,
}

impl SimilarityGraph {
    /// An empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty graph with room for `edges` edges.
    pub fn with_capacity(edges: usize) -> Self {
        Self {
            edges: Vec::with_capacity(edges),
            index: HashMap::with_capacity(edges),
            nodes: BTreeSet::new(),
        }
    }

    /// Build a graph from `(a, b, weight)` triples.
    pub fn from_edges(edges: impl IntoIterator<Item = (usize, usize, f64)>) -> Result<Self> {
        let mut graph = Self::new();
        for (a, b, w) in edges {
            graph.insert(a, b, w)?;
        }
        Ok(graph)
    }

    /// Add the edge `{a, b}`.
    ///
    /// Returns `false` (leaving the stored weight untouched) if the edge already exists.
    pub fn insert(&mut self, a: usize, b: usize, weight: f64) -> Result<bool> {
        if a == b {
            return Err(Error::SelfLoop(a));
        }
        let (left, right) = if a < b { (a, b) } else { (b, a) };
        if !weight.is_finite() || weight < 0.0 {
            return Err(Error::InvalidWeight {
                left,
                right,
                weight,
            });
        }
        if self.index.contains_key(&(left, right)) {
            return Ok(false);
        }
        self.index.insert((left, right), self.edges.len());
        self.edges.push(Edge {
            left,
            right,
            weight,
        });
        self.nodes.insert(left);
        self.nodes.insert(right);
        Ok(true)
    }

    /// Weight of `{a, b}`, if the pair is an edge.
    pub fn weight(&self, a: usize, b: usize) -> Option<f64> {
        let key = if a < b { (a, b) } else { (b, a) };
        self.index.get(&key).map(|&i| self.edges[i].weight)
    }

    /// True if `{a, b}` is an edge.
    pub fn contains_edge(&self, a: usize, b: usize) -> bool {
        self.weight(a, b).is_some()
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Nodes in ascending order.
    pub fn nodes(&self) -> impl Iterator<Item = usize> + '_ {
        self.nodes.iter().copied()
    }

    /// True if `node` is an endpoint of some edge.
    pub fn contains_node(&self, node: usize) -> bool {
        self.nodes.contains(&node)
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// True if the graph has no edges (and hence no nodes).
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_orders_endpoints_and_tracks_nodes() {
        let mut g = SimilarityGraph::new();
        assert!(g.insert(5, 2, 0.4).unwrap());
        assert_eq!(g.edges()[0].left, 2);
        assert_eq!(g.weight(2, 5), Some(0.4));
        assert_eq!(g.weight(5, 2), Some(0.4));
        assert_eq!(g.nodes().collect::<Vec<_>>(), vec![2, 5]);
    }

    #[test]
    fn duplicate_edges_are_ignored() {
        let mut g = SimilarityGraph::new();
        g.insert(0, 1, 0.9).unwrap();
        assert!(!g.insert(1, 0, 0.1).unwrap());
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.weight(0, 1), Some(0.9));
    }

    #[test]
    fn zero_weight_is_an_edge() {
        let g = SimilarityGraph::from_edges([(0, 1, 0.0)]).unwrap();
        assert!(g.contains_edge(0, 1));
        assert!(!g.contains_edge(0, 2));
        assert_eq!(g.node_count(), 2);
    }

    #[test]
    fn rejects_self_loops_and_bad_weights() {
        let mut g = SimilarityGraph::new();
        assert!(matches!(g.insert(3, 3, 0.5), Err(Error::SelfLoop(3))));
        assert!(g.insert(0, 1, -0.1).is_err());
        assert!(g.insert(0, 1, f64::NAN).is_err());
        assert!(g.insert(0, 1, f64::INFINITY).is_err());
        assert!(g.is_empty());
    }
}
