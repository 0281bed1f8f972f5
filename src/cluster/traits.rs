use super::types::EquivalenceClusters;
use crate::graph::SimilarityGraph;
use crate::method::MethodInfo;

/// Common interface for entity clustering over a similarity graph.
pub trait EntityClustering: MethodInfo + Send + Sync {
    /// Partition the nodes of `graph` into equivalence clusters.
    ///
    /// Every node of the graph appears in exactly one cluster; an empty graph
    /// yields no clusters.
    fn cluster(&self, graph: &SimilarityGraph) -> EquivalenceClusters;

    /// Edges weighted below this value never cause a merge.
    fn similarity_threshold(&self) -> f64;
}
