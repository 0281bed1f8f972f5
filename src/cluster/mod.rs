//! Entity clustering: from a similarity graph to equivalence clusters.
//!
//! A [`SimilarityGraph`](crate::SimilarityGraph) only says which candidate pairs
//! look alike. Clustering turns that pairwise evidence into a *partition*: every
//! graph node lands in exactly one [`EquivalenceCluster`], and each cluster is
//! asserted to be one real-world entity.
//!
//! ## Algorithms (implemented)
//!
//! ### Correlation clustering
//!
//! Greedy edge-based merging in descending weight order, stopping at a
//! similarity threshold. Suited to dirty ER, where a cluster may hold any number
//! of duplicates. See [`CorrelationClustering`].
//!
//! ### Unique mapping clustering
//!
//! Greedy one-to-one matching for clean-clean ER, where each profile has at most
//! one counterpart in the other collection. See [`UniqueMappingClustering`].
//!
//! ## Usage
//!
//! ```rust
//! use erlink::cluster::{CorrelationClustering, EntityClustering};
//! use erlink::SimilarityGraph;
//!
//! let graph = SimilarityGraph::from_edges([(0, 1, 0.9), (2, 3, 0.3)]).unwrap();
//! let clusters = CorrelationClustering::new(0.5).unwrap().cluster(&graph);
//!
//! assert_eq!(clusters.len(), 3);
//! assert_eq!(clusters.cluster_of(0), clusters.cluster_of(1));
//! assert_ne!(clusters.cluster_of(2), clusters.cluster_of(3));
//! ```

mod correlation;
mod traits;
mod types;
mod unique_mapping;
mod util;

pub use correlation::CorrelationClustering;
pub use traits::EntityClustering;
pub use types::{EquivalenceCluster, EquivalenceClusters};
pub use unique_mapping::UniqueMappingClustering;
