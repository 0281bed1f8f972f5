//! Entity resolution without all-pairs comparison.
//!
//! `erlink` finds profiles that describe the same real-world entity, either
//! within one collection (dirty ER) or across two duplicate-free collections
//! (clean-clean ER).
//!
//! The pipeline:
//! - [`blocking`]: block building, block cleaning and meta-blocking reduce the
//!   quadratic comparison space to a set of weighted candidate pairs
//! - [`matching`]: a pluggable scorer turns candidate pairs into a [`SimilarityGraph`]
//! - [`cluster`]: greedy correlation clustering partitions the graph into
//!   [`EquivalenceClusters`]
//!
//! [`Workflow`] runs all of it with sensible defaults; [`evaluation`] scores
//! each stage against known duplicates.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod blocking;
pub mod cluster;
pub mod error;
pub mod evaluation;
pub mod graph;
pub mod matching;
pub mod method;
pub mod profile;
pub mod workflow;

pub use cluster::{
    CorrelationClustering, EntityClustering, EquivalenceCluster, EquivalenceClusters,
    UniqueMappingClustering,
};
pub use error::{Error, Result};
pub use evaluation::{BlockingMeasures, ClusteringMeasures, DuplicatePairs};
pub use graph::{Edge, SimilarityGraph};
pub use method::MethodInfo;
pub use profile::{Attribute, Dataset, EntityProfile};
pub use workflow::{Resolution, RunStats, Stage, StageReport, Workflow};
