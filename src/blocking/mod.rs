//! Candidate generation: block building, block cleaning and comparison cleaning.
//!
//! ## Why blocking
//!
//! Comparing every profile with every other costs `n(n-1)/2` similarity
//! evaluations. Blocking places profiles that share a cheap-to-compute key
//! (a token, a q-gram) into the same block, and only co-blocked profiles are
//! compared. Blocking is **recall oriented**: any duplicate pair sharing at least
//! one key is co-located in some block.
//!
//! ## Stages
//!
//! 1. [`BlockBuilding`]: [`StandardBlocking`] (one block per token) or
//!    [`QGramsBlocking`] (one block per character q-gram).
//! 2. [`BlockCleaning`]: block-level reductions: [`SizeBasedPurging`],
//!    [`RedundantBlockRemoval`], [`ComparisonsBasedPurging`], [`BlockFiltering`],
//!    composed with [`BlockCleaningChain`].
//! 3. [`ComparisonCleaning`]: pair-level pruning over the blocking graph with
//!    [`MetaBlocking`]; the output is a deduplicated, weighted [`CandidatePairs`].
//!
//! Every stage only ever removes candidate pairs; none introduces a pair that the
//! previous stage's blocks did not imply.
//!
//! ## Usage
//!
//! ```rust
//! use erlink::blocking::{
//!     BlockBuilding, BlockCleaning, BlockCleaningChain, ComparisonCleaning, MetaBlocking,
//!     StandardBlocking,
//! };
//! use erlink::{Dataset, EntityProfile};
//!
//! let profiles = vec![
//!     EntityProfile::new(0).with_attribute("name", "Ada Lovelace"),
//!     EntityProfile::new(1).with_attribute("name", "A. Lovelace"),
//!     EntityProfile::new(2).with_attribute("name", "Alan Turing"),
//! ];
//! let dataset = Dataset::dirty(profiles).unwrap();
//!
//! let blocks = StandardBlocking::new().build_blocks(&dataset);
//! let blocks = BlockCleaningChain::default().clean_blocks(blocks);
//! let pairs = MetaBlocking::default().clean_comparisons(&blocks);
//!
//! assert!(pairs.contains(0, 1));
//! assert!(!pairs.contains(0, 2));
//! ```

mod block;
mod building;
mod cleaning;
mod meta;
mod traits;

pub use block::{Block, Blocks};
pub use building::{QGramsBlocking, StandardBlocking};
pub use cleaning::{
    BlockCleaningChain, BlockFiltering, ComparisonsBasedPurging, RedundantBlockRemoval,
    SizeBasedPurging, SizeLimit,
};
pub use meta::{CandidatePairs, Comparison, MetaBlocking, PruningAlgorithm, WeightingScheme};
pub use traits::{BlockBuilding, BlockCleaning, ComparisonCleaning};
