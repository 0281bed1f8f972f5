use super::block::Blocks;
use super::meta::CandidatePairs;
use crate::method::MethodInfo;
use crate::profile::Dataset;

/// Groups profiles into blocks so that only co-blocked profiles are compared.
pub trait BlockBuilding: MethodInfo + Send + Sync {
    /// Build blocks over every profile of `dataset`.
    fn build_blocks(&self, dataset: &Dataset) -> Blocks;
}

/// Removes blocks or shrinks their membership. Never adds candidate pairs.
pub trait BlockCleaning: MethodInfo + Send + Sync {
    /// Reduce `blocks`.
    fn clean_blocks(&self, blocks: Blocks) -> Blocks;
}

/// Prunes individual candidate pairs using statistics across all blocks.
pub trait ComparisonCleaning: MethodInfo + Send + Sync {
    /// Distinct, weighted candidate pairs retained from `blocks`.
    fn clean_comparisons(&self, blocks: &Blocks) -> CandidatePairs;
}
