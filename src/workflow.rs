//! End-to-end resolution: blocking, matching and clustering in one run.
//!
//! A [`Workflow`] owns one implementation per stage and threads an explicit
//! [`RunStats`] through them. Each stage logs its method descriptor and output
//! size; a stage that produces nothing is flagged as degenerate rather than
//! failing, so downstream stages still run on empty input. Given known
//! duplicates, the run also scores its blocks, candidate pairs and clusters.

use std::time::{Duration, Instant};

use log::{info, warn};

use crate::blocking::{
    BlockBuilding, BlockCleaning, BlockCleaningChain, ComparisonCleaning, MetaBlocking,
    StandardBlocking,
};
use crate::cluster::{CorrelationClustering, EntityClustering, EquivalenceClusters};
use crate::error::Result;
use crate::evaluation::{BlockingMeasures, ClusteringMeasures, DuplicatePairs};
use crate::matching::{EntityMatching, ProfileMatcher, TokenJaccard};
use crate::method::MethodInfo;
use crate::profile::Dataset;

/// Pipeline stage identifiers, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Stage {
    /// Block building.
    BlockBuilding,
    /// Block cleaning.
    BlockCleaning,
    /// Comparison cleaning (meta-blocking).
    ComparisonCleaning,
    /// Entity matching.
    EntityMatching,
    /// Entity clustering.
    EntityClustering,
}

/// What one stage did during a run.
#[derive(Debug, Clone, PartialEq)]
pub struct StageReport {
    /// Which stage.
    pub stage: Stage,
    /// `method_name()` of the implementation.
    pub method: String,
    /// `method_configuration()` of the implementation.
    pub configuration: String,
    /// Blocks, pairs, edges or clusters produced.
    pub output_size: usize,
    /// Wall-clock time spent in the stage.
    pub elapsed: Duration,
    /// True when the stage produced nothing from a non-empty dataset.
    pub is_degenerate: bool,
}

/// Statistics accumulated over one [`Workflow::run`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStats {
    /// One report per executed stage, in order.
    pub stages: Vec<StageReport>,
    /// Profiles that ended up in no block and were never compared.
    pub uncovered_profiles: Vec<usize>,
    /// Comparisons implied by the cleaned blocks, before comparison cleaning.
    pub block_comparisons: u64,
    /// `method_name()` of every stage joined with `->`.
    pub workflow_name: String,
    /// Quality of the cleaned blocks, when known duplicates were supplied.
    pub blocking_quality: Option<BlockingMeasures>,
    /// Quality of the candidate pairs, when known duplicates were supplied.
    pub comparison_quality: Option<BlockingMeasures>,
    /// Quality of the clusters, when known duplicates were supplied.
    pub clustering_quality: Option<ClusteringMeasures>,
}

impl RunStats {
    fn record(&mut self, report: StageReport) {
        info!(
            "{:?}: {} [{}] -> {} in {:?}",
            report.stage, report.method, report.configuration, report.output_size, report.elapsed
        );
        if report.is_degenerate {
            warn!("{:?} ({}) produced no output", report.stage, report.method);
        }
        self.stages.push(report);
    }

    /// Report for `stage`, if it ran.
    pub fn stage(&self, stage: Stage) -> Option<&StageReport> {
        self.stages.iter().find(|r| r.stage == stage)
    }

    /// Sum of per-stage times.
    pub fn total_elapsed(&self) -> Duration {
        self.stages.iter().map(|r| r.elapsed).sum()
    }
}

/// Clusters plus the statistics of the run that produced them.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// The final partition.
    pub clusters: EquivalenceClusters,
    /// Per-stage statistics.
    pub stats: RunStats,
}

/// A configured resolution pipeline.
///
/// ```rust
/// use erlink::{Dataset, EntityProfile, Workflow};
///
/// let dataset = Dataset::dirty(vec![
///     EntityProfile::new(0).with_attribute("name", "Grace Hopper"),
///     EntityProfile::new(1).with_attribute("name", "Grace B. Hopper"),
///     EntityProfile::new(2).with_attribute("name", "Edsger Dijkstra"),
/// ])
/// .unwrap();
///
/// let resolution = Workflow::default().with_unmatched(true).run(&dataset).unwrap();
/// assert_eq!(resolution.clusters.cluster_of(0), resolution.clusters.cluster_of(1));
/// assert_eq!(resolution.clusters.profile_count(), 3);
/// ```
pub struct Workflow {
    builder: Box<dyn BlockBuilding>,
    cleaner: Box<dyn BlockCleaning>,
    comparison_cleaner: Box<dyn ComparisonCleaning>,
    matcher: Box<dyn EntityMatching>,
    clusterer: Box<dyn EntityClustering>,
    include_unmatched: bool,
    ground_truth: Option<DuplicatePairs>,
}

impl Default for Workflow {
    fn default() -> Self {
        Self {
            builder: Box::new(StandardBlocking::new()),
            cleaner: Box::new(BlockCleaningChain::default()),
            comparison_cleaner: Box::new(MetaBlocking::default()),
            matcher: Box::new(ProfileMatcher::new(TokenJaccard)),
            clusterer: Box::new(CorrelationClustering::default()),
            include_unmatched: false,
            ground_truth: None,
        }
    }
}

impl std::fmt::Debug for Workflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workflow")
            .field("name", &self.name())
            .field("include_unmatched", &self.include_unmatched)
            .field(
                "known_duplicates",
                &self.ground_truth.as_ref().map(DuplicatePairs::len),
            )
            .finish()
    }
}

impl Workflow {
    /// Replace the block builder.
    pub fn with_builder(mut self, builder: impl BlockBuilding + 'static) -> Self {
        self.builder = Box::new(builder);
        self
    }

    /// Replace the block cleaner; use a [`BlockCleaningChain`] to run several.
    pub fn with_cleaner(mut self, cleaner: impl BlockCleaning + 'static) -> Self {
        self.cleaner = Box::new(cleaner);
        self
    }

    /// Replace the comparison cleaner.
    pub fn with_comparison_cleaner(mut self, cleaner: impl ComparisonCleaning + 'static) -> Self {
        self.comparison_cleaner = Box::new(cleaner);
        self
    }

    /// Replace the matcher.
    pub fn with_matcher(mut self, matcher: impl EntityMatching + 'static) -> Self {
        self.matcher = Box::new(matcher);
        self
    }

    /// Replace the clusterer.
    pub fn with_clusterer(mut self, clusterer: impl EntityClustering + 'static) -> Self {
        self.clusterer = Box::new(clusterer);
        self
    }

    /// Add singleton clusters for profiles that never reached the similarity graph.
    pub fn with_unmatched(mut self, include: bool) -> Self {
        self.include_unmatched = include;
        self
    }

    /// Score every run against `duplicates`, which must describe the dataset passed to
    /// [`run`](Self::run).
    pub fn with_ground_truth(mut self, duplicates: DuplicatePairs) -> Self {
        self.ground_truth = Some(duplicates);
        self
    }

    /// Method names of all stages joined with `->`.
    pub fn name(&self) -> String {
        [
            self.builder.method_name(),
            self.cleaner.method_name(),
            self.comparison_cleaner.method_name(),
            self.matcher.method_name(),
            self.clusterer.method_name(),
        ]
        .join("->")
    }

    /// Resolve `dataset` into equivalence clusters.
    ///
    /// Errors only on matcher contract violations; empty intermediate results
    /// are reported through [`RunStats`].
    pub fn run(&self, dataset: &Dataset) -> Result<Resolution> {
        let mut stats = RunStats {
            workflow_name: self.name(),
            ..RunStats::default()
        };
        let expect_output = !dataset.is_empty();

        let start = Instant::now();
        let blocks = self.builder.build_blocks(dataset);
        stats.record(report(
            Stage::BlockBuilding,
            self.builder.as_ref(),
            blocks.len(),
            start,
            expect_output,
        ));

        let start = Instant::now();
        let blocks = self.cleaner.clean_blocks(blocks);
        stats.record(report(
            Stage::BlockCleaning,
            self.cleaner.as_ref(),
            blocks.len(),
            start,
            expect_output,
        ));
        stats.uncovered_profiles = blocks.uncovered_profiles();
        stats.block_comparisons = blocks.total_comparisons();
        if let Some(truth) = &self.ground_truth {
            let m = truth.evaluate_blocks(&blocks);
            log_blocking("blocks", &m);
            stats.blocking_quality = Some(m);
        }

        let start = Instant::now();
        let pairs = self.comparison_cleaner.clean_comparisons(&blocks);
        stats.record(report(
            Stage::ComparisonCleaning,
            self.comparison_cleaner.as_ref(),
            pairs.len(),
            start,
            expect_output,
        ));
        if let Some(truth) = &self.ground_truth {
            let m = truth.evaluate_pairs(&pairs);
            log_blocking("candidate pairs", &m);
            stats.comparison_quality = Some(m);
        }

        let start = Instant::now();
        let graph = self.matcher.match_pairs(&pairs, dataset)?;
        stats.record(report(
            Stage::EntityMatching,
            self.matcher.as_ref(),
            graph.edge_count(),
            start,
            expect_output,
        ));

        let start = Instant::now();
        let mut clusters = self.clusterer.cluster(&graph);
        if self.include_unmatched {
            clusters = clusters.include_unmatched(dataset.len());
        }
        stats.record(report(
            Stage::EntityClustering,
            self.clusterer.as_ref(),
            clusters.len(),
            start,
            expect_output,
        ));
        if let Some(truth) = &self.ground_truth {
            let m = truth.evaluate_clusters(&clusters);
            info!(
                "clusters: precision {:.4}, recall {:.4}, F1 {:.4} ({} of {} duplicates)",
                m.precision, m.recall, m.f_measure, m.detected_duplicates, m.existing_duplicates
            );
            stats.clustering_quality = Some(m);
        }

        Ok(Resolution { clusters, stats })
    }
}

fn log_blocking(what: &str, m: &BlockingMeasures) {
    info!(
        "{what}: PC {:.4}, PQ {:.6}, RR {:.4} ({} of {} duplicates, {} comparisons)",
        m.pair_completeness,
        m.pair_quality,
        m.reduction_ratio,
        m.detected_duplicates,
        m.existing_duplicates,
        m.comparisons
    );
}

fn report<M: MethodInfo + ?Sized>(
    stage: Stage,
    method: &M,
    output_size: usize,
    start: Instant,
    expect_output: bool,
) -> StageReport {
    StageReport {
        stage,
        method: method.method_name(),
        configuration: method.method_configuration(),
        output_size,
        elapsed: start.elapsed(),
        is_degenerate: expect_output && output_size == 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocking::QGramsBlocking;
    use crate::profile::EntityProfile;

    fn people() -> Dataset {
        Dataset::dirty(vec![
            EntityProfile::new(0).with_attribute("name", "John Smith"),
            EntityProfile::new(1).with_attribute("name", "Jon Smith"),
            EntityProfile::new(2).with_attribute("name", "Mary Jones"),
            EntityProfile::new(3).with_attribute("name", "Mary Jones"),
            EntityProfile::new(4),
        ])
        .unwrap()
    }

    #[test]
    fn default_pipeline_resolves_duplicates() {
        let resolution = Workflow::default().run(&people()).unwrap();
        let c = &resolution.clusters;
        assert_eq!(c.cluster_of(0), c.cluster_of(1));
        assert_eq!(c.cluster_of(2), c.cluster_of(3));
        assert_ne!(c.cluster_of(0), c.cluster_of(2));
        assert_eq!(c.cluster_of(4), None);
        assert_eq!(resolution.stats.uncovered_profiles, vec![4]);
    }

    #[test]
    fn records_every_stage() {
        let resolution = Workflow::default().run(&people()).unwrap();
        let stages: Vec<Stage> = resolution.stats.stages.iter().map(|r| r.stage).collect();
        assert_eq!(
            stages,
            vec![
                Stage::BlockBuilding,
                Stage::BlockCleaning,
                Stage::ComparisonCleaning,
                Stage::EntityMatching,
                Stage::EntityClustering,
            ]
        );
        let building = resolution.stats.stage(Stage::BlockBuilding).unwrap();
        assert_eq!(building.method, "Standard Blocking");
        assert!(!building.is_degenerate);
        assert!(resolution.stats.workflow_name.starts_with("Standard Blocking->"));
    }

    #[test]
    fn scores_against_known_duplicates() {
        let dataset = people();
        let truth = DuplicatePairs::for_dataset(&dataset, [(0, 1), (2, 3), (0, 4)]).unwrap();
        let resolution = Workflow::default()
            .with_ground_truth(truth)
            .run(&dataset)
            .unwrap();
        let stats = &resolution.stats;

        let blocks = stats.blocking_quality.unwrap();
        assert_eq!(blocks.detected_duplicates, 2);
        assert_eq!(blocks.existing_duplicates, 3);
        let pairs = stats.comparison_quality.unwrap();
        assert_eq!(pairs.comparisons, 2);
        assert!((pairs.pair_quality - 1.0).abs() < 1e-12);
        let clusters = stats.clustering_quality.unwrap();
        assert!((clusters.precision - 1.0).abs() < 1e-12);
        assert!((clusters.recall - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn no_ground_truth_no_measures() {
        let stats = Workflow::default().run(&people()).unwrap().stats;
        assert!(stats.blocking_quality.is_none());
        assert!(stats.comparison_quality.is_none());
        assert!(stats.clustering_quality.is_none());
    }

    #[test]
    fn include_unmatched_covers_dataset() {
        let resolution = Workflow::default()
            .with_unmatched(true)
            .run(&people())
            .unwrap();
        assert_eq!(resolution.clusters.profile_count(), 5);
        assert_eq!(resolution.clusters.cluster_of(4), Some(2));
    }

    #[test]
    fn empty_dataset_is_not_degenerate() {
        let dataset = Dataset::dirty(Vec::new()).unwrap();
        let resolution = Workflow::default().run(&dataset).unwrap();
        assert!(resolution.clusters.is_empty());
        assert!(resolution.stats.stages.iter().all(|r| !r.is_degenerate));
    }

    #[test]
    fn no_shared_tokens_flags_degenerate_stages() {
        let dataset = Dataset::dirty(vec![
            EntityProfile::new(0).with_attribute("name", "alpha"),
            EntityProfile::new(1).with_attribute("name", "beta"),
        ])
        .unwrap();
        let resolution = Workflow::default().run(&dataset).unwrap();
        assert!(resolution.stats.stage(Stage::BlockBuilding).unwrap().is_degenerate);
        assert!(resolution.clusters.is_empty());
    }

    #[test]
    fn stages_are_replaceable() {
        let workflow = Workflow::default()
            .with_builder(QGramsBlocking::new(3).unwrap())
            .with_comparison_cleaner(MetaBlocking::comparison_propagation())
            .with_clusterer(CorrelationClustering::new(0.9).unwrap());
        assert!(workflow.name().starts_with("Q-Grams Blocking->"));
        let resolution = workflow.run(&people()).unwrap();
        let c = &resolution.clusters;
        assert_eq!(c.cluster_of(2), c.cluster_of(3));
    }
}
