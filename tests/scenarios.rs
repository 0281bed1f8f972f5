use erlink::blocking::{
    BlockBuilding, BlockCleaning, BlockCleaningChain, ComparisonCleaning, MetaBlocking,
    StandardBlocking,
};
use erlink::matching::{EntityMatching, ProfileMatcher, TokenJaccard};
use erlink::{
    CorrelationClustering, Dataset, DuplicatePairs, EntityClustering, EntityProfile, Stage,
    UniqueMappingClustering, Workflow,
};

fn profile(id: usize, name: &str) -> EntityProfile {
    EntityProfile::new(id).with_attribute("name", name)
}

fn groups(clusters: &erlink::EquivalenceClusters) -> Vec<Vec<usize>> {
    clusters.iter().map(|c| c.members().to_vec()).collect()
}

fn fixed_scores(table: &'static [((usize, usize), f64)]) -> impl Fn(&EntityProfile, &EntityProfile) -> f64 {
    move |a: &EntityProfile, b: &EntityProfile| {
        let key = (a.id().min(b.id()), a.id().max(b.id()));
        table
            .iter()
            .find(|(pair, _)| *pair == key)
            .map_or(0.0, |(_, s)| *s)
    }
}

#[test]
fn two_blocks_split_by_threshold() {
    let dataset = Dataset::dirty(vec![
        profile(0, "x"),
        profile(1, "x"),
        profile(2, "y"),
        profile(3, "y"),
    ])
    .unwrap();

    let blocks = StandardBlocking::new().build_blocks(&dataset);
    assert_eq!(blocks.len(), 2);
    let blocks = BlockCleaningChain::default().clean_blocks(blocks);
    let pairs = MetaBlocking::default().clean_comparisons(&blocks);
    assert_eq!(pairs.pairs().collect::<Vec<_>>(), vec![(0, 1), (2, 3)]);

    let matcher = ProfileMatcher::new(fixed_scores(&[((0, 1), 0.9), ((2, 3), 0.3)]));
    let graph = matcher.match_pairs(&pairs, &dataset).unwrap();
    let clusters = CorrelationClustering::new(0.5).unwrap().cluster(&graph);

    assert_eq!(groups(&clusters), vec![vec![0, 1], vec![2], vec![3]]);
}

#[test]
fn empty_dataset_yields_nothing() {
    let dataset = Dataset::dirty(Vec::new()).unwrap();

    let blocks = StandardBlocking::new().build_blocks(&dataset);
    assert!(blocks.is_empty());
    let blocks = BlockCleaningChain::default().clean_blocks(blocks);
    let pairs = MetaBlocking::default().clean_comparisons(&blocks);
    assert!(pairs.is_empty());
    let graph = ProfileMatcher::new(TokenJaccard)
        .match_pairs(&pairs, &dataset)
        .unwrap();
    assert!(graph.is_empty());
    assert!(CorrelationClustering::default().cluster(&graph).is_empty());
}

#[test]
fn single_block_weak_member_stays_apart() {
    let dataset = Dataset::dirty(vec![profile(0, "z"), profile(1, "z"), profile(2, "z")]).unwrap();

    let workflow = Workflow::default()
        .with_matcher(ProfileMatcher::new(fixed_scores(&[
            ((0, 1), 0.8),
            ((0, 2), 0.1),
            ((1, 2), 0.05),
        ])))
        .with_clusterer(CorrelationClustering::new(0.5).unwrap());
    let resolution = workflow.run(&dataset).unwrap();

    assert_eq!(resolution.stats.block_comparisons, 3);
    assert_eq!(groups(&resolution.clusters), vec![vec![0, 1], vec![2]]);
}

#[test]
fn default_workflow_keeps_small_duplicate_blocks() {
    let dataset = Dataset::dirty(vec![
        profile(0, "Acme Corp"),
        profile(1, "Acme Corp"),
        profile(2, "ACME corp."),
        profile(3, "Zeta Ltd"),
    ])
    .unwrap();

    let resolution = Workflow::default().with_unmatched(true).run(&dataset).unwrap();

    let c = &resolution.clusters;
    assert_eq!(c.cluster_of(0), c.cluster_of(2));
    assert_eq!(groups(c), vec![vec![0, 1, 2], vec![3]]);
    assert_eq!(resolution.stats.uncovered_profiles, vec![3]);
}

#[test]
fn clean_clean_run_scored_against_known_matches() {
    let dataset = Dataset::clean_clean(
        vec![profile(0, "acme corp london"), profile(1, "globex inc paris")],
        vec![profile(0, "acme corporation london"), profile(1, "globex paris")],
    )
    .unwrap();
    let truth = DuplicatePairs::for_dataset(&dataset, [(0, 0), (1, 1)]).unwrap();
    assert_eq!(truth.brute_force_comparisons(), 4);

    let stats = Workflow::default()
        .with_clusterer(UniqueMappingClustering::default())
        .with_ground_truth(truth)
        .run(&dataset)
        .unwrap()
        .stats;

    let blocks = stats.blocking_quality.unwrap();
    assert!((blocks.pair_completeness - 1.0).abs() < 1e-12);
    let clusters = stats.clustering_quality.unwrap();
    assert!((clusters.precision - 1.0).abs() < 1e-12);
    assert!((clusters.recall - 1.0).abs() < 1e-12);
    assert!((clusters.f_measure - 1.0).abs() < 1e-12);
}

#[test]
fn clean_clean_unique_mapping() {
    let dataset = Dataset::clean_clean(
        vec![profile(0, "acme corp london"), profile(1, "globex inc paris")],
        vec![profile(0, "acme corporation london"), profile(1, "globex paris")],
    )
    .unwrap();

    let resolution = Workflow::default()
        .with_clusterer(UniqueMappingClustering::default())
        .run(&dataset)
        .unwrap();

    assert_eq!(groups(&resolution.clusters), vec![vec![0, 2], vec![1, 3]]);
    let clustering = resolution.stats.stage(Stage::EntityClustering).unwrap();
    assert_eq!(clustering.method, "Unique Mapping Clustering");
    assert_eq!(clustering.output_size, 2);
}

#[test]
fn mismatched_profile_ids_are_rejected() {
    let err = Dataset::dirty(vec![profile(0, "a"), profile(5, "b")]).unwrap_err();
    assert!(matches!(
        err,
        erlink::Error::ProfileIdMismatch {
            expected: 1,
            found: 5
        }
    ));
}
