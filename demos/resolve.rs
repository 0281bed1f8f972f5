//! Dirty ER over a handful of company records, with per-stage logging.
//!
//! Run with `RUST_LOG=info` to see every stage's descriptor and output size.

use erlink::blocking::{
    BlockCleaningChain, BlockFiltering, MetaBlocking, PruningAlgorithm, RedundantBlockRemoval,
    SizeBasedPurging, WeightingScheme,
};
use erlink::matching::{JaroWinkler, ProfileMatcher};
use erlink::{CorrelationClustering, Dataset, EntityProfile, Workflow};

fn main() -> erlink::Result<()> {
    env_logger::init();

    let records = [
        ("Acme Corporation", "London"),
        ("ACME Corp.", "London"),
        ("Globex Inc", "Springfield"),
        ("Globex Incorporated", "Springfield"),
        ("Initech", "Austin"),
        ("Umbrella Corp", "Raccoon City"),
        ("Acme Holdings", "Paris"),
    ];
    let profiles = records
        .iter()
        .enumerate()
        .map(|(id, (name, city))| {
            EntityProfile::new(id)
                .with_attribute("name", *name)
                .with_attribute("city", *city)
        })
        .collect();
    let dataset = Dataset::dirty(profiles)?;

    let workflow = Workflow::default()
        .with_cleaner(
            BlockCleaningChain::empty()
                .then(SizeBasedPurging::with_fraction(0.5)?)
                .then(RedundantBlockRemoval::new())
                .then(BlockFiltering::default()),
        )
        .with_comparison_cleaner(MetaBlocking::new(
            WeightingScheme::Js,
            PruningAlgorithm::CardinalityNodePruning { reciprocal: false },
        )?)
        .with_matcher(ProfileMatcher::new(JaroWinkler))
        .with_clusterer(CorrelationClustering::new(0.8)?)
        .with_unmatched(true);

    println!("=== {} ===", workflow.name());
    let resolution = workflow.run(&dataset)?;

    for report in &resolution.stats.stages {
        println!(
            "  {:<20} {:>5} in {:?}",
            format!("{:?}", report.stage),
            report.output_size,
            report.elapsed
        );
    }
    println!("\n=== Clusters ===");
    for (i, cluster) in resolution.clusters.iter().enumerate() {
        let names: Vec<&str> = cluster.members().iter().map(|&m| records[m].0).collect();
        println!("  cluster {i}: {}", names.join(" | "));
    }
    Ok(())
}
