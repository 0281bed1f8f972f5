//! Entity matching: scoring candidate pairs into a [`SimilarityGraph`].

mod similarity;

pub use similarity::{JaroWinkler, Scorer, TermVector, TokenCosine, TokenJaccard};

use log::debug;
use rayon::prelude::*;

use crate::blocking::CandidatePairs;
use crate::error::{Error, Result};
use crate::graph::SimilarityGraph;
use crate::method::MethodInfo;
use crate::profile::Dataset;

/// Turns candidate pairs into a weighted similarity graph.
pub trait EntityMatching: MethodInfo + Send + Sync {
    /// Score every pair in `pairs` against the profiles of `dataset`.
    ///
    /// Every pair becomes an edge (its weight may be `0.0`); no other edge is created.
    fn match_pairs(&self, pairs: &CandidatePairs, dataset: &Dataset) -> Result<SimilarityGraph>;
}

/// Scores whole profiles with a pluggable [`Scorer`].
#[derive(Debug, Clone, Default)]
pub struct ProfileMatcher<S> {
    scorer: S,
}

impl<S: Scorer> ProfileMatcher<S> {
    /// Create a matcher around `scorer`.
    pub fn new(scorer: S) -> Self {
        Self { scorer }
    }

    /// The wrapped scorer.
    pub fn scorer(&self) -> &S {
        &self.scorer
    }
}

impl<S: Scorer> EntityMatching for ProfileMatcher<S> {
    fn match_pairs(&self, pairs: &CandidatePairs, dataset: &Dataset) -> Result<SimilarityGraph> {
        let len = dataset.len();
        let mut needed = vec![false; len];
        for c in pairs {
            // `left < right`, so checking `right` covers both.
            if c.right >= len {
                return Err(Error::ProfileOutOfRange {
                    index: c.right,
                    len,
                });
            }
            needed[c.left] = true;
            needed[c.right] = true;
        }

        let models: Vec<Option<S::Model<'_>>> = needed
            .par_iter()
            .enumerate()
            .map(|(i, &wanted)| {
                if wanted {
                    dataset.profile(i).map(|p| self.scorer.model(p))
                } else {
                    None
                }
            })
            .collect();
        let model = |index: usize| {
            models[index]
                .as_ref()
                .ok_or(Error::ProfileOutOfRange { index, len })
        };

        let scored: Vec<(usize, usize, f64)> = pairs
            .as_slice()
            .par_iter()
            .map(|c| {
                let score = self.scorer.compare(model(c.left)?, model(c.right)?);
                if !(0.0..=1.0).contains(&score) {
                    return Err(Error::InvalidScore {
                        left: c.left,
                        right: c.right,
                        score,
                    });
                }
                Ok((c.left, c.right, score))
            })
            .collect::<Result<_>>()?;

        let mut graph = SimilarityGraph::with_capacity(scored.len());
        for (a, b, w) in scored {
            graph.insert(a, b, w)?;
        }
        debug!(
            "matched {} pairs into {} nodes",
            graph.edge_count(),
            graph.node_count()
        );
        Ok(graph)
    }
}

impl<S: Scorer> MethodInfo for ProfileMatcher<S> {
    fn method_name(&self) -> String {
        "Profile Matcher".into()
    }

    fn method_configuration(&self) -> String {
        format!("scorer={}", self.scorer.name())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::blocking::Comparison;
    use crate::profile::EntityProfile;

    fn dataset() -> Dataset {
        Dataset::dirty(vec![
            EntityProfile::new(0).with_attribute("name", "ada lovelace"),
            EntityProfile::new(1).with_attribute("name", "ada lovelace"),
            EntityProfile::new(2).with_attribute("name", "alan turing"),
        ])
        .unwrap()
    }

    #[test]
    fn every_pair_becomes_an_edge() {
        let pairs = CandidatePairs::new(vec![Comparison::new(0, 1, 1.0), Comparison::new(1, 2, 1.0)]);
        let graph = ProfileMatcher::new(TokenJaccard)
            .match_pairs(&pairs, &dataset())
            .unwrap();
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.weight(0, 1), Some(1.0));
        assert_eq!(graph.weight(1, 2), Some(0.0));
        assert!(!graph.contains_edge(0, 2));
    }

    #[test]
    fn rejects_out_of_range_scores() {
        let pairs = CandidatePairs::new(vec![Comparison::new(0, 1, 1.0)]);
        let too_big = ProfileMatcher::new(|_: &EntityProfile, _: &EntityProfile| 1.5);
        assert!(matches!(
            too_big.match_pairs(&pairs, &dataset()),
            Err(Error::InvalidScore { .. })
        ));
        let nan = ProfileMatcher::new(|_: &EntityProfile, _: &EntityProfile| f64::NAN);
        assert!(nan.match_pairs(&pairs, &dataset()).is_err());
    }

    #[test]
    fn rejects_unknown_profiles() {
        let pairs = CandidatePairs::new(vec![Comparison::new(0, 7, 1.0)]);
        let err = ProfileMatcher::new(TokenJaccard)
            .match_pairs(&pairs, &dataset())
            .unwrap_err();
        assert!(matches!(err, Error::ProfileOutOfRange { index: 7, len: 3 }));
    }

    #[test]
    fn no_pairs_empty_graph() {
        let graph = ProfileMatcher::new(TokenJaccard)
            .match_pairs(&CandidatePairs::default(), &dataset())
            .unwrap();
        assert!(graph.is_empty());
    }

    #[derive(Default)]
    struct CountingScorer {
        models: AtomicUsize,
    }

    impl Scorer for CountingScorer {
        type Model<'a> = usize;

        fn model(&self, profile: &EntityProfile) -> usize {
            self.models.fetch_add(1, Ordering::Relaxed);
            profile.id()
        }

        fn compare(&self, a: &usize, b: &usize) -> f64 {
            if a == b {
                1.0
            } else {
                0.5
            }
        }
    }

    #[test]
    fn builds_each_model_once() {
        let pairs = CandidatePairs::new(vec![
            Comparison::new(0, 1, 1.0),
            Comparison::new(0, 2, 1.0),
            Comparison::new(1, 2, 1.0),
        ]);
        let matcher = ProfileMatcher::new(CountingScorer::default());
        let graph = matcher.match_pairs(&pairs, &dataset()).unwrap();
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(matcher.scorer().models.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn models_only_for_paired_profiles() {
        let pairs = CandidatePairs::new(vec![Comparison::new(0, 1, 1.0)]);
        let matcher = ProfileMatcher::new(CountingScorer::default());
        matcher.match_pairs(&pairs, &dataset()).unwrap();
        assert_eq!(matcher.scorer().models.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn describes_scorer() {
        let m = ProfileMatcher::new(TokenCosine);
        assert_eq!(m.method_configuration(), "scorer=token-cosine");
    }
}
