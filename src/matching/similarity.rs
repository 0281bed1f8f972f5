//! Profile-level similarity functions.
//!
//! All built-in scorers are schema-agnostic: they look at the tokens of every
//! attribute value and ignore attribute names. Every score lies in `[0, 1]`;
//! a profile without tokens scores `0.0` against anything.

use std::collections::{HashMap, HashSet};

use crate::profile::EntityProfile;

/// Scores how likely two profiles describe the same entity.
///
/// A scorer first turns every profile into a [`Model`](Scorer::Model) (a token
/// set, a term vector, ...) and then compares models. The matcher builds each
/// profile's model once per run, however many candidate pairs it appears in.
///
/// Any `Fn(&EntityProfile, &EntityProfile) -> f64` is a scorer whose model is
/// the profile itself.
pub trait Scorer: Send + Sync {
    /// Per-profile representation compared by [`compare`](Scorer::compare).
    type Model<'a>: Send + Sync;

    /// Build the model of `profile`.
    fn model<'a>(&self, profile: &'a EntityProfile) -> Self::Model<'a>;

    /// Similarity in `[0, 1]` of two models.
    fn compare(&self, a: &Self::Model<'_>, b: &Self::Model<'_>) -> f64;

    /// Similarity in `[0, 1]` of two profiles.
    fn score(&self, a: &EntityProfile, b: &EntityProfile) -> f64 {
        self.compare(&self.model(a), &self.model(b))
    }

    /// Name used in configuration descriptors.
    fn name(&self) -> &str {
        "custom"
    }
}

impl<F> Scorer for F
where
    F: Fn(&EntityProfile, &EntityProfile) -> f64 + Send + Sync,
{
    type Model<'a> = &'a EntityProfile;

    fn model<'a>(&self, profile: &'a EntityProfile) -> &'a EntityProfile {
        profile
    }

    fn compare(&self, a: &&EntityProfile, b: &&EntityProfile) -> f64 {
        self(*a, *b)
    }
}

/// Jaccard similarity of the two token sets.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenJaccard;

impl Scorer for TokenJaccard {
    type Model<'a> = HashSet<String>;

    fn model(&self, profile: &EntityProfile) -> HashSet<String> {
        profile.tokens().collect()
    }

    fn compare(&self, sa: &HashSet<String>, sb: &HashSet<String>) -> f64 {
        if sa.is_empty() || sb.is_empty() {
            return 0.0;
        }
        let intersection = sa.intersection(sb).count();
        let union = sa.len() + sb.len() - intersection;
        intersection as f64 / union as f64
    }

    fn name(&self) -> &str {
        "token-jaccard"
    }
}

/// Term-frequency vector of a profile with its Euclidean norm.
#[derive(Debug, Clone, Default)]
pub struct TermVector {
    frequencies: HashMap<String, f64>,
    norm: f64,
}

impl TermVector {
    /// Count the tokens of `profile`.
    pub fn of(profile: &EntityProfile) -> Self {
        let mut frequencies = HashMap::new();
        for t in profile.tokens() {
            *frequencies.entry(t).or_insert(0.0) += 1.0;
        }
        let norm = frequencies.values().map(|x: &f64| x * x).sum::<f64>().sqrt();
        Self { frequencies, norm }
    }

    /// True if the profile had no tokens.
    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    fn dot(&self, other: &TermVector) -> f64 {
        let (small, large) = if self.frequencies.len() <= other.frequencies.len() {
            (self, other)
        } else {
            (other, self)
        };
        small
            .frequencies
            .iter()
            .filter_map(|(t, &x)| large.frequencies.get(t).map(|&y| x * y))
            .sum()
    }
}

/// Cosine similarity of term-frequency vectors.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenCosine;

impl Scorer for TokenCosine {
    type Model<'a> = TermVector;

    fn model(&self, profile: &EntityProfile) -> TermVector {
        TermVector::of(profile)
    }

    fn compare(&self, a: &TermVector, b: &TermVector) -> f64 {
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        (a.dot(b) / (a.norm * b.norm)).min(1.0)
    }

    fn name(&self) -> &str {
        "token-cosine"
    }
}

/// Jaro-Winkler similarity of the normalized value strings.
///
/// Values are reduced to their space-joined tokens first, so punctuation and
/// case do not matter. Best suited to short, name-like profiles.
#[derive(Debug, Clone, Copy, Default)]
pub struct JaroWinkler;

impl Scorer for JaroWinkler {
    type Model<'a> = String;

    fn model(&self, profile: &EntityProfile) -> String {
        profile.tokens().collect::<Vec<_>>().join(" ")
    }

    fn compare(&self, na: &String, nb: &String) -> f64 {
        if na.is_empty() || nb.is_empty() {
            return 0.0;
        }
        strsim::jaro_winkler(na, nb).clamp(0.0, 1.0)
    }

    fn name(&self) -> &str {
        "jaro-winkler"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(value: &str) -> EntityProfile {
        EntityProfile::new(0).with_attribute("v", value)
    }

    #[test]
    fn jaccard_overlap() {
        let s = TokenJaccard.score(&profile("a b c"), &profile("b c d"));
        assert!((s - 0.5).abs() < 1e-12);
    }

    #[test]
    fn identical_profiles_score_one() {
        let p = profile("Grace Hopper, Navy");
        assert!((TokenJaccard.score(&p, &p) - 1.0).abs() < 1e-12);
        assert!((TokenCosine.score(&p, &p) - 1.0).abs() < 1e-12);
        assert!((JaroWinkler.score(&p, &p) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn cosine_uses_frequencies() {
        // (2,0) . (1,1) / (2 * sqrt 2)
        let s = TokenCosine.score(&profile("a a"), &profile("a b"));
        assert!((s - 1.0 / 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn tokenless_profiles_score_zero() {
        let empty = profile("--");
        let p = profile("x");
        assert_eq!(TokenJaccard.score(&empty, &empty), 0.0);
        assert_eq!(TokenCosine.score(&empty, &p), 0.0);
        assert_eq!(JaroWinkler.score(&p, &empty), 0.0);
    }

    #[test]
    fn jaro_winkler_ignores_case_and_punctuation() {
        let s = JaroWinkler.score(&profile("O'Brien"), &profile("o brien"));
        assert!((s - 1.0).abs() < 1e-12);
    }

    #[test]
    fn closures_are_scorers() {
        let constant = |_: &EntityProfile, _: &EntityProfile| 0.25;
        assert_eq!(constant.score(&profile("a"), &profile("b")), 0.25);
        assert_eq!(Scorer::name(&constant), "custom");
    }
}
