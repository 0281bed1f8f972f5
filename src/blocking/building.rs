//! Token-based block building.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, warn};
use rayon::prelude::*;

use super::block::{Block, Blocks};
use super::traits::BlockBuilding;
use crate::error::{Error, Result};
use crate::method::MethodInfo;
use crate::profile::{Dataset, EntityProfile};

/// One block per distinct token of the attribute values.
///
/// Schema-agnostic: attribute names are ignored, so `"Smith"` under `name` and
/// `"smith"` under `author` share the block `smith`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardBlocking;

impl StandardBlocking {
    /// Create a standard blocking builder.
    pub fn new() -> Self {
        Self
    }
}

impl BlockBuilding for StandardBlocking {
    fn build_blocks(&self, dataset: &Dataset) -> Blocks {
        index_keys(dataset, |p| p.tokens().collect())
    }
}

impl MethodInfo for StandardBlocking {
    fn method_name(&self) -> String {
        "Standard Blocking".into()
    }

    fn method_configuration(&self) -> String {
        String::new()
    }
}

/// One block per character q-gram of every token.
///
/// More robust to typos than [`StandardBlocking`] at the cost of many more,
/// larger blocks. Tokens shorter than `q` are used whole.
#[derive(Debug, Clone, Copy)]
pub struct QGramsBlocking {
    q: usize,
}

impl QGramsBlocking {
    /// Create a q-grams builder. `q` must be at least 1.
    pub fn new(q: usize) -> Result<Self> {
        if q == 0 {
            return Err(Error::InvalidParameter {
                name: "q",
                message: "must be at least 1",
            });
        }
        Ok(Self { q })
    }

    /// Gram length.
    pub fn q(&self) -> usize {
        self.q
    }

    fn grams(&self, token: &str, out: &mut BTreeSet<String>) {
        let chars: Vec<char> = token.chars().collect();
        if chars.len() <= self.q {
            out.insert(token.to_string());
            return;
        }
        for w in chars.windows(self.q) {
            out.insert(w.iter().collect());
        }
    }
}

impl Default for QGramsBlocking {
    fn default() -> Self {
        Self { q: 6 }
    }
}

impl BlockBuilding for QGramsBlocking {
    fn build_blocks(&self, dataset: &Dataset) -> Blocks {
        index_keys(dataset, |p| {
            let mut keys = BTreeSet::new();
            for token in p.tokens() {
                self.grams(&token, &mut keys);
            }
            keys
        })
    }
}

impl MethodInfo for QGramsBlocking {
    fn method_name(&self) -> String {
        "Q-Grams Blocking".into()
    }

    fn method_configuration(&self) -> String {
        format!("q={}", self.q)
    }
}

/// Inverted index from blocking key to profiles, turned into blocks.
///
/// Key extraction runs in parallel; the index itself is a `BTreeMap`, so blocks
/// come out in key order regardless of thread count.
fn index_keys<F>(dataset: &Dataset, keys: F) -> Blocks
where
    F: Fn(&EntityProfile) -> BTreeSet<String> + Sync,
{
    let profiles: Vec<(usize, &EntityProfile)> = dataset.iter().collect();
    let per_profile: Vec<(usize, BTreeSet<String>)> = profiles
        .into_par_iter()
        .map(|(i, p)| (i, keys(p)))
        .collect();

    let offset = dataset.d1_len();
    let mut index: BTreeMap<String, (Vec<usize>, Vec<usize>)> = BTreeMap::new();
    for (i, profile_keys) in per_profile {
        for key in profile_keys {
            let entry = index.entry(key).or_default();
            if i < offset {
                entry.0.push(i);
            } else {
                entry.1.push(i);
            }
        }
    }
    debug!("indexed {} distinct keys", index.len());

    let clean_clean = dataset.is_clean_clean();
    let blocks: Vec<Block> = index
        .into_iter()
        .filter_map(|(key, (d1, d2))| {
            if clean_clean {
                (!d1.is_empty() && !d2.is_empty()).then(|| Block::clean_clean(key, d1, d2))
            } else {
                (d1.len() >= 2).then(|| Block::dirty(key, d1))
            }
        })
        .collect();

    let blocks = Blocks::for_dataset(blocks, dataset);
    let uncovered = blocks.uncovered_profiles();
    if !uncovered.is_empty() {
        warn!(
            "{} of {} profiles share no blocking key with any other profile and will stay unmatched",
            uncovered.len(),
            dataset.len()
        );
    }
    blocks
}
