use std::collections::BTreeSet;

use crate::profile::Dataset;

/// Profiles sharing a blocking key.
///
/// Dirty ER blocks hold one sorted member list; clean-clean blocks hold one list
/// per collection. Members are unified profile indices.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Block {
    key: String,
    d1: Vec<usize>,
    d2: Option<Vec<usize>>,
}

impl Block {
    /// Dirty ER block. Members are sorted and deduplicated.
    pub fn dirty(key: impl Into<String>, members: Vec<usize>) -> Self {
        Self {
            key: key.into(),
            d1: normalized(members),
            d2: None,
        }
    }

    /// Clean-clean ER block with members from each collection.
    pub fn clean_clean(key: impl Into<String>, d1: Vec<usize>, d2: Vec<usize>) -> Self {
        Self {
            key: key.into(),
            d1: normalized(d1),
            d2: Some(normalized(d2)),
        }
    }

    /// Blocking key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Members from the first (or only) collection.
    pub fn d1(&self) -> &[usize] {
        &self.d1
    }

    /// Members from the second collection (clean-clean only).
    pub fn d2(&self) -> Option<&[usize]> {
        self.d2.as_deref()
    }

    /// True for clean-clean blocks.
    pub fn is_clean_clean(&self) -> bool {
        self.d2.is_some()
    }

    /// Total number of members.
    pub fn size(&self) -> usize {
        self.d1.len() + self.d2.as_ref().map_or(0, Vec::len)
    }

    /// Number of comparisons the block implies.
    pub fn comparisons(&self) -> u64 {
        let n1 = self.d1.len() as u64;
        match &self.d2 {
            Some(d2) => n1 * d2.len() as u64,
            None => n1 * n1.saturating_sub(1) / 2,
        }
    }

    /// All members, first collection first.
    pub fn members(&self) -> impl Iterator<Item = usize> + '_ {
        self.d1
            .iter()
            .chain(self.d2.iter().flatten())
            .copied()
    }

    /// True if `index` is a member on either side.
    pub fn contains(&self, index: usize) -> bool {
        self.d1.binary_search(&index).is_ok()
            || self
                .d2
                .as_ref()
                .is_some_and(|d2| d2.binary_search(&index).is_ok())
    }

    /// Candidate pairs `(a, b)` with `a < b` implied by this block.
    pub fn pairs(&self) -> Box<dyn Iterator<Item = (usize, usize)> + '_> {
        match &self.d2 {
            Some(d2) => Box::new(
                self.d1
                    .iter()
                    .flat_map(move |&a| d2.iter().map(move |&b| ordered(a, b))),
            ),
            None => Box::new(self.d1.iter().enumerate().flat_map(move |(i, &a)| {
                self.d1[i + 1..].iter().map(move |&b| (a, b))
            })),
        }
    }

    /// Keep the members for which `keep` returns true, visiting them in order.
    pub(crate) fn retain_members(&mut self, mut keep: impl FnMut(usize) -> bool) {
        self.d1.retain(|&m| keep(m));
        if let Some(d2) = self.d2.as_mut() {
            d2.retain(|&m| keep(m));
        }
    }
}

/// A collection of blocks plus the sizes of the dataset it was built from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blocks {
    blocks: Vec<Block>,
    d1_len: usize,
    d2_len: Option<usize>,
}

impl Blocks {
    /// Wrap blocks built over collections of `d1_len` (and `d2_len`) profiles.
    pub fn new(blocks: Vec<Block>, d1_len: usize, d2_len: Option<usize>) -> Self {
        Self {
            blocks,
            d1_len,
            d2_len,
        }
    }

    /// Wrap blocks built over `dataset`.
    pub fn for_dataset(blocks: Vec<Block>, dataset: &Dataset) -> Self {
        Self::new(blocks, dataset.d1_len(), dataset.d2_len())
    }

    /// Number of blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// True if there are no blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Iterate blocks in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Block> {
        self.blocks.iter()
    }

    /// Blocks as a slice.
    pub fn as_slice(&self) -> &[Block] {
        &self.blocks
    }

    /// Size of the first collection.
    pub fn d1_len(&self) -> usize {
        self.d1_len
    }

    /// Size of the second collection, if clean-clean.
    pub fn d2_len(&self) -> Option<usize> {
        self.d2_len
    }

    /// True for clean-clean ER.
    pub fn is_clean_clean(&self) -> bool {
        self.d2_len.is_some()
    }

    /// Profiles in the underlying dataset (not only those appearing in blocks).
    pub fn num_profiles(&self) -> usize {
        self.d1_len + self.d2_len.unwrap_or(0)
    }

    /// Sum of block sizes.
    pub fn block_assignments(&self) -> usize {
        self.blocks.iter().map(Block::size).sum()
    }

    /// Sum of per-block comparisons, counting redundant ones.
    pub fn total_comparisons(&self) -> u64 {
        self.blocks.iter().map(Block::comparisons).sum()
    }

    /// Distinct candidate pairs implied by the blocks.
    pub fn candidate_pairs(&self) -> BTreeSet<(usize, usize)> {
        self.blocks.iter().flat_map(Block::pairs).collect()
    }

    /// Dataset profiles that belong to no block and therefore are never compared.
    pub fn uncovered_profiles(&self) -> Vec<usize> {
        let mut covered = vec![false; self.index_bound()];
        for m in self.blocks.iter().flat_map(Block::members) {
            covered[m] = true;
        }
        (0..self.num_profiles()).filter(|&i| !covered[i]).collect()
    }

    /// One past the largest profile index the blocks or the dataset can refer to.
    pub(crate) fn index_bound(&self) -> usize {
        self.blocks
            .iter()
            .flat_map(Block::members)
            .max()
            .map_or(0, |m| m + 1)
            .max(self.num_profiles())
    }

    /// For every profile index, the ascending indices of the blocks containing it.
    pub(crate) fn entity_index(&self) -> Vec<Vec<usize>> {
        let mut index = vec![Vec::new(); self.index_bound()];
        for (b, block) in self.blocks.iter().enumerate() {
            for m in block.members() {
                index[m].push(b);
            }
        }
        index
    }

    pub(crate) fn blocks_mut(&mut self) -> &mut [Block] {
        &mut self.blocks
    }

    pub(crate) fn retain(&mut self, keep: impl FnMut(&Block) -> bool) {
        self.blocks.retain(keep);
    }

    /// Keep the blocks whose position is flagged in `keep`.
    pub(crate) fn retain_flagged(&mut self, keep: &[bool]) {
        let mut flags = keep.iter();
        self.blocks.retain(|_| flags.next().copied().unwrap_or(false));
    }
}

impl std::ops::Index<usize> for Blocks {
    type Output = Block;

    fn index(&self, index: usize) -> &Block {
        &self.blocks[index]
    }
}

impl<'a> IntoIterator for &'a Blocks {
    type Item = &'a Block;
    type IntoIter = std::slice::Iter<'a, Block>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}

fn normalized(mut members: Vec<usize>) -> Vec<usize> {
    members.sort_unstable();
    members.dedup();
    members
}

#[inline]
fn ordered(a: usize, b: usize) -> (usize, usize) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}
