use std::collections::{BTreeSet, HashMap};

/// Profiles asserted to denote the same real-world entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EquivalenceCluster {
    members: Vec<usize>,
}

impl EquivalenceCluster {
    /// Create a cluster; members are sorted and deduplicated.
    pub fn new(mut members: Vec<usize>) -> Self {
        members.sort_unstable();
        members.dedup();
        Self { members }
    }

    /// Members in ascending order.
    pub fn members(&self) -> &[usize] {
        &self.members
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// True for a cluster without members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// True for a cluster of exactly one profile.
    pub fn is_singleton(&self) -> bool {
        self.members.len() == 1
    }

    /// True if `index` is a member.
    pub fn contains(&self, index: usize) -> bool {
        self.members.binary_search(&index).is_ok()
    }
}

/// A partition of profiles into equivalence clusters.
///
/// Clusters are ordered by their smallest member, which makes two results equal
/// exactly when they describe the same partition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EquivalenceClusters {
    clusters: Vec<EquivalenceCluster>,
}

impl EquivalenceClusters {
    /// Wrap clusters, dropping empty ones and ordering the rest by smallest member.
    pub fn new(mut clusters: Vec<EquivalenceCluster>) -> Self {
        clusters.retain(|c| !c.is_empty());
        clusters.sort_by_key(|c| c.members[0]);
        Self { clusters }
    }

    /// Number of clusters, singletons included.
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    /// True if there are no clusters.
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Clusters in order.
    pub fn iter(&self) -> std::slice::Iter<'_, EquivalenceCluster> {
        self.clusters.iter()
    }

    /// Clusters with at least two members.
    pub fn non_singletons(&self) -> impl Iterator<Item = &EquivalenceCluster> {
        self.clusters.iter().filter(|c| c.len() > 1)
    }

    /// Total number of clustered profiles.
    pub fn profile_count(&self) -> usize {
        self.clusters.iter().map(EquivalenceCluster::len).sum()
    }

    /// Map from profile index to the position of its cluster.
    pub fn assignments(&self) -> HashMap<usize, usize> {
        self.clusters
            .iter()
            .enumerate()
            .flat_map(|(c, cluster)| cluster.members.iter().map(move |&m| (m, c)))
            .collect()
    }

    /// Position of the cluster containing `index`.
    ///
    /// Scans every cluster; to look up many profiles build
    /// [`assignments`](Self::assignments) once instead.
    pub fn cluster_of(&self, index: usize) -> Option<usize> {
        self.clusters.iter().position(|c| c.contains(index))
    }

    /// Unordered profile pairs declared duplicates (within-cluster pairs).
    pub fn duplicate_pairs(&self) -> BTreeSet<(usize, usize)> {
        let mut pairs = BTreeSet::new();
        for c in &self.clusters {
            for (i, &a) in c.members.iter().enumerate() {
                for &b in &c.members[i + 1..] {
                    pairs.insert((a, b));
                }
            }
        }
        pairs
    }

    /// Add a singleton for every index in `0..num_profiles` not yet clustered.
    ///
    /// Profiles that shared no blocking key never reach the similarity graph;
    /// this makes the result a partition of the whole dataset.
    pub fn include_unmatched(self, num_profiles: usize) -> Self {
        let mut clustered = vec![false; num_profiles];
        for m in self.clusters.iter().flat_map(|c| c.members.iter()) {
            if let Some(slot) = clustered.get_mut(*m) {
                *slot = true;
            }
        }
        let mut clusters = self.clusters;
        clusters.extend(
            (0..num_profiles)
                .filter(|&i| !clustered[i])
                .map(|i| EquivalenceCluster::new(vec![i])),
        );
        Self::new(clusters)
    }

    /// Consume into the underlying clusters.
    pub fn into_vec(self) -> Vec<EquivalenceCluster> {
        self.clusters
    }
}

impl<'a> IntoIterator for &'a EquivalenceClusters {
    type Item = &'a EquivalenceCluster;
    type IntoIter = std::slice::Iter<'a, EquivalenceCluster>;

    fn into_iter(self) -> Self::IntoIter {
        self.clusters.iter()
    }
}
