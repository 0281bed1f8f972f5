use rayon::prelude::*;

use super::types::{EquivalenceCluster, EquivalenceClusters};
use crate::graph::{Edge, SimilarityGraph};

/// Array-backed disjoint sets over dense node positions.
#[derive(Clone, Debug)]
pub(crate) struct UnionFind {
    pub(crate) parent: Vec<usize>,
    pub(crate) size: Vec<usize>,
}

impl UnionFind {
    pub(crate) fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            size: vec![1; n],
        }
    }

    pub(crate) fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        // Path compression.
        let mut cur = x;
        while self.parent[cur] != root {
            let next = self.parent[cur];
            self.parent[cur] = root;
            cur = next;
        }
        root
    }

    /// Merge the sets of `a` and `b`, returning the surviving root.
    pub(crate) fn union(&mut self, a: usize, b: usize) -> usize {
        let ra = self.find(a);
        let rb = self.find(b);
        self.union_roots(ra, rb)
    }

    pub(crate) fn union_roots(&mut self, ra: usize, rb: usize) -> usize {
        if ra == rb {
            return ra;
        }

        // Union by size; equal sizes keep the smaller position as root.
        let (big, small) = match self.size[ra].cmp(&self.size[rb]) {
            std::cmp::Ordering::Greater => (ra, rb),
            std::cmp::Ordering::Less => (rb, ra),
            std::cmp::Ordering::Equal => (ra.min(rb), ra.max(rb)),
        };

        self.parent[small] = big;
        self.size[big] += self.size[small];
        big
    }
}

/// Maps sparse profile indices to dense `0..n` positions (ascending order).
pub(crate) struct DenseNodes {
    ids: Vec<usize>,
}

impl DenseNodes {
    pub(crate) fn of(graph: &SimilarityGraph) -> Self {
        Self {
            ids: graph.nodes().collect(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.ids.len()
    }

    pub(crate) fn position(&self, id: usize) -> usize {
        match self.ids.binary_search(&id) {
            Ok(pos) => pos,
            Err(_) => unreachable!("edge endpoint {id} is not a graph node"),
        }
    }

    /// One cluster per union-find root, members sorted, clusters ordered by smallest member.
    pub(crate) fn clusters(&self, uf: &mut UnionFind) -> EquivalenceClusters {
        let mut by_root: Vec<Vec<usize>> = vec![Vec::new(); self.ids.len()];
        for (pos, &id) in self.ids.iter().enumerate() {
            by_root[uf.find(pos)].push(id);
        }
        EquivalenceClusters::new(
            by_root
                .into_iter()
                .filter(|members| !members.is_empty())
                .map(EquivalenceCluster::new)
                .collect(),
        )
    }
}

/// Edges by descending weight, ties by `(left, right)` ascending.
///
/// This is a total order on distinct edges, so the parallel unstable sort is
/// deterministic.
pub(crate) fn edges_by_weight(graph: &SimilarityGraph) -> Vec<Edge> {
    let mut edges = graph.edges().to_vec();
    edges.par_sort_unstable_by(|a, b| {
        b.weight
            .total_cmp(&a.weight)
            .then(a.left.cmp(&b.left))
            .then(a.right.cmp(&b.right))
    });
    edges
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_find_merges_and_compresses() {
        let mut uf = UnionFind::new(5);
        uf.union(0, 1);
        uf.union(3, 4);
        assert_eq!(uf.find(1), uf.find(0));
        assert_ne!(uf.find(0), uf.find(3));
        uf.union(1, 4);
        assert_eq!(uf.find(0), uf.find(3));
        let root = uf.find(0);
        assert_eq!(uf.size[root], 4);
    }

    #[test]
    fn equal_sizes_keep_smaller_root() {
        let mut uf = UnionFind::new(4);
        assert_eq!(uf.union(3, 2), 2);
        assert_eq!(uf.union(1, 0), 0);
        assert_eq!(uf.union(2, 0), 0);
    }

    #[test]
    fn edge_order_breaks_ties_by_endpoints() {
        let g = SimilarityGraph::from_edges([(4, 5, 0.5), (0, 9, 0.5), (1, 2, 0.9), (0, 3, 0.5)])
            .unwrap();
        let order: Vec<(usize, usize)> = edges_by_weight(&g)
            .iter()
            .map(|e| (e.left, e.right))
            .collect();
        assert_eq!(order, vec![(1, 2), (0, 3), (0, 9), (4, 5)]);
    }
}
