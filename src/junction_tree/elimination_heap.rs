use ndarray::Array2;

use crate::core::EliminationHeuristic;

// ------------------------------------------------------------------------------------------

/// A variable together with its not yet eliminated neighbours
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InducedCluster {
    /// Position of the variable to eliminate
    pub variable: usize,

    /// Sorted positions of the cluster members, `variable` included
    pub members: Vec<usize>,

    /// Number of edges needed to make the cluster complete
    pub fill_in: usize,

    /// Product of the members' cardinalities
    pub weight: usize,
}

impl InducedCluster {
    /// Creates a cluster and evaluates its costs against the current adjacency
    pub fn new(
        variable: usize,
        mut members: Vec<usize>,
        adjacency: &Array2<bool>,
        cardinalities: &[usize],
    ) -> Self {
        members.sort_unstable();
        members.dedup();
        let mut fill_in = 0;
        for (k, a) in members.iter().enumerate() {
            for b in &members[k + 1..] {
                if !adjacency[[*a, *b]] {
                    fill_in += 1;
                }
            }
        }
        let weight = members
            .iter()
            .fold(1usize, |acc, m| acc.saturating_mul(cardinalities[*m]));
        InducedCluster {
            variable,
            members,
            fill_in,
            weight,
        }
    }

    /// Neighbours of the eliminated variable
    pub fn neighbours(&self) -> impl Iterator<Item = usize> + '_ {
        self.members.iter().copied().filter(move |m| *m != self.variable)
    }

    fn key(&self, heuristic: EliminationHeuristic) -> (usize, usize, usize) {
        match heuristic {
            EliminationHeuristic::MinFill => (self.fill_in, self.weight, self.variable),
            EliminationHeuristic::MinWeight => (self.weight, self.fill_in, self.variable),
        }
    }
}

// ------------------------------------------------------------------------------------------

/// A binary min heap of induced clusters that supports updating
/// the cluster of any variable still in the heap
#[derive(Debug, Clone)]
pub struct EliminationHeap {
    clusters: Vec<InducedCluster>,
    positions: Vec<Option<usize>>,
    heuristic: EliminationHeuristic,
}

impl EliminationHeap {
    /// Builds a heap with one cluster per variable of an undirected graph
    pub fn new(
        adjacency: &Array2<bool>,
        cardinalities: &[usize],
        heuristic: EliminationHeuristic,
    ) -> Self {
        let size = cardinalities.len();
        let clusters: Vec<_> = (0..size)
            .map(|i| {
                let members = (0..size)
                    .filter(|j| *j == i || adjacency[[i, *j]])
                    .collect();
                InducedCluster::new(i, members, adjacency, cardinalities)
            })
            .collect();
        let mut heap = EliminationHeap {
            positions: vec![None; size],
            clusters,
            heuristic,
        };
        for (slot, cluster) in heap.clusters.iter().enumerate() {
            heap.positions[cluster.variable] = Some(slot);
        }
        for slot in (0..heap.clusters.len() / 2).rev() {
            heap.sift_down(slot);
        }
        heap
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    #[inline]
    pub fn contains(&self, variable: usize) -> bool {
        matches!(self.positions.get(variable), Some(Some(_)))
    }

    /// Current cluster of a variable still in the heap
    pub fn cluster(&self, variable: usize) -> Option<&InducedCluster> {
        let slot = (*self.positions.get(variable)?)?;
        self.clusters.get(slot)
    }

    #[inline]
    pub fn peek(&self) -> Option<&InducedCluster> {
        self.clusters.first()
    }

    /// Removes and returns the cheapest cluster
    pub fn extract_min(&mut self) -> Option<InducedCluster> {
        if self.clusters.is_empty() {
            return None;
        }
        let last = self.clusters.len() - 1;
        self.swap(0, last);
        let min = self.clusters.pop()?;
        self.positions[min.variable] = None;
        if !self.clusters.is_empty() {
            self.sift_down(0);
        }
        Some(min)
    }

    /// Replaces the cluster of a variable and restores the heap order
    /// around its position only
    pub fn update(&mut self, cluster: InducedCluster) {
        let slot = match self.positions.get(cluster.variable) {
            Some(Some(slot)) => *slot,
            _ => return,
        };
        self.clusters[slot] = cluster;
        let slot = self.sift_up(slot);
        self.sift_down(slot);
    }

    fn less(&self, a: usize, b: usize) -> bool {
        self.clusters[a].key(self.heuristic) < self.clusters[b].key(self.heuristic)
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.clusters.swap(a, b);
        self.positions[self.clusters[a].variable] = Some(a);
        self.positions[self.clusters[b].variable] = Some(b);
    }

    fn sift_up(&mut self, mut slot: usize) -> usize {
        while slot > 0 {
            let parent = (slot - 1) / 2;
            if !self.less(slot, parent) {
                break;
            }
            self.swap(slot, parent);
            slot = parent;
        }
        slot
    }

    fn sift_down(&mut self, mut slot: usize) {
        loop {
            let left = 2 * slot + 1;
            let right = left + 1;
            let mut smallest = slot;
            if left < self.clusters.len() && self.less(left, smallest) {
                smallest = left;
            }
            if right < self.clusters.len() && self.less(right, smallest) {
                smallest = right;
            }
            if smallest == slot {
                break;
            }
            self.swap(slot, smallest);
            slot = smallest;
        }
    }
}
