use std::{
    cmp::{Ordering, Reverse},
    collections::BinaryHeap,
};

use crate::junction_tree::clique::{Clique, CliqueId};

// ------------------------------------------------------------------------------------------

/// A pair of cliques that may become joined by a sepset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SepsetCandidate {
    /// The two cliques, the smaller id first
    pub cliques: [CliqueId; 2],

    /// Number of shared variables
    pub mass: usize,

    /// Sum of the sizes of the two clique potentials
    pub cost: usize,

    order: usize,
}

impl SepsetCandidate {
    // larger overlaps first, then cheaper cliques, then the order of creation
    fn key(&self) -> (Reverse<usize>, usize, usize) {
        (Reverse(self.mass), self.cost, self.order)
    }
}

impl Ord for SepsetCandidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl PartialOrd for SepsetCandidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A priority queue over the sepset candidates of every pair of cliques
#[derive(Debug, Clone, Default)]
pub struct SepsetCandidateHeap {
    heap: BinaryHeap<Reverse<SepsetCandidate>>,
}

impl SepsetCandidateHeap {
    /// Inserts a candidate for every pair of cliques
    pub fn new(cliques: &[Clique]) -> Self {
        let mut heap = BinaryHeap::with_capacity(cliques.len() * cliques.len().saturating_sub(1) / 2);
        let mut order = 0;
        for (i, first) in cliques.iter().enumerate() {
            for (j, second) in cliques.iter().enumerate().skip(i + 1) {
                let mass = first.variables().iter().filter(|v| second.contains(**v)).count();
                heap.push(Reverse(SepsetCandidate {
                    cliques: [CliqueId(i), CliqueId(j)],
                    mass,
                    cost: first.size().saturating_add(second.size()),
                    order,
                }));
                order += 1;
            }
        }
        SepsetCandidateHeap { heap }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Removes and returns the candidate with the largest overlap,
    /// ties go to the cheaper pair of cliques
    #[inline]
    pub fn extract_min(&mut self) -> Option<SepsetCandidate> {
        self.heap.pop().map(|Reverse(candidate)| candidate)
    }
}
