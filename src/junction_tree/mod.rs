mod clique;
mod elimination_heap;
mod join_tree;
mod propagation;
mod sepset_heap;
mod triangulation;

pub use clique::{Clique, CliqueId, Sepset, SepsetId};
pub use elimination_heap::{EliminationHeap, InducedCluster};
pub use join_tree::{JoinTree, VisitedSet};
pub use propagation::EvidenceOutcome;
pub use sepset_heap::{SepsetCandidate, SepsetCandidateHeap};
pub use triangulation::{find_cliques, triangulate, Triangulation};
