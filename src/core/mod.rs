mod config;
mod errors;
mod graph;
mod network_builder;
mod potential;
mod variable;

pub use config::{EliminationHeuristic, JoinTreeConfig};
pub use errors::{JTError, JTResult};
pub use graph::Graph;
pub use network_builder::NetworkBuilder;
pub use potential::{
    flat_index, indices_of, init_potential, marginalize, normalize, total_marginalize, update,
    update_evidence, Potential,
};
pub use variable::{Interface, Variable, VariableId};
