use thiserror::Error;

use crate::core::variable::VariableId;

// ------------------------------------------------------------------------------------------

/// Errors that could appear while building or querying a join tree.
///
/// Lookups that may legitimately come back empty (e.g. the family clique of a
/// variable) return `Option` instead, so an `Err` always means a failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum JTError {
    /// Number of dimensions of a potential does not match what an operation expects
    #[error("Potential has {found} dimensions but {expected} were expected")]
    DimensionMismatch { expected: usize, found: usize },

    /// Flat data given to a potential does not match the product of its cardinalities
    #[error("Potential with cardinalities {cardinalities:?} needs {expected} values, got {found}")]
    DataLength {
        cardinalities: Vec<usize>,
        expected: usize,
        found: usize,
    },

    /// An index mapping refers to a dimension that does not exist or has a different cardinality
    #[error("Invalid index mapping {mapping:?} from {source_cardinalities:?} into {target_cardinalities:?}")]
    InvalidMapping {
        mapping: Vec<usize>,
        source_cardinalities: Vec<usize>,
        target_cardinalities: Vec<usize>,
    },

    /// A dimension index is out of range of a potential
    #[error("Dimension {dimension} is out of range of a potential with {dimensions} dimensions")]
    OutOfRangeDimension { dimension: usize, dimensions: usize },

    /// A variable cannot have zero states
    #[error("Variable {0} must have at least one state")]
    ZeroCardinality(String),

    /// Two variables share an id or a symbol
    #[error("Variable {0} is already registered")]
    DuplicateVariable(String),

    /// A variable id is not known to a graph or a join tree
    #[error("Unknown variable {0:?}")]
    UnknownVariable(VariableId),

    /// A variable is not a member of the clique an operation was asked to use
    #[error("Variable {variable:?} is not a member of clique {clique}")]
    VariableNotInClique { variable: VariableId, clique: usize },

    /// A clique id is out of range of a join tree
    #[error("Clique {0} does not exist")]
    UnknownClique(usize),

    /// A requested variable occurs twice in a query
    #[error("Variable {0:?} occurs more than once in a query")]
    RepeatedVariable(VariableId),

    /// A state name is not one of the variable's states
    #[error("Variable {variable} has no state named {state}")]
    UnknownState { variable: String, state: String },

    /// A state index is not smaller than the cardinality of a variable
    #[error("State index {index} is out of range of [0..{cardinality}] for variable {variable}")]
    OutOfRangeState {
        variable: String,
        index: usize,
        cardinality: usize,
    },

    /// Evidence or prior vector length does not match the cardinality of a variable
    #[error("Vector of length {found} given for variable {variable} with {expected} states")]
    EvidenceLength {
        variable: String,
        expected: usize,
        found: usize,
    },

    /// Every node has to be added to a graph before the first edge
    #[error("Graph has {added} of {size} nodes, all nodes must be added before edges")]
    IncompleteGraph { added: usize, size: usize },

    /// More nodes than the graph was created for
    #[error("Graph of size {0} is full")]
    GraphFull(usize),

    /// A variable is declared as its own parent
    #[error("Variable {0:?} can not be its own parent")]
    SelfLoop(VariableId),

    /// The parents and table of a variable are declared more than once
    #[error("Family of variable {0} is already declared")]
    DuplicateFamily(String),

    /// Nodes can not be added after edges
    #[error("Variables can not be added after edges")]
    EdgesAlreadyAdded,

    /// Two graphs combined by a union are not defined over the same variables
    #[error("Graphs are defined over different variable sets")]
    IncompatibleGraphs,

    /// No cliques can be found for a graph without nodes
    #[error("Graph has no variables")]
    EmptyGraph,

    /// No clique contains a variable together with its parents
    #[error("No clique contains the family of variable {0:?}")]
    NoFamilyClique(VariableId),

    /// Too few sepset candidates could be accepted to connect all cliques
    #[error("Only {accepted} of {required} sepsets could be accepted, the candidate set is disconnected")]
    DisconnectedCandidates { accepted: usize, required: usize },

    /// A sepset does not exist or does not touch the clique a traversal came from
    #[error("Sepset {sepset} is not attached to clique {clique}")]
    DetachedSepset { sepset: usize, clique: usize },

    /// A visited set was sized for a different join tree
    #[error("Visited set tracks {found} cliques but the join tree has {expected}")]
    VisitedSetSize { expected: usize, found: usize },

    /// A sepset is not adjacent to a clique used in a message pass
    #[error("Sepset {sepset} does not join cliques {from} and {to}")]
    NotAdjacent { sepset: usize, from: usize, to: usize },
}

/// Join tree methods result type
pub type JTResult<T> = Result<T, JTError>;
