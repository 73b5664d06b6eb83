use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{
    core::{EliminationHeuristic, Graph, JTError, JTResult, JoinTreeConfig},
    junction_tree::{
        clique::Clique,
        elimination_heap::{EliminationHeap, InducedCluster},
        join_tree::JoinTree,
    },
};

// ------------------------------------------------------------------------------------------

/// Outcome of a greedy triangulation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triangulation {
    /// Clique candidates as sorted variable positions, in the order they were found
    pub cliques: Vec<Vec<usize>>,

    /// Positions of the variables in elimination order
    pub elimination_order: Vec<usize>,

    /// Edges added to make the graph chordal
    pub fill_in_edges: Vec<[usize; 2]>,
}

/// Triangulates an undirected graph by greedy variable elimination
///
/// # Arguments
///
/// * `graph` - An undirected graph, e.g. the output of [`Graph::moralize`]
/// * `heuristic` - Elimination cost
///
/// # Notes
///
/// Finding an optimal triangulation is NP-hard, the greedy choice of the
/// cheapest induced cluster is an approximation.
pub fn triangulate(graph: &Graph, heuristic: EliminationHeuristic) -> Triangulation {
    let cardinalities: Vec<usize> = graph.variables().iter().map(|v| v.cardinality()).collect();
    let mut adjacency = graph.adjacency().clone();
    let mut heap = EliminationHeap::new(&adjacency, &cardinalities, heuristic);
    let mut cliques: Vec<Vec<usize>> = Vec::new();
    let mut elimination_order = Vec::with_capacity(graph.size());
    let mut fill_in_edges = Vec::new();
    while let Some(cluster) = heap.extract_min() {
        trace!(
            variable = cluster.variable,
            fill_in = cluster.fill_in,
            weight = cluster.weight,
            "eliminating"
        );
        for (k, a) in cluster.members.iter().enumerate() {
            for b in &cluster.members[k + 1..] {
                if !adjacency[[*a, *b]] {
                    adjacency[[*a, *b]] = true;
                    adjacency[[*b, *a]] = true;
                    fill_in_edges.push([*a, *b]);
                }
            }
        }
        // a later cluster never contains an eliminated variable, so it can
        // only be a subset of an earlier one and never a superset
        let is_subset = cliques
            .iter()
            .any(|clique| cluster.members.iter().all(|m| clique.binary_search(m).is_ok()));
        if !is_subset {
            cliques.push(cluster.members.clone());
        }
        for neighbour in cluster.neighbours() {
            let current = match heap.cluster(neighbour) {
                Some(current) => current,
                None => continue,
            };
            let members = current
                .members
                .iter()
                .chain(&cluster.members)
                .copied()
                .filter(|m| *m != cluster.variable)
                .collect();
            heap.update(InducedCluster::new(
                neighbour,
                members,
                &adjacency,
                &cardinalities,
            ));
        }
        elimination_order.push(cluster.variable);
    }
    debug!(
        cliques = cliques.len(),
        fill_in = fill_in_edges.len(),
        "triangulated graph"
    );
    Triangulation {
        cliques,
        elimination_order,
        fill_in_edges,
    }
}

/// Builds a join tree for a directed graph
///
/// The graph is moralized, time slice interfaces are connected (if enabled),
/// the result is triangulated and the cliques are joined by sepsets.
///
/// # Example
///
/// ```
/// use jtree::core::{Graph, JoinTreeConfig, Variable, VariableId};
/// use jtree::junction_tree::find_cliques;
///
/// let a = Variable::with_cardinality(VariableId(0), "a", 2).unwrap();
/// let b = Variable::with_cardinality(VariableId(1), "b", 2).unwrap();
/// let c = Variable::with_cardinality(VariableId(2), "c", 2).unwrap();
/// let mut graph = Graph::new(3);
/// for v in [&a, &b, &c] {
///     graph.add_variable(v).unwrap();
/// }
/// graph.add_child(a.id(), b.id()).unwrap();
/// graph.add_child(b.id(), c.id()).unwrap();
/// let tree = find_cliques(&graph, &JoinTreeConfig::default()).unwrap();
/// assert_eq!(tree.cliques().len(), 2);
/// assert_eq!(tree.sepsets().len(), 1);
/// assert_eq!(tree.sepsets()[0].variables(), &[b.id()]);
/// ```
pub fn find_cliques(graph: &Graph, config: &JoinTreeConfig) -> JTResult<JoinTree> {
    if graph.size() == 0 {
        return Err(JTError::EmptyGraph);
    }
    if !graph.is_complete() {
        return Err(JTError::IncompleteGraph {
            added: graph.variables().len(),
            size: graph.size(),
        });
    }
    let mut moral = graph.moralize();
    if config.connect_interfaces {
        moral.add_interface_edges();
    }
    let undirected = moral.make_undirected();
    let triangulation = triangulate(&undirected, config.heuristic);
    let variables = graph.variables();
    let cliques = triangulation
        .cliques
        .iter()
        .map(|members| Clique::new(members.iter().map(|m| &variables[*m])))
        .collect();
    JoinTree::assemble(variables.to_vec(), cliques)
}
