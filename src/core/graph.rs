use std::collections::HashMap;

use ndarray::Array2;
use tracing::debug;

use crate::core::{
    errors::{JTError, JTResult},
    variable::{Interface, Variable, VariableId},
};

// ------------------------------------------------------------------------------------------

/// A graph over a fixed number of variables stored as an adjacency matrix.
///
/// `adjacency[[i, j]]` means that the i-th variable is a parent of the j-th.
/// All variables must be added before the first edge.
#[derive(Debug, Clone)]
pub struct Graph {
    size: usize,
    variables: Vec<Variable>,
    positions: HashMap<VariableId, usize>,
    adjacency: Array2<bool>,
    has_edges: bool,
}

impl Graph {
    /// Creates a graph with room for `size` variables
    ///
    /// # Example
    ///
    /// ```
    /// use jtree::core::{Graph, Variable, VariableId};
    ///
    /// let cloudy = Variable::with_cardinality(VariableId(0), "cloudy", 2).unwrap();
    /// let rain = Variable::with_cardinality(VariableId(1), "rain", 2).unwrap();
    /// let mut graph = Graph::new(2);
    /// graph.add_variable(&cloudy).unwrap();
    /// graph.add_variable(&rain).unwrap();
    /// graph.add_child(cloudy.id(), rain.id()).unwrap();
    /// assert!(graph.is_child(cloudy.id(), rain.id()));
    /// assert!(!graph.is_child(rain.id(), cloudy.id()));
    /// ```
    pub fn new(size: usize) -> Self {
        Graph {
            size,
            variables: Vec::with_capacity(size),
            positions: HashMap::with_capacity(size),
            adjacency: Array2::from_elem((size, size), false),
            has_edges: false,
        }
    }

    /// Adds a variable and returns its position in the graph
    pub fn add_variable(&mut self, variable: &Variable) -> JTResult<usize> {
        if self.has_edges {
            return Err(JTError::EdgesAlreadyAdded);
        }
        if self.variables.len() == self.size {
            return Err(JTError::GraphFull(self.size));
        }
        if self.positions.contains_key(&variable.id()) {
            return Err(JTError::DuplicateVariable(variable.symbol().to_string()));
        }
        let position = self.variables.len();
        self.positions.insert(variable.id(), position);
        self.variables.push(variable.clone());
        Ok(position)
    }

    /// Adds a directed edge from `parent` to `child`
    pub fn add_child(&mut self, parent: VariableId, child: VariableId) -> JTResult<()> {
        if self.variables.len() != self.size {
            return Err(JTError::IncompleteGraph {
                added: self.variables.len(),
                size: self.size,
            });
        }
        if parent == child {
            return Err(JTError::SelfLoop(child));
        }
        let p = self.position(parent).ok_or(JTError::UnknownVariable(parent))?;
        let c = self.position(child).ok_or(JTError::UnknownVariable(child))?;
        self.adjacency[[p, c]] = true;
        self.variables[c].push_parent(parent);
        self.has_edges = true;
        Ok(())
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// True once every slot of the graph holds a variable
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.variables.len() == self.size
    }

    #[inline]
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    #[inline]
    pub fn position(&self, id: VariableId) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    #[inline]
    pub fn adjacency(&self) -> &Array2<bool> {
        &self.adjacency
    }

    #[inline]
    pub fn is_child(&self, parent: VariableId, child: VariableId) -> bool {
        match (self.position(parent), self.position(child)) {
            (Some(p), Some(c)) => self.adjacency[[p, c]],
            _ => false,
        }
    }

    /// Positions of the variables adjacent to the i-th one in either direction
    pub fn neighbours(&self, i: usize) -> Vec<usize> {
        (0..self.size)
            .filter(|j| *j != i && (self.adjacency[[i, *j]] || self.adjacency[[*j, i]]))
            .collect()
    }

    /// Positions of the parents of the i-th variable
    pub fn parents_of(&self, i: usize) -> Vec<usize> {
        (0..self.size).filter(|j| self.adjacency[[*j, i]]).collect()
    }

    /// Returns the moral graph: every pair of parents of a common child gets
    /// connected and every edge becomes undirected.
    pub fn moralize(&self) -> Graph {
        let mut moral = self.make_undirected();
        let mut married = 0;
        for child in 0..self.size {
            let parents = self.parents_of(child);
            for (k, p) in parents.iter().enumerate() {
                for q in &parents[k + 1..] {
                    if !moral.adjacency[[*p, *q]] {
                        married += 1;
                    }
                    moral.adjacency[[*p, *q]] = true;
                    moral.adjacency[[*q, *p]] = true;
                }
            }
        }
        debug!(variables = self.size, married, "moralized graph");
        moral
    }

    /// Returns a graph whose adjacency is the logical OR of this one and its transpose
    pub fn make_undirected(&self) -> Graph {
        let adjacency = Array2::from_shape_fn((self.size, self.size), |(i, j)| {
            self.adjacency[[i, j]] || self.adjacency[[j, i]]
        });
        Graph {
            adjacency,
            ..self.clone()
        }
    }

    /// Returns a graph containing the edges of both graphs. Both graphs must
    /// hold the same variables at the same positions.
    pub fn union(&self, other: &Graph) -> JTResult<Graph> {
        let same_variables = self.size == other.size
            && self
                .variables
                .iter()
                .zip(&other.variables)
                .all(|(a, b)| a.id() == b.id());
        if !same_variables || self.variables.len() != other.variables.len() {
            return Err(JTError::IncompatibleGraphs);
        }
        let adjacency = Array2::from_shape_fn((self.size, self.size), |(i, j)| {
            self.adjacency[[i, j]] || other.adjacency[[i, j]]
        });
        let mut variables = self.variables.clone();
        for (variable, theirs) in variables.iter_mut().zip(&other.variables) {
            for parent in theirs.parents() {
                variable.push_parent(*parent);
            }
        }
        Ok(Graph {
            adjacency,
            variables,
            has_edges: self.has_edges || other.has_edges,
            ..self.clone()
        })
    }

    /// Fully connects the variables of each time slice interface, so that
    /// every interface ends up inside a single clique.
    pub fn add_interface_edges(&mut self) {
        for role in [Interface::Incoming, Interface::Outgoing] {
            let members: Vec<usize> = self
                .variables
                .iter()
                .enumerate()
                .filter(|(_, v)| v.interface() == Some(role))
                .map(|(i, _)| i)
                .collect();
            for (k, a) in members.iter().enumerate() {
                for b in &members[k + 1..] {
                    self.adjacency[[*a, *b]] = true;
                    self.adjacency[[*b, *a]] = true;
                }
            }
            debug!(?role, size = members.len(), "connected interface");
        }
    }
}
