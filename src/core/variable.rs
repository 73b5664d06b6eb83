use std::{
    cmp::Ordering,
    fmt::Display,
    hash::{Hash, Hasher},
};

use serde::{Deserialize, Serialize};

use crate::core::errors::{JTError, JTResult};

// ------------------------------------------------------------------------------------------

/// Identifier of a variable. Ids are assigned in increasing order and define
/// the order of variables inside cliques and sepsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VariableId(pub usize);

impl Display for VariableId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Role of a variable on the boundary between two time slices of a dynamic network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interface {
    /// Represents the value of some variable in the previous time slice
    Incoming,
    /// Its value is carried to the next time slice
    Outgoing,
}

/// A discrete random variable.
///
/// Two variables are equal iff their ids are equal.
#[derive(Debug, Clone)]
pub struct Variable {
    id: VariableId,
    symbol: String,
    states: Vec<String>,
    parents: Vec<VariableId>,
    likelihood: Vec<f64>,
    prior: Option<Vec<f64>>,
    interface: Option<Interface>,
    previous: Option<VariableId>,
}

impl Variable {
    /// Creates a new variable with named states and a uniform likelihood
    ///
    /// # Arguments
    ///
    /// * `id` - A unique id of a variable
    /// * `symbol` - A name of a variable
    /// * `states` - Names of states, their number is the cardinality
    ///
    /// # Example
    ///
    /// ```
    /// use jtree::core::{Variable, VariableId};
    ///
    /// let rain = Variable::new(VariableId(0), "rain", &["no", "yes"]).unwrap();
    /// assert_eq!(rain.cardinality(), 2);
    /// assert_eq!(rain.state_index("yes"), Some(1));
    /// assert_eq!(rain.likelihood(), &[1., 1.]);
    /// ```
    pub fn new(id: VariableId, symbol: &str, states: &[&str]) -> JTResult<Self> {
        if states.is_empty() {
            return Err(JTError::ZeroCardinality(symbol.to_string()));
        }
        Ok(Variable {
            id,
            symbol: symbol.to_string(),
            states: states.iter().map(|s| s.to_string()).collect(),
            parents: Vec::new(),
            likelihood: vec![1f64; states.len()],
            prior: None,
            interface: None,
            previous: None,
        })
    }

    /// Creates a new variable whose states are named by their indices
    pub fn with_cardinality(id: VariableId, symbol: &str, cardinality: usize) -> JTResult<Self> {
        let names: Vec<String> = (0..cardinality).map(|i| i.to_string()).collect();
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        Variable::new(id, symbol, &names)
    }

    #[inline]
    pub fn id(&self) -> VariableId {
        self.id
    }

    #[inline]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    #[inline]
    pub fn cardinality(&self) -> usize {
        self.states.len()
    }

    #[inline]
    pub fn states(&self) -> &[String] {
        &self.states
    }

    #[inline]
    pub fn state_index(&self, state: &str) -> Option<usize> {
        self.states.iter().position(|s| s == state)
    }

    /// Parents in the order they were declared, this is also the order
    /// of the parent dimensions of the variable's conditional probability table
    #[inline]
    pub fn parents(&self) -> &[VariableId] {
        &self.parents
    }

    #[inline]
    pub(crate) fn push_parent(&mut self, parent: VariableId) {
        if !self.parents.contains(&parent) {
            self.parents.push(parent);
        }
    }

    /// The child followed by its parents
    pub fn family(&self) -> Vec<VariableId> {
        std::iter::once(self.id)
            .chain(self.parents.iter().copied())
            .collect()
    }

    /// Current likelihood (evidence) vector
    #[inline]
    pub fn likelihood(&self) -> &[f64] {
        &self.likelihood
    }

    pub(crate) fn set_likelihood(&mut self, likelihood: &[f64]) -> JTResult<()> {
        self.check_length(likelihood)?;
        self.likelihood.copy_from_slice(likelihood);
        Ok(())
    }

    /// True if the likelihood carries no information
    #[inline]
    pub fn is_unobserved(&self) -> bool {
        self.likelihood.iter().all(|x| *x == 1f64)
    }

    #[inline]
    pub fn prior(&self) -> Option<&[f64]> {
        self.prior.as_deref()
    }

    pub(crate) fn set_prior(&mut self, prior: &[f64]) -> JTResult<()> {
        self.check_length(prior)?;
        self.prior = Some(prior.to_vec());
        Ok(())
    }

    #[inline]
    pub fn interface(&self) -> Option<Interface> {
        self.interface
    }

    #[inline]
    pub fn set_interface(&mut self, interface: Option<Interface>) {
        self.interface = interface;
    }

    /// The variable holding this variable's value in the previous time slice
    #[inline]
    pub fn previous(&self) -> Option<VariableId> {
        self.previous
    }

    #[inline]
    pub fn set_previous(&mut self, previous: Option<VariableId>) {
        self.previous = previous;
    }

    pub(crate) fn check_length(&self, vector: &[f64]) -> JTResult<()> {
        if vector.len() != self.cardinality() {
            return Err(JTError::EvidenceLength {
                variable: self.symbol.clone(),
                expected: self.cardinality(),
                found: vector.len(),
            });
        }
        Ok(())
    }
}

impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Variable {}

impl Hash for Variable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for Variable {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Variable {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}
