use tracing::debug;

use crate::{
    core::{
        config::JoinTreeConfig,
        errors::{JTError, JTResult},
        graph::Graph,
        potential::Potential,
        variable::{Interface, Variable, VariableId},
    },
    junction_tree::{find_cliques, JoinTree},
};

// ------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
/// A Bayesian network builder
pub struct NetworkBuilder {
    variables: Vec<Variable>,
    edges: Vec<(VariableId, VariableId)>,
    cpds: Vec<(VariableId, Potential)>,
    priors: Vec<(VariableId, Vec<f64>)>,
}

impl NetworkBuilder {
    /// Creates an empty network
    #[inline]
    pub fn new() -> Self {
        NetworkBuilder::default()
    }

    /// Adds a variable and returns its id. Ids are assigned in the order
    /// variables are added.
    ///
    /// # Arguments
    ///
    /// * `symbol` - A unique name of a variable
    /// * `states` - Names of the variable's states
    ///
    /// # Notes
    ///
    /// All variables have to be added before the first family.
    ///
    /// # Example
    ///
    /// ```
    /// use jtree::core::{NetworkBuilder, VariableId};
    ///
    /// let mut nb = NetworkBuilder::new();
    /// let a = nb.add_variable("a", &["on", "off"]).unwrap();
    /// let b = nb.add_variable("b", &["low", "mid", "high"]).unwrap();
    /// assert_eq!((a, b), (VariableId(0), VariableId(1)));
    /// assert!(nb.add_variable("a", &["x"]).is_err());
    /// ```
    pub fn add_variable(&mut self, symbol: &str, states: &[&str]) -> JTResult<VariableId> {
        if !self.edges.is_empty() {
            return Err(JTError::EdgesAlreadyAdded);
        }
        if self.variables.iter().any(|v| v.symbol() == symbol) {
            return Err(JTError::DuplicateVariable(symbol.to_string()));
        }
        let id = VariableId(self.variables.len());
        self.variables.push(Variable::new(id, symbol, states)?);
        Ok(id)
    }

    /// Adds a variable whose states are named by their indices
    pub fn add_variable_with_cardinality(&mut self, symbol: &str, cardinality: usize) -> JTResult<VariableId> {
        let names: Vec<String> = (0..cardinality).map(|i| i.to_string()).collect();
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        self.add_variable(symbol, &names)
    }

    /// Declares the parents of a variable together with its conditional probability table
    ///
    /// # Arguments
    ///
    /// * `child` - A variable
    /// * `parents` - Its parents
    /// * `cpd` - A table whose dimensions are the child followed by `parents` in the given order
    ///
    /// # Notes
    ///
    /// Every variable has at most one family, a second declaration is an error.
    pub fn add_family(&mut self, child: VariableId, parents: &[VariableId], cpd: Potential) -> JTResult<()> {
        let symbol = self.get(child)?.symbol();
        if self.cpds.iter().any(|(c, _)| *c == child) {
            return Err(JTError::DuplicateFamily(symbol.to_string()));
        }
        for (k, parent) in parents.iter().enumerate() {
            if *parent == child {
                return Err(JTError::SelfLoop(child));
            }
            if parents[..k].contains(parent) {
                return Err(JTError::RepeatedVariable(*parent));
            }
        }
        let mut cardinalities = vec![self.get(child)?.cardinality()];
        for parent in parents {
            cardinalities.push(self.get(*parent)?.cardinality());
        }
        if cpd.cardinalities() != cardinalities.as_slice() {
            return Err(JTError::InvalidMapping {
                mapping: (0..cardinalities.len()).collect(),
                source_cardinalities: cpd.cardinalities().to_vec(),
                target_cardinalities: cardinalities,
            });
        }
        for parent in parents {
            self.edges.push((*parent, child));
        }
        self.cpds.push((child, cpd));
        Ok(())
    }

    /// Declares a prior distribution of a variable
    pub fn set_prior(&mut self, variable: VariableId, prior: &[f64]) -> JTResult<()> {
        self.get(variable)?.check_length(prior)?;
        self.priors.push((variable, prior.to_vec()));
        Ok(())
    }

    /// Declares that `previous` holds the value `current` had in the previous
    /// time slice, which puts both on a time slice interface
    pub fn link_previous(&mut self, current: VariableId, previous: VariableId) -> JTResult<()> {
        self.get(previous)?;
        let variable = self.get_mut(current)?;
        variable.set_previous(Some(previous));
        variable.set_interface(Some(Interface::Outgoing));
        self.get_mut(previous)?.set_interface(Some(Interface::Incoming));
        Ok(())
    }

    #[inline]
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Returns the directed graph of the network
    pub fn graph(&self) -> JTResult<Graph> {
        let mut graph = Graph::new(self.variables.len());
        for variable in &self.variables {
            graph.add_variable(variable)?;
        }
        for (parent, child) in &self.edges {
            graph.add_child(*parent, *child)?;
        }
        Ok(graph)
    }

    /// Returns a join tree with every table and prior entered
    ///
    /// # Example
    ///
    /// ```
    /// use jtree::core::{JoinTreeConfig, NetworkBuilder, Potential};
    ///
    /// let mut nb = NetworkBuilder::new();
    /// let a = nb.add_variable_with_cardinality("a", 2).unwrap();
    /// let b = nb.add_variable_with_cardinality("b", 3).unwrap();
    /// nb.set_prior(a, &[0.3, 0.7]).unwrap();
    /// let cpd = Potential::new(&[3, 2], Some(&[0.2, 0.3, 0.5, 0.6, 0.3, 0.1])).unwrap();
    /// nb.add_family(b, &[a], cpd).unwrap();
    /// let mut tree = nb.build(&JoinTreeConfig::default()).unwrap();
    /// tree.make_consistent().unwrap();
    /// let marginal = tree.variable_marginal(b).unwrap();
    /// assert!((marginal[0] - (0.3 * 0.2 + 0.7 * 0.6)).abs() < 1e-12);
    /// ```
    pub fn build(&self, config: &JoinTreeConfig) -> JTResult<JoinTree> {
        let graph = self.graph()?;
        let mut tree = find_cliques(&graph, config)?;
        for (child, cpd) in &self.cpds {
            let clique = tree
                .family_clique(*child)
                .ok_or(JTError::NoFamilyClique(*child))?;
            tree.init_clique(clique, *child, cpd, false)?;
        }
        for (variable, prior) in &self.priors {
            tree.enter_prior(*variable, prior)?;
        }
        debug!(
            variables = self.variables.len(),
            tables = self.cpds.len(),
            priors = self.priors.len(),
            "network compiled"
        );
        Ok(tree)
    }

    // private methods ----------------------------------------------------------------------

    fn get(&self, id: VariableId) -> JTResult<&Variable> {
        self.variables.get(id.0).ok_or(JTError::UnknownVariable(id))
    }

    fn get_mut(&mut self, id: VariableId) -> JTResult<&mut Variable> {
        self.variables.get_mut(id.0).ok_or(JTError::UnknownVariable(id))
    }
}
