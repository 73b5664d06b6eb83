use std::collections::HashMap;

use tracing::{debug, trace};

use crate::{
    core::{init_potential, Interface, JTError, JTResult, Potential, Variable, VariableId},
    junction_tree::{
        clique::{Clique, CliqueId, Sepset, SepsetId},
        sepset_heap::SepsetCandidateHeap,
    },
};

// ------------------------------------------------------------------------------------------

/// Cliques visited by one traversal of a join tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitedSet(Vec<bool>);

impl VisitedSet {
    #[inline]
    pub fn new(cliques_number: usize) -> Self {
        VisitedSet(vec![false; cliques_number])
    }

    /// Marks a clique, returns false if it was already marked
    #[inline]
    pub fn insert(&mut self, clique: CliqueId) -> bool {
        !std::mem::replace(&mut self.0[clique.0], true)
    }

    #[inline]
    pub fn contains(&self, clique: CliqueId) -> bool {
        self.0[clique.0]
    }

    #[inline]
    pub fn clear(&mut self) {
        self.0.iter_mut().for_each(|x| *x = false);
    }

    /// Number of cliques the set is sized for
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.0.iter().filter(|x| **x).count()
    }
}

/// The clique holding a variable with its parents and where the family's dimensions are
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Family {
    pub(crate) clique: CliqueId,
    pub(crate) mapping: Vec<usize>,
}

// ------------------------------------------------------------------------------------------

/// A join tree of cliques connected by sepsets.
///
/// Cliques and sepsets live in arenas and refer to each other by index.
/// The family of every variable is located once, when the tree is assembled.
#[derive(Debug, Clone)]
pub struct JoinTree {
    pub(crate) variables: Vec<Variable>,
    pub(crate) positions: HashMap<VariableId, usize>,
    pub(crate) cliques: Vec<Clique>,
    pub(crate) sepsets: Vec<Sepset>,
    pub(crate) families: Vec<Option<Family>>,
}

impl JoinTree {
    /// Connects cliques with sepsets so that the result is a tree
    ///
    /// Candidates for every pair of cliques are taken largest overlap first
    /// and rejected if their cliques are already connected.
    pub fn assemble(variables: Vec<Variable>, mut cliques: Vec<Clique>) -> JTResult<Self> {
        let required = cliques.len().saturating_sub(1);
        let mut candidates = SepsetCandidateHeap::new(&cliques);
        let mut sepsets: Vec<Sepset> = Vec::with_capacity(required);
        while sepsets.len() < required {
            let candidate = candidates
                .extract_min()
                .ok_or(JTError::DisconnectedCandidates {
                    accepted: sepsets.len(),
                    required,
                })?;
            let [a, b] = candidate.cliques;
            if connected(&cliques, &sepsets, a, b) {
                trace!(%a, %b, mass = candidate.mass, "rejected sepset candidate");
                continue;
            }
            let id = SepsetId(sepsets.len());
            sepsets.push(Sepset::new([a, b], [&cliques[a.0], &cliques[b.0]])?);
            cliques[a.0].sepsets.push(id);
            cliques[b.0].sepsets.push(id);
            trace!(%id, %a, %b, mass = candidate.mass, cost = candidate.cost, "accepted sepset");
        }
        debug!(
            cliques = cliques.len(),
            sepsets = sepsets.len(),
            discarded = candidates.len(),
            "assembled join tree"
        );
        let positions = variables
            .iter()
            .enumerate()
            .map(|(i, v)| (v.id(), i))
            .collect();
        let families = variables
            .iter()
            .map(|v| locate_family(&cliques, &v.family()))
            .collect();
        Ok(JoinTree {
            variables,
            positions,
            cliques,
            sepsets,
            families,
        })
    }

    #[inline]
    pub fn cliques(&self) -> &[Clique] {
        &self.cliques
    }

    #[inline]
    pub fn sepsets(&self) -> &[Sepset] {
        &self.sepsets
    }

    #[inline]
    pub fn clique(&self, id: CliqueId) -> Option<&Clique> {
        self.cliques.get(id.0)
    }

    #[inline]
    pub fn sepset(&self, id: SepsetId) -> Option<&Sepset> {
        self.sepsets.get(id.0)
    }

    #[inline]
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    #[inline]
    pub fn variable(&self, id: VariableId) -> Option<&Variable> {
        self.positions.get(&id).map(|i| &self.variables[*i])
    }

    /// Looks a variable up by its symbol
    pub fn find_variable(&self, symbol: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.symbol() == symbol)
    }

    /// A fresh visited set sized for this tree
    #[inline]
    pub fn visited_set(&self) -> VisitedSet {
        VisitedSet::new(self.cliques.len())
    }

    /// The first clique containing a variable and all of its parents
    #[inline]
    pub fn family_clique(&self, variable: VariableId) -> Option<CliqueId> {
        self.family(variable).map(|f| f.clique)
    }

    /// Dimensions of the family clique that the family (child first, then
    /// parents in declaration order) corresponds to
    #[inline]
    pub fn family_mapping(&self, variable: VariableId) -> Option<&[usize]> {
        self.family(variable).map(|f| f.mapping.as_slice())
    }

    /// The smallest clique containing all given variables
    pub fn find_clique(&self, variables: &[VariableId]) -> Option<CliqueId> {
        self.cliques
            .iter()
            .enumerate()
            .filter(|(_, c)| c.contains_all(variables))
            .min_by_key(|(_, c)| c.size())
            .map(|(i, _)| CliqueId(i))
    }

    /// The clique holding every variable of a time slice interface
    pub fn interface_clique(&self, interface: Interface) -> Option<CliqueId> {
        let members: Vec<VariableId> = self
            .variables
            .iter()
            .filter(|v| v.interface() == Some(interface))
            .map(|v| v.id())
            .collect();
        self.find_clique(&members)
    }

    /// Multiplies the conditional probability table of a variable into a clique
    ///
    /// # Arguments
    ///
    /// * `clique` - A clique containing the variable and its parents
    /// * `child` - The variable whose table is entered
    /// * `cpd` - The table, dimensions ordered as the child followed by its parents
    /// * `transient` - If false, the evidence free baseline used by retraction is updated too
    pub fn init_clique(
        &mut self,
        clique: CliqueId,
        child: VariableId,
        cpd: &Potential,
        transient: bool,
    ) -> JTResult<()> {
        let family = self
            .variable(child)
            .ok_or(JTError::UnknownVariable(child))?
            .family();
        if cpd.num_dimensions() != family.len() {
            return Err(JTError::DimensionMismatch {
                expected: family.len(),
                found: cpd.num_dimensions(),
            });
        }
        let target = self
            .cliques
            .get_mut(clique.0)
            .ok_or(JTError::UnknownClique(clique.0))?;
        let mapping = target.mapping(&family, clique.0)?;
        init_potential(cpd, &mut target.p, &mapping)?;
        if !transient {
            init_potential(cpd, &mut target.original_p, &mapping)?;
        }
        trace!(%clique, %child, transient, "initialized clique");
        Ok(())
    }

    #[inline]
    pub(crate) fn position(&self, variable: VariableId) -> JTResult<usize> {
        self.positions
            .get(&variable)
            .copied()
            .ok_or(JTError::UnknownVariable(variable))
    }

    #[inline]
    fn family(&self, variable: VariableId) -> Option<&Family> {
        let i = self.positions.get(&variable)?;
        self.families[*i].as_ref()
    }
}

// ------------------------------------------------------------------------------------------

fn locate_family(cliques: &[Clique], family: &[VariableId]) -> Option<Family> {
    cliques.iter().enumerate().find_map(|(i, clique)| {
        clique.mapping(family, i).ok().map(|mapping| Family {
            clique: CliqueId(i),
            mapping,
        })
    })
}

// true if `to` is reachable from `from` over the given sepsets
fn connected(cliques: &[Clique], sepsets: &[Sepset], from: CliqueId, to: CliqueId) -> bool {
    let mut visited = VisitedSet::new(cliques.len());
    let mut stack = vec![from];
    visited.insert(from);
    while let Some(clique) = stack.pop() {
        if clique == to {
            return true;
        }
        for sepset in &cliques[clique.0].sepsets {
            if let Some(next) = sepsets[sepset.0].other(clique) {
                if visited.insert(next) {
                    stack.push(next);
                }
            }
        }
    }
    false
}
