use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::core::{JTError, JTResult, Potential, Variable, VariableId};

// ------------------------------------------------------------------------------------------

/// Index of a clique inside its join tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CliqueId(pub usize);

/// Index of a sepset inside its join tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SepsetId(pub usize);

impl Display for CliqueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "C{}", self.0)
    }
}

impl Display for SepsetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "S{}", self.0)
    }
}

// ------------------------------------------------------------------------------------------

/// A node of a join tree
#[derive(Debug, Clone)]
pub struct Clique {
    variables: Vec<VariableId>,
    pub(crate) p: Potential,
    pub(crate) original_p: Potential,
    pub(crate) sepsets: Vec<SepsetId>,
}

impl Clique {
    /// Creates a clique with uniform potentials, members are sorted by id
    pub fn new<'a>(members: impl IntoIterator<Item = &'a Variable>) -> Self {
        let mut members: Vec<&Variable> = members.into_iter().collect();
        members.sort();
        members.dedup();
        let variables = members.iter().map(|v| v.id()).collect();
        let cardinalities: Vec<usize> = members.iter().map(|v| v.cardinality()).collect();
        Clique {
            variables,
            p: Potential::ones(&cardinalities),
            original_p: Potential::ones(&cardinalities),
            sepsets: Vec::new(),
        }
    }

    /// Members sorted by id, dimension i of the potential belongs to the i-th of them
    #[inline]
    pub fn variables(&self) -> &[VariableId] {
        &self.variables
    }

    #[inline]
    pub fn potential(&self) -> &Potential {
        &self.p
    }

    /// The potential without evidence, used for retraction
    #[inline]
    pub fn original_potential(&self) -> &Potential {
        &self.original_p
    }

    #[inline]
    pub fn sepsets(&self) -> &[SepsetId] {
        &self.sepsets
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.p.size()
    }

    #[inline]
    pub fn variable_index(&self, variable: VariableId) -> Option<usize> {
        self.variables.binary_search(&variable).ok()
    }

    #[inline]
    pub fn contains(&self, variable: VariableId) -> bool {
        self.variable_index(variable).is_some()
    }

    #[inline]
    pub fn contains_all(&self, variables: &[VariableId]) -> bool {
        variables.iter().all(|v| self.contains(*v))
    }

    #[inline]
    pub fn cardinality(&self, variable: VariableId) -> Option<usize> {
        self.variable_index(variable)
            .map(|i| self.p.cardinalities()[i])
    }

    /// Dimensions of this clique's potential that the given variables correspond to
    pub fn mapping(&self, variables: &[VariableId], clique: usize) -> JTResult<Vec<usize>> {
        variables
            .iter()
            .map(|v| {
                self.variable_index(*v).ok_or(JTError::VariableNotInClique {
                    variable: *v,
                    clique,
                })
            })
            .collect()
    }

    /// Variables shared with another clique, sorted by id
    pub fn intersection(&self, other: &Clique) -> Vec<VariableId> {
        self.variables
            .iter()
            .copied()
            .filter(|v| other.contains(*v))
            .collect()
    }
}

// ------------------------------------------------------------------------------------------

/// An edge of a join tree
#[derive(Debug, Clone)]
pub struct Sepset {
    cliques: [CliqueId; 2],
    variables: Vec<VariableId>,
    pub(crate) old: Potential,
    pub(crate) new: Potential,
    pub(crate) mappings: [Vec<usize>; 2],
}

impl Sepset {
    /// Creates a sepset over the intersection of two cliques
    pub fn new(ids: [CliqueId; 2], cliques: [&Clique; 2]) -> JTResult<Self> {
        let variables = cliques[0].intersection(cliques[1]);
        let cardinalities: Vec<usize> = variables
            .iter()
            .filter_map(|v| cliques[0].cardinality(*v))
            .collect();
        let mappings = [
            cliques[0].mapping(&variables, ids[0].0)?,
            cliques[1].mapping(&variables, ids[1].0)?,
        ];
        Ok(Sepset {
            cliques: ids,
            variables,
            old: Potential::ones(&cardinalities),
            new: Potential::ones(&cardinalities),
            mappings,
        })
    }

    #[inline]
    pub fn cliques(&self) -> [CliqueId; 2] {
        self.cliques
    }

    #[inline]
    pub fn variables(&self) -> &[VariableId] {
        &self.variables
    }

    /// The message sent most recently through this sepset
    #[inline]
    pub fn new_potential(&self) -> &Potential {
        &self.new
    }

    /// The message sent before the most recent one
    #[inline]
    pub fn old_potential(&self) -> &Potential {
        &self.old
    }

    /// The clique on the other side of the sepset
    #[inline]
    pub fn other(&self, clique: CliqueId) -> Option<CliqueId> {
        match self.side(clique)? {
            0 => Some(self.cliques[1]),
            _ => Some(self.cliques[0]),
        }
    }

    #[inline]
    pub(crate) fn side(&self, clique: CliqueId) -> Option<usize> {
        self.cliques.iter().position(|c| *c == clique)
    }

    /// Dimensions of the given neighbour's potential that this sepset's dimensions correspond to
    #[inline]
    pub fn mapping(&self, clique: CliqueId) -> Option<&[usize]> {
        self.side(clique).map(|side| self.mappings[side].as_slice())
    }
}
