use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{
    core::{
        init_potential, marginalize, normalize, total_marginalize, update, update_evidence,
        JTError, JTResult, Potential, VariableId,
    },
    junction_tree::{
        clique::{Clique, CliqueId, SepsetId},
        join_tree::{JoinTree, VisitedSet},
    },
};

// ------------------------------------------------------------------------------------------

/// How a piece of evidence was entered into a join tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvidenceOutcome {
    /// Only the family clique of the variable was updated
    Incremental,

    /// The evidence revived a state excluded before, so the whole tree was
    /// reset to its baseline and every likelihood entered again
    Retracted,
}

impl JoinTree {
    /// Sends a message from one clique to its neighbour through the sepset joining them
    ///
    /// The previous message is kept in the sepset and divided out of the
    /// receiver, so passing messages repeatedly does not count evidence twice.
    pub fn message_pass(&mut self, from: CliqueId, sepset: SepsetId, to: CliqueId) -> JTResult<()> {
        let not_adjacent = JTError::NotAdjacent {
            sepset: sepset.0,
            from: from.0,
            to: to.0,
        };
        let s = self.sepsets.get_mut(sepset.0).ok_or(not_adjacent.clone())?;
        let (from_side, to_side) = match (s.side(from), s.side(to)) {
            (Some(f), Some(t)) if f != t => (f, t),
            _ => return Err(not_adjacent),
        };
        std::mem::swap(&mut s.old, &mut s.new);
        marginalize(&self.cliques[from.0].p, &mut s.new, &s.mappings[from_side])?;
        update(
            Some(&s.new),
            Some(&s.old),
            &mut self.cliques[to.0].p,
            &s.mappings[to_side],
        )?;
        trace!(%from, %sepset, %to, "message passed");
        Ok(())
    }

    /// Passes messages towards `clique` from every unvisited clique behind it,
    /// then from `clique` to the caller if there is one
    ///
    /// # Arguments
    ///
    /// * `caller` - The clique asking for evidence and the sepset joining it to `clique`
    /// * `clique` - The clique collecting evidence
    /// * `visited` - Cliques already handled by this traversal, clear it before a new one
    pub fn collect_evidence(
        &mut self,
        caller: Option<(CliqueId, SepsetId)>,
        clique: CliqueId,
        visited: &mut VisitedSet,
    ) -> JTResult<()> {
        self.check_clique(clique)?;
        self.check_visited(visited)?;
        visited.insert(clique);
        for sepset in self.cliques[clique.0].sepsets.clone() {
            let next = self.neighbour(sepset, clique)?;
            if !visited.contains(next) {
                self.collect_evidence(Some((clique, sepset)), next, visited)?;
            }
        }
        if let Some((caller, sepset)) = caller {
            self.message_pass(clique, sepset, caller)?;
        }
        Ok(())
    }

    /// Passes messages from `clique` to every unvisited neighbour and then
    /// continues from each of them
    pub fn distribute_evidence(&mut self, clique: CliqueId, visited: &mut VisitedSet) -> JTResult<()> {
        self.check_clique(clique)?;
        self.check_visited(visited)?;
        visited.insert(clique);
        let mut receivers = Vec::new();
        for sepset in self.cliques[clique.0].sepsets.clone() {
            let next = self.neighbour(sepset, clique)?;
            if !visited.contains(next) {
                self.message_pass(clique, sepset, next)?;
                receivers.push(next);
            }
        }
        for next in receivers {
            if !visited.contains(next) {
                self.distribute_evidence(next, visited)?;
            }
        }
        Ok(())
    }

    /// Collects evidence into `root` and distributes it back, after which
    /// all cliques agree on the marginals of the variables they share
    pub fn make_consistent_from(&mut self, root: CliqueId) -> JTResult<()> {
        let mut visited = self.visited_set();
        self.collect_evidence(None, root, &mut visited)?;
        visited.clear();
        self.distribute_evidence(root, &mut visited)?;
        debug!(%root, cliques = self.cliques.len(), "join tree made consistent");
        Ok(())
    }

    /// [`JoinTree::make_consistent_from`] the first clique
    #[inline]
    pub fn make_consistent(&mut self) -> JTResult<()> {
        if self.cliques.is_empty() {
            return Ok(());
        }
        self.make_consistent_from(CliqueId(0))
    }

    /// Enters a likelihood vector for a variable
    ///
    /// # Arguments
    ///
    /// * `variable` - An observed variable
    /// * `evidence` - A likelihood of each state, zero excludes a state
    ///
    /// # Notes
    ///
    /// Evidence giving weight to a state that the current likelihood excludes
    /// can not be entered incrementally and triggers [`JoinTree::global_retraction`].
    /// The tree has to be made consistent again afterwards in both cases.
    ///
    /// # Example
    ///
    /// ```
    /// use jtree::core::{JoinTreeConfig, NetworkBuilder, Potential};
    /// use jtree::junction_tree::EvidenceOutcome;
    ///
    /// let mut nb = NetworkBuilder::new();
    /// let rain = nb.add_variable("rain", &["no", "yes"]).unwrap();
    /// let wet = nb.add_variable("wet", &["no", "yes"]).unwrap();
    /// nb.set_prior(rain, &[0.8, 0.2]).unwrap();
    /// let cpd = Potential::new(&[2, 2], Some(&[0.9, 0.1, 0.2, 0.8])).unwrap();
    /// nb.add_family(wet, &[rain], cpd).unwrap();
    /// let mut tree = nb.build(&JoinTreeConfig::default()).unwrap();
    ///
    /// let outcome = tree.enter_evidence(wet, &[0., 1.]).unwrap();
    /// assert_eq!(outcome, EvidenceOutcome::Incremental);
    /// tree.make_consistent().unwrap();
    /// let posterior = tree.variable_marginal(rain).unwrap();
    /// let expected = 0.2 * 0.8 / (0.8 * 0.1 + 0.2 * 0.8);
    /// assert!((posterior[1] - expected).abs() < 1e-12);
    ///
    /// let outcome = tree.enter_evidence(wet, &[1., 0.]).unwrap();
    /// assert_eq!(outcome, EvidenceOutcome::Retracted);
    /// ```
    pub fn enter_evidence(&mut self, variable: VariableId, evidence: &[f64]) -> JTResult<EvidenceOutcome> {
        let i = self.position(variable)?;
        self.variables[i].check_length(evidence)?;
        let (clique, dim) = self.families[i]
            .as_ref()
            .map(|f| (f.clique, f.mapping[0]))
            .ok_or(JTError::NoFamilyClique(variable))?;
        let old = self.variables[i].likelihood().to_vec();
        let revives_state = old
            .iter()
            .zip(evidence)
            .any(|(o, e)| *o == 0f64 && *e != 0f64);
        self.variables[i].set_likelihood(evidence)?;
        if revives_state {
            debug!(%variable, "evidence revives an excluded state, retracting");
            self.global_retraction()?;
            return Ok(EvidenceOutcome::Retracted);
        }
        update_evidence(evidence, Some(&old), &mut self.cliques[clique.0].p, dim)?;
        trace!(%variable, %clique, "evidence entered");
        Ok(EvidenceOutcome::Incremental)
    }

    /// Enters a hard observation of a named state
    pub fn enter_observation(&mut self, variable: VariableId, state: &str) -> JTResult<EvidenceOutcome> {
        let v = self
            .variable(variable)
            .ok_or(JTError::UnknownVariable(variable))?;
        let index = v.state_index(state).ok_or_else(|| JTError::UnknownState {
            variable: v.symbol().to_string(),
            state: state.to_string(),
        })?;
        self.enter_state_observation(variable, index)
    }

    /// Enters a hard observation of the state with a given index
    pub fn enter_state_observation(&mut self, variable: VariableId, index: usize) -> JTResult<EvidenceOutcome> {
        let v = self
            .variable(variable)
            .ok_or(JTError::UnknownVariable(variable))?;
        if index >= v.cardinality() {
            return Err(JTError::OutOfRangeState {
                variable: v.symbol().to_string(),
                index,
                cardinality: v.cardinality(),
            });
        }
        let mut evidence = vec![0f64; v.cardinality()];
        evidence[index] = 1f64;
        self.enter_evidence(variable, &evidence)
    }

    /// Multiplies a prior distribution of a variable into its family clique,
    /// the evidence free baseline included
    pub fn enter_prior(&mut self, variable: VariableId, prior: &[f64]) -> JTResult<()> {
        let i = self.position(variable)?;
        self.variables[i].set_prior(prior)?;
        let (clique, dim) = self.families[i]
            .as_ref()
            .map(|f| (f.clique, f.mapping[0]))
            .ok_or(JTError::NoFamilyClique(variable))?;
        let target = &mut self.cliques[clique.0];
        update_evidence(prior, None, &mut target.p, dim)?;
        update_evidence(prior, None, &mut target.original_p, dim)?;
        trace!(%variable, %clique, "prior entered");
        Ok(())
    }

    /// Removes the evidence of every variable
    pub fn reset_evidence(&mut self) -> JTResult<()> {
        for variable in &mut self.variables {
            let ones = vec![1f64; variable.cardinality()];
            variable.set_likelihood(&ones)?;
        }
        self.global_retraction()
    }

    /// Resets every clique to its evidence free baseline and every sepset to
    /// ones, then enters the likelihood of every variable again
    ///
    /// This is the only way to revoke evidence that excluded a state.
    pub fn global_retraction(&mut self) -> JTResult<()> {
        for clique in &mut self.cliques {
            clique.p.assign(&clique.original_p)?;
        }
        for sepset in &mut self.sepsets {
            sepset.old.fill(1f64);
            sepset.new.fill(1f64);
        }
        for (variable, family) in self.variables.iter().zip(&self.families) {
            if variable.is_unobserved() {
                continue;
            }
            let family = family
                .as_ref()
                .ok_or(JTError::NoFamilyClique(variable.id()))?;
            update_evidence(
                variable.likelihood(),
                None,
                &mut self.cliques[family.clique.0].p,
                family.mapping[0],
            )?;
        }
        debug!(cliques = self.cliques.len(), "global retraction");
        Ok(())
    }

    /// Writes the unnormalized marginal of a variable computed from a single clique
    pub fn marginalize_clique(&self, clique: CliqueId, variable: VariableId, out: &mut [f64]) -> JTResult<()> {
        let c = self.check_clique(clique)?;
        let dim = c
            .variable_index(variable)
            .ok_or(JTError::VariableNotInClique {
                variable,
                clique: clique.0,
            })?;
        total_marginalize(&c.p, out, dim)
    }

    /// Normalized marginal of a variable, the tree is expected to be consistent
    pub fn variable_marginal(&self, variable: VariableId) -> JTResult<Array1<f64>> {
        let cardinality = self
            .variable(variable)
            .ok_or(JTError::UnknownVariable(variable))?
            .cardinality();
        let clique = self
            .family_clique(variable)
            .or_else(|| self.find_clique(&[variable]))
            .ok_or(JTError::NoFamilyClique(variable))?;
        let mut marginal = vec![0f64; cardinality];
        self.marginalize_clique(clique, variable, &mut marginal)?;
        normalize(&mut marginal);
        Ok(Array1::from_vec(marginal))
    }

    /// Computes the unnormalized joint distribution of variables that need
    /// not share a clique
    ///
    /// # Arguments
    ///
    /// * `start` - The clique the traversal starts from
    /// * `variables` - Requested variables, the dimensions of the result follow their order
    ///
    /// # Notes
    ///
    /// The tree is expected to be consistent. The size of intermediate
    /// potentials grows with the product of the requested cardinalities.
    pub fn gather_joint_probability(&self, start: CliqueId, variables: &[VariableId]) -> JTResult<Potential> {
        self.check_clique(start)?;
        let mut requested = variables.to_vec();
        requested.sort_unstable();
        for pair in requested.windows(2) {
            if pair[0] == pair[1] {
                return Err(JTError::RepeatedVariable(pair[0]));
            }
        }
        let cardinalities = self.cardinalities(variables)?;
        let mut visited = self.visited_set();
        let (members, product) = self.gather(start, &requested, &mut visited)?;
        let mut joint = Potential::zeros(&cardinalities);
        marginalize(&product, &mut joint, &positions_in(variables, &members))?;
        Ok(joint)
    }

    /// [`JoinTree::gather_joint_probability`] starting from the smallest clique holding
    /// every requested variable, or else from a clique holding the first one
    pub fn joint_probability(&self, variables: &[VariableId]) -> JTResult<Potential> {
        let start = self
            .find_clique(variables)
            .or_else(|| variables.first().and_then(|v| self.find_clique(&[*v])))
            .unwrap_or(CliqueId(0));
        self.gather_joint_probability(start, variables)
    }

    /// Sum of all clique potentials minus the sum of all sepset messages
    ///
    /// For a consistent tree this equals the total mass of any clique, so its
    /// ratio before and after entering evidence is the likelihood of that evidence.
    pub fn probability_mass(&self) -> f64 {
        let cliques: f64 = self.cliques.iter().map(|c| c.p.sum()).sum();
        let sepsets: f64 = self.sepsets.iter().map(|s| s.new.sum()).sum();
        cliques - sepsets
    }

    // ---------------------------------------------------------------------------------------

    // returns the members of the product (sorted by id) and the product itself
    fn gather(
        &self,
        clique: CliqueId,
        requested: &[VariableId],
        visited: &mut VisitedSet,
    ) -> JTResult<(Vec<VariableId>, Potential)> {
        visited.insert(clique);
        let c = &self.cliques[clique.0];
        let members = sorted_union(requested, c.variables());
        let mut product = Potential::ones(&self.cardinalities(&members)?);
        init_potential(&c.p, &mut product, &positions_in(c.variables(), &members))?;
        for sepset in c.sepsets() {
            let next = self.neighbour(*sepset, clique)?;
            if visited.contains(next) {
                continue;
            }
            let s = &self.sepsets[sepset.0];
            update(None, Some(&s.new), &mut product, &positions_in(s.variables(), &members))?;
            let (next_members, next_product) = self.gather(next, requested, visited)?;
            let kept = sorted_union(requested, s.variables());
            let mut reduced = Potential::zeros(&self.cardinalities(&kept)?);
            marginalize(&next_product, &mut reduced, &positions_in(&kept, &next_members))?;
            update(Some(&reduced), None, &mut product, &positions_in(&kept, &members))?;
        }
        Ok((members, product))
    }

    fn cardinalities(&self, variables: &[VariableId]) -> JTResult<Vec<usize>> {
        variables
            .iter()
            .map(|v| {
                self.variable(*v)
                    .map(|v| v.cardinality())
                    .ok_or(JTError::UnknownVariable(*v))
            })
            .collect()
    }

    fn check_clique(&self, clique: CliqueId) -> JTResult<&Clique> {
        self.cliques
            .get(clique.0)
            .ok_or(JTError::UnknownClique(clique.0))
    }

    fn check_visited(&self, visited: &VisitedSet) -> JTResult<()> {
        if visited.len() != self.cliques.len() {
            return Err(JTError::VisitedSetSize {
                expected: self.cliques.len(),
                found: visited.len(),
            });
        }
        Ok(())
    }

    pub(crate) fn neighbour(&self, sepset: SepsetId, clique: CliqueId) -> JTResult<CliqueId> {
        self.sepsets
            .get(sepset.0)
            .and_then(|s| s.other(clique))
            .ok_or(JTError::DetachedSepset {
                sepset: sepset.0,
                clique: clique.0,
            })
    }
}

// ------------------------------------------------------------------------------------------

fn sorted_union(a: &[VariableId], b: &[VariableId]) -> Vec<VariableId> {
    let mut union: Vec<VariableId> = a.iter().chain(b).copied().collect();
    union.sort_unstable();
    union.dedup();
    union
}

// positions of `variables` inside the sorted `within`
fn positions_in(variables: &[VariableId], within: &[VariableId]) -> Vec<usize> {
    variables
        .iter()
        .filter_map(|v| within.binary_search(v).ok())
        .collect()
}
