use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use rand_distr::{Distribution, Uniform};

use crate::core::{flat_index, indices_of, normalize, NetworkBuilder, Potential, VariableId};

/// Installs a subscriber printing to the test output, safe to call from every test
pub(super) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A network kept in plain form so that it can be solved by enumeration
#[derive(Debug, Clone)]
pub(super) struct PlainNetwork {
    pub(super) cardinalities: Vec<usize>,
    /// (child, parents, flat table with the child as dimension 0)
    pub(super) families: Vec<(usize, Vec<usize>, Vec<f64>)>,
    pub(super) priors: Vec<(usize, Vec<f64>)>,
}

impl PlainNetwork {
    pub(super) fn builder(&self) -> (NetworkBuilder, Vec<VariableId>) {
        let mut nb = NetworkBuilder::new();
        let ids: Vec<VariableId> = self
            .cardinalities
            .iter()
            .enumerate()
            .map(|(i, c)| nb.add_variable_with_cardinality(&format!("x{i}"), *c).unwrap())
            .collect();
        for (child, parents, table) in &self.families {
            let cardinalities = self.family_cardinalities(*child, parents);
            let parent_ids: Vec<VariableId> = parents.iter().map(|p| ids[*p]).collect();
            let cpd = Potential::new(&cardinalities, Some(table)).unwrap();
            nb.add_family(ids[*child], &parent_ids, cpd).unwrap();
        }
        for (variable, prior) in &self.priors {
            nb.set_prior(ids[*variable], prior).unwrap();
        }
        (nb, ids)
    }

    fn family_cardinalities(&self, child: usize, parents: &[usize]) -> Vec<usize> {
        std::iter::once(child)
            .chain(parents.iter().copied())
            .map(|v| self.cardinalities[v])
            .collect()
    }

    /// Full joint table (dimension i is variable i) with the likelihoods applied
    pub(super) fn brute_force_joint(&self, likelihoods: &[Vec<f64>]) -> Vec<f64> {
        let size: usize = self.cardinalities.iter().product();
        (0..size)
            .map(|flat| {
                let state = indices_of(&self.cardinalities, flat);
                let mut value = 1f64;
                for (child, parents, table) in &self.families {
                    let cardinalities = self.family_cardinalities(*child, parents);
                    let local: Vec<usize> = std::iter::once(*child)
                        .chain(parents.iter().copied())
                        .map(|v| state[v])
                        .collect();
                    value *= table[flat_index(&cardinalities, &local)];
                }
                for (variable, prior) in &self.priors {
                    value *= prior[state[*variable]];
                }
                for (variable, likelihood) in likelihoods.iter().enumerate() {
                    value *= likelihood[state[variable]];
                }
                value
            })
            .collect()
    }

    /// Unnormalized joint of the given variables (dimension i is `variables[i]`)
    pub(super) fn brute_force_marginal(&self, variables: &[usize], likelihoods: &[Vec<f64>]) -> Vec<f64> {
        let joint = self.brute_force_joint(likelihoods);
        let cardinalities: Vec<usize> = variables.iter().map(|v| self.cardinalities[*v]).collect();
        let mut marginal = vec![0f64; cardinalities.iter().product()];
        for (flat, value) in joint.iter().enumerate() {
            let state = indices_of(&self.cardinalities, flat);
            let local: Vec<usize> = variables.iter().map(|v| state[*v]).collect();
            marginal[flat_index(&cardinalities, &local)] += value;
        }
        marginal
    }

    pub(super) fn no_evidence(&self) -> Vec<Vec<f64>> {
        self.cardinalities.iter().map(|c| vec![1f64; *c]).collect()
    }
}

/// A table with the child as dimension 0, every column normalized
pub(super) fn random_cpd(rng: &mut impl Rng, cardinalities: &[usize]) -> Vec<f64> {
    let distr = Uniform::new(0.05f64, 1f64);
    let size: usize = cardinalities.iter().product();
    let mut table: Vec<f64> = (0..size).map(|_| distr.sample(rng)).collect();
    for column in table.chunks_mut(cardinalities[0]) {
        normalize(column);
    }
    table
}

/// A random directed acyclic network, variables only take parents with smaller indices
pub(super) fn random_network(seed: u64, variables_number: usize, max_parents: usize) -> PlainNetwork {
    let mut rng = StdRng::seed_from_u64(seed);
    let cardinalities: Vec<usize> = (0..variables_number).map(|_| rng.gen_range(1..=3)).collect();
    let mut families = Vec::new();
    let mut priors = Vec::new();
    for child in 0..variables_number {
        let mut candidates: Vec<usize> = (0..child).collect();
        candidates.shuffle(&mut rng);
        let parents_number = rng.gen_range(0..=max_parents.min(child));
        let parents: Vec<usize> = candidates.into_iter().take(parents_number).collect();
        if parents.is_empty() {
            let mut prior = random_cpd(&mut rng, &[cardinalities[child]]);
            normalize(&mut prior);
            priors.push((child, prior));
        } else {
            let family: Vec<usize> = std::iter::once(child)
                .chain(parents.iter().copied())
                .map(|v| cardinalities[v])
                .collect();
            families.push((child, parents, random_cpd(&mut rng, &family)));
        }
    }
    PlainNetwork {
        cardinalities,
        families,
        priors,
    }
}

/// The five variable network A(3), B(4), C(2), D(3), E(2) with tables A|B,C, C|B,D and E|D
pub(super) fn reference_network() -> PlainNetwork {
    let cardinalities = vec![3, 4, 2, 3, 2];
    let table = |cardinalities: &[usize], seed: usize| -> Vec<f64> {
        let size: usize = cardinalities.iter().product();
        let mut table: Vec<f64> = (0..size)
            .map(|i| 1f64 + ((i * 7 + seed) % 5) as f64)
            .collect();
        for column in table.chunks_mut(cardinalities[0]) {
            normalize(column);
        }
        table
    };
    PlainNetwork {
        families: vec![
            (0, vec![1, 2], table(&[3, 4, 2], 1)),
            (2, vec![1, 3], table(&[2, 4, 3], 2)),
            (4, vec![3], table(&[2, 3], 3)),
        ],
        cardinalities,
        priors: Vec::new(),
    }
}

pub(super) fn assert_close(lhs: &[f64], rhs: &[f64], epsilon: f64) {
    assert_eq!(lhs.len(), rhs.len());
    for (l, r) in lhs.iter().zip(rhs) {
        approx::assert_relative_eq!(*l, *r, epsilon = epsilon, max_relative = epsilon);
    }
}
