use rand::{rngs::StdRng, Rng, SeedableRng};

use super::utils::{assert_close, init_tracing, random_network, PlainNetwork};
use crate::{
    core::{marginalize, normalize, JTError, JoinTreeConfig, NetworkBuilder, Potential, VariableId},
    junction_tree::{CliqueId, EvidenceOutcome, JoinTree, SepsetId, VisitedSet},
};

fn normalized(mut values: Vec<f64>) -> Vec<f64> {
    normalize(&mut values);
    values
}

fn positions(variables: &[VariableId]) -> Vec<usize> {
    variables.iter().map(|v| v.0).collect()
}

// every clique and sepset agrees with enumeration over the whole network
fn check_against_brute_force(tree: &JoinTree, network: &PlainNetwork, likelihoods: &[Vec<f64>]) {
    let total: f64 = network.brute_force_joint(likelihoods).iter().sum();
    for clique in tree.cliques() {
        let expected = network.brute_force_marginal(&positions(clique.variables()), likelihoods);
        assert_close(
            &normalized(clique.potential().values()),
            &normalized(expected),
            1e-9,
        );
        assert_close(&[clique.potential().sum()], &[total], 1e-9);
    }
    for sepset in tree.sepsets() {
        let expected = network.brute_force_marginal(&positions(sepset.variables()), likelihoods);
        assert_close(
            &normalized(sepset.new_potential().values()),
            &normalized(expected),
            1e-9,
        );
    }
    assert_close(&[tree.probability_mass()], &[total], 1e-9);
}

fn random_likelihoods(rng: &mut StdRng, network: &PlainNetwork) -> Vec<Vec<f64>> {
    network
        .cardinalities
        .iter()
        .map(|c| {
            if rng.gen_bool(0.4) {
                (0..*c).map(|_| rng.gen_range(0.1..1.)).collect()
            } else {
                vec![1.; *c]
            }
        })
        .collect()
}

#[test]
fn consistency_without_evidence() {
    init_tracing();
    for seed in 0..20 {
        let network = random_network(seed, 8, 3);
        let (nb, _) = network.builder();
        let mut tree = nb.build(&JoinTreeConfig::default()).unwrap();
        tree.make_consistent().unwrap();
        check_against_brute_force(&tree, &network, &network.no_evidence());
    }
}

#[test]
fn consistency_with_soft_evidence() {
    init_tracing();
    let mut rng = StdRng::seed_from_u64(7);
    for seed in 0..20 {
        let network = random_network(100 + seed, 9, 2);
        let (nb, ids) = network.builder();
        let mut tree = nb.build(&JoinTreeConfig::default()).unwrap();
        let likelihoods = random_likelihoods(&mut rng, &network);
        for (id, likelihood) in ids.iter().zip(&likelihoods) {
            let outcome = tree.enter_evidence(*id, likelihood).unwrap();
            assert_eq!(outcome, EvidenceOutcome::Incremental);
        }
        tree.make_consistent().unwrap();
        check_against_brute_force(&tree, &network, &likelihoods);
    }
}

#[test]
fn evidence_on_a_consistent_tree() {
    let mut rng = StdRng::seed_from_u64(11);
    let network = random_network(3, 10, 3);
    let (nb, ids) = network.builder();
    let mut tree = nb.build(&JoinTreeConfig::default()).unwrap();
    tree.make_consistent().unwrap();
    let mut likelihoods = network.no_evidence();
    for _ in 0..3 {
        let target = rng.gen_range(0..ids.len());
        let likelihood: Vec<f64> = (0..network.cardinalities[target])
            .map(|_| rng.gen_range(0.1..1.))
            .collect();
        tree.enter_evidence(ids[target], &likelihood).unwrap();
        likelihoods[target] = likelihood;
        tree.make_consistent().unwrap();
        check_against_brute_force(&tree, &network, &likelihoods);
    }
}

#[test]
fn repeated_propagation_is_stable() {
    let network = random_network(5, 8, 3);
    let (nb, ids) = network.builder();
    let mut tree = nb.build(&JoinTreeConfig::default()).unwrap();
    let mut likelihood = vec![1.; network.cardinalities[7]];
    likelihood[0] = 0.3;
    tree.enter_evidence(ids[7], &likelihood).unwrap();
    tree.make_consistent().unwrap();
    let first: Vec<Vec<f64>> = tree.cliques().iter().map(|c| c.potential().values()).collect();
    tree.make_consistent().unwrap();
    tree.make_consistent_from(CliqueId(tree.cliques().len() - 1)).unwrap();
    for (clique, values) in tree.cliques().iter().zip(&first) {
        assert_close(&clique.potential().values(), values, 1e-9);
    }
}

#[test]
fn hard_evidence_and_retraction() {
    init_tracing();
    let network = random_network(21, 8, 2);
    let (nb, ids) = network.builder();
    let mut tree = nb.build(&JoinTreeConfig::default()).unwrap();
    let target = (0..ids.len())
        .find(|i| network.cardinalities[*i] > 1)
        .unwrap();
    let cardinality = network.cardinalities[target];
    let mut likelihoods = network.no_evidence();

    let outcome = tree.enter_state_observation(ids[target], 0).unwrap();
    assert_eq!(outcome, EvidenceOutcome::Incremental);
    likelihoods[target] = (0..cardinality).map(|s| if s == 0 { 1. } else { 0. }).collect();
    tree.make_consistent().unwrap();
    check_against_brute_force(&tree, &network, &likelihoods);
    let marginal = tree.variable_marginal(ids[target]).unwrap();
    assert_close(&[marginal[0]], &[1.], 1e-12);

    // giving weight back to an excluded state needs a retraction
    let revived: Vec<f64> = (0..cardinality).map(|s| if s == 1 { 1. } else { 0. }).collect();
    let outcome = tree.enter_evidence(ids[target], &revived).unwrap();
    assert_eq!(outcome, EvidenceOutcome::Retracted);
    likelihoods[target] = revived;
    tree.make_consistent().unwrap();
    check_against_brute_force(&tree, &network, &likelihoods);

    tree.reset_evidence().unwrap();
    assert!(tree.variables().iter().all(|v| v.is_unobserved()));
    tree.make_consistent().unwrap();
    check_against_brute_force(&tree, &network, &network.no_evidence());
}

#[test]
fn retraction_restores_baseline() {
    let network = random_network(8, 6, 2);
    let (nb, ids) = network.builder();
    let mut tree = nb.build(&JoinTreeConfig::default()).unwrap();
    let baseline: Vec<Vec<f64>> = tree.cliques().iter().map(|c| c.potential().values()).collect();
    tree.enter_evidence(ids[0], &vec![0.5; network.cardinalities[0]])
        .unwrap();
    tree.make_consistent().unwrap();
    tree.reset_evidence().unwrap();
    for (clique, values) in tree.cliques().iter().zip(&baseline) {
        assert_eq!(&clique.potential().values(), values);
        assert_eq!(clique.original_potential().values(), *values);
    }
    for sepset in tree.sepsets() {
        assert!(sepset.new_potential().values().iter().all(|x| *x == 1.));
        assert!(sepset.old_potential().values().iter().all(|x| *x == 1.));
    }
}

#[test]
fn joint_of_variables_in_different_cliques() {
    let mut rng = StdRng::seed_from_u64(3);
    for seed in 0..10 {
        let network = random_network(40 + seed, 8, 2);
        let (nb, ids) = network.builder();
        let mut tree = nb.build(&JoinTreeConfig::default()).unwrap();
        let likelihoods = random_likelihoods(&mut rng, &network);
        for (id, likelihood) in ids.iter().zip(&likelihoods) {
            tree.enter_evidence(*id, likelihood).unwrap();
        }
        tree.make_consistent().unwrap();
        let requested = [ids[7], ids[0], ids[4]];
        let expected = network.brute_force_marginal(&positions(&requested), &likelihoods);
        let joint = tree.joint_probability(&requested).unwrap();
        assert_eq!(
            joint.cardinalities(),
            &[
                network.cardinalities[7],
                network.cardinalities[0],
                network.cardinalities[4]
            ]
        );
        assert_close(&normalized(joint.values()), &normalized(expected), 1e-9);
        assert_close(&[joint.sum()], &[tree.probability_mass()], 1e-9);

        // every start clique gives the same answer
        for start in 0..tree.cliques().len() {
            let joint = tree
                .gather_joint_probability(CliqueId(start), &[ids[2], ids[6]])
                .unwrap();
            let expected = network.brute_force_marginal(&[2, 6], &likelihoods);
            assert_close(&normalized(joint.values()), &normalized(expected), 1e-9);
        }
    }
}

#[test]
fn joint_follows_requested_order() {
    let network = random_network(9, 6, 2);
    let (nb, ids) = network.builder();
    let mut tree = nb.build(&JoinTreeConfig::default()).unwrap();
    tree.make_consistent().unwrap();
    let forward = tree.joint_probability(&[ids[1], ids[5]]).unwrap();
    let backward = tree.joint_probability(&[ids[5], ids[1]]).unwrap();
    let mut transposed = Potential::zeros(forward.cardinalities());
    marginalize(&backward, &mut transposed, &[1, 0]).unwrap();
    assert_close(&transposed.values(), &forward.values(), 1e-12);
    let single = tree.joint_probability(&[ids[3]]).unwrap();
    assert_close(
        &normalized(single.values()),
        &tree.variable_marginal(ids[3]).unwrap().to_vec(),
        1e-12,
    );
}

#[test]
fn evidence_likelihood_from_probability_mass() {
    let mut nb = NetworkBuilder::new();
    let rain = nb.add_variable("rain", &["no", "yes"]).unwrap();
    let sprinkler = nb.add_variable("sprinkler", &["off", "on"]).unwrap();
    let wet = nb.add_variable("wet", &["no", "yes"]).unwrap();
    nb.set_prior(rain, &[0.8, 0.2]).unwrap();
    nb.set_prior(sprinkler, &[0.6, 0.4]).unwrap();
    // wet | rain, sprinkler
    let cpd = Potential::new(
        &[2, 2, 2],
        Some(&[1., 0., 0.2, 0.8, 0.1, 0.9, 0.01, 0.99]),
    )
    .unwrap();
    nb.add_family(wet, &[rain, sprinkler], cpd).unwrap();
    let mut tree = nb.build(&JoinTreeConfig::default()).unwrap();
    tree.make_consistent().unwrap();
    assert_close(&[tree.probability_mass()], &[1.], 1e-12);

    tree.enter_observation(wet, "yes").unwrap();
    tree.make_consistent().unwrap();
    let evidence = 0.2 * 0.6 * 0.8 + 0.8 * 0.4 * 0.9 + 0.2 * 0.4 * 0.99;
    assert_close(&[tree.probability_mass()], &[evidence], 1e-12);
    let posterior = tree.variable_marginal(rain).unwrap();
    let expected = (0.2 * 0.6 * 0.8 + 0.2 * 0.4 * 0.99) / evidence;
    assert_close(&[posterior[1]], &[expected], 1e-12);
}

#[test]
fn evidence_errors() {
    let mut nb = NetworkBuilder::new();
    let a = nb.add_variable("a", &["x", "y", "z"]).unwrap();
    let b = nb.add_variable("b", &["x", "y"]).unwrap();
    nb.add_family(b, &[a], Potential::ones(&[2, 3])).unwrap();
    let mut tree = nb.build(&JoinTreeConfig::default()).unwrap();
    assert_eq!(
        tree.enter_evidence(a, &[1., 1.]),
        Err(JTError::EvidenceLength {
            variable: "a".to_string(),
            expected: 3,
            found: 2,
        })
    );
    assert_eq!(
        tree.enter_evidence(VariableId(9), &[1.]),
        Err(JTError::UnknownVariable(VariableId(9)))
    );
    assert_eq!(
        tree.enter_observation(a, "w"),
        Err(JTError::UnknownState {
            variable: "a".to_string(),
            state: "w".to_string(),
        })
    );
    assert_eq!(
        tree.enter_state_observation(b, 2),
        Err(JTError::OutOfRangeState {
            variable: "b".to_string(),
            index: 2,
            cardinality: 2,
        })
    );
    assert_eq!(
        tree.joint_probability(&[a, b, a]).unwrap_err(),
        JTError::RepeatedVariable(a)
    );
    assert_eq!(
        tree.message_pass(CliqueId(0), SepsetId(0), CliqueId(0)),
        Err(JTError::NotAdjacent {
            sepset: 0,
            from: 0,
            to: 0,
        })
    );
    assert!(matches!(
        tree.marginalize_clique(CliqueId(3), a, &mut [0.; 3]),
        Err(JTError::UnknownClique(3))
    ));
    assert_eq!(
        tree.neighbour(SepsetId(5), CliqueId(0)),
        Err(JTError::DetachedSepset { sepset: 5, clique: 0 })
    );
    let sized_for_none = JTError::VisitedSetSize {
        expected: 1,
        found: 0,
    };
    assert_eq!(
        tree.collect_evidence(None, CliqueId(0), &mut VisitedSet::new(0)),
        Err(sized_for_none.clone())
    );
    assert_eq!(
        tree.distribute_evidence(CliqueId(0), &mut VisitedSet::new(0)),
        Err(sized_for_none)
    );
    assert_eq!(
        tree.distribute_evidence(CliqueId(0), &mut VisitedSet::new(4)),
        Err(JTError::VisitedSetSize {
            expected: 1,
            found: 4,
        })
    );
    let mut visited = tree.visited_set();
    tree.collect_evidence(None, CliqueId(0), &mut visited).unwrap();
    assert_eq!(visited.count(), visited.len());
    // failed calls leave the evidence untouched
    assert!(tree.variables().iter().all(|v| v.is_unobserved()));
}

#[test]
fn observations_by_state_name() {
    let mut nb = NetworkBuilder::new();
    let weather = nb.add_variable("weather", &["sun", "rain", "snow"]).unwrap();
    let umbrella = nb.add_variable("umbrella", &["no", "yes"]).unwrap();
    nb.set_prior(weather, &[0.5, 0.3, 0.2]).unwrap();
    let cpd = Potential::new(&[2, 3], Some(&[0.9, 0.1, 0.2, 0.8, 0.4, 0.6])).unwrap();
    nb.add_family(umbrella, &[weather], cpd).unwrap();
    let mut tree = nb.build(&JoinTreeConfig::default()).unwrap();
    let weather_id = tree.find_variable("weather").map(|v| v.id());
    assert_eq!(weather_id, Some(weather));
    tree.enter_observation(umbrella, "yes").unwrap();
    tree.make_consistent().unwrap();
    let posterior = tree.variable_marginal(weather).unwrap().to_vec();
    let expected = normalized(vec![0.5 * 0.1, 0.3 * 0.8, 0.2 * 0.6]);
    assert_close(&posterior, &expected, 1e-12);
    assert_eq!(tree.variable(umbrella).unwrap().likelihood(), &[0., 1.]);
    assert_eq!(tree.variable(weather).unwrap().prior(), Some(&[0.5, 0.3, 0.2][..]));
}

#[test]
fn transient_tables_are_retracted() {
    let mut nb = NetworkBuilder::new();
    let a = nb.add_variable_with_cardinality("a", 2).unwrap();
    let b = nb.add_variable_with_cardinality("b", 2).unwrap();
    nb.set_prior(a, &[0.5, 0.5]).unwrap();
    let cpd = Potential::new(&[2, 2], Some(&[0.7, 0.3, 0.1, 0.9])).unwrap();
    nb.add_family(b, &[a], cpd).unwrap();
    let mut tree = nb.build(&JoinTreeConfig::default()).unwrap();
    let clique = tree.family_clique(b).unwrap();
    let bias = Potential::new(&[2, 2], Some(&[2., 1., 1., 1.])).unwrap();
    tree.init_clique(clique, b, &bias, true).unwrap();
    tree.make_consistent().unwrap();
    let biased = tree.variable_marginal(b).unwrap();
    tree.global_retraction().unwrap();
    tree.make_consistent().unwrap();
    let plain = tree.variable_marginal(b).unwrap();
    assert_close(&[plain[0]], &[0.5 * 0.7 + 0.5 * 0.1], 1e-12);
    assert!(biased[0] > plain[0]);
    assert_eq!(
        tree.init_clique(clique, b, &Potential::ones(&[2]), true),
        Err(JTError::DimensionMismatch {
            expected: 2,
            found: 1,
        })
    );
}

#[test]
fn families_are_declared_once() {
    let mut nb = NetworkBuilder::new();
    let a = nb.add_variable_with_cardinality("a", 2).unwrap();
    let b = nb.add_variable_with_cardinality("b", 2).unwrap();
    let c = nb.add_variable_with_cardinality("c", 2).unwrap();
    nb.set_prior(a, &[0.5, 0.5]).unwrap();
    let cpd = Potential::new(&[2, 2], Some(&[0.7, 0.3, 0.1, 0.9])).unwrap();
    nb.add_family(b, &[a], cpd.clone()).unwrap();
    assert_eq!(
        nb.add_family(b, &[a], cpd.clone()),
        Err(JTError::DuplicateFamily("b".to_string()))
    );
    assert_eq!(nb.add_family(a, &[a], cpd), Err(JTError::SelfLoop(a)));
    assert_eq!(
        nb.add_family(c, &[a, a], Potential::ones(&[2, 2, 2])),
        Err(JTError::RepeatedVariable(a))
    );
    nb.set_prior(c, &[0.5, 0.5]).unwrap();
    let mut tree = nb.build(&JoinTreeConfig::default()).unwrap();
    tree.make_consistent().unwrap();
    // the table of b is entered exactly once
    let marginal = tree.variable_marginal(b).unwrap().to_vec();
    assert_close(&marginal, &[0.4, 0.6], 1e-12);
    assert_eq!(tree.variable(b).unwrap().parents(), &[a]);
    assert!(tree.variable(c).unwrap().parents().is_empty());
}
