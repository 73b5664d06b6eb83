use jtree::core::{normalize, JTResult, JoinTreeConfig, NetworkBuilder, Potential};

// column normalized table filled with a deterministic pattern
fn table(cardinalities: &[usize], seed: usize) -> JTResult<Potential> {
    let size: usize = cardinalities.iter().product();
    let mut values: Vec<f64> = (0..size)
        .map(|i| 1f64 + ((i * 7 + seed) % 5) as f64)
        .collect();
    for column in values.chunks_mut(cardinalities[0]) {
        normalize(column);
    }
    Potential::new(cardinalities, Some(&values))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    // parameters --------------------------------------------------------------------------
    // soft evidence on b
    let b_likelihood = [0.25, 0.25, 0.40, 0.10];
    // soft evidence on d
    let d_likelihood = [0.2, 0.3, 0.5];
    // join tree construction parameters, optionally read from a yaml file given as the first argument
    let config: JoinTreeConfig = match std::env::args().nth(1) {
        Some(path) => serde_yaml::from_str(&std::fs::read_to_string(path)?)?,
        None => JoinTreeConfig::default(),
    };
    // -------------------------------------------------------------------------------------
    let mut nb = NetworkBuilder::new();
    let a = nb.add_variable("a", &["a0", "a1", "a2"])?;
    let b = nb.add_variable("b", &["b0", "b1", "b2", "b3"])?;
    let c = nb.add_variable("c", &["c0", "c1"])?;
    let d = nb.add_variable("d", &["d0", "d1", "d2"])?;
    let e = nb.add_variable("e", &["e0", "e1"])?;
    nb.add_family(a, &[b, c], table(&[3, 4, 2], 1)?)?;
    nb.add_family(c, &[b, d], table(&[2, 4, 3], 2)?)?;
    nb.add_family(e, &[d], table(&[2, 3], 3)?)?;
    let mut tree = nb.build(&config)?;
    for clique in tree.cliques() {
        let members: Vec<&str> = clique
            .variables()
            .iter()
            .filter_map(|v| tree.variable(*v).map(|v| v.symbol()))
            .collect();
        println!("clique {members:?}, {} cells", clique.size());
    }
    tree.enter_evidence(b, &b_likelihood)?;
    tree.enter_evidence(d, &d_likelihood)?;
    tree.make_consistent()?;
    for variable in [a, b, c, d, e] {
        let marginal = tree.variable_marginal(variable)?;
        let symbol = tree.variable(variable).map(|v| v.symbol()).unwrap_or("?");
        println!("P({symbol} | evidence) = {marginal}");
    }
    let ac = tree.joint_probability(&[a, c])?;
    println!(
        "P(a = a0, c = c1 | evidence) = {:.6}",
        ac.get(&[0, 1]) / tree.probability_mass()
    );
    Ok(())
}
