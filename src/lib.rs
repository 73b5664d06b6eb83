/// A module containing discrete variables, potentials, graphs and their algebra
pub mod core;
/// A module containing join tree construction and belief propagation over it
pub mod junction_tree;

#[cfg(test)]
mod tests;
