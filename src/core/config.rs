use serde::{Deserialize, Serialize};

/// Cost used to choose the next variable to eliminate during triangulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EliminationHeuristic {
    /// Fewest fill-in edges first, ties broken by the weight of the induced cluster
    #[default]
    MinFill,
    /// Smallest induced cluster weight first, ties broken by the number of fill-in edges
    MinWeight,
}

/// Parameters of join tree construction
///
/// # Example
///
/// ```
/// use jtree::core::{EliminationHeuristic, JoinTreeConfig};
///
/// let config: JoinTreeConfig = serde_yaml::from_str("heuristic: min_weight").unwrap();
/// assert_eq!(config.heuristic, EliminationHeuristic::MinWeight);
/// assert!(config.connect_interfaces);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JoinTreeConfig {
    /// Greedy elimination cost
    pub heuristic: EliminationHeuristic,

    /// Whether the variables of every time slice interface are forced into one clique
    pub connect_interfaces: bool,
}

impl Default for JoinTreeConfig {
    fn default() -> Self {
        JoinTreeConfig {
            heuristic: EliminationHeuristic::MinFill,
            connect_interfaces: true,
        }
    }
}
