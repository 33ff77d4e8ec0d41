//! Named algorithm registry (spec.md §4.6) and caller-facing contraction
//! options (SPEC_FULL.md §D).

use crate::algorithms::{Branch, Greedy, Optimal};
use crate::error::ContractError;
use crate::ids::EdgeId;
use crate::optimizer::Optimizer;

/// Caller-tunable knobs threaded through `contract`/`custom`.
#[derive(Default)]
pub struct ContractOptions {
    pub memory_limit: Option<usize>,
    /// The dangling edges the final tensor's axes must appear in, in that
    /// order. `None` leaves the driver's own deterministic ordering.
    pub output_edge_order: Option<Vec<EdgeId>>,
}

/// Operand count above which `auto` prefers `Greedy`'s O(n^3) search over
/// `Optimal`'s exponential subset DP.
const AUTO_OPTIMAL_THRESHOLD: usize = 10;

/// Resolves one of the built-in named algorithms. `custom` is not handled
/// here: callers wanting their own optimizer call `driver::custom`
/// directly with it.
pub fn resolve(name: &str, operand_count: usize) -> Result<Box<dyn Optimizer>, ContractError> {
    match name {
        "optimal" => Ok(Box::new(Optimal)),
        "branch" => Ok(Box::new(Branch)),
        "greedy" => Ok(Box::new(Greedy)),
        "auto" => {
            if operand_count <= AUTO_OPTIMAL_THRESHOLD {
                Ok(Box::new(Optimal))
            } else {
                Ok(Box::new(Greedy))
            }
        }
        other => Err(ContractError::UnknownAlgorithm(other.to_string())),
    }
}
