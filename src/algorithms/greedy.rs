//! Greedy path optimizer: at each step, merge whichever pair produces the
//! smallest intermediate tensor. O(n^3) overall; no backtracking, no
//! optimality guarantee, but cheap and usually good enough in practice,
//! the natural default for `auto` on larger networks.

use ahash::{AHashMap, AHashSet};

use super::{cost_of, merge_operands};
use crate::error::ContractError;
use crate::optimizer::{Index, Optimizer};

pub struct Greedy;

impl Optimizer for Greedy {
    fn optimize(
        &self,
        input_sets: &[AHashSet<Index>],
        output_set: &AHashSet<Index>,
        size_dict: &AHashMap<Index, usize>,
        _memory_limit: Option<usize>,
    ) -> Result<Vec<(usize, usize)>, ContractError> {
        let mut sets: Vec<AHashSet<Index>> = input_sets.to_vec();
        let mut path = Vec::new();

        while sets.len() > 1 {
            let mut best: Option<(usize, usize, u128)> = None;
            for i in 0..sets.len() {
                for j in (i + 1)..sets.len() {
                    let elsewhere = sets.iter().enumerate().filter(|&(k, _)| k != i && k != j).map(|(_, s)| s);
                    let merged = merge_operands(&sets[i], &sets[j], elsewhere, output_set);
                    let cost = cost_of(&merged, size_dict);
                    if best.map_or(true, |(_, _, c)| cost < c) {
                        best = Some((i, j, cost));
                    }
                }
            }
            let (i, j, _) = best.expect("greedy: at least two operands remain");
            let elsewhere = sets.iter().enumerate().filter(|&(k, _)| k != i && k != j).map(|(_, s)| s);
            let merged = merge_operands(&sets[i], &sets[j], elsewhere, output_set);

            path.push((i, j));
            sets.remove(j);
            sets.remove(i);
            sets.push(merged);
        }

        Ok(path)
    }
}
