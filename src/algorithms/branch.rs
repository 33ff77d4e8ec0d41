//! Branch-and-bound path optimizer: depth-first search over contraction
//! orders with the same per-merge cost model as `Greedy`, pruning any
//! partial path whose accumulated cost already exceeds the best complete
//! path found so far. Strictly more thorough than `Greedy` and cheaper
//! than `Optimal`'s full subset DP, at the price of no hard complexity
//! bound (see `DESIGN.md` for why this crate still exposes it as a
//! separate named algorithm rather than folding it into `optimal`).

use ahash::{AHashMap, AHashSet};

use super::{cost_of, merge_operands};
use crate::error::ContractError;
use crate::optimizer::{Index, Optimizer};

pub struct Branch;

struct Search<'a> {
    output_set: &'a AHashSet<Index>,
    size_dict: &'a AHashMap<Index, usize>,
    limit: Option<u128>,
    best: Option<(u128, Vec<(usize, usize)>)>,
}

impl<'a> Search<'a> {
    fn run(&mut self, sets: Vec<AHashSet<Index>>, cost_so_far: u128, path_so_far: Vec<(usize, usize)>) {
        if self.best.as_ref().is_some_and(|(c, _)| cost_so_far >= *c) {
            return;
        }
        if sets.len() == 1 {
            self.best = Some((cost_so_far, path_so_far));
            return;
        }
        for i in 0..sets.len() {
            for j in (i + 1)..sets.len() {
                let elsewhere = sets.iter().enumerate().filter(|&(k, _)| k != i && k != j).map(|(_, s)| s);
                let merged = merge_operands(&sets[i], &sets[j], elsewhere, self.output_set);
                let merge_cost = cost_of(&merged, self.size_dict);
                if let Some(limit) = self.limit {
                    if merge_cost > limit {
                        continue;
                    }
                }
                let total = cost_so_far + merge_cost;
                if self.best.as_ref().is_some_and(|(c, _)| total >= *c) {
                    continue;
                }

                let mut next_sets = sets.clone();
                next_sets.remove(j);
                next_sets.remove(i);
                next_sets.push(merged);

                let mut next_path = path_so_far.clone();
                next_path.push((i, j));

                self.run(next_sets, total, next_path);
            }
        }
    }
}

impl Optimizer for Branch {
    fn optimize(
        &self,
        input_sets: &[AHashSet<Index>],
        output_set: &AHashSet<Index>,
        size_dict: &AHashMap<Index, usize>,
        memory_limit: Option<usize>,
    ) -> Result<Vec<(usize, usize)>, ContractError> {
        if input_sets.len() <= 1 {
            return Ok(Vec::new());
        }

        let mut search = Search {
            output_set,
            size_dict,
            limit: memory_limit.map(|m| m as u128),
            best: None,
        };
        search.run(input_sets.to_vec(), 0, Vec::new());

        search
            .best
            .map(|(_, path)| path)
            .ok_or_else(|| ContractError::PathError("branch search found no feasible contraction order".to_string()))
    }
}
