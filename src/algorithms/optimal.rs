//! Exhaustive optimal path search via subset DP, the same technique
//! classic einsum path optimizers use: for every subset of operands,
//! memoize the cheapest way to fully contract it, then reconstruct the
//! winning contraction tree and flatten it into the list-semantics path
//! the driver expects.
//!
//! Exponential in the operand count; only sane for small networks. `auto`
//! (registry.rs) falls back to `Greedy` once the node count crosses a
//! threshold.

use ahash::{AHashMap, AHashSet};

use super::{cost_of, merge_operands};
use crate::error::ContractError;
use crate::optimizer::{Index, Optimizer};

pub struct Optimal;

impl Optimizer for Optimal {
    fn optimize(
        &self,
        input_sets: &[AHashSet<Index>],
        output_set: &AHashSet<Index>,
        size_dict: &AHashMap<Index, usize>,
        memory_limit: Option<usize>,
    ) -> Result<Vec<(usize, usize)>, ContractError> {
        let n = input_sets.len();
        if n <= 1 {
            return Ok(Vec::new());
        }
        if n > 20 {
            return Err(ContractError::PathError(format!(
                "optimal path search is exponential; {n} operands is too many (use \"greedy\" or \"branch\")"
            )));
        }

        let full: u32 = (1 << n) - 1;
        let limit = memory_limit.map(|m| m as u128);

        let mut best_cost: AHashMap<u32, u128> = AHashMap::default();
        let mut best_split: AHashMap<u32, (u32, u32)> = AHashMap::default();
        let mut result_set: AHashMap<u32, AHashSet<Index>> = AHashMap::default();

        for (i, set) in input_sets.iter().enumerate() {
            let mask = 1u32 << i;
            best_cost.insert(mask, 0);
            result_set.insert(mask, set.clone());
        }

        for mask in 1u32..=full {
            if mask.count_ones() < 2 {
                continue;
            }
            let mut sub = (mask - 1) & mask;
            while sub > 0 {
                let comp = mask ^ sub;
                if sub < comp && best_cost.contains_key(&sub) && best_cost.contains_key(&comp) {
                    let outside = full ^ mask;
                    let elsewhere = bits(outside).map(|i| &input_sets[i as usize]);
                    let merged = merge_operands(&result_set[&sub], &result_set[&comp], elsewhere, output_set);
                    let merge_cost = cost_of(&merged, size_dict);
                    let feasible = limit.map_or(true, |l| merge_cost <= l);
                    if feasible {
                        let total = best_cost[&sub] + best_cost[&comp] + merge_cost;
                        if best_cost.get(&mask).map_or(true, |&c| total < c) {
                            best_cost.insert(mask, total);
                            best_split.insert(mask, (sub, comp));
                            result_set.insert(mask, merged);
                        }
                    }
                }
                sub = (sub.wrapping_sub(1)) & mask;
            }
        }

        if !best_cost.contains_key(&full) {
            return Err(ContractError::PathError(
                "optimal path search found no feasible contraction order under the given memory limit".to_string(),
            ));
        }

        let mut merges: Vec<(usize, usize)> = Vec::new();
        let mut ssa_of_mask: AHashMap<u32, usize> = AHashMap::default();
        let mut next_ssa = n;
        reconstruct(full, &best_split, &mut ssa_of_mask, &mut next_ssa, &mut merges);

        Ok(ssa_to_linear(n, &merges))
    }
}

fn bits(mask: u32) -> impl Iterator<Item = u32> {
    let mut m = mask;
    std::iter::from_fn(move || {
        if m == 0 {
            return None;
        }
        let bit = m.trailing_zeros();
        m &= m - 1;
        Some(bit)
    })
}

fn reconstruct(
    mask: u32,
    best_split: &AHashMap<u32, (u32, u32)>,
    ssa_of_mask: &mut AHashMap<u32, usize>,
    next_ssa: &mut usize,
    merges: &mut Vec<(usize, usize)>,
) -> usize {
    if let Some(&id) = ssa_of_mask.get(&mask) {
        return id;
    }
    if mask.count_ones() == 1 {
        let id = mask.trailing_zeros() as usize;
        ssa_of_mask.insert(mask, id);
        return id;
    }
    let (l, r) = best_split[&mask];
    let li = reconstruct(l, best_split, ssa_of_mask, next_ssa, merges);
    let ri = reconstruct(r, best_split, ssa_of_mask, next_ssa, merges);
    let id = *next_ssa;
    *next_ssa += 1;
    merges.push((li, ri));
    ssa_of_mask.insert(mask, id);
    id
}

/// Flattens a static-single-assignment merge order (each operand id
/// appears exactly once, original or freshly produced) into the
/// evolving-list path format spec.md §4.4 describes.
fn ssa_to_linear(n: usize, merges: &[(usize, usize)]) -> Vec<(usize, usize)> {
    let mut ids: Vec<usize> = (0..n).collect();
    let mut path = Vec::with_capacity(merges.len());
    let mut next_ssa = n;

    for &(l, r) in merges {
        let mut pl = ids.iter().position(|&x| x == l).expect("ssa_to_linear: operand already consumed");
        let mut pr = ids.iter().position(|&x| x == r).expect("ssa_to_linear: operand already consumed");
        if pl > pr {
            std::mem::swap(&mut pl, &mut pr);
        }
        path.push((pl, pr));
        ids.remove(pr);
        ids.remove(pl);
        ids.push(next_ssa);
        next_ssa += 1;
    }
    path
}
