//! Concrete `Optimizer` implementations (spec.md §4.6).

mod branch;
mod greedy;
mod optimal;

pub use branch::Branch;
pub use greedy::Greedy;
pub use optimal::Optimal;

use ahash::AHashMap;
use ahash::AHashSet;

use crate::optimizer::Index;

/// The result of contracting operands `a` and `b` together: every index
/// in either, minus the ones that were shared between exactly these two
/// and are not needed anywhere else.
///
/// `elsewhere` is every other operand still outstanding at this point in
/// the (partial) path, plus the final `output_set`: an index shared
/// between `a` and `b` but also present in `elsewhere` must survive the
/// merge rather than being summed away (this is how a copy node's
/// coalesced index, shared by more than two operands, stays alive until
/// the last of them is merged in).
pub(crate) fn merge_operands<'a>(
    a: &AHashSet<Index>,
    b: &AHashSet<Index>,
    elsewhere: impl IntoIterator<Item = &'a AHashSet<Index>>,
    output_set: &AHashSet<Index>,
) -> AHashSet<Index> {
    let elsewhere: Vec<&AHashSet<Index>> = elsewhere.into_iter().collect();
    a.union(b)
        .copied()
        .filter(|idx| {
            let shared = a.contains(idx) && b.contains(idx);
            !shared || output_set.contains(idx) || elsewhere.iter().any(|s| s.contains(idx))
        })
        .collect()
}

/// The product of an index set's dimensions: the size of the tensor that
/// set describes. Used as the cost metric every algorithm here minimizes.
pub(crate) fn cost_of(set: &AHashSet<Index>, size_dict: &AHashMap<Index, usize>) -> u128 {
    set.iter().map(|idx| *size_dict.get(idx).unwrap_or(&1) as u128).product()
}
