//! The backend contract (spec §6): the only runtime dependency of the
//! contraction core. The core never inspects tensor elements directly:
//! it only asks a tensor for its `shape` and asks the backend to combine
//! two tensors (or fold one tensor against itself) via an einsum-style
//! expression.

use crate::error::ContractError;

/// An opaque multi-dimensional array value with a known shape.
///
/// Implementors are produced and consumed only by a `Backend`; the core
/// never constructs or reads into one.
pub trait Tensor: Clone {
    /// Ordered sequence of positive axis extents. `shape().len()` is the
    /// tensor's rank.
    fn shape(&self) -> &[usize];

    fn rank(&self) -> usize {
        self.shape().len()
    }
}

/// The generalized sum-product primitive the core dispatches to.
///
/// `expr` follows the convention `"s1,s2->sout"` (or `"s->sout"` for
/// `trace`) with single-character labels drawn from the alphabet in
/// `crate::einsum::ALPHABET`: a label repeated on one operand denotes a
/// diagonal, a label present on both operands but absent from `sout`
/// denotes a contracted (summed) index.
pub trait Backend {
    type Tensor: Tensor;

    /// `expr` has the two-operand form `"left,right->out"`.
    fn einsum(
        &self,
        expr: &str,
        a: &Self::Tensor,
        b: &Self::Tensor,
    ) -> Result<Self::Tensor, ContractError>;

    /// `expr` has the single-operand form `"in->out"`, used to resolve a
    /// trace edge (a repeated label on `in`) before path planning.
    fn trace(&self, expr: &str, a: &Self::Tensor) -> Result<Self::Tensor, ContractError>;

    /// Construct the rank-`rank` diagonal-of-ones tensor a `CopyNode`
    /// represents, once it must actually be materialized (i.e. when it is
    /// contracted directly rather than coalesced away by the adapter).
    fn copy_tensor(&self, rank: usize, dimension: usize) -> Result<Self::Tensor, ContractError>;
}
