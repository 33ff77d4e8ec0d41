//! Reference `Backend` implementation (SPEC_FULL.md §A, §E).
//!
//! The contraction core in the rest of this crate never depends on this
//! module: it is an `ndarray`-backed stand-in for "some real numeric
//! library", gated behind the `test-backend` feature so the production
//! surface of the crate stays backend-agnostic. Tests, benches, and the
//! worked example under `demos/` all use it.

#[cfg(feature = "test-backend")]
mod array;

#[cfg(feature = "test-backend")]
pub use array::{ArrayBackend, NdTensor};
