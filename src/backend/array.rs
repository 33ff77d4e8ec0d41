//! `ArrayBackend`: an `ndarray`-based `Backend` for tests, benches, and
//! the worked example. Implements the einsum/trace/copy_tensor contract
//! of `spec.md` §6 by brute-force index enumeration rather than any
//! optimized contraction path: the core already decided the path, this
//! backend only has to get the arithmetic right.

use ahash::AHashMap;
use ndarray::{ArrayD, IxDyn};

use crate::error::ContractError;
use crate::tensor::{Backend, Tensor};

/// A dynamically-ranked `f64` array, the only tensor type `ArrayBackend`
/// knows how to produce or consume.
#[derive(Clone, Debug, PartialEq)]
pub struct NdTensor(pub ArrayD<f64>);

impl NdTensor {
    pub fn new(array: ArrayD<f64>) -> Self {
        NdTensor(array)
    }

    pub fn scalar(value: f64) -> Self {
        NdTensor(ArrayD::from_elem(IxDyn(&[]), value))
    }

    pub fn ones(shape: &[usize]) -> Self {
        NdTensor(ArrayD::from_elem(IxDyn(shape), 1.0))
    }

    pub fn array(&self) -> &ArrayD<f64> {
        &self.0
    }
}

impl Tensor for NdTensor {
    fn shape(&self) -> &[usize] {
        self.0.shape()
    }
}

pub struct ArrayBackend;

impl Backend for ArrayBackend {
    type Tensor = NdTensor;

    fn einsum(&self, expr: &str, a: &NdTensor, b: &NdTensor) -> Result<NdTensor, ContractError> {
        let (lhs, out) = expr
            .split_once("->")
            .ok_or_else(|| ContractError::BackendError(format!("malformed einsum expr '{expr}'")))?;
        let (left, right) = lhs
            .split_once(',')
            .ok_or_else(|| ContractError::BackendError(format!("malformed einsum expr '{expr}'")))?;

        let left: Vec<char> = left.chars().collect();
        let right: Vec<char> = right.chars().collect();
        let out: Vec<char> = out.chars().collect();

        if left.len() != a.0.ndim() || right.len() != b.0.ndim() {
            return Err(ContractError::BackendError(format!(
                "einsum expr '{expr}' does not match operand ranks ({}, {})",
                a.0.ndim(),
                b.0.ndim()
            )));
        }

        let mut dims: AHashMap<char, usize> = AHashMap::default();
        for (&c, &d) in left.iter().zip(a.0.shape()) {
            dims.insert(c, d);
        }
        for (&c, &d) in right.iter().zip(b.0.shape()) {
            dims.insert(c, d);
        }

        let sum_labels: Vec<char> = dims.keys().copied().filter(|c| !out.contains(c)).collect();
        let out_shape: Vec<usize> = out.iter().map(|c| dims[c]).collect();
        let sum_shape: Vec<usize> = sum_labels.iter().map(|c| dims[c]).collect();

        let mut result = ArrayD::zeros(IxDyn(&out_shape));
        for out_idx in cartesian(&out_shape) {
            let mut assignment: AHashMap<char, usize> = AHashMap::default();
            for (&c, &i) in out.iter().zip(out_idx.iter()) {
                assignment.insert(c, i);
            }

            let mut total = 0.0;
            for sum_idx in cartesian(&sum_shape) {
                for (&c, &i) in sum_labels.iter().zip(sum_idx.iter()) {
                    assignment.insert(c, i);
                }
                let a_idx: Vec<usize> = left.iter().map(|c| assignment[c]).collect();
                let b_idx: Vec<usize> = right.iter().map(|c| assignment[c]).collect();
                total += a.0[IxDyn(&a_idx)] * b.0[IxDyn(&b_idx)];
            }
            result[IxDyn(&out_idx)] = total;
        }

        Ok(NdTensor(result))
    }

    fn trace(&self, expr: &str, a: &NdTensor) -> Result<NdTensor, ContractError> {
        let (token, out) = expr
            .split_once("->")
            .ok_or_else(|| ContractError::BackendError(format!("malformed trace expr '{expr}'")))?;
        let token: Vec<char> = token.chars().collect();
        let out: Vec<char> = out.chars().collect();

        if token.len() != a.0.ndim() {
            return Err(ContractError::BackendError(format!(
                "trace expr '{expr}' does not match operand rank {}",
                a.0.ndim()
            )));
        }

        let mut dims: AHashMap<char, usize> = AHashMap::default();
        for (&c, &d) in token.iter().zip(a.0.shape()) {
            dims.insert(c, d);
        }

        let sum_labels: Vec<char> = dims.keys().copied().filter(|c| !out.contains(c)).collect();
        let out_shape: Vec<usize> = out.iter().map(|c| dims[c]).collect();
        let sum_shape: Vec<usize> = sum_labels.iter().map(|c| dims[c]).collect();

        let mut result = ArrayD::zeros(IxDyn(&out_shape));
        for out_idx in cartesian(&out_shape) {
            let mut assignment: AHashMap<char, usize> = AHashMap::default();
            for (&c, &i) in out.iter().zip(out_idx.iter()) {
                assignment.insert(c, i);
            }

            let mut total = 0.0;
            for sum_idx in cartesian(&sum_shape) {
                for (&c, &i) in sum_labels.iter().zip(sum_idx.iter()) {
                    assignment.insert(c, i);
                }
                let a_idx: Vec<usize> = token.iter().map(|c| assignment[c]).collect();
                total += a.0[IxDyn(&a_idx)];
            }
            result[IxDyn(&out_idx)] = total;
        }

        Ok(NdTensor(result))
    }

    fn copy_tensor(&self, rank: usize, dimension: usize) -> Result<NdTensor, ContractError> {
        let mut result = ArrayD::zeros(IxDyn(&vec![dimension; rank]));
        for i in 0..dimension {
            result[IxDyn(&vec![i; rank])] = 1.0;
        }
        Ok(NdTensor(result))
    }
}

/// All index tuples over `shape`, in row-major order. `shape == []`
/// yields exactly one (empty) tuple, matching a rank-0 scalar.
fn cartesian(shape: &[usize]) -> impl Iterator<Item = Vec<usize>> + '_ {
    let total: usize = shape.iter().product();
    (0..total).map(move |mut flat| {
        let mut idx = vec![0usize; shape.len()];
        for (i, &d) in shape.iter().enumerate().rev() {
            idx[i] = flat % d;
            flat /= d;
        }
        idx
    })
}
