//! `Node` and `CopyNode` (spec.md §3).

use crate::ids::EdgeId;
use crate::tensor::Tensor;

/// A vertex carrying a tensor of rank `r` and an ordered sequence of `r`
/// axis slots, each naming the `Edge` occupying that axis.
#[derive(Debug, Clone)]
pub struct Node<T: Tensor> {
    pub(crate) tensor: T,
    pub(crate) axes: Vec<EdgeId>,
    pub(crate) axis_names: Option<Vec<String>>,
}

impl<T: Tensor> Node<T> {
    pub(crate) fn new(tensor: T, axes: Vec<EdgeId>, axis_names: Option<Vec<String>>) -> Self {
        debug_assert_eq!(tensor.rank(), axes.len());
        Node {
            tensor,
            axes,
            axis_names,
        }
    }

    pub fn tensor(&self) -> &T {
        &self.tensor
    }

    pub fn shape(&self) -> &[usize] {
        self.tensor.shape()
    }

    pub fn rank(&self) -> usize {
        self.axes.len()
    }

    pub fn edges(&self) -> &[EdgeId] {
        &self.axes
    }

    /// Look up an axis position by its human-readable name. Names are
    /// lookup aliases only; the authoritative coordinate is the integer
    /// position returned here.
    pub fn axis_named(&self, name: &str) -> Option<usize> {
        self.axis_names
            .as_ref()
            .and_then(|names| names.iter().position(|n| n == name))
    }
}

/// A rank-`k`, dimension-`d` diagonal-of-ones node. Its tensor is never
/// materialized by the core; it exists purely to mark "these `k` axes all
/// carry the same summation index" (spec.md §3, §4.3).
#[derive(Debug, Clone)]
pub struct CopyNode {
    pub(crate) axes: Vec<EdgeId>,
    pub(crate) dimension: usize,
}

impl CopyNode {
    pub(crate) fn new(axes: Vec<EdgeId>, dimension: usize) -> Self {
        CopyNode { axes, dimension }
    }

    pub fn rank(&self) -> usize {
        self.axes.len()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn edges(&self) -> &[EdgeId] {
        &self.axes
    }
}

/// Either shape a live vertex can take in the arena.
#[derive(Debug, Clone)]
pub enum NodeEntry<T: Tensor> {
    Tensor(Node<T>),
    Copy(CopyNode),
}

impl<T: Tensor> NodeEntry<T> {
    pub fn rank(&self) -> usize {
        match self {
            NodeEntry::Tensor(n) => n.rank(),
            NodeEntry::Copy(c) => c.rank(),
        }
    }

    pub fn edges(&self) -> &[EdgeId] {
        match self {
            NodeEntry::Tensor(n) => n.edges(),
            NodeEntry::Copy(c) => c.edges(),
        }
    }

    pub fn is_copy(&self) -> bool {
        matches!(self, NodeEntry::Copy(_))
    }

    pub fn as_tensor(&self) -> Option<&Node<T>> {
        match self {
            NodeEntry::Tensor(n) => Some(n),
            NodeEntry::Copy(_) => None,
        }
    }

    pub fn as_copy(&self) -> Option<&CopyNode> {
        match self {
            NodeEntry::Copy(c) => Some(c),
            NodeEntry::Tensor(_) => None,
        }
    }
}
