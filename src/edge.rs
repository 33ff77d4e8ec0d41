//! `Edge`, an undirected connection between up to two `(Node, axis)`
//! slots (spec.md §3).

use crate::ids::NodeId;

/// One endpoint of an edge: a node id and the axis position on that node
/// whose slot this edge occupies.
pub type Endpoint = (NodeId, usize);

/// The three shapes an edge can take, derived from how many of its two
/// endpoint slots are filled and whether they name the same node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// Both endpoints filled, on distinct nodes. Contracted during a pair
    /// merge.
    Standard,
    /// Both endpoints filled, on the same node at distinct axes.
    /// Contracted eagerly in the driver's single-node pre-pass.
    Trace,
    /// One endpoint filled. Survives to the final output.
    Dangling,
}

/// An edge. Endpoint slot 0 is always filled; slot 1 is `None` for a
/// dangling edge. Which physical endpoint of a standard/trace edge lands
/// in slot 0 vs slot 1 only matters for `Network::disconnect`'s ordering
/// guarantee: it is otherwise an unordered pair.
#[derive(Debug, Clone)]
pub struct Edge {
    pub(crate) slots: [Option<Endpoint>; 2],
    pub dimension: usize,
}

impl Edge {
    pub(crate) fn new_dangling(endpoint: Endpoint, dimension: usize) -> Self {
        Edge {
            slots: [Some(endpoint), None],
            dimension,
        }
    }

    pub(crate) fn new_connected(a: Endpoint, b: Endpoint, dimension: usize) -> Self {
        Edge {
            slots: [Some(a), Some(b)],
            dimension,
        }
    }

    pub fn kind(&self) -> EdgeKind {
        match (self.slots[0], self.slots[1]) {
            (Some(_), None) => EdgeKind::Dangling,
            (Some((n1, _)), Some((n2, _))) if n1 == n2 => EdgeKind::Trace,
            (Some(_), Some(_)) => EdgeKind::Standard,
            (None, _) => unreachable!("edge slot 0 is always filled"),
        }
    }

    pub fn is_dangling(&self) -> bool {
        self.kind() == EdgeKind::Dangling
    }

    /// The filled endpoint(s), in slot order.
    pub fn endpoints(&self) -> impl Iterator<Item = Endpoint> + '_ {
        self.slots.iter().filter_map(|e| *e)
    }

    /// True if this edge has an endpoint on `node`.
    pub fn touches(&self, node: NodeId) -> bool {
        self.slots.iter().any(|e| matches!(e, Some((n, _)) if *n == node))
    }

    /// The axis this edge occupies on `node`, if any (a trace edge has
    /// two, the lower-indexed one is returned; callers needing both use
    /// `endpoints()` directly).
    pub fn axis_on(&self, node: NodeId) -> Option<usize> {
        self.slots
            .iter()
            .find_map(|e| e.and_then(|(n, a)| (n == node).then_some(a)))
    }

    /// Both axes this edge occupies on `node` when it is a trace edge.
    pub fn trace_axes(&self, node: NodeId) -> Option<(usize, usize)> {
        match (self.slots[0], self.slots[1]) {
            (Some((n1, a1)), Some((n2, a2))) if n1 == node && n2 == node => Some((a1, a2)),
            _ => None,
        }
    }
}
