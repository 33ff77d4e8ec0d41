//! `Network`, the mutable hyper-edge graph and the only thing in this
//! crate allowed to rewrite topology (spec.md §3, §4.1).

use ahash::{AHashMap, AHashSet};
use slotmap::SlotMap;

use crate::edge::{Edge, EdgeKind, Endpoint};
use crate::error::ContractError;
use crate::ids::{EdgeId, NodeId};
use crate::node::{CopyNode, Node, NodeEntry};
use crate::tensor::{Backend, Tensor};

/// One axis of a node under construction by `install_fused_node_ex` /
/// `install_copy_node_ex`: either an edge that already exists and just
/// needs retargeting onto the new node, or a brand-new dangling edge.
pub(crate) enum AxisSource {
    Existing(EdgeId),
    Fresh(usize),
}

/// The owning container: a set of live nodes and the edges reachable from
/// them. `Network` never lazily compacts; every operation below is O(its
/// own degree), eager, and leaves the six invariants of spec.md §3 intact
/// on return.
pub struct Network<B: Backend> {
    pub(crate) backend: B,
    pub(crate) nodes: SlotMap<NodeId, NodeEntry<B::Tensor>>,
    pub(crate) edges: SlotMap<EdgeId, Edge>,
    /// Insertion order of currently-live nodes. Gives the adapter (§4.4)
    /// and driver (§4.5) an "arbitrary but stable" `sorted_nodes` without
    /// requiring `NodeId: Ord`.
    pub(crate) order: Vec<NodeId>,
}

impl<B: Backend> Network<B> {
    pub fn new(backend: B) -> Self {
        Network {
            backend,
            nodes: SlotMap::with_key(),
            edges: SlotMap::with_key(),
            order: Vec::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    // ---- accessors -------------------------------------------------

    pub fn node(&self, id: NodeId) -> Option<&NodeEntry<B::Tensor>> {
        self.nodes.get(id)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id)
    }

    /// Live nodes in stable (insertion minus removal) order.
    pub fn node_order(&self) -> &[NodeId] {
        &self.order
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// The unique remaining non-copy node after a successful `contract`
    /// (spec.md §6). `None` if the network is empty or has more than one
    /// such node (i.e. `contract` was never run, or failed).
    pub fn get_final_node(&self) -> Option<NodeId> {
        let mut tensors = self.order.iter().copied().filter(|&id| !self.nodes[id].is_copy());
        let only = tensors.next()?;
        if tensors.next().is_some() {
            return None;
        }
        Some(only)
    }

    /// All edges reachable from any live node.
    pub fn get_all_edges(&self) -> AHashSet<EdgeId> {
        self.edges.keys().collect()
    }

    /// The subset of `get_all_edges()` whose `kind()` is not `Dangling`.
    pub fn get_all_nondangling(&self) -> AHashSet<EdgeId> {
        self.edges
            .iter()
            .filter(|(_, e)| !e.is_dangling())
            .map(|(id, _)| id)
            .collect()
    }

    /// All edges with one endpoint on `n1` and the other on `n2`.
    ///
    /// # Panics
    /// If `n1 == n2` (shared edges are only defined between distinct
    /// nodes; a self-loop is a trace edge, reachable via the node's own
    /// `edges()`).
    pub fn get_shared_edges(&self, n1: NodeId, n2: NodeId) -> AHashSet<EdgeId> {
        assert_ne!(n1, n2, "get_shared_edges requires two distinct nodes");
        let Some(a) = self.nodes.get(n1) else {
            return AHashSet::default();
        };
        a.edges()
            .iter()
            .copied()
            .filter(|e| self.edges[*e].touches(n2))
            .collect()
    }

    /// Copy-neighbors of `node`: the copy nodes with a non-dangling edge
    /// to `node`.
    pub fn copy_neighbors(&self, node: NodeId) -> AHashSet<NodeId> {
        let Some(entry) = self.nodes.get(node) else {
            return AHashSet::default();
        };
        entry
            .edges()
            .iter()
            .filter(|e| !self.edges[**e].is_dangling())
            .filter_map(|e| {
                self.edges[*e]
                    .endpoints()
                    .map(|(n, _)| n)
                    .find(|&n| n != node)
            })
            .filter(|&n| self.nodes.get(n).is_some_and(|e| e.is_copy()))
            .collect()
    }

    // ---- mutation ----------------------------------------------------

    /// Adds a node carrying `tensor`, creating one dangling edge per axis.
    pub fn add_node(&mut self, tensor: B::Tensor, axis_names: Option<Vec<String>>) -> NodeId {
        let rank = tensor.rank();
        let shape = tensor.shape().to_vec();
        self.nodes.insert_with_key(|id| {
            let axes = (0..rank)
                .map(|axis| self.edges.insert(Edge::new_dangling((id, axis), shape[axis])))
                .collect::<Vec<_>>();
            self.order.push(id);
            NodeEntry::Tensor(Node::new(tensor, axes, axis_names))
        })
    }

    /// Adds a rank-`rank`, dimension-`dimension` copy node. Its tensor is
    /// implicit (spec.md §3) and is never constructed here.
    pub fn add_copy_node(&mut self, rank: usize, dimension: usize) -> NodeId {
        self.nodes.insert_with_key(|id| {
            let axes = (0..rank)
                .map(|axis| self.edges.insert(Edge::new_dangling((id, axis), dimension)))
                .collect::<Vec<_>>();
            self.order.push(id);
            NodeEntry::Copy(CopyNode::new(axes, dimension))
        })
    }

    /// Fuses two dangling edges into one standard (or, if they share a
    /// node, trace) edge. The edge dimensions must already agree.
    pub fn connect(&mut self, e1: EdgeId, e2: EdgeId) -> Result<EdgeId, ContractError> {
        let edge1 = self.edges.get(e1).expect("connect: e1 not live");
        let edge2 = self.edges.get(e2).expect("connect: e2 not live");
        assert!(edge1.is_dangling(), "connect: e1 is not dangling");
        assert!(edge2.is_dangling(), "connect: e2 is not dangling");

        if edge1.dimension != edge2.dimension {
            return Err(ContractError::DimensionMismatch {
                context: "connect",
                left: edge1.dimension,
                right: edge2.dimension,
            });
        }
        let dim = edge1.dimension;
        let ep1 = edge1.endpoints().next().unwrap();
        let ep2 = edge2.endpoints().next().unwrap();

        self.edges.remove(e1);
        self.edges.remove(e2);
        let new_id = self.edges.insert(Edge::new_connected(ep1, ep2, dim));
        self.retarget_axis(ep1.0, ep1.1, new_id);
        self.retarget_axis(ep2.0, ep2.1, new_id);
        Ok(new_id)
    }

    /// Inverse of `connect`. Splits a standard or trace edge back into two
    /// dangling edges. The edge endpointed on `first` is returned first.
    pub fn disconnect(&mut self, edge: EdgeId, first: NodeId) -> (EdgeId, EdgeId) {
        let e = self.edges.get(edge).expect("disconnect: edge not live");
        assert!(!e.is_dangling(), "disconnect: edge is already dangling");
        let dim = e.dimension;
        let mut eps: Vec<Endpoint> = e.endpoints().collect();
        self.edges.remove(edge);

        if eps[0].0 != first {
            eps.swap(0, 1);
        }
        let d0 = self.edges.insert(Edge::new_dangling(eps[0], dim));
        self.retarget_axis(eps[0].0, eps[0].1, d0);
        let d1 = self.edges.insert(Edge::new_dangling(eps[1], dim));
        self.retarget_axis(eps[1].0, eps[1].1, d1);
        (d0, d1)
    }

    /// Removes `n`, disconnecting every non-dangling edge of it. Returns
    /// the freshly-dangling partner edges, keyed by `n`'s axis.
    pub fn remove_node(&mut self, n: NodeId) -> AHashMap<usize, EdgeId> {
        let axes = self.nodes.get(n).expect("remove_node: not live").edges().to_vec();
        let mut result = AHashMap::default();
        let mut handled_trace = AHashSet::default();

        for (axis, edge_id) in axes.iter().enumerate() {
            if handled_trace.contains(edge_id) {
                continue;
            }
            let Some(e) = self.edges.get(*edge_id) else {
                continue;
            };
            match e.kind() {
                EdgeKind::Dangling => {
                    self.edges.remove(*edge_id);
                }
                EdgeKind::Trace => {
                    handled_trace.insert(*edge_id);
                    self.edges.remove(*edge_id);
                }
                EdgeKind::Standard => {
                    let (_, partner) = self.disconnect(*edge_id, n);
                    result.insert(axis, partner);
                }
            }
        }
        self.nodes.remove(n);
        self.order.retain(|&id| id != n);
        result
    }

    /// Materializes a copy node's implicit diagonal tensor, replacing it
    /// with an ordinary `Node` carrying the same edges at the same axis
    /// positions. Used when a copy node survives to be the network's final
    /// output rather than being folded into a neighbor by the contractor.
    pub fn contract_copy_node(&mut self, copy: NodeId) -> Result<NodeId, ContractError> {
        let entry = self.nodes.get(copy).expect("contract_copy_node: not live");
        let c = entry.as_copy().expect("contract_copy_node: not a copy node");
        let tensor = self.backend.copy_tensor(c.rank(), c.dimension())?;
        let axes = c.edges().to_vec();

        self.nodes.remove(copy);
        let new_id = self
            .nodes
            .insert(NodeEntry::Tensor(Node::new(tensor, axes.clone(), None)));
        for (axis, edge_id) in axes.iter().enumerate() {
            self.retarget_axis(copy, axis, *edge_id);
            self.retarget_edge_endpoint(*edge_id, copy, new_id);
        }
        if let Some(pos) = self.order.iter().position(|&id| id == copy) {
            self.order[pos] = new_id;
        }
        Ok(new_id)
    }

    /// Inserts a brand-new node (the result of a pair merge) and removes
    /// every node in `old_nodes`. The edges in `axes` must already be
    /// endpointed on one of `old_nodes` at the given source axes (the
    /// ordinary case is `old_nodes = [n1, n2]`; a merge that also absorbs
    /// a fully-consumed copy node per spec.md §4.3 step 3 adds it to the
    /// slice so its surviving edge gets retargeted too); this call
    /// rewires them onto `new_id`.
    pub(crate) fn install_fused_node(
        &mut self,
        tensor: B::Tensor,
        axes: Vec<EdgeId>,
        old_nodes: &[NodeId],
    ) -> NodeId {
        let new_id = self
            .nodes
            .insert(NodeEntry::Tensor(Node::new(tensor, axes.clone(), None)));
        for (axis, edge_id) in axes.iter().enumerate() {
            for &old in old_nodes {
                self.retarget_edge_endpoint(*edge_id, old, new_id);
            }
            self.retarget_axis(new_id, axis, *edge_id);
        }
        self.sweep_consumed_edges(old_nodes, &axes);
        for &old in old_nodes {
            self.nodes.remove(old);
        }
        self.order.retain(|id| !old_nodes.contains(id));
        self.order.push(new_id);
        new_id
    }

    /// Removes every edge of `old_nodes` that didn't make it into
    /// `surviving`: a standard edge wholly internal to `old_nodes` was
    /// contracted away by this merge and would otherwise linger in the
    /// arena forever with both endpoints pointing at soon-to-be-dead nodes.
    fn sweep_consumed_edges(&mut self, old_nodes: &[NodeId], surviving: &[EdgeId]) {
        let mut dead = AHashSet::default();
        for &old in old_nodes {
            let Some(entry) = self.nodes.get(old) else { continue };
            for &e in entry.edges() {
                if !surviving.contains(&e) {
                    dead.insert(e);
                }
            }
        }
        for e in dead {
            self.edges.remove(e);
        }
    }

    /// Drops a node that has already been fully absorbed elsewhere (all of
    /// its edges retargeted or removed by the caller). Unlike
    /// `remove_node`, this does not touch any edges.
    pub(crate) fn retire_node(&mut self, id: NodeId) {
        self.nodes.remove(id);
        self.order.retain(|&n| n != id);
    }

    /// Inserts a brand-new tensor node whose axes are a mix of retargeted
    /// pre-existing edges and freshly allocated dangling ones, removing
    /// every node in `old_nodes`. Used by the copy-aware contractor
    /// (spec.md §4.3 step 3) where a coalesced copy-node index becomes a
    /// genuinely new axis on the fused node rather than an inherited one.
    pub(crate) fn install_fused_node_ex(
        &mut self,
        tensor: B::Tensor,
        sources: Vec<AxisSource>,
        old_nodes: &[NodeId],
    ) -> NodeId {
        let Network { nodes, edges, order, .. } = self;
        let new_id = nodes.insert_with_key(|id| {
            let axes: Vec<EdgeId> = sources
                .into_iter()
                .enumerate()
                .map(|(axis, src)| match src {
                    AxisSource::Existing(edge_id) => {
                        if let Some(e) = edges.get_mut(edge_id) {
                            for slot in e.slots.iter_mut() {
                                if let Some((n, a)) = slot {
                                    if old_nodes.contains(n) {
                                        *n = id;
                                        *a = axis;
                                    }
                                }
                            }
                        }
                        edge_id
                    }
                    AxisSource::Fresh(dimension) => edges.insert(Edge::new_dangling((id, axis), dimension)),
                })
                .collect();
            NodeEntry::Tensor(Node::new(tensor, axes, None))
        });
        let surviving = nodes.get(new_id).unwrap().edges().to_vec();
        let mut dead = AHashSet::default();
        for &old in old_nodes {
            let Some(entry) = nodes.get(old) else { continue };
            for &e in entry.edges() {
                if !surviving.contains(&e) {
                    dead.insert(e);
                }
            }
        }
        for e in dead {
            edges.remove(e);
        }
        for &old in old_nodes {
            nodes.remove(old);
        }
        order.retain(|n| !old_nodes.contains(n));
        order.push(new_id);
        new_id
    }

    /// Same as `install_fused_node_ex` but for a surviving copy node
    /// (spec.md §4.3 step 3, third-party branch).
    pub(crate) fn install_copy_node_ex(
        &mut self,
        dimension: usize,
        sources: Vec<AxisSource>,
        old_nodes: &[NodeId],
    ) -> NodeId {
        let Network { nodes, edges, order, .. } = self;
        let new_id = nodes.insert_with_key(|id| {
            let axes: Vec<EdgeId> = sources
                .into_iter()
                .enumerate()
                .map(|(axis, src)| match src {
                    AxisSource::Existing(edge_id) => {
                        if let Some(e) = edges.get_mut(edge_id) {
                            for slot in e.slots.iter_mut() {
                                if let Some((n, a)) = slot {
                                    if old_nodes.contains(n) {
                                        *n = id;
                                        *a = axis;
                                    }
                                }
                            }
                        }
                        edge_id
                    }
                    AxisSource::Fresh(dim) => edges.insert(Edge::new_dangling((id, axis), dim)),
                })
                .collect();
            NodeEntry::Copy(CopyNode::new(axes, dimension))
        });
        for &old in old_nodes {
            nodes.remove(old);
        }
        order.retain(|n| !old_nodes.contains(n));
        order.push(new_id);
        new_id
    }

    /// Permutes `node`'s axis order to match `order` exactly (spec.md
    /// §4.5 step 6, caller-supplied `output_edge_order`). `order` must
    /// name precisely the node's current edges.
    pub fn reorder_axes(&mut self, node: NodeId, order: &[EdgeId]) -> Result<(), ContractError> {
        let current = self
            .nodes
            .get(node)
            .expect("reorder_axes: not live")
            .edges()
            .to_vec();
        if order.len() != current.len() || !current.iter().all(|e| order.contains(e)) {
            return Err(ContractError::PathError(format!(
                "output_edge_order does not match the final node's {} edge(s)",
                current.len()
            )));
        }
        for (axis, &edge_id) in order.iter().enumerate() {
            if let Some(e) = self.edges.get_mut(edge_id) {
                for slot in e.slots.iter_mut() {
                    if let Some((n, a)) = slot {
                        if *n == node {
                            *a = axis;
                        }
                    }
                }
            }
        }
        match self.nodes.get_mut(node).expect("reorder_axes: not live") {
            NodeEntry::Tensor(n) => n.axes = order.to_vec(),
            NodeEntry::Copy(c) => c.axes = order.to_vec(),
        }
        Ok(())
    }

    // ---- internal helpers ---------------------------------------------

    /// Points `node`'s axis slot `axis` at `edge_id` (does not touch the
    /// edge itself, callers ensure the edge already names this endpoint).
    fn retarget_axis(&mut self, node: NodeId, axis: usize, edge_id: EdgeId) {
        if let Some(entry) = self.nodes.get_mut(node) {
            let axes = match entry {
                NodeEntry::Tensor(n) => &mut n.axes,
                NodeEntry::Copy(c) => &mut c.axes,
            };
            if axis < axes.len() {
                axes[axis] = edge_id;
            }
        }
    }

    /// Rewrites any endpoint of `edge_id` naming `old` to name `new`
    /// instead, preserving the axis.
    fn retarget_edge_endpoint(&mut self, edge_id: EdgeId, old: NodeId, new: NodeId) {
        if let Some(e) = self.edges.get_mut(edge_id) {
            for slot in e.slots.iter_mut() {
                if let Some((n, _)) = slot {
                    if *n == old {
                        *n = new;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::Tensor as _;

    #[derive(Clone, Debug)]
    struct FakeTensor(Vec<usize>);
    impl Tensor for FakeTensor {
        fn shape(&self) -> &[usize] {
            &self.0
        }
    }

    struct FakeBackend;
    impl Backend for FakeBackend {
        type Tensor = FakeTensor;
        fn einsum(&self, _: &str, _: &FakeTensor, _: &FakeTensor) -> Result<FakeTensor, ContractError> {
            unimplemented!()
        }
        fn trace(&self, _: &str, _: &FakeTensor) -> Result<FakeTensor, ContractError> {
            unimplemented!()
        }
        fn copy_tensor(&self, rank: usize, dimension: usize) -> Result<FakeTensor, ContractError> {
            Ok(FakeTensor(vec![dimension; rank]))
        }
    }

    #[test]
    fn connect_disconnect_round_trip() {
        let mut net = Network::new(FakeBackend);
        let a = net.add_node(FakeTensor(vec![3, 3]), None);
        let b = net.add_node(FakeTensor(vec![3, 3]), None);
        let ea = net.node(a).unwrap().edges()[0];
        let eb = net.node(b).unwrap().edges()[0];

        let edge = net.connect(ea, eb).unwrap();
        assert_eq!(net.edge(edge).unwrap().kind(), EdgeKind::Standard);

        let (first, second) = net.disconnect(edge, a);
        assert!(net.edge(first).unwrap().touches(a));
        assert!(net.edge(second).unwrap().touches(b));
        assert!(net.edge(first).unwrap().is_dangling());
        assert!(net.edge(second).unwrap().is_dangling());
    }

    #[test]
    fn dimension_mismatch_on_connect() {
        let mut net = Network::new(FakeBackend);
        let a = net.add_node(FakeTensor(vec![3]), None);
        let b = net.add_node(FakeTensor(vec![4]), None);
        let ea = net.node(a).unwrap().edges()[0];
        let eb = net.node(b).unwrap().edges()[0];
        assert!(matches!(
            net.connect(ea, eb),
            Err(ContractError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn remove_node_disconnects_neighbors() {
        let mut net = Network::new(FakeBackend);
        let a = net.add_node(FakeTensor(vec![2]), None);
        let b = net.add_node(FakeTensor(vec![2]), None);
        let ea = net.node(a).unwrap().edges()[0];
        let eb = net.node(b).unwrap().edges()[0];
        net.connect(ea, eb).unwrap();

        let dangling = net.remove_node(a);
        assert_eq!(dangling.len(), 1);
        let leftover = dangling[&0];
        assert!(net.edge(leftover).unwrap().touches(b));
        assert!(net.edge(leftover).unwrap().is_dangling());
        assert!(net.node(a).is_none());
    }
}
