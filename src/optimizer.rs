//! Path-optimizer adapter (spec.md §4.4).
//!
//! Converts the live graph into the flat input-set/output-set/size-dict
//! form an external path optimizer expects, coalescing every copy node's
//! non-dangling edges onto one representative `Index` so the optimizer
//! never has to know hyper-edges exist.

use ahash::{AHashMap, AHashSet};

use crate::error::ContractError;
use crate::ids::{EdgeId, NodeId};
use crate::tensor::Backend;
use crate::Network;

/// The opaque index identity the optimizer contract is phrased over. This
/// crate uses the coalesced `EdgeId` itself: after `edge_map`
/// substitution it already has the right identity semantics (same id iff
/// same summation index).
pub type Index = EdgeId;

/// A pluggable path optimizer, matching spec.md §4.4's external contract
/// exactly. `optimize` must return a sequence of pairs whose list
/// semantics are: positions refer to an evolving list that starts as
/// `input_sets`; each pair is consumed (removed) and its merge result is
/// appended to the end, so a later pair's positions may name either an
/// original operand or an earlier merge result.
pub trait Optimizer {
    fn optimize(
        &self,
        input_sets: &[AHashSet<Index>],
        output_set: &AHashSet<Index>,
        size_dict: &AHashMap<Index, usize>,
        memory_limit: Option<usize>,
    ) -> Result<Vec<(usize, usize)>, ContractError>;
}

/// Everything the driver hands to an `Optimizer`, plus the node ids the
/// resulting positions resolve against.
pub struct AdapterInput {
    pub sorted_nodes: Vec<NodeId>,
    pub input_sets: Vec<AHashSet<Index>>,
    pub output_set: AHashSet<Index>,
    pub size_dict: AHashMap<Index, usize>,
}

/// Builds the representative-edge coalescing map: for each copy node,
/// picks its first non-dangling edge (in axis order) and maps every other
/// non-dangling edge of that copy node to it. Dangling edges are left
/// alone: each is its own distinct output axis (spec.md §4.4 step 3).
fn build_edge_map<B: Backend>(network: &Network<B>) -> AHashMap<EdgeId, EdgeId> {
    let mut edge_map = AHashMap::default();
    for &id in network.node_order() {
        let Some(copy) = network.node(id).and_then(|e| e.as_copy()) else {
            continue;
        };
        let mut non_dangling = copy
            .edges()
            .iter()
            .copied()
            .filter(|&e| !network.edge(e).expect("build_edge_map: dangling axis edge missing").is_dangling());
        if let Some(representative) = non_dangling.next() {
            for other in non_dangling {
                edge_map.insert(other, representative);
            }
        }
    }
    edge_map
}

pub fn build_adapter_input<B: Backend>(network: &Network<B>) -> AdapterInput {
    let edge_map = build_edge_map(network);
    let resolve = |e: EdgeId| *edge_map.get(&e).unwrap_or(&e);

    let sorted_nodes: Vec<NodeId> = network
        .node_order()
        .iter()
        .copied()
        .filter(|&id| !network.node(id).expect("sorted_nodes: stale id").is_copy())
        .collect();

    let input_sets: Vec<AHashSet<Index>> = sorted_nodes
        .iter()
        .map(|&id| {
            network
                .node(id)
                .expect("input_sets: stale id")
                .edges()
                .iter()
                .map(|&e| resolve(e))
                .collect()
        })
        .collect();

    let output_set: AHashSet<Index> = network
        .get_all_edges()
        .into_iter()
        .filter(|&e| network.edge(e).expect("output_set: stale edge").is_dangling())
        .map(resolve)
        .collect();

    let mut size_dict: AHashMap<Index, usize> = AHashMap::default();
    for idx in input_sets.iter().flatten().chain(output_set.iter()) {
        size_dict
            .entry(*idx)
            .or_insert_with(|| network.edge(*idx).expect("size_dict: stale edge").dimension);
    }

    AdapterInput {
        sorted_nodes,
        input_sets,
        output_set,
        size_dict,
    }
}
