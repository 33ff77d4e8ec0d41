//! Contraction driver (spec.md §4.5): the top-level algorithm that turns
//! a `Network` into a single tensor, orchestrating the trace pre-pass,
//! connectivity check, path optimizer, and per-pair contractor.

use std::collections::VecDeque;

use ahash::AHashSet;

use crate::contract::contract_pair;
use crate::edge::EdgeKind;
use crate::error::ContractError;
use crate::ids::NodeId;
use crate::optimizer::{build_adapter_input, Optimizer};
use crate::registry::{self, ContractOptions};
use crate::tensor::Backend;
use crate::{einsum, Network};

/// Runs the named algorithm (spec.md §4.6) end to end.
pub fn contract<B: Backend>(network: &mut Network<B>, algorithm: &str, options: &ContractOptions) -> Result<NodeId, ContractError> {
    log::debug!("contract: algorithm={algorithm}");
    let operand_count = network
        .node_order()
        .iter()
        .filter(|&&id| !network.node(id).expect("contract: stale node").is_copy())
        .count();
    let optimizer = registry::resolve(algorithm, operand_count)?;
    run(network, optimizer.as_ref(), options)
}

/// Runs a caller-supplied optimizer satisfying the §4.4 contract.
pub fn custom<B: Backend, O: Optimizer>(network: &mut Network<B>, optimizer: &O, options: &ContractOptions) -> Result<NodeId, ContractError> {
    log::debug!("contract: algorithm=custom");
    run(network, optimizer, options)
}

fn run<B: Backend>(network: &mut Network<B>, optimizer: &dyn Optimizer, options: &ContractOptions) -> Result<NodeId, ContractError> {
    trace_prepass(network)?;
    check_connected(network)?;

    let adapter = build_adapter_input(network);
    log::trace!(
        "contract: {} operand(s), {} dangling edge(s)",
        adapter.sorted_nodes.len(),
        adapter.output_set.len()
    );

    if adapter.sorted_nodes.is_empty() {
        return finalize_sole_copy(network, options);
    }

    let path = optimizer.optimize(&adapter.input_sets, &adapter.output_set, &adapter.size_dict, options.memory_limit)?;

    let mut sorted_nodes = adapter.sorted_nodes;
    for (i, j) in path {
        if i == j || i >= sorted_nodes.len() || j >= sorted_nodes.len() {
            return Err(ContractError::PathError(format!(
                "optimizer returned out-of-range pair ({i}, {j}) for {} live operand(s)",
                sorted_nodes.len()
            )));
        }
        let (lo, hi) = if i < j { (i, j) } else { (j, i) };
        let n1 = sorted_nodes[lo];
        let n2 = sorted_nodes[hi];
        log::trace!("contract: merging pair at positions ({lo}, {hi})");

        let fused = contract_pair(network, n1, n2)?;
        sorted_nodes.remove(hi);
        sorted_nodes.remove(lo);
        sorted_nodes.push(fused);
    }

    if sorted_nodes.len() != 1 {
        return Err(ContractError::PathError(format!(
            "contraction path left {} operand(s) instead of exactly one",
            sorted_nodes.len()
        )));
    }

    finalize(network, sorted_nodes[0], options)
}

fn finalize<B: Backend>(network: &mut Network<B>, final_node: NodeId, options: &ContractOptions) -> Result<NodeId, ContractError> {
    if let Some(order) = &options.output_edge_order {
        network.reorder_axes(final_node, order)?;
    }
    Ok(final_node)
}

/// A network with no tensor operands at all, only copy nodes: never
/// exercised by the concrete scenarios in spec.md §8, but the only
/// remaining way `contract` can be asked to do something sensible.
fn finalize_sole_copy<B: Backend>(network: &mut Network<B>, options: &ContractOptions) -> Result<NodeId, ContractError> {
    let copies: Vec<NodeId> = network
        .node_order()
        .iter()
        .copied()
        .filter(|&id| network.node(id).expect("finalize_sole_copy: stale node").is_copy())
        .collect();
    match copies.as_slice() {
        [] => Err(ContractError::PathError("network has no nodes to contract".to_string())),
        [only] => {
            let materialized = network.contract_copy_node(*only)?;
            finalize(network, materialized, options)
        }
        many => Err(ContractError::DisconnectedNetwork { components: many.len() }),
    }
}

/// Eagerly resolves every self-loop (spec.md §4.5 step 1) before the
/// optimizer ever sees the graph.
fn trace_prepass<B: Backend>(network: &mut Network<B>) -> Result<(), ContractError> {
    let candidates: Vec<NodeId> = network
        .node_order()
        .iter()
        .copied()
        .filter(|&id| {
            let entry = network.node(id).expect("trace_prepass: stale node");
            !entry.is_copy()
                && entry.edges().iter().any(|&e| {
                    network
                        .edge(e)
                        .map(|edge| edge.kind() == EdgeKind::Trace)
                        .unwrap_or(false)
                })
        })
        .collect();

    for id in candidates {
        let axes = network.node(id).expect("trace_prepass: node vanished").edges().to_vec();
        let (in_token, out_token, survivors) = einsum::build_trace_expr(&axes)?;
        let expr = format!("{in_token}->{out_token}");

        let tensor = network
            .node(id)
            .unwrap()
            .as_tensor()
            .expect("trace_prepass: candidate is not a tensor node")
            .tensor()
            .clone();
        let traced = network.backend().trace(&expr, &tensor)?;

        network.install_fused_node(traced, survivors, &[id]);
        log::trace!("trace_prepass: resolved self-loop");
    }
    Ok(())
}

/// Connected-component check (spec.md §4.5 step 2). A network with more
/// than one component fails with `DisconnectedNetwork`; a lone node is
/// always fine regardless of how many dangling edges it carries.
fn check_connected<B: Backend>(network: &Network<B>) -> Result<(), ContractError> {
    let nodes = network.node_order();
    if nodes.len() <= 1 {
        return Ok(());
    }

    let mut seen: AHashSet<NodeId> = AHashSet::default();
    let mut components = 0usize;

    for &start in nodes {
        if seen.contains(&start) {
            continue;
        }
        components += 1;
        let mut queue = VecDeque::new();
        queue.push_back(start);
        seen.insert(start);
        while let Some(n) = queue.pop_front() {
            let entry = network.node(n).expect("check_connected: stale node");
            for &edge_id in entry.edges() {
                let edge = network.edge(edge_id).expect("check_connected: stale edge");
                for (neighbor, _) in edge.endpoints() {
                    if neighbor != n && seen.insert(neighbor) {
                        queue.push_back(neighbor);
                    }
                }
            }
        }
    }

    if components > 1 {
        return Err(ContractError::DisconnectedNetwork { components });
    }
    Ok(())
}
