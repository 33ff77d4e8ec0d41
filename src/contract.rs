//! Copy-aware pair contraction (spec.md §4.2, §4.3).
//!
//! `contract_pair` is the only place the driver calls into to turn two
//! live nodes into one. It always goes through the same three steps:
//! trivialize any rank-2 copy nodes shared between the pair, classify
//! every axis of both nodes, build the einsum expression, then ask the
//! backend to do the arithmetic and rewire the network around the
//! result.

use ahash::{AHashMap, AHashSet};

use crate::edge::EdgeKind;
use crate::einsum::{self, AxisRole, LabelGroup};
use crate::error::ContractError;
use crate::ids::{EdgeId, NodeId};
use crate::network::{AxisSource, Network};
use crate::tensor::Backend;

/// What's left of a shared copy node once its edges to `n1`/`n2` are
/// spoken for: either nothing (fully consumed), one edge (degenerates to
/// a plain survivor), or several (the copy node itself survives at
/// reduced rank).
struct CopyRemainder {
    /// Edges of the copy node other than the ones touching `n1`/`n2` in
    /// this merge: the copy's own dangling axes and any edges to
    /// third-party nodes.
    remaining: Vec<EdgeId>,
}

impl CopyRemainder {
    fn expose(&self) -> bool {
        !self.remaining.is_empty()
    }
}

pub fn contract_pair<B: Backend>(network: &mut Network<B>, n1: NodeId, n2: NodeId) -> Result<NodeId, ContractError> {
    trivialize_two_edge_copies(network, n1, n2)?;

    let shared_copies = network.copy_neighbors(n1).intersection(&network.copy_neighbors(n2)).copied().collect::<AHashSet<_>>();
    let standard_shared = network.get_shared_edges(n1, n2);

    let n1_axes = network
        .node(n1)
        .expect("contract_pair: n1 not live")
        .edges()
        .to_vec();
    let n2_axes = network
        .node(n2)
        .expect("contract_pair: n2 not live")
        .edges()
        .to_vec();

    if shared_copies.is_empty() {
        return contract_plain_pair(network, n1, n2, &n1_axes, &n2_axes, &standard_shared);
    }

    let mut copy_info: AHashMap<NodeId, CopyRemainder> = AHashMap::default();
    for &c in &shared_copies {
        let entry = network.node(c).expect("contract_pair: shared copy not live");
        let remaining = entry
            .edges()
            .iter()
            .copied()
            .filter(|e| {
                let edge = network.edge(*e).expect("contract_pair: dangling axis edge missing");
                !(edge.touches(n1) || edge.touches(n2))
            })
            .collect();
        copy_info.insert(c, CopyRemainder { remaining });
    }

    let n1_roles = build_roles(network, &n1_axes, &standard_shared, &shared_copies, &copy_info);
    let n2_roles = build_roles(network, &n2_axes, &standard_shared, &shared_copies, &copy_info);

    let plan = einsum::build_pair_expr(&n1_roles, &n2_roles)?;
    let expr = format!("{},{}->{}", plan.left, plan.right, plan.out);

    let n1_tensor = network.node(n1).unwrap().as_tensor().expect("n1 is not a tensor").tensor().clone();
    let n2_tensor = network.node(n2).unwrap().as_tensor().expect("n2 is not a tensor").tensor().clone();
    let tensor = network.backend().einsum(&expr, &n1_tensor, &n2_tensor)?;

    let mut sources = Vec::with_capacity(plan.output_sources.len());
    let mut old_nodes = vec![n1, n2];
    // A shared copy node with nothing left over (no third-party edges, no
    // remaining dangling axis) is consumed entirely by this merge: it
    // never appears in `plan.output_sources` (nothing of it is exposed),
    // so it has to be retired here explicitly or it lingers as a stale
    // live node.
    old_nodes.extend(copy_info.iter().filter(|(_, info)| info.remaining.is_empty()).map(|(&c, _)| c));
    // (axis position in `sources`, copy node, its dimension, its remaining
    // edges) for groups that need a brand-new surviving copy node.
    let mut survivors: Vec<(usize, NodeId, usize, Vec<EdgeId>)> = Vec::new();

    for src in &plan.output_sources {
        match src {
            Ok((0, axis)) => sources.push(AxisSource::Existing(n1_axes[*axis])),
            Ok((1, axis)) => sources.push(AxisSource::Existing(n2_axes[*axis])),
            Ok(_) => unreachable!("pair merge only has two sides"),
            Err(LabelGroup::Copy(c)) => {
                let info = &copy_info[c];
                let dimension = network.node(*c).unwrap().as_copy().unwrap().dimension();
                if info.remaining.len() == 1 {
                    sources.push(AxisSource::Existing(info.remaining[0]));
                    old_nodes.push(*c);
                } else {
                    survivors.push((sources.len(), *c, dimension, info.remaining.clone()));
                    sources.push(AxisSource::Fresh(dimension));
                }
            }
            Err(LabelGroup::Edge(_)) => unreachable!("a standard shared edge never survives to the output"),
        }
    }

    let fused = network.install_fused_node_ex(tensor, sources, &old_nodes);

    for (axis, old_copy, dimension, remaining) in survivors {
        let fused_edge = network.node(fused).unwrap().edges()[axis];
        let mut copy_sources: Vec<AxisSource> = remaining.into_iter().map(AxisSource::Existing).collect();
        copy_sources.push(AxisSource::Fresh(dimension));
        let new_copy = network.install_copy_node_ex(dimension, copy_sources, &[old_copy]);
        let new_copy_edge = *network.node(new_copy).unwrap().edges().last().unwrap();
        network.connect(fused_edge, new_copy_edge)?;
    }

    Ok(fused)
}

fn contract_plain_pair<B: Backend>(
    network: &mut Network<B>,
    n1: NodeId,
    n2: NodeId,
    n1_axes: &[EdgeId],
    n2_axes: &[EdgeId],
    standard_shared: &AHashSet<EdgeId>,
) -> Result<NodeId, ContractError> {
    let n1_roles: Vec<AxisRole> = n1_axes
        .iter()
        .map(|e| plain_role(*e, standard_shared))
        .collect();
    let n2_roles: Vec<AxisRole> = n2_axes
        .iter()
        .map(|e| plain_role(*e, standard_shared))
        .collect();

    let plan = einsum::build_pair_expr(&n1_roles, &n2_roles)?;
    let expr = format!("{},{}->{}", plan.left, plan.right, plan.out);

    let n1_tensor = network.node(n1).unwrap().as_tensor().expect("n1 is not a tensor").tensor().clone();
    let n2_tensor = network.node(n2).unwrap().as_tensor().expect("n2 is not a tensor").tensor().clone();
    let tensor = network.backend().einsum(&expr, &n1_tensor, &n2_tensor)?;

    let axes: Vec<EdgeId> = plan
        .output_sources
        .iter()
        .map(|src| match src {
            Ok((0, axis)) => n1_axes[*axis],
            Ok((1, axis)) => n2_axes[*axis],
            _ => unreachable!("plain pair merge has no copy groups"),
        })
        .collect();

    Ok(network.install_fused_node(tensor, axes, &[n1, n2]))
}

fn plain_role(edge: EdgeId, standard_shared: &AHashSet<EdgeId>) -> AxisRole {
    if standard_shared.contains(&edge) {
        AxisRole::Shared {
            group: LabelGroup::Edge(edge),
            expose: false,
        }
    } else {
        AxisRole::Survive
    }
}

fn build_roles<B: Backend>(
    network: &Network<B>,
    axes: &[EdgeId],
    standard_shared: &AHashSet<EdgeId>,
    shared_copies: &AHashSet<NodeId>,
    copy_info: &AHashMap<NodeId, CopyRemainder>,
) -> Vec<AxisRole> {
    axes.iter()
        .map(|&edge| {
            if standard_shared.contains(&edge) {
                return AxisRole::Shared {
                    group: LabelGroup::Edge(edge),
                    expose: false,
                };
            }
            let e = network.edge(edge).expect("build_roles: dangling axis edge missing");
            let copy = shared_copies.iter().find(|&&c| e.touches(c));
            match copy {
                Some(&c) => AxisRole::Shared {
                    group: LabelGroup::Copy(c),
                    expose: copy_info[&c].expose(),
                },
                None => AxisRole::Survive,
            }
        })
        .collect()
}

/// Collapses every rank-2 copy node shared between `n1` and `n2` into a
/// direct edge between their partners (spec.md §4.3 step 1). A rank-2
/// copy-of-ones is the identity matrix; it contributes nothing beyond
/// reconnecting the two edges it bridges.
fn trivialize_two_edge_copies<B: Backend>(network: &mut Network<B>, n1: NodeId, n2: NodeId) -> Result<(), ContractError> {
    let candidates: Vec<NodeId> = network
        .copy_neighbors(n1)
        .intersection(&network.copy_neighbors(n2))
        .copied()
        .filter(|&c| network.node(c).map(|e| e.rank() == 2).unwrap_or(false))
        .collect();

    for c in candidates {
        let entry = network.node(c).expect("trivialize: copy node vanished");
        let edges = entry.edges().to_vec();
        let (e_n1, e_n2) = match (network.edge(edges[0]).unwrap().touches(n1), network.edge(edges[1]).unwrap().touches(n1)) {
            (true, false) => (edges[0], edges[1]),
            (false, true) => (edges[1], edges[0]),
            _ => {
                return Err(ContractError::InvalidCopyNode { count: entry.rank() });
            }
        };

        let (on_c_1, partner1) = network.disconnect(e_n1, c);
        let (on_c_2, partner2) = network.disconnect(e_n2, c);
        network.edges.remove(on_c_1);
        network.edges.remove(on_c_2);
        network.connect(partner1, partner2)?;
        network.retire_node(c);
    }
    Ok(())
}
