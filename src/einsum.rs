//! Einsum expression builder (spec.md §4.2).
//!
//! Turns a pair-merge's axis bookkeeping into a flat `"left,right->out"`
//! string plus an ordered description of where each `out` position came
//! from. This module knows nothing about `Network`, `Node`, or copy
//! nodes, it is pure label assignment over caller-classified axes, which
//! keeps it reusable by both the plain contractor (§4.2) and the
//! copy-aware one (§4.3, which extends the same label pool with
//! coalesced copy-node groups).

use ahash::AHashMap;

use crate::error::ContractError;
use crate::ids::{EdgeId, NodeId};

/// The 62-character subscript alphabet the backend's einsum convention is
/// built on (spec.md §4.2, §9 "Label alphabet limit"). This is a property
/// of the external backend contract, not a choice this crate makes.
pub const ALPHABET: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Hands out fresh subscript labels, failing loudly once the alphabet is
/// exhausted rather than silently wrapping around or extending it.
pub struct LabelAllocator {
    chars: Vec<char>,
    next: usize,
}

impl LabelAllocator {
    pub fn new() -> Self {
        LabelAllocator {
            chars: ALPHABET.chars().collect(),
            next: 0,
        }
    }

    pub fn alloc(&mut self) -> Result<char, ContractError> {
        if self.next >= self.chars.len() {
            return Err(ContractError::RankExceedsAlphabet {
                needed: self.next + 1,
                available: self.chars.len(),
            });
        }
        let c = self.chars[self.next];
        self.next += 1;
        Ok(c)
    }
}

impl Default for LabelAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// A group of axes across `n1`/`n2` forced to carry the same subscript
/// label: either a single standard edge shared between the two nodes
/// (always contracted away), or a copy node's coalesced index (may
/// survive to the output (decided by the caller via `AxisRole::expose`).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelGroup {
    Edge(EdgeId),
    Copy(NodeId),
}

/// How one axis of `n1` or `n2` is classified for a pair merge.
#[derive(Clone, Copy)]
pub enum AxisRole {
    /// Becomes its own output position, in original order.
    Survive,
    /// Shares a label with every other axis (on either node) carrying the
    /// same `group`. Never itself becomes an output position; if `group`
    /// is a copy-node group and `expose` is true, the *group as a whole*
    /// gets exactly one output position, appended after all `Survive`
    /// positions (spec.md §4.5 "ordering guarantees").
    Shared { group: LabelGroup, expose: bool },
}

/// Where one character of `out` came from: an original `(side, axis)` of
/// the pair (`side` 0 = `n1`, 1 = `n2`) for a `Survive` position, or an
/// exposed copy-node `group` for a coalesced one.
pub type OutputSource = Result<(u8, usize), LabelGroup>;

pub struct PairPlan {
    pub left: String,
    pub right: String,
    pub out: String,
    pub output_sources: Vec<OutputSource>,
}

/// Builds the `"left,right->out"` plan for one pair merge. `n1_roles`
/// and `n2_roles` must have the partner node's rank each.
pub fn build_pair_expr(n1_roles: &[AxisRole], n2_roles: &[AxisRole]) -> Result<PairPlan, ContractError> {
    let mut alloc = LabelAllocator::new();
    let mut group_labels: AHashMap<LabelGroup, char> = AHashMap::default();
    let mut copy_order: Vec<LabelGroup> = Vec::new();

    let mut left = String::new();
    let mut right = String::new();
    let mut out = String::new();
    let mut output_sources = Vec::new();

    for (axis, role) in n1_roles.iter().enumerate() {
        match role {
            AxisRole::Survive => {
                let c = alloc.alloc()?;
                left.push(c);
                out.push(c);
                output_sources.push(Ok((0u8, axis)));
            }
            AxisRole::Shared { group, expose } => {
                let c = match group_labels.get(group) {
                    Some(&c) => c,
                    None => {
                        let fresh = alloc.alloc()?;
                        group_labels.insert(*group, fresh);
                        if matches!(group, LabelGroup::Copy(_)) && *expose {
                            copy_order.push(*group);
                        }
                        fresh
                    }
                };
                left.push(c);
            }
        }
    }

    for (axis, role) in n2_roles.iter().enumerate() {
        match role {
            AxisRole::Survive => {
                let c = alloc.alloc()?;
                right.push(c);
                out.push(c);
                output_sources.push(Ok((1u8, axis)));
            }
            AxisRole::Shared { group, expose } => {
                let c = match group_labels.get(group) {
                    Some(&c) => c,
                    None => {
                        let fresh = alloc.alloc()?;
                        group_labels.insert(*group, fresh);
                        if matches!(group, LabelGroup::Copy(_)) && *expose {
                            copy_order.push(*group);
                        }
                        fresh
                    }
                };
                right.push(c);
            }
        }
    }

    for group in copy_order {
        out.push(group_labels[&group]);
        output_sources.push(Err(group));
    }

    Ok(PairPlan {
        left,
        right,
        out,
        output_sources,
    })
}

/// Builds the single-operand `"in->out"` expression for tracing every
/// self-loop of one node at once (spec.md §4.5 "single-node pre-pass").
/// Returns the `in` token, the `out` token, and the edges that survive
/// (each appearing exactly once among `axes`), in `out`'s order.
pub fn build_trace_expr(axes: &[EdgeId]) -> Result<(String, String, Vec<EdgeId>), ContractError> {
    let mut counts: AHashMap<EdgeId, usize> = AHashMap::default();
    for &e in axes {
        *counts.entry(e).or_insert(0) += 1;
    }

    let mut alloc = LabelAllocator::new();
    let mut label_for_edge: AHashMap<EdgeId, char> = AHashMap::default();
    let mut token = String::new();
    let mut out = String::new();
    let mut survivors = Vec::new();

    for &e in axes {
        let c = match label_for_edge.get(&e) {
            Some(&c) => c,
            None => {
                let c = alloc.alloc()?;
                label_for_edge.insert(e, c);
                c
            }
        };
        token.push(c);
        if counts[&e] == 1 {
            out.push(c);
            survivors.push(e);
        }
    }
    Ok((token, out, survivors))
}
