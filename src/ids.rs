//! Stable identifiers for the network arena.
//!
//! A `Network` owns all node and edge records in two `slotmap::SlotMap`s.
//! Ids are generational: once a node or edge is removed, its id's
//! generation is retired and the same slot, if reused, gets a new id that
//! compares unequal to the old one. That gives us spec.md §3 invariant 4
//! ("a disabled node is never referenced by any live edge") almost for
//! free: a stale id simply fails to resolve.

use slotmap::new_key_type;

new_key_type! {
    /// Identifies a live or disabled `Node` or `CopyNode` in a `Network`.
    pub struct NodeId;

    /// Identifies a live `Edge` in a `Network`.
    pub struct EdgeId;
}
