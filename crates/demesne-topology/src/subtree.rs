//! Subtree extraction
//!
//! Partitions the containment tree relative to one entity's lineage.
//! Given a room and its ancestry path, the world splits into the branch
//! the room lives in ([`neighborhood_subtree`]) and everything else
//! ([`external_tree`]); the two key sets are disjoint and together cover
//! every node except the room itself.
//!
//! All functions here filter the flat header list first and then
//! treeify, so the ghost/drop leniency of the tree builder applies
//! unchanged to the partial views.

use crate::tree::{retain_neighborhoods, treeify, Tree};
use demesne_core::{at_or_under, headers_by_ancestry, HeaderMap};

/// The ancestry path of an entity's container: everything up to the
/// last segment, or the empty path for a root-level entity.
fn parent_path(ancestry: &str) -> &str {
    ancestry.rsplit_once(':').map(|(head, _)| head).unwrap_or("")
}

/// The tree restricted to the lineage the room lives in: every header
/// at-or-under the room's containing path, minus the room itself.
///
/// For a root-level room the containing path is empty, so this is the
/// entire tree with only the room removed.
pub fn neighborhood_subtree(mapping: &HeaderMap, room_id: &str, ancestry: &str) -> Tree {
    let scope = parent_path(ancestry);
    treeify(
        headers_by_ancestry(mapping)
            .into_iter()
            .filter(|h| h.permanent_id != room_id)
            .filter(|h| at_or_under(h.effective_ancestry(), scope)),
    )
}

/// The complement of [`neighborhood_subtree`]: every header outside the
/// room's containing path.
///
/// The room id plays no part in the filter here; the room sits inside
/// its own containing path, so it can never appear in the complement.
/// The parameter is kept so the two partition halves read the same at
/// call sites.
///
/// A root-level room has an empty containing path, under which
/// everything lives, so nothing is external and the result is empty.
pub fn external_tree(mapping: &HeaderMap, _room_id: &str, ancestry: &str) -> Tree {
    let scope = parent_path(ancestry);
    treeify(
        headers_by_ancestry(mapping)
            .into_iter()
            .filter(|h| !at_or_under(h.effective_ancestry(), scope)),
    )
}

/// The Neighborhood-only tree with the node at exactly `ancestry`
/// removed. Ancestors keep their other children; the excluded node's
/// descendants drop with it.
pub fn neighborhood_only_tree_excluding_subtree(mapping: &HeaderMap, ancestry: &str) -> Tree {
    retain_neighborhoods(&treeify(
        headers_by_ancestry(mapping)
            .into_iter()
            .filter(|h| !at_or_under(h.effective_ancestry(), ancestry)),
    ))
}
