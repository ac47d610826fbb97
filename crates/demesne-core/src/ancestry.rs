//! Ancestry engine
//!
//! `Ancestry` is a denormalized cache: the colon-delimited id path from a
//! root entity down to the entity itself. The invariant is
//! `ancestry == parent.ancestry + ":" + id` whenever the parent is
//! present in the mapping, and `ancestry == id` otherwise.
//!
//! Computation never trusts a cached parent ancestry: it walks the
//! `ParentId` chain against the mapping directly. That makes
//! [`recompute_all`] a single pass with no topological-order bookkeeping,
//! and it makes a hypothetical reparent trivial to evaluate: overlay the
//! new `ParentId` on a cloned mapping and recompute.

use crate::{HeaderMap, PermanentHeader};
use std::collections::HashSet;

/// Separator between ids in an ancestry path.
pub const ANCESTRY_SEPARATOR: char = ':';

/// Compute the ancestry path for one header against a mapping.
///
/// A missing parent makes the entity a root (this models "ghost" parents
/// from partially loaded data without failing). A parent cycle is broken
/// at the first revisited id, which likewise becomes the root of the
/// path; the live store never contains cycles, but a proposed reparent
/// under an entity's own descendant must still terminate.
pub fn compute_ancestry(header: &PermanentHeader, mapping: &HeaderMap) -> String {
    let mut ids: Vec<&str> = vec![&header.permanent_id];
    let mut seen: HashSet<&str> = HashSet::new();
    seen.insert(&header.permanent_id);

    let mut parent_id = header.parent_id.as_deref();
    while let Some(pid) = parent_id {
        if !seen.insert(pid) {
            tracing::warn!(
                permanent_id = %header.permanent_id,
                revisited = %pid,
                "parent cycle while computing ancestry; breaking at first revisited id"
            );
            break;
        }
        let Some(parent) = mapping.get(pid) else {
            // Ghost parent: the chain roots here.
            tracing::debug!(
                permanent_id = %header.permanent_id,
                missing_parent = %pid,
                "parent absent from mapping; treating entity chain as rooted"
            );
            break;
        };
        ids.push(&parent.permanent_id);
        parent_id = parent.parent_id.as_deref();
    }

    ids.reverse();
    ids.join(&ANCESTRY_SEPARATOR.to_string())
}

/// Recompute the ancestry of every entity in a mapping, returning the
/// refreshed mapping. The input is never mutated.
pub fn recompute_all(mapping: &HeaderMap) -> HeaderMap {
    mapping
        .values()
        .map(|header| {
            let mut header = header.clone();
            header.ancestry = compute_ancestry(&header, mapping);
            (header.permanent_id.clone(), header)
        })
        .collect()
}

/// Whether `ancestry` names `prefix` itself or a path strictly below it.
///
/// Matches on whole segments: `"ABCD"` is not under `"ABC"`. An empty
/// prefix is the implicit world root, under which everything lives.
pub fn at_or_under(ancestry: &str, prefix: &str) -> bool {
    if prefix.is_empty() {
        return true;
    }
    match ancestry.strip_prefix(prefix) {
        Some("") => true,
        Some(rest) => rest.starts_with(ANCESTRY_SEPARATOR),
        None => false,
    }
}
