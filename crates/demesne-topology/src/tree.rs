//! Tree builder
//!
//! Converts the flat header mapping into a nested containment tree,
//! using ancestry strings as the authoritative path encoding. The
//! builder is deliberately lenient toward partial data:
//!
//! - A header with no ancestry is a standalone root; nothing links
//!   under it by position.
//! - Walking a header's ancestry left to right, a segment with no node
//!   at the current level is resolved against the input as a whole: if
//!   some input header carries that id (the id lives elsewhere in the
//!   forest) the branch is inconsistent and is silently dropped; if no
//!   input header carries it at all, a minimal ghost placeholder node is
//!   fabricated and the walk continues.
//!
//! Input order matters: a child placed before its parent's node exists
//! would be dropped. Callers feed [`treeify`] through
//! [`headers_by_ancestry`], which guarantees parents first.

use demesne_core::{headers_by_ancestry, EntityKind, HeaderMap, PermanentHeader, PermanentId};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// A level of the containment tree, keyed by [`PermanentId`].
pub type Tree = BTreeMap<PermanentId, TreeNode>;

/// Transient tree node: a header (absent for ghost placeholders, which
/// carry nothing but their key) plus nested children. Built per query,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TreeNode {
    #[serde(flatten)]
    pub header: Option<PermanentHeader>,
    #[serde(skip_serializing_if = "Tree::is_empty")]
    pub children: Tree,
}

impl TreeNode {
    fn ghost() -> Self {
        Self::default()
    }

    pub fn is_ghost(&self) -> bool {
        self.header.is_none()
    }

    pub fn kind(&self) -> Option<EntityKind> {
        self.header.as_ref().map(|h| h.kind)
    }
}

/// Build a containment tree from an ordered sequence of headers.
///
/// Only top-level entities appear as top mapping keys; every descendant
/// nests under `children`. Ancestry parsing never errors on missing
/// entries (see the module docs for the ghost/drop rules).
pub fn treeify<'a, I>(headers: I) -> Tree
where
    I: IntoIterator<Item = &'a PermanentHeader>,
{
    let headers: Vec<&PermanentHeader> = headers.into_iter().collect();
    let known_ids: HashSet<&str> = headers.iter().map(|h| h.permanent_id.as_str()).collect();

    let mut tree = Tree::new();
    for header in &headers {
        insert_header(&mut tree, header, &known_ids);
    }
    tree
}

fn insert_header(tree: &mut Tree, header: &PermanentHeader, known_ids: &HashSet<&str>) {
    let segments = header.ancestry_segments();
    let (last, ancestors) = match segments.split_last() {
        Some(split) => split,
        None => return,
    };

    let mut level = tree;
    for segment in ancestors {
        if !level.contains_key(*segment) && known_ids.contains(*segment) {
            // The ancestor exists somewhere else in the forest; this
            // branch is inconsistent and silently dropped.
            tracing::debug!(
                permanent_id = %header.permanent_id,
                ancestor = %segment,
                "dropping branch whose ancestor lives elsewhere in the tree"
            );
            return;
        }
        level = &mut level
            .entry((*segment).to_string())
            .or_insert_with(TreeNode::ghost)
            .children;
    }

    let node = level.entry((*last).to_string()).or_default();
    node.header = Some((*header).clone());
}

/// The full containment tree of a mapping, parents-first ordered.
pub fn full_tree(mapping: &HeaderMap) -> Tree {
    treeify(headers_by_ancestry(mapping))
}

/// The containment tree filtered to Neighborhood nodes.
///
/// Pruning is structural: a Room node disappears together with its
/// whole subtree, so a Neighborhood nested under a pruned Room lineage
/// is unreachable and correctly disappears too. Ghost placeholders have
/// no type and are pruned as well.
pub fn neighborhood_only_tree(mapping: &HeaderMap) -> Tree {
    retain_neighborhoods(&full_tree(mapping))
}

pub(crate) fn retain_neighborhoods(tree: &Tree) -> Tree {
    tree.iter()
        .filter(|(_, node)| node.kind() == Some(EntityKind::Neighborhood))
        .map(|(id, node)| {
            (
                id.clone(),
                TreeNode {
                    header: node.header.clone(),
                    children: retain_neighborhoods(&node.children),
                },
            )
        })
        .collect()
}
