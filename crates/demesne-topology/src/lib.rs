//! Derived views over the flat header mapping
//!
//! Nothing in this crate mutates a mapping. Each function takes a
//! snapshot (live or predicted), derives a transient structure, and
//! returns it for the caller to consume and discard:
//!
//! - `tree`: nested containment trees built from ancestry paths
//!   ([`treeify`], [`full_tree`], [`neighborhood_only_tree`]).
//! - `subtree`: lineage-relative partitions of the tree
//!   ([`neighborhood_subtree`], [`external_tree`],
//!   [`neighborhood_only_tree_excluding_subtree`]).
//! - `paths`: room enumeration and boundary-crossing Exit/Entry
//!   analysis ([`room_ids_in_neighborhood`], [`neighborhood_paths`]).

pub mod paths;
pub mod subtree;
pub mod tree;

pub use paths::{neighborhood_paths, room_ids_in_neighborhood, BoundaryEdge, NeighborhoodPaths};
pub use subtree::{
    external_tree, neighborhood_only_tree_excluding_subtree, neighborhood_subtree,
};
pub use tree::{full_tree, neighborhood_only_tree, treeify, Tree, TreeNode};
