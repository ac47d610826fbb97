//! Boundary-crossing path analysis
//!
//! Walks every room inside a neighborhood's subtree and reports each
//! Exit/Entry whose far endpoint lies outside it. The edge lists are
//! deliberately not deduplicated; the Dead-End invariant counts
//! *distinct far rooms* (multiple internal rooms using the same
//! external doorway count once), and those counts are exposed as
//! methods on [`NeighborhoodPaths`].

use demesne_core::{at_or_under, headers_by_ancestry, HeaderMap, PermanentId};
use serde::Serialize;
use std::collections::HashSet;

/// A boundary-crossing edge: `origin_id` lies inside the neighborhood,
/// `room_id` outside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoundaryEdge {
    #[serde(rename = "OriginId")]
    pub origin_id: PermanentId,
    #[serde(rename = "RoomId")]
    pub room_id: PermanentId,
    #[serde(rename = "Name")]
    pub name: String,
}

/// Every Exit/Entry of a neighborhood's rooms that crosses the
/// neighborhood boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NeighborhoodPaths {
    #[serde(rename = "Exits")]
    pub exits: Vec<BoundaryEdge>,
    #[serde(rename = "Entries")]
    pub entries: Vec<BoundaryEdge>,
}

impl NeighborhoodPaths {
    /// Distinct external destination rooms among boundary exits.
    pub fn distinct_exit_rooms(&self) -> usize {
        distinct_rooms(&self.exits)
    }

    /// Distinct external origin rooms among boundary entries.
    pub fn distinct_entry_rooms(&self) -> usize {
        distinct_rooms(&self.entries)
    }

    /// Distinct external rooms touched in either direction. This is the
    /// count the transitive Dead-End re-check uses: a consistent
    /// Dead-End neighborhood touches fewer than two.
    pub fn distinct_touched_rooms(&self) -> usize {
        self.touched_room_ids().len()
    }

    /// The distinct external rooms touched in either direction, in
    /// first-seen order.
    pub fn touched_room_ids(&self) -> Vec<PermanentId> {
        let mut seen = HashSet::new();
        self.exits
            .iter()
            .chain(self.entries.iter())
            .filter(|edge| seen.insert(edge.room_id.as_str()))
            .map(|edge| edge.room_id.clone())
            .collect()
    }
}

fn distinct_rooms(edges: &[BoundaryEdge]) -> usize {
    edges
        .iter()
        .map(|edge| edge.room_id.as_str())
        .collect::<HashSet<_>>()
        .len()
}

/// Ids of Room entities whose ancestry sits at-or-under the named
/// neighborhood's ancestry, in ancestry order. With no filter, every
/// room in the mapping.
///
/// An unknown neighborhood id scopes to itself, which matches no rooms.
pub fn room_ids_in_neighborhood(mapping: &HeaderMap, neighborhood_id: Option<&str>) -> Vec<PermanentId> {
    let scope: Option<String> = neighborhood_id.map(|id| {
        mapping
            .get(id)
            .map(|h| h.effective_ancestry().to_string())
            .unwrap_or_else(|| id.to_string())
    });

    headers_by_ancestry(mapping)
        .into_iter()
        .filter(|h| h.is_room())
        .filter(|h| {
            scope
                .as_deref()
                .map_or(true, |scope| at_or_under(h.effective_ancestry(), scope))
        })
        .map(|h| h.permanent_id.clone())
        .collect()
}

/// All boundary-crossing Exits and Entries of a neighborhood.
///
/// Exits and Entries naming rooms that are not in the mapping count as
/// external: an edge to an unloaded room still leaves the subtree.
pub fn neighborhood_paths(mapping: &HeaderMap, neighborhood_id: &str) -> NeighborhoodPaths {
    let member_ids = room_ids_in_neighborhood(mapping, Some(neighborhood_id));
    let members: HashSet<&str> = member_ids.iter().map(String::as_str).collect();

    let mut paths = NeighborhoodPaths::default();
    for room_id in &member_ids {
        let Some(room) = mapping.get(room_id) else {
            continue;
        };
        for exit in &room.exits {
            if !members.contains(exit.room_id.as_str()) {
                paths.exits.push(BoundaryEdge {
                    origin_id: room_id.clone(),
                    room_id: exit.room_id.clone(),
                    name: exit.name.clone(),
                });
            }
        }
        for entry in &room.entries {
            if !members.contains(entry.room_id.as_str()) {
                paths.entries.push(BoundaryEdge {
                    origin_id: room_id.clone(),
                    room_id: entry.room_id.clone(),
                    name: entry.name.clone(),
                });
            }
        }
    }
    paths
}
