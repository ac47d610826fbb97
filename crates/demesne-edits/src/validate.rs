//! Grant validator
//!
//! Accepts or rejects a proposed edit against the acting character's
//! grants and the topology invariants, evaluated over the *predicted*
//! mapping the simulator produces. Rules are checked in a fixed order
//! and the first failure wins; every outcome is a [`Verdict`], never an
//! `Err`, since validation has no transient failures.

use crate::simulate::{predict_reparent, predict_room_edit, NeighborhoodChange};
use demesne_core::{GrantSet, HeaderMap, PathEdge, PermanentId, Topology, Visibility};
use demesne_topology::neighborhood_paths;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ============================================================================
// Requests and verdicts
// ============================================================================

/// Structured validity verdict. `error` carries the human-readable
/// reason for the first rule that failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Verdict {
    pub fn valid() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    pub fn invalid(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: Some(error.into()),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

/// Proposed Neighborhood edit. `None` fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NeighborhoodUpdate {
    pub permanent_id: PermanentId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<PermanentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topology: Option<Topology>,
}

/// Proposed Room edit. `None` connectivity keeps the current edges;
/// supplied connectivity replaces them wholesale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RoomUpdate {
    pub permanent_id: PermanentId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<PermanentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exits: Option<Vec<PathEdge>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entries: Option<Vec<PathEdge>>,
}

// ============================================================================
// Shared checks
// ============================================================================

fn scope_name<'m>(mapping: &'m HeaderMap, scope: &'m str) -> &'m str {
    mapping
        .get(scope)
        .map(|h| h.display_name())
        .unwrap_or("root")
}

/// Names of Dead-End neighborhoods on `branch_ancestry` whose boundary
/// touches two or more distinct external rooms under `mapping`, in path
/// order. A Connected neighborhood is never inconsistent.
fn branch_inconsistencies(mapping: &HeaderMap, branch_ancestry: &str) -> Vec<String> {
    branch_ancestry
        .split(':')
        .filter_map(|id| mapping.get(id))
        .filter(|h| h.is_neighborhood())
        .filter(|h| {
            h.topology != Topology::Connected
                && neighborhood_paths(mapping, &h.permanent_id).distinct_touched_rooms() >= 2
        })
        .map(|h| h.display_name().to_string())
        .collect()
}

/// Re-check the Dead-End invariant for every neighborhood on the
/// ancestry of each room in `touched`, under the predicted mapping.
/// Returns the first violated neighborhood's name.
fn first_touched_violation(predicted: &HeaderMap, touched: &[PermanentId]) -> Option<String> {
    touched
        .iter()
        .filter_map(|room_id| predicted.get(room_id))
        .map(|room| branch_inconsistencies(predicted, room.effective_ancestry()))
        .find_map(|violations| violations.into_iter().next())
}

fn unique_edge_rooms(exits: &[PathEdge], entries: &[PathEdge]) -> Vec<PermanentId> {
    let mut seen = HashSet::new();
    exits
        .iter()
        .chain(entries.iter())
        .filter(|edge| seen.insert(edge.room_id.as_str()))
        .map(|edge| edge.room_id.clone())
        .collect()
}

// ============================================================================
// Neighborhood updates
// ============================================================================

/// Validate a proposed Neighborhood edit against `grants` and the
/// topology invariants.
///
/// Rule order (first failure wins):
///
/// 1. changing Topology or Visibility needs `Moderate` in the effective
///    parent scope or `Edit` on the neighborhood itself;
/// 2. Topology=Connected needs `ExtendConnected` in the parent scope;
/// 3. Topology=Dead-End needs the single-doorway invariant to already
///    hold in each direction;
/// 4. Visibility=Public needs `ExtendPublic` in the parent scope;
/// 5. reparenting needs `Moderate` on the neighborhood itself;
/// 6. after a reparent, the Dead-End invariant is re-checked under the
///    predicted mapping for the new ancestry path and for every
///    third-party neighborhood reachable through the moved rooms'
///    boundary paths.
pub fn validate_neighborhood_update(
    mapping: &HeaderMap,
    grants: &GrantSet,
    update: &NeighborhoodUpdate,
) -> Verdict {
    let Some(current) = mapping.get(&update.permanent_id) else {
        return Verdict::invalid(format!("Unknown neighborhood {}", update.permanent_id));
    };

    let parent_scope: &str = update
        .parent_id
        .as_deref()
        .or(current.parent_id.as_deref())
        .unwrap_or(GrantSet::ROOT);

    let topology_changed = update.topology.map_or(false, |t| t != current.topology);
    let visibility_changed = update.visibility.map_or(false, |v| v != current.visibility);

    if (topology_changed || visibility_changed)
        && !(grants.get(parent_scope).moderate || grants.get(&update.permanent_id).edit)
    {
        return Verdict::invalid(format!(
            "You do not have permission to moderate neighborhood {}",
            current.display_name()
        ));
    }

    if topology_changed {
        if update.topology == Some(Topology::Connected) && !grants.get(parent_scope).extend_connected {
            return Verdict::invalid(format!(
                "You do not have permission to make a connected neighborhood within {}",
                scope_name(mapping, parent_scope)
            ));
        }
        if update.topology == Some(Topology::DeadEnd) {
            let paths = neighborhood_paths(mapping, &update.permanent_id);
            if paths.distinct_exit_rooms() > 1 {
                return Verdict::invalid(
                    "You may not set a neighborhood Dead-End when it has external exits to multiple rooms",
                );
            }
            if paths.distinct_entry_rooms() > 1 {
                return Verdict::invalid(
                    "You may not set a neighborhood Dead-End when it has external entries from multiple rooms",
                );
            }
        }
    }

    if visibility_changed
        && update.visibility == Some(Visibility::Public)
        && !grants.get(parent_scope).extend_public
    {
        return Verdict::invalid(format!(
            "You do not have permission to make a public neighborhood within {}",
            scope_name(mapping, parent_scope)
        ));
    }

    let reparenting = update
        .parent_id
        .as_ref()
        .map_or(false, |p| Some(p) != current.parent_id.as_ref());
    if reparenting {
        if !grants.get(&update.permanent_id).moderate {
            return Verdict::invalid(format!(
                "You do not have permission to reparent {}",
                current.display_name()
            ));
        }

        let change = NeighborhoodChange {
            parent_id: update.parent_id.clone(),
            visibility: update.visibility,
            topology: update.topology,
            ..Default::default()
        };
        let predicted = predict_reparent(mapping, &update.permanent_id, &change);
        let new_ancestry = predicted
            .get(&update.permanent_id)
            .map(|h| h.effective_ancestry().to_string())
            .unwrap_or_default();

        // The lineage being reparented INTO.
        if let Some(name) = branch_inconsistencies(&predicted, &new_ancestry).into_iter().next() {
            return Verdict::invalid(format!(
                "Reparenting this way would make too many external paths on {name}"
            ));
        }

        // Third parties: neighborhoods whose rooms this subtree is now
        // connected to may have had paths move between local and
        // external.
        let touched = neighborhood_paths(&predicted, &update.permanent_id).touched_room_ids();
        if let Some(name) = first_touched_violation(&predicted, &touched) {
            return Verdict::invalid(format!(
                "Reparenting this way would make too many external paths on {name}"
            ));
        }
    }

    Verdict::valid()
}

// ============================================================================
// Room updates
// ============================================================================

/// Validate a proposed Room edit (reparent and/or connectivity
/// replacement) against `grants` and the topology invariants.
///
/// Reparenting a room needs `Edit` in both the old and the new parent
/// scope. The Dead-End invariant is then re-checked under the predicted
/// mapping for the room's (possibly new) containing lineage and for
/// every neighborhood reachable through the proposed edges.
pub fn validate_room_update(mapping: &HeaderMap, grants: &GrantSet, update: &RoomUpdate) -> Verdict {
    let Some(current) = mapping.get(&update.permanent_id) else {
        return Verdict::invalid(format!("Unknown room {}", update.permanent_id));
    };

    let exits = update.exits.as_deref().unwrap_or(&current.exits);
    let entries = update.entries.as_deref().unwrap_or(&current.entries);
    let effective_parent = update.parent_id.as_deref().or(current.parent_id.as_deref());

    let predicted = predict_room_edit(mapping, &update.permanent_id, effective_parent, exits, entries);

    let reparenting = update
        .parent_id
        .as_ref()
        .map_or(false, |p| Some(p) != current.parent_id.as_ref());
    if reparenting {
        if !grants.in_scope_of(current.parent_id.as_deref()).edit {
            return Verdict::invalid(format!(
                "You do not have permission to reparent {}",
                current.display_name()
            ));
        }
        if !grants.in_scope_of(update.parent_id.as_deref()).edit {
            let new_scope = update.parent_id.as_deref().unwrap_or(GrantSet::ROOT);
            return Verdict::invalid(format!(
                "You do not have permission to reparent rooms to {}",
                scope_name(mapping, new_scope)
            ));
        }
    }

    // The lineage the room ends up IN.
    let new_ancestry = effective_parent
        .and_then(|p| mapping.get(p))
        .map(|p| p.effective_ancestry().to_string())
        .unwrap_or_default();
    if let Some(name) = branch_inconsistencies(&predicted, &new_ancestry).into_iter().next() {
        return Verdict::invalid(format!(
            "Editing this way would make too many external paths on {name}"
        ));
    }

    // Third parties: every neighborhood reachable through the proposed
    // connectivity.
    let touched = unique_edge_rooms(exits, entries);
    if let Some(name) = first_touched_violation(&predicted, &touched) {
        return Verdict::invalid(format!(
            "Editing this way would make too many external paths on {name}"
        ));
    }

    Verdict::valid()
}
