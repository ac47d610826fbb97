//! Change simulator
//!
//! Produces a complete predicted header mapping for a proposed edit
//! without mutating the live store. Prediction always works
//! clone-and-replace: the caller commits the whole predicted mapping or
//! discards it, so the world is never observed half-updated.

use demesne_core::{
    compute_ancestry, recompute_all, HeaderMap, PathEdge, PermanentId, Topology, Visibility,
};

/// Field overlay for a proposed Neighborhood edit. `None` keeps the
/// current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NeighborhoodChange {
    pub parent_id: Option<PermanentId>,
    pub visibility: Option<Visibility>,
    pub topology: Option<Topology>,
    pub name: Option<String>,
    pub description: Option<String>,
}

impl NeighborhoodChange {
    pub fn reparent(parent_id: impl Into<PermanentId>) -> Self {
        Self {
            parent_id: Some(parent_id.into()),
            ..Self::default()
        }
    }
}

/// Predicted mapping after overlaying `change` onto one entity.
///
/// Every entity's ancestry is recomputed from the resulting `ParentId`
/// chains, so a reparent ripples through the whole moved subtree. An
/// unknown entity id leaves the mapping unchanged apart from the
/// recompute; the validator rejects such requests before commit.
pub fn predict_reparent(mapping: &HeaderMap, permanent_id: &str, change: &NeighborhoodChange) -> HeaderMap {
    let mut next = mapping.clone();
    match next.get_mut(permanent_id) {
        Some(header) => {
            if let Some(parent_id) = &change.parent_id {
                header.parent_id = Some(parent_id.clone());
            }
            if let Some(visibility) = change.visibility {
                header.visibility = visibility;
            }
            if let Some(topology) = change.topology {
                header.topology = topology;
            }
            if let Some(name) = &change.name {
                header.name = name.clone();
            }
            if let Some(description) = &change.description {
                header.description = description.clone();
            }
        }
        None => {
            tracing::debug!(%permanent_id, "predict_reparent target absent from mapping");
        }
    }
    recompute_all(&next)
}

/// Predicted mapping after wholesale replacement of a room's
/// connectivity (and optionally its parent).
///
/// The room's Exits/Entries are denormalized on both endpoints, so the
/// simulation:
///
/// 1. strips every Exit/Entry referencing the room from every other
///    Room header (the connectivity is being replaced, not merged),
/// 2. appends the reciprocal Entry for each new Exit onto its target
///    (and the reciprocal Exit for each new Entry onto its origin), and
/// 3. rewrites the edited room's own record with its ancestry derived
///    from the effective parent's current ancestry.
///
/// Reciprocals aimed at rooms missing from the mapping are dropped; a
/// record invisible to the room scans would be unreachable anyway.
pub fn predict_room_edit(
    mapping: &HeaderMap,
    room_id: &str,
    parent_id: Option<&str>,
    exits: &[PathEdge],
    entries: &[PathEdge],
) -> HeaderMap {
    let mut next = mapping.clone();

    for header in next.values_mut() {
        if header.is_room() && header.permanent_id != room_id {
            header.exits.retain(|edge| edge.room_id != room_id);
            header.entries.retain(|edge| edge.room_id != room_id);
        }
    }

    for exit in exits {
        match next.get_mut(&exit.room_id) {
            Some(target) => target.entries.push(PathEdge::new(room_id, exit.name.clone())),
            None => {
                tracing::debug!(target = %exit.room_id, "exit target absent; reciprocal entry dropped")
            }
        }
    }
    for entry in entries {
        match next.get_mut(&entry.room_id) {
            Some(origin) => origin.exits.push(PathEdge::new(room_id, entry.name.clone())),
            None => {
                tracing::debug!(origin = %entry.room_id, "entry origin absent; reciprocal exit dropped")
            }
        }
    }

    match next.remove(room_id) {
        Some(mut room) => {
            room.parent_id = parent_id.map(str::to_string);
            room.exits = exits.to_vec();
            room.entries = entries.to_vec();
            // Only this record moved; its ancestry re-derives from the
            // effective parent's current chain.
            room.ancestry = compute_ancestry(&room, mapping);
            next.insert(room.permanent_id.clone(), room);
        }
        None => {
            tracing::debug!(%room_id, "predict_room_edit target absent from mapping");
        }
    }

    next
}
