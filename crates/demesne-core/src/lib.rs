//! Demesne core data model
//!
//! The ground truth of a world is a flat mapping from [`PermanentId`] to
//! [`PermanentHeader`]. Two structures are layered over that mapping:
//!
//! - a containment tree (Neighborhoods holding Rooms and other
//!   Neighborhoods), encoded per-entity as a denormalized colon-delimited
//!   `Ancestry` path, and
//! - a directed graph of named Exits/Entries between Rooms, denormalized
//!   on both endpoints.
//!
//! This crate owns the header and grant types, the [`HeaderStore`] that
//! holds the live mapping, and the ancestry engine (`ancestry` module)
//! that recomputes the denormalized paths from `ParentId` chains.
//!
//! Everything here is a pure computation over an in-memory snapshot.
//! Referential gaps (a `ParentId` naming an entity that is not in the
//! mapping, an exit to an unknown room) are tolerated by treating the
//! reference as absent rather than failing, so partially loaded worlds
//! still produce usable results.

pub mod ancestry;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use ancestry::{at_or_under, compute_ancestry, recompute_all};

/// Stable unique identifier for a Room or Neighborhood.
pub type PermanentId = String;

/// The flat header mapping: the only mutable ground truth of a world.
pub type HeaderMap = HashMap<PermanentId, PermanentHeader>;

// ============================================================================
// Permanent entities
// ============================================================================

/// Entity type. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    #[serde(rename = "NEIGHBORHOOD")]
    Neighborhood,
    #[serde(rename = "ROOM")]
    Room,
}

/// Discoverability policy for a Neighborhood, gated by grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Visibility {
    Public,
    #[default]
    Private,
}

/// Connectivity policy for a Neighborhood.
///
/// A `Dead-End` neighborhood touches the rest of the world through a
/// single doorway in each direction: at most one distinct external
/// destination room among its boundary-crossing exits, and at most one
/// distinct external origin room among its boundary-crossing entries.
/// The doorway may be used by any number of internal rooms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Topology {
    Connected,
    #[serde(rename = "Dead-End")]
    #[default]
    DeadEnd,
}

/// A directed edge endpoint on a Room: an Exit to (or Entry from)
/// another room, with a display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathEdge {
    #[serde(rename = "RoomId")]
    pub room_id: PermanentId,
    #[serde(rename = "Name", default)]
    pub name: String,
}

impl PathEdge {
    pub fn new(room_id: impl Into<PermanentId>, name: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            name: name.into(),
        }
    }
}

/// One permanent entity (Neighborhood or Room) in the flat mapping.
///
/// Field names on the wire match the snapshot format the world services
/// exchange (`PermanentId`, `Type`, `ParentId`, ...). Missing fields
/// default the way the original loader defaulted them: `Private`
/// visibility, `Dead-End` topology, no parent, no edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PermanentHeader {
    pub permanent_id: PermanentId,
    #[serde(rename = "Type")]
    pub kind: EntityKind,
    /// Containing Neighborhood; `None` for top-level entities.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<PermanentId>,
    /// Colon-delimited path of ids from a root down to and including this
    /// entity. Derived cache; recomputed by the ancestry engine, never
    /// hand-edited.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ancestry: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Neighborhood only.
    #[serde(default)]
    pub visibility: Visibility,
    /// Neighborhood only.
    #[serde(default)]
    pub topology: Topology,
    /// Room only: directed edges to other rooms.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exits: Vec<PathEdge>,
    /// Room only: directed edges from other rooms. An Exit from A to B
    /// implies a matching Entry on B from A; the edit simulator keeps
    /// both sides consistent.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<PathEdge>,
}

impl PermanentHeader {
    pub fn new(permanent_id: impl Into<PermanentId>, kind: EntityKind) -> Self {
        Self {
            permanent_id: permanent_id.into(),
            kind,
            parent_id: None,
            ancestry: String::new(),
            name: String::new(),
            description: String::new(),
            visibility: Visibility::default(),
            topology: Topology::default(),
            exits: Vec::new(),
            entries: Vec::new(),
        }
    }

    pub fn is_room(&self) -> bool {
        self.kind == EntityKind::Room
    }

    pub fn is_neighborhood(&self) -> bool {
        self.kind == EntityKind::Neighborhood
    }

    /// The ancestry path, falling back to the entity's own id when the
    /// denormalized field was never populated.
    pub fn effective_ancestry(&self) -> &str {
        if self.ancestry.is_empty() {
            &self.permanent_id
        } else {
            &self.ancestry
        }
    }

    /// Ordered ancestry segments, root first, self last.
    pub fn ancestry_segments(&self) -> Vec<&str> {
        self.effective_ancestry().split(':').collect()
    }

    /// Display name for verdicts and rendering; the id stands in when no
    /// name was set.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.permanent_id
        } else {
            &self.name
        }
    }
}

/// Headers of a mapping ordered by ancestry path (ties broken by id).
///
/// Because a parent's path is a strict prefix of its children's paths,
/// this order always yields parents before children, which is what the
/// tree builder requires of its input. It is also the room enumeration
/// order the selectors expose.
pub fn headers_by_ancestry(mapping: &HeaderMap) -> Vec<&PermanentHeader> {
    let mut headers: Vec<&PermanentHeader> = mapping.values().collect();
    headers.sort_by(|a, b| {
        a.effective_ancestry()
            .cmp(b.effective_ancestry())
            .then_with(|| a.permanent_id.cmp(&b.permanent_id))
    });
    headers
}

// ============================================================================
// Grants
// ============================================================================

/// Per-entity capability flags for one acting character.
///
/// Absent flags are `false`; an absent record means no capabilities at
/// all. Lookups never fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Capabilities {
    pub edit: bool,
    pub moderate: bool,
    pub extend_private: bool,
    pub extend_public: bool,
    pub extend_connected: bool,
}

impl Capabilities {
    pub fn all() -> Self {
        Self {
            edit: true,
            moderate: true,
            extend_private: true,
            extend_public: true,
            extend_connected: true,
        }
    }
}

/// Capability grants for one acting character, keyed by [`PermanentId`]
/// (or [`GrantSet::ROOT`] for top-level scope).
///
/// Read-only input to validation; supplied by the caller alongside the
/// header snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GrantSet(HashMap<PermanentId, Capabilities>);

impl GrantSet {
    /// Scope key for entities with no containing neighborhood.
    pub const ROOT: &'static str = "ROOT";

    pub fn new() -> Self {
        Self::default()
    }

    /// Capabilities for an entity, all-false when no record exists.
    pub fn get(&self, permanent_id: &str) -> Capabilities {
        self.0.get(permanent_id).copied().unwrap_or_default()
    }

    /// Capabilities in the scope of `parent_id`, resolving `None` to the
    /// `ROOT` scope.
    pub fn in_scope_of(&self, parent_id: Option<&str>) -> Capabilities {
        self.get(parent_id.unwrap_or(Self::ROOT))
    }

    pub fn grant(&mut self, permanent_id: impl Into<PermanentId>, capabilities: Capabilities) {
        self.0.insert(permanent_id.into(), capabilities);
    }
}

// ============================================================================
// Header store
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unknown permanent id {0}")]
    UnknownId(PermanentId),
}

/// Holder of the live header mapping.
///
/// The mapping is only ever replaced wholesale: a validated edit commits
/// a complete predicted mapping, so readers never observe a
/// partially-updated world. The epoch counts commits so consumers can
/// tell snapshots apart.
#[derive(Debug, Clone, Default)]
pub struct HeaderStore {
    headers: HeaderMap,
    epoch: u64,
}

impl HeaderStore {
    pub fn new(headers: HeaderMap) -> Self {
        Self { headers, epoch: 0 }
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn get(&self, permanent_id: &str) -> Option<&PermanentHeader> {
        self.headers.get(permanent_id)
    }

    pub fn require(&self, permanent_id: &str) -> Result<&PermanentHeader, StoreError> {
        self.headers
            .get(permanent_id)
            .ok_or_else(|| StoreError::UnknownId(permanent_id.to_string()))
    }

    /// Cloned snapshot for simulation or hand-off to collaborators.
    pub fn snapshot(&self) -> HeaderMap {
        self.headers.clone()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Replace the whole mapping atomically. Returns the new epoch.
    pub fn commit(&mut self, headers: HeaderMap) -> u64 {
        self.headers = headers;
        self.epoch += 1;
        tracing::debug!(epoch = self.epoch, entities = self.headers.len(), "committed header mapping");
        self.epoch
    }
}
