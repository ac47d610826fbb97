//! Edit gating for the world topology
//!
//! An edit request flows through two stages, both pure over snapshots:
//!
//! 1. `simulate` builds a complete *predicted* header mapping for the
//!    proposed change by replaying the ancestry engine and the
//!    cross-reference (Exit/Entry) updates over a cloned mapping. The
//!    live store is never touched.
//! 2. `validate` consults the acting character's [`GrantSet`] and the
//!    boundary-path analysis of the predicted mapping, returning a
//!    [`Verdict`]. Only a `valid` verdict entitles the caller to commit
//!    the predicted mapping to the [`HeaderStore`].
//!
//! [`GrantSet`]: demesne_core::GrantSet
//! [`HeaderStore`]: demesne_core::HeaderStore

pub mod simulate;
pub mod validate;

pub use simulate::{predict_reparent, predict_room_edit, NeighborhoodChange};
pub use validate::{
    validate_neighborhood_update, validate_room_update, NeighborhoodUpdate, RoomUpdate, Verdict,
};
