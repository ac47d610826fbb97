//! Snapshot file handling.
//!
//! The on-disk format is the JSON document the world services exchange:
//! a single object with a `permanentHeaders` mapping. Unknown top-level
//! fields round-trip untouched so a partially understood snapshot is
//! not destroyed by a commit.

use anyhow::{Context, Result};
use demesne_core::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotFile {
    #[serde(rename = "permanentHeaders")]
    pub permanent_headers: HeaderMap,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl SnapshotFile {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_headers_and_unknown_fields() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("world.json");
        fs::write(
            &path,
            serde_json::json!({
                "permanentHeaders": {
                    "ABC": { "PermanentId": "ABC", "Type": "NEIGHBORHOOD", "Ancestry": "ABC" },
                    "BCD": {
                        "PermanentId": "BCD",
                        "Type": "ROOM",
                        "ParentId": "ABC",
                        "Ancestry": "ABC:BCD",
                        "Exits": [{ "RoomId": "CDE", "Name": "east" }]
                    }
                },
                "schemaVersion": 3
            })
            .to_string(),
        )
        .expect("write fixture");

        let snapshot = SnapshotFile::load(&path).expect("load");
        assert_eq!(snapshot.permanent_headers.len(), 2);
        assert!(snapshot.permanent_headers["BCD"].is_room());
        assert_eq!(snapshot.extra["schemaVersion"], serde_json::json!(3));

        snapshot.save(&path).expect("save");
        let again = SnapshotFile::load(&path).expect("reload");
        assert_eq!(again.permanent_headers, snapshot.permanent_headers);
        assert_eq!(again.extra, snapshot.extra);
    }
}
