//! The local ↔ remote identifier correspondence.
//!
//! This table is the single owner of the uid ↔ remote-id mapping. A mapping
//! is created when an event is first pushed and removed when the local event
//! is deleted or the remote copy is confirmed gone; its lifetime is
//! independent of the event's, so it may briefly outlive a deleted event
//! during a delete race.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{HemcalError, HemcalResult};

const MAPPINGS_FILE: &str = "sync_map.json";

/// Correspondence between a local event and its remote copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncMapping {
    pub uid: String,
    pub remote_event_id: String,
    pub remote_calendar_id: String,
}

/// File-backed mapping table, keyed by uid.
pub struct MappingTable {
    path: PathBuf,
    mappings: BTreeMap<String, SyncMapping>,
}

impl MappingTable {
    /// Load the table from `data_dir`. A missing file is an empty table.
    pub fn load(data_dir: &Path) -> HemcalResult<Self> {
        let path = data_dir.join(MAPPINGS_FILE);

        let mappings = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content).map_err(|e| {
                HemcalError::Store(format!("unreadable mapping table {}: {e}", path.display()))
            })?
        } else {
            BTreeMap::new()
        };

        Ok(MappingTable { path, mappings })
    }

    pub fn save(&self) -> HemcalResult<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let content = serde_json::to_string_pretty(&self.mappings)
            .map_err(|e| HemcalError::Serialization(e.to_string()))?;

        let temp = self.path.with_extension("json.tmp");
        std::fs::write(&temp, content)?;
        std::fs::rename(&temp, &self.path)?;
        Ok(())
    }

    pub fn get(&self, uid: &str) -> Option<&SyncMapping> {
        self.mappings.get(uid)
    }

    pub fn insert(&mut self, mapping: SyncMapping) {
        self.mappings.insert(mapping.uid.clone(), mapping);
    }

    pub fn remove(&mut self, uid: &str) -> Option<SyncMapping> {
        self.mappings.remove(uid)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SyncMapping> {
        self.mappings.values()
    }

    pub fn uids(&self) -> Vec<String> {
        self.mappings.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();

        let mut table = MappingTable::load(dir.path()).unwrap();
        table.insert(SyncMapping {
            uid: "a".to_string(),
            remote_event_id: "r-1".to_string(),
            remote_calendar_id: "family".to_string(),
        });
        table.save().unwrap();

        let reloaded = MappingTable::load(dir.path()).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.get("a").unwrap().remote_event_id, "r-1");
    }
}
