//! Save/load of assembled loadouts.
//!
//! Uses bincode for a compact binary snapshot of one or more item trees, so a
//! generated loadout can be replayed or diffed without regenerating it.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::request::AssembledItem;

/// Version number for the snapshot format (increment when it changes)
const SNAPSHOT_VERSION: u32 = 1;

/// One saved loadout: root ids plus the flat item list they index into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadoutSnapshot {
    pub version: u32,
    /// Bot the loadout was generated for.
    pub role: String,
    pub level: u32,
    pub roots: Vec<String>,
    pub items: Vec<AssembledItem>,
}

impl LoadoutSnapshot {
    pub fn new(role: &str, level: u32) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            role: role.to_string(),
            level,
            roots: Vec::new(),
            items: Vec::new(),
        }
    }

    /// Append a finished tree. The first item must be its root.
    pub fn push_tree(&mut self, items: &[AssembledItem]) {
        if let Some(root) = items.first() {
            self.roots.push(root.id.clone());
        }
        self.items.extend_from_slice(items);
    }

    /// Items belonging to the tree rooted at `root_id`, root first.
    pub fn tree(&self, root_id: &str) -> Vec<&AssembledItem> {
        let mut out: Vec<&AssembledItem> = self.items.iter().filter(|i| i.id == root_id).collect();
        let mut cursor = 0;
        while cursor < out.len() {
            let parent = out[cursor];
            let children: Vec<&AssembledItem> = self
                .items
                .iter()
                .filter(|i| i.parent_id.as_deref() == Some(parent.id.as_str()))
                .collect();
            out.extend(children);
            cursor += 1;
        }
        out
    }
}

/// Errors that can occur during save/load
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Bincode(#[from] Box<bincode::ErrorKind>),

    #[error("Snapshot version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Write a snapshot to a writer
pub fn save_loadout<W: Write>(writer: W, snapshot: &LoadoutSnapshot) -> Result<(), SaveError> {
    bincode::serialize_into(writer, snapshot)?;
    Ok(())
}

/// Read a snapshot back, rejecting other format versions
pub fn load_loadout<R: Read>(reader: R) -> Result<LoadoutSnapshot, SaveError> {
    let snapshot: LoadoutSnapshot = bincode::deserialize_from(reader)?;
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(SaveError::VersionMismatch {
            expected: SNAPSHOT_VERSION,
            found: snapshot.version,
        });
    }
    Ok(snapshot)
}
