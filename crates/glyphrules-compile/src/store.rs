// this_file: crates/glyphrules-compile/src/store.rs

//! Versioned persistence of crosswalks between runs.
//!
//! The snapshot is an optimization only: it can always be rebuilt from the
//! patcher source and the fonts, so an unreadable file is treated as empty.

use crate::crosswalk::Crosswalk;
use camino::{Utf8Path, Utf8PathBuf};
use glyphrules_core::utils::write_atomic;
use glyphrules_core::{Codepoint, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Crosswalks of one run, tagged with the patcher version they came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrosswalkSnapshot {
    pub version: String,
    pub entries: Vec<SnapshotEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub index: usize,
    pub name: String,
    pub exact: bool,
    pub pairs: Vec<[Codepoint; 2]>,
}

impl SnapshotEntry {
    pub fn from_crosswalk(crosswalk: &Crosswalk) -> Self {
        Self {
            index: crosswalk.index,
            name: crosswalk.patch_set.clone(),
            exact: crosswalk.exact,
            pairs: crosswalk
                .pairs()
                .iter()
                .map(|&(origin, dest)| [origin, dest])
                .collect(),
        }
    }

    pub fn to_crosswalk(&self) -> Crosswalk {
        Crosswalk::new(
            self.name.clone(),
            self.index,
            self.exact,
            self.pairs.iter().map(|&[origin, dest]| (origin, dest)).collect(),
        )
    }
}

impl CrosswalkSnapshot {
    pub fn from_crosswalks(version: impl Into<String>, crosswalks: &[Crosswalk]) -> Self {
        Self {
            version: version.into(),
            entries: crosswalks.iter().map(SnapshotEntry::from_crosswalk).collect(),
        }
    }

    /// Entry usable for the patch set at `index`, if the snapshot is current.
    pub fn reusable(
        &self,
        version: &str,
        index: usize,
        name: &str,
        exact: bool,
    ) -> Option<&SnapshotEntry> {
        if self.version != version {
            return None;
        }
        self.entries
            .iter()
            .find(|e| e.index == index && e.name == name && e.exact == exact)
    }
}

/// Where crosswalk snapshots live between runs.
pub trait CrosswalkStore {
    fn load(&self) -> Result<Option<CrosswalkSnapshot>>;
    fn save(&mut self, snapshot: &CrosswalkSnapshot) -> Result<()>;
}

/// JSON file store, rewritten atomically on save.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: Utf8PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl CrosswalkStore for JsonFileStore {
    fn load(&self) -> Result<Option<CrosswalkSnapshot>> {
        let data = match std::fs::read(self.path.as_std_path()) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_slice::<CrosswalkSnapshot>(&data) {
            Ok(snapshot) => {
                debug!(
                    target: "glyphrules::map",
                    "loaded crosswalk snapshot for version {} ({} entries)",
                    snapshot.version,
                    snapshot.entries.len()
                );
                Ok(Some(snapshot))
            }
            Err(e) => {
                warn!(target: "glyphrules::map", "ignoring unreadable crosswalk cache {}: {e}", self.path);
                Ok(None)
            }
        }
    }

    fn save(&mut self, snapshot: &CrosswalkSnapshot) -> Result<()> {
        let mut json = serde_json::to_vec_pretty(snapshot)?;
        json.push(b'\n');
        write_atomic(self.path.as_std_path(), &json)
    }
}

/// In-memory store for tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    snapshot: Option<CrosswalkSnapshot>,
    saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: CrosswalkSnapshot) -> Self {
        Self {
            snapshot: Some(snapshot),
            saves: 0,
        }
    }

    pub fn snapshot(&self) -> Option<&CrosswalkSnapshot> {
        self.snapshot.as_ref()
    }

    /// Number of `save` calls so far.
    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl CrosswalkStore for MemoryStore {
    fn load(&self) -> Result<Option<CrosswalkSnapshot>> {
        Ok(self.snapshot.clone())
    }

    fn save(&mut self, snapshot: &CrosswalkSnapshot) -> Result<()> {
        self.snapshot = Some(snapshot.clone());
        self.saves += 1;
        Ok(())
    }
}
