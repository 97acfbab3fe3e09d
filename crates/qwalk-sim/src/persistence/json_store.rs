//! JSON file-based document store.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::checkpoint::{CheckpointSnapshot, Revision, SimulationId};
use crate::error::{SimError, SimResult};
use crate::persistence::CheckpointSink;

/// A snapshot as stored on disk, tagged with its revision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSnapshot {
    /// Revision of this document.
    #[serde(rename = "_rev")]
    pub revision: Revision,
    /// The snapshot itself.
    #[serde(flatten)]
    pub snapshot: CheckpointSnapshot,
}

/// File-based checkpoint store.
///
/// Stores one document per simulation at
/// `<root>/simulations-<space>/<id>.json`; each put overwrites the previous
/// document of that simulation.
pub struct JsonStore {
    /// Base directory for storage.
    root: PathBuf,

    /// Last revision number per simulation.
    revisions: Mutex<FxHashMap<SimulationId, u64>>,
}

impl JsonStore {
    /// Create a store rooted at `root`, creating the directory if needed.
    pub fn new(root: impl AsRef<Path>) -> SimResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            revisions: Mutex::new(FxHashMap::default()),
        })
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the document for one simulation.
    pub fn document_path(&self, space: &str, id: &SimulationId) -> PathBuf {
        self.root
            .join(format!("simulations-{}", sanitize(space)))
            .join(format!("{id}.json"))
    }

    /// Read back the stored document of a simulation.
    pub fn load(&self, space: &str, id: &SimulationId) -> SimResult<Option<StoredSnapshot>> {
        let path = self.document_path(space, id);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SimError::Io(e)),
        }
    }

    /// IDs of every simulation stored for `space`.
    pub fn list(&self, space: &str) -> SimResult<Vec<SimulationId>> {
        let dir = self.root.join(format!("simulations-{}", sanitize(space)));
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(SimError::Io(e)),
        };

        let mut ids = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(id) = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .and_then(|s| SimulationId::parse(s).ok())
                {
                    ids.push(id);
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn next_revision(&self, id: SimulationId) -> SimResult<Revision> {
        let mut revisions = self
            .revisions
            .lock()
            .map_err(|_| SimError::Persistence("revision table lock poisoned".into()))?;
        let n = revisions.entry(id).or_insert(0);
        *n += 1;
        Ok(Revision(format!("{}-{}", n, Uuid::new_v4().simple())))
    }
}

impl CheckpointSink for JsonStore {
    fn put(&self, snapshot: CheckpointSnapshot) -> SimResult<Revision> {
        let path = self.document_path(&snapshot.space, &snapshot.simulation_id);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let revision = self.next_revision(snapshot.simulation_id)?;
        let doc = StoredSnapshot {
            revision: revision.clone(),
            snapshot,
        };
        let json = serde_json::to_string_pretty(&doc)?;

        // Write-then-rename so readers never see a torn document.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;

        tracing::debug!(path = %path.display(), %revision, "stored checkpoint");
        Ok(revision)
    }
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
