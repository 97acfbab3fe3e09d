//! Checkpoint persistence.
//!
//! The simulation loop only ever writes through [`CheckpointSink::put`];
//! nothing is read back. A failed put is logged by the loop and superseded
//! by the next scheduled checkpoint.

mod json_store;

pub use json_store::{JsonStore, StoredSnapshot};

use std::sync::Mutex;

use rustc_hash::FxHashMap;

use crate::checkpoint::{CheckpointSnapshot, Revision, SimulationId};
use crate::error::{SimError, SimResult};

/// Destination for checkpoint snapshots.
pub trait CheckpointSink: Send + Sync {
    /// Store `snapshot`, replacing any earlier snapshot of the same run.
    fn put(&self, snapshot: CheckpointSnapshot) -> SimResult<Revision>;
}

#[derive(Debug, Default)]
struct MemoryState {
    latest: FxHashMap<SimulationId, CheckpointSnapshot>,
    log: Vec<CheckpointSnapshot>,
}

/// In-process sink keeping the latest snapshot per run and a full log.
#[derive(Debug, Default)]
pub struct MemorySink {
    state: Mutex<MemoryState>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest snapshot of a run.
    pub fn latest(&self, id: &SimulationId) -> Option<CheckpointSnapshot> {
        self.state.lock().ok()?.latest.get(id).cloned()
    }

    /// Every snapshot received, in order.
    pub fn history(&self) -> Vec<CheckpointSnapshot> {
        self.state
            .lock()
            .map(|s| s.log.clone())
            .unwrap_or_default()
    }

    /// Number of snapshots received.
    pub fn len(&self) -> usize {
        self.state.lock().map(|s| s.log.len()).unwrap_or(0)
    }

    /// True if nothing was received.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CheckpointSink for MemorySink {
    fn put(&self, snapshot: CheckpointSnapshot) -> SimResult<Revision> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| SimError::Persistence("memory sink lock poisoned".into()))?;
        state.log.push(snapshot.clone());
        let n = state.log.len();
        state.latest.insert(snapshot.simulation_id, snapshot);
        Ok(Revision(format!("{n}-memory")))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Utc;

    use super::*;
    use crate::checkpoint::InitialGenotype;
    use crate::config::SimulationConfig;

    fn snapshot(id: SimulationId, checkpoint: u64) -> CheckpointSnapshot {
        CheckpointSnapshot {
            simulation_id: id,
            space: "unit".into(),
            checkpoint,
            started_at: Utc::now(),
            created_at: Utc::now(),
            initial: InitialGenotype {
                index: 0,
                sequence: "A".into(),
                phenotype: "x".into(),
            },
            config: SimulationConfig::default(),
            total_measurements: checkpoint * 10,
            total_mutations: checkpoint,
            computing_time_secs: 1.0,
            simulated_time: 2.0,
            phenotypes: BTreeMap::new(),
        }
    }

    #[test]
    fn test_memory_sink_overwrites_latest() {
        let sink = MemorySink::new();
        let id = SimulationId::new();
        sink.put(snapshot(id, 1)).unwrap();
        let rev = sink.put(snapshot(id, 2)).unwrap();

        assert_eq!(rev, Revision("2-memory".into()));
        assert_eq!(sink.len(), 2);
        assert_eq!(sink.latest(&id).unwrap().checkpoint, 2);
        assert!(sink.latest(&SimulationId::new()).is_none());
    }
}
