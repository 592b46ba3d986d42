//! Accessory hosts shipped with the binary.
//!
//! `FileAccessoryHost` keeps accessory records in
//! `{storage_dir}/accessories.json` across runs. `EphemeralHost` backs the
//! one-shot commands and keeps nothing.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};
use zwlock_core::{AccessoryHost, AccessoryRecord, NodeId};

use crate::error::CliError;

pub const ACCESSORIES_FILE_NAME: &str = "accessories.json";

/// Read persisted records; a missing file means none.
pub fn load_records(storage_dir: &Path) -> Result<Vec<AccessoryRecord>, CliError> {
    let path = storage_dir.join(ACCESSORIES_FILE_NAME);
    match std::fs::read_to_string(&path) {
        Ok(raw) => Ok(serde_json::from_str(&raw)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

// ── File-backed host ─────────────────────────────────────────────────

/// Accessory records persisted as pretty JSON.
///
/// Inside a tokio runtime the file is written on the blocking pool; each
/// write serializes the records as they are when it runs, so the last
/// write always carries the latest state.
pub struct FileAccessoryHost {
    store: Arc<RecordStore>,
}

struct RecordStore {
    path: PathBuf,
    records: Mutex<BTreeMap<NodeId, AccessoryRecord>>,
    io: Mutex<()>,
}

impl RecordStore {
    fn write(&self) -> std::io::Result<()> {
        let _io = self
            .io
            .lock()
            .map_err(|_| std::io::Error::other("accessory store writer poisoned"))?;
        let json = {
            let records = self
                .records
                .lock()
                .map_err(|_| std::io::Error::other("accessory store lock poisoned"))?;
            let list: Vec<&AccessoryRecord> = records.values().collect();
            serde_json::to_string_pretty(&list).map_err(std::io::Error::other)?
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let staging = self.path.with_extension("json.tmp");
        std::fs::write(&staging, json)?;
        std::fs::rename(&staging, &self.path)
    }

    fn write_logged(&self) {
        if let Err(e) = self.write() {
            warn!(error = %e, path = %self.path.display(), "failed to persist accessories");
        }
    }
}

impl FileAccessoryHost {
    pub fn open(storage_dir: &Path) -> Result<Self, CliError> {
        let records = load_records(storage_dir)?
            .into_iter()
            .map(|r| (r.node_id, r))
            .collect();
        Ok(Self {
            store: Arc::new(RecordStore {
                path: storage_dir.join(ACCESSORIES_FILE_NAME),
                records: Mutex::new(records),
                io: Mutex::new(()),
            }),
        })
    }

    /// Records loaded at startup plus any changes since.
    pub fn records(&self) -> Vec<AccessoryRecord> {
        self.store
            .records
            .lock()
            .map(|r| r.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Write the current records and wait for the write to land.
    pub async fn flush(&self) -> Result<(), CliError> {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || store.write())
            .await
            .map_err(|e| CliError::Internal(format!("accessory writer failed: {e}")))??;
        Ok(())
    }

    fn update(&self, f: impl FnOnce(&mut BTreeMap<NodeId, AccessoryRecord>) -> bool) {
        let changed = match self.store.records.lock() {
            Ok(mut records) => f(&mut records),
            Err(_) => {
                warn!("accessory store lock poisoned, skipping update");
                return;
            }
        };
        if changed {
            self.persist();
        }
    }

    fn persist(&self) {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let store = Arc::clone(&self.store);
                handle.spawn_blocking(move || store.write_logged());
            }
            Err(_) => self.store.write_logged(),
        }
    }
}

impl AccessoryHost for FileAccessoryHost {
    fn register(&self, record: &AccessoryRecord) {
        info!(
            node_id = record.node_id,
            name = %record.display_name,
            "registering accessory"
        );
        self.update(|records| {
            records.insert(record.node_id, record.clone());
            true
        });
    }

    fn unregister(&self, node_id: NodeId) {
        info!(node_id, "unregistering accessory");
        self.update(|records| records.remove(&node_id).is_some());
    }

    fn publish(&self, record: &AccessoryRecord) {
        self.update(|records| {
            if records.get(&record.node_id) == Some(record) {
                return false;
            }
            debug!(
                node_id = record.node_id,
                lock = %record.lock_state,
                target = %record.target_state,
                battery = ?record.battery,
                low_battery = record.low_battery(),
                beeper = record.configuration.beeper,
                "accessory values changed"
            );
            records.insert(record.node_id, record.clone());
            true
        });
    }
}

// ── Ephemeral host ───────────────────────────────────────────────────

/// Host for single commands: accessories live only in the engine.
pub struct EphemeralHost;

impl AccessoryHost for EphemeralHost {
    fn register(&self, record: &AccessoryRecord) {
        debug!(node_id = record.node_id, "register (ephemeral)");
    }

    fn unregister(&self, node_id: NodeId) {
        debug!(node_id, "unregister (ephemeral)");
    }

    fn publish(&self, record: &AccessoryRecord) {
        debug!(node_id = record.node_id, "publish (ephemeral)");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use zwlock_core::LockState;

    use super::*;

    #[test]
    fn records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let host = FileAccessoryHost::open(dir.path()).unwrap();
        host.register(&AccessoryRecord::new(5, "Front Door"));
        host.register(&AccessoryRecord::new(7, "Back Door"));
        host.unregister(7);

        let mut updated = AccessoryRecord::new(5, "Front Door");
        updated.lock_state = LockState::Secured;
        host.publish(&updated);

        let reopened = FileAccessoryHost::open(dir.path()).unwrap();
        assert_eq!(reopened.records(), vec![updated]);
    }

    #[tokio::test]
    async fn flush_persists_changes_made_on_the_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let host = FileAccessoryHost::open(dir.path()).unwrap();
        host.register(&AccessoryRecord::new(5, "Front Door"));
        let mut updated = AccessoryRecord::new(5, "Front Door");
        updated.battery = Some(42);
        host.publish(&updated);
        host.flush().await.unwrap();

        assert_eq!(load_records(dir.path()).unwrap(), vec![updated]);
    }

    #[test]
    fn missing_store_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_records(dir.path()).unwrap().is_empty());
    }
}
