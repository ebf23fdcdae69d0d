// In-memory latest-state snapshot store
use crate::domain::alert::Alert;
use crate::domain::device::Device;
use crate::domain::session::Session;
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Everything the cloud currently reports, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub devices: BTreeMap<String, Device>,
    pub sessions: BTreeMap<String, Session>,
    pub alerts: BTreeMap<String, Alert>,
}

/// Owned snapshot store with an init/refresh/teardown lifecycle.
///
/// Created empty, mutated only by the polling coordinator through
/// [`SnapshotStore::replace`] (one swap per completed refresh, so readers
/// never observe a half-updated view), cleared on teardown. Handlers and
/// entity adapters hold it as `Arc<SnapshotStore>` and only read.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    inner: RwLock<Snapshot>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.inner.read().clone()
    }

    pub fn device(&self, device_id: &str) -> Option<Device> {
        self.inner.read().devices.get(device_id).cloned()
    }

    pub fn session(&self, session_id: &str) -> Option<Session> {
        self.inner.read().sessions.get(session_id).cloned()
    }

    pub fn sessions_for(&self, device_id: &str) -> Vec<Session> {
        self.inner
            .read()
            .sessions
            .values()
            .filter(|s| s.device_id == device_id)
            .cloned()
            .collect()
    }

    pub fn alerts_for(&self, device_id: &str) -> Vec<Alert> {
        self.inner
            .read()
            .alerts
            .values()
            .filter(|a| a.device_id == device_id)
            .cloned()
            .collect()
    }

    pub fn replace(&self, snapshot: Snapshot) {
        *self.inner.write() = snapshot;
    }

    /// Drop the whole snapshot; the next refresh rebuilds it from the cloud.
    pub fn clear(&self) {
        *self.inner.write() = Snapshot::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_and_clear() {
        let store = SnapshotStore::new();
        assert!(store.snapshot().devices.is_empty());

        let mut snapshot = Snapshot::default();
        snapshot.devices.insert(
            "d1".to_string(),
            Device::new("d1".to_string(), None, "FBX2".to_string(), Vec::new()),
        );
        store.replace(snapshot);

        assert!(store.device("d1").is_some());
        assert!(store.device("d2").is_none());

        store.clear();
        assert!(store.device("d1").is_none());
    }
}
