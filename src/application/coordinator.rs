// Polling coordinator - periodic refresh of the cloud snapshot
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::warn;

use crate::application::cloud_client::{CloudClient, CloudError, DeviceInfo};
use crate::application::store::{Snapshot, SnapshotStore};
use crate::domain::alert::Alert;
use crate::domain::device::{Channel, Device};
use crate::domain::session::Session;

/// Outcome of one refresh, per device listed by the cloud.
#[derive(Debug, Clone)]
pub struct RefreshReport {
    pub devices: BTreeMap<String, Result<(), CloudError>>,
}

impl RefreshReport {
    pub fn all_ok(&self) -> bool {
        self.devices.values().all(|r| r.is_ok())
    }
}

type RefreshResult = Result<RefreshReport, CloudError>;
type SharedRefresh = Shared<BoxFuture<'static, RefreshResult>>;

/// Polls the cloud into the [`SnapshotStore`].
///
/// Overlapping [`refresh`](PollingCoordinator::refresh) calls coalesce onto a
/// single in-flight sweep: the slot holds the shared future, every caller
/// awaits a clone of it, and the sweep clears the slot when it completes.
pub struct PollingCoordinator {
    client: Arc<dyn CloudClient>,
    store: Arc<SnapshotStore>,
    request_timeout: Duration,
    inflight: Arc<Mutex<Option<SharedRefresh>>>,
}

/// Abort handle for the background poll task.
pub struct PollingHandle {
    handle: JoinHandle<()>,
}

impl PollingHandle {
    pub fn abort(&self) {
        self.handle.abort();
    }
}

impl PollingCoordinator {
    pub fn new(
        client: Arc<dyn CloudClient>,
        store: Arc<SnapshotStore>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            client,
            store,
            request_timeout,
            inflight: Arc::new(Mutex::new(None)),
        }
    }

    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    /// Refresh the snapshot from the cloud.
    ///
    /// Fails as a whole only when the device listing itself fails; any
    /// single device's failure is isolated into the report and that device
    /// keeps its previous snapshot.
    pub async fn refresh(&self) -> RefreshResult {
        let sweep = {
            let mut slot = self.inflight.lock();
            match slot.as_ref() {
                Some(sweep) => sweep.clone(),
                None => {
                    let sweep = Self::run_sweep(
                        Arc::clone(&self.client),
                        Arc::clone(&self.store),
                        self.request_timeout,
                        Arc::clone(&self.inflight),
                    )
                    .boxed()
                    .shared();
                    *slot = Some(sweep.clone());
                    sweep
                }
            }
        };
        sweep.await
    }

    /// Start the scheduled poll loop. The first tick fires immediately;
    /// failures are logged and retried only on the next tick.
    pub fn start_polling(self: Arc<Self>, interval: Duration) -> PollingHandle {
        let coordinator = self;
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match coordinator.refresh().await {
                    Ok(report) if !report.all_ok() => {
                        warn!("scheduled refresh completed with device failures");
                    }
                    Ok(_) => {}
                    Err(err) => warn!(error = %err, "scheduled refresh failed"),
                }
            }
        });
        PollingHandle { handle }
    }

    /// Host teardown: abort the poll loop and drop the snapshot. Any
    /// in-flight sweep is abandoned without retry.
    pub fn shutdown(&self, handle: PollingHandle) {
        handle.abort();
        self.inflight.lock().take();
        self.store.clear();
    }

    async fn run_sweep(
        client: Arc<dyn CloudClient>,
        store: Arc<SnapshotStore>,
        timeout: Duration,
        slot: Arc<Mutex<Option<SharedRefresh>>>,
    ) -> RefreshResult {
        let result = Self::sweep(client, store, timeout).await;
        slot.lock().take();
        result
    }

    async fn sweep(
        client: Arc<dyn CloudClient>,
        store: Arc<SnapshotStore>,
        timeout: Duration,
    ) -> RefreshResult {
        let listed = tokio::time::timeout(timeout, client.list_devices())
            .await
            .map_err(|_| CloudError::Timeout)??;

        let previous = store.snapshot();
        let mut next = Snapshot::default();
        let mut results = BTreeMap::new();

        for info in listed {
            let fetched = tokio::time::timeout(timeout, Self::fetch_device(&*client, &info))
                .await
                .map_err(|_| CloudError::Timeout)
                .and_then(|r| r);

            match fetched {
                Ok(fetched) => {
                    let device = merge_device(previous.devices.get(&info.id), fetched.device);
                    next.devices.insert(info.id.clone(), device);
                    for session in fetched.sessions {
                        next.sessions.insert(session.id.clone(), session);
                    }
                    for alert in fetched.alerts {
                        next.alerts.insert(alert.id.clone(), alert);
                    }
                    results.insert(info.id, Ok(()));
                }
                Err(err) => {
                    warn!(
                        device_id = %info.id,
                        error = %err,
                        "device refresh failed, keeping previous snapshot"
                    );
                    carry_over_device(&previous, &mut next, &info.id);
                    results.insert(info.id, Err(err));
                }
            }
        }

        // One replace per refresh: readers never see a half-updated view.
        store.replace(next);
        Ok(RefreshReport { devices: results })
    }

    async fn fetch_device(
        client: &dyn CloudClient,
        info: &DeviceInfo,
    ) -> Result<FetchedDevice, CloudError> {
        let channel_infos = client.list_channels(&info.id).await?;
        let mut channels = Vec::with_capacity(channel_infos.len());
        for ci in channel_infos {
            let reading = client.get_latest_reading(&ci.id).await?;
            let mut channel = Channel::new(ci.id, ci.name, ci.number, ci.unit);
            if let Some(reading) = reading {
                channel.current_temp = Some(reading.temp);
                channel.last_updated = Some(reading.taken_at.unwrap_or_else(Utc::now));
            }
            channels.push(channel);
        }
        let device = Device::new(
            info.id.clone(),
            info.name.clone(),
            info.model.clone(),
            channels,
        );
        let sessions = client.list_sessions(&info.id).await?;
        let alerts = client.list_alerts(&info.id).await?;
        Ok(FetchedDevice {
            device,
            sessions,
            alerts,
        })
    }
}

struct FetchedDevice {
    device: Device,
    sessions: Vec<Session>,
    alerts: Vec<Alert>,
}

/// Keep a failed device's previous view intact, sessions and alerts included.
fn carry_over_device(previous: &Snapshot, next: &mut Snapshot, device_id: &str) {
    let Some(device) = previous.devices.get(device_id) else {
        return;
    };
    next.devices.insert(device_id.to_string(), device.clone());
    for session in previous.sessions.values() {
        if session.device_id == device_id {
            next.sessions.insert(session.id.clone(), session.clone());
        }
    }
    for alert in previous.alerts.values() {
        if alert.device_id == device_id {
            next.alerts.insert(alert.id.clone(), alert.clone());
        }
    }
}

/// Merge a freshly fetched device over its previous snapshot.
///
/// `last_updated` never goes backwards: a reading older than the one already
/// held is a stale upstream response and the held pair stands. A missing
/// reading clears `current_temp` but keeps the last known timestamp.
fn merge_device(previous: Option<&Device>, mut fresh: Device) -> Device {
    let Some(previous) = previous else {
        return fresh;
    };
    for channel in &mut fresh.channels {
        let Some(prev) = previous.channel(&channel.id) else {
            continue;
        };
        match (prev.last_updated, channel.last_updated) {
            (Some(p), Some(f)) if f < p => {
                channel.current_temp = prev.current_temp;
                channel.last_updated = prev.last_updated;
            }
            (Some(_), None) => {
                channel.last_updated = prev.last_updated;
            }
            _ => {}
        }
    }
    fresh
}
