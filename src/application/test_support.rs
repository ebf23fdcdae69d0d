// In-memory cloud double shared by the application-layer tests
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::application::cloud_client::{
    ChannelInfo, CloudClient, CloudError, DeviceInfo, Reading, Sample,
};
use crate::domain::alert::{Alert, AlertRequest};
use crate::domain::device::TempUnit;
use crate::domain::session::Session;

pub fn ms(time_ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(time_ms).unwrap()
}

pub fn device_info(id: &str) -> DeviceInfo {
    DeviceInfo {
        id: id.to_string(),
        name: Some(format!("Device {}", id)),
        model: "FBX2".to_string(),
    }
}

pub fn channel_info(id: &str, number: i32) -> ChannelInfo {
    ChannelInfo {
        id: id.to_string(),
        name: format!("Probe {}", number),
        number,
        unit: TempUnit::Fahrenheit,
    }
}

pub fn reading(temp: f64, time_ms: i64) -> Reading {
    Reading {
        temp,
        taken_at: Some(ms(time_ms)),
    }
}

pub fn sample(time_ms: i64, temp: f64) -> Sample {
    Sample {
        time: ms(time_ms),
        temp,
    }
}

/// Configurable in-memory stand-in for the vendor cloud.
#[derive(Default)]
pub struct MockCloud {
    pub devices: Mutex<Vec<DeviceInfo>>,
    /// device id -> channels
    pub channels: Mutex<HashMap<String, Vec<ChannelInfo>>>,
    /// channel id -> latest reading
    pub readings: Mutex<HashMap<String, Option<Reading>>>,
    /// channel id -> device-history samples
    pub channel_samples: Mutex<HashMap<String, Vec<Sample>>>,
    /// (session id, channel id) -> session samples
    pub session_samples: Mutex<HashMap<(String, String), Vec<Sample>>>,
    /// device id -> sessions
    pub sessions: Mutex<HashMap<String, Vec<Session>>>,
    /// device id -> alerts reported by the poll
    pub alerts: Mutex<HashMap<String, Vec<Alert>>>,
    /// upstream alert store backing create/delete
    pub alert_store: Mutex<HashMap<String, Alert>>,
    /// device id -> active session id
    pub active_sessions: Mutex<HashMap<String, String>>,
    /// device ids whose channel listing fails
    pub fail_channels_for: Mutex<HashSet<String>>,
    /// channel ids whose latest-reading call never returns
    pub hang_reading_for: Mutex<HashSet<String>>,
    pub fail_listing: AtomicBool,
    pub list_device_calls: AtomicUsize,
    /// when set, the first list_devices call blocks until notified
    pub first_list_gate: Mutex<Option<Arc<Notify>>>,
    next_id: AtomicUsize,
}

impl MockCloud {
    pub fn new() -> Self {
        Self::default()
    }

    fn fresh_id(&self, prefix: &str) -> String {
        format!("{}{}", prefix, self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

#[async_trait]
impl CloudClient for MockCloud {
    async fn list_devices(&self) -> Result<Vec<DeviceInfo>, CloudError> {
        let calls = self.list_device_calls.fetch_add(1, Ordering::SeqCst);
        if calls == 0 {
            let gate = self.first_list_gate.lock().take();
            if let Some(gate) = gate {
                gate.notified().await;
            }
        }
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(CloudError::Network("connection refused".to_string()));
        }
        Ok(self.devices.lock().clone())
    }

    async fn list_channels(&self, device_id: &str) -> Result<Vec<ChannelInfo>, CloudError> {
        if self.fail_channels_for.lock().contains(device_id) {
            return Err(CloudError::Network("connection reset".to_string()));
        }
        Ok(self.channels.lock().get(device_id).cloned().unwrap_or_default())
    }

    async fn get_latest_reading(&self, channel_id: &str) -> Result<Option<Reading>, CloudError> {
        let hang = self.hang_reading_for.lock().contains(channel_id);
        if hang {
            tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
        }
        Ok(self.readings.lock().get(channel_id).copied().flatten())
    }

    async fn list_channel_samples(
        &self,
        _device_id: &str,
        channel_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Sample>, CloudError> {
        Ok(self
            .channel_samples
            .lock()
            .get(channel_id)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|s| s.time >= start && s.time <= end)
            .collect())
    }

    async fn list_session_samples(
        &self,
        session_id: &str,
        channel_id: &str,
    ) -> Result<Vec<Sample>, CloudError> {
        Ok(self
            .session_samples
            .lock()
            .get(&(session_id.to_string(), channel_id.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn list_sessions(&self, device_id: &str) -> Result<Vec<Session>, CloudError> {
        Ok(self.sessions.lock().get(device_id).cloned().unwrap_or_default())
    }

    async fn list_alerts(&self, device_id: &str) -> Result<Vec<Alert>, CloudError> {
        Ok(self.alerts.lock().get(device_id).cloned().unwrap_or_default())
    }

    async fn start_session(&self, device_id: &str, title: &str) -> Result<Session, CloudError> {
        let mut active = self.active_sessions.lock();
        if active.contains_key(device_id) {
            return Err(CloudError::Rejected(format!(
                "device {} already has an active session",
                device_id
            )));
        }
        let id = self.fresh_id("s");
        active.insert(device_id.to_string(), id.clone());
        Ok(Session {
            id,
            device_id: device_id.to_string(),
            title: title.to_string(),
            start_time: Utc::now(),
            end_time: None,
            notes: None,
            channel_ids: Vec::new(),
        })
    }

    async fn end_session(
        &self,
        session_id: &str,
        notes: Option<&str>,
    ) -> Result<Session, CloudError> {
        let mut active = self.active_sessions.lock();
        let device_id = active
            .iter()
            .find(|(_, sid)| sid.as_str() == session_id)
            .map(|(d, _)| d.clone());
        let Some(device_id) = device_id else {
            return Err(CloudError::Rejected(format!(
                "session {} is not active",
                session_id
            )));
        };
        active.remove(&device_id);
        Ok(Session {
            id: session_id.to_string(),
            device_id,
            title: String::new(),
            start_time: Utc::now(),
            end_time: Some(Utc::now()),
            notes: notes.map(str::to_string),
            channel_ids: Vec::new(),
        })
    }

    async fn create_alert(&self, request: &AlertRequest) -> Result<Alert, CloudError> {
        let id = self.fresh_id("a");
        let alert = Alert {
            id: id.clone(),
            device_id: request.device_id.clone(),
            channel_id: request.channel_id.clone(),
            min_temp: request.min_temp,
            max_temp: request.max_temp,
            enabled: true,
        };
        self.alert_store.lock().insert(id, alert.clone());
        Ok(alert)
    }

    async fn delete_alert(&self, alert_id: &str) -> Result<(), CloudError> {
        if self.alert_store.lock().remove(alert_id).is_none() {
            return Err(CloudError::Rejected(format!("alert {} not found", alert_id)));
        }
        Ok(())
    }
}
