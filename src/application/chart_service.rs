// Chart aggregation service - assembles chart-ready series for a scope
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::application::cloud_client::{CloudClient, CloudError, Sample};
use crate::application::store::SnapshotStore;
use crate::domain::chart::{ChartPayload, ChartSeriesMeta, TimeSeriesPoint};
use crate::domain::device::Channel;

/// Rolling window applied to device-scope charts when none is given.
pub const DEFAULT_DEVICE_WINDOW_HOURS: i64 = 24;

/// What a chart is drawn over: a device's recent history or a session's span.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartScope {
    Device(String),
    Session(String),
}

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("unknown device: {0}")]
    UnknownDevice(String),
    #[error("unknown session: {0}")]
    UnknownSession(String),
    #[error(transparent)]
    Cloud(#[from] CloudError),
}

#[derive(Clone)]
pub struct ChartService {
    client: Arc<dyn CloudClient>,
    store: Arc<SnapshotStore>,
}

impl ChartService {
    pub fn new(client: Arc<dyn CloudClient>, store: Arc<SnapshotStore>) -> Self {
        Self { client, store }
    }

    /// Build one labeled series per channel in scope, all aligned to a
    /// single time axis. The payload is re-derived on every call.
    pub async fn build_series(
        &self,
        scope: ChartScope,
        window: Option<Duration>,
    ) -> Result<ChartPayload, ChartError> {
        match scope {
            ChartScope::Device(device_id) => {
                let window =
                    window.unwrap_or_else(|| Duration::hours(DEFAULT_DEVICE_WINDOW_HOURS));
                self.device_series(&device_id, window).await
            }
            // a session's own span is authoritative, the window is ignored
            ChartScope::Session(session_id) => self.session_series(&session_id).await,
        }
    }

    async fn device_series(
        &self,
        device_id: &str,
        window: Duration,
    ) -> Result<ChartPayload, ChartError> {
        let device = self
            .store
            .device(device_id)
            .ok_or_else(|| ChartError::UnknownDevice(device_id.to_string()))?;

        let end = Utc::now();
        let start = end - window;

        let mut channels = Vec::with_capacity(device.channels.len());
        for channel in &device.channels {
            let samples = self
                .client
                .list_channel_samples(device_id, &channel.id, start, end)
                .await?;
            channels.push((series_meta(channel), windowed_points(samples, start, end)));
        }

        Ok(ChartPayload::align(device.name.clone(), channels))
    }

    async fn session_series(&self, session_id: &str) -> Result<ChartPayload, ChartError> {
        let session = self
            .store
            .session(session_id)
            .ok_or_else(|| ChartError::UnknownSession(session_id.to_string()))?;

        let (start, end) = session.span(Utc::now());
        let device = self.store.device(&session.device_id);

        let mut channels = Vec::with_capacity(session.channel_ids.len());
        for channel_id in &session.channel_ids {
            let samples = self
                .client
                .list_session_samples(session_id, channel_id)
                .await?;
            let meta = device
                .as_ref()
                .and_then(|d| d.channel(channel_id))
                .map(series_meta)
                .unwrap_or_else(|| ChartSeriesMeta {
                    channel_id: channel_id.clone(),
                    name: channel_id.clone(),
                    unit: "°F",
                });
            channels.push((meta, windowed_points(samples, start, end)));
        }

        Ok(ChartPayload::align(session.title.clone(), channels))
    }
}

fn series_meta(channel: &Channel) -> ChartSeriesMeta {
    ChartSeriesMeta {
        channel_id: channel.id.clone(),
        name: channel.name.clone(),
        unit: channel.unit.symbol(),
    }
}

/// Clamp samples to the window and put them in chronological order.
fn windowed_points(
    samples: Vec<Sample>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<TimeSeriesPoint> {
    let mut points: Vec<TimeSeriesPoint> = samples
        .into_iter()
        .filter(|s| s.time >= start && s.time <= end)
        .map(|s| TimeSeriesPoint::new(s.time.timestamp_millis(), s.temp))
        .collect();
    points.sort_by_key(|p| p.time_ms);
    points
}
