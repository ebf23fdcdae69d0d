// Cloud client boundary - trait over the vendor REST API
use crate::domain::alert::{Alert, AlertRequest};
use crate::domain::device::TempUnit;
use crate::domain::session::Session;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors from the vendor cloud, split the way callers need to react:
/// `Auth` prompts for re-authentication, `Timeout`/`Network` wait for the
/// next scheduled poll, `Rejected` is surfaced to the caller immediately.
///
/// Clone-able so a coalesced refresh can hand one failure to every waiter.
#[derive(Debug, Clone, Error)]
pub enum CloudError {
    /// Credentials are bad or the token expired and re-auth failed.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Request exceeded the per-call deadline.
    #[error("request timed out")]
    Timeout,

    /// Connection-level or server-side failure; safe to retry next poll.
    #[error("network failure: {0}")]
    Network(String),

    /// The cloud understood the request and refused it.
    #[error("rejected by cloud service: {0}")]
    Rejected(String),

    /// Response arrived but could not be decoded.
    #[error("unexpected response payload: {0}")]
    Payload(String),
}

impl From<reqwest::Error> for CloudError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CloudError::Timeout
        } else if err.is_connect() {
            CloudError::Network(err.to_string())
        } else if err.is_decode() {
            CloudError::Payload(err.to_string())
        } else {
            CloudError::Network(err.to_string())
        }
    }
}

/// Device identity as listed by the cloud, before any readings are attached.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceInfo {
    pub id: String,
    pub name: Option<String>,
    pub model: String,
}

/// Channel identity as listed by the cloud.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelInfo {
    pub id: String,
    pub name: String,
    pub number: i32,
    pub unit: TempUnit,
}

/// A single current reading for one channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub temp: f64,
    /// When the cloud recorded the reading; `None` when it only reports the
    /// value.
    pub taken_at: Option<DateTime<Utc>>,
}

/// One historical sample within a time window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub time: DateTime<Utc>,
    pub temp: f64,
}

#[async_trait]
pub trait CloudClient: Send + Sync {
    /// List all devices owned by the account.
    async fn list_devices(&self) -> Result<Vec<DeviceInfo>, CloudError>;

    /// List the channels of one device.
    async fn list_channels(&self, device_id: &str) -> Result<Vec<ChannelInfo>, CloudError>;

    /// Latest reading for a channel; `None` when the probe has no reading.
    async fn get_latest_reading(&self, channel_id: &str) -> Result<Option<Reading>, CloudError>;

    /// Historical samples for a device channel within `[start, end]`.
    async fn list_channel_samples(
        &self,
        device_id: &str,
        channel_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Sample>, CloudError>;

    /// All samples recorded for a channel during a session.
    async fn list_session_samples(
        &self,
        session_id: &str,
        channel_id: &str,
    ) -> Result<Vec<Sample>, CloudError>;

    /// Recent sessions for a device, newest first.
    async fn list_sessions(&self, device_id: &str) -> Result<Vec<Session>, CloudError>;

    /// Alerts configured for a device.
    async fn list_alerts(&self, device_id: &str) -> Result<Vec<Alert>, CloudError>;

    /// Start a session; rejected upstream when one is already active.
    async fn start_session(&self, device_id: &str, title: &str) -> Result<Session, CloudError>;

    /// End a session, optionally attaching notes.
    async fn end_session(
        &self,
        session_id: &str,
        notes: Option<&str>,
    ) -> Result<Session, CloudError>;

    /// Create an alert; thresholds are validated before this is called.
    async fn create_alert(&self, request: &AlertRequest) -> Result<Alert, CloudError>;

    /// Delete an alert. Deleting an unknown id is an upstream rejection,
    /// never a silent no-op.
    async fn delete_alert(&self, alert_id: &str) -> Result<(), CloudError>;
}
