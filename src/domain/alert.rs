// Temperature alert domain model
use thiserror::Error;

#[derive(Debug, Error)]
#[error("alert must set at least one of min_temp or max_temp")]
pub struct MissingThresholds;

/// A threshold alert bound to one (device, channel) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub id: String,
    pub device_id: String,
    pub channel_id: String,
    pub min_temp: Option<f64>,
    pub max_temp: Option<f64>,
    pub enabled: bool,
}

/// Payload for creating an alert upstream.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertRequest {
    pub device_id: String,
    pub channel_id: String,
    pub min_temp: Option<f64>,
    pub max_temp: Option<f64>,
}

impl AlertRequest {
    /// An alert with neither bound set is rejected before any upstream call.
    pub fn validate(&self) -> Result<(), MissingThresholds> {
        if self.min_temp.is_none() && self.max_temp.is_none() {
            return Err(MissingThresholds);
        }
        Ok(())
    }
}
