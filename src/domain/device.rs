// Device and channel domain models
use chrono::{DateTime, Utc};

/// Temperature unit reported by the cloud for a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TempUnit {
    Fahrenheit,
    Celsius,
}

impl TempUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            TempUnit::Fahrenheit => "°F",
            TempUnit::Celsius => "°C",
        }
    }

    /// Parse the cloud's `degreetype` style value; the vendor defaults to °F.
    pub fn from_cloud(value: Option<&str>) -> Self {
        match value {
            Some("C") | Some("c") | Some("celsius") => TempUnit::Celsius,
            _ => TempUnit::Fahrenheit,
        }
    }
}

/// One physical temperature probe on a device.
///
/// `current_temp` and `last_updated` are written only by the polling
/// coordinator; `current_temp` stays `None` until the first successful poll
/// or while the probe is unplugged.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub id: String,
    pub name: String,
    /// Physical probe slot on the device (1-based).
    pub number: i32,
    pub unit: TempUnit,
    pub current_temp: Option<f64>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl Channel {
    pub fn new(id: String, name: String, number: i32, unit: TempUnit) -> Self {
        Self {
            id,
            name,
            number,
            unit,
            current_temp: None,
            last_updated: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    pub id: String,
    pub name: String,
    pub model: String,
    pub channels: Vec<Channel>,
}

impl Device {
    pub fn new(id: String, name: Option<String>, model: String, channels: Vec<Channel>) -> Self {
        let name = name.unwrap_or_else(|| Self::fallback_name(&id));
        Self {
            id,
            name,
            model,
            channels,
        }
    }

    /// Display name used when the cloud returns an unnamed device.
    fn fallback_name(id: &str) -> String {
        format!("Grill {}", id)
    }

    pub fn channel(&self, channel_id: &str) -> Option<&Channel> {
        self.channels.iter().find(|c| c.id == channel_id)
    }
}
