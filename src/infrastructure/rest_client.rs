// REST implementation of the cloud client boundary
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use reqwest::{Client, Method, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use urlencoding::encode;

use crate::application::cloud_client::{
    ChannelInfo, CloudClient, CloudError, DeviceInfo, Reading, Sample,
};
use crate::domain::alert::{Alert, AlertRequest};
use crate::domain::device::TempUnit;
use crate::domain::session::Session;

/// Cloud client over the vendor REST API.
///
/// Authenticates either with a static API key header or with a
/// username/password login that yields a token. A 401 with credentials
/// available triggers one re-authentication and one retry; a second 401 is
/// surfaced as an authentication failure.
pub struct RestCloudClient {
    http: Client,
    api_url: String,
    api_key: Option<String>,
    username: Option<String>,
    password: Option<String>,
    token: Mutex<Option<String>>,
}

impl RestCloudClient {
    pub fn new(
        api_url: String,
        api_key: Option<String>,
        username: Option<String>,
        password: Option<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key,
            username,
            password,
            token: Mutex::new(None),
        })
    }

    async fn authenticate(&self) -> Result<(), CloudError> {
        let (username, password) = match (&self.username, &self.password) {
            (Some(u), Some(p)) => (u, p),
            _ => {
                return Err(CloudError::Auth(
                    "no credentials configured for login".to_string(),
                ));
            }
        };

        let url = format!("{}/rest-auth/login/", self.api_url);
        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "username": username, "password": password }))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::BAD_REQUEST {
            let body = response.text().await.unwrap_or_default();
            return Err(CloudError::Auth(body));
        }
        if !status.is_success() {
            return Err(Self::status_error(response).await);
        }

        #[derive(Deserialize)]
        struct LoginResponse {
            key: String,
        }
        let login: LoginResponse = response.json().await?;
        *self.token.lock() = Some(login.key);
        Ok(())
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<reqwest::Response, CloudError> {
        let url = format!("{}/{}", self.api_url, path);

        // second attempt only after a re-authentication on a 401
        for attempt in 0..2 {
            if self.api_key.is_none() && self.token.lock().is_none() {
                self.authenticate().await?;
            }

            let mut builder = self.http.request(method.clone(), &url);
            if let Some(key) = &self.api_key {
                builder = builder.header("X-API-KEY", key);
            }
            let token = self.token.lock().clone();
            if let Some(token) = token {
                builder = builder.header("Authorization", format!("Token {}", token));
            }
            if let Some(body) = body {
                builder = builder.json(body);
            }

            let response = builder.send().await?;
            let status = response.status();

            if status == StatusCode::UNAUTHORIZED {
                if attempt == 0 && self.username.is_some() && self.password.is_some() {
                    debug!(path, "token rejected, re-authenticating");
                    self.token.lock().take();
                    continue;
                }
                let body = response.text().await.unwrap_or_default();
                return Err(CloudError::Auth(body));
            }
            if !status.is_success() {
                return Err(Self::status_error(response).await);
            }
            return Ok(response);
        }

        Err(CloudError::Auth(
            "credentials rejected after re-authentication".to_string(),
        ))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, CloudError> {
        let response = self.send(Method::GET, path, None).await?;
        Ok(response.json().await?)
    }

    async fn status_error(response: reqwest::Response) -> CloudError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if status.is_server_error() {
            CloudError::Network(format!("{}: {}", status, body))
        } else {
            CloudError::Rejected(format!("{}: {}", status, body))
        }
    }
}

#[async_trait]
impl CloudClient for RestCloudClient {
    async fn list_devices(&self) -> Result<Vec<DeviceInfo>, CloudError> {
        let devices: Vec<ApiDevice> = self.get_json("v1/devices/").await?;
        Ok(devices.into_iter().map(map_device).collect())
    }

    async fn list_channels(&self, device_id: &str) -> Result<Vec<ChannelInfo>, CloudError> {
        let path = format!("v1/devices/{}/channels/", encode(device_id));
        let channels: Vec<ApiChannel> = self.get_json(&path).await?;
        Ok(channels.into_iter().map(map_channel).collect())
    }

    async fn get_latest_reading(&self, channel_id: &str) -> Result<Option<Reading>, CloudError> {
        let path = format!("v1/channels/{}/temps/latest/", encode(channel_id));
        let reading: ApiReading = self.get_json(&path).await?;
        map_reading(reading)
    }

    async fn list_channel_samples(
        &self,
        device_id: &str,
        channel_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Sample>, CloudError> {
        let path = format!(
            "v1/devices/{}/channels/{}/temps/?start={}&end={}",
            encode(device_id),
            encode(channel_id),
            encode(&start.to_rfc3339()),
            encode(&end.to_rfc3339()),
        );
        let samples: Vec<ApiSample> = self.get_json(&path).await?;
        samples.into_iter().map(map_sample).collect()
    }

    async fn list_session_samples(
        &self,
        session_id: &str,
        channel_id: &str,
    ) -> Result<Vec<Sample>, CloudError> {
        let path = format!(
            "v1/sessions/{}/temps/?channel={}",
            encode(session_id),
            encode(channel_id),
        );
        let samples: Vec<ApiSample> = self.get_json(&path).await?;
        samples.into_iter().map(map_sample).collect()
    }

    async fn list_sessions(&self, device_id: &str) -> Result<Vec<Session>, CloudError> {
        let path = format!("v1/devices/{}/sessions/", encode(device_id));
        let sessions: Vec<ApiSession> = self.get_json(&path).await?;
        sessions.into_iter().map(map_session).collect()
    }

    async fn list_alerts(&self, device_id: &str) -> Result<Vec<Alert>, CloudError> {
        let path = format!("v1/devices/{}/alerts/", encode(device_id));
        let alerts: Vec<ApiAlert> = self.get_json(&path).await?;
        Ok(alerts.into_iter().map(map_alert).collect())
    }

    async fn start_session(&self, device_id: &str, title: &str) -> Result<Session, CloudError> {
        let body = serde_json::json!({ "device": device_id, "title": title });
        let response = self.send(Method::POST, "v1/sessions/", Some(&body)).await?;
        let session: ApiSession = response.json().await?;
        map_session(session)
    }

    async fn end_session(
        &self,
        session_id: &str,
        notes: Option<&str>,
    ) -> Result<Session, CloudError> {
        let path = format!("v1/sessions/{}/end/", encode(session_id));
        let body = serde_json::json!({ "notes": notes });
        let response = self.send(Method::POST, &path, Some(&body)).await?;
        let session: ApiSession = response.json().await?;
        map_session(session)
    }

    async fn create_alert(&self, request: &AlertRequest) -> Result<Alert, CloudError> {
        let mut body = serde_json::json!({
            "device": request.device_id,
            "channel": request.channel_id,
        });
        if let Some(min) = request.min_temp {
            body["min"] = min.into();
        }
        if let Some(max) = request.max_temp {
            body["max"] = max.into();
        }
        let response = self.send(Method::POST, "v1/alerts/", Some(&body)).await?;
        let alert: ApiAlert = response.json().await?;
        Ok(map_alert(alert))
    }

    async fn delete_alert(&self, alert_id: &str) -> Result<(), CloudError> {
        let path = format!("v1/alerts/{}/", encode(alert_id));
        self.send(Method::DELETE, &path, None).await?;
        Ok(())
    }
}

// ---- wire payloads -------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ApiDevice {
    id: i64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiChannel {
    id: i64,
    #[serde(default)]
    name: Option<String>,
    channel: i32,
    #[serde(default)]
    degreetype: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiReading {
    #[serde(default)]
    temp: Option<f64>,
    #[serde(default)]
    created: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiSample {
    temp: f64,
    created: String,
}

#[derive(Debug, Deserialize)]
struct ApiSession {
    id: i64,
    device: i64,
    #[serde(default)]
    title: Option<String>,
    start_time: String,
    #[serde(default)]
    end_time: Option<String>,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    channels: Vec<i64>,
}

#[derive(Debug, Deserialize)]
struct ApiAlert {
    id: i64,
    device: i64,
    channel: i64,
    #[serde(default)]
    min: Option<f64>,
    #[serde(default)]
    max: Option<f64>,
    #[serde(default = "default_true")]
    enabled: bool,
}

fn default_true() -> bool {
    true
}

fn parse_time(value: &str) -> Result<DateTime<Utc>, CloudError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| CloudError::Payload(format!("bad timestamp {:?}: {}", value, e)))
}

fn map_device(device: ApiDevice) -> DeviceInfo {
    DeviceInfo {
        id: device.id.to_string(),
        name: device.name,
        model: device.model.unwrap_or_else(|| "unknown".to_string()),
    }
}

fn map_channel(channel: ApiChannel) -> ChannelInfo {
    let name = channel
        .name
        .unwrap_or_else(|| format!("Channel {}", channel.channel));
    ChannelInfo {
        id: channel.id.to_string(),
        name,
        number: channel.channel,
        unit: TempUnit::from_cloud(channel.degreetype.as_deref()),
    }
}

fn map_reading(reading: ApiReading) -> Result<Option<Reading>, CloudError> {
    let Some(temp) = reading.temp else {
        return Ok(None);
    };
    let taken_at = reading.created.as_deref().map(parse_time).transpose()?;
    Ok(Some(Reading { temp, taken_at }))
}

fn map_sample(sample: ApiSample) -> Result<Sample, CloudError> {
    Ok(Sample {
        time: parse_time(&sample.created)?,
        temp: sample.temp,
    })
}

fn map_session(session: ApiSession) -> Result<Session, CloudError> {
    Ok(Session {
        id: session.id.to_string(),
        device_id: session.device.to_string(),
        title: session.title.unwrap_or_else(|| "Untitled cook".to_string()),
        start_time: parse_time(&session.start_time)?,
        end_time: session.end_time.as_deref().map(parse_time).transpose()?,
        notes: session.notes,
        channel_ids: session.channels.iter().map(|c| c.to_string()).collect(),
    })
}

fn map_alert(alert: ApiAlert) -> Alert {
    Alert {
        id: alert.id.to_string(),
        device_id: alert.device.to_string(),
        channel_id: alert.channel.to_string(),
        min_temp: alert.min,
        max_temp: alert.max,
        enabled: alert.enabled,
    }
}
