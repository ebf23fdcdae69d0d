// HTTP request handlers
use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::application::alert_service::AlertError;
use crate::application::chart_service::{ChartError, ChartScope};
use crate::application::cloud_client::CloudError;
use crate::application::coordinator::RefreshReport;
use crate::domain::alert::{Alert, AlertRequest};
use crate::domain::device::{Channel, Device};
use crate::domain::session::Session;
use crate::presentation::app_state::AppState;

#[derive(Deserialize)]
pub struct RangeQuery {
    pub hours: Option<i64>,
}

#[derive(Deserialize)]
pub struct DeviceFilter {
    pub device_id: Option<String>,
}

#[derive(Deserialize)]
pub struct StartSessionBody {
    pub device_id: String,
    pub title: String,
}

#[derive(Deserialize)]
pub struct EndSessionBody {
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateAlertBody {
    pub device_id: String,
    pub channel_id: String,
    pub min_temp: Option<f64>,
    pub max_temp: Option<f64>,
}

#[derive(Serialize)]
pub struct ChannelDto {
    pub id: String,
    pub name: String,
    pub number: i32,
    pub unit: &'static str,
    pub current_temp: Option<f64>,
    pub last_updated_ms: Option<i64>,
}

#[derive(Serialize)]
pub struct DeviceDto {
    pub id: String,
    pub name: String,
    pub model: String,
    pub channels: Vec<ChannelDto>,
}

#[derive(Serialize)]
pub struct SessionDto {
    pub id: String,
    pub device_id: String,
    pub title: String,
    pub start_ms: i64,
    pub end_ms: Option<i64>,
    pub is_active: bool,
    pub notes: Option<String>,
    pub channel_ids: Vec<String>,
}

#[derive(Serialize)]
pub struct AlertDto {
    pub id: String,
    pub device_id: String,
    pub channel_id: String,
    pub min_temp: Option<f64>,
    pub max_temp: Option<f64>,
    pub enabled: bool,
}

#[derive(Serialize)]
pub struct RefreshDeviceDto {
    pub ok: bool,
    pub error: Option<String>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// List all devices with their latest channel readings
pub async fn list_devices(State(state): State<Arc<AppState>>) -> Json<Vec<DeviceDto>> {
    let snapshot = state.store.snapshot();
    Json(snapshot.devices.into_values().map(device_dto).collect())
}

/// Chart payload for one device's recent history
pub async fn device_chart(
    Path(id): Path<String>,
    Query(range): Query<RangeQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let window = range.hours.map(Duration::hours);
    match state
        .chart_service
        .build_series(ChartScope::Device(id), window)
        .await
    {
        Ok(payload) => Json(payload).into_response(),
        Err(err) => chart_error_response(err),
    }
}

/// List sessions, optionally filtered to one device
pub async fn list_sessions(
    Query(filter): Query<DeviceFilter>,
    State(state): State<Arc<AppState>>,
) -> Json<Vec<SessionDto>> {
    let sessions = match filter.device_id {
        Some(device_id) => state.store.sessions_for(&device_id),
        None => state.store.snapshot().sessions.into_values().collect(),
    };
    Json(sessions.into_iter().map(session_dto).collect())
}

/// Start a session on a device
pub async fn start_session(
    State(state): State<Arc<AppState>>,
    Json(body): Json<StartSessionBody>,
) -> Response {
    match state
        .session_service
        .start(&body.device_id, &body.title)
        .await
    {
        Ok(session) => Json(session_dto(session)).into_response(),
        Err(err) => cloud_error_response(err),
    }
}

/// End a session, optionally attaching notes
pub async fn end_session(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<EndSessionBody>,
) -> Response {
    match state.session_service.end(&id, body.notes.as_deref()).await {
        Ok(session) => Json(session_dto(session)).into_response(),
        Err(err) => cloud_error_response(err),
    }
}

/// Chart payload for one session's span
pub async fn session_chart(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    match state
        .chart_service
        .build_series(ChartScope::Session(id), None)
        .await
    {
        Ok(payload) => Json(payload).into_response(),
        Err(err) => chart_error_response(err),
    }
}

/// List alerts, optionally filtered to one device
pub async fn list_alerts(
    Query(filter): Query<DeviceFilter>,
    State(state): State<Arc<AppState>>,
) -> Json<Vec<AlertDto>> {
    let alerts = match filter.device_id {
        Some(device_id) => state.store.alerts_for(&device_id),
        None => state.store.snapshot().alerts.into_values().collect(),
    };
    Json(alerts.into_iter().map(alert_dto).collect())
}

/// Create a threshold alert
pub async fn create_alert(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateAlertBody>,
) -> Response {
    let request = AlertRequest {
        device_id: body.device_id,
        channel_id: body.channel_id,
        min_temp: body.min_temp,
        max_temp: body.max_temp,
    };
    match state.alert_service.create(request).await {
        Ok(alert) => Json(alert_dto(alert)).into_response(),
        Err(err) => alert_error_response(err),
    }
}

/// Delete an alert by id
pub async fn delete_alert(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    match state.alert_service.delete(&id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => alert_error_response(err),
    }
}

/// Trigger an immediate refresh and report the per-device outcome
pub async fn trigger_refresh(State(state): State<Arc<AppState>>) -> Response {
    match state.coordinator.refresh().await {
        Ok(report) => Json(refresh_dto(report)).into_response(),
        Err(err) => cloud_error_response(err),
    }
}

fn device_dto(device: Device) -> DeviceDto {
    DeviceDto {
        id: device.id,
        name: device.name,
        model: device.model,
        channels: device.channels.into_iter().map(channel_dto).collect(),
    }
}

fn channel_dto(channel: Channel) -> ChannelDto {
    ChannelDto {
        id: channel.id,
        name: channel.name,
        number: channel.number,
        unit: channel.unit.symbol(),
        current_temp: channel.current_temp,
        last_updated_ms: channel.last_updated.map(|t| t.timestamp_millis()),
    }
}

fn session_dto(session: Session) -> SessionDto {
    SessionDto {
        is_active: session.is_active(),
        id: session.id,
        device_id: session.device_id,
        title: session.title,
        start_ms: session.start_time.timestamp_millis(),
        end_ms: session.end_time.map(|t| t.timestamp_millis()),
        notes: session.notes,
        channel_ids: session.channel_ids,
    }
}

fn alert_dto(alert: Alert) -> AlertDto {
    AlertDto {
        id: alert.id,
        device_id: alert.device_id,
        channel_id: alert.channel_id,
        min_temp: alert.min_temp,
        max_temp: alert.max_temp,
        enabled: alert.enabled,
    }
}

fn refresh_dto(report: RefreshReport) -> BTreeMap<String, RefreshDeviceDto> {
    report
        .devices
        .into_iter()
        .map(|(device_id, result)| {
            let dto = match result {
                Ok(()) => RefreshDeviceDto {
                    ok: true,
                    error: None,
                },
                Err(err) => RefreshDeviceDto {
                    ok: false,
                    error: Some(err.to_string()),
                },
            };
            (device_id, dto)
        })
        .collect()
}

fn cloud_error_status(err: &CloudError) -> StatusCode {
    match err {
        CloudError::Auth(_) => StatusCode::UNAUTHORIZED,
        CloudError::Rejected(_) => StatusCode::CONFLICT,
        CloudError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        CloudError::Network(_) | CloudError::Payload(_) => StatusCode::BAD_GATEWAY,
    }
}

fn cloud_error_response(err: CloudError) -> Response {
    warn!(error = %err, "cloud request failed");
    error_response(cloud_error_status(&err), err.to_string())
}

fn chart_error_response(err: ChartError) -> Response {
    match err {
        ChartError::UnknownDevice(_) | ChartError::UnknownSession(_) => {
            error_response(StatusCode::NOT_FOUND, err.to_string())
        }
        ChartError::Cloud(err) => cloud_error_response(err),
    }
}

fn alert_error_response(err: AlertError) -> Response {
    match err {
        AlertError::Invalid(_) => {
            error_response(StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
        }
        AlertError::Cloud(err) => cloud_error_response(err),
    }
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(ErrorBody { error: message })).into_response()
}
