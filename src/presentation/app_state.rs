// Application state for HTTP handlers
use std::sync::Arc;

use crate::application::alert_service::AlertService;
use crate::application::chart_service::ChartService;
use crate::application::coordinator::PollingCoordinator;
use crate::application::session_service::SessionService;
use crate::application::store::SnapshotStore;

pub struct AppState {
    pub store: Arc<SnapshotStore>,
    pub coordinator: Arc<PollingCoordinator>,
    pub chart_service: ChartService,
    pub session_service: SessionService,
    pub alert_service: AlertService,
}
