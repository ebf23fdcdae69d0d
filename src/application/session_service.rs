// Session service - start/end cook sessions against the cloud
use std::sync::Arc;

use tracing::warn;

use crate::application::cloud_client::{CloudClient, CloudError};
use crate::application::coordinator::PollingCoordinator;
use crate::domain::session::Session;

#[derive(Clone)]
pub struct SessionService {
    client: Arc<dyn CloudClient>,
    coordinator: Arc<PollingCoordinator>,
}

impl SessionService {
    pub fn new(client: Arc<dyn CloudClient>, coordinator: Arc<PollingCoordinator>) -> Self {
        Self {
            client,
            coordinator,
        }
    }

    /// Start a session on a device. The cloud rejects a device that already
    /// has one active; that rejection is surfaced unchanged.
    pub async fn start(&self, device_id: &str, title: &str) -> Result<Session, CloudError> {
        let session = self.client.start_session(device_id, title).await?;
        self.refresh_snapshot().await;
        Ok(session)
    }

    /// End a session, optionally attaching notes.
    pub async fn end(&self, session_id: &str, notes: Option<&str>) -> Result<Session, CloudError> {
        let session = self.client.end_session(session_id, notes).await?;
        self.refresh_snapshot().await;
        Ok(session)
    }

    async fn refresh_snapshot(&self) {
        if let Err(err) = self.coordinator.refresh().await {
            warn!(error = %err, "snapshot refresh after session change failed");
        }
    }
}
