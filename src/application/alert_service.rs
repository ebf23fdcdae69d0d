// Alert service - threshold alert CRUD against the cloud
use std::sync::Arc;

use thiserror::Error;
use tracing::warn;

use crate::application::cloud_client::{CloudClient, CloudError};
use crate::application::coordinator::PollingCoordinator;
use crate::domain::alert::{Alert, AlertRequest, MissingThresholds};

#[derive(Debug, Error)]
pub enum AlertError {
    #[error(transparent)]
    Invalid(#[from] MissingThresholds),
    #[error(transparent)]
    Cloud(#[from] CloudError),
}

#[derive(Clone)]
pub struct AlertService {
    client: Arc<dyn CloudClient>,
    coordinator: Arc<PollingCoordinator>,
}

impl AlertService {
    pub fn new(client: Arc<dyn CloudClient>, coordinator: Arc<PollingCoordinator>) -> Self {
        Self {
            client,
            coordinator,
        }
    }

    /// Create an alert. Thresholds are validated locally before any
    /// upstream call is made.
    pub async fn create(&self, request: AlertRequest) -> Result<Alert, AlertError> {
        request.validate()?;
        let alert = self.client.create_alert(&request).await?;
        self.refresh_snapshot().await;
        Ok(alert)
    }

    /// Delete an alert. An unknown id is an upstream rejection, surfaced
    /// as-is rather than treated as already-deleted.
    pub async fn delete(&self, alert_id: &str) -> Result<(), AlertError> {
        self.client.delete_alert(alert_id).await?;
        self.refresh_snapshot().await;
        Ok(())
    }

    /// Fold the change back into the snapshot; a failed refresh only means
    /// the next scheduled poll picks it up.
    async fn refresh_snapshot(&self) {
        if let Err(err) = self.coordinator.refresh().await {
            warn!(error = %err, "snapshot refresh after alert change failed");
        }
    }
}
