// Application layer - Use cases and the cloud boundary
pub mod alert_service;
pub mod chart_service;
pub mod cloud_client;
pub mod coordinator;
pub mod session_service;
pub mod store;

#[cfg(test)]
pub mod test_support;
