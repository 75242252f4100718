use crate::config_store::ConfigStore;
use crate::errors::AlertRouterError;
use crate::forwarder::Forwarder;
use crate::http::read_body;
use crate::splitter::{self, AlertPayload};
use hyper::body::{Body, Bytes};
use std::fmt::Display;
use std::sync::Arc;

/// Handles `/alert`: splits the payload by status and posts each group to the
/// downstream configured under the requested config name.
///
/// Groups are sent one after another, firing before resolved. The first
/// transport failure stops the loop; groups already delivered stay delivered.
pub struct RelayHandler {
    store: Arc<ConfigStore>,
    forwarder: Arc<dyn Forwarder>,
}

impl RelayHandler {
    pub fn new(store: Arc<ConfigStore>, forwarder: Arc<dyn Forwarder>) -> Self {
        RelayHandler { store, forwarder }
    }

    /// Returns the number of groups forwarded.
    pub async fn handle<B>(
        &self,
        config_name: Option<&str>,
        body: B,
    ) -> Result<usize, AlertRouterError>
    where
        B: Body,
        B::Error: Display,
    {
        let config_name = match config_name {
            Some(name) if !name.is_empty() => name,
            _ => return Err(AlertRouterError::MissingConfigParam),
        };
        tracing::info!(config = config_name, "Incoming alert request");

        // Base URL and params come from one config generation, even if a
        // reload lands while this request is in flight.
        let target = self
            .store
            .target(config_name)
            .ok_or_else(|| AlertRouterError::ConfigNotFound(config_name.to_string()))?;

        let bytes = read_body(body).await?;
        let payload: AlertPayload =
            serde_json::from_slice(&bytes).map_err(AlertRouterError::BodyParseError)?;
        let groups = splitter::split(payload)?;

        if groups.is_empty() {
            tracing::info!(config = config_name, "No firing or resolved alerts to forward");
        }

        for group in &groups {
            let body = serde_json::to_vec(group)
                .map(Bytes::from)
                .map_err(AlertRouterError::GroupSerializationError)?;
            let url = target.url();
            let status = group.status().as_str();

            tracing::debug!(
                config = config_name,
                body = %String::from_utf8_lossy(&body),
                "Forwarding body"
            );
            tracing::info!(config = config_name, status, url = %url, "Forwarding alert group");

            let downstream_status = self.forwarder.forward(&url, body).await?;
            if !downstream_status.is_success() {
                tracing::warn!(
                    config = config_name,
                    status,
                    downstream_status = downstream_status.as_u16(),
                    "Downstream answered with a non-success status"
                );
            }

            tracing::info!(
                config = config_name,
                status,
                alerts = group.alerts().len(),
                "Successfully forwarded alert group"
            );
        }

        Ok(groups.len())
    }
}
