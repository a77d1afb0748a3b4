use std::sync::Arc;
use tokio::task::JoinHandle;

use super::panel::{Panel, PanelState};
use crate::api::{BackendClient, GeoEstimate};
use crate::capability::{acquire_location, LocationSource, PositionOptions};

pub const GEO_FETCH_FAILED: &str = "Failed to fetch AQI";

/// Nearby AQI panel: locate, then ask the backend.
pub struct GeoPanel {
    panel: Panel<GeoEstimate>,
    source: Option<Arc<dyn LocationSource>>,
}

impl GeoPanel {
    /// `source` is `None` on platforms without geolocation.
    pub fn new(source: Option<Arc<dyn LocationSource>>) -> Self {
        Self {
            panel: Panel::new("geo"),
            source,
        }
    }

    pub fn state(&self) -> PanelState<GeoEstimate> {
        self.panel.snapshot()
    }

    pub fn panel(&self) -> &Panel<GeoEstimate> {
        &self.panel
    }

    pub fn estimate(&self, client: &BackendClient) -> JoinHandle<bool> {
        let client = client.clone();
        let source = self.source.clone();
        self.panel.spawn(async move {
            let coordinates = acquire_location(source.as_deref(), PositionOptions::default())
                .await
                .map_err(|e| e.to_string())?;
            let estimate = client
                .estimate_geo(coordinates)
                .await
                .map_err(|_| GEO_FETCH_FAILED.to_string())?;
            Ok(GeoEstimate { estimate, coordinates })
        })
    }

    pub fn unmount(&self) {
        self.panel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconciler::Phase;

    #[tokio::test]
    async fn test_unsupported_platform_message() {
        let panel = GeoPanel::new(None);
        let client = BackendClient::new("http://127.0.0.1:9");
        assert!(panel.estimate(&client).await.unwrap());

        let state = panel.state();
        assert_eq!(state.phase, Phase::Failed);
        assert_eq!(state.error.as_deref(), Some("Geolocation not supported"));
    }
}
