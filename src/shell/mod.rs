//! Presentation Shell
//!
//! Composes the panels into one dashboard and owns their lifecycle: mount
//! fires the one-shot loads, unmount cancels whatever is still running and
//! gives the camera back.

pub mod render;
pub mod tui;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

use crate::api::BackendClient;
use crate::capability::{CameraSource, FixedLocation, LocationSource, StillCamera};
use crate::config::Config;
use crate::error::CaptureError;
use crate::loader::{HistoryLoader, TipsLoader};
use crate::reconciler::{CameraPanel, GeoPanel, HazardPanel, CAMERA_DENIED_MESSAGE};

pub use tui::DashboardTui;

pub struct Dashboard {
    client: BackendClient,
    camera_source: Option<Arc<dyn CameraSource>>,
    pub camera: Arc<CameraPanel>,
    pub geo: Arc<GeoPanel>,
    pub hazard: Arc<HazardPanel>,
    pub tips: Arc<TipsLoader>,
    pub history: Arc<HistoryLoader>,
    mounted: AtomicBool,
}

/// Background work started by [`Dashboard::mount`].
pub struct Mounted {
    pub tips: JoinHandle<()>,
    pub history: JoinHandle<()>,
    pub hazard: JoinHandle<bool>,
}

impl Mounted {
    /// Waits for every initial load to finish.
    pub async fn settle(self) {
        let _ = tokio::join!(self.tips, self.history, self.hazard);
    }
}

impl Dashboard {
    pub fn new(
        client: BackendClient,
        camera_source: Option<Arc<dyn CameraSource>>,
        location_source: Option<Arc<dyn LocationSource>>,
    ) -> Self {
        Self {
            client,
            camera_source,
            camera: Arc::new(CameraPanel::new()),
            geo: Arc::new(GeoPanel::new(location_source)),
            hazard: Arc::new(HazardPanel::new()),
            tips: Arc::new(TipsLoader::tips()),
            history: Arc::new(HistoryLoader::history()),
            mounted: AtomicBool::new(false),
        }
    }

    /// Picks capability sources from the configuration: a still image when
    /// one is given, otherwise the native camera if compiled in.
    pub fn from_config(config: &Config) -> Result<Self, CaptureError> {
        let camera_source: Option<Arc<dyn CameraSource>> = match config.image {
            Some(ref path) => Some(Arc::new(StillCamera::open(path)?) as Arc<dyn CameraSource>),
            None => native_camera(),
        };
        let location_source = config
            .location
            .map(|coords| Arc::new(FixedLocation(coords)) as Arc<dyn LocationSource>);

        info!(
            "Dashboard using backend {} (camera: {}, location: {})",
            config.backend_url,
            camera_source.is_some(),
            location_source.is_some()
        );
        Ok(Self::new(
            BackendClient::new(config.backend_url.clone()),
            camera_source,
            location_source,
        ))
    }

    pub fn client(&self) -> &BackendClient {
        &self.client
    }

    /// Starts the tips and history loads and the first recommendations
    /// fetch. Only the first call does anything.
    pub fn mount(&self) -> Option<Mounted> {
        if self.mounted.swap(true, Ordering::SeqCst) {
            return None;
        }

        let tips = {
            let (loader, client) = (self.tips.clone(), self.client.clone());
            tokio::spawn(async move {
                loader.fetch(&client).await;
            })
        };
        let history = {
            let (loader, client) = (self.history.clone(), self.client.clone());
            tokio::spawn(async move {
                loader.fetch(&client).await;
            })
        };
        let hazard = self.hazard.mount(&self.client);

        Some(Mounted { tips, history, hazard })
    }

    pub async fn enable_camera(&self) -> bool {
        match self.camera_source {
            Some(ref source) => self.camera.enable(source.as_ref()).await,
            None => {
                self.camera.panel().report_error(CAMERA_DENIED_MESSAGE);
                false
            }
        }
    }

    pub fn estimate_camera(&self) -> Option<JoinHandle<bool>> {
        self.camera.estimate(&self.client)
    }

    pub fn estimate_geo(&self) -> JoinHandle<bool> {
        self.geo.estimate(&self.client)
    }

    pub fn select_category(&self, category: &str) -> JoinHandle<bool> {
        self.hazard.select(&self.client, category)
    }

    pub fn unmount(&self) {
        self.camera.unmount();
        self.geo.unmount();
        self.hazard.unmount();
        info!("Dashboard unmounted");
    }
}

#[cfg(feature = "native-camera")]
fn native_camera() -> Option<Arc<dyn CameraSource>> {
    Some(Arc::new(crate::capability::NativeCamera::new()))
}

#[cfg(not(feature = "native-camera"))]
fn native_camera() -> Option<Arc<dyn CameraSource>> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconciler::Phase;

    #[tokio::test]
    async fn test_camera_without_source_reports_unavailable() {
        let dashboard = Dashboard::new(BackendClient::new("http://127.0.0.1:9"), None, None);
        assert!(!dashboard.enable_camera().await);
        let state = dashboard.camera.state();
        assert_eq!(state.phase, Phase::Failed);
        assert_eq!(state.error.as_deref(), Some(CAMERA_DENIED_MESSAGE));
    }

    #[tokio::test]
    async fn test_mount_runs_once_and_swallows_failures() {
        let dashboard = Dashboard::new(BackendClient::new("http://127.0.0.1:9"), None, None);
        let mounted = dashboard.mount().expect("first mount");
        assert!(dashboard.mount().is_none());

        mounted.settle().await;
        assert!(dashboard.tips.is_loaded());
        assert!(dashboard.tips.items().is_empty());
        assert!(dashboard.history.items().is_empty());
        assert_eq!(dashboard.hazard.state().phase, Phase::Failed);
    }

    #[test]
    fn test_from_config_with_missing_image_fails() {
        let config = Config {
            image: Some("/nonexistent/frame.jpg".into()),
            ..Config::default()
        };
        assert!(Dashboard::from_config(&config).is_err());
    }
}
