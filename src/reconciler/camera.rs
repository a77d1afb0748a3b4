use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::panel::{Panel, PanelState};
use crate::api::{BackendClient, EstimateResult};
use crate::capability::{capture_frame, CameraSource, Facing, MediaStream};

pub const CAMERA_DENIED_MESSAGE: &str = "Camera access denied or unavailable";
pub const CAMERA_ESTIMATE_FAILED: &str = "Failed to estimate";

/// Camera AQI panel: owns the live stream and the estimate state.
pub struct CameraPanel {
    panel: Panel<EstimateResult>,
    stream: Mutex<Option<MediaStream>>,
}

impl Default for CameraPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraPanel {
    pub fn new() -> Self {
        Self {
            panel: Panel::new("camera"),
            stream: Mutex::new(None),
        }
    }

    pub fn state(&self) -> PanelState<EstimateResult> {
        self.panel.snapshot()
    }

    pub fn panel(&self) -> &Panel<EstimateResult> {
        &self.panel
    }

    pub fn is_streaming(&self) -> bool {
        self.stream().is_some()
    }

    /// Opens the rear-facing camera. A no-op while a stream is already live.
    pub async fn enable(&self, source: &dyn CameraSource) -> bool {
        if self.is_streaming() {
            return true;
        }

        match source.acquire(Facing::Environment).await {
            Ok(stream) => {
                info!("Camera enabled ({} tracks)", stream.track_count());
                // A concurrent enable may have won; the loser's stream is dropped and stopped.
                let _ = self.stream().get_or_insert(stream);
                true
            }
            Err(e) => {
                warn!("Camera acquisition failed: {}", e);
                self.panel.report_error(CAMERA_DENIED_MESSAGE);
                false
            }
        }
    }

    /// Captures the current frame and sends it for estimation.
    ///
    /// Returns `None` when no stream is live.
    pub fn estimate(&self, client: &BackendClient) -> Option<JoinHandle<bool>> {
        let frame = {
            let mut guard = self.stream();
            let stream = guard.as_mut()?;
            capture_frame(stream)
        };

        let client = client.clone();
        Some(self.panel.spawn(async move {
            let frame = frame.map_err(|e| {
                warn!("Frame capture failed: {}", e);
                e.to_string()
            })?;
            client
                .estimate_camera(frame)
                .await
                .map_err(|_| CAMERA_ESTIMATE_FAILED.to_string())
        }))
    }

    /// Stops every track of the live stream. The camera can be enabled again
    /// afterwards.
    pub fn release(&self) {
        if let Some(stream) = self.stream().take() {
            stream.release();
            info!("Camera released");
        }
    }

    /// Teardown: cancels the in-flight estimate and releases the stream.
    pub fn unmount(&self) {
        self.panel.cancel();
        self.release();
    }

    fn stream(&self) -> MutexGuard<'_, Option<MediaStream>> {
        self.stream.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::StillCamera;
    use crate::error::CapabilityError;
    use crate::reconciler::Phase;
    use async_trait::async_trait;

    struct NoCamera;

    #[async_trait]
    impl CameraSource for NoCamera {
        async fn acquire(&self, _facing: Facing) -> Result<MediaStream, CapabilityError> {
            Err(CapabilityError::Denied)
        }
    }

    fn still() -> StillCamera {
        StillCamera::new(image::RgbImage::from_pixel(4, 4, image::Rgb([10, 20, 30])))
    }

    #[tokio::test]
    async fn test_enable_failure_reports_message() {
        let panel = CameraPanel::new();
        assert!(!panel.enable(&NoCamera).await);
        let state = panel.state();
        assert_eq!(state.phase, Phase::Failed);
        assert_eq!(state.error.as_deref(), Some(CAMERA_DENIED_MESSAGE));
        assert!(!panel.is_streaming());
    }

    #[tokio::test]
    async fn test_estimate_without_stream_is_noop() {
        let panel = CameraPanel::new();
        let client = BackendClient::new("http://127.0.0.1:9");
        assert!(panel.estimate(&client).is_none());
        assert_eq!(panel.state().phase, Phase::Idle);
    }

    #[tokio::test]
    async fn test_release_then_reenable() {
        let panel = CameraPanel::new();
        let camera = still();
        assert!(panel.enable(&camera).await);
        assert!(panel.is_streaming());

        panel.release();
        assert!(!panel.is_streaming());
        panel.release();

        assert!(panel.enable(&camera).await);
        assert!(panel.is_streaming());
    }

    #[tokio::test]
    async fn test_unreachable_backend_fails_panel() {
        let panel = CameraPanel::new();
        panel.enable(&still()).await;
        // Port 9 (discard) is not expected to accept HTTP connections.
        let client = BackendClient::new("http://127.0.0.1:9");

        let handle = panel.estimate(&client).unwrap();
        assert!(handle.await.unwrap());
        let state = panel.state();
        assert_eq!(state.phase, Phase::Failed);
        assert_eq!(state.error.as_deref(), Some(CAMERA_ESTIMATE_FAILED));
        assert!(state.result.is_none());
    }
}
