//! Webcam capture through nokhwa.
//!
//! The device handle lives on a dedicated reader thread which keeps the
//! latest decoded frame in a shared slot; the track only copies it out.

use async_trait::async_trait;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{ApiBackend, CameraIndex, CameraInfo, RequestedFormat, RequestedFormatType};
use nokhwa::Camera;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use super::camera::{CameraSource, Facing, MediaStream, MediaTrack, RawFrame, TrackKind};
use crate::error::{CapabilityError, CaptureError};

const REAR_HINTS: [&str; 3] = ["back", "rear", "environment"];
const FRONT_HINTS: [&str; 3] = ["front", "user", "facetime"];

#[derive(Debug, Default, Clone, Copy)]
pub struct NativeCamera;

impl NativeCamera {
    pub fn new() -> Self {
        Self
    }
}

/// Picks the device whose name matches `facing`, else the first one.
fn pick_device(devices: &[CameraInfo], facing: Facing) -> Option<CameraIndex> {
    let hints: &[&str] = match facing {
        Facing::Environment => &REAR_HINTS,
        Facing::User => &FRONT_HINTS,
    };
    devices
        .iter()
        .find(|d| {
            let name = d.human_name().to_lowercase();
            hints.iter().any(|h| name.contains(h))
        })
        .or_else(|| devices.first())
        .map(|d| d.index().clone())
}

fn classify(err: &nokhwa::NokhwaError) -> CapabilityError {
    let msg = err.to_string().to_lowercase();
    if msg.contains("permission") || msg.contains("denied") || msg.contains("not authorized") {
        CapabilityError::Denied
    } else {
        CapabilityError::Unavailable
    }
}

#[async_trait]
impl CameraSource for NativeCamera {
    async fn acquire(&self, facing: Facing) -> Result<MediaStream, CapabilityError> {
        let devices = nokhwa::query(ApiBackend::Auto).map_err(|e| {
            warn!("Camera enumeration failed: {}", e);
            classify(&e)
        })?;
        let index = pick_device(&devices, facing).ok_or(CapabilityError::Unavailable)?;

        let latest = Arc::new(Mutex::new(None));
        let running = Arc::new(AtomicBool::new(true));
        let (ready_tx, ready_rx) = oneshot::channel();

        let reader = {
            let latest = latest.clone();
            let running = running.clone();
            thread::spawn(move || reader_loop(index, latest, running, ready_tx))
        };

        match ready_rx.await {
            Ok(Ok(label)) => {
                info!("Camera stream opened: {}", label);
                Ok(MediaStream::new(vec![Box::new(NativeTrack {
                    label,
                    latest,
                    running,
                    reader: Some(reader),
                })]))
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(CapabilityError::Unavailable),
        }
    }
}

type FrameSlot = Arc<Mutex<Option<RawFrame>>>;

fn reader_loop(
    index: CameraIndex,
    latest: FrameSlot,
    running: Arc<AtomicBool>,
    ready: oneshot::Sender<Result<String, CapabilityError>>,
) {
    let format = RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution);
    let mut camera = match Camera::new(index, format).and_then(|mut c| c.open_stream().map(|_| c)) {
        Ok(camera) => camera,
        Err(e) => {
            warn!("Failed to open camera: {}", e);
            let _ = ready.send(Err(classify(&e)));
            return;
        }
    };
    let _ = ready.send(Ok(camera.info().human_name()));

    while running.load(Ordering::Acquire) {
        let decoded = camera.frame().and_then(|buf| buf.decode_image::<RgbFormat>());
        match decoded {
            Ok(image) => {
                let frame = RawFrame {
                    width: image.width(),
                    height: image.height(),
                    rgb: image.into_raw(),
                };
                *latest.lock().unwrap_or_else(PoisonError::into_inner) = Some(frame);
            }
            Err(e) => debug!("Dropped camera frame: {}", e),
        }
    }

    if let Err(e) = camera.stop_stream() {
        warn!("Failed to stop camera stream: {}", e);
    }
}

struct NativeTrack {
    label: String,
    latest: FrameSlot,
    running: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
}

impl MediaTrack for NativeTrack {
    fn kind(&self) -> TrackKind {
        TrackKind::Video
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn read_frame(&mut self) -> Result<RawFrame, CaptureError> {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(CaptureError::NoFrame)
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(reader) = self.reader.take() {
            if reader.join().is_err() {
                warn!("Camera reader thread panicked");
            }
        }
    }
}
