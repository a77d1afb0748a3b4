//! Camera streams and single-frame capture.

use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{CapabilityError, CaptureError};

/// JPEG quality used when serializing a captured frame.
pub const JPEG_QUALITY: u8 = 90;

/// Which way the requested camera should face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Facing {
    User,
    /// Rear-facing camera, pointed at the scene rather than the user.
    #[default]
    Environment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Video,
    Audio,
}

/// Uncompressed RGB8 frame at the source's native resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

/// A captured frame encoded as JPEG.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBlob {
    bytes: Vec<u8>,
    width: u32,
    height: u32,
}

impl FrameBlob {
    pub fn new(bytes: Vec<u8>, width: u32, height: u32) -> Self {
        Self { bytes, width, height }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// One track of a live capture stream.
pub trait MediaTrack: Send {
    fn kind(&self) -> TrackKind;

    fn label(&self) -> &str;

    /// The most recent frame. Only meaningful for video tracks.
    fn read_frame(&mut self) -> Result<RawFrame, CaptureError>;

    /// Stops the track and releases the underlying device.
    fn stop(&mut self);
}

/// A live capture stream owning its tracks.
///
/// Releasing consumes the stream, so it cannot be used afterwards. Dropping
/// an unreleased stream stops its tracks as well; either way every track is
/// stopped exactly once.
pub struct MediaStream {
    tracks: Vec<Box<dyn MediaTrack>>,
    stopped: bool,
}

impl MediaStream {
    pub fn new(tracks: Vec<Box<dyn MediaTrack>>) -> Self {
        Self { tracks, stopped: false }
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn release(mut self) {
        self.stop_tracks();
    }

    fn stop_tracks(&mut self) {
        if self.stopped {
            return;
        }
        for track in self.tracks.iter_mut() {
            debug!("Stopping {:?} track '{}'", track.kind(), track.label());
            track.stop();
        }
        self.stopped = true;
    }

    fn video_track(&mut self) -> Option<&mut Box<dyn MediaTrack>> {
        self.tracks.iter_mut().find(|t| t.kind() == TrackKind::Video)
    }
}

impl Drop for MediaStream {
    fn drop(&mut self) {
        self.stop_tracks();
    }
}

impl std::fmt::Debug for MediaStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaStream")
            .field("tracks", &self.tracks.len())
            .field("stopped", &self.stopped)
            .finish()
    }
}

/// Device that can open a live video stream.
#[async_trait]
pub trait CameraSource: Send + Sync {
    async fn acquire(&self, facing: Facing) -> Result<MediaStream, CapabilityError>;
}

/// Grabs the current frame of `stream` and encodes it as JPEG.
pub fn capture_frame(stream: &mut MediaStream) -> Result<FrameBlob, CaptureError> {
    let track = stream.video_track().ok_or(CaptureError::NoFrame)?;
    let frame = track.read_frame()?;
    encode_jpeg(frame)
}

pub fn encode_jpeg(frame: RawFrame) -> Result<FrameBlob, CaptureError> {
    let RawFrame { width, height, rgb } = frame;
    if width == 0 || height == 0 || rgb.is_empty() {
        return Err(CaptureError::NoFrame);
    }

    let image = RgbImage::from_raw(width, height, rgb).ok_or_else(|| {
        CaptureError::Device(format!("frame buffer does not match {}x{}", width, height))
    })?;

    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY).encode_image(&image)?;
    Ok(FrameBlob::new(bytes, width, height))
}

/// Serves a fixed image as its only frame.
///
/// Used for headless runs (`--image`) where no webcam is attached.
#[derive(Clone)]
pub struct StillCamera {
    image: Arc<RgbImage>,
}

impl StillCamera {
    pub fn new(image: RgbImage) -> Self {
        Self { image: Arc::new(image) }
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self, CaptureError> {
        let image = image::open(path.as_ref())?.to_rgb8();
        info!(
            "Still camera loaded {} ({}x{})",
            path.as_ref().display(),
            image.width(),
            image.height()
        );
        Ok(Self::new(image))
    }
}

#[async_trait]
impl CameraSource for StillCamera {
    async fn acquire(&self, _facing: Facing) -> Result<MediaStream, CapabilityError> {
        Ok(MediaStream::new(vec![Box::new(StillTrack {
            image: Some(self.image.clone()),
        })]))
    }
}

struct StillTrack {
    image: Option<Arc<RgbImage>>,
}

impl MediaTrack for StillTrack {
    fn kind(&self) -> TrackKind {
        TrackKind::Video
    }

    fn label(&self) -> &str {
        "still image"
    }

    fn read_frame(&mut self) -> Result<RawFrame, CaptureError> {
        let image = self.image.as_ref().ok_or(CaptureError::NoFrame)?;
        Ok(RawFrame {
            width: image.width(),
            height: image.height(),
            rgb: image.as_raw().clone(),
        })
    }

    fn stop(&mut self) {
        self.image = None;
    }
}
