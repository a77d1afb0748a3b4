//! Capability Acquirer
//!
//! Device camera and geolocation behind uniform "acquire or fail" traits.
//! Concrete sources are chosen at startup; panels only see the traits.

mod camera;
mod location;
#[cfg(feature = "native-camera")]
mod native;

pub use camera::{
    capture_frame, encode_jpeg, CameraSource, Facing, FrameBlob, MediaStream, MediaTrack,
    RawFrame, StillCamera, TrackKind, JPEG_QUALITY,
};
pub use location::{acquire_location, FixedLocation, LocationSource, PositionOptions, LOCATION_TIMEOUT};
#[cfg(feature = "native-camera")]
pub use native::NativeCamera;

use crate::api::types::Coordinates;

/// Raw input of a single estimation request.
#[derive(Debug, Clone, PartialEq)]
pub enum CapabilityReading {
    Frame(FrameBlob),
    Location(Coordinates),
}

impl From<CapabilityReading> for crate::api::ApiRequest {
    fn from(reading: CapabilityReading) -> Self {
        match reading {
            CapabilityReading::Frame(blob) => crate::api::ApiRequest::CameraEstimate(blob),
            CapabilityReading::Location(coords) => crate::api::ApiRequest::GeoEstimate(coords),
        }
    }
}
