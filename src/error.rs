//! Error taxonomy shared across the client.
//!
//! Panels never surface these types directly; they are flattened into a
//! short message at the panel boundary (see [`crate::reconciler`]).

use thiserror::Error;

/// Failures while acquiring a device capability (camera or geolocation).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CapabilityError {
    /// The user refused the permission prompt.
    #[error("Camera access denied")]
    Denied,
    /// No device of the requested kind exists.
    #[error("Camera unavailable")]
    Unavailable,
    /// The platform offers no geolocation at all.
    #[error("Geolocation not supported")]
    LocationUnsupported,
    /// Permission denial, timeout or any other platform failure. Carries the
    /// platform's own message.
    #[error("{0}")]
    Location(String),
}

/// Failures while grabbing and encoding a single frame.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no video frame available yet")]
    NoFrame,
    #[error("failed to encode frame: {0}")]
    Encode(#[from] image::ImageError),
    /// The device delivered a frame that does not match its own geometry.
    #[error("capture device error: {0}")]
    Device(String),
}

/// Failures talking to the estimation backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport level failure (connection refused, reset, DNS...).
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),
    /// The backend answered with a non-2xx status.
    #[error("backend returned HTTP {0}")]
    Status(reqwest::StatusCode),
    /// The body could not be decoded into the expected shape.
    #[error("malformed response: {0}")]
    Malformed(String),
    /// The request itself could not be assembled.
    #[error("failed to build request: {0}")]
    Build(#[source] reqwest::Error),
}

/// Invalid startup configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },
    #[error("missing value after {0}")]
    MissingValue(String),
    #[error("unknown argument {0:?}")]
    UnknownArgument(String),
    #[error("latitude and longitude must be given together")]
    PartialLocation,
}
