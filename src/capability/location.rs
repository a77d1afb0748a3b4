//! One-shot position fixes.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use crate::api::types::Coordinates;
use crate::error::CapabilityError;

pub const LOCATION_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: LOCATION_TIMEOUT,
        }
    }
}

/// A platform geolocation provider.
#[async_trait]
pub trait LocationSource: Send + Sync {
    async fn locate(&self, options: PositionOptions) -> Result<Coordinates, CapabilityError>;
}

/// Acquires a single fix, enforcing `options.timeout`.
///
/// `None` means the platform exposes no geolocation at all.
pub async fn acquire_location(
    source: Option<&dyn LocationSource>,
    options: PositionOptions,
) -> Result<Coordinates, CapabilityError> {
    let source = source.ok_or(CapabilityError::LocationUnsupported)?;

    match tokio::time::timeout(options.timeout, source.locate(options)).await {
        Ok(Ok(coords)) => {
            debug!("Location fix: {:.3}, {:.3}", coords.latitude, coords.longitude);
            Ok(coords)
        }
        Ok(Err(e)) => {
            warn!("Location request failed: {}", e);
            Err(e)
        }
        Err(_) => {
            warn!("Location request timed out after {:?}", options.timeout);
            Err(CapabilityError::Location("Timeout expired".to_string()))
        }
    }
}

/// Reports a configured position, for desktops without a positioning device.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub Coordinates);

#[async_trait]
impl LocationSource for FixedLocation {
    async fn locate(&self, _options: PositionOptions) -> Result<Coordinates, CapabilityError> {
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Stalled;

    #[async_trait]
    impl LocationSource for Stalled {
        async fn locate(&self, _options: PositionOptions) -> Result<Coordinates, CapabilityError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(Coordinates::new(0.0, 0.0))
        }
    }

    struct Refusing;

    #[async_trait]
    impl LocationSource for Refusing {
        async fn locate(&self, _options: PositionOptions) -> Result<Coordinates, CapabilityError> {
            Err(CapabilityError::Location("User denied Geolocation".into()))
        }
    }

    #[test]
    fn test_default_options() {
        let opts = PositionOptions::default();
        assert!(opts.high_accuracy);
        assert_eq!(opts.timeout, Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_missing_source_is_unsupported() {
        let err = acquire_location(None, PositionOptions::default()).await.unwrap_err();
        assert_eq!(err, CapabilityError::LocationUnsupported);
        assert_eq!(err.to_string(), "Geolocation not supported");
    }

    #[tokio::test]
    async fn test_fixed_location() {
        let source = FixedLocation(Coordinates::new(48.85, 2.35));
        let coords = acquire_location(Some(&source), PositionOptions::default()).await;
        tokio_test::assert_ok!(&coords);
        assert_eq!(coords.unwrap(), Coordinates::new(48.85, 2.35));
    }

    #[tokio::test]
    async fn test_platform_message_is_kept() {
        let err = acquire_location(Some(&Refusing), PositionOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "User denied Geolocation");
    }

    #[tokio::test]
    async fn test_timeout_becomes_location_error() {
        let opts = PositionOptions {
            high_accuracy: true,
            timeout: Duration::from_millis(20),
        };
        let err = acquire_location(Some(&Stalled), opts).await.unwrap_err();
        assert_eq!(err, CapabilityError::Location("Timeout expired".into()));
    }
}
