//! Startup configuration.
//!
//! Resolved once, before any panel is built, from the environment (and an
//! optional `.env` file) with command-line overrides on top. Nothing here
//! changes after startup.

use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::info;

use crate::api::Coordinates;
use crate::error::ConfigError;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

pub const BACKEND_URL_VAR: &str = "AQI_BACKEND_URL";
/// Name used by the web build; still honoured so one `.env` serves both.
pub const LEGACY_BACKEND_URL_VAR: &str = "VITE_BACKEND_URL";
pub const LATITUDE_VAR: &str = "AQI_LAT";
pub const LONGITUDE_VAR: &str = "AQI_LON";
pub const LOG_DIR_VAR: &str = "AQI_LOG_DIR";

const USAGE: &str = "Usage: aqi-vision [--backend <url>] [--image <path>] [--lat <deg> --lon <deg>] [--log-dir <path>]";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub backend_url: String,
    /// Fixed position reported to the geo panel; `None` means no
    /// geolocation is available.
    pub location: Option<Coordinates>,
    /// Still image used instead of a live camera.
    pub image: Option<PathBuf>,
    pub log_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            location: None,
            image: None,
            log_dir: PathBuf::from("logs"),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let backend_url = var(BACKEND_URL_VAR)
            .or_else(|| var(LEGACY_BACKEND_URL_VAR))
            .unwrap_or_else(|| {
                info!("{} not set, using default: {}", BACKEND_URL_VAR, DEFAULT_BACKEND_URL);
                DEFAULT_BACKEND_URL.to_string()
            });

        let latitude = var(LATITUDE_VAR).map(|v| parse(LATITUDE_VAR, &v)).transpose()?;
        let longitude = var(LONGITUDE_VAR).map(|v| parse(LONGITUDE_VAR, &v)).transpose()?;

        let mut config = Self {
            backend_url: normalize_url(&backend_url),
            location: None,
            image: None,
            log_dir: var(LOG_DIR_VAR).map(PathBuf::from).unwrap_or_else(|| PathBuf::from("logs")),
        };
        config.location = pair(latitude, longitude)?;
        Ok(config)
    }

    /// Applies command-line overrides (program name excluded).
    pub fn with_args(mut self, args: &[String]) -> Result<Self, ConfigError> {
        let mut latitude = self.location.map(|c| c.latitude);
        let mut longitude = self.location.map(|c| c.longitude);
        let mut iter = args.iter();

        while let Some(arg) = iter.next() {
            let mut value = || {
                iter.next()
                    .cloned()
                    .ok_or_else(|| ConfigError::MissingValue(arg.clone()))
            };
            match arg.as_str() {
                "--backend" => self.backend_url = normalize_url(&value()?),
                "--image" => self.image = Some(PathBuf::from(value()?)),
                "--lat" => latitude = Some(parse("--lat", &value()?)?),
                "--lon" => longitude = Some(parse("--lon", &value()?)?),
                "--log-dir" => self.log_dir = PathBuf::from(value()?),
                other => return Err(ConfigError::UnknownArgument(other.to_string())),
            }
        }

        self.location = pair(latitude, longitude)?;
        Ok(self)
    }

    pub fn usage() -> &'static str {
        USAGE
    }
}

fn normalize_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

fn parse<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn pair(latitude: Option<f64>, longitude: Option<f64>) -> Result<Option<Coordinates>, ConfigError> {
    match (latitude, longitude) {
        (Some(lat), Some(lon)) => Ok(Some(Coordinates::new(lat, lon))),
        (None, None) => Ok(None),
        _ => Err(ConfigError::PartialLocation),
    }
}
