//! Outbound request shapes.
//!
//! Each variant knows its method, path and body encoding; the client only
//! sends what is built here.

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;

use crate::api::types::Coordinates;
use crate::capability::FrameBlob;
use crate::error::ApiError;

pub const CAMERA_ESTIMATE_PATH: &str = "/api/estimate/camera";
pub const GEO_ESTIMATE_PATH: &str = "/api/estimate/geo";
pub const RECOMMENDATIONS_PATH: &str = "/api/recommendations";
pub const TIPS_PATH: &str = "/api/tips";
pub const HISTORY_PATH: &str = "/api/history";

/// Multipart field carrying the captured frame.
pub const FRAME_FIELD: &str = "file";
pub const FRAME_FILENAME: &str = "frame.jpg";
pub const FRAME_MIME: &str = "image/jpeg";

#[derive(Debug, Clone, PartialEq)]
pub enum ApiRequest {
    CameraEstimate(FrameBlob),
    GeoEstimate(Coordinates),
    Recommendations(String),
    Tips,
    History,
}

#[derive(Serialize)]
struct GeoBody {
    lat: f64,
    lon: f64,
}

impl ApiRequest {
    pub fn method(&self) -> Method {
        match self {
            ApiRequest::CameraEstimate(_) | ApiRequest::GeoEstimate(_) => Method::POST,
            ApiRequest::Recommendations(_) | ApiRequest::Tips | ApiRequest::History => Method::GET,
        }
    }

    /// Path and query, relative to the backend base URL.
    pub fn path(&self) -> String {
        match self {
            ApiRequest::CameraEstimate(_) => CAMERA_ESTIMATE_PATH.to_string(),
            ApiRequest::GeoEstimate(_) => GEO_ESTIMATE_PATH.to_string(),
            ApiRequest::Recommendations(category) => format!(
                "{}?category={}",
                RECOMMENDATIONS_PATH,
                urlencoding::encode(category)
            ),
            ApiRequest::Tips => TIPS_PATH.to_string(),
            ApiRequest::History => HISTORY_PATH.to_string(),
        }
    }

    pub fn url(&self, base_url: &str) -> String {
        format!("{}{}", base_url.trim_end_matches('/'), self.path())
    }

    /// Short label used in log lines.
    pub fn label(&self) -> &'static str {
        match self {
            ApiRequest::CameraEstimate(_) => "estimate/camera",
            ApiRequest::GeoEstimate(_) => "estimate/geo",
            ApiRequest::Recommendations(_) => "recommendations",
            ApiRequest::Tips => "tips",
            ApiRequest::History => "history",
        }
    }

    pub fn build(self, client: &Client, base_url: &str) -> Result<RequestBuilder, ApiError> {
        let request = client.request(self.method(), self.url(base_url));
        let request = match self {
            ApiRequest::CameraEstimate(frame) => {
                let part = Part::bytes(frame.into_bytes())
                    .file_name(FRAME_FILENAME)
                    .mime_str(FRAME_MIME)
                    .map_err(ApiError::Build)?;
                request.multipart(Form::new().part(FRAME_FIELD, part))
            }
            ApiRequest::GeoEstimate(coords) => request.json(&GeoBody {
                lat: coords.latitude,
                lon: coords.longitude,
            }),
            ApiRequest::Recommendations(_) | ApiRequest::Tips | ApiRequest::History => request,
        };
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::CONTENT_TYPE;

    const BASE: &str = "http://localhost:8000";

    #[test]
    fn test_paths_and_methods() {
        assert_eq!(ApiRequest::Tips.url(BASE), "http://localhost:8000/api/tips");
        assert_eq!(ApiRequest::History.url("http://backend:9000/"), "http://backend:9000/api/history");
        assert_eq!(ApiRequest::Tips.method(), Method::GET);
        assert_eq!(
            ApiRequest::GeoEstimate(Coordinates::new(1.0, 2.0)).method(),
            Method::POST
        );
    }

    #[test]
    fn test_recommendations_category_is_urlencoded() {
        let req = ApiRequest::Recommendations("Unhealthy for Sensitive".into());
        assert_eq!(req.path(), "/api/recommendations?category=Unhealthy%20for%20Sensitive");
        let req = ApiRequest::Recommendations("A&B=C".into());
        assert_eq!(req.path(), "/api/recommendations?category=A%26B%3DC");
    }

    #[test]
    fn test_geo_request_is_json() {
        let client = Client::new();
        let request = ApiRequest::GeoEstimate(Coordinates::new(52.5, 13.25))
            .build(&client, BASE)
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(request.method(), Method::POST);
        assert_eq!(request.url().as_str(), "http://localhost:8000/api/estimate/geo");
        assert_eq!(request.headers()[CONTENT_TYPE], "application/json");
        let body: serde_json::Value =
            serde_json::from_slice(request.body().unwrap().as_bytes().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"lat": 52.5, "lon": 13.25}));
    }

    #[test]
    fn test_camera_request_is_multipart() {
        let client = Client::new();
        let frame = FrameBlob::new(vec![0xFF, 0xD8, 0xFF, 0xD9], 2, 2);
        let request = ApiRequest::CameraEstimate(frame)
            .build(&client, BASE)
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(request.url().path(), CAMERA_ESTIMATE_PATH);
        let content_type = request.headers()[CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.starts_with("multipart/form-data; boundary="));
    }

    #[test]
    fn test_get_requests_have_no_body() {
        let client = Client::new();
        let request = ApiRequest::Recommendations("Good".into())
            .build(&client, BASE)
            .unwrap()
            .build()
            .unwrap();
        assert!(request.body().is_none());
        assert_eq!(request.url().query(), Some("category=Good"));
    }
}
