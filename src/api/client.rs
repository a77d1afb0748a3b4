use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::api::request::ApiRequest;
use crate::api::types::{
    Coordinates, EstimateResult, HistoryEntry, HistoryResponse, RecommendationSet, TipsResponse,
};
use crate::capability::{CapabilityReading, FrameBlob};
use crate::error::ApiError;

/// HTTP client for the estimation backend.
///
/// Cheap to clone; clones share the underlying connection pool. No request
/// timeout is configured and nothing is retried.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(
            Client::builder()
                .user_agent(concat!("aqi-vision/", env!("CARGO_PKG_VERSION")))
                .build()
                .unwrap_or_default(),
            base_url,
        )
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Posts a captured frame or a position fix to the matching estimate
    /// endpoint.
    pub async fn estimate(&self, reading: CapabilityReading) -> Result<EstimateResult, ApiError> {
        self.send(reading.into()).await
    }

    pub async fn estimate_camera(&self, frame: FrameBlob) -> Result<EstimateResult, ApiError> {
        self.estimate(CapabilityReading::Frame(frame)).await
    }

    pub async fn estimate_geo(&self, coords: Coordinates) -> Result<EstimateResult, ApiError> {
        self.estimate(CapabilityReading::Location(coords)).await
    }

    pub async fn recommendations(&self, category: &str) -> Result<RecommendationSet, ApiError> {
        self.send(ApiRequest::Recommendations(category.to_string())).await
    }

    pub async fn tips(&self) -> Result<Vec<String>, ApiError> {
        let envelope: TipsResponse = self.send(ApiRequest::Tips).await?;
        Ok(envelope.tips)
    }

    pub async fn history(&self) -> Result<Vec<HistoryEntry>, ApiError> {
        let envelope: HistoryResponse = self.send(ApiRequest::History).await?;
        Ok(envelope.items)
    }

    async fn send<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let label = request.label();
        debug!("{} {}", request.method(), request.url(&self.base_url));

        let response = request
            .build(&self.http, &self.base_url)?
            .send()
            .await
            .map_err(|e| {
                warn!("Backend call {} failed: {}", label, e);
                ApiError::Network(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!("Backend call {} returned {}", label, status);
            return Err(ApiError::Status(status));
        }

        let body = response.bytes().await.map_err(ApiError::Network)?;
        serde_json::from_slice(&body).map_err(|e| {
            warn!("Backend call {} returned an undecodable body: {}", label, e);
            ApiError::Malformed(e.to_string())
        })
    }
}
