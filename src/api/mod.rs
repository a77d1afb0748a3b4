//! Backend API Module
//!
//! Request shapes, wire types and the HTTP client for the estimation
//! backend.

mod client;
pub mod request;
pub mod types;

pub use client::BackendClient;
pub use request::ApiRequest;
pub use types::{
    Coordinates, EstimateResult, GeoEstimate, HistoryEntry, Metrics, RecommendationSet,
};
