//! AQI Vision
//!
//! Client for an air-quality estimation backend:
//! - Camera and geolocation capture behind uniform capability traits
//! - Typed request builders and an async HTTP client (reqwest)
//! - Per-panel request reconciliation with stale-response rejection
//! - Best-effort history and tips loading
//! - Terminal dashboard (ratatui)

pub mod api;
pub mod capability;
pub mod config;
pub mod error;
pub mod loader;
pub mod reconciler;
pub mod shell;
pub mod telemetry;

// Re-exports for convenience
pub use api::BackendClient;
pub use config::Config;
pub use reconciler::{Panel, PanelState, Phase};
pub use shell::Dashboard;
