//! Estimate Reconciler
//!
//! Per-panel request state. Each panel is an independent asynchronous flow
//! with its own [`Panel`]; nothing is shared between panels.

mod camera;
mod geo;
mod hazard;
mod panel;

pub use camera::{CameraPanel, CAMERA_DENIED_MESSAGE, CAMERA_ESTIMATE_FAILED};
pub use geo::{GeoPanel, GEO_FETCH_FAILED};
pub use hazard::{BadgeTone, HazardPanel, CATEGORIES, DEFAULT_CATEGORY, RECOMMENDATIONS_FAILED};
pub use panel::{Panel, PanelState, Phase, Ticket};
