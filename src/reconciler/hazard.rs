use std::sync::{Mutex, PoisonError};
use tokio::task::JoinHandle;

use super::panel::{Panel, PanelState};
use crate::api::{BackendClient, RecommendationSet};

pub const DEFAULT_CATEGORY: &str = "Hazardous";
pub const RECOMMENDATIONS_FAILED: &str = "Failed to load recommendations";

/// Categories offered as quick selectors, worst first.
pub const CATEGORIES: [&str; 6] = [
    "Hazardous",
    "Very Unhealthy",
    "Unhealthy",
    "Unhealthy for Sensitive",
    "Moderate",
    "Good",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeTone {
    Red,
    Fuchsia,
    Yellow,
}

impl BadgeTone {
    pub fn for_category(category: &str) -> Self {
        let category = category.to_lowercase();
        if category.contains("hazard") {
            BadgeTone::Red
        } else if category.contains("very") {
            BadgeTone::Fuchsia
        } else {
            BadgeTone::Yellow
        }
    }
}

/// "Immediate Measures" panel: recommendations for a selected category.
pub struct HazardPanel {
    panel: Panel<RecommendationSet>,
    selected: Mutex<String>,
}

impl Default for HazardPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl HazardPanel {
    pub fn new() -> Self {
        Self {
            panel: Panel::new("hazard"),
            selected: Mutex::new(DEFAULT_CATEGORY.to_string()),
        }
    }

    pub fn state(&self) -> PanelState<RecommendationSet> {
        self.panel.snapshot()
    }

    pub fn panel(&self) -> &Panel<RecommendationSet> {
        &self.panel
    }

    pub fn selected(&self) -> String {
        self.selected.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Initial fetch for the default category.
    pub fn mount(&self, client: &BackendClient) -> JoinHandle<bool> {
        self.select(client, DEFAULT_CATEGORY)
    }

    pub fn select(&self, client: &BackendClient, category: &str) -> JoinHandle<bool> {
        *self.selected.lock().unwrap_or_else(PoisonError::into_inner) = category.to_string();

        let client = client.clone();
        let category = category.to_string();
        self.panel.spawn(async move {
            client
                .recommendations(&category)
                .await
                .map_err(|_| RECOMMENDATIONS_FAILED.to_string())
        })
    }

    /// Badge label and tone: the category the backend answered with, or the
    /// selected one while there is no answer to show.
    pub fn badge(&self) -> (String, BadgeTone) {
        let label = self
            .panel
            .snapshot()
            .result
            .map(|set| set.category)
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| self.selected());
        let tone = BadgeTone::for_category(&label);
        (label, tone)
    }

    pub fn unmount(&self) {
        self.panel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_badge_tones() {
        assert_eq!(BadgeTone::for_category("Hazardous"), BadgeTone::Red);
        assert_eq!(BadgeTone::for_category("Very Unhealthy"), BadgeTone::Fuchsia);
        assert_eq!(BadgeTone::for_category("Unhealthy"), BadgeTone::Yellow);
        assert_eq!(BadgeTone::for_category("good"), BadgeTone::Yellow);
        assert_eq!(BadgeTone::for_category(""), BadgeTone::Yellow);
    }

    #[test]
    fn test_default_badge_before_any_response() {
        let panel = HazardPanel::new();
        assert_eq!(panel.selected(), DEFAULT_CATEGORY);
        assert_eq!(panel.badge(), ("Hazardous".to_string(), BadgeTone::Red));
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_selected_badge() {
        let panel = HazardPanel::new();
        let client = BackendClient::new("http://127.0.0.1:9");
        assert!(panel.select(&client, "Good").await.unwrap());

        let state = panel.state();
        assert_eq!(state.error.as_deref(), Some(RECOMMENDATIONS_FAILED));
        assert!(state.result.is_none());
        assert_eq!(panel.badge(), ("Good".to_string(), BadgeTone::Yellow));
    }

    #[test]
    fn test_badge_follows_response_category() {
        let panel = HazardPanel::new();
        let ticket = panel.panel().begin();
        panel.panel().resolve(
            ticket,
            Ok(RecommendationSet {
                category: "Very Unhealthy".into(),
                recommendations: vec!["Stay indoors".into()],
            }),
        );
        assert_eq!(panel.badge(), ("Very Unhealthy".to_string(), BadgeTone::Fuchsia));
    }
}
