//! Wire types returned by the estimation backend.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// Named readings attached to an estimate.
///
/// Values stay as raw JSON so that one unexpected field never fails the
/// decode of the whole response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metrics(BTreeMap<String, Value>);

impl Metrics {
    pub fn reading(&self, name: &str) -> Option<f64> {
        self.0.get(name).and_then(Value::as_f64)
    }

    /// Raw value as the backend sent it, for fields that are not numeric.
    pub fn raw(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }
}

/// Result of `POST /api/estimate/camera` and `POST /api/estimate/geo`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EstimateResult {
    #[serde(default, deserialize_with = "lenient_aqi")]
    pub aqi: Option<i64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub category: String,
    #[serde(default, deserialize_with = "lenient_metrics")]
    pub metrics: Metrics,
    #[serde(default, deserialize_with = "lenient_text")]
    pub note: Option<String>,
}

/// A geolocation estimate together with the fix that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoEstimate {
    pub estimate: EstimateResult,
    pub coordinates: Coordinates,
}

/// Result of `GET /api/recommendations`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationSet {
    #[serde(default, deserialize_with = "lenient_string")]
    pub category: String,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub recommendations: Vec<String>,
}

/// One past check as stored by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(default, alias = "_id", deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub source: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient_aqi")]
    pub aqi: Option<i64>,
    #[serde(default, deserialize_with = "lenient_metrics")]
    pub metrics: Metrics,
    #[serde(default, deserialize_with = "lenient_string")]
    pub created_at: String,
}

impl HistoryEntry {
    /// Parses `created_at` as RFC 3339, falling back to a naive ISO-8601
    /// timestamp interpreted as UTC.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        if let Ok(ts) = DateTime::parse_from_rfc3339(&self.created_at) {
            return Some(ts.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(&self.created_at, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }
}

/// Envelope of `GET /api/tips`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TipsResponse {
    #[serde(default, deserialize_with = "lenient_strings")]
    pub tips: Vec<String>,
}

/// Envelope of `GET /api/history`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryResponse {
    #[serde(default, deserialize_with = "lenient_entries")]
    pub items: Vec<HistoryEntry>,
}

/// Accepts integers, rounds floats and maps anything else to `None`.
fn lenient_aqi<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }))
}

/// Strings pass through, numbers and booleans become their text, anything
/// else is `None`.
fn text_of(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(text_of))
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_text(deserializer)?.unwrap_or_default())
}

/// A list of strings; entries without a textual form are skipped.
fn lenient_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items.into_iter().filter_map(text_of).collect(),
        _ => Vec::new(),
    })
}

/// Anything but a JSON object reads as no metrics.
fn lenient_metrics<'de, D>(deserializer: D) -> Result<Metrics, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Object(map)) => Metrics(map.into_iter().collect()),
        _ => Metrics::default(),
    })
}

/// History items that are not objects are dropped; the rest are kept in order.
fn lenient_entries<'de, D>(deserializer: D) -> Result<Vec<HistoryEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter(Value::is_object)
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_estimate_full_payload() {
        let raw = json!({
            "aqi": 87,
            "category": "Moderate",
            "metrics": {"mean_saturation": 0.42, "contrast": 31.5, "haze_index": 0.2},
            "note": "Heuristic estimate"
        });
        let est: EstimateResult = serde_json::from_value(raw).unwrap();
        assert_eq!(est.aqi, Some(87));
        assert_eq!(est.category, "Moderate");
        assert_eq!(est.metrics.reading("contrast"), Some(31.5));
        assert_eq!(est.note.as_deref(), Some("Heuristic estimate"));
    }

    #[test]
    fn test_estimate_missing_aqi_is_none() {
        let est: EstimateResult = serde_json::from_value(json!({"category": "Unknown"})).unwrap();
        assert_eq!(est.aqi, None);
        assert!(est.metrics.is_empty());
    }

    #[test]
    fn test_estimate_tolerates_odd_aqi_values() {
        let est: EstimateResult = serde_json::from_value(json!({"aqi": 41.6})).unwrap();
        assert_eq!(est.aqi, Some(42));
        let est: EstimateResult = serde_json::from_value(json!({"aqi": "n/a"})).unwrap();
        assert_eq!(est.aqi, None);
        let est: EstimateResult = serde_json::from_value(json!({"aqi": null, "metrics": null})).unwrap();
        assert_eq!(est.aqi, None);
        assert!(est.metrics.is_empty());
    }

    #[test]
    fn test_metrics_non_numeric_value_is_kept_raw() {
        let est: EstimateResult =
            serde_json::from_value(json!({"metrics": {"pm25": "unavailable"}})).unwrap();
        assert_eq!(est.metrics.reading("pm25"), None);
        assert_eq!(est.metrics.raw("pm25"), Some(&json!("unavailable")));
    }

    #[test]
    fn test_history_entry_accepts_mongo_id() {
        let entry: HistoryEntry = serde_json::from_value(json!({
            "_id": "65f0c1",
            "source": "geo",
            "category": "Good",
            "aqi": 20,
            "metrics": {"pm25": 4.1},
            "created_at": "2024-03-12T09:30:00.123456"
        }))
        .unwrap();
        assert_eq!(entry.id, "65f0c1");
        let ts = entry.created_at().unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-03-12T09:30:00.123456+00:00");
    }

    #[test]
    fn test_history_entry_rfc3339_timestamp() {
        let entry = HistoryEntry {
            created_at: "2024-03-12T09:30:00+02:00".into(),
            ..Default::default()
        };
        assert_eq!(entry.created_at().unwrap().to_rfc3339(), "2024-03-12T07:30:00+00:00");

        let garbage = HistoryEntry { created_at: "yesterday".into(), ..Default::default() };
        assert!(garbage.created_at().is_none());
    }

    #[test]
    fn test_estimate_tolerates_non_string_text_fields() {
        let est: EstimateResult =
            serde_json::from_value(json!({"aqi": 50, "category": "Good", "note": 3})).unwrap();
        assert_eq!(est.aqi, Some(50));
        assert_eq!(est.note.as_deref(), Some("3"));

        let est: EstimateResult =
            serde_json::from_value(json!({"aqi": 50, "category": {"label": "Good"}, "note": null}))
                .unwrap();
        assert_eq!(est.aqi, Some(50));
        assert_eq!(est.category, "");
        assert_eq!(est.note, None);
    }

    #[test]
    fn test_history_keeps_items_with_odd_fields() {
        let history: HistoryResponse = serde_json::from_value(json!({"items": [
            {"_id": "a", "source": "geo", "category": "Good", "aqi": 20,
             "metrics": {}, "created_at": "2024-03-12T09:30:00Z"},
            {"_id": "b", "source": null, "category": 4, "aqi": null,
             "metrics": null, "created_at": null},
            {"id": 7, "source": "camera", "created_at": 1710235800},
            "stray"
        ]}))
        .unwrap();

        assert_eq!(history.items.len(), 3);
        assert_eq!(history.items[0].id, "a");
        let odd = &history.items[1];
        assert_eq!(odd.id, "b");
        assert_eq!(odd.source, "");
        assert_eq!(odd.category.as_deref(), Some("4"));
        assert_eq!(odd.created_at, "");
        assert!(odd.created_at().is_none());
        assert_eq!(history.items[2].id, "7");
        assert_eq!(history.items[2].created_at, "1710235800");
    }

    #[test]
    fn test_string_lists_skip_non_text_entries() {
        let recs: RecommendationSet = serde_json::from_value(json!({
            "category": "Moderate",
            "recommendations": ["Limit exertion", null, {"x": 1}, "Close windows"]
        }))
        .unwrap();
        assert_eq!(recs.recommendations, vec!["Limit exertion", "Close windows"]);
        let est: EstimateResult = serde_json::from_value(json!({"aqi": 9, "metrics": "n/a"})).unwrap();
        assert!(est.metrics.is_empty());
        let tips: TipsResponse = serde_json::from_value(json!({"tips": "not a list"})).unwrap();
        assert!(tips.tips.is_empty());
    }

    #[test]
    fn test_envelopes_default_to_empty() {
        let tips: TipsResponse = serde_json::from_value(json!({})).unwrap();
        assert!(tips.tips.is_empty());
        let history: HistoryResponse = serde_json::from_value(json!({"items": null})).unwrap();
        assert!(history.items.is_empty());
        let recs: RecommendationSet = serde_json::from_value(json!({"category": "Good"})).unwrap();
        assert!(recs.recommendations.is_empty());
    }
}
