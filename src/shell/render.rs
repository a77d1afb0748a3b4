//! Panel snapshots to styled text lines.
//!
//! Kept free of any terminal so the output can be checked in tests.

use chrono::Local;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use serde_json::Value;

use crate::api::{EstimateResult, GeoEstimate, HistoryEntry, Metrics, RecommendationSet};
use crate::reconciler::{BadgeTone, PanelState, CATEGORIES};

pub const MISSING_AQI: &str = "N/A";
pub const MISSING_HISTORY_AQI: &str = "—";
pub const UNKNOWN_CATEGORY: &str = "Unknown";
pub const EMPTY_HISTORY: &str = "No history yet";

pub const ABOUT_TEXT: &str = "This app provides a heuristic estimate from the camera alongside \
nearby official readings. Camera-based AQI is an approximation based on image characteristics \
like contrast and saturation and should not be used for medical decisions.";

pub fn aqi_label(aqi: Option<i64>) -> String {
    aqi.map(|v| v.to_string()).unwrap_or_else(|| MISSING_AQI.to_string())
}

pub fn history_aqi_label(aqi: Option<i64>) -> String {
    aqi.map(|v| v.to_string())
        .unwrap_or_else(|| MISSING_HISTORY_AQI.to_string())
}

/// PM2.5 with one decimal when numeric, verbatim otherwise.
pub fn pm25_label(metrics: &Metrics) -> Option<String> {
    match metrics.raw("pm25")? {
        Value::Number(n) => n.as_f64().map(|v| format!("PM2.5: {:.1} µg/m³", v)),
        Value::Null => None,
        other => Some(format!("PM2.5: {} µg/m³", plain_value(other))),
    }
}

pub fn badge_color(tone: BadgeTone) -> Color {
    match tone {
        BadgeTone::Red => Color::Red,
        BadgeTone::Fuchsia => Color::Magenta,
        BadgeTone::Yellow => Color::Yellow,
    }
}

/// Concatenated text of a line, without styling.
pub fn line_text(line: &Line<'_>) -> String {
    line.spans.iter().map(|s| s.content.as_ref()).collect()
}

pub fn lines_text(lines: &[Line<'_>]) -> Vec<String> {
    lines.iter().map(line_text).collect()
}

fn plain_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn metric_text(metrics: &Metrics, name: &str) -> String {
    metrics
        .raw(name)
        .map(plain_value)
        .unwrap_or_else(|| MISSING_HISTORY_AQI.to_string())
}

fn action(key: char, label: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("[{}] ", key), Style::default().fg(Color::DarkGray)),
        Span::styled(label.to_string(), Style::default().fg(Color::Cyan)),
    ])
}

fn busy(label: &str) -> Line<'static> {
    Line::from(Span::styled(label.to_string(), Style::default().fg(Color::Yellow)))
}

fn error_line(message: &str) -> Line<'static> {
    Line::from(Span::styled(message.to_string(), Style::default().fg(Color::Red)))
}

fn dim(text: String) -> Line<'static> {
    Line::from(Span::styled(text, Style::default().fg(Color::Gray)))
}

fn estimate_head(result: &EstimateResult) -> Vec<Line<'static>> {
    vec![
        Line::from(Span::styled(
            format!("AQI: {}", aqi_label(result.aqi)),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        dim(format!("Category: {}", result.category)),
    ]
}

fn note_line(note: &Option<String>) -> Option<Line<'static>> {
    note.as_ref().map(|n| {
        Line::from(Span::styled(
            n.clone(),
            Style::default().add_modifier(Modifier::ITALIC).fg(Color::Gray),
        ))
    })
}

pub fn render_camera(state: &PanelState<EstimateResult>, streaming: bool) -> Vec<Line<'static>> {
    let mut lines = vec![if !streaming {
        action('c', "Enable Camera")
    } else if state.is_loading() {
        busy("Analyzing...")
    } else {
        action('e', "Estimate from Frame")
    }];

    if let Some(ref error) = state.error {
        lines.push(error_line(error));
    }

    if let Some(ref result) = state.result {
        lines.extend(estimate_head(result));
        lines.push(dim(format!("Mean Saturation: {}", metric_text(&result.metrics, "mean_saturation"))));
        lines.push(dim(format!("Contrast: {}", metric_text(&result.metrics, "contrast"))));
        lines.push(dim(format!("Haze Index: {}", metric_text(&result.metrics, "haze_index"))));
        lines.extend(note_line(&result.note));
    }
    lines
}

pub fn render_geo(state: &PanelState<GeoEstimate>) -> Vec<Line<'static>> {
    let mut lines = vec![if state.is_loading() {
        busy("Locating...")
    } else {
        action('g', "Use My Location")
    }];

    if let Some(ref error) = state.error {
        lines.push(error_line(error));
    }

    if let Some(ref geo) = state.result {
        lines.extend(estimate_head(&geo.estimate));
        if let Some(pm25) = pm25_label(&geo.estimate.metrics) {
            lines.push(dim(pm25));
        }
        lines.extend(note_line(&geo.estimate.note));
        lines.push(dim(format!(
            "Lat {:.3}, Lon {:.3}",
            geo.coordinates.latitude, geo.coordinates.longitude
        )));
    }
    lines
}

pub fn render_hazard(
    state: &PanelState<RecommendationSet>,
    badge: &(String, BadgeTone),
) -> Vec<Line<'static>> {
    let (label, tone) = badge;
    let mut lines = vec![Line::from(Span::styled(
        format!(" {} ", label),
        Style::default().fg(Color::Black).bg(badge_color(*tone)),
    ))];

    if let Some(ref error) = state.error {
        lines.push(error_line(error));
    }

    if let Some(ref set) = state.result {
        for rec in &set.recommendations {
            lines.push(Line::from(vec![
                Span::styled("• ", Style::default().fg(Color::Red)),
                Span::raw(rec.clone()),
            ]));
        }
    }

    lines.push(Line::default());
    lines.push(Line::from(
        CATEGORIES
            .iter()
            .enumerate()
            .flat_map(|(i, c)| {
                [
                    Span::styled(format!("[{}] ", i + 1), Style::default().fg(Color::DarkGray)),
                    Span::raw(format!("{}  ", c)),
                ]
            })
            .collect::<Vec<_>>(),
    ));
    lines
}

/// `None` when there is nothing to show; the panel is then left out entirely.
pub fn render_tips(tips: &[String]) -> Option<Vec<Line<'static>>> {
    if tips.is_empty() {
        return None;
    }
    Some(tips.iter().map(|t| Line::from(format!("• {}", t))).collect())
}

pub fn render_history(items: &[HistoryEntry]) -> Vec<Line<'static>> {
    if items.is_empty() {
        return vec![dim(EMPTY_HISTORY.to_string())];
    }

    let mut lines = Vec::with_capacity(items.len() * 2);
    for item in items {
        let category = item.category.as_deref().filter(|c| !c.is_empty()).unwrap_or(UNKNOWN_CATEGORY);
        lines.push(Line::from(vec![
            Span::styled(
                format!("{} • {}", item.source, category),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(
                history_aqi_label(item.aqi),
                Style::default().add_modifier(Modifier::BOLD).fg(Color::Cyan),
            ),
        ]));

        let when = item
            .created_at()
            .map(|ts| ts.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| item.created_at.clone());
        let mut detail = when;
        if let Some(pm25) = item.metrics.raw("pm25").filter(|v| !v.is_null()) {
            detail = format!("PM2.5: {}  {}", plain_value(pm25), detail);
        }
        lines.push(dim(detail));
    }
    lines
}
