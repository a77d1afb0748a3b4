use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io::stdout;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use super::render;
use super::Dashboard;
use crate::api::{EstimateResult, GeoEstimate, RecommendationSet};
use crate::reconciler::{PanelState, CATEGORIES};

/// Terminal front-end for a [`Dashboard`].
pub struct DashboardTui {
    dashboard: Arc<Dashboard>,
}

impl DashboardTui {
    pub fn new(dashboard: Arc<Dashboard>) -> Self {
        Self { dashboard }
    }

    pub async fn run(self) -> Result<()> {
        enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?;
        let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

        let result = self.event_loop(&mut terminal).await;

        self.dashboard.unmount();
        disable_raw_mode()?;
        stdout().execute(LeaveAlternateScreen)?;
        result
    }

    async fn event_loop(
        &self,
        terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    ) -> Result<()> {
        let _ = self.dashboard.mount();

        let tick_rate = Duration::from_millis(50);
        let mut changes = Changes::new(&self.dashboard);
        let mut dirty = true;

        loop {
            if changes.poll(&self.dashboard) || dirty {
                terminal.draw(|f| ui(f, &self.dashboard))?;
                dirty = false;
            }

            if event::poll(tick_rate)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        if !self.handle_key(key.code) {
                            break;
                        }
                        dirty = true;
                    }
                    Event::Resize(..) => dirty = true,
                    _ => {}
                }
            }
            tokio::task::yield_now().await;
        }
        Ok(())
    }

    /// Returns `false` when the user asked to quit.
    fn handle_key(&self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return false,
            KeyCode::Char('c') => {
                let dashboard = self.dashboard.clone();
                tokio::spawn(async move {
                    dashboard.enable_camera().await;
                });
            }
            KeyCode::Char('e') => {
                let _ = self.dashboard.estimate_camera();
            }
            KeyCode::Char('g') => {
                let _ = self.dashboard.estimate_geo();
            }
            KeyCode::Char(c @ '1'..='6') => {
                let index = c as usize - '1' as usize;
                let _ = self.dashboard.select_category(CATEGORIES[index]);
            }
            _ => {}
        }
        true
    }
}

/// Tracks what the screen was last drawn from.
///
/// Panels publish through watch channels; the camera stream and the two
/// loaders are compared against their last seen value.
struct Changes {
    camera: watch::Receiver<PanelState<EstimateResult>>,
    geo: watch::Receiver<PanelState<GeoEstimate>>,
    hazard: watch::Receiver<PanelState<RecommendationSet>>,
    seen: (bool, bool, bool),
}

impl Changes {
    fn new(dashboard: &Dashboard) -> Self {
        Self {
            camera: dashboard.camera.panel().subscribe(),
            geo: dashboard.geo.panel().subscribe(),
            hazard: dashboard.hazard.panel().subscribe(),
            seen: Self::flags(dashboard),
        }
    }

    fn flags(dashboard: &Dashboard) -> (bool, bool, bool) {
        (
            dashboard.camera.is_streaming(),
            dashboard.tips.is_loaded(),
            dashboard.history.is_loaded(),
        )
    }

    /// True when anything on screen is out of date. Marks it as seen.
    fn poll(&mut self, dashboard: &Dashboard) -> bool {
        let mut changed = false;
        changed |= mark_seen(&mut self.camera);
        changed |= mark_seen(&mut self.geo);
        changed |= mark_seen(&mut self.hazard);

        let flags = Self::flags(dashboard);
        if flags != self.seen {
            self.seen = flags;
            changed = true;
        }
        changed
    }
}

fn mark_seen<T>(rx: &mut watch::Receiver<T>) -> bool {
    if rx.has_changed().unwrap_or(false) {
        let _ = rx.borrow_and_update();
        true
    } else {
        false
    }
}

fn panel(title: &str) -> Block<'static> {
    Block::default().borders(Borders::ALL).title(format!(" {} ", title))
}

fn draw_lines(f: &mut Frame, area: Rect, title: &str, lines: Vec<Line<'static>>) {
    let widget = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(panel(title));
    f.render_widget(widget, area);
}

fn split(area: Rect, direction: Direction) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(direction)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area)
}

fn ui(f: &mut Frame, dashboard: &Dashboard) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Percentage(35),
            Constraint::Percentage(35),
            Constraint::Min(6),
            Constraint::Length(1),
        ])
        .split(f.area());

    let header = Paragraph::new(Line::from(vec![
        Span::styled("AQI Vision ", Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(
            "Real-time insights from your camera and location",
            Style::default().fg(Color::Gray),
        ),
    ]))
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(header, rows[0]);

    let estimates = split(rows[1], Direction::Horizontal);
    draw_lines(
        f,
        estimates[0],
        "Camera AQI Estimator",
        render::render_camera(&dashboard.camera.state(), dashboard.camera.is_streaming()),
    );
    draw_lines(
        f,
        estimates[1],
        "Nearby AQI (via Geolocation)",
        render::render_geo(&dashboard.geo.state()),
    );

    let guidance = split(rows[2], Direction::Horizontal);
    draw_lines(
        f,
        guidance[0],
        "Immediate Measures",
        render::render_hazard(&dashboard.hazard.state(), &dashboard.hazard.badge()),
    );
    if let Some(tips) = render::render_tips(dashboard.tips.items()) {
        draw_lines(f, guidance[1], "Health Tips", tips);
    }

    let bottom = split(rows[3], Direction::Horizontal);
    draw_lines(f, bottom[0], "About", vec![Line::from(render::ABOUT_TEXT)]);
    draw_lines(
        f,
        bottom[1],
        "Recent Checks",
        render::render_history(dashboard.history.items()),
    );

    let help_text = format!(
        " q/ESC: Quit | c: Camera | e: Estimate | g: Location | 1-6: Category | {} ",
        dashboard.client().base_url()
    );
    let footer = Paragraph::new(help_text).style(Style::default().fg(Color::DarkGray));
    f.render_widget(footer, rows[4]);
}
