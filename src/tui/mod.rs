//! Ratatui-based terminal UI.
//!
//! The dashboard has a settings panel for choosing the metal and the forecast
//! horizon. It renders the price history, history plus forecast, and two
//! tables (forecast values, last few observations). Every settings change
//! refits the model on the cached price table.

use std::io;
use std::path::Path;
use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Row, Table, Wrap},
    Terminal,
};
use tracing::debug;

use crate::app::pipeline::{run_forecast, RunOutput};
use crate::domain::{ArimaOrder, Horizon, PricePoint, PriceTable};
use crate::error::AppError;
use crate::report::{display_price, forecast_rows};

mod plotters_chart;

use plotters_chart::{PriceLine, PricePlottersChart, FORECAST_COLOR, HISTORY_COLOR};

const FIELD_METAL: usize = 0;
const FIELD_HORIZON: usize = 1;
const FIELD_COUNT: usize = 2;

/// Start the TUI on an already loaded price table.
pub fn run(table: PriceTable, source: &Path, metal: Option<&str>, horizon: Horizon) -> Result<(), AppError> {
    // Fit before touching the terminal so selection errors print normally.
    let mut app = App::new(table, source, metal, horizon)?;

    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

struct App {
    table: PriceTable,
    source: String,
    metal_idx: usize,
    horizon: Horizon,
    selected_field: usize,
    status: String,
    run: RunOutput,
}

impl App {
    fn new(table: PriceTable, source: &Path, metal: Option<&str>, horizon: Horizon) -> Result<Self, AppError> {
        let metal_idx = match metal {
            Some(name) => table.metals().iter().position(|m| m == name).ok_or_else(|| {
                AppError::new(
                    2,
                    format!("Unknown metal '{name}'. Available: {}", table.metals().join(", ")),
                )
            })?,
            None => 0,
        };
        let first = table
            .metals()
            .get(metal_idx)
            .cloned()
            .ok_or_else(|| AppError::new(2, "The price table has no metal columns."))?;

        let run = run_forecast(&table, &first, horizon)?;
        let mut app = Self {
            table,
            source: source.display().to_string(),
            metal_idx,
            horizon,
            selected_field: FIELD_METAL,
            status: String::new(),
            run,
        };
        app.update_status();
        Ok(app)
    }

    fn metal(&self) -> &str {
        &self.table.metals()[self.metal_idx]
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))? {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code)? {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, code: KeyCode) -> Result<bool, AppError> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
            KeyCode::Up => {
                if self.selected_field > 0 {
                    self.selected_field -= 1;
                }
            }
            KeyCode::Down => {
                if self.selected_field + 1 < FIELD_COUNT {
                    self.selected_field += 1;
                }
            }
            KeyCode::Left => self.adjust_field(-1)?,
            KeyCode::Right => self.adjust_field(1)?,
            KeyCode::Tab => {
                self.cycle_metal(1);
                self.refit()?;
            }
            KeyCode::Char('+') => {
                self.horizon = self.horizon.step(1);
                self.refit()?;
            }
            KeyCode::Char('-') => {
                self.horizon = self.horizon.step(-1);
                self.refit()?;
            }
            _ => {}
        }

        Ok(false)
    }

    fn adjust_field(&mut self, delta: i32) -> Result<(), AppError> {
        match self.selected_field {
            FIELD_METAL => self.cycle_metal(delta),
            FIELD_HORIZON => self.horizon = self.horizon.step(delta),
            _ => return Ok(()),
        }
        self.refit()
    }

    fn cycle_metal(&mut self, delta: i32) {
        let n = self.table.metals().len() as i64;
        if n == 0 {
            return;
        }
        self.metal_idx = (self.metal_idx as i64 + delta as i64).rem_euclid(n) as usize;
    }

    fn refit(&mut self) -> Result<(), AppError> {
        let metal = self.metal().to_string();
        debug!(metal = %metal, horizon = self.horizon.days(), "refitting");
        self.run = run_forecast(&self.table, &metal, self.horizon)?;
        self.update_status();
        Ok(())
    }

    fn update_status(&mut self) {
        self.status = match &self.run.forecast {
            Ok(fit) => format!(
                "{}: {} via {}, {} day(s)",
                self.run.series.metal,
                fit.model.order.display_name(),
                fit.model.estimation.display_name(),
                self.horizon
            ),
            Err(err) => format!("Error while forecasting: {err}"),
        };
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("metals", Style::default().fg(Color::Cyan)),
            Span::raw(" - precious metal price forecast"),
        ]));

        let range = match (self.table.dates().first(), self.table.dates().last()) {
            (Some(first), Some(last)) => format!("{first} .. {last}"),
            _ => "-".to_string(),
        };
        let model = match &self.run.forecast {
            Ok(fit) => format!("{} | sigma={:.4}", fit.model.order.display_name(), fit.model.sigma()),
            Err(_) => ArimaOrder::DASHBOARD.display_name(),
        };

        lines.push(Line::from(Span::styled(
            format!(
                "file: {} | rows: {} | {range} | model: {model}",
                self.source,
                self.table.len()
            ),
            Style::default().fg(Color::Gray),
        )));

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(30), Constraint::Min(0)])
            .split(area);

        let sidebar = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0)])
            .split(columns[0]);
        self.draw_settings(frame, sidebar[0]);
        self.draw_about(frame, sidebar[1]);

        let main = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage(35),
                Constraint::Percentage(35),
                Constraint::Min(7),
            ])
            .split(columns[1]);
        self.draw_history_chart(frame, main[0]);
        self.draw_forecast_chart(frame, main[1]);

        let tables = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(main[2]);
        self.draw_forecast_table(frame, tables[0]);
        self.draw_recent_table(frame, tables[1]);
    }

    fn draw_settings(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let items = vec![
            ListItem::new(format!("Metal: {}", self.metal())),
            ListItem::new(format!("Horizon: {} day(s)", self.horizon)),
        ];

        let list = List::new(items)
            .block(Block::default().title("Settings").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        state.select(Some(self.selected_field));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_about(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let text = vec![
            Line::from("Pick a metal and a forecast"),
            Line::from(format!("horizon ({}-{} days).", Horizon::MIN, Horizon::MAX)),
            Line::from(""),
            Line::from(format!(
                "Forecasts use {} fitted",
                ArimaOrder::DASHBOARD.display_name()
            )),
            Line::from("on the selected prices."),
            Line::from(""),
            Line::from(Span::styled(
                format!("observations: {}", self.run.series.len()),
                Style::default().fg(Color::Gray),
            )),
        ];
        let p = Paragraph::new(text)
            .wrap(Wrap { trim: true })
            .block(Block::default().title("About").borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_history_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let history = series_xy(&self.run.series.points);
        let lines = [PriceLine {
            points: &history,
            color: HISTORY_COLOR,
        }];
        let title = format!("{} price history", self.run.series.metal);
        draw_price_chart(frame, area, &title, &lines);
    }

    fn draw_forecast_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let title = format!("{} forecast ({} day(s))", self.run.series.metal, self.horizon);
        let fit = match &self.run.forecast {
            Ok(fit) => fit,
            Err(err) => {
                draw_error(frame, area, &title, &err.to_string());
                return;
            }
        };

        let history = series_xy(&self.run.series.points);
        // Start the forecast at the last observation so the lines join.
        let mut forecast: Vec<(f64, f64)> = history.last().copied().into_iter().collect();
        forecast.extend(series_xy(&fit.result.points));

        let lines = [
            PriceLine {
                points: &history,
                color: HISTORY_COLOR,
            },
            PriceLine {
                points: &forecast,
                color: FORECAST_COLOR,
            },
        ];
        draw_price_chart(frame, area, &title, &lines);
    }

    fn draw_forecast_table(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let title = "Forecast";
        let fit = match &self.run.forecast {
            Ok(fit) => fit,
            Err(err) => {
                draw_error(frame, area, title, &err.to_string());
                return;
            }
        };

        let rows = forecast_rows(&fit.result)
            .into_iter()
            .map(|r| Row::new(vec![r.date.to_string(), format!("{:.2}", r.price)]));
        render_price_table(frame, area, title, "forecast", rows);
    }

    fn draw_recent_table(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let rows = self
            .run
            .recent
            .iter()
            .map(|r| Row::new(vec![r.date.to_string(), display_price(r.price)]));
        render_price_table(frame, area, "Recent history", &self.run.series.metal, rows);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ select  ←/→ adjust  Tab metal  +/- horizon  q quit";
        let status_style = if self.run.forecast.is_err() {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::Yellow)
        };
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, status_style),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn render_price_table<'a>(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    title: &'a str,
    value_header: &'a str,
    rows: impl IntoIterator<Item = Row<'a>>,
) {
    let header = Row::new(vec!["date".to_string(), value_header.to_string()])
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
    let table = Table::new(rows, [Constraint::Length(12), Constraint::Min(10)])
        .header(header)
        .block(Block::default().title(title).borders(Borders::ALL));
    frame.render_widget(table, area);
}

fn draw_error(frame: &mut ratatui::Frame<'_>, area: Rect, title: &str, message: &str) {
    let p = Paragraph::new(message.to_string())
        .style(Style::default().fg(Color::Red))
        .wrap(Wrap { trim: true })
        .block(Block::default().title(title.to_string()).borders(Borders::ALL));
    frame.render_widget(p, area);
}

fn draw_price_chart(frame: &mut ratatui::Frame<'_>, area: Rect, title: &str, lines: &[PriceLine<'_>]) {
    let block = Block::default().title(title.to_string()).borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(Clear, inner);

    let all: Vec<&[(f64, f64)]> = lines.iter().map(|l| l.points).collect();
    let Some((x_bounds, y_bounds)) = chart_bounds(&all) else {
        let msg = Paragraph::new("No prices to plot.").style(Style::default().fg(Color::Yellow));
        frame.render_widget(msg, inner);
        return;
    };

    let (chart_rect, insets) = chart_layout(inner);
    let widget = PricePlottersChart {
        lines,
        x_bounds,
        y_bounds,
        x_label: "date",
        y_label: "price".to_string(),
        fmt_x: fmt_axis_date,
        fmt_y: fmt_axis_price,
    };

    frame.render_widget(widget, chart_rect);
    if let Some(insets) = insets {
        draw_axis_ticks(frame, inner, chart_rect, insets, x_bounds, y_bounds);
    }
}

/// Points as (days since CE, price) for plotting on a numeric axis.
fn series_xy(points: &[PricePoint]) -> Vec<(f64, f64)> {
    points
        .iter()
        .map(|p| (p.date.num_days_from_ce() as f64, p.price))
        .collect()
}

/// X and y bounds covering every series, with 5% vertical padding.
fn chart_bounds(series: &[&[(f64, f64)]]) -> Option<([f64; 2], [f64; 2])> {
    let (mut x_min, mut x_max) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(x, y) in series.iter().flat_map(|s| s.iter()) {
        x_min = x_min.min(x);
        x_max = x_max.max(x);
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }

    if !(x_min.is_finite() && x_max.is_finite() && y_min.is_finite() && y_max.is_finite()) {
        return None;
    }
    if x_max <= x_min {
        x_min -= 1.0;
        x_max += 1.0;
    }
    if y_max <= y_min {
        y_min -= 1.0;
        y_max += 1.0;
    }

    let pad = ((y_max - y_min).abs() * 0.05).max(1e-12);
    Some(([x_min, x_max], [y_min - pad, y_max + pad]))
}

fn fmt_axis_date(v: f64) -> String {
    NaiveDate::from_num_days_from_ce_opt(v.round() as i32)
        .map(|d| d.format("%y-%m-%d").to_string())
        .unwrap_or_default()
}

fn fmt_axis_price(v: f64) -> String {
    if v.abs() >= 100.0 {
        format!("{v:.0}")
    } else {
        format!("{v:.2}")
    }
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 8,
        right: 2,
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10
        || inner.height <= insets.top + insets.bottom + 5
    {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    chart: Rect,
    insets: AxisInsets,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
) {
    // Date labels are wide; fewer ticks keep them from colliding.
    let x_ticks = if chart.width >= 60 { 5usize } else { 3 };
    let y_ticks = 5usize;
    let style = Style::default().fg(Color::Gray);

    for i in 0..x_ticks {
        let u = i as f64 / (x_ticks as f64 - 1.0);
        let x_val = x_bounds[0] + u * (x_bounds[1] - x_bounds[0]);
        let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
        let label = fmt_axis_date(x_val);
        let label_len = label.len() as u16;
        let start = x
            .saturating_sub(label_len / 2)
            .min((inner.x + inner.width).saturating_sub(label_len));
        let y = chart.y + chart.height;
        if y >= inner.y + inner.height - 1 {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    for i in 0..y_ticks {
        let u = i as f64 / (y_ticks as f64 - 1.0);
        let y_val = y_bounds[0] + u * (y_bounds[1] - y_bounds[0]);
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let label = fmt_axis_price(y_val);
        let label_len = label.len() as u16;
        let x = inner.x + insets.left.saturating_sub(1);
        let start = x.saturating_sub(label_len);
        if start < inner.x {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    let x_label = Paragraph::new("date")
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray));
    let x_rect = Rect {
        x: chart.x,
        y: chart.y + chart.height + 1,
        width: chart.width,
        height: 1,
    };
    if x_rect.y < inner.y + inner.height {
        frame.render_widget(x_label, x_rect);
    }

    let y_label = Paragraph::new("price")
        .style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD));
    let y_rect = Rect {
        x: inner.x,
        y: inner.y,
        width: insets.left.saturating_sub(1),
        height: 1,
    };
    frame.render_widget(y_label, y_rect);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Days;

    fn table(n: usize) -> PriceTable {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let rows = (0..n)
            .map(|i| {
                let gold = 2100.0 + 2.5 * i as f64 + 4.0 * (i as f64 * 1.3).cos();
                // Platinum is only quoted on the last few days.
                let platinum = (i + 6 >= n).then_some(900.0 + i as f64);
                (start + Days::new(i as u64), vec![Some(gold), platinum])
            })
            .collect();
        PriceTable::from_rows(vec!["Gold".to_string(), "Platinum".to_string()], rows).unwrap()
    }

    fn app() -> App {
        App::new(table(25), Path::new("metals.csv"), None, Horizon::DEFAULT).unwrap()
    }

    #[test]
    fn starts_on_first_metal_with_a_forecast() {
        let app = app();
        assert_eq!(app.metal(), "Gold");
        assert_eq!(app.run.forecast.as_ref().unwrap().result.len(), 7);
        assert!(app.status.starts_with("Gold: ARIMA(5,1,0)"));
    }

    #[test]
    fn unknown_initial_metal_is_rejected() {
        let err = App::new(table(25), Path::new("x.csv"), Some("Rhodium"), Horizon::DEFAULT)
            .err()
            .unwrap();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn switching_to_a_sparse_metal_shows_the_error() {
        let mut app = app();
        app.handle_key(KeyCode::Right).unwrap();
        assert_eq!(app.metal(), "Platinum");
        assert!(app.run.forecast.is_err());
        assert!(app.status.starts_with("Error while forecasting: not enough data"));

        // Wraps back around.
        app.handle_key(KeyCode::Right).unwrap();
        assert_eq!(app.metal(), "Gold");
        assert!(app.run.forecast.is_ok());
    }

    #[test]
    fn horizon_field_steps_and_refits() {
        let mut app = app();
        app.handle_key(KeyCode::Down).unwrap();
        app.handle_key(KeyCode::Right).unwrap();
        app.handle_key(KeyCode::Right).unwrap();
        assert_eq!(app.horizon.days(), 9);
        assert_eq!(app.run.forecast.as_ref().unwrap().result.len(), 9);

        for _ in 0..20 {
            app.handle_key(KeyCode::Left).unwrap();
        }
        assert_eq!(app.horizon.days(), 1);
    }

    #[test]
    fn quit_keys_end_the_loop() {
        let mut app = app();
        assert!(app.handle_key(KeyCode::Char('q')).unwrap());
        assert!(app.handle_key(KeyCode::Esc).unwrap());
        assert!(!app.handle_key(KeyCode::Char('x')).unwrap());
    }

    #[test]
    fn bounds_cover_all_series_with_padding() {
        let a = [(10.0, 100.0), (12.0, 110.0)];
        let b = [(12.0, 110.0), (15.0, 90.0)];
        let (x, y) = chart_bounds(&[&a[..], &b[..]]).unwrap();
        assert_eq!(x, [10.0, 15.0]);
        assert!((y[0] - 89.0).abs() < 1e-9);
        assert!((y[1] - 111.0).abs() < 1e-9);
        assert!(chart_bounds(&[]).is_none());
    }

    #[test]
    fn axis_labels_format_dates_and_prices() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap().num_days_from_ce() as f64;
        assert_eq!(fmt_axis_date(day), "24-03-05");
        assert_eq!(fmt_axis_price(2061.4), "2061");
        assert_eq!(fmt_axis_price(23.456), "23.46");
    }
}
