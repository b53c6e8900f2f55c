//! Plotters-powered price chart widget for Ratatui.
//!
//! Plotters output is drawn into the Ratatui buffer through
//! `plotters-ratatui-backend`.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

pub const HISTORY_COLOR: RGBColor = RGBColor(0, 255, 255);
pub const FORECAST_COLOR: RGBColor = RGBColor(255, 64, 64);

/// Smallest area Plotters can lay a chart out in.
const MIN_WIDTH: u16 = 20;
const MIN_HEIGHT: u16 = 6;

/// One line on the chart; x is days since CE.
pub struct PriceLine<'a> {
    pub points: &'a [(f64, f64)],
    pub color: RGBColor,
}

/// Render-only chart description. Series and bounds are prepared by the caller.
pub struct PricePlottersChart<'a> {
    pub lines: &'a [PriceLine<'a>],
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    pub x_label: &'a str,
    pub y_label: String,
    pub fmt_x: fn(f64) -> String,
    pub fmt_y: fn(f64) -> String,
}

impl PricePlottersChart<'_> {
    fn has_valid_bounds(&self) -> bool {
        let [x0, x1] = self.x_bounds;
        let [y0, y1] = self.y_bounds;
        [x0, x1, y0, y1].iter().all(|v| v.is_finite()) && x1 > x0 && y1 > y0
    }
}

impl<'a> Widget for PricePlottersChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }
        if !self.has_valid_bounds() {
            return;
        }

        let x_range = self.x_bounds[0]..self.x_bounds[1];
        let y_range = self.y_bounds[0]..self.y_bounds[1];

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                .x_label_area_size(2)
                .y_label_area_size(7)
                .build_cartesian_2d(x_range.clone(), y_range.clone())?;

            // Horizontal grid only; vertical lines crowd the date axis.
            chart
                .configure_mesh()
                .disable_x_mesh()
                .light_line_style(RGBColor(60, 60, 60))
                .y_labels(4)
                .x_labels(4)
                .x_desc(self.x_label)
                .y_desc(&self.y_label)
                .x_label_formatter(&|v| (self.fmt_x)(*v))
                .y_label_formatter(&|v| (self.fmt_y)(*v))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .draw()?;

            for line in self.lines {
                match line.points {
                    [] => {}
                    // A lone observation has no segment to draw.
                    [(x, y)] => {
                        chart.draw_series(std::iter::once(Pixel::new((*x, *y), line.color)))?;
                    }
                    points => {
                        chart.draw_series(LineSeries::new(points.iter().copied(), &line.color))?;
                    }
                }
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}
