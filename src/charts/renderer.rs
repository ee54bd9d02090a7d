//! Static Chart Renderer
//! Renders a [`Chart`] to PNG or SVG with plotters.
//!
//! Layout:
//! 1. Title centered above both panels
//! 2. Price panel: whiskers, bearish bodies (filled), bullish bodies (hollow)
//! 3. Volume panel: translucent bars sharing the price panel's time range

use super::model::{AxisRange, BarStyle, Chart, ColumnSource, Layer, Panel, format_millis};
use crate::config::Color as StyleColor;
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;
use thiserror::Error;

const TITLE_HEIGHT: u32 = 40;
const TICK_FORMAT: &str = "%m-%d %H:%M";

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Plotting failed: {0}")]
    Plotters(String),
    #[error("Chart has no rows to render")]
    Empty,
}

fn plot_err<E: std::fmt::Display>(e: E) -> RenderError {
    RenderError::Plotters(e.to_string())
}

fn rgb(color: StyleColor) -> RGBColor {
    RGBColor(color.r, color.g, color.b)
}

/// Renders chart descriptions to image files.
pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Total image size for a chart: title plus both panels.
    pub fn image_size(chart: &Chart) -> (u32, u32) {
        let width = chart.price.width.max(chart.volume.width);
        (
            width,
            TITLE_HEIGHT + chart.price.height + chart.volume.height,
        )
    }

    /// Write the chart as a PNG file.
    pub fn render_png(chart: &Chart, path: &Path) -> Result<(), RenderError> {
        let root = BitMapBackend::new(path, Self::image_size(chart)).into_drawing_area();
        Self::draw(&root, chart)?;
        root.present().map_err(plot_err)?;
        log::info!("Rendered {} to {}", chart.title, path.display());
        Ok(())
    }

    /// Render the chart as an SVG document.
    pub fn render_svg(chart: &Chart) -> Result<String, RenderError> {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, Self::image_size(chart)).into_drawing_area();
            Self::draw(&root, chart)?;
            root.present().map_err(plot_err)?;
        }
        Ok(svg)
    }

    fn draw<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        chart: &Chart,
    ) -> Result<(), RenderError> {
        let (x_start, x_end) = chart.source.x_extent().ok_or(RenderError::Empty)?;

        root.fill(&WHITE).map_err(plot_err)?;
        let body = root
            .titled(&chart.title, ("sans-serif", 22))
            .map_err(plot_err)?;
        let (upper, lower) = body.split_vertically(chart.price.height);

        let price_range = chart
            .price
            .y_range
            .unwrap_or_else(|| Self::fit_range(&chart.source, chart.price.layers.as_slice()));
        Self::draw_panel(&upper, chart, &chart.price, (x_start, x_end), price_range)?;

        let volume_range = chart
            .volume
            .y_range
            .unwrap_or_else(|| Self::fit_range(&chart.source, chart.volume.layers.as_slice()));
        Self::draw_panel(&lower, chart, &chart.volume, (x_start, x_end), volume_range)?;
        Ok(())
    }

    /// Y-range enclosing every glyph of the given layers.
    pub fn fit_range(source: &ColumnSource, layers: &[Layer]) -> AxisRange {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for layer in layers {
            let (rows, lows, highs): (&[usize], &[f64], &[f64]) = match layer {
                Layer::Whiskers { rows, .. } => (rows, &source.low, &source.high),
                Layer::Bodies { rows, .. } => (rows, &source.open, &source.close),
                Layer::VolumeBars { rows, .. } => (rows, &source.bottom, &source.volume),
            };
            for &i in rows {
                for v in [lows.get(i), highs.get(i)].into_iter().flatten() {
                    min = min.min(*v);
                    max = max.max(*v);
                }
            }
        }
        if !min.is_finite() || !max.is_finite() {
            return AxisRange::new(0.0, 1.0);
        }
        if max <= min {
            max = min + 1.0;
        }
        AxisRange::new(min, max + (max - min) * 0.05)
    }

    fn draw_panel<DB: DrawingBackend>(
        area: &DrawingArea<DB, Shift>,
        chart: &Chart,
        panel: &Panel,
        (x_start, x_end): (f64, f64),
        y_range: AxisRange,
    ) -> Result<(), RenderError> {
        let source = &chart.source;
        let y_end = if y_range.end > y_range.start {
            y_range.end
        } else {
            y_range.start + 1.0
        };

        let mut ctx = ChartBuilder::on(area)
            .margin(10)
            .x_label_area_size(35)
            .y_label_area_size(60)
            .build_cartesian_2d(x_start..x_end, y_range.start..y_end)
            .map_err(plot_err)?;

        ctx.plotting_area()
            .fill(&rgb(panel.background))
            .map_err(plot_err)?;

        let x_label = |x: &f64| format_millis(*x as i64, TICK_FORMAT);
        let mut mesh = ctx.configure_mesh();
        mesh.x_label_formatter(&x_label)
            .x_labels(8)
            .light_line_style(WHITE);
        if let Some(label) = &panel.x_axis.label {
            mesh.x_desc(label.as_str());
        }
        if let Some(label) = &panel.y_axis.label {
            mesh.y_desc(label.as_str());
        }
        mesh.draw().map_err(plot_err)?;

        for layer in &panel.layers {
            match layer {
                Layer::Whiskers { rows, color } => {
                    let stroke = rgb(*color).stroke_width(1);
                    ctx.draw_series(rows.iter().filter_map(|&i| {
                        let x = *source.timestamp.get(i)? as f64;
                        Some(PathElement::new(
                            vec![(x, source.low[i]), (x, source.high[i])],
                            stroke,
                        ))
                    }))
                    .map_err(plot_err)?;
                }
                Layer::Bodies { rows, style, .. } => {
                    let spans: Vec<(f64, f64, f64, f64)> = rows
                        .iter()
                        .filter_map(|&i| Self::span(source, i, source.open[i], source.close[i]))
                        .collect();
                    Self::draw_bars(&mut ctx, &spans, style)?;
                }
                Layer::VolumeBars { rows, style } => {
                    let spans: Vec<(f64, f64, f64, f64)> = rows
                        .iter()
                        .filter_map(|&i| Self::span(source, i, source.bottom[i], source.volume[i]))
                        .collect();
                    Self::draw_bars(&mut ctx, &spans, style)?;
                }
            }
        }
        Ok(())
    }

    /// (left, right, bottom, top) of a bar centered on row `i`.
    fn span(source: &ColumnSource, i: usize, a: f64, b: f64) -> Option<(f64, f64, f64, f64)> {
        let x = *source.timestamp.get(i)? as f64;
        let half = source.width.get(i).copied().unwrap_or(0.0) / 2.0;
        Some((x - half, x + half, a.min(b), a.max(b)))
    }

    fn draw_bars<DB: DrawingBackend>(
        ctx: &mut ChartContext<'_, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
        spans: &[(f64, f64, f64, f64)],
        style: &BarStyle,
    ) -> Result<(), RenderError> {
        if let Some(fill) = style.fill {
            let fill_style = rgb(fill).mix(style.alpha).filled();
            ctx.draw_series(spans.iter().map(|&(l, r, b, t)| {
                Rectangle::new([(l, b), (r, t)], fill_style)
            }))
            .map_err(plot_err)?;
        }
        let line_style = rgb(style.line)
            .mix(style.alpha)
            .stroke_width(style.line_width.round().max(1.0) as u32);
        ctx.draw_series(spans.iter().map(|&(l, r, b, t)| {
            Rectangle::new([(l, b), (r, t)], line_style)
        }))
        .map_err(plot_err)?;
        Ok(())
    }
}
