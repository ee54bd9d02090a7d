//! Chart Plotter Module
//! Draws a [`Chart`] interactively using egui_plot.

use super::model::{format_millis, AxisRange, BarStyle, Chart, ColumnSource, Layer, Panel, Tooltip};
use crate::config::Color;
use egui::{Color32, RichText, Stroke};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotBounds, PlotPoints};
use std::sync::Arc;

/// Tick label format for the shared time axis.
const TICK_FORMAT: &str = "%m-%d %H:%M:%S";

/// Convert a config color to egui with the given opacity.
pub fn to_color32(color: Color, alpha: f64) -> Color32 {
    let a = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
    Color32::from_rgba_unmultiplied(color.r, color.g, color.b, a)
}

/// Hover text for the row nearest to `x_ms`.
pub fn hover_text(chart: &Chart, tooltip: &Tooltip, x_ms: f64) -> String {
    match chart.source.nearest(x_ms) {
        Some(row) => tooltip.render_text(&chart.source, row),
        None => String::new(),
    }
}

/// Current x bounds with y replaced by a fixed range.
pub fn pinned_bounds(current: &PlotBounds, range: AxisRange) -> PlotBounds {
    PlotBounds::from_min_max(
        [current.min()[0], range.start],
        [current.max()[0], range.end],
    )
}

/// Interaction switches derived from a panel's tool list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Interactions {
    pub pan: bool,
    pub wheel_zoom: bool,
    pub box_zoom: bool,
    pub reset: bool,
}

impl Interactions {
    pub fn from_tools(tools: &[String]) -> Self {
        let mut interactions = Self::default();
        for tool in tools {
            match tool.trim() {
                "pan" => interactions.pan = true,
                "wheel_zoom" => interactions.wheel_zoom = true,
                "box_zoom" => interactions.box_zoom = true,
                "reset" => interactions.reset = true,
                other => log::warn!("Ignoring unsupported chart tool '{}'", other),
            }
        }
        interactions
    }
}

/// Translates chart layers into egui_plot items.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Draw the title, the price panel and the volume panel stacked vertically.
    pub fn show(ui: &mut egui::Ui, chart: &Arc<Chart>) {
        ui.label(RichText::new(&chart.title).size(18.0).strong());
        ui.add_space(6.0);

        let link_group = ui.id().with(("chart_x", chart.price.x_range.0));
        for (index, panel) in chart.panels().into_iter().enumerate() {
            Self::draw_panel(ui, chart, panel, index, link_group);
            ui.add_space(4.0);
        }
    }

    fn draw_panel(
        ui: &mut egui::Ui,
        chart: &Arc<Chart>,
        panel: &Panel,
        index: usize,
        link_group: egui::Id,
    ) {
        let tools = Interactions::from_tools(&panel.tools);
        // Panning and zooming along y would undo a fixed range.
        let free_y = panel.y_range.is_none();

        let hover_chart = Arc::clone(chart);
        let hover_tooltip = panel.tooltip.clone();

        let mut plot = Plot::new(("candles_panel", index))
            .height(panel.height as f32)
            .width(ui.available_width().min(panel.width as f32))
            .link_axis(link_group, [true, false])
            .link_cursor(link_group, [true, false].into())
            .allow_drag([tools.pan, tools.pan && free_y])
            .allow_zoom([tools.wheel_zoom, tools.wheel_zoom && free_y])
            .allow_scroll([tools.pan, tools.pan && free_y])
            .allow_boxed_zoom(tools.box_zoom)
            .allow_double_click_reset(tools.reset)
            .x_axis_formatter(|mark, _range| format_millis(mark.value as i64, TICK_FORMAT))
            .label_formatter(move |_name, value| {
                hover_text(&hover_chart, &hover_tooltip, value.x)
            })
            .legend(Legend::default());

        if let Some(label) = &panel.x_axis.label {
            plot = plot.x_axis_label(label.clone());
        }
        if let Some(label) = &panel.y_axis.label {
            plot = plot.y_axis_label(label.clone());
        }
        if let Some(range) = panel.y_range {
            plot = plot
                .include_y(range.start)
                .include_y(range.end)
                .set_margin_fraction(egui::Vec2::new(0.05, 0.0));
        }
        if let Some((start, end)) = chart.source.x_extent() {
            plot = plot.include_x(start).include_x(end);
        }

        egui::Frame::none()
            .fill(to_color32(panel.background, 1.0))
            .rounding(5.0)
            .inner_margin(4.0)
            .show(ui, |ui| {
                plot.show(ui, |plot_ui| {
                    // Re-pinned every frame so box zoom and reset keep the range.
                    if let Some(range) = panel.y_range {
                        let bounds = pinned_bounds(&plot_ui.plot_bounds(), range);
                        plot_ui.set_plot_bounds(bounds);
                    }
                    for layer in &panel.layers {
                        match layer {
                            Layer::Whiskers { rows, color } => {
                                for line in Self::whiskers(&chart.source, rows, *color) {
                                    plot_ui.line(line);
                                }
                            }
                            Layer::Bodies {
                                direction,
                                rows,
                                style,
                            } => {
                                let name = format!("{:?}", direction).to_lowercase();
                                plot_ui.bar_chart(Self::bodies(chart, &panel.tooltip, rows, style, &name));
                            }
                            Layer::VolumeBars { rows, style } => {
                                plot_ui.bar_chart(Self::volume_bars(chart, &panel.tooltip, rows, style));
                            }
                        }
                    }
                });
            });
    }

    fn whiskers(source: &ColumnSource, rows: &[usize], color: Color) -> Vec<Line> {
        rows.iter()
            .filter_map(|&i| {
                let x = *source.timestamp.get(i)? as f64;
                let points = PlotPoints::new(vec![[x, source.low[i]], [x, source.high[i]]]);
                Some(Line::new(points).color(to_color32(color, 1.0)).width(1.0))
            })
            .collect()
    }

    fn bar_for(
        source: &ColumnSource,
        row: usize,
        bottom: f64,
        top: f64,
        style: &BarStyle,
    ) -> Option<Bar> {
        let x = *source.timestamp.get(row)? as f64;
        let fill = style
            .fill
            .map(|c| to_color32(c, style.alpha))
            .unwrap_or(Color32::TRANSPARENT);
        Some(
            Bar::new(x, top - bottom)
                .base_offset(bottom)
                .width(source.width[row])
                .fill(fill)
                .stroke(Stroke::new(
                    style.line_width as f32,
                    to_color32(style.line, style.alpha),
                )),
        )
    }

    /// Bar charts ignore the plot's label formatter, so the inspector is
    /// attached to each chart as its element formatter.
    fn with_inspector(bars: BarChart, chart: &Arc<Chart>, tooltip: &Tooltip) -> BarChart {
        let chart = Arc::clone(chart);
        let tooltip = tooltip.clone();
        bars.element_formatter(Box::new(move |bar: &Bar, _: &BarChart| {
            hover_text(&chart, &tooltip, bar.argument)
        }))
    }

    fn bodies(
        chart: &Arc<Chart>,
        tooltip: &Tooltip,
        rows: &[usize],
        style: &BarStyle,
        name: &str,
    ) -> BarChart {
        let source = &chart.source;
        let bars = rows
            .iter()
            .filter_map(|&i| {
                let (open, close) = (source.open[i], source.close[i]);
                Self::bar_for(source, i, open.min(close), open.max(close), style)
            })
            .collect();
        let bars = BarChart::new(bars)
            .name(name)
            .color(to_color32(style.line, style.alpha));
        Self::with_inspector(bars, chart, tooltip)
    }

    fn volume_bars(
        chart: &Arc<Chart>,
        tooltip: &Tooltip,
        rows: &[usize],
        style: &BarStyle,
    ) -> BarChart {
        let source = &chart.source;
        let bars = rows
            .iter()
            .filter_map(|&i| Self::bar_for(source, i, source.bottom[i], source.volume[i], style))
            .collect();
        let bars = BarChart::new(bars)
            .name("volume")
            .color(to_color32(style.line, style.alpha));
        Self::with_inspector(bars, chart, tooltip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_color32() {
        let c = to_color32(Color::rgb(31, 119, 180), 1.0);
        assert_eq!(c, Color32::from_rgb(31, 119, 180));
        assert_eq!(to_color32(Color::BLACK, 0.5).a(), 128);
        assert_eq!(to_color32(Color::BLACK, 3.0).a(), 255);
    }

    fn chart() -> Chart {
        use crate::charts::ChartBuilder;
        use crate::config::ChartConfig;
        use crate::data::{OhlcvRow, OhlcvTable};

        let table = OhlcvTable::new(vec![
            OhlcvRow::new(1000, "dk", 100.0, 110.0, 95.0, 105.0, 50.0),
            OhlcvRow::new(1060, "dk", 108.0, 115.0, 100.0, 103.0, 70.0),
        ]);
        ChartBuilder::new(&ChartConfig::default()).build(&table).unwrap()
    }

    #[test]
    fn test_hover_text_on_bar_argument() {
        let chart = chart();
        let text = hover_text(&chart, &chart.volume.tooltip, 1_058_000.0);
        assert_eq!(
            text,
            "timestamp: 1970-01-01 00:17:40\nopen: 108\nhigh: 115\nlow: 100\nclose: 103\nvolume: 70"
        );
    }

    #[test]
    fn test_pinned_bounds_keep_x() {
        let current = PlotBounds::from_min_max([990_000.0, 80.0], [1_070_000.0, 130.0]);
        let pinned = pinned_bounds(&current, AxisRange::new(95.0, 126.5));
        assert_eq!(pinned.min(), [990_000.0, 95.0]);
        assert_eq!(pinned.max(), [1_070_000.0, 126.5]);
    }

    #[test]
    fn test_interactions_from_tools() {
        let tools: Vec<String> = ["pan", "box_zoom", "lasso"]
            .iter()
            .map(|t| t.to_string())
            .collect();
        let interactions = Interactions::from_tools(&tools);
        assert!(interactions.pan);
        assert!(interactions.box_zoom);
        assert!(!interactions.wheel_zoom);
        assert!(!interactions.reset);
    }
}
