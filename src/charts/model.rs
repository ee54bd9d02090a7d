//! Chart Model
//! Backend-agnostic description of a two-panel candlestick chart.
//!
//! A [`Chart`] owns a columnar copy of the input rows ([`ColumnSource`]).
//! Layers refer to that source by row index, so the bearish and bullish body
//! layers are two views onto the same columns. Adapters (egui_plot, plotters,
//! JSON) translate this description into pixels or files.

use crate::config::Color;
use chrono::DateTime;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Candle direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// `close <= open`
    Bearish,
    /// `close > open`
    Bullish,
}

impl Direction {
    pub fn of(open: f64, close: f64) -> Self {
        if close <= open {
            Direction::Bearish
        } else {
            Direction::Bullish
        }
    }
}

/// Columnar render inputs, one entry per row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnSource {
    /// Milliseconds since the Unix epoch.
    pub timestamp: Vec<i64>,
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
    pub volume: Vec<f64>,
    /// Volume bar baseline.
    pub bottom: Vec<f64>,
    /// Body and bar width, milliseconds.
    pub width: Vec<f64>,
}

impl ColumnSource {
    pub fn len(&self) -> usize {
        self.timestamp.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamp.is_empty()
    }

    pub fn value(&self, field: Field, row: usize) -> Option<f64> {
        match field {
            Field::Timestamp => self.timestamp.get(row).map(|&t| t as f64),
            Field::Open => self.open.get(row).copied(),
            Field::High => self.high.get(row).copied(),
            Field::Low => self.low.get(row).copied(),
            Field::Close => self.close.get(row).copied(),
            Field::Volume => self.volume.get(row).copied(),
        }
    }

    /// Row whose timestamp is closest to `x_ms`.
    pub fn nearest(&self, x_ms: f64) -> Option<usize> {
        self.timestamp
            .iter()
            .enumerate()
            .map(|(i, &t)| (i, (t as f64 - x_ms).abs()))
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, _)| i)
    }

    /// (min, max) timestamp extended by half a bar width on each side.
    pub fn x_extent(&self) -> Option<(f64, f64)> {
        let half = self.width.first().copied().unwrap_or(0.0) / 2.0;
        let min = self.timestamp.iter().min()?;
        let max = self.timestamp.iter().max()?;
        Some((*min as f64 - half, *max as f64 + half))
    }
}

/// Closed numeric interval for an axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    pub start: f64,
    pub end: f64,
}

impl AxisRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }
}

/// Identifier of a range object; panels holding the same id pan and zoom together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RangeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AxisKind {
    Linear,
    DateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    pub kind: AxisKind,
    pub label: Option<String>,
    /// Tick label rotation, radians.
    pub label_orientation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarStyle {
    /// `None` draws the outline only.
    pub fill: Option<Color>,
    pub line: Color,
    pub line_width: f64,
    pub alpha: f64,
}

/// A group of glyphs drawn from the shared source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Layer {
    /// Vertical low-high segments.
    Whiskers { rows: Vec<usize>, color: Color },
    /// Open-close boxes.
    Bodies {
        direction: Direction,
        rows: Vec<usize>,
        style: BarStyle,
    },
    /// Bars from `bottom` to `volume`.
    VolumeBars { rows: Vec<usize>, style: BarStyle },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Field {
    Timestamp,
    Open,
    High,
    Low,
    Close,
    Volume,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldFormat {
    Number,
    /// chrono format string, UTC.
    DateTime(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TooltipField {
    pub label: String,
    pub field: Field,
    pub format: FieldFormat,
}

/// Hover inspector definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tooltip {
    pub fields: Vec<TooltipField>,
}

impl Tooltip {
    /// Label/value pairs for one row.
    pub fn render(&self, source: &ColumnSource, row: usize) -> Vec<(String, String)> {
        self.fields
            .iter()
            .filter_map(|f| {
                let value = source.value(f.field, row)?;
                let text = match &f.format {
                    FieldFormat::Number => format_number(value),
                    FieldFormat::DateTime(fmt) => format_millis(value as i64, fmt),
                };
                Some((f.label.clone(), text))
            })
            .collect()
    }

    /// One `label: value` line per field.
    pub fn render_text(&self, source: &ColumnSource, row: usize) -> String {
        self.render(source, row)
            .into_iter()
            .map(|(label, value)| format!("{}: {}", label, value))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn format_number(value: f64) -> String {
    format!("{}", value)
}

/// Format epoch milliseconds as a UTC date-time; falls back to the raw number
/// when the timestamp or the format string is invalid.
pub fn format_millis(ms: i64, fmt: &str) -> String {
    let Some(dt) = DateTime::from_timestamp_millis(ms) else {
        return ms.to_string();
    };
    let mut out = String::new();
    match write!(out, "{}", dt.format(fmt)) {
        Ok(()) => out,
        Err(_) => ms.to_string(),
    }
}

/// One panel of the layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Panel {
    pub title: Option<String>,
    pub width: u32,
    pub height: u32,
    pub background: Color,
    pub x_axis: Axis,
    pub y_axis: Axis,
    pub x_range: RangeId,
    /// Fixed y-range; `None` lets the backend fit the data.
    pub y_range: Option<AxisRange>,
    pub layers: Vec<Layer>,
    pub tooltip: Tooltip,
    pub tools: Vec<String>,
}

/// Price panel stacked above a volume panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    pub title: String,
    pub region: String,
    pub region_name: String,
    pub source: ColumnSource,
    pub price: Panel,
    pub volume: Panel,
}

impl Chart {
    /// Panels in stacking order, top first.
    pub fn panels(&self) -> [&Panel; 2] {
        [&self.price, &self.volume]
    }

    pub fn x_linked(&self) -> bool {
        self.price.x_range == self.volume.x_range
    }

    pub fn price_range(&self) -> Option<AxisRange> {
        self.price.y_range
    }

    /// Rows drawn in the body layer of the given direction.
    pub fn rows_for(&self, direction: Direction) -> &[usize] {
        self.price
            .layers
            .iter()
            .find_map(|layer| match layer {
                Layer::Bodies {
                    direction: d, rows, ..
                } if *d == direction => Some(rows.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    /// Serialize for an external renderer.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
