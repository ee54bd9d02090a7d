//! Chart Builder Module
//! Validates a single-region OHLCV table and turns it into a [`Chart`].

use super::model::{
    Axis, AxisKind, AxisRange, BarStyle, Chart, ColumnSource, Direction, Field, FieldFormat,
    Layer, Panel, RangeId, Tooltip, TooltipField,
};
use crate::config::{ChartConfig, ChartStyle};
use crate::data::OhlcvTable;
use std::collections::BTreeSet;
use thiserror::Error;

/// Range shared by the x-axes of both panels.
const SHARED_X_RANGE: RangeId = RangeId(0);

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChartError {
    #[error("The input data has no rows, so no region can be charted")]
    NoData,
    #[error("The input data has multiple regions {}", format_regions(.regions))]
    MultipleRegions { regions: BTreeSet<String> },
    #[error("Unknown region code '{0}'")]
    UnknownRegion(String),
    #[error("Timestamp {timestamp} at row {row} is out of range for millisecond time")]
    TimestampOverflow { row: usize, timestamp: i64 },
}

fn format_regions(regions: &BTreeSet<String>) -> String {
    let quoted: Vec<String> = regions.iter().map(|r| format!("'{}'", r)).collect();
    format!("[{}]", quoted.join(", "))
}

/// Row indices split by candle direction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    pub bearish: Vec<usize>,
    pub bullish: Vec<usize>,
}

/// Tag every row as bearish (`close <= open`) or bullish.
pub fn partition(table: &OhlcvTable) -> Partition {
    let mut groups = Partition::default();
    for (i, row) in table.iter().enumerate() {
        match Direction::of(row.open, row.close) {
            Direction::Bearish => groups.bearish.push(i),
            Direction::Bullish => groups.bullish.push(i),
        }
    }
    groups
}

/// `[min, headroom * max]` over open, high, low and close of every row.
pub fn price_range(table: &OhlcvTable, headroom: f64) -> Option<AxisRange> {
    if table.is_empty() {
        return None;
    }
    let (min, max) = table.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY),
        |(min, max), row| {
            let prices = [row.open, row.high, row.low, row.close];
            (
                prices.iter().copied().fold(min, f64::min),
                prices.iter().copied().fold(max, f64::max),
            )
        },
    );
    Some(AxisRange::new(min, headroom * max))
}

/// Word-wise title case: the first letter of every alphabetic run is
/// upper-cased and the rest lower-cased.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

/// Builds candlestick charts from OHLCV tables using a fixed configuration.
pub struct ChartBuilder<'a> {
    config: &'a ChartConfig,
}

impl<'a> ChartBuilder<'a> {
    pub fn new(config: &'a ChartConfig) -> Self {
        Self { config }
    }

    /// Check the table holds exactly one known region and return its
    /// code and display name.
    pub fn resolve_region<'t>(
        &self,
        table: &'t OhlcvTable,
    ) -> Result<(&'t str, &'a str), ChartError> {
        let regions: BTreeSet<&str> = table.iter().map(|row| row.region.as_str()).collect();
        let code = match regions.len() {
            0 => return Err(ChartError::NoData),
            1 => regions.into_iter().next().ok_or(ChartError::NoData)?,
            _ => {
                return Err(ChartError::MultipleRegions {
                    regions: regions.into_iter().map(str::to_string).collect(),
                })
            }
        };
        let name = self
            .config
            .regions
            .display_name(code)
            .ok_or_else(|| ChartError::UnknownRegion(code.to_string()))?;
        Ok((code, name))
    }

    /// Build the price and volume panels for a single-region table.
    pub fn build(&self, table: &OhlcvTable) -> Result<Chart, ChartError> {
        let (code, name) = self.resolve_region(table)?;
        let style = &self.config.style;

        log::debug!("Building {} candlestick chart from {} rows", code, table.len());
        if !table.is_sorted() {
            log::warn!("Rows for region '{}' are not ordered by timestamp", code);
        }
        let inconsistent = table.inconsistent_rows();
        if !inconsistent.is_empty() {
            log::warn!(
                "{} rows for region '{}' violate low <= open, close <= high (first at row {})",
                inconsistent.len(),
                code,
                inconsistent[0]
            );
        }

        let source = Self::column_source(table, style)?;
        let groups = partition(table);
        let y_range = price_range(table, style.price_headroom).ok_or(ChartError::NoData)?;
        let all_rows: Vec<usize> = (0..table.len()).collect();
        let tooltip = Self::tooltip(style);

        let price = Panel {
            title: Some(format!("{} Candlestick", title_case(name))),
            width: style.panel_width,
            height: style.price_height,
            background: style.background,
            x_axis: Axis {
                kind: AxisKind::DateTime,
                label: None,
                label_orientation: style.x_label_orientation,
            },
            y_axis: Axis {
                kind: AxisKind::Linear,
                label: Some(style.price_label.clone()),
                label_orientation: 0.0,
            },
            x_range: SHARED_X_RANGE,
            y_range: Some(y_range),
            layers: vec![
                Layer::Whiskers {
                    rows: all_rows.clone(),
                    color: style.whisker_color,
                },
                Layer::Bodies {
                    direction: Direction::Bearish,
                    rows: groups.bearish,
                    style: BarStyle {
                        fill: Some(style.bearish_color),
                        line: style.bearish_color,
                        line_width: style.body_line_width,
                        alpha: 1.0,
                    },
                },
                Layer::Bodies {
                    direction: Direction::Bullish,
                    rows: groups.bullish,
                    style: BarStyle {
                        fill: Some(style.bullish_fill),
                        line: style.bullish_color,
                        line_width: style.body_line_width,
                        alpha: 1.0,
                    },
                },
            ],
            tooltip: tooltip.clone(),
            tools: style.tools.clone(),
        };

        let volume = Panel {
            title: None,
            width: style.panel_width,
            height: style.volume_height,
            background: style.background,
            x_axis: Axis {
                kind: AxisKind::DateTime,
                label: Some(style.time_label.clone()),
                label_orientation: 0.0,
            },
            y_axis: Axis {
                kind: AxisKind::Linear,
                label: Some(style.volume_label.clone()),
                label_orientation: 0.0,
            },
            x_range: SHARED_X_RANGE,
            y_range: None,
            layers: vec![Layer::VolumeBars {
                rows: all_rows,
                style: BarStyle {
                    fill: Some(style.volume_color),
                    line: style.volume_color,
                    line_width: 1.0,
                    alpha: style.volume_alpha,
                },
            }],
            tooltip,
            tools: style.tools.clone(),
        };

        Ok(Chart {
            title: price.title.clone().unwrap_or_default(),
            region: code.to_string(),
            region_name: name.to_string(),
            source,
            price,
            volume,
        })
    }

    /// Copy the table into columns, converting seconds to milliseconds.
    fn column_source(table: &OhlcvTable, style: &ChartStyle) -> Result<ColumnSource, ChartError> {
        let n = table.len();
        let width_ms = style.body_width_secs as f64 * 1000.0;
        let timestamp = table
            .iter()
            .enumerate()
            .map(|(row, r)| {
                r.timestamp
                    .checked_mul(1000)
                    .ok_or(ChartError::TimestampOverflow {
                        row,
                        timestamp: r.timestamp,
                    })
            })
            .collect::<Result<Vec<i64>, ChartError>>()?;
        Ok(ColumnSource {
            timestamp,
            open: table.iter().map(|r| r.open).collect(),
            high: table.iter().map(|r| r.high).collect(),
            low: table.iter().map(|r| r.low).collect(),
            close: table.iter().map(|r| r.close).collect(),
            volume: table.iter().map(|r| r.volume).collect(),
            bottom: vec![0.0; n],
            width: vec![width_ms; n],
        })
    }

    fn tooltip(style: &ChartStyle) -> Tooltip {
        let number = |label: &str, field: Field| TooltipField {
            label: label.to_string(),
            field,
            format: FieldFormat::Number,
        };
        Tooltip {
            fields: vec![
                TooltipField {
                    label: "timestamp".to_string(),
                    field: Field::Timestamp,
                    format: FieldFormat::DateTime(style.datetime_format.clone()),
                },
                number("open", Field::Open),
                number("high", Field::High),
                number("low", Field::Low),
                number("close", Field::Close),
                number("volume", Field::Volume),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegionDirectory;
    use crate::data::OhlcvRow;

    const EPS: f64 = 1e-9;

    fn row(ts: i64, region: &str, o: f64, h: f64, l: f64, c: f64, v: f64) -> OhlcvRow {
        OhlcvRow::new(ts, region, o, h, l, c, v)
    }

    fn two_rows() -> OhlcvTable {
        OhlcvTable::new(vec![
            row(1000, "dk", 100.0, 110.0, 95.0, 105.0, 50.0),
            row(1060, "dk", 108.0, 115.0, 100.0, 103.0, 70.0),
        ])
    }

    #[test]
    fn test_build_single_region() {
        let config = ChartConfig::default();
        let chart = ChartBuilder::new(&config).build(&two_rows()).unwrap();
        assert_eq!(chart.title, "Denmark Candlestick");
        assert_eq!(chart.region, "dk");
        assert_eq!(chart.source.len(), 2);
        assert!(chart.x_linked());
        assert_eq!(chart.panels()[0].title.as_deref(), Some("Denmark Candlestick"));
        assert_eq!(chart.panels()[1].height, 200);
    }

    #[test]
    fn test_every_known_region_builds() {
        let config = ChartConfig::default();
        let builder = ChartBuilder::new(&config);
        for code in config.regions.codes() {
            let table = OhlcvTable::new(vec![row(0, code, 1.0, 2.0, 0.5, 1.5, 3.0)]);
            let chart = builder.build(&table).unwrap();
            let name = config.regions.display_name(code).unwrap();
            assert!(chart.title.to_lowercase().contains(&name.to_lowercase()));
        }
    }

    #[test]
    fn test_multiple_regions() {
        let config = ChartConfig::default();
        let table = OhlcvTable::new(vec![
            row(0, "dk", 1.0, 2.0, 0.5, 1.5, 3.0),
            row(1, "se", 1.0, 2.0, 0.5, 1.5, 3.0),
            row(2, "dk", 1.0, 2.0, 0.5, 1.5, 3.0),
            row(3, "xx", 1.0, 2.0, 0.5, 1.5, 3.0),
        ]);
        let err = ChartBuilder::new(&config).build(&table).unwrap_err();
        let expected: BTreeSet<String> =
            ["dk", "se", "xx"].iter().map(|s| s.to_string()).collect();
        assert_eq!(err, ChartError::MultipleRegions { regions: expected });
        assert_eq!(
            err.to_string(),
            "The input data has multiple regions ['dk', 'se', 'xx']"
        );
    }

    #[test]
    fn test_no_data() {
        let config = ChartConfig::default();
        let err = ChartBuilder::new(&config)
            .build(&OhlcvTable::default())
            .unwrap_err();
        assert_eq!(err, ChartError::NoData);
    }

    #[test]
    fn test_unknown_region() {
        let config = ChartConfig::new(
            [("se", "Sweden")].into_iter().collect::<RegionDirectory>(),
            ChartStyle::default(),
        );
        let table = OhlcvTable::new(vec![row(1000, "dk", 100.0, 110.0, 95.0, 90.0, 50.0)]);
        let err = ChartBuilder::new(&config).build(&table).unwrap_err();
        assert_eq!(err, ChartError::UnknownRegion("dk".to_string()));
        assert!(err.to_string().contains("dk"));
    }

    #[test]
    fn test_single_bearish_row() {
        let config = ChartConfig::new(
            [("dk", "Denmark")].into_iter().collect::<RegionDirectory>(),
            ChartStyle::default(),
        );
        let table = OhlcvTable::new(vec![row(1000, "dk", 100.0, 110.0, 95.0, 90.0, 50.0)]);
        let chart = ChartBuilder::new(&config).build(&table).unwrap();

        assert!(chart.title.contains("Denmark"));
        assert_eq!(chart.rows_for(Direction::Bearish), &[0]);
        assert!(chart.rows_for(Direction::Bullish).is_empty());
        assert_eq!(chart.source.timestamp, vec![1_000_000]);
        assert_eq!(chart.source.bottom, vec![0.0]);
        assert_eq!(chart.source.volume, vec![50.0]);
        assert_eq!(chart.source.width, vec![20_000.0]);
        match &chart.volume.layers[..] {
            [Layer::VolumeBars { rows, .. }] => assert_eq!(rows, &vec![0]),
            other => panic!("unexpected volume layers: {:?}", other),
        }
    }

    #[test]
    fn test_partition_is_exhaustive_and_disjoint() {
        let table = OhlcvTable::new(vec![
            row(0, "dk", 10.0, 12.0, 9.0, 11.0, 1.0),
            row(1, "dk", 10.0, 12.0, 9.0, 10.0, 1.0),
            row(2, "dk", 10.0, 12.0, 9.0, 9.5, 1.0),
            row(3, "dk", 10.0, 12.0, 9.0, 10.01, 1.0),
        ]);
        let groups = partition(&table);
        assert_eq!(groups.bearish, vec![1, 2]);
        assert_eq!(groups.bullish, vec![0, 3]);

        let mut all: Vec<usize> = groups.bearish.iter().chain(&groups.bullish).copied().collect();
        all.sort();
        assert_eq!(all, (0..table.len()).collect::<Vec<_>>());
    }

    #[test]
    fn test_price_range() {
        let range = price_range(&two_rows(), 1.1).unwrap();
        assert!((range.start - 95.0).abs() < EPS);
        assert!((range.end - 126.5).abs() < EPS);
        assert!(price_range(&OhlcvTable::default(), 1.1).is_none());

        let config = ChartConfig::default();
        let chart = ChartBuilder::new(&config).build(&two_rows()).unwrap();
        assert_eq!(chart.price_range(), Some(range));
        assert_eq!(chart.volume.y_range, None);
    }

    #[test]
    fn test_whiskers_cover_every_row() {
        let config = ChartConfig::default();
        let chart = ChartBuilder::new(&config).build(&two_rows()).unwrap();
        let whiskers = chart.price.layers.iter().find_map(|layer| match layer {
            Layer::Whiskers { rows, color } => Some((rows.clone(), *color)),
            _ => None,
        });
        assert_eq!(whiskers, Some((vec![0, 1], config.style.whisker_color)));
    }

    #[test]
    fn test_body_styles() {
        let config = ChartConfig::default();
        let chart = ChartBuilder::new(&config).build(&two_rows()).unwrap();
        for layer in &chart.price.layers {
            if let Layer::Bodies { direction, style, .. } = layer {
                assert_eq!(style.line_width, 2.0);
                match direction {
                    Direction::Bearish => {
                        assert_eq!(style.fill, Some(config.style.bearish_color));
                        assert_eq!(style.line, config.style.bearish_color);
                    }
                    Direction::Bullish => {
                        assert_eq!(style.fill, Some(config.style.bullish_fill));
                        assert_eq!(style.line, config.style.bullish_color);
                    }
                }
            }
        }
    }

    #[test]
    fn test_tooltip_on_both_panels() {
        let config = ChartConfig::default();
        let chart = ChartBuilder::new(&config).build(&two_rows()).unwrap();
        assert_eq!(chart.price.tooltip, chart.volume.tooltip);
        let labels: Vec<String> = chart
            .price
            .tooltip
            .render(&chart.source, 0)
            .into_iter()
            .map(|(label, _)| label)
            .collect();
        assert_eq!(labels, vec!["timestamp", "open", "high", "low", "close", "volume"]);
        assert!(chart
            .volume
            .tooltip
            .render_text(&chart.source, 0)
            .starts_with("timestamp: 1970-01-01 00:16:40"));
    }

    #[test]
    fn test_build_is_deterministic() {
        let config = ChartConfig::default();
        let builder = ChartBuilder::new(&config);
        let first = builder.build(&two_rows()).unwrap();
        let second = builder.build(&two_rows()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.price_range(), second.price_range());
    }

    #[test]
    fn test_unsorted_and_inconsistent_rows_still_build() {
        let config = ChartConfig::default();
        let table = OhlcvTable::new(vec![
            row(2000, "dk", 100.0, 90.0, 95.0, 105.0, 1.0),
            row(1000, "dk", 100.0, 110.0, 95.0, 105.0, 1.0),
        ]);
        assert!(ChartBuilder::new(&config).build(&table).is_ok());
    }

    #[test]
    fn test_timestamp_overflow_is_an_error() {
        let config = ChartConfig::default();
        let ts = i64::MAX / 100;
        let table = OhlcvTable::new(vec![
            row(1000, "dk", 100.0, 110.0, 95.0, 105.0, 1.0),
            row(ts, "dk", 100.0, 110.0, 95.0, 105.0, 1.0),
        ]);
        let err = ChartBuilder::new(&config).build(&table).unwrap_err();
        assert_eq!(err, ChartError::TimestampOverflow { row: 1, timestamp: ts });
    }

    #[test]
    fn test_huge_body_width_does_not_panic() {
        let mut style = ChartStyle::default();
        style.body_width_secs = i64::MAX;
        let config = ChartConfig::new(RegionDirectory::default(), style);
        let chart = ChartBuilder::new(&config).build(&two_rows()).unwrap();
        assert!(chart.source.width.iter().all(|w| *w > 0.0 && w.is_finite()));
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("Denmark"), "Denmark");
        assert_eq!(title_case("CzechRepublic"), "Czechrepublic");
        assert_eq!(title_case("UK"), "Uk");
        assert_eq!(title_case("new zealand"), "New Zealand");
        assert_eq!(title_case("o'neil"), "O'Neil");
    }

    #[test]
    fn test_chart_json_hand_off() {
        let config = ChartConfig::default();
        let chart = ChartBuilder::new(&config).build(&two_rows()).unwrap();
        let json = chart.to_json().unwrap();
        assert!(json.contains("\"title\": \"Denmark Candlestick\""));
        assert!(json.contains("#eb3c40"));
        let back: Chart = serde_json::from_str(&json).unwrap();
        assert_eq!(back.title, chart.title);
        assert_eq!(back.source, chart.source);
        assert_eq!(back.price.layers, chart.price.layers);
    }
}
