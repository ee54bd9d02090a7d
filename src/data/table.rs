//! OHLCV Table Module
//! Row-oriented OHLCV samples and conversion from a Polars DataFrame.

use super::LoaderError;
use chrono::{DateTime, NaiveDateTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Columns an OHLCV DataFrame must provide.
pub const REQUIRED_COLUMNS: [&str; 7] =
    ["timestamp", "region", "open", "high", "low", "close", "volume"];

/// One sample of a region's time series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcvRow {
    /// Seconds since the Unix epoch.
    pub timestamp: i64,
    pub region: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl OhlcvRow {
    pub fn new(
        timestamp: i64,
        region: impl Into<String>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            region: region.into(),
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// `low <= open, close <= high`, all values finite and volume non-negative.
    pub fn is_consistent(&self) -> bool {
        let values = [self.open, self.high, self.low, self.close, self.volume];
        values.iter().all(|v| v.is_finite())
            && self.low <= self.open.min(self.close)
            && self.open.max(self.close) <= self.high
            && self.volume >= 0.0
    }
}

/// Ordered OHLCV samples, normally ascending by timestamp.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OhlcvTable {
    rows: Vec<OhlcvRow>,
}

impl From<Vec<OhlcvRow>> for OhlcvTable {
    fn from(rows: Vec<OhlcvRow>) -> Self {
        Self::new(rows)
    }
}

impl FromIterator<OhlcvRow> for OhlcvTable {
    fn from_iter<I: IntoIterator<Item = OhlcvRow>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl OhlcvTable {
    pub fn new(rows: Vec<OhlcvRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[OhlcvRow] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, OhlcvRow> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct region codes present, sorted.
    pub fn regions(&self) -> BTreeSet<String> {
        self.rows.iter().map(|row| row.region.clone()).collect()
    }

    /// True when timestamps never decrease.
    pub fn is_sorted(&self) -> bool {
        self.rows
            .windows(2)
            .all(|pair| pair[0].timestamp <= pair[1].timestamp)
    }

    /// Indices of rows failing [`OhlcvRow::is_consistent`].
    pub fn inconsistent_rows(&self) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| !row.is_consistent())
            .map(|(i, _)| i)
            .collect()
    }

    /// Build a table from a DataFrame holding [`REQUIRED_COLUMNS`].
    ///
    /// `timestamp` may be integer seconds, a Datetime of any unit, or a
    /// string (`%Y-%m-%d %H:%M:%S` or RFC 3339).
    pub fn from_dataframe(df: &DataFrame) -> Result<Self, LoaderError> {
        for name in REQUIRED_COLUMNS {
            if df.column(name).is_err() {
                return Err(LoaderError::MissingColumn(name.to_string()));
            }
        }

        let timestamps = timestamp_seconds(df.column("timestamp")?)?;
        let regions = string_values(df.column("region")?)?;
        let open = float_values(df.column("open")?)?;
        let high = float_values(df.column("high")?)?;
        let low = float_values(df.column("low")?)?;
        let close = float_values(df.column("close")?)?;
        let volume = float_values(df.column("volume")?)?;

        let rows = (0..df.height())
            .map(|i| OhlcvRow {
                timestamp: timestamps[i],
                region: regions[i].clone(),
                open: open[i],
                high: high[i],
                low: low[i],
                close: close[i],
                volume: volume[i],
            })
            .collect();

        Ok(Self { rows })
    }
}

fn null_value(column: &Column, row: usize) -> LoaderError {
    LoaderError::NullValue {
        column: column.name().to_string(),
        row,
    }
}

fn float_values(column: &Column) -> Result<Vec<f64>, LoaderError> {
    let cast = column.cast(&DataType::Float64)?;
    let values = cast.f64()?;
    (0..values.len())
        .map(|i| values.get(i).ok_or_else(|| null_value(column, i)))
        .collect()
}

fn string_values(column: &Column) -> Result<Vec<String>, LoaderError> {
    let cast = column.cast(&DataType::String)?;
    let values = cast.as_materialized_series().str()?;
    (0..values.len())
        .map(|i| {
            values
                .get(i)
                .map(|s| s.trim().to_string())
                .ok_or_else(|| null_value(column, i))
        })
        .collect()
}

fn timestamp_seconds(column: &Column) -> Result<Vec<i64>, LoaderError> {
    match column.dtype() {
        DataType::Datetime(unit, _) => {
            let per_second = match unit {
                TimeUnit::Nanoseconds => 1_000_000_000,
                TimeUnit::Microseconds => 1_000_000,
                TimeUnit::Milliseconds => 1_000,
            };
            let raw = column.cast(&DataType::Int64)?;
            let values = raw.i64()?;
            (0..values.len())
                .map(|i| {
                    values
                        .get(i)
                        .map(|v| v.div_euclid(per_second))
                        .ok_or_else(|| null_value(column, i))
                })
                .collect()
        }
        DataType::String => {
            let values = column.as_materialized_series().str()?;
            (0..values.len())
                .map(|i| {
                    let text = values.get(i).ok_or_else(|| null_value(column, i))?;
                    parse_timestamp(text).ok_or_else(|| LoaderError::InvalidTimestamp {
                        row: i,
                        value: text.to_string(),
                    })
                })
                .collect()
        }
        _ => {
            let raw = column.cast(&DataType::Int64)?;
            let values = raw.i64()?;
            (0..values.len())
                .map(|i| values.get(i).ok_or_else(|| null_value(column, i)))
                .collect()
        }
    }
}

/// Parse epoch seconds, `%Y-%m-%d %H:%M:%S` (UTC) or RFC 3339.
fn parse_timestamp(text: &str) -> Option<i64> {
    let text = text.trim();
    if let Ok(secs) = text.parse::<i64>() {
        return Some(secs);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc().timestamp());
    }
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn df_with(timestamp: Column, close: Column) -> DataFrame {
        DataFrame::new(vec![
            timestamp,
            Column::new("region".into(), vec!["dk", "dk"]),
            Column::new("open".into(), vec![100.0, 108.0]),
            Column::new("high".into(), vec![110.0, 115.0]),
            Column::new("low".into(), vec![95.0, 100.0]),
            close,
            Column::new("volume".into(), vec![50i64, 70]),
        ])
        .unwrap()
    }

    fn sample_df() -> DataFrame {
        df_with(
            Column::new("timestamp".into(), vec![1000i64, 1060]),
            Column::new("close".into(), vec![105.0, 103.0]),
        )
    }

    #[test]
    fn test_from_dataframe() {
        let table = OhlcvTable::from_dataframe(&sample_df()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.rows()[0],
            OhlcvRow::new(1000, "dk", 100.0, 110.0, 95.0, 105.0, 50.0)
        );
        assert_eq!(table.rows()[1].volume, 70.0);
    }

    #[test]
    fn test_missing_column() {
        let df = sample_df().drop("volume").unwrap();
        match OhlcvTable::from_dataframe(&df) {
            Err(LoaderError::MissingColumn(name)) => assert_eq!(name, "volume"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_string_timestamps() {
        let df = df_with(
            Column::new(
                "timestamp".into(),
                vec!["1970-01-01 00:16:40", "1970-01-01T00:17:40Z"],
            ),
            Column::new("close".into(), vec![105.0, 103.0]),
        );
        let table = OhlcvTable::from_dataframe(&df).unwrap();
        assert_eq!(table.rows()[0].timestamp, 1000);
        assert_eq!(table.rows()[1].timestamp, 1060);
    }

    #[test]
    fn test_bad_string_timestamp() {
        let df = df_with(
            Column::new("timestamp".into(), vec!["1000", "yesterday"]),
            Column::new("close".into(), vec![105.0, 103.0]),
        );
        assert!(matches!(
            OhlcvTable::from_dataframe(&df),
            Err(LoaderError::InvalidTimestamp { row: 1, .. })
        ));
    }

    #[test]
    fn test_null_price() {
        let df = df_with(
            Column::new("timestamp".into(), vec![1000i64, 1060]),
            Column::new("close".into(), vec![Some(105.0), None]),
        );
        assert!(matches!(
            OhlcvTable::from_dataframe(&df),
            Err(LoaderError::NullValue { row: 1, .. })
        ));
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert_eq!(parse_timestamp(" 42 "), Some(42));
        assert_eq!(parse_timestamp("1970-01-02 00:00:00"), Some(86_400));
        assert_eq!(parse_timestamp("1970-01-01T01:00:00+01:00"), Some(0));
        assert_eq!(parse_timestamp("not a date"), None);
    }

    #[test]
    fn test_regions_and_ordering() {
        let table = OhlcvTable::new(vec![
            OhlcvRow::new(2000, "se", 1.0, 2.0, 0.5, 1.5, 1.0),
            OhlcvRow::new(1000, "dk", 1.0, 2.0, 0.5, 1.5, 1.0),
            OhlcvRow::new(3000, "dk", 1.0, 2.0, 0.5, 1.5, 1.0),
        ]);
        let regions: Vec<String> = table.regions().into_iter().collect();
        assert_eq!(regions, vec!["dk", "se"]);
        assert!(!table.is_sorted());
        assert!(OhlcvTable::default().is_sorted());
    }

    #[test]
    fn test_inconsistent_rows() {
        let table = OhlcvTable::new(vec![
            OhlcvRow::new(0, "dk", 100.0, 110.0, 95.0, 105.0, 1.0),
            OhlcvRow::new(1, "dk", 100.0, 99.0, 95.0, 105.0, 1.0),
            OhlcvRow::new(2, "dk", 100.0, 110.0, 95.0, f64::NAN, 1.0),
            OhlcvRow::new(3, "dk", 100.0, 110.0, 95.0, 105.0, -1.0),
        ]);
        assert_eq!(table.inconsistent_rows(), vec![1, 2, 3]);
    }
}
