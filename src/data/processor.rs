//! Data Processor Module
//! Region discovery and per-region filtering ahead of chart building.

use polars::prelude::*;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// Upstream region selection over a loaded OHLCV DataFrame.
pub struct DataProcessor;

impl DataProcessor {
    /// Get unique region codes, sorted.
    pub fn get_regions(df: &DataFrame) -> Vec<String> {
        df.column("region")
            .ok()
            .and_then(|col| col.unique().ok())
            .map(|unique| {
                let series = unique.as_materialized_series();
                let mut regions: Vec<String> = (0..series.len())
                    .filter_map(|i| {
                        let val = series.get(i).ok()?;
                        if val.is_null() {
                            None
                        } else {
                            Some(val.to_string().trim_matches('"').to_string())
                        }
                    })
                    .collect();
                regions.sort();
                regions
            })
            .unwrap_or_default()
    }

    /// Keep only the rows of one region, ordered by timestamp.
    pub fn filter_by_region(df: &DataFrame, region: &str) -> Result<DataFrame, ProcessorError> {
        let filtered = df
            .clone()
            .lazy()
            .filter(col("region").eq(lit(region)))
            .sort(["timestamp"], SortMultipleOptions::default())
            .collect()?;
        Ok(filtered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mixed_df() -> DataFrame {
        DataFrame::new(vec![
            Column::new("timestamp".into(), vec![3000i64, 1000, 2000, 1500]),
            Column::new("region".into(), vec!["dk", "dk", "se", "dk"]),
            Column::new("open".into(), vec![1.0, 2.0, 3.0, 4.0]),
        ])
        .unwrap()
    }

    #[test]
    fn test_get_regions() {
        assert_eq!(DataProcessor::get_regions(&mixed_df()), vec!["dk", "se"]);
    }

    #[test]
    fn test_get_regions_missing_column() {
        let df = mixed_df().drop("region").unwrap();
        assert!(DataProcessor::get_regions(&df).is_empty());
    }

    #[test]
    fn test_filter_by_region_sorts() {
        let filtered = DataProcessor::filter_by_region(&mixed_df(), "dk").unwrap();
        assert_eq!(filtered.height(), 3);
        let ts: Vec<Option<i64>> = filtered
            .column("timestamp")
            .unwrap()
            .i64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(ts, vec![Some(1000), Some(1500), Some(3000)]);
    }

    #[test]
    fn test_filter_by_unknown_region_is_empty() {
        let filtered = DataProcessor::filter_by_region(&mixed_df(), "gb").unwrap();
        assert_eq!(filtered.height(), 0);
    }
}
