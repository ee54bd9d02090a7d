//! CSV Data Loader Module
//! Handles CSV file loading and conversion to OHLCV tables using Polars.

use super::{DataProcessor, OhlcvTable, ProcessorError};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("Failed to process data: {0}")]
    Process(#[from] ProcessorError),
    #[error("Missing required column '{0}'")]
    MissingColumn(String),
    #[error("Null value in column '{column}' at row {row}")]
    NullValue { column: String, row: usize },
    #[error("Invalid timestamp '{value}' at row {row}")]
    InvalidTimestamp { row: usize, value: String },
    #[error("No data loaded")]
    NoData,
}

/// Handles CSV file loading with Polars for high performance.
pub struct DataLoader {
    df: Option<DataFrame>,
    file_path: Option<PathBuf>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    pub fn new() -> Self {
        Self {
            df: None,
            file_path: None,
        }
    }

    /// Read a CSV file into a DataFrame without keeping it.
    pub fn read_csv(file_path: &Path) -> Result<DataFrame, LoaderError> {
        // Use lazy evaluation for memory efficiency, then collect
        let df = LazyCsvReader::new(file_path)
            .with_infer_schema_length(Some(10000))
            .with_ignore_errors(true)
            .finish()?
            .collect()?;
        log::info!(
            "Loaded {} rows, {} columns from {}",
            df.height(),
            df.width(),
            file_path.display()
        );
        Ok(df)
    }

    /// Load a CSV file using Polars.
    pub fn load_csv(&mut self, file_path: impl AsRef<Path>) -> Result<&DataFrame, LoaderError> {
        let file_path = file_path.as_ref();
        self.file_path = Some(file_path.to_path_buf());
        self.df = Some(Self::read_csv(file_path)?);
        self.df.as_ref().ok_or(LoaderError::NoData)
    }

    /// Get list of column names from loaded DataFrame.
    pub fn get_columns(&self) -> Vec<String> {
        self.df
            .as_ref()
            .map(|df| {
                df.get_column_names()
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Region codes present in the loaded data.
    pub fn get_regions(&self) -> Vec<String> {
        self.df
            .as_ref()
            .map(DataProcessor::get_regions)
            .unwrap_or_default()
    }

    /// All loaded rows as one table, regardless of region.
    pub fn table(&self) -> Result<OhlcvTable, LoaderError> {
        let df = self.df.as_ref().ok_or(LoaderError::NoData)?;
        OhlcvTable::from_dataframe(df)
    }

    /// Rows of a single region, ordered by timestamp.
    pub fn table_for_region(&self, region: &str) -> Result<OhlcvTable, LoaderError> {
        let df = self.df.as_ref().ok_or(LoaderError::NoData)?;
        let filtered = DataProcessor::filter_by_region(df, region)?;
        OhlcvTable::from_dataframe(&filtered)
    }

    /// Get the number of rows in the DataFrame.
    pub fn get_row_count(&self) -> usize {
        self.df.as_ref().map(|df| df.height()).unwrap_or(0)
    }

    /// Get a reference to the loaded DataFrame.
    pub fn get_dataframe(&self) -> Option<&DataFrame> {
        self.df.as_ref()
    }

    /// Get file path.
    pub fn get_file_path(&self) -> Option<&PathBuf> {
        self.file_path.as_ref()
    }

    /// Set DataFrame directly (used for async loading)
    pub fn set_dataframe(&mut self, df: DataFrame) {
        self.df = Some(df);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const CSV: &str = "timestamp,region,open,high,low,close,volume\n\
                       1060,dk,108,115,100,103,70\n\
                       1000,dk,100,110,95,105,50\n\
                       1000,se,10,11,9,10.5,5\n";

    fn write_csv(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "region_candles_{}_{}.csv",
            name,
            std::process::id()
        ));
        fs::write(&path, CSV).unwrap();
        path
    }

    #[test]
    fn test_load_csv() {
        let path = write_csv("load");
        let mut loader = DataLoader::new();
        loader.load_csv(&path).unwrap();
        assert_eq!(loader.get_row_count(), 3);
        assert_eq!(loader.get_columns().len(), 7);
        assert_eq!(loader.get_regions(), vec!["dk", "se"]);
        assert_eq!(loader.get_file_path(), Some(&path));
        fs::remove_file(path).ok();
    }

    #[test]
    fn test_table_for_region() {
        let path = write_csv("region");
        let mut loader = DataLoader::new();
        loader.load_csv(&path).unwrap();
        let table = loader.table_for_region("dk").unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.is_sorted());
        assert_eq!(table.rows()[0].timestamp, 1000);
        assert_eq!(table.rows()[1].close, 103.0);
        assert_eq!(loader.table().unwrap().regions().len(), 2);
        fs::remove_file(path).ok();
    }

    #[test]
    fn test_nothing_loaded() {
        let loader = DataLoader::new();
        assert!(loader.get_regions().is_empty());
        assert!(matches!(loader.table(), Err(LoaderError::NoData)));
    }
}
