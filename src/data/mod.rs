//! Data module - OHLCV tables, CSV loading and region filtering

mod loader;
mod processor;
mod table;

pub use loader::{DataLoader, LoaderError};
pub use processor::{DataProcessor, ProcessorError};
pub use table::{OhlcvRow, OhlcvTable, REQUIRED_COLUMNS};
