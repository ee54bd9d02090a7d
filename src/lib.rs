//! Region Candles - Single-region OHLCV candlestick charts
//!
//! Validates an OHLCV table that covers exactly one market region and turns
//! it into a backend-agnostic two-panel chart description (price candles over
//! traded volume, linked time axis). Adapters draw that description with
//! egui_plot, render it to PNG/SVG with plotters, or export it as JSON.

pub mod charts;
pub mod config;
pub mod data;

pub use charts::{Chart, ChartBuilder, ChartError};
pub use config::{ChartConfig, ChartStyle, RegionDirectory};
pub use data::{DataLoader, OhlcvRow, OhlcvTable};
