//! Region Candles - Candlestick & Volume Chart Viewer
//!
//! Desktop viewer for single-region OHLCV CSV files.

mod gui;

use eframe::egui;
use gui::CandlesApp;

fn main() -> eframe::Result<()> {
    env_logger::init();

    // Configure native options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 800.0])
            .with_min_inner_size([1200.0, 700.0])
            .with_title("Region Candles"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "Region Candles",
        options,
        Box::new(|cc| Ok(Box::new(CandlesApp::new(cc)))),
    )
}
