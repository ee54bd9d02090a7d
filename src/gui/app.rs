//! Region Candles Main Application
//! Main window with control panel and chart viewer.

use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction};
use anyhow::{Context, Result};
use egui::SidePanel;
use polars::prelude::DataFrame;
use region_candles::charts::StaticChartRenderer;
use region_candles::data::{DataLoader, DataProcessor};
use region_candles::{Chart, ChartBuilder, ChartConfig};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};
use std::thread;

/// CSV loading result from background thread
enum LoadResult {
    Progress(String),
    Complete {
        df: DataFrame,
        regions: Vec<String>,
        row_count: usize,
    },
    Error(String),
}

/// Export targets offered by the control panel.
#[derive(Debug, Clone, Copy)]
enum ExportFormat {
    Png,
    Svg,
    Json,
}

impl ExportFormat {
    fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Svg => "svg",
            ExportFormat::Json => "json",
        }
    }

    fn filter_name(self) -> &'static str {
        match self {
            ExportFormat::Png => "PNG Image",
            ExportFormat::Svg => "SVG Image",
            ExportFormat::Json => "Chart JSON",
        }
    }

    fn write(self, chart: &Chart, path: &Path) -> Result<()> {
        match self {
            ExportFormat::Png => StaticChartRenderer::render_png(chart, path)
                .with_context(|| format!("rendering {}", path.display()))?,
            ExportFormat::Svg => {
                let svg = StaticChartRenderer::render_svg(chart).context("rendering SVG")?;
                fs::write(path, svg).with_context(|| format!("writing {}", path.display()))?;
            }
            ExportFormat::Json => {
                let json = chart.to_json().context("serializing chart")?;
                fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            }
        }
        Ok(())
    }
}

/// Main application window.
pub struct CandlesApp {
    loader: DataLoader,
    config: ChartConfig,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,

    // Async CSV loading
    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,
}

impl CandlesApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        Self {
            loader: DataLoader::new(),
            config: ChartConfig::default(),
            control_panel: ControlPanel::new(),
            chart_viewer: ChartViewer::new(),
            load_rx: None,
            is_loading: false,
        }
    }

    /// Handle CSV file selection, loading in the background
    fn handle_browse_csv(&mut self) {
        if self.is_loading {
            return; // Already loading
        }

        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .pick_file()
        {
            // Clear previous chart
            self.chart_viewer.clear();
            self.control_panel.export_enabled = false;
            self.control_panel.settings.csv_path = Some(path.clone());
            self.control_panel.set_progress(0.0, "Loading CSV file...");
            self.is_loading = true;

            let (tx, rx) = channel();
            self.load_rx = Some(rx);

            // Load CSV in background thread
            thread::spawn(move || {
                let _ = tx.send(LoadResult::Progress("Reading CSV file...".to_string()));

                match DataLoader::read_csv(&path) {
                    Ok(df) => {
                        let regions = DataProcessor::get_regions(&df);
                        let row_count = df.height();
                        let _ = tx.send(LoadResult::Complete {
                            df,
                            regions,
                            row_count,
                        });
                    }
                    Err(e) => {
                        let _ = tx.send(LoadResult::Error(e.to_string()));
                    }
                }
            });
        }
    }

    /// Check for CSV loading results
    fn check_load_results(&mut self) {
        let rx = self.load_rx.take();
        if let Some(rx) = rx {
            let mut should_keep_receiver = true;

            while let Ok(result) = rx.try_recv() {
                match result {
                    LoadResult::Progress(status) => {
                        self.control_panel.set_progress(0.0, &status);
                    }
                    LoadResult::Complete {
                        df,
                        regions,
                        row_count,
                    } => {
                        self.loader.set_dataframe(df);
                        let region_count = regions.len();
                        self.control_panel.update_regions(regions);
                        self.control_panel.set_progress(
                            0.0,
                            &format!("Loaded {} rows, {} regions", row_count, region_count),
                        );
                        self.is_loading = false;
                        should_keep_receiver = false;
                    }
                    LoadResult::Error(error) => {
                        log::error!("CSV load failed: {}", error);
                        self.control_panel
                            .set_progress(0.0, &format!("Error: {}", error));
                        self.is_loading = false;
                        should_keep_receiver = false;
                    }
                }
            }

            if should_keep_receiver {
                self.load_rx = Some(rx);
            }
        }
    }

    /// Replace the chart config with one read from a JSON file
    fn handle_load_config(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Chart Config", &["json"])
            .pick_file()
        else {
            return;
        };

        match ChartConfig::from_json_file(&path) {
            Ok(config) => {
                self.config = config;
                self.control_panel.settings.config_path = Some(path);
                self.control_panel.set_progress(0.0, "Config loaded");
            }
            Err(e) => {
                log::error!("Config load failed: {}", e);
                self.control_panel
                    .set_progress(0.0, &format!("Error: {}", e));
            }
        }
    }

    fn build_chart(&self) -> Result<Chart> {
        let table = match &self.control_panel.settings.region {
            Some(region) => self
                .loader
                .table_for_region(region)
                .with_context(|| format!("reading rows for region '{}'", region))?,
            None => self.loader.table().context("reading rows")?,
        };
        let chart = ChartBuilder::new(&self.config).build(&table)?;
        Ok(chart)
    }

    fn handle_build_chart(&mut self) {
        match self.build_chart() {
            Ok(chart) => {
                let status = format!(
                    "Complete! {} ({} candles)",
                    chart.title,
                    chart.source.len()
                );
                self.chart_viewer.set_chart(chart);
                self.control_panel.export_enabled = true;
                self.control_panel.set_progress(100.0, &status);
            }
            Err(e) => {
                log::error!("Chart build failed: {:#}", e);
                self.chart_viewer.clear();
                self.control_panel.export_enabled = false;
                self.control_panel
                    .set_progress(0.0, &format!("Error: {:#}", e));
            }
        }
    }

    /// Ask for a destination and write the current chart
    fn handle_export(&mut self, format: ExportFormat) {
        let Some(chart) = self.chart_viewer.chart() else {
            self.control_panel.set_progress(0.0, "No chart to export");
            return;
        };

        let default_name = format!("{}_candles.{}", chart.region, format.extension());
        let Some(path) = rfd::FileDialog::new()
            .add_filter(format.filter_name(), &[format.extension()])
            .set_file_name(default_name)
            .save_file()
        else {
            return; // User cancelled
        };

        match format.write(chart, &path) {
            Ok(()) => {
                self.control_panel
                    .set_progress(100.0, &format!("Exported {}", path.display()));
                Self::open_exported(path);
            }
            Err(e) => {
                log::error!("Export failed: {:#}", e);
                self.control_panel
                    .set_progress(0.0, &format!("Error: {:#}", e));
            }
        }
    }

    fn open_exported(path: PathBuf) {
        if let Err(e) = open::that(&path) {
            log::warn!("Could not open {}: {}", path.display(), e);
        }
    }
}

impl eframe::App for CandlesApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Check for background results
        self.check_load_results();

        // Request repaint while loading
        if self.is_loading {
            ctx.request_repaint();
        }

        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(300.0)
            .max_width(350.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let action = self.control_panel.show(ui, &self.config.regions);

                    match action {
                        ControlPanelAction::BrowseCsv => self.handle_browse_csv(),
                        ControlPanelAction::LoadConfig => self.handle_load_config(),
                        ControlPanelAction::BuildChart => {
                            if !self.is_loading {
                                self.handle_build_chart();
                            }
                        }
                        ControlPanelAction::ExportPng => self.handle_export(ExportFormat::Png),
                        ControlPanelAction::ExportSvg => self.handle_export(ExportFormat::Svg),
                        ControlPanelAction::ExportJson => self.handle_export(ExportFormat::Json),
                        ControlPanelAction::None => {}
                    }
                });
            });

        // Central panel - Chart Viewer
        egui::CentralPanel::default().show(ctx, |ui| {
            self.chart_viewer.show(ui);
        });
    }
}
