//! Control Panel Widget
//! Left side panel with file selection, region choice and export controls.

use egui::{Color32, ComboBox, RichText};
use region_candles::RegionDirectory;
use std::path::PathBuf;

/// Label used in the region combo for "no filtering".
const ALL_ROWS: &str = "(all rows)";

/// User selections
#[derive(Default, Clone)]
pub struct UserSettings {
    pub csv_path: Option<PathBuf>,
    pub config_path: Option<PathBuf>,
    /// `None` charts every loaded row unfiltered.
    pub region: Option<String>,
}

/// Left side control panel with file selection and chart controls.
pub struct ControlPanel {
    pub settings: UserSettings,
    pub regions: Vec<String>,
    pub progress: f32,
    pub status: String,
    pub build_enabled: bool,
    pub export_enabled: bool,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self {
            settings: UserSettings::default(),
            regions: Vec::new(),
            progress: 0.0,
            status: "Ready".to_string(),
            build_enabled: false,
            export_enabled: false,
        }
    }
}

impl ControlPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update available regions after CSV load
    pub fn update_regions(&mut self, regions: Vec<String>) {
        self.settings.region = regions.first().cloned();
        self.build_enabled = !regions.is_empty();
        self.regions = regions;
    }

    fn region_label(code: Option<&str>, directory: &RegionDirectory) -> String {
        match code {
            None => ALL_ROWS.to_string(),
            Some(code) => match directory.display_name(code) {
                Some(name) => format!("{} ({})", name, code),
                None => format!("{} (unknown)", code),
            },
        }
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui, directory: &RegionDirectory) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        // Title
        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("🕯 Region Candles")
                    .size(22.0)
                    .color(Color32::from_rgb(73, 163, 163)),
            );
            ui.label(
                RichText::new("OHLCV Chart Viewer")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== CSV File Section =====
        ui.label(RichText::new("📁 Data Source").size(14.0).strong());
        ui.add_space(5.0);
        if Self::file_row(ui, self.settings.csv_path.as_ref(), "No file selected") {
            action = ControlPanelAction::BrowseCsv;
        }

        ui.add_space(10.0);

        // ===== Config Section =====
        ui.label(RichText::new("⚙️ Chart Config").size(14.0).strong());
        ui.add_space(5.0);
        if Self::file_row(ui, self.settings.config_path.as_ref(), "Built-in defaults") {
            action = ControlPanelAction::LoadConfig;
        }
        ui.label(
            RichText::new(format!("{} regions known", directory.len()))
                .size(11.0)
                .color(Color32::GRAY),
        );

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Region Section =====
        ui.label(RichText::new("🌍 Region").size(14.0).strong());
        ui.add_space(8.0);

        let selected = Self::region_label(self.settings.region.as_deref(), directory);
        ComboBox::from_id_salt("region")
            .width(220.0)
            .selected_text(selected)
            .show_ui(ui, |ui| {
                for region in &self.regions {
                    let label = Self::region_label(Some(region), directory);
                    let is_selected = self.settings.region.as_deref() == Some(region.as_str());
                    if ui.selectable_label(is_selected, label).clicked() {
                        self.settings.region = Some(region.clone());
                    }
                }
                if ui
                    .selectable_label(self.settings.region.is_none(), ALL_ROWS)
                    .clicked()
                {
                    self.settings.region = None;
                }
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Action Buttons =====
        ui.vertical_centered(|ui| {
            ui.add_enabled_ui(self.build_enabled, |ui| {
                let button = egui::Button::new(RichText::new("▶ Build Chart").size(16.0))
                    .min_size(egui::vec2(200.0, 35.0));
                if ui.add(button).clicked() {
                    action = ControlPanelAction::BuildChart;
                }
            });

            ui.add_space(8.0);

            ui.add_enabled_ui(self.export_enabled, |ui| {
                ui.horizontal(|ui| {
                    if ui.button("🖼 PNG").clicked() {
                        action = ControlPanelAction::ExportPng;
                    }
                    if ui.button("✏ SVG").clicked() {
                        action = ControlPanelAction::ExportSvg;
                    }
                    if ui.button("📄 JSON").clicked() {
                        action = ControlPanelAction::ExportJson;
                    }
                });
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Progress Section =====
        ui.label(RichText::new("📊 Status").size(14.0).strong());
        ui.add_space(5.0);

        ui.add(
            egui::ProgressBar::new(self.progress / 100.0)
                .show_percentage()
                .animate(self.progress > 0.0 && self.progress < 100.0),
        );

        ui.add_space(5.0);

        let status_color = if self.status.contains("Error") {
            Color32::from_rgb(220, 53, 69)
        } else if self.progress >= 100.0 {
            Color32::from_rgb(40, 167, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        action
    }

    /// File name plus a browse button; returns true when the button was clicked.
    fn file_row(ui: &mut egui::Ui, path: Option<&PathBuf>, placeholder: &str) -> bool {
        let mut clicked = false;
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    let text = path
                        .and_then(|p| p.file_name())
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_else(|| placeholder.to_string());

                    ui.label(RichText::new(&text).size(12.0).color(if path.is_some() {
                        Color32::WHITE
                    } else {
                        Color32::GRAY
                    }));

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("📂 Browse").clicked() {
                            clicked = true;
                        }
                    });
                });
            });
        clicked
    }

    /// Set progress and status
    pub fn set_progress(&mut self, progress: f32, status: &str) {
        self.progress = progress;
        self.status = status.to_string();
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    BrowseCsv,
    LoadConfig,
    BuildChart,
    ExportPng,
    ExportSvg,
    ExportJson,
}
