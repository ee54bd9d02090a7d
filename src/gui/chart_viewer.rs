//! Chart Viewer Widget
//! Right side scrollable panel showing the current candlestick chart.

use egui::{RichText, ScrollArea};
use region_candles::charts::ChartPlotter;
use region_candles::Chart;
use std::sync::Arc;

/// Scrollable display area for one chart.
#[derive(Default)]
pub struct ChartViewer {
    chart: Option<Arc<Chart>>,
}

impl ChartViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.chart = None;
    }

    pub fn set_chart(&mut self, chart: Chart) {
        self.chart = Some(Arc::new(chart));
    }

    pub fn chart(&self) -> Option<&Chart> {
        self.chart.as_deref()
    }

    pub fn show(&mut self, ui: &mut egui::Ui) {
        let Some(chart) = &self.chart else {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No Chart").size(20.0));
            });
            return;
        };

        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ChartPlotter::show(ui, chart);
            });
    }
}
