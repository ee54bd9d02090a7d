//! Charts module - Chart description, builder and rendering adapters

mod builder;
mod model;
mod plotter;
mod renderer;

pub use builder::{partition, price_range, title_case, ChartBuilder, ChartError, Partition};
pub use model::{
    format_millis, Axis, AxisKind, AxisRange, BarStyle, Chart, ColumnSource, Direction, Field,
    FieldFormat, Layer, Panel, RangeId, Tooltip, TooltipField,
};
pub use plotter::{to_color32, ChartPlotter, Interactions};
pub use renderer::{RenderError, StaticChartRenderer};
