//! Chart Styling
//! Palette, panel sizes, labels and tools shared by every chart.

use super::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// RGB color, serialized as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` (the leading `#` is optional).
    pub fn from_hex(hex: &str) -> Result<Self, ConfigError> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(ConfigError::InvalidColor(hex.to_string()));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map_err(|_| ConfigError::InvalidColor(hex.to_string()))
        };
        Ok(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl TryFrom<String> for Color {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

/// Styling and layout constants for the two chart panels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartStyle {
    /// Interaction tools enabled on both panels.
    pub tools: Vec<String>,
    pub panel_width: u32,
    pub price_height: u32,
    pub volume_height: u32,
    pub background: Color,
    pub price_label: String,
    pub volume_label: String,
    pub time_label: String,
    /// Rotation of x tick labels, radians.
    pub x_label_orientation: f64,
    pub whisker_color: Color,
    pub bearish_color: Color,
    pub bullish_color: Color,
    pub bullish_fill: Color,
    pub body_line_width: f64,
    /// Candle body and volume bar width, seconds.
    pub body_width_secs: i64,
    pub volume_color: Color,
    pub volume_alpha: f64,
    /// Multiplier applied to the highest price for the top of the y-range.
    pub price_headroom: f64,
    /// chrono format string for hover timestamps.
    pub datetime_format: String,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            tools: ["pan", "wheel_zoom", "box_zoom", "reset"]
                .iter()
                .map(|t| t.to_string())
                .collect(),
            panel_width: 1000,
            price_height: 400,
            volume_height: 200,
            background: Color::rgb(0xef, 0xef, 0xef),
            price_label: "Price [DKK]".to_string(),
            volume_label: "Volume [MWh]".to_string(),
            time_label: "Timestamp".to_string(),
            x_label_orientation: std::f64::consts::FRAC_PI_4,
            whisker_color: Color::BLACK,
            bearish_color: Color::rgb(0xeb, 0x3c, 0x40),
            bullish_color: Color::rgb(0x49, 0xa3, 0xa3),
            bullish_fill: Color::WHITE,
            body_line_width: 2.0,
            body_width_secs: 20,
            volume_color: Color::rgb(0x1f, 0x77, 0xb4),
            volume_alpha: 0.5,
            price_headroom: 1.1,
            datetime_format: "%Y-%m-%d %H:%M:%S".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_hex() {
        let c = Color::from_hex("#eb3c40").unwrap();
        assert_eq!(c, Color::rgb(235, 60, 64));
        assert_eq!(c.to_string(), "#eb3c40");
        assert_eq!(Color::from_hex("49A3A3").unwrap(), Color::rgb(73, 163, 163));
    }

    #[test]
    fn test_color_invalid() {
        assert!(Color::from_hex("#fff").is_err());
        assert!(Color::from_hex("#gg0000").is_err());
        assert!(Color::from_hex("#ééé").is_err());
    }

    #[test]
    fn test_default_style() {
        let style = ChartStyle::default();
        assert_eq!(style.tools.join(","), "pan,wheel_zoom,box_zoom,reset");
        assert_eq!(style.body_width_secs, 20);
        assert_eq!(style.price_headroom, 1.1);
        assert_eq!(style.background.to_string(), "#efefef");
    }
}
