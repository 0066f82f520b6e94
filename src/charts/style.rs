//! Chart Style
//! Palette, figure size and fonts shared by every chart. Built once and
//! passed by reference into each render call.

use plotters::style::{FontDesc, IntoFont, RGBColor};
use serde::{Deserialize, Serialize};

/// Evenly spaced hues at constant lightness.
pub const HUSL_PALETTE: [[u8; 3]; 8] = [
    [246, 112, 136],
    [206, 143, 49],
    [150, 163, 49],
    [50, 176, 101],
    [53, 172, 164],
    [56, 167, 208],
    [163, 140, 244],
    [245, 101, 204],
];

/// Heatmap scale from pale yellow through orange to dark red.
pub const YL_OR_RD: [[u8; 3]; 4] = [[255, 255, 204], [254, 178, 76], [240, 59, 32], [189, 0, 38]];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartStyle {
    pub palette: Vec<[u8; 3]>,
    pub width: u32,
    pub height: u32,
    pub font_family: String,
    pub font_size: u32,
    /// Opacity of scatter points.
    pub point_alpha: f64,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            palette: HUSL_PALETTE.to_vec(),
            width: 1200,
            height: 800,
            font_family: "sans-serif".to_string(),
            font_size: 16,
            point_alpha: 0.5,
        }
    }
}

impl ChartStyle {
    /// Palette color for a series index, cycling when the palette runs out.
    pub fn color(&self, idx: usize) -> RGBColor {
        match self.palette.len() {
            0 => RGBColor(52, 152, 219),
            n => {
                let [r, g, b] = self.palette[idx % n];
                RGBColor(r, g, b)
            }
        }
    }

    pub fn hex_palette(&self) -> Vec<String> {
        self.palette
            .iter()
            .map(|[r, g, b]| format!("#{:02x}{:02x}{:02x}", r, g, b))
            .collect()
    }

    pub fn caption_font(&self) -> (&str, u32) {
        (self.font_family.as_str(), self.font_size * 2)
    }

    pub fn label_font(&self) -> (&str, u32) {
        (self.font_family.as_str(), self.font_size)
    }

    pub fn annotation_font(&self) -> FontDesc<'_> {
        (self.font_family.as_str(), self.font_size as f64).into_font()
    }

    /// Map `t` in [0, 1] onto the heatmap scale.
    pub fn heat_color(t: f64) -> RGBColor {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let segments = (YL_OR_RD.len() - 1) as f64;
        let pos = t * segments;
        let idx = (pos.floor() as usize).min(YL_OR_RD.len() - 2);
        let frac = pos - idx as f64;
        let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
        let (lo, hi) = (YL_OR_RD[idx], YL_OR_RD[idx + 1]);
        RGBColor(lerp(lo[0], hi[0]), lerp(lo[1], hi[1]), lerp(lo[2], hi[2]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_cycles() {
        let style = ChartStyle::default();
        assert_eq!(style.color(0), style.color(HUSL_PALETTE.len()));
        assert_eq!(style.hex_palette()[0], "#f67088");
    }

    #[test]
    fn test_heat_color_endpoints() {
        assert_eq!(ChartStyle::heat_color(0.0), RGBColor(255, 255, 204));
        assert_eq!(ChartStyle::heat_color(1.0), RGBColor(189, 0, 38));
        assert_eq!(ChartStyle::heat_color(f64::NAN), RGBColor(255, 255, 204));
    }

    #[test]
    fn test_style_deserializes_with_defaults() {
        let style: ChartStyle = serde_json::from_str(r#"{"width": 640}"#).unwrap();
        assert_eq!(style.width, 640);
        assert_eq!(style.height, 800);
        assert_eq!(style.palette.len(), 8);
    }
}
