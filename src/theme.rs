//! Card colors and label strings as one immutable value.
//!
//! The theme is passed explicitly into scene assembly — nothing reads colors
//! from module-level state. Colors are straight (non-premultiplied) RGBA8;
//! the renderer premultiplies at the pixel level.

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Theme {
    /// Canvas clear color.
    pub background: [u8; 4],
    pub axis: [u8; 4],
    pub guide: [u8; 4],
    pub baseline: [u8; 4],
    pub green: [u8; 4],
    pub red: [u8; 4],
    /// Fill of the "Now" start marker disc.
    pub now_marker: [u8; 4],
    pub marker_core: [u8; 4],
    pub label_text: [u8; 4],
    pub now_label: String,
    pub multiplier_label: String,
    pub curve_stroke_width: f64,
    pub label_size_px: f32,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: [10, 10, 10, 255],
            axis: [255, 255, 255, 255],
            guide: [255, 255, 255, 31],
            baseline: [255, 255, 255, 230],
            green: [26, 238, 14, 255],
            red: [238, 15, 15, 255],
            now_marker: [47, 53, 61, 255],
            marker_core: [255, 255, 255, 255],
            label_text: [255, 255, 255, 255],
            now_label: "Now".to_string(),
            multiplier_label: "7x".to_string(),
            curve_stroke_width: 14.0,
            label_size_px: 18.0,
        }
    }
}

impl Theme {
    /// A color with its alpha scaled by `f` (0..=1), still straight RGBA.
    pub fn with_alpha(color: [u8; 4], f: f64) -> [u8; 4] {
        let a = (f64::from(color[3]) * f.clamp(0.0, 1.0)).round() as u8;
        [color[0], color[1], color[2], a]
    }
}
