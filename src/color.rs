use palette::{Hsl, IntoColor, Srgb};
use plotters::style::RGBColor;

use crate::stitch::Rejection;

/// Curve color of the flux spectrum.
pub const CURVE: RGBColor = RGBColor(0, 0, 255);
/// Figure titles and the per-plot right title.
pub const TITLE: RGBColor = RGBColor(255, 0, 0);
/// "lightgrey", used for shading and the degenerate background.
pub const LIGHT_GREY: RGBColor = RGBColor(211, 211, 211);
/// Grid lines.
pub const GRID: RGBColor = RGBColor(176, 176, 176);

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<RGBColor> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.45);
            let rgb: Srgb = hsl.into_color();
            RGBColor(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Rejection criterion → marker colour
// ---------------------------------------------------------------------------

/// Marker colour for a debug-overlay point.  Kept points are black, every
/// rejection criterion gets its own hue.
pub fn rejection_color(rejection: Rejection) -> RGBColor {
    let rejected = &Rejection::ALL[1..];
    match rejected.iter().position(|&r| r == rejection) {
        None => RGBColor(0, 0, 0),
        Some(i) => generate_palette(rejected.len())[i],
    }
}
