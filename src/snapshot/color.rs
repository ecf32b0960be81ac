//! Consumption to map color: green through yellow to red.

use crate::domain::Rgb;

/// Color for `consumption` relative to the `[min, max]` range of all regions.
///
/// - no spread: green for everyone
/// - 0–25 %: green to yellow
/// - 25–75 %: yellow to red
/// - above 75 %: red
pub fn color_for(consumption: f64, min: f64, max: f64) -> Rgb {
    if max == min {
        return Rgb::GREEN;
    }
    let percent = (consumption - min) / (max - min) * 100.0;
    if percent <= 25.0 {
        Rgb(channel(255.0 * (percent / 25.0)), 255, 0)
    } else if percent <= 75.0 {
        Rgb(255, channel(255.0 * (1.0 - (percent - 25.0) / 50.0)), 0)
    } else {
        Rgb::RED
    }
}

// Round half away from zero, then clamp into the channel range.
fn channel(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}
