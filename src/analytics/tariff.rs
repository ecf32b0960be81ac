use crate::error::{AnalyticsError, Result};

const MORNING_PEAK: (f64, f64) = (9.0, 2.0);
const EVENING_PEAK: (f64, f64) = (19.0, 2.5);
const DEMAND_WEIGHT: f64 = 0.15;

fn gaussian(x: f64, mean: f64, sigma: f64) -> f64 {
    (-0.5 * ((x - mean) / sigma).powi(2)).exp()
}

/// Relative demand at an hour of the day: a morning and an evening bump.
pub fn hourly_consumption(hour: f64) -> f64 {
    gaussian(hour, MORNING_PEAK.0, MORNING_PEAK.1) + gaussian(hour, EVENING_PEAK.0, EVENING_PEAK.1)
}

/// Next price estimate from the previous one, nudged by the demand curve.
pub fn dynamic_price(hour: f64, previous_cost: f64) -> Result<f64> {
    if !(0.0..=24.0).contains(&hour) {
        return Err(AnalyticsError::Validation(format!("hour {hour} outside 0..=24")));
    }
    if !previous_cost.is_finite() {
        return Err(AnalyticsError::Validation(format!(
            "previous cost {previous_cost} is not finite"
        )));
    }
    let price = hourly_consumption(hour) * previous_cost * DEMAND_WEIGHT
        + previous_cost * (1.0 - DEMAND_WEIGHT);
    Ok((price * 100.0).round() / 100.0)
}
