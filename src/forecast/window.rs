//! Autoregressive forecast state.

use std::collections::VecDeque;

use crate::error::{AnalyticsError, Result};
use crate::ml::SequenceModel;

/// Lookback window for one forecast call.
///
/// Holds exactly `lookback` normalized values between steps. Each step
/// predicts one value, then shifts that prediction in and drops the oldest
/// element, so later steps consume earlier predictions.
#[derive(Debug, Clone)]
pub struct ForecastWindow {
    values: VecDeque<f64>,
    lookback: usize,
    mean: f64,
    std: f64,
    step_count: usize,
}

impl ForecastWindow {
    /// Seed the window from the tail of `history`, normalized with `mean` and `std`.
    ///
    /// `history` must be strictly longer than `lookback`.
    pub fn new(history: &[f64], lookback: usize, mean: f64, std: f64) -> Result<Self> {
        if history.len() <= lookback {
            return Err(AnalyticsError::InsufficientHistory {
                length: history.len(),
                lookback,
            });
        }
        let values = history[history.len() - lookback..]
            .iter()
            .map(|v| (v - mean) / std)
            .collect();
        Ok(Self { values, lookback, mean, std, step_count: 0 })
    }

    /// Predict, shift, and return the denormalized value.
    pub fn step(&mut self, model: &dyn SequenceModel, series_index: usize) -> Result<f64> {
        let normalized = model.predict_next(self.values.make_contiguous(), series_index)?;
        if !normalized.is_finite() {
            return Err(AnalyticsError::Model(format!(
                "non-finite prediction at step {}",
                self.step_count
            )));
        }
        self.values.push_back(normalized);
        self.values.pop_front();
        self.step_count += 1;
        Ok(normalized * self.std + self.mean)
    }

    /// Run steps until `horizon` values have been produced.
    pub fn run(
        mut self,
        model: &dyn SequenceModel,
        series_index: usize,
        horizon: usize,
    ) -> Result<Vec<f64>> {
        let mut out = Vec::with_capacity(horizon);
        while self.step_count < horizon {
            out.push(self.step(model, series_index)?);
        }
        Ok(out)
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn lookback(&self) -> usize {
        self.lookback
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Predicts the last window value plus one.
    struct Increment;

    impl SequenceModel for Increment {
        fn lookback(&self) -> usize {
            3
        }
        fn num_series(&self) -> usize {
            1
        }
        fn predict_next(&self, window: &[f64], _series_index: usize) -> Result<f64> {
            Ok(window[window.len() - 1] + 1.0)
        }
    }

    #[test]
    fn test_window_seeds_from_normalized_tail() {
        let window = ForecastWindow::new(&[0.0, 2.0, 4.0, 6.0, 8.0], 3, 4.0, 2.0).unwrap();
        assert_eq!(window.values().collect::<Vec<_>>(), vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_history_must_exceed_lookback() {
        let err = ForecastWindow::new(&[1.0, 2.0, 3.0], 3, 0.0, 1.0).unwrap_err();
        assert!(matches!(
            err,
            AnalyticsError::InsufficientHistory { length: 3, lookback: 3 }
        ));
    }

    #[test]
    fn test_step_feeds_predictions_back() {
        let mut window = ForecastWindow::new(&[0.0, 2.0, 4.0, 6.0, 8.0], 3, 4.0, 2.0).unwrap();
        let model = Increment;

        // normalized 2.0 -> 3.0 -> 4.0, denormalized x * 2 + 4
        assert_eq!(window.step(&model, 0).unwrap(), 10.0);
        assert_eq!(window.len(), 3);
        assert_eq!(window.step(&model, 0).unwrap(), 12.0);
        assert_eq!(window.values().collect::<Vec<_>>(), vec![2.0, 3.0, 4.0]);
        assert_eq!(window.step_count(), 2);
    }

    #[test]
    fn test_run_produces_exact_horizon() {
        let window = ForecastWindow::new(&[1.0; 10], 3, 0.0, 1.0).unwrap();
        let out = window.run(&Increment, 0, 7).unwrap();
        assert_eq!(out, vec![2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
    }
}
