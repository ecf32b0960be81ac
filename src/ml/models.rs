//! Model seam used by the forecast engine.

use crate::error::Result;

/// A one-step-ahead forecaster over a normalized lookback window.
///
/// Implementations are read-only during inference so one loaded model can
/// serve any number of independent forecast calls.
pub trait SequenceModel: Send + Sync {
    /// Window length the model was trained on.
    fn lookback(&self) -> usize;

    /// Number of series identities the model knows (embedding rows).
    fn num_series(&self) -> usize;

    /// Predict the next normalized value after `window`.
    ///
    /// `series_index` selects the identity embedding, when the model has one.
    fn predict_next(&self, window: &[f64], series_index: usize) -> Result<f64>;
}
