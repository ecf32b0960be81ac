//! Sequence model inference for consumption forecasting.
//!
//! The model itself is trained elsewhere. This module loads its exported
//! artifact (hyperparameters, per-series scalers, weights) and runs the
//! forward pass in-process.

use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, Result};

pub mod artifact;
pub mod lstm;
pub mod models;

pub use artifact::ModelArtifact;
pub use lstm::LstmForecaster;
pub use models::SequenceModel;

/// Hyperparameters recorded with a trained model.
///
/// Older exports name the series count `num_users` and the embedding width
/// `id_embed_dim`; both spellings are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hyperparameters {
    pub lookback: usize,
    #[serde(default = "default_input_size")]
    pub input_size: usize,
    pub hidden_size: usize,
    pub num_layers: usize,
    #[serde(alias = "id_embed_dim")]
    pub embedding_dim: usize,
    #[serde(default)]
    pub dropout: f64,
    #[serde(alias = "num_users")]
    pub num_series: usize,
}

fn default_input_size() -> usize {
    1
}

/// Mean and standard deviation used to normalize one series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scaler {
    pub mean: f64,
    pub std: f64,
}

impl Scaler {
    pub fn new(mean: f64, std: f64) -> Self {
        Self { mean, std }
    }

    /// Mean and population standard deviation of a whole history.
    pub fn from_history(series: &[f64]) -> Self {
        if series.is_empty() {
            return Self::new(0.0, 0.0);
        }
        let n = series.len() as f64;
        let mean = series.iter().sum::<f64>() / n;
        let variance = series.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Self::new(mean, variance.sqrt())
    }

    /// Standard deviation used for scaling; near-zero spreads scale by 1.
    pub fn effective_std(&self, floor: f64) -> f64 {
        if self.std > floor {
            self.std
        } else {
            1.0
        }
    }
}

/// Per-series scalers persisted with the model, indexed by series row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScalerTable {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

impl ScalerTable {
    pub fn get(&self, index: usize) -> Result<Scaler> {
        match (self.mean.get(index), self.std.get(index)) {
            (Some(&mean), Some(&std)) => Ok(Scaler::new(mean, std)),
            _ => Err(AnalyticsError::IndexOutOfRange { index, len: self.len() }),
        }
    }

    pub fn len(&self) -> usize {
        self.mean.len().min(self.std.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
