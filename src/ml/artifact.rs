//! Exported model artifact: hyperparameters, scalers and raw weights.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

use super::{Hyperparameters, LstmForecaster, ScalerTable};
use crate::error::Result;

/// Weights of one LSTM layer in PyTorch layout.
///
/// Gate blocks are stacked in `i, f, g, o` order, so `weight_ih` has
/// `4 * hidden_size` rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerWeights {
    pub weight_ih: Vec<Vec<f64>>,
    pub weight_hh: Vec<Vec<f64>>,
    pub bias_ih: Vec<f64>,
    pub bias_hh: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadWeights {
    pub weight: Vec<f64>,
    pub bias: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelWeights {
    /// `num_series x embedding_dim`; empty when the model has no identity embedding.
    #[serde(default)]
    pub embedding: Vec<Vec<f64>>,
    pub layers: Vec<LayerWeights>,
    pub head: HeadWeights,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub hyper: Hyperparameters,
    pub scalers: ScalerTable,
    pub weights: ModelWeights,
}

impl ModelArtifact {
    pub fn load(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let artifact: Self = serde_json::from_reader(reader)?;
        info!(
            path = %path.display(),
            lookback = artifact.hyper.lookback,
            hidden_size = artifact.hyper.hidden_size,
            num_layers = artifact.hyper.num_layers,
            num_series = artifact.hyper.num_series,
            "model artifact loaded"
        );
        Ok(artifact)
    }

    /// Build the runnable model and hand back the scaler table.
    pub fn into_parts(self) -> Result<(LstmForecaster, ScalerTable)> {
        let model = LstmForecaster::from_artifact(&self)?;
        Ok((model, self.scalers))
    }
}
