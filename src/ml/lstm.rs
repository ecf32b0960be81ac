//! Stacked LSTM forecaster with an optional per-series identity embedding.
//!
//! Each time step feeds `[value, embedding...]` through the layers. The last
//! hidden state of the top layer goes through a linear head to give one
//! normalized prediction. Dropout only applies during training and is
//! ignored here.

use ndarray::{s, Array1, Array2};

use super::artifact::{LayerWeights, ModelArtifact};
use super::{Hyperparameters, SequenceModel};
use crate::error::{AnalyticsError, Result};

#[derive(Debug, Clone)]
struct LstmLayer {
    weight_ih: Array2<f64>,
    weight_hh: Array2<f64>,
    /// `bias_ih + bias_hh`, folded once at load.
    bias: Array1<f64>,
}

impl LstmLayer {
    fn from_weights(index: usize, w: &LayerWeights, input: usize, hidden: usize) -> Result<Self> {
        let gates = 4 * hidden;
        let bias_ih = vector(&format!("layers[{index}].bias_ih"), &w.bias_ih, gates)?;
        let bias_hh = vector(&format!("layers[{index}].bias_hh"), &w.bias_hh, gates)?;
        Ok(Self {
            weight_ih: matrix(&format!("layers[{index}].weight_ih"), &w.weight_ih, gates, input)?,
            weight_hh: matrix(&format!("layers[{index}].weight_hh"), &w.weight_hh, gates, hidden)?,
            bias: bias_ih + bias_hh,
        })
    }

    fn step(
        &self,
        x: &Array1<f64>,
        h: &Array1<f64>,
        c: &Array1<f64>,
    ) -> (Array1<f64>, Array1<f64>) {
        let n = h.len();
        let gates = self.weight_ih.dot(x) + self.weight_hh.dot(h) + &self.bias;

        let i = gates.slice(s![0..n]).mapv(sigmoid);
        let f = gates.slice(s![n..2 * n]).mapv(sigmoid);
        let g = gates.slice(s![2 * n..3 * n]).mapv(f64::tanh);
        let o = gates.slice(s![3 * n..4 * n]).mapv(sigmoid);

        let c_next = &f * c + &i * &g;
        let h_next = &o * &c_next.mapv(f64::tanh);
        (h_next, c_next)
    }
}

#[derive(Debug, Clone)]
pub struct LstmForecaster {
    hyper: Hyperparameters,
    embedding: Option<Array2<f64>>,
    layers: Vec<LstmLayer>,
    head_weight: Array1<f64>,
    head_bias: f64,
}

impl LstmForecaster {
    /// Validate every weight shape against the hyperparameters and build the model.
    pub fn from_artifact(artifact: &ModelArtifact) -> Result<Self> {
        let hyper = artifact.hyper.clone();
        let weights = &artifact.weights;

        if hyper.input_size != 1 {
            return Err(AnalyticsError::Artifact(format!(
                "input_size must be 1 for univariate windows, got {}",
                hyper.input_size
            )));
        }
        if hyper.lookback == 0 || hyper.hidden_size == 0 || hyper.num_layers == 0 {
            return Err(AnalyticsError::Artifact(
                "lookback, hidden_size and num_layers must be positive".to_string(),
            ));
        }
        if weights.layers.len() != hyper.num_layers {
            return Err(AnalyticsError::Artifact(format!(
                "expected {} LSTM layers, found {}",
                hyper.num_layers,
                weights.layers.len()
            )));
        }
        if artifact.scalers.mean.len() != artifact.scalers.std.len() {
            return Err(AnalyticsError::Artifact(format!(
                "scaler table has {} means but {} stds",
                artifact.scalers.mean.len(),
                artifact.scalers.std.len()
            )));
        }

        let embedding = if hyper.embedding_dim > 0 {
            Some(matrix(
                "embedding",
                &weights.embedding,
                hyper.num_series,
                hyper.embedding_dim,
            )?)
        } else {
            None
        };

        let hidden = hyper.hidden_size;
        let layers = weights
            .layers
            .iter()
            .enumerate()
            .map(|(k, w)| {
                let input = if k == 0 { hyper.input_size + hyper.embedding_dim } else { hidden };
                LstmLayer::from_weights(k, w, input, hidden)
            })
            .collect::<Result<Vec<_>>>()?;

        let head_weight = vector("head.weight", &weights.head.weight, hidden)?;

        Ok(Self {
            hyper,
            embedding,
            layers,
            head_weight,
            head_bias: weights.head.bias,
        })
    }

    fn forward(&self, window: &[f64], series_index: usize) -> Result<f64> {
        let identity = match &self.embedding {
            Some(table) if series_index >= table.nrows() => {
                return Err(AnalyticsError::IndexOutOfRange {
                    index: series_index,
                    len: table.nrows(),
                })
            }
            Some(table) => Some(table.row(series_index)),
            None => None,
        };

        let hidden = self.hyper.hidden_size;
        let mut h = vec![Array1::<f64>::zeros(hidden); self.layers.len()];
        let mut c = vec![Array1::<f64>::zeros(hidden); self.layers.len()];

        let width = self.hyper.input_size + self.hyper.embedding_dim;
        for &value in window {
            let mut x = Array1::<f64>::zeros(width);
            x[0] = value;
            if let Some(identity) = &identity {
                x.slice_mut(s![1..]).assign(identity);
            }
            for (k, layer) in self.layers.iter().enumerate() {
                let (h_next, c_next) = layer.step(&x, &h[k], &c[k]);
                x = h_next.clone();
                h[k] = h_next;
                c[k] = c_next;
            }
        }

        let top = &h[self.layers.len() - 1];
        Ok(self.head_weight.dot(top) + self.head_bias)
    }
}

impl SequenceModel for LstmForecaster {
    fn lookback(&self) -> usize {
        self.hyper.lookback
    }

    fn num_series(&self) -> usize {
        self.hyper.num_series
    }

    fn predict_next(&self, window: &[f64], series_index: usize) -> Result<f64> {
        if window.len() != self.hyper.lookback {
            return Err(AnalyticsError::Validation(format!(
                "window length {} does not match lookback {}",
                window.len(),
                self.hyper.lookback
            )));
        }
        let prediction = self.forward(window, series_index)?;
        if !prediction.is_finite() {
            return Err(AnalyticsError::Model(format!("non-finite prediction {prediction}")));
        }
        Ok(prediction)
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn vector(name: &str, values: &[f64], len: usize) -> Result<Array1<f64>> {
    if values.len() != len {
        return Err(AnalyticsError::Artifact(format!(
            "{name}: expected {len} values, found {}",
            values.len()
        )));
    }
    Ok(Array1::from_vec(values.to_vec()))
}

fn matrix(name: &str, rows: &[Vec<f64>], nrows: usize, ncols: usize) -> Result<Array2<f64>> {
    if rows.len() != nrows {
        return Err(AnalyticsError::Artifact(format!(
            "{name}: expected {nrows} rows, found {}",
            rows.len()
        )));
    }
    if let Some((r, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != ncols) {
        return Err(AnalyticsError::Artifact(format!(
            "{name}: row {r} has {} columns, expected {ncols}",
            row.len()
        )));
    }
    let flat: Vec<f64> = rows.iter().flatten().copied().collect();
    Array2::from_shape_vec((nrows, ncols), flat)
        .map_err(|e| AnalyticsError::Artifact(format!("{name}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::artifact::{HeadWeights, ModelWeights};
    use crate::ml::ScalerTable;

    fn hyper(
        lookback: usize,
        hidden: usize,
        layers: usize,
        embedding_dim: usize,
    ) -> Hyperparameters {
        Hyperparameters {
            lookback,
            input_size: 1,
            hidden_size: hidden,
            num_layers: layers,
            embedding_dim,
            dropout: 0.0,
            num_series: 2,
        }
    }

    fn layer(input: usize, hidden: usize, fill: f64) -> LayerWeights {
        LayerWeights {
            weight_ih: vec![vec![fill; input]; 4 * hidden],
            weight_hh: vec![vec![fill; hidden]; 4 * hidden],
            bias_ih: vec![0.0; 4 * hidden],
            bias_hh: vec![0.0; 4 * hidden],
        }
    }

    fn artifact(fill: f64, head: Vec<f64>, bias: f64) -> ModelArtifact {
        ModelArtifact {
            hyper: hyper(3, 2, 2, 1),
            scalers: ScalerTable { mean: vec![0.0, 0.0], std: vec![1.0, 1.0] },
            weights: ModelWeights {
                embedding: vec![vec![0.5], vec![-0.5]],
                layers: vec![layer(2, 2, fill), layer(2, 2, fill)],
                head: HeadWeights { weight: head, bias },
            },
        }
    }

    #[test]
    fn test_zero_weights_return_head_bias() {
        let model = LstmForecaster::from_artifact(&artifact(0.0, vec![1.0, 1.0], 0.25)).unwrap();
        let y = model.predict_next(&[1.0, 2.0, 3.0], 0).unwrap();
        assert!((y - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_single_cell_matches_hand_computation() {
        // One layer, one unit, no embedding, all gate weights 1 and zero bias.
        let artifact = ModelArtifact {
            hyper: hyper(1, 1, 1, 0),
            scalers: ScalerTable::default(),
            weights: ModelWeights {
                embedding: Vec::new(),
                layers: vec![layer(1, 1, 1.0)],
                head: HeadWeights { weight: vec![2.0], bias: 0.0 },
            },
        };
        let model = LstmForecaster::from_artifact(&artifact).unwrap();
        let x: f64 = 0.5;
        let gate = sigmoid(x);
        let c = gate * x.tanh();
        let h = gate * c.tanh();
        let y = model.predict_next(&[x], 0).unwrap();
        assert!((y - 2.0 * h).abs() < 1e-12);
    }

    #[test]
    fn test_embedding_changes_prediction() {
        let model = LstmForecaster::from_artifact(&artifact(0.3, vec![1.0, -1.0], 0.0)).unwrap();
        let a = model.predict_next(&[0.1, 0.2, 0.3], 0).unwrap();
        let b = model.predict_next(&[0.1, 0.2, 0.3], 1).unwrap();
        assert!(a.is_finite() && b.is_finite());
        let model = LstmForecaster::from_artifact(&artifact(0.3, vec![1.0, 2.0], 0.0)).unwrap();
        let a = model.predict_next(&[0.1, 0.2, 0.3], 0).unwrap();
        let b = model.predict_next(&[0.1, 0.2, 0.3], 1).unwrap();
        assert!((a - b).abs() > 1e-9);
    }

    #[test]
    fn test_embedding_index_out_of_range() {
        let model = LstmForecaster::from_artifact(&artifact(0.1, vec![1.0, 1.0], 0.0)).unwrap();
        let err = model.predict_next(&[0.0, 0.0, 0.0], 2).unwrap_err();
        assert!(matches!(err, AnalyticsError::IndexOutOfRange { index: 2, len: 2 }));
    }

    #[test]
    fn test_window_length_must_match_lookback() {
        let model = LstmForecaster::from_artifact(&artifact(0.1, vec![1.0, 1.0], 0.0)).unwrap();
        assert!(matches!(
            model.predict_next(&[0.0, 0.0], 0),
            Err(AnalyticsError::Validation(_))
        ));
    }

    #[test]
    fn test_shape_mismatch_is_rejected() {
        let mut bad = artifact(0.1, vec![1.0, 1.0], 0.0);
        bad.weights.layers[1].weight_hh.pop();
        assert!(matches!(
            LstmForecaster::from_artifact(&bad),
            Err(AnalyticsError::Artifact(_))
        ));

        let mut bad = artifact(0.1, vec![1.0, 1.0], 0.0);
        bad.hyper.num_layers = 3;
        assert!(matches!(
            LstmForecaster::from_artifact(&bad),
            Err(AnalyticsError::Artifact(_))
        ));

        let bad = artifact(0.1, vec![1.0], 0.0);
        assert!(matches!(
            LstmForecaster::from_artifact(&bad),
            Err(AnalyticsError::Artifact(_))
        ));
    }
}
