use std::sync::Arc;
use tracing::{info, warn};

use super::{ForecastWindow, Horizon};
use crate::config::ForecastConfig;
use crate::domain::Series;
use crate::error::{AnalyticsError, Result};
use crate::ml::{Scaler, ScalerTable, SequenceModel};

/// Which kind of row a forecast is made for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesKind {
    /// A series the model was trained on; uses its persisted scaler and embedding row.
    Registered,
    /// A region sum; scaled by its own history and fed the placeholder embedding.
    Region,
}

/// Multi-step forecaster over a loaded sequence model.
///
/// Every call builds its own window, so calls are independent and the
/// engine can be shared freely.
pub struct ForecastEngine {
    model: Arc<dyn SequenceModel>,
    scalers: ScalerTable,
    settings: ForecastConfig,
}

impl ForecastEngine {
    pub fn new(
        model: Arc<dyn SequenceModel>,
        scalers: ScalerTable,
        settings: ForecastConfig,
    ) -> Self {
        Self { model, scalers, settings }
    }

    /// Forecast row `index` of `data` for `horizon` steps.
    #[tracing::instrument(skip(self, data), fields(rows = data.len()))]
    pub fn forecast(
        &self,
        data: &[Series],
        index: usize,
        kind: SeriesKind,
        horizon: Horizon,
    ) -> Result<Vec<f64>> {
        let series = data
            .get(index)
            .ok_or(AnalyticsError::IndexOutOfRange { index, len: data.len() })?;

        let (scaler, embedding_index) = match kind {
            SeriesKind::Registered => {
                if data.len() != self.model.num_series() {
                    warn!(
                        rows = data.len(),
                        trained = self.model.num_series(),
                        "series table size differs from trained series count"
                    );
                }
                (self.scalers.get(index)?, index)
            }
            SeriesKind::Region => {
                (Scaler::from_history(series), self.settings.region_embedding_index)
            }
        };

        let steps = horizon.steps(&self.settings);
        let std = scaler.effective_std(self.settings.std_floor);
        let window = ForecastWindow::new(series, self.model.lookback(), scaler.mean, std)?;
        let out = window.run(self.model.as_ref(), embedding_index, steps)?;

        info!(index, ?kind, steps, mean = scaler.mean, std, "forecast complete");
        Ok(out)
    }

    pub fn forecast_registered(
        &self,
        data: &[Series],
        index: usize,
        horizon: Horizon,
    ) -> Result<Vec<f64>> {
        self.forecast(data, index, SeriesKind::Registered, horizon)
    }

    pub fn forecast_region(
        &self,
        data: &[Series],
        index: usize,
        horizon: Horizon,
    ) -> Result<Vec<f64>> {
        self.forecast(data, index, SeriesKind::Region, horizon)
    }
}
