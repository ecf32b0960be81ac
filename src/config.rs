use anyhow::Result;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub data: DataConfig,
    pub model: ModelConfig,
    #[serde(default)]
    pub forecast: ForecastConfig,
    #[serde(default)]
    pub snapshot: SnapshotConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    pub readings_path: PathBuf,
    pub region_map_path: PathBuf,
    pub coordinates_path: PathBuf,
    pub meter_series_path: PathBuf,
    pub meter_index_path: PathBuf,
    pub region_series_path: PathBuf,
    pub region_index_path: PathBuf,
    pub country_series_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    pub artifact_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastConfig {
    pub day_steps: usize,
    pub week_steps: usize,
    /// Embedding row fed to the model for region series, which have no trained identity.
    pub region_embedding_index: usize,
    pub std_floor: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            day_steps: 24,
            week_steps: 168,
            region_embedding_index: 0,
            std_floor: 1e-8,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotConfig {
    pub window_minutes: i64,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self { window_minutes: 60 }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from("config/default.toml")
    }

    pub fn load_from(path: &str) -> Result<Self> {
        let figment = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("METER__").split("__"));
        Ok(figment.extract()?)
    }
}
