use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

use crate::domain::Coordinates;
use crate::error::Result;

#[derive(Debug, Deserialize)]
struct CoordinateRow {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Latitude")]
    latitude: f64,
    #[serde(rename = "Longitude")]
    longitude: f64,
}

/// Region name to map coordinates, read from a `Name,Latitude,Longitude` CSV.
#[derive(Debug, Clone, Default)]
pub struct CoordinateTable {
    by_region: HashMap<String, Coordinates>,
}

impl CoordinateTable {
    pub fn load(path: &Path) -> Result<Self> {
        let mut rdr = csv::Reader::from_path(path)?;
        let mut by_region = HashMap::new();
        for row in rdr.deserialize() {
            let row: CoordinateRow = row?;
            by_region.insert(
                row.name.trim().to_string(),
                Coordinates { latitude: row.latitude, longitude: row.longitude },
            );
        }
        info!(regions = by_region.len(), path = %path.display(), "coordinate table loaded");
        Ok(Self { by_region })
    }

    pub fn get(&self, region: &str) -> Option<Coordinates> {
        self.by_region.get(region).copied()
    }

    pub fn len(&self) -> usize {
        self.by_region.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_region.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, Coordinates)> for CoordinateTable {
    fn from_iter<I: IntoIterator<Item = (S, Coordinates)>>(iter: I) -> Self {
        Self {
            by_region: iter.into_iter().map(|(name, c)| (name.into(), c)).collect(),
        }
    }
}
