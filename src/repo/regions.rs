use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::info;

use crate::domain::RegionMapping;
use crate::error::{AnalyticsError, Result};

pub fn load_region_mapping(path: &Path) -> Result<RegionMapping> {
    let reader = BufReader::new(File::open(path)?);
    let mapping: RegionMapping = serde_json::from_reader(reader)?;
    info!(regions = mapping.len(), path = %path.display(), "region mapping loaded");
    Ok(mapping)
}

/// Companion file for the processed region series: region names in row order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionIndex {
    pub regions: Vec<String>,
}

impl RegionIndex {
    pub fn new(regions: Vec<String>) -> Self {
        Self { regions }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Row position of a region, matched case-insensitively.
    pub fn position(&self, name: &str) -> Result<usize> {
        let wanted = name.trim().to_lowercase();
        self.regions
            .iter()
            .position(|r| r.to_lowercase() == wanted)
            .ok_or_else(|| {
                AnalyticsError::MissingMapping(format!(
                    "region '{name}' not found (available: {})",
                    self.regions.join(", ")
                ))
            })
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_is_case_insensitive() {
        let index = RegionIndex::new(vec!["Balti".to_string(), "Chisinau".to_string()]);
        assert_eq!(index.position("chisinau").unwrap(), 1);
        assert_eq!(index.position(" BALTI ").unwrap(), 0);
    }

    #[test]
    fn test_unknown_region() {
        let index = RegionIndex::new(vec!["Balti".to_string()]);
        let err = index.position("Cahul").unwrap_err();
        assert!(matches!(err, AnalyticsError::MissingMapping(_)));
        assert!(err.to_string().contains("Balti"));
    }

    #[test]
    fn test_index_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("regions_index.json");
        let index = RegionIndex::new(vec!["A".to_string(), "B".to_string()]);
        index.write(&path).unwrap();
        assert_eq!(RegionIndex::load(&path).unwrap(), index);
    }

    #[test]
    fn test_load_region_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meter_to_location.json");
        std::fs::write(&path, r#"{"Balti": [1, 2], "Orhei": []}"#).unwrap();
        let mapping = load_region_mapping(&path).unwrap();
        let names: Vec<&str> = mapping.regions().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["Balti", "Orhei"]);
        assert!(mapping.meters("Orhei").unwrap().is_empty());
    }
}
