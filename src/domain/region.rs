use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::MeterId;

/// Region name to member meters.
///
/// Regions iterate in sorted name order. A meter is expected to belong to a
/// single region, but that is not enforced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionMapping {
    regions: BTreeMap<String, Vec<MeterId>>,
}

impl RegionMapping {
    pub fn new(regions: BTreeMap<String, Vec<MeterId>>) -> Self {
        Self { regions }
    }

    pub fn regions(&self) -> impl Iterator<Item = (&str, &[MeterId])> {
        self.regions.iter().map(|(name, meters)| (name.as_str(), meters.as_slice()))
    }

    pub fn meters(&self, region: &str) -> Option<&[MeterId]> {
        self.regions.get(region).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, Vec<MeterId>)> for RegionMapping {
    fn from_iter<I: IntoIterator<Item = (S, Vec<MeterId>)>>(iter: I) -> Self {
        Self {
            regions: iter.into_iter().map(|(name, meters)| (name.into(), meters)).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Map display color, serialized as `[r, g, b]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const GREEN: Rgb = Rgb(0, 255, 0);
    pub const YELLOW: Rgb = Rgb(255, 255, 0);
    pub const RED: Rgb = Rgb(255, 0, 0);
}

/// One region's entry in a consumption snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionSnapshot {
    pub consumption: f64,
    pub color: Rgb,
    pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SnapshotStats {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_deserializes_mixed_ids() {
        let mapping: RegionMapping =
            serde_json::from_str(r#"{"Balti": [1, "2"], "Chisinau": ["3"]}"#).unwrap();
        assert_eq!(mapping.len(), 2);
        assert_eq!(
            mapping.meters("Balti").unwrap(),
            &[MeterId::from("1"), MeterId::from("2")]
        );
        assert_eq!(mapping.meters("Chisinau").unwrap(), &[MeterId::from("3")]);
    }

    #[test]
    fn test_rgb_serializes_as_triplet() {
        assert_eq!(serde_json::to_string(&Rgb(255, 128, 0)).unwrap(), "[255,128,0]");
    }
}
