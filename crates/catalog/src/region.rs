use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use foundation::math::{
    MAX_LATITUDE_DEG, MAX_LONGITUDE_DEG, MIN_LATITUDE_DEG, MIN_LONGITUDE_DEG,
};

/// A named rainforest region and the facts shown for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub extent: String,
    /// Country shares in authored order, e.g. "Brazil (60%)".
    pub countries: Vec<String>,
    #[serde(default)]
    pub species: String,
    #[serde(default)]
    pub fact: String,
    #[serde(default)]
    pub deforestation_trend: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    EmptyName { index: usize },
    DuplicateName { index: usize, name: String },
    LatitudeOutOfRange { name: String, value: f64 },
    LongitudeOutOfRange { name: String, value: f64 },
    EmptyCountries { name: String },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::EmptyName { index } => write!(f, "region #{index} has an empty name"),
            ValidationError::DuplicateName { index, name } => {
                write!(f, "region #{index} repeats the name {name:?}")
            }
            ValidationError::LatitudeOutOfRange { name, value } => write!(
                f,
                "{name}: latitude {value} outside [{MIN_LATITUDE_DEG}, {MAX_LATITUDE_DEG}]"
            ),
            ValidationError::LongitudeOutOfRange { name, value } => write!(
                f,
                "{name}: longitude {value} outside [{MIN_LONGITUDE_DEG}, {MAX_LONGITUDE_DEG}]"
            ),
            ValidationError::EmptyCountries { name } => write!(f, "{name}: no countries listed"),
        }
    }
}

impl std::error::Error for ValidationError {}

impl Region {
    fn check_fields(&self, index: usize) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName { index });
        }
        // NaN fails both range checks.
        if !(MIN_LATITUDE_DEG..=MAX_LATITUDE_DEG).contains(&self.latitude) {
            return Err(ValidationError::LatitudeOutOfRange {
                name: self.name.clone(),
                value: self.latitude,
            });
        }
        if !(MIN_LONGITUDE_DEG..=MAX_LONGITUDE_DEG).contains(&self.longitude) {
            return Err(ValidationError::LongitudeOutOfRange {
                name: self.name.clone(),
                value: self.longitude,
            });
        }
        if self.countries.is_empty() {
            return Err(ValidationError::EmptyCountries {
                name: self.name.clone(),
            });
        }
        Ok(())
    }
}

/// Checks every region in order and stops at the first problem.
pub fn validate_regions(regions: &[Region]) -> Result<(), ValidationError> {
    let mut seen = BTreeSet::new();
    for (index, region) in regions.iter().enumerate() {
        region.check_fields(index)?;
        if !seen.insert(region.name.as_str()) {
            return Err(ValidationError::DuplicateName {
                index,
                name: region.name.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) fn sample(name: &str, latitude: f64, longitude: f64) -> Region {
    Region {
        name: name.to_string(),
        latitude,
        longitude,
        extent: "1 ha".to_string(),
        countries: vec!["Somewhere (100%)".to_string()],
        species: "Frogs".to_string(),
        fact: "Wet.".to_string(),
        deforestation_trend: "Flat.".to_string(),
    }
}
