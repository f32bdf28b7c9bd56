use foundation::ids::RegionId;
use foundation::math::{GeoError, project};
use scene::markers::MarkerPlacement;

use crate::region::{Region, ValidationError, validate_regions};

const RAINFORESTS_JSON: &str = include_str!("../data/rainforests.json");

#[derive(Debug)]
pub enum CatalogError {
    Parse(serde_json::Error),
    Invalid(ValidationError),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::Parse(e) => write!(f, "region data is not valid JSON: {e}"),
            CatalogError::Invalid(e) => write!(f, "invalid region data: {e}"),
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogError::Parse(e) => Some(e),
            CatalogError::Invalid(e) => Some(e),
        }
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(e: serde_json::Error) -> Self {
        CatalogError::Parse(e)
    }
}

impl From<ValidationError> for CatalogError {
    fn from(e: ValidationError) -> Self {
        CatalogError::Invalid(e)
    }
}

/// The validated, immutable set of regions shown on the globe.
///
/// `RegionId`s are indices into insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerRegistry {
    regions: Vec<Region>,
}

impl MarkerRegistry {
    /// Loads the embedded rainforest dataset.
    pub fn load() -> Result<Self, CatalogError> {
        Self::from_json_str(RAINFORESTS_JSON)
    }

    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let regions: Vec<Region> = serde_json::from_str(json)?;
        Ok(Self::from_regions(regions)?)
    }

    pub fn from_regions(regions: Vec<Region>) -> Result<Self, ValidationError> {
        validate_regions(&regions)?;
        tracing::info!(regions = regions.len(), "region registry loaded");
        Ok(Self { regions })
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.regions.get(id.index())
    }

    pub fn iter(&self) -> impl Iterator<Item = (RegionId, &Region)> {
        self.regions
            .iter()
            .enumerate()
            .map(|(i, r)| (RegionId::new(i as u32), r))
    }

    pub fn find_by_name(&self, name: &str) -> Option<RegionId> {
        self.iter().find(|(_, r)| r.name == name).map(|(id, _)| id)
    }

    /// One placement per region, in insertion order.
    pub fn placements(&self, radius: f64) -> Result<Vec<MarkerPlacement>, GeoError> {
        self.iter()
            .map(|(id, r)| {
                project(r.latitude, r.longitude, radius).map(|p| MarkerPlacement::new(id, p))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{CatalogError, MarkerRegistry};
    use crate::region::{ValidationError, sample};
    use foundation::ids::RegionId;
    use foundation::math::GeoError;
    use pretty_assertions::assert_eq;

    #[test]
    fn embedded_dataset_loads_in_order() {
        let registry = MarkerRegistry::load().unwrap();
        let names: Vec<&str> = registry.iter().map(|(_, r)| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Amazon Rainforest",
                "Congo Rainforest",
                "Australasia Rainforest",
                "Sundaland Rainforest",
                "Indo-Burma Rainforest",
                "Mesoamerican Rainforest",
                "Wallacea Rainforest",
                "Guinean Forests of West Africa",
                "Atlantic Forest (Mata Atlântica)",
                "Chocó-Darién Rainforest",
            ]
        );

        let amazon = registry.region(RegionId::new(0)).unwrap();
        assert_eq!((amazon.latitude, amazon.longitude), (-3.0, -60.0));
        assert_eq!(amazon.countries.len(), 9);
        assert_eq!(amazon.countries[0], "Brazil (60%)");
    }

    #[test]
    fn latitude_91_fails_validation() {
        let json = r#"[{"name":"X","latitude":91,"longitude":0,"countries":["Y"]}]"#;
        let err = MarkerRegistry::from_json_str(json).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::Invalid(ValidationError::LatitudeOutOfRange { .. })
        ));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = MarkerRegistry::from_json_str("[{").unwrap_err();
        assert!(matches!(err, CatalogError::Parse(_)));
    }

    #[test]
    fn placements_follow_insertion_order_and_radius() {
        let registry = MarkerRegistry::load().unwrap();
        let placements = registry.placements(1.01).unwrap();
        assert_eq!(placements.len(), registry.len());
        for (i, p) in placements.iter().enumerate() {
            assert_eq!(p.region, RegionId::new(i as u32));
            assert!((p.position.length() - 1.01).abs() < 1e-9);
        }
    }

    #[test]
    fn placements_reject_bad_radius() {
        let registry = MarkerRegistry::from_regions(vec![sample("A", 0.0, 0.0)]).unwrap();
        assert_eq!(registry.placements(0.0), Err(GeoError::InvalidRadius(0.0)));
    }

    #[test]
    fn lookup_by_name() {
        let registry = MarkerRegistry::load().unwrap();
        assert_eq!(registry.find_by_name("Congo Rainforest"), Some(RegionId::new(1)));
        assert_eq!(registry.find_by_name("Taiga"), None);
        assert!(registry.region(RegionId::new(10)).is_none());
    }
}
