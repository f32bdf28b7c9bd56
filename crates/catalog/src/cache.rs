use std::collections::BTreeMap;

use foundation::math::{GeoError, StableF64};
use scene::markers::MarkerPlacement;

use crate::registry::MarkerRegistry;

/// Memoized marker placements, keyed by projection radius.
#[derive(Debug, Default)]
pub struct PlacementCache {
    by_radius: BTreeMap<StableF64, Vec<MarkerPlacement>>,
    misses: u64,
}

impl PlacementCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compute(
        &mut self,
        registry: &MarkerRegistry,
        radius: f64,
    ) -> Result<&[MarkerPlacement], GeoError> {
        let key = StableF64(radius);
        if !self.by_radius.contains_key(&key) {
            let placements = registry.placements(radius)?;
            self.misses += 1;
            self.by_radius.insert(key, placements);
        }
        Ok(self.by_radius.get(&key).map(Vec::as_slice).unwrap_or(&[]))
    }

    /// Number of times placements were actually projected.
    pub fn misses(&self) -> u64 {
        self.misses
    }
}

#[cfg(test)]
mod tests {
    use super::PlacementCache;
    use crate::registry::MarkerRegistry;

    #[test]
    fn recomputes_only_for_new_radius() {
        let registry = MarkerRegistry::load().unwrap();
        let mut cache = PlacementCache::new();

        let first = cache.get_or_compute(&registry, 1.01).unwrap().to_vec();
        let again = cache.get_or_compute(&registry, 1.01).unwrap().to_vec();
        assert_eq!(first, again);
        assert_eq!(cache.misses(), 1);

        let wider = cache.get_or_compute(&registry, 2.0).unwrap();
        assert!((wider[0].position.length() - 2.0).abs() < 1e-9);
        assert_eq!(cache.misses(), 2);
    }

    #[test]
    fn failed_projection_is_not_cached() {
        let registry = MarkerRegistry::load().unwrap();
        let mut cache = PlacementCache::new();
        assert!(cache.get_or_compute(&registry, -1.0).is_err());
        assert_eq!(cache.misses(), 0);
    }
}
