use foundation::ids::RegionId;
use foundation::math::Vec3;

/// Where a region's marker sits on the globe, in globe-local space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MarkerPlacement {
    pub region: RegionId,
    pub position: Vec3,
}

impl MarkerPlacement {
    pub fn new(region: RegionId, position: Vec3) -> Self {
        Self { region, position }
    }
}
