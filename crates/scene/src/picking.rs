use foundation::ids::RegionId;
use foundation::math::Vec3;
use foundation::math::precision::stable_total_cmp_f64;

use crate::camera::PerspectiveCamera;
use crate::components::Transform;
use crate::markers::MarkerPlacement;
use crate::pointer::PointerState;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl Ray {
    /// `dir` is expected to be unit length; distances are measured along it.
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        Self { origin, dir }
    }

    pub fn at(&self, t: f64) -> Vec3 {
        self.origin + self.dir * t
    }
}

/// Geometry a ray can be tested against.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum HitVolume {
    Sphere { center: Vec3, radius: f64 },
    /// Planar rectangle spanned by half-extent vectors `right` and `up`.
    Quad { center: Vec3, right: Vec3, up: Vec3 },
}

impl HitVolume {
    /// Distance from the ray origin to the first intersection, if any.
    pub fn hit_t(&self, ray: &Ray) -> Option<f64> {
        match *self {
            HitVolume::Sphere { center, radius } => ray_sphere_hit_t(ray, center, radius),
            HitVolume::Quad { center, right, up } => ray_quad_hit_t(ray, center, right, up),
        }
    }
}

pub fn ray_sphere_hit_t(ray: &Ray, center: Vec3, radius: f64) -> Option<f64> {
    let oc = ray.origin - center;
    let b = oc.dot(ray.dir);
    let c = oc.dot(oc) - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let sq = disc.sqrt();
    let near = -b - sq;
    if near >= 0.0 {
        return Some(near);
    }
    // Origin inside the sphere: the exit point is the first surface hit.
    let far = -b + sq;
    (far >= 0.0).then_some(far)
}

pub fn ray_quad_hit_t(ray: &Ray, center: Vec3, right: Vec3, up: Vec3) -> Option<f64> {
    let normal = right.cross(up).normalize()?;
    let denom = normal.dot(ray.dir);
    if denom.abs() < 1e-12 {
        return None;
    }
    let t = normal.dot(center - ray.origin) / denom;
    if t < 0.0 {
        return None;
    }
    let d = ray.at(t) - center;
    let u = d.dot(right) / right.dot(right);
    let v = d.dot(up) / up.dot(up);
    (u.abs() <= 1.0 && v.abs() <= 1.0).then_some(t)
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PickHit<K> {
    pub key: K,
    pub distance: f64,
    pub point: Vec3,
}

/// Nearest hit among `items`.
///
/// Ordering contract:
/// - The smallest distance along the ray wins.
/// - Exactly equal distances go to the item seen first.
pub fn pick_nearest<K, I>(ray: &Ray, items: I) -> Option<PickHit<K>>
where
    I: IntoIterator<Item = (K, HitVolume)>,
{
    let mut best: Option<(f64, K)> = None;
    for (key, volume) in items {
        let Some(t) = volume.hit_t(ray) else {
            continue;
        };
        let replace = match &best {
            None => true,
            Some((bt, _)) => stable_total_cmp_f64(t, *bt).is_lt(),
        };
        if replace {
            best = Some((t, key));
        }
    }

    let (t, key) = best?;
    Some(PickHit {
        key,
        distance: t,
        point: ray.at(t),
    })
}

/// Outcome of a marker pick.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub enum PickResult {
    #[default]
    None,
    Hit { region: RegionId, distance: f64 },
}

impl PickResult {
    pub fn region(&self) -> Option<RegionId> {
        match self {
            PickResult::None => None,
            PickResult::Hit { region, .. } => Some(*region),
        }
    }
}

/// Resolves which marker lies under the pointer.
///
/// Every marker gets a spherical hit-volume of `hit_radius` around its
/// placement, independent of how the marker is drawn. An optional occluder
/// (normally the globe) hides markers behind it.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PickingController {
    pub hit_radius: f64,
    pub occluder: Option<(Vec3, f64)>,
}

impl PickingController {
    pub fn new(hit_radius: f64) -> Self {
        Self {
            hit_radius,
            occluder: None,
        }
    }

    pub fn with_occluder(mut self, center: Vec3, radius: f64) -> Self {
        self.occluder = Some((center, radius));
        self
    }

    /// Picks among `placements`, whose positions are local to `parent`.
    ///
    /// Placements are visited in slice order, which is dataset order, so equal
    /// distances resolve to the lower `RegionId`.
    pub fn pick(
        &self,
        pointer: PointerState,
        camera: &PerspectiveCamera,
        placements: &[MarkerPlacement],
        parent: &Transform,
    ) -> PickResult {
        let ray = camera.ray_from_ndc(pointer.ndc);
        self.pick_ray(&ray, placements, parent)
    }

    pub fn pick_ray(&self, ray: &Ray, placements: &[MarkerPlacement], parent: &Transform) -> PickResult {
        let volumes = placements.iter().map(|p| {
            (
                p.region,
                HitVolume::Sphere {
                    center: parent.apply_point(p.position),
                    radius: self.hit_radius * parent.scale,
                },
            )
        });

        let Some(hit) = pick_nearest(ray, volumes) else {
            return PickResult::None;
        };

        if let Some((center, radius)) = self.occluder {
            let occluder_center = parent.apply_point(center);
            if let Some(t) = ray_sphere_hit_t(ray, occluder_center, radius * parent.scale) {
                if t < hit.distance {
                    return PickResult::None;
                }
            }
        }

        PickResult::Hit {
            region: hit.key,
            distance: hit.distance,
        }
    }
}
