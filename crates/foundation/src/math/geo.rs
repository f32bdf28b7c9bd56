//! Spherical geo-projection for the globe scene.
//!
//! Axis convention: +Y is the north pole, longitude -180 lies on +X and
//! longitude -90 on +Z. This matches the equirectangular UV layout of the
//! globe mesh (u = 0 at longitude -180, v = 0 at the north pole), so a marker
//! projected here sits on the matching texel of the earth texture.

use std::f64::consts::PI;

use super::Vec3;

pub const MIN_LATITUDE_DEG: f64 = -90.0;
pub const MAX_LATITUDE_DEG: f64 = 90.0;
pub const MIN_LONGITUDE_DEG: f64 = -180.0;
pub const MAX_LONGITUDE_DEG: f64 = 180.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeoError {
    LatitudeOutOfRange(f64),
    LongitudeOutOfRange(f64),
    InvalidRadius(f64),
}

impl std::fmt::Display for GeoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeoError::LatitudeOutOfRange(v) => {
                write!(f, "latitude {v} outside [{MIN_LATITUDE_DEG}, {MAX_LATITUDE_DEG}]")
            }
            GeoError::LongitudeOutOfRange(v) => {
                write!(f, "longitude {v} outside [{MIN_LONGITUDE_DEG}, {MAX_LONGITUDE_DEG}]")
            }
            GeoError::InvalidRadius(v) => write!(f, "radius {v} must be finite and > 0"),
        }
    }
}

impl std::error::Error for GeoError {}

pub fn check_latitude(lat_deg: f64) -> Result<(), GeoError> {
    if (MIN_LATITUDE_DEG..=MAX_LATITUDE_DEG).contains(&lat_deg) {
        Ok(())
    } else {
        Err(GeoError::LatitudeOutOfRange(lat_deg))
    }
}

pub fn check_longitude(lon_deg: f64) -> Result<(), GeoError> {
    if (MIN_LONGITUDE_DEG..=MAX_LONGITUDE_DEG).contains(&lon_deg) {
        Ok(())
    } else {
        Err(GeoError::LongitudeOutOfRange(lon_deg))
    }
}

/// Projects a latitude/longitude (degrees) onto a sphere of `radius`.
///
/// Inputs outside the geographic range are rejected, never clamped; NaN
/// fails the range checks as well.
pub fn project(lat_deg: f64, lon_deg: f64, radius: f64) -> Result<Vec3, GeoError> {
    check_latitude(lat_deg)?;
    check_longitude(lon_deg)?;
    if !(radius.is_finite() && radius > 0.0) {
        return Err(GeoError::InvalidRadius(radius));
    }

    let phi = (90.0 - lat_deg) * (PI / 180.0);
    let theta = (lon_deg + 180.0) * (PI / 180.0);

    let x = -(radius * phi.sin() * theta.cos());
    let z = radius * phi.sin() * theta.sin();
    let y = radius * phi.cos();

    Ok(Vec3::new(x, y, z))
}
