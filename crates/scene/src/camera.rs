use foundation::math::{Mat4, Vec2, Vec3, mat4_look_at_rh, mat4_mul, mat4_perspective_rh_z0, mat4_transform_point};

use crate::picking::Ray;

/// Drawable area in CSS pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
        }
    }

    pub fn aspect(&self) -> f64 {
        self.width / self.height
    }
}

/// Perspective camera looking at `target`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PerspectiveCamera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_deg: f64,
    pub aspect: f64,
    pub near: f64,
    pub far: f64,
}

impl PerspectiveCamera {
    pub fn new(fov_y_deg: f64, aspect: f64, near: f64, far: f64) -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 1.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y_deg,
            aspect,
            near,
            far,
        }
    }

    pub fn looking_at(mut self, position: Vec3, target: Vec3) -> Self {
        self.position = position;
        self.target = target;
        self
    }

    pub fn set_aspect(&mut self, aspect: f64) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    /// Orthonormal `(forward, right, up)` camera basis.
    fn basis(&self) -> (Vec3, Vec3, Vec3) {
        let forward = (self.target - self.position).normalize().unwrap_or(-Vec3::Z);
        let right = forward.cross(self.up).normalize().unwrap_or(Vec3::X);
        let up = right.cross(forward);
        (forward, right, up)
    }

    /// World-space ray through a point in normalized device coordinates.
    pub fn ray_from_ndc(&self, ndc: Vec2) -> Ray {
        let (forward, right, up) = self.basis();
        let tan_half = (0.5 * self.fov_y_deg.to_radians()).tan();
        let dir = forward + right * (ndc.x * tan_half * self.aspect) + up * (ndc.y * tan_half);
        Ray::new(self.position, dir.normalize().unwrap_or(forward))
    }

    pub fn view_proj(&self) -> Mat4 {
        let view = mat4_look_at_rh(self.position, self.target, self.up);
        let proj = mat4_perspective_rh_z0(self.fov_y_deg.to_radians(), self.aspect, self.near, self.far);
        mat4_mul(proj, view)
    }

    /// Projects a world point to NDC; `None` when it lies behind the camera.
    pub fn project_to_ndc(&self, p: Vec3) -> Option<Vec2> {
        let clip = mat4_transform_point(&self.view_proj(), p);
        if clip[3] <= 1e-9 {
            return None;
        }
        Some(Vec2::new(clip[0] / clip[3], clip[1] / clip[3]))
    }

    /// Screen pixels per world unit at distance `depth` along the view axis.
    pub fn pixels_per_unit(&self, viewport: Viewport, depth: f64) -> f64 {
        let tan_half = (0.5 * self.fov_y_deg.to_radians()).tan();
        viewport.height / (2.0 * depth.max(self.near) * tan_half)
    }

    /// Distance of `p` along the view axis.
    pub fn depth_of(&self, p: Vec3) -> f64 {
        let (forward, _, _) = self.basis();
        (p - self.position).dot(forward)
    }
}

#[cfg(test)]
mod tests {
    use super::{PerspectiveCamera, Viewport};
    use foundation::math::{Vec2, Vec3};

    fn camera() -> PerspectiveCamera {
        PerspectiveCamera::new(45.0, 1.0, 0.1, 200.0).looking_at(Vec3::new(0.0, 0.0, 4.0), Vec3::ZERO)
    }

    #[test]
    fn center_ray_points_at_target() {
        let ray = camera().ray_from_ndc(Vec2::new(0.0, 0.0));
        assert_eq!(ray.origin, Vec3::new(0.0, 0.0, 4.0));
        assert!((ray.dir - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-12);
    }

    #[test]
    fn ndc_ray_and_projection_agree() {
        let cam = camera();
        let ndc = Vec2::new(0.3, -0.6);
        let ray = cam.ray_from_ndc(ndc);
        let p = ray.at(3.0);
        let back = cam.project_to_ndc(p).expect("in front");
        assert!((back.x - ndc.x).abs() < 1e-5, "{back:?}");
        assert!((back.y - ndc.y).abs() < 1e-5, "{back:?}");
    }

    #[test]
    fn points_behind_camera_do_not_project() {
        assert!(camera().project_to_ndc(Vec3::new(0.0, 0.0, 10.0)).is_none());
    }

    #[test]
    fn viewport_never_degenerates() {
        let v = Viewport::new(0.0, 0.0);
        assert_eq!(v.aspect(), 1.0);
        assert_eq!(Viewport::new(1280.0, 720.0).aspect(), 1280.0 / 720.0);
    }

    #[test]
    fn aspect_ignores_invalid_values() {
        let mut cam = camera();
        cam.set_aspect(f64::NAN);
        cam.set_aspect(-2.0);
        assert_eq!(cam.aspect, 1.0);
        cam.set_aspect(2.0);
        assert_eq!(cam.aspect, 2.0);
    }
}
