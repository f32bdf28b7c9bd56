//! Damped orbit camera control.
//!
//! The camera sits on a sphere around `target`, described by a polar angle
//! (from +Y) and an azimuth (around +Y, measured from +Z). Drags queue angular
//! deltas; each `update` applies a `damping_factor` share of the pending delta
//! and keeps the remainder, so motion eases out after the pointer is released.

use serde::{Deserialize, Serialize};

use foundation::math::Vec3;

use crate::camera::{PerspectiveCamera, Viewport};

/// Smallest polar angle distance from either pole.
const POLAR_EPSILON: f64 = 1e-6;

/// Pending deltas below this are dropped.
const SETTLE_THRESHOLD: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitSettings {
    pub enable_damping: bool,
    pub damping_factor: f64,
    pub rotate_speed: f64,
    /// Dolly scale per 100 units of wheel delta, applied as
    /// `zoom_scale^(|delta_y| / 100)`.
    pub zoom_scale: f64,
    pub min_distance: f64,
    pub max_distance: f64,
}

impl Default for OrbitSettings {
    fn default() -> Self {
        Self {
            enable_damping: true,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_scale: 0.95,
            min_distance: 1.2,
            max_distance: 50.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrbitController {
    settings: OrbitSettings,
    target: Vec3,
    /// Current distance from target.
    radius: f64,
    /// Polar angle from +Y, radians.
    phi: f64,
    /// Azimuth around +Y from +Z, radians.
    theta: f64,
    /// Pending rotation not yet applied.
    delta_phi: f64,
    delta_theta: f64,
    /// Last pointer position while dragging.
    drag_from_px: Option<[f64; 2]>,
}

impl OrbitController {
    /// Starts from the camera's current position and target.
    pub fn from_camera(camera: &PerspectiveCamera, settings: OrbitSettings) -> Self {
        let offset = camera.position - camera.target;
        let radius = offset.length().max(f64::MIN_POSITIVE);
        let phi = (offset.y / radius).clamp(-1.0, 1.0).acos();
        let theta = offset.x.atan2(offset.z);
        Self {
            settings,
            target: camera.target,
            radius,
            phi,
            theta,
            delta_phi: 0.0,
            delta_theta: 0.0,
            drag_from_px: None,
        }
    }

    pub fn settings(&self) -> &OrbitSettings {
        &self.settings
    }

    pub fn distance(&self) -> f64 {
        self.radius
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_from_px.is_some()
    }

    pub fn begin_drag(&mut self, pos_px: [f64; 2]) {
        self.drag_from_px = Some(pos_px);
    }

    /// Queues rotation for a pointer move; ignored unless a drag is active.
    pub fn drag_to(&mut self, pos_px: [f64; 2], viewport: Viewport) {
        let Some(from) = self.drag_from_px else {
            return;
        };
        let dx = pos_px[0] - from[0];
        let dy = pos_px[1] - from[1];
        let k = std::f64::consts::TAU * self.settings.rotate_speed / viewport.height;
        // Dragging right spins the globe right, i.e. moves the camera left.
        self.delta_theta -= k * dx;
        self.delta_phi -= k * dy;
        self.drag_from_px = Some(pos_px);
    }

    pub fn end_drag(&mut self) {
        self.drag_from_px = None;
    }

    /// Dollies in for negative `delta_y`, out for positive, in proportion to
    /// the wheel travel. One 100-unit mouse notch is one `zoom_scale` step.
    pub fn zoom(&mut self, delta_y: f64) {
        if delta_y == 0.0 || !delta_y.is_finite() {
            return;
        }
        let scale = self.settings.zoom_scale.powf(delta_y.abs() * 0.01);
        let radius = if delta_y > 0.0 {
            self.radius / scale
        } else {
            self.radius * scale
        };
        self.radius = radius.clamp(self.settings.min_distance, self.settings.max_distance);
    }

    /// Applies pending motion and writes the resulting pose into `camera`.
    ///
    /// Returns `true` while motion is still settling.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let share = if self.settings.enable_damping {
            self.settings.damping_factor
        } else {
            1.0
        };

        self.theta += self.delta_theta * share;
        self.phi = (self.phi + self.delta_phi * share).clamp(POLAR_EPSILON, std::f64::consts::PI - POLAR_EPSILON);
        self.delta_theta *= 1.0 - share;
        self.delta_phi *= 1.0 - share;
        if self.delta_theta.abs() < SETTLE_THRESHOLD {
            self.delta_theta = 0.0;
        }
        if self.delta_phi.abs() < SETTLE_THRESHOLD {
            self.delta_phi = 0.0;
        }

        let sin_phi = self.phi.sin();
        let offset = Vec3::new(
            self.radius * sin_phi * self.theta.sin(),
            self.radius * self.phi.cos(),
            self.radius * sin_phi * self.theta.cos(),
        );
        camera.position = self.target + offset;
        camera.target = self.target;

        self.delta_theta != 0.0 || self.delta_phi != 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::{OrbitController, OrbitSettings};
    use crate::camera::{PerspectiveCamera, Viewport};
    use foundation::math::Vec3;

    fn assert_vec_close(a: Vec3, b: Vec3, eps: f64) {
        let d = (a - b).length();
        assert!(d <= eps, "expected {a:?} ~= {b:?} (diff {d})");
    }

    fn camera() -> PerspectiveCamera {
        PerspectiveCamera::new(45.0, 1.0, 0.1, 200.0).looking_at(Vec3::new(0.0, 0.0, 4.0), Vec3::ZERO)
    }

    #[test]
    fn idle_update_keeps_pose() {
        let mut cam = camera();
        let mut orbit = OrbitController::from_camera(&cam, OrbitSettings::default());
        assert!(!orbit.update(&mut cam));
        assert_vec_close(cam.position, Vec3::new(0.0, 0.0, 4.0), 1e-12);
    }

    #[test]
    fn undamped_drag_applies_immediately() {
        let mut cam = camera();
        let settings = OrbitSettings {
            enable_damping: false,
            ..OrbitSettings::default()
        };
        let mut orbit = OrbitController::from_camera(&cam, settings);
        let vp = Viewport::new(400.0, 400.0);
        orbit.begin_drag([200.0, 200.0]);
        // A quarter of the viewport height is a quarter turn.
        orbit.drag_to([100.0, 200.0], vp);
        orbit.end_drag();
        orbit.update(&mut cam);
        assert_vec_close(cam.position, Vec3::new(4.0, 0.0, 0.0), 1e-9);
    }

    #[test]
    fn damped_drag_eases_toward_full_delta() {
        let mut cam = camera();
        let mut orbit = OrbitController::from_camera(&cam, OrbitSettings::default());
        let vp = Viewport::new(400.0, 400.0);
        orbit.begin_drag([200.0, 200.0]);
        orbit.drag_to([100.0, 200.0], vp);
        orbit.end_drag();

        assert!(orbit.update(&mut cam));
        let first_step = cam.position;
        for _ in 0..2000 {
            orbit.update(&mut cam);
        }
        assert!(first_step.x > 0.0 && first_step.x < 1.0);
        assert_vec_close(cam.position, Vec3::new(4.0, 0.0, 0.0), 1e-6);
        assert!(!orbit.update(&mut cam));
    }

    #[test]
    fn moves_without_drag_are_ignored() {
        let mut cam = camera();
        let mut orbit = OrbitController::from_camera(&cam, OrbitSettings::default());
        orbit.drag_to([0.0, 0.0], Viewport::new(100.0, 100.0));
        assert!(!orbit.update(&mut cam));
    }

    #[test]
    fn zoom_is_clamped() {
        let cam = camera();
        let mut orbit = OrbitController::from_camera(&cam, OrbitSettings::default());
        orbit.zoom(-100.0);
        assert!((orbit.distance() - 3.8).abs() < 1e-12);
        for _ in 0..200 {
            orbit.zoom(-100.0);
        }
        assert_eq!(orbit.distance(), 1.2);
        for _ in 0..500 {
            orbit.zoom(100.0);
        }
        assert_eq!(orbit.distance(), 50.0);
    }

    #[test]
    fn zoom_follows_wheel_travel() {
        let cam = camera();

        let mut notch = OrbitController::from_camera(&cam, OrbitSettings::default());
        notch.zoom(-100.0);

        // Many small trackpad deltas add up to the same travel as one notch.
        let mut trackpad = OrbitController::from_camera(&cam, OrbitSettings::default());
        for _ in 0..60 {
            trackpad.zoom(-100.0 / 60.0);
        }
        assert!((trackpad.distance() - notch.distance()).abs() < 1e-9);
        assert!((trackpad.distance() - 3.8).abs() < 1e-9);

        let mut half = OrbitController::from_camera(&cam, OrbitSettings::default());
        half.zoom(-50.0);
        assert!((half.distance() - 4.0 * 0.95f64.sqrt()).abs() < 1e-12);

        half.zoom(50.0);
        assert!((half.distance() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn polar_angle_never_flips_over_pole() {
        let mut cam = camera();
        let settings = OrbitSettings {
            enable_damping: false,
            ..OrbitSettings::default()
        };
        let mut orbit = OrbitController::from_camera(&cam, settings);
        orbit.begin_drag([0.0, 0.0]);
        orbit.drag_to([0.0, 10_000.0], Viewport::new(100.0, 100.0));
        orbit.update(&mut cam);
        assert!(cam.position.y > 3.99);
    }
}
