use foundation::math::{Mat3, Vec3};

/// Local transform of a scene node: `translate * rotate * scale`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Mat3,
    pub scale: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Mat3::IDENTITY,
            scale: 1.0,
        }
    }

    pub fn translate(position: Vec3) -> Self {
        Self {
            position,
            ..Self::identity()
        }
    }

    pub fn rotation_y(angle_rad: f64) -> Self {
        Self {
            rotation: Mat3::rotation_y(angle_rad),
            ..Self::identity()
        }
    }

    pub fn with_rotation(mut self, rotation: Mat3) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn apply_point(&self, p: Vec3) -> Vec3 {
        self.position + self.rotation.mul_vec(p * self.scale)
    }

    pub fn apply_vector(&self, v: Vec3) -> Vec3 {
        self.rotation.mul_vec(v * self.scale)
    }

    /// Composes `self` (parent) with `child`, giving the child's world transform.
    pub fn then(&self, child: &Transform) -> Transform {
        Transform {
            position: self.apply_point(child.position),
            rotation: self.rotation.mul(&child.rotation),
            scale: self.scale * child.scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Transform;
    use foundation::math::Vec3;

    #[test]
    fn identity_is_origin() {
        let transform = Transform::identity();
        assert_eq!(transform.position, Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(transform.apply_point(Vec3::X), Vec3::X);
    }

    #[test]
    fn child_follows_parent_rotation() {
        let parent = Transform::rotation_y(std::f64::consts::PI);
        let child = Transform::translate(Vec3::new(1.0, 0.5, 0.0));
        let world = parent.then(&child);
        assert!((world.position - Vec3::new(-1.0, 0.5, 0.0)).length() < 1e-12);
    }
}
