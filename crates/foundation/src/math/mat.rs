//! Small matrix helpers.
//!
//! `Mat3` is a row-major rotation/basis matrix used on the CPU side for scene
//! transforms. The `mat4_*` functions build column-major `f32` matrices in the
//! layout WGSL expects.

use super::Vec3;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Mat3 {
    pub rows: [[f64; 3]; 3],
}

impl Default for Mat3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat3 {
    pub const IDENTITY: Mat3 = Mat3 {
        rows: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
    };

    /// Builds a matrix whose columns are the given basis vectors.
    pub fn from_columns(x: Vec3, y: Vec3, z: Vec3) -> Self {
        Self {
            rows: [[x.x, y.x, z.x], [x.y, y.y, z.y], [x.z, y.z, z.z]],
        }
    }

    pub fn column(&self, i: usize) -> Vec3 {
        Vec3::new(self.rows[0][i], self.rows[1][i], self.rows[2][i])
    }

    /// Right-handed rotation about +Y.
    pub fn rotation_y(angle_rad: f64) -> Self {
        let (s, c) = angle_rad.sin_cos();
        Self {
            rows: [[c, 0.0, s], [0.0, 1.0, 0.0], [-s, 0.0, c]],
        }
    }

    /// Orientation whose local +Z points from `eye` toward `target`.
    ///
    /// This is the object (not camera) convention: a billboard oriented with
    /// this basis shows its front face to `target`. Returns `None` when the
    /// points coincide or `up` is parallel to the view direction.
    pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Option<Self> {
        let z = (target - eye).normalize()?;
        let x = up.cross(z).normalize()?;
        let y = z.cross(x);
        Some(Self::from_columns(x, y, z))
    }

    pub fn mul_vec(&self, v: Vec3) -> Vec3 {
        let r = &self.rows;
        Vec3::new(
            r[0][0] * v.x + r[0][1] * v.y + r[0][2] * v.z,
            r[1][0] * v.x + r[1][1] * v.y + r[1][2] * v.z,
            r[2][0] * v.x + r[2][1] * v.y + r[2][2] * v.z,
        )
    }

    pub fn mul(&self, other: &Mat3) -> Mat3 {
        let mut rows = [[0.0; 3]; 3];
        for (i, row) in rows.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = (0..3).map(|k| self.rows[i][k] * other.rows[k][j]).sum();
            }
        }
        Mat3 { rows }
    }
}

pub type Mat4 = [[f32; 4]; 4];

pub const MAT4_IDENTITY: Mat4 = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

pub fn mat4_mul(a: Mat4, b: Mat4) -> Mat4 {
    // Column-major matrix multiply: c = a * b
    let mut c = [[0.0f32; 4]; 4];
    for col in 0..4 {
        for row in 0..4 {
            c[col][row] = a[0][row] * b[col][0]
                + a[1][row] * b[col][1]
                + a[2][row] * b[col][2]
                + a[3][row] * b[col][3];
        }
    }
    c
}

pub fn mat4_perspective_rh_z0(fov_y_rad: f64, aspect: f64, near: f64, far: f64) -> Mat4 {
    let f = 1.0 / (0.5 * fov_y_rad).tan();
    let m00 = (f / aspect) as f32;
    let m11 = f as f32;
    let m22 = (far / (near - far)) as f32;
    let m23 = ((near * far) / (near - far)) as f32;

    // RH, depth range [0, 1].
    [
        [m00, 0.0, 0.0, 0.0],
        [0.0, m11, 0.0, 0.0],
        [0.0, 0.0, m22, -1.0],
        [0.0, 0.0, m23, 0.0],
    ]
}

pub fn mat4_look_at_rh(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
    let f = (target - eye).normalize().unwrap_or(-Vec3::Z);
    let s = f.cross(up).normalize().unwrap_or(Vec3::X);
    let u = s.cross(f);

    let ex = -s.dot(eye);
    let ey = -u.dot(eye);
    let ez = f.dot(eye);

    [
        [s.x as f32, u.x as f32, (-f.x) as f32, 0.0],
        [s.y as f32, u.y as f32, (-f.y) as f32, 0.0],
        [s.z as f32, u.z as f32, (-f.z) as f32, 0.0],
        [ex as f32, ey as f32, ez as f32, 1.0],
    ]
}

/// Model matrix for `translation * basis * uniform scale`.
pub fn mat4_from_basis(translation: Vec3, basis: &Mat3, scale: f64) -> Mat4 {
    let x = basis.column(0) * scale;
    let y = basis.column(1) * scale;
    let z = basis.column(2) * scale;
    [
        [x.x as f32, x.y as f32, x.z as f32, 0.0],
        [y.x as f32, y.y as f32, y.z as f32, 0.0],
        [z.x as f32, z.y as f32, z.z as f32, 0.0],
        [
            translation.x as f32,
            translation.y as f32,
            translation.z as f32,
            1.0,
        ],
    ]
}

/// Transforms a point by a column-major matrix, returning clip coordinates.
pub fn mat4_transform_point(m: &Mat4, p: Vec3) -> [f64; 4] {
    let v = [p.x as f32, p.y as f32, p.z as f32, 1.0f32];
    let mut out = [0.0f64; 4];
    for (row, o) in out.iter_mut().enumerate() {
        *o = (0..4).map(|col| (m[col][row] * v[col]) as f64).sum();
    }
    out
}
