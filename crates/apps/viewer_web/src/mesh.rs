//! CPU-side geometry for the GPU host.

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

/// Unit sphere laid out so an equirectangular texture lines up with
/// `foundation::math::project`.
///
/// `u` runs 0..1 from longitude -180 eastward and `v` runs 0..1 from the north
/// pole; texture rows are uploaded top (north) first, so `uv` is `(u, v)`.
pub fn generate_sphere_mesh(width_segments: u32, height_segments: u32) -> (Vec<Vertex>, Vec<u32>) {
    let w = width_segments.max(3);
    let h = height_segments.max(2);

    let mut vertices = Vec::with_capacity(((w + 1) * (h + 1)) as usize);
    for iy in 0..=h {
        let v = iy as f32 / h as f32;
        let polar = v * std::f32::consts::PI;
        let (sin_p, cos_p) = polar.sin_cos();
        for ix in 0..=w {
            let u = ix as f32 / w as f32;
            let (sin_a, cos_a) = (u * std::f32::consts::TAU).sin_cos();
            let p = [-cos_a * sin_p, cos_p, sin_a * sin_p];
            vertices.push(Vertex {
                position: p,
                normal: p,
                uv: [u, v],
            });
        }
    }

    let stride = w + 1;
    let mut indices = Vec::with_capacity((w * h * 6) as usize);
    for iy in 0..h {
        for ix in 0..w {
            let a = iy * stride + ix + 1;
            let b = iy * stride + ix;
            let c = (iy + 1) * stride + ix;
            let d = (iy + 1) * stride + ix + 1;
            // The pole rows collapse to a point; skip their degenerate halves.
            if iy != 0 {
                indices.extend_from_slice(&[a, b, d]);
            }
            if iy != h - 1 {
                indices.extend_from_slice(&[b, c, d]);
            }
        }
    }

    (vertices, indices)
}

/// SRGB-encoded channel to linear, for shading in a linear framebuffer.
pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::{generate_sphere_mesh, srgb_to_linear};
    use foundation::math::project;

    #[test]
    fn vertex_and_index_counts() {
        let (vertices, indices) = generate_sphere_mesh(64, 64);
        assert_eq!(vertices.len(), 65 * 65);
        // Two triangles per quad minus one per quad on each pole row.
        assert_eq!(indices.len(), (64 * 64 * 2 - 2 * 64) * 3);
        assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));
    }

    #[test]
    fn texture_coordinates_match_projection() {
        let (vertices, _) = generate_sphere_mesh(8, 4);
        for vtx in &vertices {
            let [u, v] = vtx.uv;
            // Seam and poles are ambiguous in longitude.
            if u >= 1.0 || v <= 0.0 || v >= 1.0 {
                continue;
            }
            let lat = 90.0 - v as f64 * 180.0;
            let lon = u as f64 * 360.0 - 180.0;
            let p = project(lat, lon, 1.0).unwrap();
            let got = vtx.position;
            assert!((p.x - got[0] as f64).abs() < 1e-5, "{lat},{lon}");
            assert!((p.y - got[1] as f64).abs() < 1e-5, "{lat},{lon}");
            assert!((p.z - got[2] as f64).abs() < 1e-5, "{lat},{lon}");
        }
    }

    #[test]
    fn srgb_endpoints() {
        assert_eq!(srgb_to_linear(0.0), 0.0);
        assert!((srgb_to_linear(1.0) - 1.0).abs() < 1e-6);
        assert!(srgb_to_linear(0.5) < 0.5);
    }
}
