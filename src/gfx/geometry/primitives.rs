//! # Primitive Shape Generation
//!
//! Functions generating the primitive shapes used by the demo scene. Every
//! shape is centered on the Y axis, uses counter-clockwise front faces and
//! comes with per-vertex normals and texture coordinates.

use super::GeometryData;
use std::f32::consts::PI;

/// Generate a flat plane in the XZ plane, facing +Y
///
/// The plane spans `width` along X and `depth` along Z and is centered at
/// the origin. UVs run from 0 to 1 across the plane.
pub fn generate_plane(width: f32, depth: f32) -> GeometryData {
    let mut data = GeometryData::new();
    let (hw, hd) = (width / 2.0, depth / 2.0);
    let up = [0.0, 1.0, 0.0];

    data.push_vertex([-hw, 0.0, -hd], up, [0.0, 0.0]);
    data.push_vertex([-hw, 0.0, hd], up, [0.0, 1.0]);
    data.push_vertex([hw, 0.0, -hd], up, [1.0, 0.0]);
    data.push_vertex([hw, 0.0, hd], up, [1.0, 1.0]);

    data.push_triangle(0, 1, 2);
    data.push_triangle(1, 3, 2);
    data
}

/// Generate a cube with edge length `width`, centered at the origin
///
/// Every face has its own four vertices so normals stay flat.
pub fn generate_cube(width: f32) -> GeometryData {
    let mut data = GeometryData::new();
    let h = width / 2.0;

    // (normal, u, v) with u x v == normal
    let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ];

    for (normal, u, v) in faces {
        let base = data.vertex_count() as u32;
        for (a, b) in [(-1.0f32, -1.0f32), (1.0, -1.0), (-1.0, 1.0), (1.0, 1.0)] {
            let position = [
                h * (normal[0] + a * u[0] + b * v[0]),
                h * (normal[1] + a * u[1] + b * v[1]),
                h * (normal[2] + a * u[2] + b * v[2]),
            ];
            data.push_vertex(position, normal, [(a + 1.0) / 2.0, (1.0 - b) / 2.0]);
        }
        data.push_triangle(base, base + 1, base + 2);
        data.push_triangle(base + 1, base + 3, base + 2);
    }

    data
}

/// Generate a UV sphere
///
/// `subdivisions_height` is the number of latitude bands and
/// `subdivisions_axis` the number of longitude segments. The poles get one
/// vertex per segment so each pole triangle has its own texture coordinate.
/// The texture wraps once around the equator, with v = 0 at the top pole.
pub fn generate_sphere(radius: f32, subdivisions_height: u32, subdivisions_axis: u32) -> GeometryData {
    let mut data = GeometryData::new();
    let (rows, axis) = (subdivisions_height.max(2), subdivisions_axis.max(3));
    let ring = axis + 1;

    // Top pole
    for i in 0..axis {
        let u = (i as f32 + 0.5) / axis as f32;
        data.push_vertex([0.0, radius, 0.0], [0.0, 1.0, 0.0], [u, 0.0]);
        data.push_triangle(i, axis + i, axis + i + 1);
    }

    // Inner rings; the seam vertex is duplicated for texture coordinates
    for v in 1..rows {
        let theta = v as f32 * PI / rows as f32;
        for h in 0..=axis {
            let phi = h as f32 * 2.0 * PI / axis as f32;
            let normal = [theta.sin() * phi.sin(), theta.cos(), theta.sin() * phi.cos()];
            let position = [radius * normal[0], radius * normal[1], radius * normal[2]];
            data.push_vertex(position, normal, [h as f32 / axis as f32, v as f32 / rows as f32]);

            if v != rows - 1 && h != axis {
                let upper = axis + (v - 1) * ring + h;
                let lower = upper + ring;
                data.push_triangle(upper, lower + 1, upper + 1);
                data.push_triangle(upper, lower, lower + 1);
            }
        }
    }

    // Bottom pole
    let last_ring = axis + (rows - 2) * ring;
    let bottom = axis + (rows - 1) * ring;
    for i in 0..axis {
        let u = (i as f32 + 0.5) / axis as f32;
        data.push_vertex([0.0, -radius, 0.0], [0.0, -1.0, 0.0], [u, 1.0]);
        data.push_triangle(last_ring + i, bottom + i, last_ring + i + 1);
    }

    data
}

/// Generate a torus lying in the XZ plane
///
/// `radius` is the distance from the origin to the center of the tube and
/// `section_radius` the radius of the tube. `twist` rotates the starting
/// angle of every tube section, in radians.
pub fn generate_torus(
    radius: f32,
    section_radius: f32,
    twist: f32,
    subdivisions_axis: u32,
    subdivisions_height: u32,
) -> GeometryData {
    let mut data = GeometryData::new();
    let (axis, height) = (subdivisions_axis.max(3), subdivisions_height.max(3));
    let stride = height + 1;

    for i in 0..=axis {
        let phi = i as f32 * 2.0 * PI / axis as f32;
        let circle = [phi.cos(), 0.0, phi.sin()];

        for j in 0..=height {
            let theta = twist + j as f32 * 2.0 * PI / height as f32;
            let surface = [theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin()];
            let position = [
                radius * circle[0] + section_radius * surface[0],
                section_radius * surface[1],
                radius * circle[2] + section_radius * surface[2],
            ];
            data.push_vertex(
                position,
                surface,
                [i as f32 / axis as f32, j as f32 / height as f32],
            );

            if i == axis || j == height {
                continue;
            }

            let i0 = i * stride + j;
            let i1 = i0 + 1;
            let i2 = i0 + stride;
            let i3 = i2 + 1;
            data.push_triangle(i0, i2, i1);
            data.push_triangle(i1, i2, i3);
        }
    }

    data
}

/// Generate a flat ring (annulus) in the XZ plane, facing +Y
pub fn generate_ring(inner_radius: f32, outer_radius: f32, subdivisions_axis: u32) -> GeometryData {
    let mut data = GeometryData::new();
    let axis = subdivisions_axis.max(3);
    let up = [0.0, 1.0, 0.0];

    for i in 0..=axis {
        let phi = i as f32 * 2.0 * PI / axis as f32;
        let (sin, cos) = phi.sin_cos();
        let t = i as f32 / axis as f32;
        data.push_vertex([inner_radius * cos, 0.0, inner_radius * sin], up, [0.0, t]);
        data.push_vertex([outer_radius * cos, 0.0, outer_radius * sin], up, [1.0, t]);

        if i != axis {
            let inner = 2 * i;
            let outer = inner + 1;
            data.push_triangle(inner, inner + 2, outer);
            data.push_triangle(outer, inner + 2, outer + 2);
        }
    }

    data
}

/// Generate a capped cone with its tip at the origin, opening towards +Y
///
/// `angle` is the full apex angle in radians; the cap sits at `height`.
/// Side and cap use separate rim vertices so both get correct normals.
pub fn generate_cone(angle: f32, height: f32, subdivisions_axis: u32) -> GeometryData {
    let mut data = GeometryData::new();
    let axis = subdivisions_axis.max(3);
    let radius = (angle / 2.0).tan() * height;
    let slant = (height * height + radius * radius).sqrt().max(f32::EPSILON);

    // Tip
    data.push_vertex([0.0, 0.0, 0.0], [0.0, -1.0, 0.0], [0.5, 0.0]);

    let side_start = data.vertex_count() as u32;
    for i in 0..=axis {
        let phi = i as f32 * 2.0 * PI / axis as f32;
        let (sin, cos) = phi.sin_cos();
        let normal = [height * cos / slant, -radius / slant, height * sin / slant];
        data.push_vertex(
            [radius * cos, height, radius * sin],
            normal,
            [i as f32 / axis as f32, 1.0],
        );
    }

    let cap_start = data.vertex_count() as u32;
    for i in 0..=axis {
        let phi = i as f32 * 2.0 * PI / axis as f32;
        let (sin, cos) = phi.sin_cos();
        data.push_vertex(
            [radius * cos, height, radius * sin],
            [0.0, 1.0, 0.0],
            [0.5 + 0.5 * cos, 0.5 + 0.5 * sin],
        );
    }

    let center = data.vertex_count() as u32;
    data.push_vertex([0.0, height, 0.0], [0.0, 1.0, 0.0], [0.5, 0.5]);

    for i in 0..axis {
        data.push_triangle(0, side_start + i, side_start + i + 1);
        data.push_triangle(center, cap_start + i + 1, cap_start + i);
    }

    data
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sub(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
        [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
    }

    fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
        [
            a[1] * b[2] - a[2] * b[1],
            a[2] * b[0] - a[0] * b[2],
            a[0] * b[1] - a[1] * b[0],
        ]
    }

    fn dot(a: [f32; 3], b: [f32; 3]) -> f32 {
        a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
    }

    /// Every triangle of `data` must face away from `outward_from(centroid)`.
    fn assert_outward(data: &GeometryData, outward_from: impl Fn([f32; 3]) -> [f32; 3]) {
        for tri in data.indices.chunks(3) {
            let [a, b, c] = [0, 1, 2].map(|k| data.vertices[tri[k] as usize]);
            let normal = cross(sub(b, a), sub(c, a));
            let centroid = [
                (a[0] + b[0] + c[0]) / 3.0,
                (a[1] + b[1] + c[1]) / 3.0,
                (a[2] + b[2] + c[2]) / 3.0,
            ];
            let inside = outward_from(centroid);
            assert!(
                dot(normal, sub(centroid, inside)) > 0.0,
                "triangle {:?} faces inwards",
                tri
            );
        }
    }

    fn assert_indices_in_range(data: &GeometryData) {
        let count = data.vertex_count() as u32;
        assert!(data.indices.iter().all(|&i| i < count));
        assert_eq!(data.indices.len() % 3, 0);
        assert_eq!(data.normals.len(), data.vertex_count());
        assert_eq!(data.tex_coords.len(), data.vertex_count());
    }

    #[test]
    fn test_plane_generation() {
        let plane = generate_plane(20.0, 10.0);
        assert_eq!(plane.vertex_count(), 4);
        assert_eq!(plane.triangle_count(), 2);
        assert_indices_in_range(&plane);
        assert!(plane.vertices.iter().any(|v| *v == [10.0, 0.0, 5.0]));
        assert_outward(&plane, |c| [c[0], c[1] - 1.0, c[2]]);
    }

    #[test]
    fn test_cube_generation() {
        let cube = generate_cube(2.0);
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.triangle_count(), 12);
        assert_indices_in_range(&cube);
        for v in &cube.vertices {
            assert!(v.iter().all(|c| c.abs() == 1.0));
        }
        assert_outward(&cube, |_| [0.0; 3]);
    }

    #[test]
    fn test_sphere_generation() {
        let (h, a) = (8, 12);
        let sphere = generate_sphere(0.5, h, a);
        assert_eq!(sphere.vertex_count() as u32, 2 * a + (h - 1) * (a + 1));
        assert_eq!(sphere.triangle_count() as u32, 2 * a + 2 * a * (h - 2));
        assert_indices_in_range(&sphere);
        for v in &sphere.vertices {
            let length = dot(*v, *v).sqrt();
            assert!((length - 0.5).abs() < 1e-5);
        }
        assert_outward(&sphere, |_| [0.0; 3]);
    }

    #[test]
    fn test_torus_generation() {
        let torus = generate_torus(0.5, 0.1, 0.0, 16, 8);
        assert_eq!(torus.vertex_count(), 17 * 9);
        assert_eq!(torus.triangle_count(), 2 * 16 * 8);
        assert_indices_in_range(&torus);
        assert_outward(&torus, |c| {
            let len = (c[0] * c[0] + c[2] * c[2]).sqrt();
            [0.5 * c[0] / len, 0.0, 0.5 * c[2] / len]
        });
    }

    #[test]
    fn test_torus_with_different_subdivisions() {
        // Sections and segments counts must not be mixed up when indexing.
        let torus = generate_torus(1.0, 0.25, 0.3, 40, 10);
        assert_indices_in_range(&torus);
        let max_distance = torus
            .vertices
            .iter()
            .map(|v| (v[0] * v[0] + v[2] * v[2]).sqrt())
            .fold(0.0f32, f32::max);
        assert!(max_distance <= 1.25 + 1e-5);
    }

    #[test]
    fn test_ring_generation() {
        let ring = generate_ring(0.5, 1.0, 32);
        assert_eq!(ring.vertex_count(), 2 * 33);
        assert_eq!(ring.triangle_count(), 64);
        assert_indices_in_range(&ring);
        assert_outward(&ring, |c| [c[0], c[1] - 1.0, c[2]]);
    }

    #[test]
    fn test_cone_generation() {
        let cone = generate_cone(PI / 2.0, 1.0, 24);
        assert_indices_in_range(&cone);
        assert_eq!(cone.triangle_count(), 48);
        // 90 degree apex angle: rim radius equals height
        let rim = cone.vertices[1];
        assert!((rim[0] - 1.0).abs() < 1e-5 && (rim[1] - 1.0).abs() < 1e-5);
        assert_outward(&cone, |_| [0.0, 0.75, 0.0]);
    }
}
