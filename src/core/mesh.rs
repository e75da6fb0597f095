use std::path::Path;

use anyhow::Context;

#[derive(Copy, Clone, Debug)]
pub struct MeshVertex {
    pub position: glam::Vec3A,
    pub normal: glam::Vec3A,
}

/// Indexed triangle list.
#[derive(Clone, Debug, Default)]
pub struct Mesh {
    vertices: Vec<MeshVertex>,
    indices: Vec<u32>,
}

impl Default for MeshVertex {
    fn default() -> Self {
        Self {
            position: glam::Vec3A::ZERO,
            normal: glam::Vec3A::Z,
        }
    }
}

impl Mesh {
    pub fn new(vertices: Vec<MeshVertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Builds a mesh whose vertex normals average the adjacent face normals.
    pub fn with_smooth_normals(positions: Vec<glam::Vec3A>, indices: Vec<u32>) -> Self {
        let vertex_count = positions.len();
        let mut normals_sum = vec![glam::Vec3A::ZERO; vertex_count];

        for tri in indices.chunks_exact(3) {
            let (i0, i1, i2) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
            let p0 = positions[i0];
            let e1 = positions[i1] - p0;
            let e2 = positions[i2] - p0;
            // area weighted
            let n = e1.cross(e2);
            normals_sum[i0] += n;
            normals_sum[i1] += n;
            normals_sum[i2] += n;
        }

        let vertices = positions
            .into_iter()
            .zip(normals_sum)
            .map(|(position, n)| MeshVertex {
                position,
                normal: if n.length_squared() > 0.0 {
                    n.normalize()
                } else {
                    glam::Vec3A::Z
                },
            })
            .collect();
        Self { vertices, indices }
    }

    pub fn load_obj<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let mut load_options = tobj::LoadOptions::default();
        load_options.triangulate = true;
        load_options.single_index = true;
        let (models, _) = tobj::load_obj(path, &load_options)
            .context(format!("can't read obj file '{}'", path.display()))?;

        let mut mesh = Mesh::default();
        for model in models {
            let positions: Vec<glam::Vec3A> = model
                .mesh
                .positions
                .chunks_exact(3)
                .map(|p| glam::Vec3A::new(p[0], p[1], p[2]))
                .collect();
            if let Some(&max_index) = model.mesh.indices.iter().max() {
                if max_index as usize >= positions.len() {
                    anyhow::bail!(format!(
                        "'{}' - model '{}' indexes vertex {} of {}",
                        path.display(),
                        model.name,
                        max_index,
                        positions.len()
                    ));
                }
            }

            let part = if model.mesh.normals.len() == model.mesh.positions.len() {
                let vertices = positions
                    .into_iter()
                    .zip(model.mesh.normals.chunks_exact(3))
                    .map(|(position, n)| MeshVertex {
                        position,
                        normal: glam::Vec3A::new(n[0], n[1], n[2]).normalize_or_zero(),
                    })
                    .collect();
                Mesh::new(vertices, model.mesh.indices)
            } else {
                Mesh::with_smooth_normals(positions, model.mesh.indices)
            };
            mesh.append(part);
        }

        log::debug!(
            "loaded '{}': {} vertices, {} triangles",
            path.display(),
            mesh.vertex_count(),
            mesh.triangle_count()
        );
        Ok(mesh)
    }

    /// Axis aligned box with flat shaded faces.
    pub fn cube(size: glam::Vec3A, center: glam::Vec3A) -> Self {
        let h = size * 0.5;
        let faces = [
            (glam::Vec3A::X, glam::Vec3A::Y, glam::Vec3A::Z),
            (-glam::Vec3A::X, glam::Vec3A::Z, glam::Vec3A::Y),
            (glam::Vec3A::Y, glam::Vec3A::Z, glam::Vec3A::X),
            (-glam::Vec3A::Y, glam::Vec3A::X, glam::Vec3A::Z),
            (glam::Vec3A::Z, glam::Vec3A::X, glam::Vec3A::Y),
            (-glam::Vec3A::Z, glam::Vec3A::Y, glam::Vec3A::X),
        ];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, u, v) in faces.iter().copied() {
            let base = vertices.len() as u32;
            let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];
            for (su, sv) in corners.iter().copied() {
                let position = center + (normal + u * su + v * sv) * h;
                vertices.push(MeshVertex { position, normal });
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        Self { vertices, indices }
    }

    /// UV sphere; `divisions` is the number of latitude bands.
    pub fn sphere(radius: f32, divisions: u32, center: glam::Vec3A) -> Self {
        let stacks = divisions.max(2);
        let slices = stacks * 2;

        let mut vertices = Vec::with_capacity(((stacks + 1) * (slices + 1)) as usize);
        for i in 0..=stacks {
            let theta = std::f32::consts::PI * i as f32 / stacks as f32;
            for j in 0..=slices {
                let phi = 2.0 * std::f32::consts::PI * j as f32 / slices as f32;
                let normal = glam::Vec3A::new(
                    theta.sin() * phi.cos(),
                    theta.cos(),
                    -theta.sin() * phi.sin(),
                );
                vertices.push(MeshVertex {
                    position: center + normal * radius,
                    normal,
                });
            }
        }

        let mut indices = Vec::with_capacity((stacks * slices * 6) as usize);
        let row = slices + 1;
        for i in 0..stacks {
            for j in 0..slices {
                let a = i * row + j;
                let b = a + row;
                indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
            }
        }
        Self { vertices, indices }
    }

    pub fn append(&mut self, mut other: Mesh) {
        let offset = self.vertices.len() as u32;
        self.vertices.append(&mut other.vertices);
        self.indices.extend(other.indices.into_iter().map(|i| i + offset));
    }

    pub fn vertices(&self) -> &[MeshVertex] {
        &self.vertices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.len() < 3
    }

    pub fn triangles(&self) -> impl Iterator<Item = [&MeshVertex; 3]> + '_ {
        self.indices.chunks_exact(3).map(move |tri| {
            [
                &self.vertices[tri[0] as usize],
                &self.vertices[tri[1] as usize],
                &self.vertices[tri[2] as usize],
            ]
        })
    }

    pub fn bbox(&self) -> Option<(glam::Vec3A, glam::Vec3A)> {
        let first = self.vertices.first()?.position;
        Some(
            self.vertices
                .iter()
                .fold((first, first), |(p_min, p_max), v| {
                    (p_min.min(v.position), p_max.max(v.position))
                }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_faces_point_outwards() {
        let cube = Mesh::cube(glam::Vec3A::ONE, glam::Vec3A::ZERO);
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.triangle_count(), 12);
        for [v0, v1, v2] in cube.triangles() {
            let n = (v1.position - v0.position).cross(v2.position - v0.position);
            assert!(n.dot(v0.normal) > 0.0, "triangle winding must be counter-clockwise");
            assert!(v0.position.dot(v0.normal) > 0.0);
        }
        let (p_min, p_max) = cube.bbox().unwrap();
        assert_eq!(p_min, glam::Vec3A::splat(-0.5));
        assert_eq!(p_max, glam::Vec3A::splat(0.5));
    }

    #[test]
    fn sphere_normals_are_unit() {
        let sphere = Mesh::sphere(2.0, 8, glam::Vec3A::ZERO);
        for v in sphere.vertices() {
            assert!((v.normal.length() - 1.0).abs() < 1e-5);
            assert!((v.position.length() - 2.0).abs() < 1e-4);
        }
    }

    #[test]
    fn smooth_normals_from_faces() {
        let positions = vec![
            glam::Vec3A::new(0.0, 0.0, 0.0),
            glam::Vec3A::new(1.0, 0.0, 0.0),
            glam::Vec3A::new(0.0, 1.0, 0.0),
        ];
        let mesh = Mesh::with_smooth_normals(positions, vec![0, 1, 2]);
        for v in mesh.vertices() {
            assert_eq!(v.normal, glam::Vec3A::Z);
        }
    }

    #[test]
    fn append_offsets_indices() {
        let mut a = Mesh::cube(glam::Vec3A::ONE, glam::Vec3A::ZERO);
        a.append(Mesh::cube(glam::Vec3A::ONE, glam::Vec3A::new(3.0, 0.0, 0.0)));
        assert_eq!(a.triangle_count(), 24);
        let (_, p_max) = a.bbox().unwrap();
        assert_eq!(p_max.x, 3.5);
    }
}
