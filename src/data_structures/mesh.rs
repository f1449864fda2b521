//! Mesh data on the CPU and the GPU.
//!
//! [`MeshData`] is the parsed, CPU-side triangle soup produced by the glTF
//! loader. It is what the surface sampler consumes. [`Mesh`] is the uploaded
//! counterpart holding the vertex/index buffers for the solid render path.

use cgmath::{InnerSpace, Vector3};
use wgpu::util::DeviceExt;

/// Trait for vertex types that can describe their GPU buffer layout.
pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

/// Vertex layout for the solid mesh pipeline.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 5]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Parsed triangle mesh, not yet uploaded.
///
/// `indices` reference `positions` in chunks of three. `normals` and
/// `tex_coords` are either empty or parallel to `positions`.
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub tex_coords: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// The three corner positions of triangle `i`.
    pub fn triangle(&self, i: usize) -> [Vector3<f32>; 3] {
        let a = self.indices[i * 3] as usize;
        let b = self.indices[i * 3 + 1] as usize;
        let c = self.indices[i * 3 + 2] as usize;
        [
            self.positions[a].into(),
            self.positions[b].into(),
            self.positions[c].into(),
        ]
    }

    /// The three corner normals of triangle `i`, if normals are present.
    pub fn triangle_normals(&self, i: usize) -> Option<[Vector3<f32>; 3]> {
        if self.normals.len() != self.positions.len() {
            return None;
        }
        let a = self.indices[i * 3] as usize;
        let b = self.indices[i * 3 + 1] as usize;
        let c = self.indices[i * 3 + 2] as usize;
        Some([
            self.normals[a].into(),
            self.normals[b].into(),
            self.normals[c].into(),
        ])
    }

    /// Fill in smooth per-vertex normals when the source file carries none.
    ///
    /// Face normals are accumulated area-weighted onto each corner vertex
    /// and normalized. Existing normals are left untouched.
    pub fn ensure_normals(&mut self) {
        if self.normals.len() == self.positions.len() {
            return;
        }
        let mut acc = vec![Vector3::new(0.0f32, 0.0, 0.0); self.positions.len()];
        for tri in 0..self.triangle_count() {
            let [p0, p1, p2] = self.triangle(tri);
            // Unnormalized cross product weights by triangle area.
            let face = (p1 - p0).cross(p2 - p0);
            for corner in 0..3 {
                acc[self.indices[tri * 3 + corner] as usize] += face;
            }
        }
        self.normals = acc
            .into_iter()
            .map(|n| {
                if n.magnitude2() > 0.0 {
                    n.normalize().into()
                } else {
                    [0.0, 1.0, 0.0]
                }
            })
            .collect();
    }

    /// Flatten several primitives into one mesh, rebasing indices.
    ///
    /// Attribute streams that only some parts carry are padded with
    /// defaults so the result stays internally parallel.
    pub fn merge(name: &str, parts: Vec<MeshData>) -> MeshData {
        let any_tex_coords = parts.iter().any(|p| !p.tex_coords.is_empty());
        let any_normals = parts.iter().any(|p| !p.normals.is_empty());

        let mut merged = MeshData {
            name: name.to_string(),
            ..Default::default()
        };
        for part in parts {
            let base = merged.positions.len() as u32;
            merged
                .indices
                .extend(part.indices.iter().map(|i| i + base));
            if any_normals {
                let mut normals = part.normals;
                normals.resize(part.positions.len(), [0.0, 1.0, 0.0]);
                merged.normals.extend(normals);
            }
            if any_tex_coords {
                let mut tex_coords = part.tex_coords;
                tex_coords.resize(part.positions.len(), [0.0, 0.0]);
                merged.tex_coords.extend(tex_coords);
            }
            merged.positions.extend(part.positions);
        }
        merged
    }

    /// Interleave into the GPU vertex layout.
    pub fn vertices(&self) -> Vec<ModelVertex> {
        (0..self.positions.len())
            .map(|i| ModelVertex {
                position: self.positions[i],
                tex_coords: self.tex_coords.get(i).copied().unwrap_or([0.0, 0.0]),
                normal: self.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
            })
            .collect()
    }
}

/// Uploaded mesh: vertex and index buffers plus the element count.
#[derive(Debug)]
pub struct Mesh {
    pub name: String,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
}

impl Mesh {
    pub fn from_data(device: &wgpu::Device, data: &MeshData) -> Self {
        let vertices = data.vertices();
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Vertex Buffer", data.name)),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Index Buffer", data.name)),
            contents: bytemuck::cast_slice(&data.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            name: data.name.clone(),
            vertex_buffer,
            index_buffer,
            num_elements: data.indices.len() as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> MeshData {
        MeshData {
            name: "quad".into(),
            positions: vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
            ],
            normals: Vec::new(),
            tex_coords: Vec::new(),
            indices: vec![0, 1, 2, 0, 2, 3],
        }
    }

    #[test]
    fn generated_normals_point_out_of_the_plane() {
        let mut mesh = quad();
        mesh.ensure_normals();
        assert_eq!(mesh.normals.len(), mesh.positions.len());
        for n in &mesh.normals {
            assert!((n[0]).abs() < 1e-6);
            assert!((n[1]).abs() < 1e-6);
            assert!((n[2] - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn existing_normals_are_kept() {
        let mut mesh = quad();
        mesh.normals = vec![[1.0, 0.0, 0.0]; 4];
        mesh.ensure_normals();
        assert_eq!(mesh.normals[0], [1.0, 0.0, 0.0]);
    }

    #[test]
    fn merge_rebases_indices_and_pads_attributes() {
        let mut a = quad();
        a.tex_coords = vec![[0.5, 0.5]; 4];
        let b = quad();
        let merged = MeshData::merge("merged", vec![a, b]);
        assert_eq!(merged.positions.len(), 8);
        assert_eq!(merged.indices.len(), 12);
        // Second part's indices point past the first part's vertices.
        assert_eq!(merged.indices[6], 4);
        // The part without tex coords got padded.
        assert_eq!(merged.tex_coords.len(), 8);
        assert_eq!(merged.tex_coords[4], [0.0, 0.0]);
    }

    #[test]
    fn vertices_fall_back_to_defaults_for_missing_attributes() {
        let mesh = quad();
        let vertices = mesh.vertices();
        assert_eq!(vertices.len(), 4);
        assert_eq!(vertices[0].tex_coords, [0.0, 0.0]);
        assert_eq!(vertices[0].normal, [0.0, 1.0, 0.0]);
    }
}
