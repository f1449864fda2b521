//! The particle rendition of a loaded model.
//!
//! A [`ParticleCloud`] is built once from parsed mesh data by sampling
//! points over its surface. Each sample becomes one instanced billboard;
//! the per-frame animation only rewrites the small cloud uniform, the
//! instance buffer itself is immutable after upload.

use cgmath::Matrix4;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use wgpu::util::DeviceExt;

use crate::data_structures::instance::Transform;
use crate::data_structures::mesh::{MeshData, Vertex};
use crate::sampling;

/// Tuning knobs for cloud construction, chosen at startup.
#[derive(Clone, Copy, Debug)]
pub struct CloudConfig {
    /// Number of surface samples requested.
    pub count: usize,
    /// Minimum spacing between samples; zero disables the rejection pass.
    pub min_distance: f32,
    /// Candidate draws per accepted sample before giving up.
    pub max_attempts: usize,
    /// Billboard edge length in world units.
    pub point_size: f32,
    /// RGBA particle tint.
    pub color: [f32; 4],
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            count: 20_000,
            min_distance: 0.0,
            max_attempts: 30,
            point_size: 0.02,
            color: [0.85, 0.92, 1.0, 0.9],
        }
    }
}

/// One sampled point as stored in the instance buffer.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ParticleRaw {
    position: [f32; 3],
    phase: f32,
    normal: [f32; 3],
    _pad: f32,
}

impl Vertex for ParticleRaw {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ParticleRaw>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 6,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Uniform shared by every particle of one cloud, rewritten per frame.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CloudUniform {
    model: [[f32; 4]; 4],
    color: [f32; 4],
    point_size: f32,
    time: f32,
    _padding: [f32; 2],
}

/// Corner offsets of the billboard quad, expanded in view space.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct QuadVertex {
    corner: [f32; 2],
}

impl Vertex for QuadVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x2,
            }],
        }
    }
}

// Two triangles spanning [-1, 1]^2.
const QUAD_CORNERS: [QuadVertex; 6] = [
    QuadVertex { corner: [-1.0, -1.0] },
    QuadVertex { corner: [1.0, -1.0] },
    QuadVertex { corner: [1.0, 1.0] },
    QuadVertex { corner: [-1.0, -1.0] },
    QuadVertex { corner: [1.0, 1.0] },
    QuadVertex { corner: [-1.0, 1.0] },
];

#[derive(Debug)]
pub struct ParticleCloud {
    pub quad_buffer: wgpu::Buffer,
    pub instance_buffer: wgpu::Buffer,
    pub uniform_buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub amount: u32,
    config: CloudConfig,
}

impl ParticleCloud {
    /// Sample the mesh surface and upload the resulting cloud.
    ///
    /// `seed` fixes the sample pattern so reloading the same asset yields
    /// the same cloud.
    pub fn from_mesh_data(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        data: &MeshData,
        config: CloudConfig,
        seed: u64,
    ) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let samples = if config.min_distance > 0.0 {
            sampling::sample_surface_min_dist(
                data,
                config.count,
                config.min_distance,
                config.max_attempts,
                &mut rng,
            )
        } else {
            sampling::sample_surface(data, config.count, &mut rng)
        };
        if samples.len() < config.count {
            log::info!(
                "cloud for {:?} holds {} of {} requested particles",
                data.name,
                samples.len(),
                config.count
            );
        }

        let instances: Vec<ParticleRaw> = samples
            .iter()
            .map(|s| ParticleRaw {
                position: s.position.into(),
                phase: rng.gen_range(0.0..std::f32::consts::TAU),
                normal: s.normal.into(),
                _pad: 0.0,
            })
            .collect();

        let quad_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Particle Quad Buffer"),
            contents: bytemuck::cast_slice(&QUAD_CORNERS),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Particle Instance Buffer", data.name)),
            contents: bytemuck::cast_slice(&instances),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let uniform = CloudUniform {
            model: Matrix4::from_scale(1.0f32).into(),
            color: config.color,
            point_size: config.point_size,
            time: 0.0,
            _padding: [0.0; 2],
        };
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Cloud Uniform Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
            label: Some("cloud_bind_group"),
        });

        Self {
            quad_buffer,
            instance_buffer,
            uniform_buffer,
            bind_group,
            amount: instances.len() as u32,
            config,
        }
    }

    /// Push the model transform and clock into the cloud uniform.
    pub fn update(&self, queue: &wgpu::Queue, transform: &Transform, time: f32) {
        let uniform = CloudUniform {
            model: transform.to_matrix().into(),
            color: self.config.color,
            point_size: self.config.point_size,
            time,
            _padding: [0.0; 2],
        };
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniform]));
    }
}
