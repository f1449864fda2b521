//! Presentation objects: one loaded asset with both of its renditions.
//!
//! A [`Model`] mirrors what the viewer shows for one asset: the solid mesh
//! with its material, the particle cloud sampled from the same surface, a
//! transform shared by both, and an active flag controlling whether the
//! render pass draws it. Models are created once at startup and populated
//! asynchronously; the texture and the glTF file load as independent
//! futures that are joined before any GPU resource is built.

use cgmath::Rad;
use wgpu::util::DeviceExt;

use crate::data_structures::instance::Transform;
use crate::data_structures::mesh::{Mesh, MeshData};
use crate::data_structures::particle::{CloudConfig, ParticleCloud};
use crate::resources;

/// Everything needed to load one model, chosen at startup.
#[derive(Clone, Debug)]
pub struct ModelDescriptor {
    pub name: &'static str,
    /// glTF/GLB file under the asset directory.
    pub file: &'static str,
    /// Diffuse map under the asset directory.
    pub texture_file: &'static str,
    pub material: MaterialParams,
    pub cloud: CloudConfig,
    /// Fixed sampler seed so the cloud is stable across runs.
    pub cloud_seed: u64,
    /// Attach to the scene as soon as loading finishes.
    pub attach_on_load: bool,
}

/// Scalar material inputs, uploaded as a uniform.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialParams {
    pub base_color: [f32; 4],
    pub roughness: f32,
    pub clearcoat: f32,
    pub _padding: [f32; 2],
}

impl Default for MaterialParams {
    fn default() -> Self {
        Self {
            // Near-black base with a glossy coat.
            base_color: [0.07, 0.07, 0.07, 1.0],
            roughness: 0.1,
            clearcoat: 0.7,
            _padding: [0.0; 2],
        }
    }
}

/// A mesh material: diffuse texture plus scalar parameters, one bind group.
#[derive(Debug)]
pub struct Material {
    pub name: String,
    #[allow(unused)]
    pub params_buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl Material {
    pub fn new(
        device: &wgpu::Device,
        name: &str,
        diffuse: &crate::data_structures::texture::Texture,
        params: MaterialParams,
    ) -> Self {
        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{name} Material Params")),
            contents: bytemuck::cast_slice(&[params]),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let layout = resources::texture::material_layout(device);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&diffuse.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&diffuse.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: params_buffer.as_entire_binding(),
                },
            ],
            label: Some(&format!("{name}_material_bind_group")),
        });
        Self {
            name: name.to_string(),
            params_buffer,
            bind_group,
        }
    }
}

#[derive(Debug)]
pub struct Model {
    pub name: String,
    pub mesh: Mesh,
    pub material: Material,
    pub cloud: ParticleCloud,
    pub transform: Transform,
    pub transform_buffer: wgpu::Buffer,
    pub is_active: bool,
}

impl Model {
    /// Load the texture and the glTF file concurrently, then build every
    /// GPU resource for both renditions.
    pub async fn load(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        cloud_layout: &wgpu::BindGroupLayout,
        desc: &ModelDescriptor,
    ) -> anyhow::Result<Self> {
        let (diffuse, parts) = tokio::try_join!(
            resources::texture::load_texture(desc.texture_file, device, queue),
            resources::gltf::load_mesh_data(desc.file),
        )?;

        let data = MeshData::merge(desc.name, parts);
        log::info!(
            "loaded {:?}: {} vertices, {} triangles",
            desc.name,
            data.positions.len(),
            data.triangle_count()
        );

        let mesh = Mesh::from_data(device, &data);
        let material = Material::new(device, desc.name, &diffuse, desc.material);
        let cloud =
            ParticleCloud::from_mesh_data(device, cloud_layout, &data, desc.cloud, desc.cloud_seed);

        let transform = Transform::new();
        let transform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Transform Buffer", desc.name)),
            contents: bytemuck::cast_slice(&[transform.to_raw()]),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });

        Ok(Self {
            name: desc.name.to_string(),
            mesh,
            material,
            cloud,
            transform,
            transform_buffer,
            is_active: desc.attach_on_load,
        })
    }

    pub fn attach(&mut self) {
        self.is_active = true;
    }

    pub fn detach(&mut self) {
        self.is_active = false;
    }

    /// Apply the time-based bob and sway, then push both renditions'
    /// per-object data to the GPU.
    pub fn animate(&mut self, queue: &wgpu::Queue, time: f32) {
        self.transform.position.y = bob_height(time);
        self.transform.set_yaw(Rad(sway_angle(time)));
        queue.write_buffer(
            &self.transform_buffer,
            0,
            bytemuck::cast_slice(&[self.transform.to_raw()]),
        );
        self.cloud.update(queue, &self.transform, time);
    }
}

/// Vertical drift of the model: three stacked sines give a slow,
/// non-repeating float.
pub fn bob_height(time: f32) -> f32 {
    let t = time * 2.0;
    (t / 2.0).sin() * (t / 4.0).sin() * (t / 8.0).sin() / 14.0
}

/// Slow oscillating rotation about the vertical axis.
pub fn sway_angle(time: f32) -> f32 {
    let t = time * 2.0;
    std::f32::consts::PI / 16.0 * (t / 4.0).sin()
}

/// The scene root: owns every presentation object.
#[derive(Debug, Default)]
pub struct Scene {
    pub models: Vec<Model>,
}

impl Scene {
    pub fn active_models(&self) -> impl Iterator<Item = &Model> {
        self.models.iter().filter(|m| m.is_active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn bob_starts_at_rest_and_stays_subtle() {
        assert_eq!(bob_height(0.0), 0.0);
        for i in 0..1000 {
            let h = bob_height(i as f32 * 0.1);
            assert!(h.abs() <= 1.0 / 14.0 + 1e-6);
        }
    }

    #[test]
    fn sway_peaks_at_a_sixteenth_turn() {
        assert_eq!(sway_angle(0.0), 0.0);
        // t*2/4 = pi/2  =>  time = pi
        let peak = sway_angle(PI);
        assert!((peak - PI / 16.0).abs() < 1e-5);
        for i in 0..1000 {
            assert!(sway_angle(i as f32 * 0.1).abs() <= PI / 16.0 + 1e-6);
        }
    }
}
