//! Per-object transform data for the GPU.
//!
//! The viewer animates whole presentation objects (bob and sway), so each
//! model carries one [`Transform`] that is re-packed into a [`TransformRaw`]
//! and written to its instance buffer every frame.

use cgmath::{Matrix3, Matrix4, One, Rad};

/// Position, rotation and scale of a presentation object.
#[derive(Clone, Copy, Debug)]
pub struct Transform {
    pub position: cgmath::Vector3<f32>,
    pub rotation: cgmath::Quaternion<f32>,
    pub scale: f32,
}

impl Transform {
    pub fn new() -> Self {
        Self {
            position: cgmath::Vector3::new(0.0, 0.0, 0.0),
            rotation: cgmath::Quaternion::one(),
            scale: 1.0,
        }
    }

    /// Rotation about the vertical axis, replacing any previous rotation.
    pub fn set_yaw(&mut self, angle: Rad<f32>) {
        self.rotation = cgmath::Quaternion::from(cgmath::Euler {
            x: Rad(0.0),
            y: angle,
            z: Rad(0.0),
        });
    }

    pub fn to_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * Matrix4::from(self.rotation)
            * Matrix4::from_scale(self.scale)
    }

    pub fn to_raw(&self) -> TransformRaw {
        TransformRaw {
            model: self.to_matrix().into(),
            // Uniform scale keeps the normal matrix a plain rotation.
            normal: Matrix3::from(self.rotation).into(),
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

/// The packed transform as stored in the instance vertex buffer.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TransformRaw {
    model: [[f32; 4]; 4],
    normal: [[f32; 3]; 3],
}

impl crate::data_structures::mesh::Vertex for TransformRaw {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<TransformRaw>() as wgpu::BufferAddress,
            // Advance once per drawn instance, not per vertex.
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                // mat4 occupies four vec4 slots.
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
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 7,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 12]>() as wgpu::BufferAddress,
                    shader_location: 8,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // mat3 as three vec3 slots for the normal matrix.
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 16]>() as wgpu::BufferAddress,
                    shader_location: 9,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 19]>() as wgpu::BufferAddress,
                    shader_location: 10,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 22]>() as wgpu::BufferAddress,
                    shader_location: 11,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Rad, Vector3, Vector4};
    use std::f32::consts::PI;

    #[test]
    fn identity_transform_maps_points_to_themselves() {
        let transform = Transform::new();
        let p = transform.to_matrix() * Vector4::new(1.0, 2.0, 3.0, 1.0);
        assert!((p.x - 1.0).abs() < 1e-6);
        assert!((p.y - 2.0).abs() < 1e-6);
        assert!((p.z - 3.0).abs() < 1e-6);
    }

    #[test]
    fn yaw_rotates_about_the_vertical_axis() {
        let mut transform = Transform::new();
        transform.set_yaw(Rad(PI / 2.0));
        let p = transform.to_matrix() * Vector4::new(1.0, 0.0, 0.0, 1.0);
        // +x turns towards -z under a quarter turn.
        assert!(p.x.abs() < 1e-5);
        assert!((p.z + 1.0).abs() < 1e-5);
        assert!(p.y.abs() < 1e-5);
    }

    #[test]
    fn translation_lands_in_the_last_column() {
        let mut transform = Transform::new();
        transform.position = Vector3::new(0.0, 0.5, 0.0);
        let m = transform.to_matrix();
        assert_eq!(m.w.y, 0.5);
    }
}
