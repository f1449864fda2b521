//! glTF parsing into CPU-side mesh data.
//!
//! Parsing is split from GPU upload so the extraction logic can be tested
//! against in-memory files. The loader walks the default scene and bakes
//! node transforms into the vertex data, which keeps the sampler and the
//! render path agnostic of the source file's hierarchy.

use std::io::{BufReader, Cursor};

use anyhow::{Result, anyhow, bail};
use cgmath::{InnerSpace, Matrix as _, Matrix3, Matrix4, SquareMatrix, Transform as _, Vector3};
use gltf::Gltf;

use crate::data_structures::mesh::MeshData;
use crate::resources::load_binary;

const DRACO_EXTENSION: &str = "KHR_draco_mesh_compression";

/// Load a glTF/GLB file from the asset directory and parse its meshes.
pub async fn load_mesh_data(file_name: &str) -> Result<Vec<MeshData>> {
    let bytes = load_binary(file_name).await?;
    let gltf_cursor = Cursor::new(bytes);
    let gltf_reader = BufReader::new(gltf_cursor);
    let gltf = Gltf::from_reader(gltf_reader)?;

    let mut buffer_data = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => {
                let blob = gltf
                    .blob
                    .as_deref()
                    .ok_or_else(|| anyhow!("{file_name} references a missing binary chunk"))?;
                buffer_data.push(blob.to_vec());
            }
            gltf::buffer::Source::Uri(uri) => {
                let bin = load_binary(uri).await?;
                buffer_data.push(bin);
            }
        }
    }

    parse_document(&gltf, &buffer_data)
}

/// Parse a self-contained GLB (binary chunk embedded, no external URIs).
pub fn parse_glb(bytes: &[u8]) -> Result<Vec<MeshData>> {
    let gltf = Gltf::from_slice(bytes)?;
    let mut buffer_data = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => {
                let blob = gltf
                    .blob
                    .as_deref()
                    .ok_or_else(|| anyhow!("GLB references a missing binary chunk"))?;
                buffer_data.push(blob.to_vec());
            }
            gltf::buffer::Source::Uri(uri) => {
                bail!("GLB unexpectedly references an external buffer: {uri}")
            }
        }
    }
    parse_document(&gltf, &buffer_data)
}

/// Extract every mesh reachable from the default scene.
pub fn parse_document(gltf: &Gltf, buffers: &[Vec<u8>]) -> Result<Vec<MeshData>> {
    if gltf
        .document
        .extensions_required()
        .any(|ext| ext == DRACO_EXTENSION)
    {
        bail!(
            "this model requires {DRACO_EXTENSION}, which is not supported; \
             re-export the asset without Draco compression"
        );
    }

    let scene = gltf
        .document
        .default_scene()
        .or_else(|| gltf.document.scenes().next())
        .ok_or_else(|| anyhow!("glTF file contains no scene"))?;

    let mut meshes = Vec::new();
    for node in scene.nodes() {
        collect_meshes(node, Matrix4::identity(), buffers, &mut meshes)?;
    }
    if meshes.is_empty() {
        bail!("glTF scene contains no mesh primitives");
    }
    Ok(meshes)
}

fn collect_meshes(
    node: gltf::Node,
    parent: Matrix4<f32>,
    buffers: &[Vec<u8>],
    out: &mut Vec<MeshData>,
) -> Result<()> {
    let local: Matrix4<f32> = node.transform().matrix().into();
    let world = parent * local;

    if let Some(mesh) = node.mesh() {
        let name = mesh
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("mesh_{}", mesh.index()));
        for primitive in mesh.primitives() {
            out.push(parse_primitive(&name, &primitive, buffers, &world)?);
        }
    }
    for child in node.children() {
        collect_meshes(child, world, buffers, out)?;
    }
    Ok(())
}

fn parse_primitive(
    name: &str,
    primitive: &gltf::Primitive,
    buffers: &[Vec<u8>],
    world: &Matrix4<f32>,
) -> Result<MeshData> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));

    let positions = reader
        .read_positions()
        .ok_or_else(|| anyhow!("primitive of {name} has no positions"))?;
    // Bake the node transform so downstream code sees model space.
    let positions: Vec<[f32; 3]> = positions
        .map(|p| {
            let p = world.transform_point(cgmath::Point3::from(p));
            [p.x, p.y, p.z]
        })
        .collect();

    let normal_matrix = normal_matrix(world);
    let normals: Vec<[f32; 3]> = reader
        .read_normals()
        .map(|iter| {
            iter.map(|n| {
                let n = normal_matrix * Vector3::from(n);
                if n.magnitude2() > 0.0 {
                    n.normalize().into()
                } else {
                    [0.0, 1.0, 0.0]
                }
            })
            .collect()
        })
        .unwrap_or_default();

    let tex_coords: Vec<[f32; 2]> = reader
        .read_tex_coords(0)
        .map(|tc| tc.into_f32().collect())
        .unwrap_or_default();

    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        // Non-indexed geometry: triangles in vertex order.
        None => (0..positions.len() as u32).collect(),
    };

    let mut data = MeshData {
        name: name.to_string(),
        positions,
        normals,
        tex_coords,
        indices,
    };
    data.ensure_normals();
    Ok(data)
}

fn normal_matrix(world: &Matrix4<f32>) -> Matrix3<f32> {
    let linear = Matrix3::new(
        world.x.x, world.x.y, world.x.z,
        world.y.x, world.y.y, world.y.z,
        world.z.x, world.z.y, world.z.z,
    );
    match linear.invert() {
        Some(inv) => inv.transpose(),
        // Singular transform: fall back to the linear part.
        None => linear,
    }
}
