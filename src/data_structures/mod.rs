//! Scene data: meshes, textures, transforms, and particle clouds.
//!
//! - `mesh` holds parsed triangle data and its GPU upload
//! - `texture` wraps wgpu textures for depth and colour maps
//! - `instance` packs per-object transforms for instanced drawing
//! - `particle` builds the surface-sampled particle rendition

pub mod instance;
pub mod mesh;
pub mod particle;
pub mod texture;
