//! stipple
//!
//! An interactive viewer that loads a glTF model and shows it twice: as a
//! textured solid and as a particle cloud sampled over its surface. Both
//! renditions share one transform and react to the pointer through a light
//! that trails the cursor.
//!
//! High-level modules
//! - `camera`: camera, projection and their GPU uniform
//! - `context`: central GPU and window context that owns device/queue/pipelines
//! - `data_structures`: meshes, transforms, textures, particle clouds
//! - `pipelines`: the mesh, particle and light-marker render pipelines
//! - `resources`: asset loading (glTF parsing, texture decoding)
//! - `sampling`: area-weighted surface sampling
//! - `scene`: presentation objects and their per-frame animation
//! - `tween`: input smoothing
//! - `viewer`: the winit application and render loop

pub mod camera;
pub mod context;
pub mod data_structures;
pub mod pipelines;
pub mod resources;
pub mod sampling;
pub mod scene;
pub mod tween;
pub mod viewer;

pub use viewer::{Settings, run};
