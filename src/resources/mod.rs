//! Loading of external assets: raw files, textures, and glTF models.

use std::path::PathBuf;

pub mod gltf;
pub mod texture;

/// Resolve a file name against the bundled asset directory.
///
/// Assets are copied next to the binary by build.rs; running from the
/// crate root finds the same `assets/` tree.
pub fn asset_path(file_name: &str) -> PathBuf {
    PathBuf::from("./").join("assets").join(file_name)
}

pub async fn load_binary(file_name: &str) -> anyhow::Result<Vec<u8>> {
    let path = asset_path(file_name);
    let data = tokio::fs::read(&path).await.map_err(|e| {
        anyhow::anyhow!("failed to read asset {}: {}", path.display(), e)
    })?;
    Ok(data)
}
