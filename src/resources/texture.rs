use anyhow::Context;

use crate::data_structures::texture;

/// Joins `file_name` onto `root` with a forward slash, which works for both
/// file system paths and URLs.
pub fn asset_path(root: &str, file_name: &str) -> String {
    if root.is_empty() {
        return file_name.to_string();
    }
    format!("{}/{}", root.trim_end_matches('/'), file_name.trim_start_matches('/'))
}

/// Directory part of an asset path, used to resolve URIs inside a glTF file.
pub fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> anyhow::Result<reqwest::Url> {
    let window = web_sys::window().context("no window")?;
    let origin = window
        .location()
        .origin()
        .map_err(|_| anyhow::anyhow!("page has no origin"))?;
    let base = reqwest::Url::parse(&format!("{}/", origin))?;
    Ok(base.join(file_name)?)
}

pub async fn load_binary(path: &str) -> anyhow::Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(path)?;
        let response = reqwest::get(url).await?.error_for_status()?;
        response.bytes().await?.to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("could not read {path}"))?;

    Ok(data)
}

pub async fn load_texture(
    path: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    format: Option<&str>,
) -> anyhow::Result<texture::Texture> {
    let data = load_binary(path).await?;
    texture::Texture::from_bytes(device, queue, &data, path, format)
}

/// Maps a mime type such as `image/png` to the extension the `image` crate
/// understands.
pub fn extension_from_mime(mime_type: &str) -> Option<&str> {
    mime_type.split('/').next_back()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_asset_paths() {
        assert_eq!(asset_path("assets", "model.glb"), "assets/model.glb");
        assert_eq!(asset_path("assets/", "/model.glb"), "assets/model.glb");
        assert_eq!(asset_path("", "model.glb"), "model.glb");
    }

    #[test]
    fn resolves_parent_dir() {
        assert_eq!(parent_dir("assets/helmet/scene.gltf"), "assets/helmet");
        assert_eq!(parent_dir("scene.gltf"), "");
    }

    #[test]
    fn strips_mime_prefix() {
        assert_eq!(extension_from_mime("image/png"), Some("png"));
        assert_eq!(extension_from_mime("image/jpeg"), Some("jpeg"));
    }
}
