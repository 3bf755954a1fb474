use std::fmt;

use anyhow::Context;

use crate::{
    data_structures::{
        model::{self, Material, MaterialUniform, material_layout},
        scene::{Loaded, LoadOutcome},
        texture::Texture,
    },
    resources::{
        environment::{EnvironmentMap, load_environment},
        texture::{extension_from_mime, load_binary, parent_dir},
    },
};

/**
 * This module contains all logic for loading the model and the environment
 * map from external files.
 */
pub mod environment;
pub mod mesh;
pub mod texture;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Model,
    Environment,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Model => f.write_str("model"),
            AssetKind::Environment => f.write_str("environment map"),
        }
    }
}

/// A failed asset load. Never fatal: the scene renders without the asset.
#[derive(Debug, thiserror::Error)]
#[error("failed to load {kind} from {path}")]
pub struct LoadError {
    pub kind: AssetKind,
    pub path: String,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync + 'static>,
}

impl LoadError {
    pub fn new(kind: AssetKind, path: impl Into<String>, source: anyhow::Error) -> Self {
        Self {
            kind,
            path: path.into(),
            source: source.into(),
        }
    }
}

/// Loads the model at `path` into a scene load outcome.
pub async fn load_model(
    path: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> LoadOutcome<model::Model, EnvironmentMap> {
    load_model_gltf(path, device, queue)
        .await
        .map(Loaded::Model)
        .map_err(|e| LoadError::new(AssetKind::Model, path, e))
}

/// Loads the environment panorama at `path` into a scene load outcome.
pub async fn load_environment_map(
    path: &str,
    intensity: f32,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> LoadOutcome<model::Model, EnvironmentMap> {
    load_environment(path, intensity, device, queue)
        .await
        .map(Loaded::Environment)
        .map_err(|e| LoadError::new(AssetKind::Environment, path, e))
}

pub async fn load_model_gltf(
    path: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> anyhow::Result<model::Model> {
    let gltf_bytes = load_binary(path).await?;
    let gltf = gltf::Gltf::from_slice(&gltf_bytes)
        .with_context(|| format!("{path} is not a valid glTF file"))?;
    let base = parent_dir(path);

    // Load buffers
    let mut buffer_data = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => {
                let blob = gltf
                    .blob
                    .as_deref()
                    .context("glTF references a binary chunk but has none")?;
                buffer_data.push(blob.to_vec());
            }
            gltf::buffer::Source::Uri(uri) => {
                if uri.starts_with("data:") {
                    anyhow::bail!("embedded data URIs are not supported, export {path} as .glb");
                }
                let bin = load_binary(&texture::asset_path(base, uri)).await?;
                buffer_data.push(bin);
            }
        }
    }

    // Load materials
    let layout = material_layout(device);
    let mut materials = Vec::new();
    for material in gltf.materials() {
        let name = material.name().unwrap_or("material");
        let pbr = material.pbr_metallic_roughness();
        let base_color = match pbr.base_color_texture() {
            Some(info) => {
                let source = info.texture().source().source();
                match load_gltf_image(source, base, &buffer_data, device, queue).await {
                    Ok(texture) => texture,
                    Err(e) => {
                        log::warn!("base colour texture of {name} could not be loaded: {e:#}");
                        white(device, queue)
                    }
                }
            }
            None => white(device, queue),
        };
        let uniform = MaterialUniform {
            base_color_factor: pbr.base_color_factor(),
            metallic: pbr.metallic_factor(),
            roughness: pbr.roughness_factor(),
            ..Default::default()
        };
        materials.push(Material::new(device, name, base_color, uniform, &layout));
    }
    // Primitives without a material use the glTF default material
    let default_material = materials.len();
    materials.push(Material::new(
        device,
        "default material",
        white(device, queue),
        MaterialUniform::default(),
        &layout,
    ));

    let meshes = mesh::load_meshes(&gltf, &buffer_data, device, default_material);
    if meshes.is_empty() {
        log::warn!("{path} contains no drawable meshes");
    }
    log::info!(
        "loaded {path}: {} meshes, {} materials",
        meshes.len(),
        materials.len()
    );

    Ok(model::Model::new(device, meshes, materials))
}

async fn load_gltf_image(
    source: gltf::image::Source<'_>,
    base: &str,
    buffer_data: &[Vec<u8>],
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> anyhow::Result<Texture> {
    match source {
        gltf::image::Source::View { view, mime_type } => {
            let buffer = buffer_data
                .get(view.buffer().index())
                .context("image references a missing buffer")?;
            let bytes = buffer
                .get(view.offset()..view.offset() + view.length())
                .context("image buffer view is out of bounds")?;
            Texture::from_bytes(device, queue, bytes, "glTF image", extension_from_mime(mime_type))
        }
        gltf::image::Source::Uri { uri, mime_type } => {
            if uri.starts_with("data:") {
                anyhow::bail!("embedded data URIs are not supported");
            }
            texture::load_texture(
                &texture::asset_path(base, uri),
                device,
                queue,
                mime_type.and_then(extension_from_mime),
            )
            .await
        }
    }
}

fn white(device: &wgpu::Device, queue: &wgpu::Queue) -> Texture {
    Texture::create_solid([255, 255, 255, 255], "white", device, queue)
}
