//! Equirectangular HDR environment maps.
//!
//! The panorama lights and reflects on the model; it is never drawn as a
//! background. When no panorama is available the scene pass binds
//! [`EnvironmentMap::neutral`], whose `enabled` flag makes the shader fall back
//! to a flat ambient term.

use image::ImageFormat;
use wgpu::util::DeviceExt;

use crate::{data_structures::texture::Texture, resources::texture::load_binary};

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct EnvironmentUniform {
    pub intensity: f32,
    pub enabled: f32,
    // Uniforms require 16 byte alignment
    pub _padding: [f32; 2],
}

#[derive(Debug)]
pub struct EnvironmentMap {
    pub texture: Texture,
    pub uniform: EnvironmentUniform,
    pub bind_group: wgpu::BindGroup,
}

impl EnvironmentMap {
    pub fn new(device: &wgpu::Device, texture: Texture, intensity: f32, enabled: bool) -> Self {
        let uniform = EnvironmentUniform {
            intensity,
            enabled: if enabled { 1.0 } else { 0.0 },
            _padding: [0.0; 2],
        };
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Environment Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let fallback_sampler;
        let sampler = match &texture.sampler {
            Some(sampler) => sampler,
            None => {
                fallback_sampler = device.create_sampler(&wgpu::SamplerDescriptor::default());
                &fallback_sampler
            }
        };
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &environment_layout(device),
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: buffer.as_entire_binding(),
                },
            ],
            label: Some("environment_bind_group"),
        });

        Self {
            texture,
            uniform,
            bind_group,
        }
    }

    /// Placeholder bound while no panorama is loaded (or after it failed).
    pub fn neutral(device: &wgpu::Device, queue: &wgpu::Queue) -> anyhow::Result<Self> {
        let texture = Texture::create_solid_hdr([0.5, 0.5, 0.5, 1.0], "neutral environment", device, queue)?;
        Ok(Self::new(device, texture, 1.0, false))
    }

    pub fn is_enabled(&self) -> bool {
        self.uniform.enabled > 0.0
    }
}

pub fn environment_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    // Rgba32Float is only filterable behind an optional feature
                    sample_type: wgpu::TextureSampleType::Float { filterable: false },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::NonFiltering),
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
        ],
        label: Some("environment_bind_group_layout"),
    })
}

/// Decodes a Radiance `.hdr` panorama and uploads it.
pub async fn load_environment(
    path: &str,
    intensity: f32,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> anyhow::Result<EnvironmentMap> {
    let bytes = load_binary(path).await?;
    let img = image::load_from_memory_with_format(&bytes, ImageFormat::Hdr)?;
    log::info!("decoded environment {path} ({}x{})", img.width(), img.height());
    let texture = Texture::from_hdr_image(device, queue, &img, Some(path))?;
    Ok(EnvironmentMap::new(device, texture, intensity, true))
}
