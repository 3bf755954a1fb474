use cgmath::{Angle, Rad};

use crate::pipelines::basic::mk_render_pipeline;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct RgbShiftUniform {
    pub offset: [f32; 2],
    // Uniforms require 16 byte alignment
    pub _padding: [f32; 2],
}

impl RgbShiftUniform {
    /// `amount` is in UV units. The y component is flipped because texture
    /// coordinates grow downwards while the angle is measured counter-clockwise.
    pub fn new(amount: f32, angle: Rad<f32>) -> Self {
        Self {
            offset: [amount * angle.cos(), -amount * angle.sin()],
            _padding: [0.0; 2],
        }
    }
}

pub fn rgb_shift_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
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
        label: Some("rgb_shift_bind_group_layout"),
    })
}

pub fn mk_rgb_shift_pipeline(
    device: &wgpu::Device,
    output_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("RGB Shift Pipeline Layout"),
        bind_group_layouts: &[&rgb_shift_layout(device)],
        push_constant_ranges: &[],
    });
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("RGB Shift Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("rgb_shift.wgsl").into()),
    };
    mk_render_pipeline(
        device,
        &layout,
        output_format,
        Some(wgpu::BlendState::REPLACE),
        None,
        &[],
        shader,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_angle_shifts_horizontally() {
        let uniform = RgbShiftUniform::new(0.0015, Rad(0.0));
        assert_eq!(uniform.offset, [0.0015, 0.0]);
    }

    #[test]
    fn zero_amount_disables_the_effect() {
        let uniform = RgbShiftUniform::new(0.0, Rad(1.0));
        assert_eq!(uniform.offset[0], 0.0);
        assert_eq!(uniform.offset[1].abs(), 0.0);
    }
}
