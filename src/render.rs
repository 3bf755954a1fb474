//! The per-frame pass chain.
//!
//! A frame is two passes recorded into one command encoder:
//!
//! 1. the scene pass rasterizes the model into an intermediate colour target
//!    (with its own depth buffer), both sized to the viewport
//! 2. the RGB shift pass samples that target and writes the visible surface;
//!    it is the terminal pass
//!
//! Presenting the surface texture is left to the caller (see
//! [`crate::context::Context::render`]) so the same chain can draw into an
//! offscreen texture.

use anyhow::ensure;
use wgpu::util::DeviceExt;

use crate::{
    camera::{Camera, CameraResources, Projection},
    config::ViewerConfig,
    data_structures::{model::DrawModel, scene::Scene, texture::Texture},
    pipelines::{
        basic::mk_scene_pipeline,
        rgb_shift::{RgbShiftUniform, mk_rgb_shift_pipeline, rgb_shift_layout},
    },
    resources::environment::EnvironmentMap,
};

/// Where a pass writes its output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassTarget {
    /// A texture sized to the viewport that the next pass samples.
    Intermediate,
    /// The visible surface.
    Surface,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PassDesc {
    pub label: &'static str,
    pub target: PassTarget,
}

/// The passes every frame runs, in order.
pub const PASS_CHAIN: [PassDesc; 2] = [
    PassDesc {
        label: "scene",
        target: PassTarget::Intermediate,
    },
    PassDesc {
        label: "rgb shift",
        target: PassTarget::Surface,
    },
];

/// A chain is valid when exactly one pass is terminal and it runs last.
pub fn validate_chain(chain: &[PassDesc]) -> anyhow::Result<()> {
    let terminal = chain
        .iter()
        .filter(|pass| pass.target == PassTarget::Surface)
        .count();
    ensure!(terminal == 1, "expected exactly one terminal pass, found {terminal}");
    ensure!(
        chain.last().map(|pass| pass.target) == Some(PassTarget::Surface),
        "the terminal pass must run last"
    );
    Ok(())
}

#[derive(Debug)]
struct ScenePass {
    pipeline: wgpu::RenderPipeline,
    color: Texture,
    depth: Texture,
    clear_colour: wgpu::Color,
}

impl ScenePass {
    fn new(device: &wgpu::Device, size: [u32; 2], clear_colour: wgpu::Color) -> Self {
        Self {
            pipeline: mk_scene_pipeline(device, Texture::COLOR_TARGET_FORMAT),
            color: Texture::create_color_target(device, size, "scene color target"),
            depth: Texture::create_depth_texture(device, size, "scene depth texture"),
            clear_colour,
        }
    }

    fn resize(&mut self, device: &wgpu::Device, size: [u32; 2]) {
        self.color = Texture::create_color_target(device, size, "scene color target");
        self.depth = Texture::create_depth_texture(device, size, "scene depth texture");
    }

    fn encode(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        camera: &CameraResources,
        scene: &Scene,
        neutral_environment: &EnvironmentMap,
    ) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.color.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.clear_colour),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        // Nothing to draw until the model arrives; the clear colour still
        // flows through the rest of the chain.
        let Some(node) = scene.model() else {
            return;
        };
        let environment = scene.environment().unwrap_or(neutral_environment);

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &camera.bind_group, &[]);
        render_pass.set_bind_group(3, &environment.bind_group, &[]);
        render_pass.draw_model(&node.model);
    }
}

#[derive(Debug)]
struct RgbShiftPass {
    pipeline: wgpu::RenderPipeline,
    layout: wgpu::BindGroupLayout,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl RgbShiftPass {
    fn new(
        device: &wgpu::Device,
        input: &Texture,
        output_format: wgpu::TextureFormat,
        uniform: RgbShiftUniform,
    ) -> Self {
        let layout = rgb_shift_layout(device);
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("RGB Shift Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = Self::bind(device, &layout, input, &buffer);
        Self {
            pipeline: mk_rgb_shift_pipeline(device, output_format),
            layout,
            buffer,
            bind_group,
        }
    }

    fn bind(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        input: &Texture,
        buffer: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        let default_sampler;
        let sampler = match &input.sampler {
            Some(sampler) => sampler,
            None => {
                default_sampler = device.create_sampler(&wgpu::SamplerDescriptor::default());
                &default_sampler
            }
        };
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&input.view),
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
            label: Some("rgb_shift_bind_group"),
        })
    }

    /// The input texture is recreated on every resize, so the bind group
    /// sampling it has to follow.
    fn rebind(&mut self, device: &wgpu::Device, input: &Texture) {
        self.bind_group = Self::bind(device, &self.layout, input, &self.buffer);
    }

    fn encode(&self, encoder: &mut wgpu::CommandEncoder, target: &wgpu::TextureView) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("RGB Shift Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.bind_group, &[]);
        render_pass.draw(0..3, 0..1);
    }
}

/// Owns every GPU resource a frame needs besides the scene's own assets.
#[derive(Debug)]
pub struct RenderChain {
    device: wgpu::Device,
    queue: wgpu::Queue,
    camera: CameraResources,
    scene_pass: ScenePass,
    rgb_shift: RgbShiftPass,
    neutral_environment: EnvironmentMap,
    size: [u32; 2],
}

impl RenderChain {
    /// The terminal pass writes textures of `config.format`; intermediate
    /// targets start at `config.width x config.height`.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        config: &wgpu::SurfaceConfiguration,
        viewer: &ViewerConfig,
    ) -> anyhow::Result<Self> {
        validate_chain(&PASS_CHAIN)?;
        let size = [config.width.max(1), config.height.max(1)];

        let camera = CameraResources::new(
            device,
            Camera::new(viewer.camera_position),
            Projection::new(size[0], size[1], viewer.fovy, viewer.znear, viewer.zfar),
        );
        let scene_pass = ScenePass::new(device, size, viewer.clear_colour);
        let rgb_shift = RgbShiftPass::new(
            device,
            &scene_pass.color,
            config.format,
            RgbShiftUniform::new(viewer.rgb_shift_amount, viewer.rgb_shift_angle),
        );
        let neutral_environment = EnvironmentMap::neutral(device, queue)?;

        Ok(Self {
            device: device.clone(),
            queue: queue.clone(),
            camera,
            scene_pass,
            rgb_shift,
            neutral_environment,
            size,
        })
    }

    /// Reallocates every intermediate target and updates the camera's aspect
    /// ratio. Zero sized viewports (minimized windows) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.size = [width, height];
        self.camera.projection.resize(width, height);
        self.scene_pass.resize(&self.device, self.size);
        self.rgb_shift.rebind(&self.device, &self.scene_pass.color);
    }

    /// Runs the whole chain, the terminal pass drawing into `target`.
    ///
    /// Missing assets are not an error: without a model the frame shows the
    /// clear colour, without an environment the neutral map is bound.
    pub fn render_frame(&mut self, scene: &Scene, target: &wgpu::TextureView) {
        self.camera.write_to_buffer(&self.queue);
        if let Some(node) = scene.model() {
            node.model.write_transform(&self.queue, node.tilt);
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        self.scene_pass
            .encode(&mut encoder, &self.camera, scene, &self.neutral_environment);
        self.rgb_shift.encode(&mut encoder, target);
        self.queue.submit(std::iter::once(encoder.finish()));
    }

    pub fn chain(&self) -> &'static [PassDesc] {
        &PASS_CHAIN
    }

    /// Dimensions of every intermediate target, in pass order.
    pub fn intermediate_sizes(&self) -> Vec<[u32; 2]> {
        vec![self.scene_pass.color.size(), self.scene_pass.depth.size()]
    }

    pub fn size(&self) -> [u32; 2] {
        self.size
    }

    pub fn projection(&self) -> &Projection {
        &self.camera.projection
    }

    pub fn set_clear_colour(&mut self, colour: wgpu::Color) {
        self.scene_pass.clear_colour = colour;
    }

    /// Updates the effect parameters without rebuilding anything.
    pub fn set_rgb_shift(&self, uniform: RgbShiftUniform) {
        self.queue
            .write_buffer(&self.rgb_shift.buffer, 0, bytemuck::cast_slice(&[uniform]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_chain_is_valid() {
        assert!(validate_chain(&PASS_CHAIN).is_ok());
        assert_eq!(PASS_CHAIN.last().map(|pass| pass.target), Some(PassTarget::Surface));
    }

    #[test]
    fn rejects_chains_without_terminal_pass() {
        let chain = [PassDesc {
            label: "scene",
            target: PassTarget::Intermediate,
        }];
        assert!(validate_chain(&chain).is_err());
    }

    #[test]
    fn rejects_terminal_pass_in_the_middle() {
        let chain = [
            PassDesc {
                label: "rgb shift",
                target: PassTarget::Surface,
            },
            PassDesc {
                label: "scene",
                target: PassTarget::Intermediate,
            },
        ];
        assert!(validate_chain(&chain).is_err());
    }

    #[test]
    fn rejects_two_terminal_passes() {
        let pass = PassDesc {
            label: "rgb shift",
            target: PassTarget::Surface,
        };
        assert!(validate_chain(&[pass, pass]).is_err());
    }
}
