use std::sync::Arc;

use anyhow::Context as _;
use winit::window::Window;

use crate::{config::ViewerConfig, data_structures::scene::Scene, render::RenderChain};

/// The GPU side of the viewer: the window surface, device and queue, and the
/// pass chain that draws into the surface.
#[derive(Debug)]
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub chain: RenderChain,
    is_surface_configured: bool,
}

impl Context {
    pub async fn new(window: Arc<Window>, viewer: &ViewerConfig) -> anyhow::Result<Self> {
        let size = window.inner_size();

        log::info!("WGPU setup");
        let instance = wgpu::Instance::new(&instance_descriptor());
        let surface = instance
            .create_surface(window.clone())
            .context("could not create a surface for the window")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no graphics adapter is compatible with the window surface")?;
        let (device, queue) = request_device(&adapter).await?;

        let surface_caps = surface.get_capabilities(&adapter);
        // The scene shader writes linear colour and relies on an sRGB target
        // for the conversion.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("the surface reports no supported formats")?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: surface_caps
                .present_modes
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::Fifo),
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        log::info!("surface format {surface_format:?}");

        let chain = RenderChain::new(&device, &queue, &config, viewer)?;

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            chain,
            is_surface_configured: false,
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn is_surface_configured(&self) -> bool {
        self.is_surface_configured
    }

    /// Reconfigures the surface and everything sized to it. A zero sized
    /// window leaves the surface unconfigured and frames are skipped.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
            self.is_surface_configured = true;
            self.chain.resize(width, height);
        }
    }

    /// Draws one frame of `scene` into the surface and presents it.
    pub fn render(&mut self, scene: &Scene) -> Result<(), wgpu::SurfaceError> {
        if !self.is_surface_configured {
            return Ok(());
        }

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.chain.render_frame(scene, &view);
        self.window.pre_present_notify();
        output.present();
        Ok(())
    }
}

fn instance_descriptor() -> wgpu::InstanceDescriptor {
    wgpu::InstanceDescriptor {
        #[cfg(not(target_arch = "wasm32"))]
        backends: wgpu::Backends::PRIMARY,
        #[cfg(target_arch = "wasm32")]
        backends: wgpu::Backends::GL,
        ..Default::default()
    }
}

async fn request_device(adapter: &wgpu::Adapter) -> anyhow::Result<(wgpu::Device, wgpu::Queue)> {
    adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: None,
            required_features: wgpu::Features::empty(),
            // WebGL doesn't support all of wgpu's features, so if
            // we're building for the web we'll have to disable some.
            required_limits: if cfg!(target_arch = "wasm32") {
                wgpu::Limits::downlevel_webgl2_defaults()
            } else {
                wgpu::Limits::default()
            },
            memory_hints: Default::default(),
            experimental_features: Default::default(),
            trace: wgpu::Trace::Off,
        })
        .await
        .context("could not create a device")
}

/// A device and queue without a window, for offscreen rendering.
pub async fn request_headless_device() -> anyhow::Result<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::new(&instance_descriptor());
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: None,
            force_fallback_adapter: false,
        })
        .await
        .context("no graphics adapter available")?;
    request_device(&adapter).await
}
