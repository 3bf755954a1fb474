//! The frame driver and application event loop.
//!
//! [`Viewer`] owns the winit event loop. Once the window exists it creates the
//! GPU [`Context`], starts both asset loads in the background and renders
//! continuously: every `RedrawRequested` advances the tilt tween, draws a frame
//! and asks for the next one. The scene starts empty and fills in as the loads
//! report back through [`ViewerEvent::Loaded`].
//!
//! # Lifecycle
//!
//! 1. `resumed`: window, GPU context and pass chain are created, loads spawned
//! 2. `user_event`: finished loads are applied to the scene on this thread
//! 3. `window_event`: pointer, resize and redraw handling
//! 4. `CloseRequested` or [`ShutdownHandle::shutdown`] ends the loop

use std::{fmt::Debug, sync::Arc};

use instant::Instant;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    window::Window,
};

use crate::{
    config::ViewerConfig,
    context::Context,
    data_structures::{
        model::Model,
        scene::{LoadOutcome, Phase, Scene},
    },
    interaction::{InteractionController, Pointer},
    resources::{self, environment::EnvironmentMap, texture::asset_path},
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Events posted to the event loop from outside the window system.
pub enum ViewerEvent {
    /// The GPU context finished initializing. Only posted on the web, where
    /// setup cannot block the event loop.
    #[doc(hidden)]
    Initialized(Box<Context>),
    /// GPU setup failed on the web. Ends the loop like a native setup error.
    #[doc(hidden)]
    SetupFailed(anyhow::Error),
    /// One asset load finished, successfully or not.
    Loaded(LoadOutcome<Model, EnvironmentMap>),
    Exit,
}

impl Debug for ViewerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialized(_) => f.write_str("Initialized"),
            Self::SetupFailed(e) => f.debug_tuple("SetupFailed").field(&format!("{e:#}")).finish(),
            Self::Loaded(Ok(loaded)) => f.debug_tuple("Loaded").field(&loaded.kind()).finish(),
            Self::Loaded(Err(e)) => f.debug_tuple("Loaded").field(&e.to_string()).finish(),
            Self::Exit => f.write_str("Exit"),
        }
    }
}

/// Ends a running [`Viewer`] from anywhere, including other threads.
#[derive(Clone)]
pub struct ShutdownHandle {
    proxy: EventLoopProxy<ViewerEvent>,
}

impl ShutdownHandle {
    /// Asks the event loop to exit after the current event. Does nothing if
    /// the loop already stopped.
    pub fn shutdown(&self) {
        if self.proxy.send_event(ViewerEvent::Exit).is_err() {
            log::debug!("shutdown requested after the event loop closed");
        }
    }
}

impl Debug for ShutdownHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ShutdownHandle")
    }
}

pub struct Viewer {
    event_loop: EventLoop<ViewerEvent>,
    config: ViewerConfig,
}

impl Viewer {
    pub fn new(config: ViewerConfig) -> anyhow::Result<Self> {
        init_logger();
        let event_loop = EventLoop::with_user_event().build()?;
        Ok(Self { event_loop, config })
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            proxy: self.event_loop.create_proxy(),
        }
    }

    /// Blocks until the window closes or a shutdown is requested. Errors
    /// during window or GPU setup end the loop and are returned here.
    pub fn run(self) -> anyhow::Result<()> {
        let mut app = App::new(&self.event_loop, self.config)?;
        self.event_loop.run_app(&mut app)?;
        match app.setup_error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Builds a [`Viewer`] for `config` and runs it to completion.
pub fn run(config: ViewerConfig) -> anyhow::Result<()> {
    Viewer::new(config)?.run()
}

fn init_logger() {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            eprintln!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::warn_1(&format!("Could not initialize logger: {e}").into());
        }
    }
}

struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    proxy: EventLoopProxy<ViewerEvent>,
    config: ViewerConfig,
    ctx: Option<Context>,
    scene: Scene,
    controller: InteractionController,
    last_time: Instant,
    setup_error: Option<anyhow::Error>,
}

impl App {
    fn new(event_loop: &EventLoop<ViewerEvent>, config: ViewerConfig) -> anyhow::Result<Self> {
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime: tokio::runtime::Runtime::new()?,
            proxy: event_loop.create_proxy(),
            controller: InteractionController::from_config(&config),
            config,
            ctx: None,
            scene: Scene::new(),
            last_time: Instant::now(),
            setup_error: None,
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, e: anyhow::Error) {
        log::error!("viewer setup failed: {e:#}");
        self.setup_error = Some(e);
        event_loop.exit();
    }

    fn on_context_ready(&mut self, mut ctx: Context) {
        let size = ctx.window().inner_size();
        ctx.resize(size.width, size.height);
        self.spawn_loads(&ctx);
        self.last_time = Instant::now();
        ctx.window().request_redraw();
        self.ctx = Some(ctx);
    }

    /// Each load runs to completion in the background and posts its single
    /// outcome back to the event loop.
    fn spawn_loads(&self, ctx: &Context) {
        let model_path = asset_path(&self.config.asset_root, &self.config.model_path);
        let environment_path = asset_path(&self.config.asset_root, &self.config.environment_path);
        log::info!("loading {model_path} and {environment_path}");

        let proxy = self.proxy.clone();
        let (device, queue) = (ctx.device.clone(), ctx.queue.clone());
        self.spawn(async move {
            let outcome = resources::load_model(&model_path, &device, &queue).await;
            post_outcome(&proxy, outcome);
        });

        let proxy = self.proxy.clone();
        let (device, queue) = (ctx.device.clone(), ctx.queue.clone());
        let intensity = self.config.environment_intensity;
        self.spawn(async move {
            let outcome =
                resources::load_environment_map(&environment_path, intensity, &device, &queue).await;
            post_outcome(&proxy, outcome);
        });
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn spawn(&self, fut: impl Future<Output = ()> + Send + 'static) {
        self.async_runtime.spawn(fut);
    }

    #[cfg(target_arch = "wasm32")]
    fn spawn(&self, fut: impl Future<Output = ()> + 'static) {
        wasm_bindgen_futures::spawn_local(fut);
    }
}

fn post_outcome(proxy: &EventLoopProxy<ViewerEvent>, outcome: LoadOutcome<Model, EnvironmentMap>) {
    if proxy.send_event(ViewerEvent::Loaded(outcome)).is_err() {
        log::warn!("event loop closed before an asset load finished");
    }
}

impl ApplicationHandler<ViewerEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.ctx.is_some() {
            return;
        }

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title(&self.config.title);

        #[cfg(target_arch = "wasm32")]
        {
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let canvas = web_sys::window()
                .and_then(|window| window.document())
                .and_then(|document| document.get_element_by_id(CANVAS_ID));
            match canvas {
                Some(canvas) => {
                    window_attributes = window_attributes.with_canvas(Some(canvas.unchecked_into()));
                }
                None => log::warn!("no #{CANVAS_ID} element, winit will create its own canvas"),
            }
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, e.into()),
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            match self.async_runtime.block_on(Context::new(window, &self.config)) {
                Ok(ctx) => self.on_context_ready(ctx),
                Err(e) => self.fail(event_loop, e),
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            let config = self.config.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match Context::new(window, &config).await {
                    Ok(ctx) => {
                        if proxy.send_event(ViewerEvent::Initialized(Box::new(ctx))).is_err() {
                            log::warn!("event loop closed during setup");
                        }
                    }
                    Err(e) => {
                        if let Err(closed) = proxy.send_event(ViewerEvent::SetupFailed(e)) {
                            log::error!("viewer setup failed after the event loop closed: {:?}", closed.0);
                        }
                    }
                }
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: ViewerEvent) {
        match event {
            ViewerEvent::Initialized(ctx) => self.on_context_ready(*ctx),
            ViewerEvent::Loaded(outcome) => {
                if self.scene.apply(outcome) == Phase::Ready {
                    log::debug!("all assets loaded");
                }
            }
            ViewerEvent::SetupFailed(e) => self.fail(event_loop, e),
            ViewerEvent::Exit => event_loop.exit(),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        // The window can be closed while the web setup is still running.
        if closes_window(&event) {
            event_loop.exit();
            return;
        }
        let Some(ctx) = &mut self.ctx else {
            return;
        };

        match event {
            WindowEvent::Resized(size) => ctx.resize(size.width, size.height),
            WindowEvent::CursorMoved { position, .. } => {
                if let Some(pointer) = Pointer::from_physical(position, ctx.window().inner_size()) {
                    self.controller.on_pointer_move(pointer, self.scene.model());
                }
            }
            WindowEvent::RedrawRequested => {
                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();
                self.controller.update(dt, self.scene.model_mut());

                match ctx.render(&self.scene) {
                    Ok(()) => {}
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = ctx.window().inner_size();
                        ctx.resize(size.width, size.height);
                    }
                    Err(e) => {
                        log::error!("Unable to render {}", e);
                    }
                }
                ctx.window().request_redraw();
            }
            _ => {}
        }
    }
}

fn closes_window(event: &WindowEvent) -> bool {
    matches!(event, WindowEvent::CloseRequested | WindowEvent::Destroyed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_is_handled_without_a_context() {
        assert!(closes_window(&WindowEvent::CloseRequested));
        assert!(closes_window(&WindowEvent::Destroyed));
        assert!(!closes_window(&WindowEvent::RedrawRequested));
        assert!(!closes_window(&WindowEvent::Focused(true)));
    }

    #[test]
    fn setup_failure_carries_its_cause() {
        let event = ViewerEvent::SetupFailed(
            anyhow::anyhow!("no adapter").context("could not create a device"),
        );
        let printed = format!("{event:?}");
        assert!(printed.starts_with("SetupFailed"));
        assert!(printed.contains("could not create a device"));
        assert!(printed.contains("no adapter"));
    }
}
