//! Flow control and application event loop.
//!
//! A "flow" is a self-contained part of a scene: it is constructed
//! asynchronously (loading whatever it needs), initialized once against the
//! GPU context, updated every frame and asked every frame what it wants drawn.
//!
//! # Lifecycle Flow
//!
//! The event loop follows this pattern each frame:
//! 1. Render the flows' [`Render`] descriptions, reflective batch first, then unlit
//! 2. Step the physics world
//! 3. Call `on_update` on all flows
//! 4. Push the camera to the scene uniform
//! 5. Present frame

use std::{fmt::Debug, iter, pin::Pin, sync::Arc};

use instant::{Duration, Instant};
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

use crate::{
    context::{Context, InitContext},
    data_structures::texture::Texture,
    render::{self, Batches, Render},
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Trait for a self-contained, renderable part of a scene.
///
/// # Lifecycle
///
/// 1. `on_init()` is called once after every flow was constructed; acquire context resources here
/// 2. `on_update()` is called every frame
/// 3. `on_render()` is called each frame and specifies how to render `self`
/// 4. `on_exit()` is called once when the window closes
pub trait GraphicsFlow {
    /// Initialize the flow against the context.
    ///
    /// An error aborts the application and is returned from [`run`].
    fn on_init(&mut self, ctx: &mut Context) -> anyhow::Result<()>;

    /// Update state every frame with the elapsed time `dt`.
    fn on_update(&mut self, ctx: &Context, dt: Duration);

    /// Release whatever the flow registered with the context.
    fn on_exit(&mut self, _ctx: &mut Context) {}

    /// Return renderable objects for this flow.
    ///
    /// The engine batches all flows' renders per pipeline.
    fn on_render(&self) -> Render<'_>;
}

impl Debug for dyn GraphicsFlow + 'static {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("GraphicsFlow")
    }
}

/// Type alias for a flow constructor (factory function).
///
/// A flow constructor takes an `InitContext` and asynchronously returns a
/// boxed `GraphicsFlow`, or the error that kept it from being built.
pub type FlowConstructor = Box<
    dyn FnOnce(InitContext) -> Pin<Box<dyn Future<Output = anyhow::Result<Box<dyn GraphicsFlow>>>>>,
>;

/// GPU context plus surface status.
#[derive(Debug)]
pub struct AppState {
    pub(crate) ctx: Context,
    is_surface_configured: bool,
}

impl AppState {
    async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let ctx = Context::new(window).await?;
        Ok(Self {
            ctx,
            is_surface_configured: false,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.ctx.config.width = width;
            self.ctx.config.height = height;
            self.is_surface_configured = true;
            self.ctx.projection.resize(width, height);
            self.ctx
                .surface
                .configure(&self.ctx.device, &self.ctx.config);
            self.ctx.depth_texture = Texture::create_depth_texture(
                &self.ctx.device,
                [self.ctx.config.width, self.ctx.config.height],
                "depth_texture",
            );
            self.ctx.write_scene_uniform();
        }
    }

    fn render(&mut self, flows: &[Box<dyn GraphicsFlow>]) -> Result<(), wgpu::SurfaceError> {
        // invoke main render loop
        self.ctx.window.request_redraw();

        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        let output = self.ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.ctx.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            let mut batches = Batches::default();
            flows.iter().for_each(|flow| batches.push(flow.on_render()));

            render_pass.set_bind_group(0, &self.ctx.scene.bind_group, &[]);
            // Transparent overlays blend onto whatever reflective surface lies beneath them.
            render::draw_batches(&mut render_pass, &self.ctx.pipelines, &batches);
        }

        self.ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    fn update(&mut self, flows: &mut [Box<dyn GraphicsFlow>], dt: Duration) {
        if let Some(physics) = self.ctx.physics.as_mut() {
            physics.step(dt.as_secs_f32());
        }
        flows
            .iter_mut()
            .for_each(|flow| flow.on_update(&self.ctx, dt));
        self.ctx.write_scene_uniform();
    }
}

pub(crate) enum FlowEvent {
    #[allow(dead_code)]
    Initialized {
        state: AppState,
        flows: Vec<Box<dyn GraphicsFlow>>,
    },
    #[allow(dead_code)]
    Failed(anyhow::Error),
}

impl Debug for FlowEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialized { state: _, flows } => {
                f.debug_struct("Initialized").field("flows", flows).finish()
            }
            Self::Failed(err) => f.debug_tuple("Failed").field(err).finish(),
        }
    }
}

pub struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    #[allow(dead_code)]
    proxy: winit::event_loop::EventLoopProxy<FlowEvent>,
    state: Option<AppState>,
    graphics_flows: Vec<Box<dyn GraphicsFlow>>,
    constructors: Option<Vec<FlowConstructor>>,
    last_time: Instant,
    error: Option<anyhow::Error>,
}

impl App {
    fn new(
        event_loop: &EventLoop<FlowEvent>,
        constructors: Vec<FlowConstructor>,
    ) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime: tokio::runtime::Runtime::new()?,
            proxy,
            state: None,
            graphics_flows: Vec::new(),
            constructors: Some(constructors),
            last_time: Instant::now(),
            error: None,
        })
    }

    fn start(
        &mut self,
        mut state: AppState,
        mut flows: Vec<Box<dyn GraphicsFlow>>,
    ) -> anyhow::Result<()> {
        let size = state.ctx.window.inner_size();
        state.resize(size.width, size.height);
        for flow in flows.iter_mut() {
            flow.on_init(&mut state.ctx)?;
        }
        log::info!("{} flows initialized", flows.len());
        state.ctx.window.request_redraw();
        self.graphics_flows = flows;
        self.state = Some(state);
        self.last_time = Instant::now();
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{:#}", err);
        self.error = Some(err);
        event_loop.exit();
    }
}

impl ApplicationHandler<FlowEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        // Resumed fires again after suspension; everything is built only once.
        let Some(constructors) = self.constructors.take() else {
            return;
        };

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes();

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let window = wgpu::web_sys::window().unwrap_throw();
            let document = window.document().unwrap_throw();
            let canvas = document.get_element_by_id(CANVAS_ID).unwrap_throw();
            let html_canvas_element = canvas.unchecked_into();
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(err) => return self.fail(event_loop, err.into()),
        };

        let init_future = async move {
            let app_state = AppState::new(window).await?;
            let init: InitContext = (&app_state.ctx).into();
            let flows = futures::future::try_join_all(
                constructors
                    .into_iter()
                    .map(|constructor| constructor(init.clone())),
            )
            .await?;
            Ok::<_, anyhow::Error>((app_state, flows))
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            let started = self
                .async_runtime
                .block_on(init_future)
                .and_then(|(state, flows)| self.start(state, flows));
            if let Err(err) = started {
                self.fail(event_loop, err);
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let event = match init_future.await {
                    Ok((state, flows)) => FlowEvent::Initialized { state, flows },
                    Err(err) => FlowEvent::Failed(err),
                };
                if proxy.send_event(event).is_err() {
                    log::error!("the event loop closed before the flows were initialized");
                }
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: FlowEvent) {
        match event {
            FlowEvent::Initialized { state, flows } => {
                if let Err(err) = self.start(state, flows) {
                    self.fail(event_loop, err);
                }
            }
            FlowEvent::Failed(err) => self.fail(event_loop, err),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        match event {
            WindowEvent::CloseRequested => {
                self.graphics_flows
                    .iter_mut()
                    .for_each(|flow| flow.on_exit(&mut state.ctx));
                event_loop.exit();
            }
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();

                match state.render(&self.graphics_flows) {
                    Ok(_) => state.update(&mut self.graphics_flows, dt),
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = state.ctx.window.inner_size();
                        state.resize(size.width, size.height);
                    }
                    Err(e) => {
                        log::error!("Unable to render {}", e);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Opens a window, builds every flow and drives them until the window closes.
///
/// Errors from building the context or from any flow's construction or
/// initialization end the event loop and are returned here.
pub fn run(constructors: Vec<FlowConstructor>) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info)?;
    }

    let event_loop: EventLoop<FlowEvent> = EventLoop::with_user_event().build()?;

    let mut app = App::new(&event_loop, constructors)?;

    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
