use std::sync::Arc;

use anyhow::Context as _;
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::{
    camera::{self, Camera, Projection, SceneUniform},
    config::AssetConfig,
    data_structures::texture::Texture,
    physics::PhysicsWorld,
    pipelines::{basic, reflector, transparent},
    resources::texture::TextureCache,
};

/// The camera together with the uniform buffer every pipeline reads at group 0.
#[derive(Debug)]
pub struct SceneResources {
    pub camera: Camera,
    pub uniform: SceneUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl SceneResources {
    pub fn new(
        device: &wgpu::Device,
        camera: Camera,
        projection: &Projection,
        width: u32,
        height: u32,
    ) -> Self {
        let mut uniform = SceneUniform::new();
        uniform.update_view_proj(&camera, projection);
        uniform.update_viewport(width, height);

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Scene Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group_layout = basic::mk_scene_bind_group_layout(device);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("scene_bind_group"),
        });
        Self {
            camera,
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }
}

/// Material bind group layouts (group 1), one per material kind.
#[derive(Debug)]
pub struct MaterialLayouts {
    pub unlit: wgpu::BindGroupLayout,
    pub reflector: wgpu::BindGroupLayout,
}

impl MaterialLayouts {
    pub fn new(device: &wgpu::Device) -> Self {
        Self {
            unlit: transparent::mk_bind_group_layout(device),
            reflector: reflector::mk_bind_group_layout(device),
        }
    }
}

/// One render pipeline per material kind, all targeting `color_format`.
#[derive(Debug)]
pub struct Pipelines {
    pub unlit: wgpu::RenderPipeline,
    pub reflector: wgpu::RenderPipeline,
}

impl Pipelines {
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        scene_layout: &wgpu::BindGroupLayout,
        layouts: &MaterialLayouts,
    ) -> Self {
        Self {
            unlit: transparent::mk_transparent_pipeline(
                device,
                color_format,
                scene_layout,
                &layouts.unlit,
            ),
            reflector: reflector::mk_reflector_pipeline(
                device,
                color_format,
                scene_layout,
                &layouts.reflector,
            ),
        }
    }
}

/// Everything a mesh needs to put itself on the GPU.
#[derive(Clone, Copy, Debug)]
pub struct RenderResources<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub layouts: &'a MaterialLayouts,
    /// Bound to the reflection slot of reflective materials.
    pub reflection: &'a Texture,
}

#[derive(Debug)]
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub(crate) depth_texture: Texture,
    pub pipelines: Pipelines,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub scene: SceneResources,
    pub projection: Projection,
    pub layouts: MaterialLayouts,
    /// Planar reflection sampled by reflective materials. Black until a host renders into its own.
    pub reflection: Texture,
    pub physics: Option<PhysicsWorld>,
    pub textures: Arc<TextureCache>,
    pub clear_colour: wgpu::Color,
}

impl Context {
    pub async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let size = window.inner_size();

        // The instance is a handle to our GPU
        // BackendBit::PRIMARY => Vulkan + Metal + DX12 + Browser WebGPU
        log::info!("WGPU setup");
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..Default::default()
        });

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
            .context("no suitable graphics adapter")?;

        let (device, queue) = adapter
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
                trace: wgpu::Trace::Off,
            })
            .await
            .context("could not open the graphics device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        // Shaders assume an Srgb surface texture.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("the surface supports no texture format")?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let camera = camera::default_camera();
        let projection =
            Projection::new(config.width, config.height, cgmath::Deg(45.0), 0.1, 500.0);

        let scene = SceneResources::new(&device, camera, &projection, config.width, config.height);
        let layouts = MaterialLayouts::new(&device);
        let pipelines = Pipelines::new(&device, config.format, &scene.bind_group_layout, &layouts);

        let depth_texture =
            Texture::create_depth_texture(&device, [config.width, config.height], "depth_texture");
        let reflection = Texture::solid([0, 0, 0, 255], &device, &queue, "reflection placeholder");

        Ok(Self {
            window,
            depth_texture,
            pipelines,
            surface,
            device,
            queue,
            config,
            scene,
            projection,
            layouts,
            reflection,
            physics: Some(PhysicsWorld::default()),
            textures: Arc::new(TextureCache::new(AssetConfig::from_env())),
            clear_colour: wgpu::Color {
                r: 0.1,
                g: 0.1,
                b: 0.1,
                a: 1.0,
            },
        })
    }

    pub fn resources(&self) -> RenderResources<'_> {
        RenderResources {
            device: &self.device,
            queue: &self.queue,
            layouts: &self.layouts,
            reflection: &self.reflection,
        }
    }

    /// Pushes the current camera pose and viewport to the scene uniform.
    pub(crate) fn write_scene_uniform(&mut self) {
        self.scene
            .uniform
            .update_view_proj(&self.scene.camera, &self.projection);
        self.scene
            .uniform
            .update_viewport(self.config.width, self.config.height);
        self.queue.write_buffer(
            &self.scene.buffer,
            0,
            bytemuck::cast_slice(&[self.scene.uniform]),
        );
    }
}

/// What a flow constructor gets to prepare its resources before the flow is initialized.
#[derive(Clone, Debug)]
pub struct InitContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub textures: Arc<TextureCache>,
}

impl From<&Context> for InitContext {
    fn from(ctx: &Context) -> Self {
        Self {
            device: ctx.device.clone(),
            queue: ctx.queue.clone(),
            textures: ctx.textures.clone(),
        }
    }
}
