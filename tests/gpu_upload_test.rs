#![cfg(feature = "integration-tests")]

use std::iter;

use flow_ground::{
    Deg,
    camera::{self, Projection},
    context::{MaterialLayouts, Pipelines, RenderResources, SceneResources},
    data_structures::texture::Texture,
    flow::GraphicsFlow,
    ground::{FLOOR_NAME, GroundPlane, OVERLAY_NAME},
    physics::PhysicsWorld,
    render,
    resources::texture::TextureHandle,
};
use image::{Rgba, RgbaImage};

use crate::common::test_utils::AssetDir;

mod common;

const SIZE: u32 = 64;
const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// Headless device with the limits of the web build, so texture dimensions top out at 2048.
async fn device() -> (wgpu::Device, wgpu::Queue) {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    });
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: None,
            force_fallback_adapter: false,
        })
        .await
        .expect("integration tests need a graphics adapter");
    adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("test device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
            memory_hints: Default::default(),
            trace: wgpu::Trace::Off,
        })
        .await
        .unwrap()
}

fn wait(device: &wgpu::Device) {
    device
        .poll(wgpu::PollType::Wait)
        .unwrap();
}

#[tokio::test]
async fn should_upload_and_draw_both_ground_meshes() {
    let assets = AssetDir::with_ground_textures("gpu-draw");
    let cache = assets.cache();
    let mut world = PhysicsWorld::default();
    let mut ground = GroundPlane::mount(&cache, Some(&mut world)).await.unwrap();

    let (device, queue) = device().await;
    let projection = Projection::new(SIZE, SIZE, Deg(45.0), 0.1, 500.0);
    let scene = SceneResources::new(&device, camera::default_camera(), &projection, SIZE, SIZE);
    let layouts = MaterialLayouts::new(&device);
    let pipelines = Pipelines::new(&device, TARGET_FORMAT, &scene.bind_group_layout, &layouts);
    let reflection = Texture::solid([0, 0, 0, 255], &device, &queue, "reflection");
    let res = RenderResources {
        device: &device,
        queue: &queue,
        layouts: &layouts,
        reflection: &reflection,
    };

    ground.upload(&res);
    // A second upload only rewrites the uniforms.
    ground.upload(&res);
    assert!(ground.meshes().iter().all(|mesh| mesh.is_uploaded()));

    let batches = ground.on_render().into_batches();
    let names = |drawables: &[render::Drawable<'_>]| {
        drawables.iter().map(|d| d.name.to_string()).collect::<Vec<_>>()
    };
    assert_eq!(names(&batches.reflective), vec![FLOOR_NAME]);
    assert_eq!(names(&batches.unlit), vec![OVERLAY_NAME]);
    assert!(batches.reflective.iter().chain(&batches.unlit).all(|d| d.num_indices > 0));

    let target = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("target"),
        size: wgpu::Extent3d {
            width: SIZE,
            height: SIZE,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: TARGET_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = target.create_view(&wgpu::TextureViewDescriptor::default());
    let depth = Texture::create_depth_texture(&device, [SIZE, SIZE], "depth");

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("test encoder"),
    });
    {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("test pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        render_pass.set_bind_group(0, &scene.bind_group, &[]);
        render::draw_batches(&mut render_pass, &pipelines, &batches);
    }
    queue.submit(iter::once(encoder.finish()));
    wait(&device);
}

#[tokio::test]
async fn should_shrink_textures_larger_than_the_device_allows() {
    let (device, queue) = device().await;
    let max = device.limits().max_texture_dimension_2d;
    let handle = TextureHandle::new(
        "textures/wide.png",
        RgbaImage::from_pixel(max + 1, 1, Rgba([255, 255, 255, 255])),
    );

    let texture = Texture::from_handle(&device, &queue, &handle);
    queue.submit(iter::empty());
    wait(&device);

    assert_eq!(texture.size(), (max, 1));
    assert_eq!(handle.dimensions(), (max + 1, 1));
}
