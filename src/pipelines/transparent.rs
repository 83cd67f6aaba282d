use crate::{
    data_structures::{
        instance::InstanceRaw,
        mesh::{MeshVertex, Vertex},
        texture::Texture,
    },
    pipelines::basic::{mk_render_pipeline, texture_entries, uniform_entry},
};

/// Material bind group of the unlit pipeline: uniform, alpha map, alpha sampler.
pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let [alpha, alpha_sampler] = texture_entries(1);
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            uniform_entry(0, wgpu::ShaderStages::FRAGMENT),
            alpha,
            alpha_sampler,
        ],
        label: Some("unlit_material_bind_group_layout"),
    })
}

/**
 * Unlit, alpha-blended pipeline for basic materials.
 *
 * Opacity comes from the material uniform and is scaled by the alpha map's
 * green channel.
 */
pub fn mk_transparent_pipeline(
    device: &wgpu::Device,
    color_format: wgpu::TextureFormat,
    scene_bind_group_layout: &wgpu::BindGroupLayout,
    material_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Unlit Pipeline Layout"),
        bind_group_layouts: &[scene_bind_group_layout, material_bind_group_layout],
        push_constant_ranges: &[],
    });
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Unlit Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("unlit.wgsl").into()),
    };
    mk_render_pipeline(
        device,
        &render_pipeline_layout,
        color_format,
        Some(wgpu::BlendState::ALPHA_BLENDING),
        Some(Texture::DEPTH_FORMAT),
        &[MeshVertex::desc(), InstanceRaw::desc()],
        shader,
    )
}
