use crate::{
    data_structures::{
        instance::InstanceRaw,
        mesh::{MeshVertex, Vertex},
        texture::Texture,
    },
    pipelines::basic::{mk_render_pipeline, texture_entries, uniform_entry},
};

/// Material bind group of the reflective pipeline:
/// uniform, ao map + sampler, alpha map + sampler, reflection + sampler.
pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let [ao, ao_sampler] = texture_entries(1);
    let [alpha, alpha_sampler] = texture_entries(3);
    let [reflection, reflection_sampler] = texture_entries(5);
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            uniform_entry(0, wgpu::ShaderStages::FRAGMENT),
            ao,
            ao_sampler,
            alpha,
            alpha_sampler,
            reflection,
            reflection_sampler,
        ],
        label: Some("reflector_material_bind_group_layout"),
    })
}

/**
 * Metal/rough surface with ambient occlusion, an alpha map and a planar
 * reflection mixed in by the material's mix parameters.
 *
 * The reflection texture is provided by the host; capturing and blurring the
 * mirrored scene is not this pipeline's job.
 */
pub fn mk_reflector_pipeline(
    device: &wgpu::Device,
    color_format: wgpu::TextureFormat,
    scene_bind_group_layout: &wgpu::BindGroupLayout,
    material_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Reflector Pipeline Layout"),
        bind_group_layouts: &[scene_bind_group_layout, material_bind_group_layout],
        push_constant_ranges: &[],
    });
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Reflector Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("reflector.wgsl").into()),
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
