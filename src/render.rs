//! Render composition and pipeline batching.
//!
//! This module defines the [`Render`] enum, which is used by flows to specify
//! what they want drawn. The engine uses `Render` to sort objects into batches
//! for the reflective and unlit pipelines.
//!
//! # Key types
//!
//! - [`Render<'a>`] is the primary enum describing render operations
//! - [`Drawable<'a>`] contains the buffers and material bind group of one mesh
//! - [`Batches<'a>`] holds the drawables of a frame sorted per pipeline
//!

use crate::context::Pipelines;

/// Buffers and material bindings of a single mesh ready to be drawn.
#[derive(Clone)]
pub struct Drawable<'a> {
    pub name: &'a str,
    pub vertex: &'a wgpu::Buffer,
    pub index: &'a wgpu::Buffer,
    pub num_indices: u32,
    pub instance: &'a wgpu::Buffer,
    pub material: &'a wgpu::BindGroup,
}

/// Specifies how a scene object should be rendered.
///
/// # Variants
///
/// - `None` renders nothing
/// - `Unlit(Drawable)` renders an alpha-blended mesh with the unlit pipeline
/// - `Reflective(Drawable)` renders a mesh with the reflective pipeline
/// - `Composed(Vec<Render>)` recursively renders composition of multiple renders
///
pub enum Render<'a> {
    None,
    Unlit(Drawable<'a>),
    Reflective(Drawable<'a>),
    Composed(Vec<Render<'a>>),
}

impl<'a> Render<'a> {
    /// Flattens the render tree into one batch per pipeline, keeping declaration order.
    pub(crate) fn set_pipelines(
        self,
        unlit: &mut Vec<Drawable<'a>>,
        reflective: &mut Vec<Drawable<'a>>,
    ) {
        match self {
            Render::Unlit(drawable) => unlit.push(drawable),
            Render::Reflective(drawable) => reflective.push(drawable),
            Render::Composed(renders) => renders
                .into_iter()
                .for_each(|render| render.set_pipelines(unlit, reflective)),
            Render::None => (),
        }
    }

    pub fn into_batches(self) -> Batches<'a> {
        let mut batches = Batches::default();
        batches.push(self);
        batches
    }

    /// Number of drawables in this render tree.
    pub fn len(&self) -> usize {
        match self {
            Render::None => 0,
            Render::Unlit(_) | Render::Reflective(_) => 1,
            Render::Composed(renders) => renders.iter().map(Render::len).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Drawables of one frame, one batch per pipeline, each in declaration order.
#[derive(Clone, Default)]
pub struct Batches<'a> {
    pub reflective: Vec<Drawable<'a>>,
    pub unlit: Vec<Drawable<'a>>,
}

impl<'a> Batches<'a> {
    pub fn push(&mut self, render: Render<'a>) {
        render.set_pipelines(&mut self.unlit, &mut self.reflective);
    }
}

/// Draws the reflective batch, then the unlit batch blended on top of it.
///
/// The scene bind group must already be set at group 0.
pub fn draw_batches(render_pass: &mut wgpu::RenderPass<'_>, pipelines: &Pipelines, batches: &Batches<'_>) {
    render_pass.set_pipeline(&pipelines.reflector);
    for drawable in &batches.reflective {
        draw(render_pass, drawable);
    }

    render_pass.set_pipeline(&pipelines.unlit);
    for drawable in &batches.unlit {
        draw(render_pass, drawable);
    }
}

pub(crate) fn draw(render_pass: &mut wgpu::RenderPass<'_>, drawable: &Drawable<'_>) {
    if drawable.num_indices == 0 {
        log::warn!("you attempted to render {} without any indices", drawable.name);
        return;
    }
    render_pass.set_bind_group(1, drawable.material, &[]);
    render_pass.set_vertex_buffer(0, drawable.vertex.slice(..));
    render_pass.set_vertex_buffer(1, drawable.instance.slice(..));
    render_pass.set_index_buffer(drawable.index.slice(..), wgpu::IndexFormat::Uint32);
    render_pass.draw_indexed(0..drawable.num_indices, 0, 0..1);
}
