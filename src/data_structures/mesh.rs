//! Mesh nodes: a geometry, a material and a fixed transform.
//!
//! A [`MeshNode`] is plain data until [`MeshNode::write_to_buffers`] is called
//! with the GPU resources of a context; from then on it also owns the vertex, index, instance and
//! material buffers needed to draw it. Replacing the geometry or material drops
//! the GPU state so it is rebuilt on the next write.

use log::warn;
use wgpu::util::DeviceExt;

use crate::{
    context::RenderResources,
    data_structures::{
        geometry::{self, BufferAttribute, Geometry, GeometryKind},
        instance::Instance,
        material::Material,
        texture::Texture,
    },
    render::{Drawable, Render},
};

pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub uv2: [f32; 2],
}

impl Vertex for MeshVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

/// Interleaves the named attributes of `geometry` into GPU vertices.
///
/// Missing attributes are filled with zeros.
pub fn interleave(geometry: &Geometry) -> Vec<MeshVertex> {
    let read = |attribute: Option<&BufferAttribute>, idx: usize, out: &mut [f32]| {
        if let Some(values) = attribute.and_then(|a| a.get(idx)) {
            out.iter_mut().zip(values).for_each(|(o, v)| *o = *v);
        }
    };
    let position = geometry.attribute(geometry::POSITION);
    let normal = geometry.attribute(geometry::NORMAL);
    let uv = geometry.attribute(geometry::UV);
    let uv2 = geometry.attribute(geometry::UV2);
    (0..geometry.vertex_count())
        .map(|i| {
            let mut vertex = MeshVertex::default();
            read(position, i, &mut vertex.position);
            read(normal, i, &mut vertex.normal);
            read(uv, i, &mut vertex.uv);
            read(uv2, i, &mut vertex.uv2);
            vertex
        })
        .collect()
}

/// Everything about a mesh node that a host needs to reproduce it, without GPU state.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshDescriptor {
    pub name: String,
    pub geometry: GeometryKind,
    pub position: [f32; 3],
    pub rotation: [f32; 3],
    pub material: Material,
}

#[derive(Debug)]
struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    num_indices: u32,
    instance_buffer: wgpu::Buffer,
    material_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

#[derive(Debug)]
pub struct MeshNode {
    name: String,
    geometry: Geometry,
    material: Material,
    position: [f32; 3],
    rotation: [f32; 3],
    transform: Instance,
    gpu: Option<GpuMesh>,
}

impl MeshNode {
    /// `rotation` holds Euler angles in radians (XYZ order).
    pub fn new(
        name: &str,
        geometry: Geometry,
        material: Material,
        position: [f32; 3],
        rotation: [f32; 3],
    ) -> Self {
        Self {
            name: name.to_string(),
            geometry,
            material,
            position,
            rotation,
            transform: Instance::from_euler(position, rotation),
            gpu: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn geometry_mut(&mut self) -> &mut Geometry {
        self.gpu = None;
        &mut self.geometry
    }

    /// Replaces the geometry. Derived attributes of the old geometry are not carried over.
    pub fn set_geometry(&mut self, geometry: Geometry) {
        self.geometry = geometry;
        self.gpu = None;
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn material_mut(&mut self) -> &mut Material {
        self.gpu = None;
        &mut self.material
    }

    pub fn transform(&self) -> &Instance {
        &self.transform
    }

    pub fn is_uploaded(&self) -> bool {
        self.gpu.is_some()
    }

    pub fn descriptor(&self) -> MeshDescriptor {
        MeshDescriptor {
            name: self.name.clone(),
            geometry: self.geometry.kind(),
            position: self.position,
            rotation: self.rotation,
            material: self.material.clone(),
        }
    }

    /// Uploads the node on first use, afterwards only rewrites the instance and material uniforms.
    pub fn write_to_buffers(&mut self, res: &RenderResources<'_>) {
        match &self.gpu {
            Some(gpu) => {
                res.queue.write_buffer(
                    &gpu.instance_buffer,
                    0,
                    bytemuck::cast_slice(&[self.transform.to_raw()]),
                );
                res.queue
                    .write_buffer(&gpu.material_buffer, 0, &self.material.uniform_bytes());
            }
            None => self.gpu = Some(self.upload(res)),
        }
    }

    fn upload(&self, res: &RenderResources<'_>) -> GpuMesh {
        let device = res.device;
        if self.geometry.attribute(geometry::UV2).is_none() {
            warn!("{} is uploaded without a uv2 set, ambient occlusion reads zeros", self.name);
        }
        let vertices = interleave(&self.geometry);
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertex Buffer", self.name)),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Index Buffer", self.name)),
            contents: bytemuck::cast_slice(self.geometry.indices()),
            usage: wgpu::BufferUsages::INDEX,
        });
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Instance Buffer", self.name)),
            contents: bytemuck::cast_slice(&[self.transform.to_raw()]),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        let material_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Material Buffer", self.name)),
            contents: &self.material.uniform_bytes(),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let textures: Vec<Texture> = self
            .material
            .texture_slots()
            .into_iter()
            .map(|slot| match slot {
                Some(handle) => Texture::from_handle(device, res.queue, handle),
                None => Texture::solid([255; 4], device, res.queue, "empty material slot"),
            })
            .collect();

        let mut entries = vec![wgpu::BindGroupEntry {
            binding: 0,
            resource: material_buffer.as_entire_binding(),
        }];
        let reflection = match self.material {
            Material::Basic(_) => None,
            Material::Reflector(_) => Some(res.reflection),
        };
        for (i, texture) in textures.iter().chain(reflection).enumerate() {
            let binding = 1 + 2 * i as u32;
            entries.push(wgpu::BindGroupEntry {
                binding,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            });
            entries.push(wgpu::BindGroupEntry {
                binding: binding + 1,
                resource: wgpu::BindingResource::Sampler(&texture.sampler),
            });
        }
        let layout = match self.material {
            Material::Basic(_) => &res.layouts.unlit,
            Material::Reflector(_) => &res.layouts.reflector,
        };
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &entries,
            label: Some(&format!("{} Material Bind Group", self.name)),
        });

        GpuMesh {
            vertex_buffer,
            index_buffer,
            num_indices: self.geometry.indices().len() as u32,
            instance_buffer,
            material_buffer,
            bind_group,
        }
    }

    /// Nothing is drawn until the node was written to the GPU at least once.
    pub fn get_render(&self) -> Render<'_> {
        let Some(gpu) = &self.gpu else {
            return Render::None;
        };
        let drawable = Drawable {
            name: &self.name,
            vertex: &gpu.vertex_buffer,
            index: &gpu.index_buffer,
            num_indices: gpu.num_indices,
            instance: &gpu.instance_buffer,
            material: &gpu.bind_group,
        };
        match self.material {
            Material::Basic(_) => Render::Unlit(drawable),
            Material::Reflector(_) => Render::Reflective(drawable),
        }
    }
}
