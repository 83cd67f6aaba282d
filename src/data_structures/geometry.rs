//! CPU-side geometry: named vertex attributes over shared float buffers.
//!
//! Geometry is generated once and then treated as immutable data. Attributes
//! hold their floats in an `Arc<[f32]>` so a second attribute can reuse an
//! existing buffer with a different interpretation instead of copying it.

use std::{collections::BTreeMap, f32::consts::TAU, sync::Arc};

pub const POSITION: &str = "position";
pub const NORMAL: &str = "normal";
pub const UV: &str = "uv";
pub const UV2: &str = "uv2";

/// A flat float buffer read `item_size` components at a time.
#[derive(Clone, Debug, PartialEq)]
pub struct BufferAttribute {
    array: Arc<[f32]>,
    item_size: usize,
}

impl BufferAttribute {
    pub fn new(array: impl Into<Arc<[f32]>>, item_size: usize) -> Self {
        Self {
            array: array.into(),
            item_size: item_size.max(1),
        }
    }

    pub fn array(&self) -> &Arc<[f32]> {
        &self.array
    }

    pub fn item_size(&self) -> usize {
        self.item_size
    }

    pub fn count(&self) -> usize {
        self.array.len() / self.item_size
    }

    pub fn get(&self, idx: usize) -> Option<&[f32]> {
        let start = idx * self.item_size;
        self.array.get(start..start + self.item_size)
    }

    pub fn shares_buffer_with(&self, other: &BufferAttribute) -> bool {
        Arc::ptr_eq(&self.array, &other.array)
    }
}

/// The parametric shape a geometry was built from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GeometryKind {
    Plane { width: f32, height: f32 },
    Circle { radius: f32, segments: u32 },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Geometry {
    kind: GeometryKind,
    attributes: BTreeMap<String, BufferAttribute>,
    indices: Vec<u32>,
}

impl Geometry {
    /// A `width` x `height` plane in the local XY plane facing +Z, one segment per side.
    pub fn plane(width: f32, height: f32) -> Self {
        let (grid_x, grid_y) = (1usize, 1usize);
        let segment_width = width / grid_x as f32;
        let segment_height = height / grid_y as f32;

        let mut positions = Vec::new();
        let mut normals = Vec::new();
        let mut uvs = Vec::new();
        for iy in 0..=grid_y {
            let y = iy as f32 * segment_height - height / 2.0;
            for ix in 0..=grid_x {
                let x = ix as f32 * segment_width - width / 2.0;
                positions.extend_from_slice(&[x, -y, 0.0]);
                normals.extend_from_slice(&[0.0, 0.0, 1.0]);
                uvs.extend_from_slice(&[
                    ix as f32 / grid_x as f32,
                    1.0 - iy as f32 / grid_y as f32,
                ]);
            }
        }

        let row = (grid_x + 1) as u32;
        let mut indices = Vec::with_capacity(grid_x * grid_y * 6);
        for iy in 0..grid_y as u32 {
            for ix in 0..grid_x as u32 {
                let a = ix + row * iy;
                let b = ix + row * (iy + 1);
                let c = (ix + 1) + row * (iy + 1);
                let d = (ix + 1) + row * iy;
                indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }

        Self::from_parts(GeometryKind::Plane { width, height }, positions, normals, uvs, indices)
    }

    /// A disc of `radius` in the local XY plane facing +Z, fanned around a center vertex.
    pub fn circle(radius: f32, segments: u32) -> Self {
        let segments = segments.max(3);

        let mut positions = vec![0.0, 0.0, 0.0];
        let mut normals = vec![0.0, 0.0, 1.0];
        let mut uvs = vec![0.5, 0.5];
        for s in 0..=segments {
            let angle = s as f32 / segments as f32 * TAU;
            let (x, y) = (radius * angle.cos(), radius * angle.sin());
            positions.extend_from_slice(&[x, y, 0.0]);
            normals.extend_from_slice(&[0.0, 0.0, 1.0]);
            uvs.extend_from_slice(&[(x / radius + 1.0) / 2.0, (y / radius + 1.0) / 2.0]);
        }

        let indices = (1..=segments).flat_map(|i| [i, i + 1, 0]).collect();

        Self::from_parts(GeometryKind::Circle { radius, segments }, positions, normals, uvs, indices)
    }

    fn from_parts(
        kind: GeometryKind,
        positions: Vec<f32>,
        normals: Vec<f32>,
        uvs: Vec<f32>,
        indices: Vec<u32>,
    ) -> Self {
        let mut attributes = BTreeMap::new();
        attributes.insert(POSITION.to_string(), BufferAttribute::new(positions, 3));
        attributes.insert(NORMAL.to_string(), BufferAttribute::new(normals, 3));
        attributes.insert(UV.to_string(), BufferAttribute::new(uvs, 2));
        Self {
            kind,
            attributes,
            indices,
        }
    }

    pub fn kind(&self) -> GeometryKind {
        self.kind
    }

    pub fn attribute(&self, name: &str) -> Option<&BufferAttribute> {
        self.attributes.get(name)
    }

    pub fn set_attribute(&mut self, name: &str, attribute: BufferAttribute) {
        self.attributes.insert(name.to_string(), attribute);
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<BufferAttribute> {
        self.attributes.remove(name)
    }

    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.attribute(POSITION).map_or(0, BufferAttribute::count)
    }
}
