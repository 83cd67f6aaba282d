//! flow-ground
//!
//! A static ground plane for scenes driven by the flow engine: a faint grid
//! overlay on top of a reflective circular floor, backed by a flat static
//! physics collider. The ground is a single [`ground::GroundPlane`] flow; the
//! rest of the crate is the small engine surface it needs.
//!
//! High-level modules
//! - `config`: asset root resolution
//! - `camera`: fixed perspective camera and the scene uniform
//! - `context`: central GPU and window context that owns device/queue/pipelines
//! - `data_structures`: geometry, materials, mesh nodes, transforms, textures
//! - `flow`: high level flow control (scenes / update loops)
//! - `ground`: the ground plane itself
//! - `physics`: rapier3d world wrapper for static colliders
//! - `pipelines`: render pipelines for the unlit and reflective materials
//! - `resources`: asset loading and the texture cache
//! - `render`: render composition for efficient pipeline reuse
//!

pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod ground;
pub mod physics;
pub mod pipelines;
pub mod render;
pub mod resources;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::*;
pub use wgpu::Color;
