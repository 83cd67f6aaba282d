//! Engine data structures: geometry, materials, mesh nodes, transforms and textures.
//!
//! - `geometry` contains parametric plane/circle geometry with named vertex attributes
//! - `material` contains the unlit and reflective material parameter tables
//! - `mesh` combines geometry, material and transform into drawable scene nodes
//! - `instance` holds per-node transformation data
//! - `texture` contains GPU texture wrapper and creation utilities

pub mod geometry;
pub mod instance;
pub mod material;
pub mod mesh;
pub mod texture;
