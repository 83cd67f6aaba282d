//! Render pipelines, one per material kind.
//!
//! - `basic` holds the scene bind group layout and the shared pipeline factory
//! - `transparent` is the unlit, alpha-mapped pipeline (`unlit.wgsl`)
//! - `reflector` is the reflective floor pipeline (`reflector.wgsl`)

pub mod basic;
pub mod reflector;
pub mod transparent;
