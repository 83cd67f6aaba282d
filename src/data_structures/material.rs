//! Material parameter tables and the uniform blocks they are packed into.
//!
//! Two material kinds exist: [`BasicMaterial`], an unlit colour optionally
//! masked by an alpha map, and [`ReflectorMaterial`], a standard metal/rough
//! surface with ambient occlusion, an alpha map and blurred planar reflections.
//! Parameters are plain data; [`Material::uniform_bytes`] is the exact byte
//! representation handed to the GPU.

use crate::resources::texture::TextureHandle;

/// Linear RGB colour.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub const fn gray(v: f32) -> Self {
        Self::new(v, v, v)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BasicMaterial {
    pub color: Color,
    pub opacity: f32,
    pub transparent: bool,
    /// Green channel scales the opacity across the surface.
    pub alpha_map: Option<TextureHandle>,
}

impl Default for BasicMaterial {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            opacity: 1.0,
            transparent: false,
            alpha_map: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReflectorMaterial {
    pub color: Color,
    pub transparent: bool,
    /// Red channel, sampled with the `uv2` set.
    pub ao_map: Option<TextureHandle>,
    pub ao_map_intensity: f32,
    pub alpha_map: Option<TextureHandle>,
    pub env_map_intensity: f32,
    pub metalness: f32,
    pub roughness: f32,
    pub dithering: bool,
    /// Blur kernel size (width, height) of the reflection, `[0, 0]` skips blurring.
    pub blur: [u32; 2],
    pub mix_blur: f32,
    pub mix_strength: f32,
    pub mix_contrast: f32,
    /// Side length of the off-screen reflection buffer.
    pub resolution: u32,
    /// 0 keeps texture colours, 1 picks up environment colours.
    pub mirror: f32,
    pub depth_scale: f32,
    pub min_depth_threshold: f32,
    pub max_depth_threshold: f32,
    pub depth_to_blur_ratio_bias: f32,
    pub debug: u32,
    /// Offset of the virtual camera that projects the reflection.
    pub reflector_offset: f32,
}

impl Default for ReflectorMaterial {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            transparent: false,
            ao_map: None,
            ao_map_intensity: 1.0,
            alpha_map: None,
            env_map_intensity: 1.0,
            metalness: 0.0,
            roughness: 1.0,
            dithering: false,
            blur: [0, 0],
            mix_blur: 1.0,
            mix_strength: 1.0,
            mix_contrast: 1.0,
            resolution: 256,
            mirror: 0.0,
            depth_scale: 0.0,
            min_depth_threshold: 0.0,
            max_depth_threshold: 1.0,
            depth_to_blur_ratio_bias: 0.25,
            debug: 0,
            reflector_offset: 0.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Material {
    Basic(BasicMaterial),
    Reflector(ReflectorMaterial),
}

impl Material {
    pub fn is_transparent(&self) -> bool {
        match self {
            Material::Basic(basic) => basic.transparent,
            Material::Reflector(reflector) => reflector.transparent,
        }
    }

    /// Texture slots in binding order; an empty slot is bound to a white placeholder.
    pub fn texture_slots(&self) -> Vec<Option<&TextureHandle>> {
        match self {
            Material::Basic(basic) => vec![basic.alpha_map.as_ref()],
            Material::Reflector(reflector) => {
                vec![reflector.ao_map.as_ref(), reflector.alpha_map.as_ref()]
            }
        }
    }

    pub fn uniform_bytes(&self) -> Vec<u8> {
        match self {
            Material::Basic(basic) => bytemuck::bytes_of(&BasicUniform::from(basic)).to_vec(),
            Material::Reflector(reflector) => {
                bytemuck::bytes_of(&ReflectorUniform::from(reflector)).to_vec()
            }
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BasicUniform {
    /// rgb + opacity
    pub color: [f32; 4],
    /// x: 1 when an alpha map is bound and the material is transparent
    pub flags: [f32; 4],
}

impl From<&BasicMaterial> for BasicUniform {
    fn from(m: &BasicMaterial) -> Self {
        let opacity = if m.transparent { m.opacity } else { 1.0 };
        Self {
            color: [m.color.r, m.color.g, m.color.b, opacity],
            flags: [flag(m.transparent && m.alpha_map.is_some()), 0.0, 0.0, 0.0],
        }
    }
}

// Uniforms require 16 byte spacing, hence everything is grouped in vec4s.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ReflectorUniform {
    /// rgb + opacity
    pub color: [f32; 4],
    /// metalness, roughness, env map intensity, ao map intensity
    pub surface: [f32; 4],
    /// mix blur, mix strength, mix contrast, mirror
    pub mix: [f32; 4],
    /// depth scale, min depth threshold, max depth threshold, depth to blur ratio bias
    pub depth: [f32; 4],
    /// blur width, blur height, resolution, reflector offset
    pub reflection: [f32; 4],
    /// dithering, debug, has ao map, alpha map applies
    pub flags: [f32; 4],
}

impl From<&ReflectorMaterial> for ReflectorUniform {
    fn from(m: &ReflectorMaterial) -> Self {
        Self {
            color: [m.color.r, m.color.g, m.color.b, 1.0],
            surface: [m.metalness, m.roughness, m.env_map_intensity, m.ao_map_intensity],
            mix: [m.mix_blur, m.mix_strength, m.mix_contrast, m.mirror],
            depth: [
                m.depth_scale,
                m.min_depth_threshold,
                m.max_depth_threshold,
                m.depth_to_blur_ratio_bias,
            ],
            reflection: [
                m.blur[0] as f32,
                m.blur[1] as f32,
                m.resolution as f32,
                m.reflector_offset,
            ],
            flags: [
                flag(m.dithering),
                m.debug as f32,
                flag(m.ao_map.is_some()),
                // Opaque surfaces ignore their alpha map.
                flag(m.transparent && m.alpha_map.is_some()),
            ],
        }
    }
}

fn flag(on: bool) -> f32 {
    if on { 1.0 } else { 0.0 }
}
