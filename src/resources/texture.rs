//! The texture pipeline: decoded images cached by asset path.
//!
//! A [`TextureHandle`] is a cheap, shared reference to a decoded image. Every
//! consumer of the same path receives the same allocation, so handle identity
//! is pointer identity. Sampler tuning (anisotropy) travels with the handle and
//! is read when the texture is uploaded to the GPU.

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU16, Ordering},
    },
};

use anyhow::Context as _;
use image::{ImageFormat, RgbaImage};

use crate::{config::AssetConfig, resources::load_binary};

/// Largest anisotropy level a sampler accepts.
pub const MAX_ANISOTROPY: u16 = 16;

#[derive(Debug)]
struct TextureAsset {
    path: String,
    image: RgbaImage,
    anisotropy: AtomicU16,
}

/// Shared, read-only image resource owned by a [`TextureCache`].
#[derive(Clone, Debug)]
pub struct TextureHandle(Arc<TextureAsset>);

impl TextureHandle {
    pub fn new(path: impl Into<String>, image: RgbaImage) -> Self {
        Self(Arc::new(TextureAsset {
            path: path.into(),
            image,
            anisotropy: AtomicU16::new(1),
        }))
    }

    pub fn path(&self) -> &str {
        &self.0.path
    }

    pub fn image(&self) -> &RgbaImage {
        &self.0.image
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.0.image.dimensions()
    }

    pub fn anisotropy(&self) -> u16 {
        self.0.anisotropy.load(Ordering::Relaxed)
    }

    /// Sets the anisotropic filtering level used by samplers created for this texture.
    ///
    /// The level is clamped to `1..=16`.
    pub fn set_anisotropy(&self, level: u16) {
        self.0
            .anisotropy
            .store(level.clamp(1, MAX_ANISOTROPY), Ordering::Relaxed);
    }

    pub fn ptr_eq(&self, other: &TextureHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for TextureHandle {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for TextureHandle {}

/// Decodes image file contents, using the file extension as a format hint when it has one.
pub fn decode_image(file_name: &str, bytes: &[u8]) -> anyhow::Result<RgbaImage> {
    let img = match ImageFormat::from_path(file_name) {
        Ok(format) => image::load_from_memory_with_format(bytes, format)?,
        Err(_) => image::load_from_memory(bytes)?,
    };
    Ok(img.to_rgba8())
}

/// Loads textures relative to an asset root and keeps them for the session.
#[derive(Debug)]
pub struct TextureCache {
    config: AssetConfig,
    textures: Mutex<HashMap<String, TextureHandle>>,
}

impl TextureCache {
    pub fn new(config: AssetConfig) -> Self {
        Self {
            config,
            textures: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &AssetConfig {
        &self.config
    }

    pub fn get(&self, file_name: &str) -> Option<TextureHandle> {
        self.lock().get(file_name).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Returns the cached handle for `file_name`, reading and decoding the file on first use.
    ///
    /// Errors are returned as-is to the caller and nothing is cached for a failed path,
    /// so a later call tries again from scratch.
    pub async fn load(&self, file_name: &str) -> anyhow::Result<TextureHandle> {
        if let Some(handle) = self.get(file_name) {
            return Ok(handle);
        }
        log::debug!("loading texture {}", file_name);
        let bytes = load_binary(&self.config, file_name)
            .await
            .with_context(|| format!("failed to read texture {}", file_name))?;
        let image = decode_image(file_name, &bytes)
            .with_context(|| format!("failed to decode texture {}", file_name))?;
        let handle = TextureHandle::new(file_name, image);

        // Two concurrent loads of one path both decode; the first insert wins.
        let mut textures = self.lock();
        Ok(textures
            .entry(file_name.to_string())
            .or_insert(handle)
            .clone())
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, TextureHandle>> {
        self.textures.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
