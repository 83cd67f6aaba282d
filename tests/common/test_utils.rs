use std::{
    fs,
    path::{Path, PathBuf},
};

use flow_ground::{
    config::AssetConfig,
    ground::{ALPHA_TEXTURE, AO_TEXTURE, GRID_TEXTURE},
    resources::texture::TextureCache,
};
use image::{ImageBuffer, Rgba};

/// A throwaway asset root under the system temp directory, removed on drop.
pub struct AssetDir {
    root: PathBuf,
}

impl AssetDir {
    pub fn new(name: &str) -> Self {
        let root = std::env::temp_dir().join(format!(
            "flow-ground-{}-{}",
            name,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&root);
        fs::create_dir_all(root.join("textures")).unwrap();
        Self { root }
    }

    /// An asset root holding all three ground textures.
    pub fn with_ground_textures(name: &str) -> Self {
        let dir = Self::new(name);
        dir.write_png(GRID_TEXTURE, 16, 16, |x, y| {
            let line = x % 4 == 0 || y % 4 == 0;
            let v = if line { 255 } else { 0 };
            Rgba([v, v, v, 255])
        });
        dir.write_png(AO_TEXTURE, 8, 8, |x, y| {
            let v = 128 + ((x + y) * 8) as u8;
            Rgba([v, v, v, 255])
        });
        dir.write_png(ALPHA_TEXTURE, 8, 8, |x, _| {
            let v = (x * 32) as u8;
            Rgba([0, v, 0, 255])
        });
        dir
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn write_png(
        &self,
        file_name: &str,
        width: u32,
        height: u32,
        pixel: impl Fn(u32, u32) -> Rgba<u8>,
    ) {
        let img: ImageBuffer<Rgba<u8>, Vec<u8>> = ImageBuffer::from_fn(width, height, pixel);
        img.save(self.root.join(file_name)).unwrap();
    }

    pub fn write_bytes(&self, file_name: &str, bytes: &[u8]) {
        fs::write(self.root.join(file_name), bytes).unwrap();
    }

    pub fn remove(&self, file_name: &str) {
        fs::remove_file(self.root.join(file_name)).unwrap();
    }

    pub fn cache(&self) -> TextureCache {
        TextureCache::new(AssetConfig::new(&self.root))
    }
}

impl Drop for AssetDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.root);
    }
}

pub fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 1e-4,
        "expected {} but got {}",
        expected,
        actual
    );
}
