//! Asset root configuration.
//!
//! The asset root is the only piece of external configuration. Natively it is
//! read from `FLOW_ASSET_ROOT` and defaults to `./assets`; on the web assets are
//! fetched relative to `<origin>/assets/`.

use std::path::{Path, PathBuf};

/// Environment variable overriding the native asset root.
pub const ASSET_ROOT_ENV: &str = "FLOW_ASSET_ROOT";

const DEFAULT_ASSET_ROOT: &str = "./assets";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetConfig {
    root: PathBuf,
}

impl AssetConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Reads the asset root from the environment, falling back to `./assets`.
    pub fn from_env() -> Self {
        match std::env::var(ASSET_ROOT_ENV) {
            Ok(root) if !root.trim().is_empty() => Self::new(root),
            _ => Self::default(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Joins an asset path such as `textures/grid.png` onto the root.
    pub fn resolve(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ASSET_ROOT)
    }
}
