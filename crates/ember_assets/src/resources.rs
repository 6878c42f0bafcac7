//! Asset loading, caching, and ownership.
//!
//! The [`ResourceManager`] resolves a logical asset request to a concrete
//! file, decodes it, realizes it through the rendering layer, and caches
//! the result under a caller-chosen key. It is the sole owner of every
//! resource it caches; callers only ever borrow.
//!
//! Path resolution is two-tiered: the active game's asset root is tried
//! first, then the shared base root. This lets a game ship only the assets
//! it overrides and inherit the rest.
//!
//! Realization is a trait seam ([`RealizeTexture`]) so the manager does
//! not depend on the GPU: the production implementation uploads to wgpu,
//! tests substitute a CPU stub.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared asset root every game folder falls back to.
pub const DEFAULT_ASSET_ROOT: &str = "assets/base";

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("no {folder} file named '{file_name}' under the game or base asset roots")]
    NotFound {
        folder: &'static str,
        file_name: String,
    },
    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode '{}': {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to realize texture '{key}': {reason}")]
    Realization { key: String, reason: String },
    #[error("no resource loaded under key '{key}'")]
    KeyNotFound { key: String },
}

/// Asset kinds the manager knows how to load. Each kind owns a subfolder
/// under the asset roots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Texture,
}

impl ResourceKind {
    pub fn folder(self) -> &'static str {
        match self {
            ResourceKind::Texture => "textures",
        }
    }
}

/// Turns a decoded image into a render-ready texture. Implemented by the
/// rendering layer against the live GPU context; test code substitutes a
/// stub so the cache semantics are checkable without a device.
pub trait RealizeTexture {
    type Texture;

    fn realize(
        &self,
        image: &image::DynamicImage,
        label: &str,
    ) -> Result<Self::Texture, String>;
}

pub struct ResourceManager<R: RealizeTexture> {
    game_root: PathBuf,
    base_root: PathBuf,
    realizer: R,
    textures: HashMap<String, R::Texture>,
}

impl<R: RealizeTexture> ResourceManager<R> {
    /// Manager rooted at `game_root`, falling back to
    /// [`DEFAULT_ASSET_ROOT`].
    pub fn new(game_root: impl Into<PathBuf>, realizer: R) -> Self {
        Self::with_roots(game_root, DEFAULT_ASSET_ROOT, realizer)
    }

    pub fn with_roots(
        game_root: impl Into<PathBuf>,
        base_root: impl Into<PathBuf>,
        realizer: R,
    ) -> Self {
        Self {
            game_root: game_root.into(),
            base_root: base_root.into(),
            realizer,
            textures: HashMap::new(),
        }
    }

    pub fn game_root(&self) -> &Path {
        &self.game_root
    }

    /// Resolve, decode, realize, and cache one asset under `key`. A second
    /// load under the same key replaces the cached entry, dropping the
    /// previous one.
    pub fn load_resource(
        &mut self,
        kind: ResourceKind,
        file_name: &str,
        key: &str,
    ) -> Result<(), ResourceError> {
        let path = self.resolve_path(kind, file_name)?;
        let bytes = fs::read(&path).map_err(|source| ResourceError::Io {
            path: path.clone(),
            source,
        })?;

        match kind {
            ResourceKind::Texture => {
                let image =
                    image::load_from_memory(&bytes).map_err(|source| ResourceError::Decode {
                        path: path.clone(),
                        source,
                    })?;
                let texture = self
                    .realizer
                    .realize(&image, key)
                    .map_err(|reason| ResourceError::Realization {
                        key: key.to_string(),
                        reason,
                    })?;
                if self.textures.insert(key.to_string(), texture).is_some() {
                    log::warn!("Texture key '{key}' was already loaded and has been replaced");
                }
                log::info!(
                    "Loaded texture '{}' as '{}' from {}",
                    file_name,
                    key,
                    path.display()
                );
            }
        }

        Ok(())
    }

    /// Borrow the cached texture for `key`. A never-loaded key is an
    /// error; there is no implicit load-on-miss.
    pub fn get_texture(&self, key: &str) -> Result<&R::Texture, ResourceError> {
        self.textures
            .get(key)
            .ok_or_else(|| ResourceError::KeyNotFound {
                key: key.to_string(),
            })
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    fn resolve_path(
        &self,
        kind: ResourceKind,
        file_name: &str,
    ) -> Result<PathBuf, ResourceError> {
        let candidate = self.game_root.join(kind.folder()).join(file_name);
        if candidate.exists() {
            return Ok(candidate);
        }

        if self.game_root != self.base_root {
            let fallback = self.base_root.join(kind.folder()).join(file_name);
            if fallback.exists() {
                log::debug!(
                    "'{}' not under {}, using base asset root",
                    file_name,
                    self.game_root.display()
                );
                return Ok(fallback);
            }
        }

        Err(ResourceError::NotFound {
            folder: kind.folder(),
            file_name: file_name.to_string(),
        })
    }
}
