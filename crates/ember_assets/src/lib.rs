pub mod resources;

pub use resources::{
    RealizeTexture, ResourceError, ResourceKind, ResourceManager, DEFAULT_ASSET_ROOT,
};
