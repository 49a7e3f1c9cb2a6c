//! # Pack Renderer
//!
//! Renders Minecraft resource pack models, items and structures to GUI
//! thumbnails.
//!
//! ## Overview
//!
//! A resource pack (ZIP or directory) is loaded into memory. Render requests
//! are queued on a [`TaskScheduler`], which resolves each one to baked
//! models, unrolls texture animations into keyframes, rasterizes every
//! keyframe in software and hands PNG or animated WebP bytes to a [`Sink`].
//!
//! ## Quick Start
//!
//! ```ignore
//! use pack_renderer::{load_resource_pack, RenderConfig, RenderRequest, TaskScheduler, FileSink};
//!
//! let pack = load_resource_pack("path/to/pack.zip")?;
//! let mut scheduler = TaskScheduler::new(&pack, RenderConfig::default())?;
//! scheduler.push(RenderRequest::Model("minecraft:block/stone".into()));
//! scheduler.push_all_items();
//! scheduler.run(&mut FileSink::new("out"))?;
//! ```

pub mod animation;
pub mod atlas;
pub mod cache;
pub mod config;
pub mod error;
pub mod export;
pub mod item;
pub mod item_model;
pub mod mesher;
pub mod raster;
pub mod resolver;
pub mod resource_pack;
pub mod scheduler;
pub mod skin;
pub mod structure;
pub mod types;

pub use cache::{Cache, DiskCache, MemoryCache};
pub use config::{AnimationMode, LightConfig, RenderConfig};
pub use error::{RenderError, Result};
pub use item::{Item, ItemCatalog};
pub use resource_pack::{Model, ResourcePack};
pub use scheduler::{FileSink, MemorySink, RenderOutput, RenderRequest, Sink, TaskScheduler};
pub use skin::ProfileResolver;
pub use types::NamespacedKey;

/// Load a resource pack from a file path (ZIP or directory).
pub fn load_resource_pack<P: AsRef<std::path::Path>>(path: P) -> Result<ResourcePack> {
    resource_pack::loader::load_from_path(path)
}

/// Load a resource pack from ZIP bytes.
pub fn load_resource_pack_from_bytes(data: &[u8]) -> Result<ResourcePack> {
    resource_pack::loader::load_from_bytes(data)
}
