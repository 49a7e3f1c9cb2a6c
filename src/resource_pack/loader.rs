//! Resource pack loading from ZIP files and directories.

use super::texture::{load_texture_from_bytes, parse_mcmeta, AnimationMeta};
use super::{AssetKind, BlockstateDefinition, ResourcePack};
use crate::atlas::AtlasDefinition;
use crate::error::{RenderError, Result};
use crate::types::NamespacedKey;
use std::io::Read;
use std::path::Path;

/// Load a resource pack from a file path.
///
/// Supports both ZIP files (including client jars) and directories.
pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<ResourcePack> {
    let path = path.as_ref();
    tracing::info!("loading resource pack {}", path.display());

    if path.is_dir() {
        load_from_directory(path)
    } else {
        let data = std::fs::read(path)?;
        load_from_bytes(&data)
    }
}

/// Load a resource pack from bytes (ZIP data).
pub fn load_from_bytes(data: &[u8]) -> Result<ResourcePack> {
    let cursor = std::io::Cursor::new(data);
    let mut archive = zip::ZipArchive::new(cursor)?;

    let mut loader = PackLoader::default();
    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        if file.is_dir() {
            continue;
        }
        let file_path = file.name().to_string();
        if parse_asset_path(&file_path).is_none() {
            continue;
        }
        let mut contents = Vec::new();
        file.read_to_end(&mut contents)?;
        loader.ingest(&file_path, &contents);
    }

    Ok(loader.finish())
}

/// Load a resource pack from a directory.
fn load_from_directory(path: &Path) -> Result<ResourcePack> {
    if !path.join("assets").exists() && !path.join("data").exists() {
        return Err(RenderError::schema(
            path.display().to_string(),
            "no assets or data directory found",
        ));
    }

    let mut loader = PackLoader::default();
    walk_directory(path, path, &mut |relative, contents| {
        loader.ingest(relative, contents)
    })?;
    Ok(loader.finish())
}

fn walk_directory<F>(base: &Path, dir: &Path, handler: &mut F) -> Result<()>
where
    F: FnMut(&str, &[u8]),
{
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            walk_directory(base, &path, handler)?;
            continue;
        }
        let Ok(relative) = path.strip_prefix(base) else {
            continue;
        };
        let relative = relative.to_string_lossy().replace('\\', "/");
        if parse_asset_path(&relative).is_some() {
            let data = std::fs::read(&path)?;
            handler(&relative, &data);
        }
    }
    Ok(())
}

/// Accumulates pack files in any order.
#[derive(Default)]
struct PackLoader {
    pack: ResourcePack,
    // mcmeta may be read before its PNG
    pending_mcmeta: Vec<(NamespacedKey, AnimationMeta)>,
}

impl PackLoader {
    fn ingest(&mut self, file_path: &str, contents: &[u8]) {
        let Some((root, namespace, asset_type, asset_path)) = parse_asset_path(file_path) else {
            return;
        };

        match (root, asset_type) {
            ("assets", "models") => {
                if let Some(path) = asset_path.strip_suffix(".json") {
                    let key = NamespacedKey::new(namespace, path);
                    match serde_json::from_slice(contents) {
                        Ok(value) => self.pack.add_model(key, value),
                        Err(e) => self.pack.mark_invalid(AssetKind::Model, key, e),
                    }
                }
            }
            ("assets", "items") => {
                if let Some(path) = asset_path.strip_suffix(".json") {
                    let key = NamespacedKey::new(namespace, path);
                    match serde_json::from_slice(contents) {
                        Ok(value) => self.pack.add_item_definition(key, value),
                        Err(e) => self.pack.mark_invalid(AssetKind::ItemDefinition, key, e),
                    }
                }
            }
            ("assets", "blockstates") => {
                if let Some(path) = asset_path.strip_suffix(".json") {
                    let key = NamespacedKey::new(namespace, path);
                    match serde_json::from_slice::<BlockstateDefinition>(contents) {
                        Ok(def) => self.pack.add_blockstate(key, def),
                        Err(e) => self.pack.mark_invalid(AssetKind::Blockstate, key, e),
                    }
                }
            }
            ("assets", "atlases") => {
                if let Some(path) = asset_path.strip_suffix(".json") {
                    let key = NamespacedKey::new(namespace, path);
                    match serde_json::from_slice::<AtlasDefinition>(contents) {
                        Ok(def) => self.pack.add_atlas(key, def),
                        Err(e) => self.pack.mark_invalid(AssetKind::Atlas, key, e),
                    }
                }
            }
            ("assets", "textures") => {
                if let Some(path) = asset_path.strip_suffix(".png.mcmeta") {
                    let key = NamespacedKey::new(namespace, path);
                    let parsed = std::str::from_utf8(contents)
                        .map_err(|e| e.to_string())
                        .and_then(|s| parse_mcmeta(s).map_err(|e| e.to_string()));
                    match parsed {
                        Ok(Some(meta)) => self.pending_mcmeta.push((key, meta)),
                        Ok(None) => {}
                        Err(e) => tracing::warn!("failed to parse {}: {}", file_path, e),
                    }
                } else if let Some(path) = asset_path.strip_suffix(".png") {
                    let key = NamespacedKey::new(namespace, path);
                    match load_texture_from_bytes(contents) {
                        Ok(texture) => self.pack.add_texture(key, texture),
                        Err(e) => self.pack.mark_invalid(AssetKind::Texture, key, e),
                    }
                }
            }
            ("data", "structure" | "structures") => {
                if let Some(path) = asset_path.strip_suffix(".nbt") {
                    self.pack
                        .add_structure(NamespacedKey::new(namespace, path), contents.to_vec());
                }
            }
            ("data", "tags") => {
                if let Some(path) = asset_path.strip_suffix(".json") {
                    let key = NamespacedKey::new(namespace, path);
                    match parse_tag(contents) {
                        Ok(values) => self.pack.add_tag(key, values),
                        Err(e) => self.pack.mark_invalid(AssetKind::Tag, key, e),
                    }
                }
            }
            _ => {}
        }
    }

    fn finish(mut self) -> ResourcePack {
        for (key, meta) in self.pending_mcmeta {
            match self.pack.textures.get_mut(&key) {
                Some(texture) => std::sync::Arc::make_mut(texture).animation = Some(meta),
                None => tracing::debug!("mcmeta without texture: {}", key),
            }
        }
        tracing::info!(
            "loaded {} models, {} item definitions, {} blockstates, {} textures",
            self.pack.models.len(),
            self.pack.item_definitions.len(),
            self.pack.blockstates.len(),
            self.pack.textures.len()
        );
        self.pack
    }
}

fn parse_tag(contents: &[u8]) -> std::result::Result<Vec<String>, serde_json::Error> {
    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum TagEntry {
        Plain(String),
        Optional { id: String },
    }

    #[derive(serde::Deserialize)]
    struct TagFile {
        #[serde(default)]
        values: Vec<TagEntry>,
    }

    let file: TagFile = serde_json::from_slice(contents)?;
    Ok(file
        .values
        .into_iter()
        .map(|entry| match entry {
            TagEntry::Plain(s) | TagEntry::Optional { id: s } => s,
        })
        .collect())
}

/// Split a pack file path into (root, namespace, asset_type, asset_path).
/// Expected format: `assets|data/{namespace}/{type}/{path}`.
fn parse_asset_path(file_path: &str) -> Option<(&str, &str, &str, &str)> {
    let parts: Vec<&str> = file_path.splitn(4, '/').collect();

    if parts.len() == 4 && matches!(parts[0], "assets" | "data") && !parts[3].is_empty() {
        Some((parts[0], parts[1], parts[2], parts[3]))
    } else {
        None
    }
}
