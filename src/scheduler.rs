//! Render task scheduling.
//!
//! Requests are queued, then rendered one at a time in insertion order.
//! Each request is first reduced to a scene (all asset lookups, skin
//! downloads and tree evaluation happen here), then drawn once per
//! animation keyframe into a fresh frame target, encoded, and handed to the
//! sink before the next request starts.

use crate::animation::AnimationUnroller;
use crate::atlas::AtlasResolver;
use crate::cache::{render_cache_key, Cache};
use crate::config::{AnimationMode, FilterSet, RenderConfig};
use crate::error::{RenderError, Result};
use crate::export::{encode_animated_webp, encode_png, OutputFormat};
use crate::item::{Item, ItemCatalog};
use crate::item_model::{ItemModelEvaluator, SpecialModelFactory};
use crate::mesher::{bind_model, DrawList, GeometryBuilder, Mesh, Rgb, TextureSource, TintResolver};
use crate::raster::{Camera, FrameTarget, Rasterizer};
use crate::resolver::ModelResolver;
use crate::resource_pack::{AssetKind, Model, ResourcePack, TextureData};
use crate::skin::ProfileResolver;
use crate::structure::{Structure, StructureRenderer};
use crate::types::NamespacedKey;
use image::RgbaImage;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// What to render.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderRequest {
    /// A model file, drawn with its own `gui` transform.
    Model(NamespacedKey),
    /// An item stack, through its item model definition.
    Item(Item),
    /// A structure template, fitted into one block's footprint.
    Structure(NamespacedKey),
}

impl RenderRequest {
    /// Key the output is stored under.
    pub fn output_key(&self) -> NamespacedKey {
        match self {
            RenderRequest::Model(key) => key.clone(),
            RenderRequest::Item(item) => item.id.with_prefix("item/"),
            RenderRequest::Structure(key) => key.with_prefix("structure/"),
        }
    }

    /// Key matched against `filter` and `special_filter`.
    pub fn source_key(&self) -> &NamespacedKey {
        match self {
            RenderRequest::Model(key) | RenderRequest::Structure(key) => key,
            RenderRequest::Item(item) => &item.id,
        }
    }
}

/// One model draw within a scene.
#[derive(Debug, Clone)]
pub struct ScenePart {
    pub model: Model,
    /// Resolved color per tint index.
    pub tints: Vec<Rgb>,
    pub geometry: GeometryBuilder,
    pub camera: Camera,
}

/// An encoded image ready for the sink.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOutput {
    pub key: NamespacedKey,
    /// Explicit destination from `special_filter`.
    pub path: Option<String>,
    pub format: OutputFormat,
    pub bytes: Vec<u8>,
}

impl RenderOutput {
    /// `<ns>/<path>.<ext>`, or the explicit path.
    pub fn relative_path(&self) -> PathBuf {
        match &self.path {
            Some(path) => PathBuf::from(path),
            None => Path::new(self.key.namespace())
                .join(format!("{}.{}", self.key.path(), self.format.extension())),
        }
    }
}

/// Destination for rendered images.
pub trait Sink {
    fn emit(&mut self, output: RenderOutput) -> Result<()>;
}

/// Writes outputs under a directory.
pub struct FileSink {
    root: PathBuf,
}

impl FileSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Sink for FileSink {
    fn emit(&mut self, output: RenderOutput) -> Result<()> {
        let path = self.root.join(output.relative_path());
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, &output.bytes)?;
        tracing::info!("wrote {}", path.display());
        Ok(())
    }
}

/// Collects outputs in memory, in emit order.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub outputs: Vec<RenderOutput>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &NamespacedKey) -> Option<&RenderOutput> {
        self.outputs.iter().find(|o| &o.key == key)
    }

    /// Decoded image of a PNG output.
    pub fn image(&self, key: &NamespacedKey) -> Option<RgbaImage> {
        let output = self.get(key)?;
        image::load_from_memory(&output.bytes).ok().map(|i| i.to_rgba8())
    }
}

impl Sink for MemorySink {
    fn emit(&mut self, output: RenderOutput) -> Result<()> {
        self.outputs.push(output);
        Ok(())
    }
}

/// State shared by every task of a run.
pub struct RenderContext<'a> {
    pack: &'a ResourcePack,
    config: RenderConfig,
    filter: FilterSet,
    /// Paletted permutation outputs, generated once per run.
    derived: HashMap<NamespacedKey, Arc<TextureData>>,
    rasterizer: Rasterizer,
    rng: StdRng,
    cache: Option<&'a dyn Cache>,
    profiles: Option<&'a dyn ProfileResolver>,
    catalog: Option<&'a ItemCatalog>,
}

impl<'a> RenderContext<'a> {
    pub fn new(pack: &'a ResourcePack, config: RenderConfig) -> Result<Self> {
        config.validate()?;
        let filter = config.compile_filter(|tag| {
            pack.expand_tag("item", tag)
                .iter()
                .map(ToString::to_string)
                .collect()
        })?;
        let derived = AtlasResolver::new(pack, config.resolve_vanilla_atlas).resolve();
        tracing::debug!("{} derived atlas textures", derived.len());
        Ok(Self {
            pack,
            rasterizer: Rasterizer::new(config.light),
            rng: StdRng::seed_from_u64(config.structure_seed),
            config,
            filter,
            derived,
            cache: None,
            profiles: None,
            catalog: None,
        })
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Reduce a request to the model draws it consists of.
    fn scene(&mut self, request: &RenderRequest) -> Result<Vec<ScenePart>> {
        let models = ModelResolver::new(self.pack);
        match request {
            RenderRequest::Model(key) => {
                let model = models.resolve(key)?;
                Ok(vec![ScenePart {
                    camera: Camera::gui(&model),
                    model,
                    tints: Vec::new(),
                    geometry: GeometryBuilder::new(),
                }])
            }
            RenderRequest::Item(item) => {
                let mut item = item.clone();
                if let Some(catalog) = self.catalog {
                    item.fill(catalog);
                }
                let mut specials = SpecialModelFactory::new();
                if let Some(profiles) = self.profiles {
                    specials = specials.with_profiles(profiles);
                }
                let layers = ItemModelEvaluator::new(&models)
                    .with_specials(specials)
                    .evaluate_item(&item)?;
                let tints = TintResolver::new(self.pack);
                Ok(layers
                    .into_iter()
                    .map(|layer| ScenePart {
                        camera: Camera::gui(&layer.model),
                        tints: layer.tints.iter().map(|t| tints.resolve(t, &item)).collect(),
                        model: layer.model,
                        geometry: GeometryBuilder::new(),
                    })
                    .collect())
            }
            RenderRequest::Structure(key) => {
                let bytes = self.pack.require_structure(key)?;
                let structure = Structure::parse(bytes, &AssetKind::Structure.file_path(key))?;
                StructureRenderer::new(&models, self.config.colorize_blocks).scene(&structure, &mut self.rng)
            }
        }
    }

    /// Render one request. `None` when the request is filtered out.
    pub fn render(&mut self, request: &RenderRequest) -> Result<Option<RenderOutput>> {
        let source = request.source_key().to_string();
        let explicit_path = self.config.special_filter.get(&source).cloned();
        if explicit_path.is_none() && !self.filter.accepts(&source) {
            tracing::debug!("skipping {} (filtered)", source);
            return Ok(None);
        }

        let parts = self.scene(request)?;
        let meshes = parts
            .iter()
            .map(|part| part.geometry.build_model(&part.model))
            .collect::<Result<Vec<Mesh>>>()?;

        let textures = TextureSource::new(self.pack, &self.derived, self.config.transparent_missingno);
        let model_refs: Vec<&Model> = parts.iter().map(|p| &p.model).collect();
        let mut keyframes = AnimationUnroller::new(&textures).unroll(&model_refs);
        let animate = self.config.animation_mode == AnimationMode::Webp && keyframes.len() > 1;
        if !animate {
            keyframes.truncate(1);
        }

        let mut key = request.output_key();
        if let Some(namespace) = &self.config.save_namespace {
            key = NamespacedKey::new(namespace.clone(), key.path());
        }

        let size = self.config.render_size;
        let mut frames = Vec::with_capacity(keyframes.len());
        let mut cache_key = None;
        for keyframe in &keyframes {
            let lists: Vec<DrawList> = parts
                .iter()
                .zip(&meshes)
                .enumerate()
                .map(|(i, (part, mesh))| {
                    let model = keyframe.apply(i, &part.model);
                    bind_model(&model, mesh.clone(), &part.tints, &textures)
                })
                .collect();

            if !animate && self.config.use_cache {
                if let Some(cache) = self.cache {
                    let k = self.cache_key(&parts, &lists)?;
                    if let Some(bytes) = cache.get(&k) {
                        tracing::debug!("cache hit for {}", key);
                        return Ok(Some(RenderOutput {
                            key,
                            path: explicit_path,
                            format: OutputFormat::Png,
                            bytes,
                        }));
                    }
                    cache_key = Some(k);
                }
            }

            let mut target = FrameTarget::new(size)?;
            for (part, list) in parts.iter().zip(&lists) {
                self.rasterizer.draw(&mut target, list, &part.camera);
            }
            frames.push((target.read_pixels(), keyframe.duration));
        }

        let (format, bytes) = if animate {
            (
                OutputFormat::Webp,
                encode_animated_webp(&frames, self.config.animation_framerate)?,
            )
        } else {
            let (image, _) = frames
                .first()
                .ok_or_else(|| RenderError::Gl(format!("nothing rendered for {}", key)))?;
            (OutputFormat::Png, encode_png(image)?)
        };

        if let (Some(cache), Some(k)) = (self.cache, cache_key) {
            cache.put(&k, &bytes)?;
        }

        Ok(Some(RenderOutput {
            key,
            path: explicit_path,
            format,
            bytes,
        }))
    }

    fn cache_key(&self, parts: &[ScenePart], lists: &[DrawList]) -> Result<String> {
        let mut json = String::new();
        for part in parts {
            json.push_str(&part.model.to_json()?);
        }
        let mut seen = HashSet::new();
        let textures = lists
            .iter()
            .flat_map(|l| l.quads.iter())
            .flat_map(|q| q.layers.iter())
            .filter(|layer| seen.insert(Arc::as_ptr(&layer.texture)))
            .map(|layer| layer.texture.as_ref());
        Ok(render_cache_key(
            &json,
            textures,
            self.config.render_size,
            &self.config.minecraft_version,
        ))
    }
}

/// Runs queued requests against one render context.
pub struct TaskScheduler<'a> {
    context: RenderContext<'a>,
    queue: VecDeque<RenderRequest>,
}

impl<'a> TaskScheduler<'a> {
    pub fn new(pack: &'a ResourcePack, config: RenderConfig) -> Result<Self> {
        Ok(Self {
            context: RenderContext::new(pack, config)?,
            queue: VecDeque::new(),
        })
    }

    pub fn with_cache(mut self, cache: &'a dyn Cache) -> Self {
        self.context.cache = Some(cache);
        self
    }

    pub fn with_profiles(mut self, profiles: &'a dyn ProfileResolver) -> Self {
        self.context.profiles = Some(profiles);
        self
    }

    /// Default components merged into item requests.
    pub fn with_catalog(mut self, catalog: &'a ItemCatalog) -> Self {
        self.context.catalog = Some(catalog);
        self
    }

    pub fn push(&mut self, request: RenderRequest) {
        self.queue.push_back(request);
    }

    /// Queue every item that has a definition in the pack, in key order.
    pub fn push_all_items(&mut self) {
        let mut keys: Vec<&NamespacedKey> = self.context.pack.item_definitions.keys().collect();
        keys.sort();
        for key in keys {
            self.queue.push_back(RenderRequest::Item(Item::new(key.clone())));
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn context(&self) -> &RenderContext<'a> {
        &self.context
    }

    /// Render the queue in order, writing each output before the next task
    /// starts. Stops at the first error; earlier outputs stay written.
    pub fn run(&mut self, sink: &mut dyn Sink) -> Result<usize> {
        let mut written = 0;
        while let Some(request) = self.queue.pop_front() {
            let key = request.output_key();
            match self.context.render(&request) {
                Ok(Some(output)) => {
                    sink.emit(output)?;
                    written += 1;
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!("render of {} failed, {} tasks dropped", key, self.queue.len());
                    self.queue.clear();
                    return Err(e);
                }
            }
        }
        Ok(written)
    }
}

/// Outputs grouped by namespace, for summaries.
pub fn count_by_namespace(outputs: &[RenderOutput]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for output in outputs {
        *counts.entry(output.key.namespace().to_string()).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use serde_json::json;

    fn pack() -> ResourcePack {
        let mut pack = ResourcePack::new();
        pack.add_model(
            "block/cube",
            json!({
                "textures": { "all": "block/white" },
                "display": { "gui": { "rotation": [0, 180, 0], "scale": [1, 1, 1] } },
                "elements": [{ "from": [0, 0, 0], "to": [16, 16, 16],
                    "faces": { "north": { "texture": "#all" } } }]
            }),
        );
        pack.add_texture("block/white", TextureData::solid(16, 16, [255, 255, 255, 255]));
        pack
    }

    fn config() -> RenderConfig {
        RenderConfig {
            render_size: 16,
            ..RenderConfig::default()
        }
    }

    #[test]
    fn test_outputs_in_insertion_order() {
        let pack = pack();
        let mut scheduler = TaskScheduler::new(&pack, config()).unwrap();
        scheduler.push(RenderRequest::Model(NamespacedKey::parse("block/cube")));
        scheduler.push(RenderRequest::Model(NamespacedKey::parse("custom:block/cube")));
        scheduler.push(RenderRequest::Model(NamespacedKey::parse("block/cube")));

        let mut sink = MemorySink::new();
        let err = scheduler.run(&mut sink).unwrap_err();
        assert_eq!(err.kind(), "AssetNotFound");
        // the first output was committed before the failing task
        assert_eq!(sink.outputs.len(), 1);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_filter_and_special_filter() {
        let pack = pack();
        let mut config = config();
        config.filter = vec!["*:item/*".to_string()];
        config
            .special_filter
            .insert("minecraft:block/cube".to_string(), "icons/cube.png".to_string());
        let mut scheduler = TaskScheduler::new(&pack, config).unwrap();
        scheduler.push(RenderRequest::Model(NamespacedKey::parse("block/cube")));
        scheduler.push(RenderRequest::Model(NamespacedKey::parse("block/other")));

        let mut sink = MemorySink::new();
        assert_eq!(scheduler.run(&mut sink).unwrap(), 1);
        assert_eq!(sink.outputs[0].relative_path(), PathBuf::from("icons/cube.png"));
    }

    #[test]
    fn test_cache_hit_skips_render() {
        let pack = pack();
        let cache = MemoryCache::new();
        let mut config = config();
        config.use_cache = true;

        let mut first = MemorySink::new();
        let mut scheduler = TaskScheduler::new(&pack, config.clone()).unwrap().with_cache(&cache);
        scheduler.push(RenderRequest::Model(NamespacedKey::parse("block/cube")));
        scheduler.run(&mut first).unwrap();
        assert_eq!(cache.len(), 1);

        let mut second = MemorySink::new();
        let mut scheduler = TaskScheduler::new(&pack, config).unwrap().with_cache(&cache);
        scheduler.push(RenderRequest::Model(NamespacedKey::parse("block/cube")));
        scheduler.run(&mut second).unwrap();
        assert_eq!(first.outputs[0].bytes, second.outputs[0].bytes);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_save_namespace_and_file_sink() {
        let pack = pack();
        let dir = tempfile::tempdir().unwrap();
        let mut config = config();
        config.save_namespace = Some("thumbs".to_string());
        let mut scheduler = TaskScheduler::new(&pack, config).unwrap();
        scheduler.push(RenderRequest::Model(NamespacedKey::parse("block/cube")));
        scheduler.run(&mut FileSink::new(dir.path())).unwrap();
        assert!(dir.path().join("thumbs/block/cube.png").is_file());
    }

    #[test]
    fn test_item_tag_filter() {
        let mut pack = pack();
        for id in ["gem", "stick"] {
            pack.add_item_definition(
                id,
                json!({ "model": { "type": "minecraft:model", "model": "minecraft:block/cube" } }),
            );
        }
        pack.add_tag("item/shiny", vec!["gem".into()]);
        let mut config = config();
        config.filter = vec!["#shiny".to_string()];

        let mut scheduler = TaskScheduler::new(&pack, config).unwrap();
        scheduler.push_all_items();
        let mut sink = MemorySink::new();
        assert_eq!(scheduler.run(&mut sink).unwrap(), 1);
        assert_eq!(sink.outputs[0].key, NamespacedKey::parse("item/gem"));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let pack = pack();
        let mut config = config();
        config.animation_framerate = 25;
        assert_eq!(
            TaskScheduler::new(&pack, config).err().map(|e| e.kind()),
            Some("ConfigError")
        );
    }

    #[test]
    fn test_output_keys() {
        let item = RenderRequest::Item(Item::new("custom:gem"));
        assert_eq!(item.output_key(), NamespacedKey::parse("custom:item/gem"));
        let structure = RenderRequest::Structure(NamespacedKey::parse("village/house"));
        assert_eq!(structure.output_key().path(), "structure/village/house");
    }
}
