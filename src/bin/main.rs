//! Pack Renderer CLI
//!
//! Render resource pack models, items and structures to thumbnails.

use clap::{Args, Parser, Subcommand};
use pack_renderer::scheduler::count_by_namespace;
use pack_renderer::{
    load_resource_pack, DiskCache, FileSink, Item, ItemCatalog, MemorySink, NamespacedKey,
    RenderConfig, RenderError, RenderRequest, ResourcePack, Sink, TaskScheduler,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pack-renderer")]
#[command(author, version, about = "Render resource pack thumbnails", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct CommonArgs {
    /// Resource pack (ZIP or directory); repeat to layer packs, later ones win
    #[arg(short, long, required = true)]
    pack: Vec<PathBuf>,

    /// JSON render configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, default_value = "out")]
    output: PathBuf,

    /// JSON file of default item components keyed by item id
    #[arg(long)]
    catalog: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a model file (e.g., "minecraft:block/stone")
    Model {
        key: String,
        #[command(flatten)]
        common: CommonArgs,
    },

    /// Render an item through its item model definition
    Item {
        /// Item id (e.g., "minecraft:diamond_sword")
        id: String,

        /// Item components as a JSON object
        #[arg(long)]
        components: Option<String>,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Render a structure template
    Structure {
        key: String,
        #[command(flatten)]
        common: CommonArgs,
    },

    /// Render every item definition that passes the filter
    All {
        #[command(flatten)]
        common: CommonArgs,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {}", e.kind(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> pack_renderer::Result<()> {
    let (common, requests) = match cli.command {
        Commands::Model { key, common } => {
            (common, vec![RenderRequest::Model(NamespacedKey::parse(&key))])
        }
        Commands::Item {
            id,
            components,
            common,
        } => {
            let item = match components {
                Some(json) => {
                    let components: serde_json::Value = serde_json::from_str(&json)?;
                    Item::from_components(id.as_str(), &components)?
                }
                None => Item::new(id.as_str()),
            };
            (common, vec![RenderRequest::Item(item)])
        }
        Commands::Structure { key, common } => {
            (common, vec![RenderRequest::Structure(NamespacedKey::parse(&key))])
        }
        Commands::All { common } => (common, Vec::new()),
    };
    let render_all = requests.is_empty();

    let config = match &common.config {
        Some(path) => RenderConfig::load(path)?,
        None => RenderConfig::default(),
    };
    let pack = load_packs(&common.pack)?;
    println!(
        "Loaded {} models, {} textures from {} pack(s)",
        pack.model_count(),
        pack.texture_count(),
        common.pack.len()
    );

    let catalog = match &common.catalog {
        Some(path) => Some(ItemCatalog::load(path)?),
        None => None,
    };
    let cache = DiskCache::new(
        config
            .cache_dir
            .clone()
            .unwrap_or_else(|| common.output.join(".cache")),
    );
    #[cfg(feature = "net")]
    let profiles = pack_renderer::skin::MojangProfileResolver::new(&cache);

    let mut scheduler = TaskScheduler::new(&pack, config)?.with_cache(&cache);
    #[cfg(feature = "net")]
    {
        scheduler = scheduler.with_profiles(&profiles);
    }
    if let Some(catalog) = &catalog {
        scheduler = scheduler.with_catalog(catalog);
    }

    if render_all {
        scheduler.push_all_items();
    }
    for request in requests {
        scheduler.push(request);
    }
    println!("Rendering {} task(s)...", scheduler.len());

    let mut sink = SummarySink {
        inner: FileSink::new(&common.output),
        seen: MemorySink::new(),
    };
    let written = scheduler.run(&mut sink)?;
    for (namespace, count) in count_by_namespace(&sink.seen.outputs) {
        println!("  {}: {}", namespace, count);
    }
    println!("Wrote {} image(s) to {:?}", written, common.output);
    Ok(())
}

/// Load packs in order, each later pack overriding the ones before it.
fn load_packs(paths: &[PathBuf]) -> pack_renderer::Result<ResourcePack> {
    let mut merged: Option<ResourcePack> = None;
    for path in paths {
        let pack = load_resource_pack(path)?;
        merged = Some(match merged {
            Some(base) => pack.overlay(base),
            None => pack,
        });
    }
    merged.ok_or_else(|| RenderError::Config("no resource pack given".to_string()))
}

/// Writes to disk and remembers output keys for the summary.
struct SummarySink {
    inner: FileSink,
    seen: MemorySink,
}

impl Sink for SummarySink {
    fn emit(&mut self, output: pack_renderer::RenderOutput) -> pack_renderer::Result<()> {
        let record = pack_renderer::RenderOutput {
            key: output.key.clone(),
            path: output.path.clone(),
            format: output.format,
            bytes: Vec::new(),
        };
        self.inner.emit(output)?;
        self.seen.emit(record)
    }
}
