//! Markerpack CLI - Command-line tool for inspecting and re-exporting
//! overlay marker packs.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use markerpack::prelude::*;
use markerpack::OutputMethod;

/// Markerpack - overlay marker pack tool
#[derive(Parser)]
#[command(name = "markerpack")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Attribute and element prefix to strip while parsing (repeatable)
    #[arg(long = "vendor-prefix", global = true)]
    vendor_prefixes: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a summary of a pack
    Info {
        /// Pack directory or archive
        #[arg(env = "MARKERPACK_INPUT")]
        pack: PathBuf,
    },

    /// List the category tree
    Categories {
        /// Pack directory or archive
        #[arg(env = "MARKERPACK_INPUT")]
        pack: PathBuf,

        /// Only list namespaces matching this glob pattern
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// List markers and trails
    Pois {
        /// Pack directory or archive
        #[arg(env = "MARKERPACK_INPUT")]
        pack: PathBuf,

        /// Only load this map
        #[arg(short, long)]
        map: Option<i32>,

        /// Print one JSON object per line
        #[arg(long)]
        json: bool,
    },

    /// Re-export a pack in the optimized per-map layout
    Export {
        /// Pack directory or archive
        #[arg(env = "MARKERPACK_INPUT")]
        pack: PathBuf,

        /// Output directory
        #[arg(short, long, env = "MARKERPACK_OUTPUT")]
        output: PathBuf,

        /// Write a single .taco archive instead of a directory
        #[arg(short, long)]
        archive: bool,

        /// Rename categories to short names before writing
        #[arg(long)]
        shorten: bool,

        /// Leave mapid out of the map files
        #[arg(long)]
        skip_map_id: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = cli
        .vendor_prefixes
        .iter()
        .fold(ReaderSettings::default(), |s, prefix| s.with_vendor_prefix(prefix.as_str()));

    match cli.command {
        Commands::Info { pack } => {
            cmd_info(&pack, settings)?;
        }
        Commands::Categories { pack, filter } => {
            cmd_categories(&pack, settings, filter.as_deref())?;
        }
        Commands::Pois { pack, map, json } => {
            cmd_pois(&pack, settings, map, json)?;
        }
        Commands::Export {
            pack,
            output,
            archive,
            shorten,
            skip_map_id,
        } => {
            let method = if archive {
                OutputMethod::Archive
            } else {
                OutputMethod::Directory
            };
            let writer = WriterSettings::default()
                .with_output(method)
                .with_skip_map_id(skip_map_id);
            cmd_export(&pack, settings, &output, writer, shorten)?;
        }
    }

    Ok(())
}

fn open_pack(path: &Path, settings: ReaderSettings) -> Result<Pack> {
    let pack = Pack::open(path)
        .with_context(|| format!("Failed to open pack {}", path.display()))?
        .with_settings(settings);
    Ok(pack)
}

/// Load every document of `pack`, showing a progress bar.
fn load_with_progress(pack: &Pack) -> Result<PackCollection> {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let cancel = AtomicBool::new(false);
    let collection = pack
        .load_all_with(
            |done, total, path| {
                pb.set_length(total as u64);
                pb.set_position(done as u64);
                pb.set_message(path.to_string());
            },
            &cancel,
        )
        .context("Failed to load pack")?;

    pb.finish_and_clear();
    Ok(collection)
}

fn cmd_info(path: &Path, settings: ReaderSettings) -> Result<()> {
    let pack = open_pack(path, settings)?;
    let documents = pack.documents().context("Failed to list overlay documents")?;

    let start = Instant::now();
    let collection = load_with_progress(&pack)?;
    let elapsed = start.elapsed();

    let pois = collection.pois();
    let count = |kind: PoiKind| pois.iter().filter(|p| p.kind() == kind).count();
    let uncategorized = pois.iter().filter(|p| p.category().is_none()).count();

    println!("Pack:        {}", pack.name());
    println!("Layout:      {}", if pack.is_optimized() { "optimized" } else { "full" });
    println!("Documents:   {}", documents.len());
    println!("Categories:  {}", collection.categories().len());
    println!("Markers:     {}", count(PoiKind::Marker));
    println!("Trails:      {}", count(PoiKind::Trail));
    println!("No category: {}", uncategorized);

    let maps: Vec<String> = collection.map_ids().iter().map(i32::to_string).collect();
    println!("Maps:        {}", maps.join(", "));
    println!("\nLoaded in {:?}", elapsed);

    Ok(())
}

fn cmd_categories(path: &Path, settings: ReaderSettings, filter: Option<&str>) -> Result<()> {
    let pattern = filter
        .map(glob::Pattern::new)
        .transpose()
        .context("Invalid filter pattern")?;
    let options = glob::MatchOptions {
        case_sensitive: false,
        ..Default::default()
    };

    let pack = open_pack(path, settings)?;
    let collection = load_with_progress(&pack)?;
    let tree = collection.categories();

    let mut count = 0;
    for id in tree.iter() {
        let namespace = tree.namespace(id);
        if let Some(pattern) = &pattern {
            if !pattern.matches_with(namespace, options) {
                continue;
            }
        }

        let category = &tree[id];
        let mut flags = String::new();
        if category.is_separator() {
            flags.push_str(" [separator]");
        }
        if category.is_hidden() {
            flags.push_str(" [hidden]");
        }
        if !category.default_toggle() {
            flags.push_str(" [off]");
        }

        println!(
            "{:<48} {:>6}  {}{}",
            namespace,
            category.members().len(),
            category.display_name(),
            flags
        );
        count += 1;
    }

    println!("\nTotal: {} categories", count);

    Ok(())
}

fn cmd_pois(path: &Path, settings: ReaderSettings, map: Option<i32>, json: bool) -> Result<()> {
    let pack = open_pack(path, settings)?;
    let collection = match map {
        Some(map_id) => pack
            .load_map(map_id)
            .with_context(|| format!("Failed to load map {map_id}"))?,
        None => load_with_progress(&pack)?,
    };
    let tree = collection.categories();

    for poi in collection.pois() {
        let namespace = poi.category().map(|c| tree.namespace(c)).unwrap_or_default();

        if json {
            let attributes: serde_json::Map<String, serde_json::Value> = tree
                .aggregated_all(poi)
                .iter()
                .map(|a| {
                    let value = a.value().as_static().unwrap_or_default();
                    (a.name().to_string(), serde_json::Value::from(value))
                })
                .collect();

            let line = serde_json::json!({
                "kind": poi.kind().to_string(),
                "type": namespace,
                "mapid": poi.map_id(),
                "points": poi.trail().map(|t| t.point_count()),
                "attributes": attributes,
            });
            println!("{line}");
        } else {
            let points = poi
                .trail()
                .map(|t| format!(" ({} points)", t.point_count()))
                .unwrap_or_default();
            println!("{:>6} {:<7} {}{}", poi.map_id(), poi.kind(), namespace, points);
        }
    }

    if !json {
        println!("\nTotal: {} POIs", collection.pois().len());
    }

    Ok(())
}

fn cmd_export(
    path: &Path,
    settings: ReaderSettings,
    output: &Path,
    writer: WriterSettings,
    shorten: bool,
) -> Result<()> {
    println!("Loading pack: {}", path.display());

    let start = Instant::now();
    let pack = open_pack(path, settings)?;
    let mut collection = load_with_progress(&pack)?;

    println!(
        "Loaded {} categories and {} POIs in {:?}",
        collection.categories().len(),
        collection.pois().len(),
        start.elapsed()
    );

    if shorten {
        ShortenNamespace
            .apply(&mut collection)
            .context("Failed to shorten category names")?;
    }

    fs::create_dir_all(output).context("Failed to create output directory")?;

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("pack");
    let name = match writer.output {
        OutputMethod::Archive => format!("{stem}.taco"),
        OutputMethod::Directory => stem.to_string(),
    };

    let start = Instant::now();
    let written = PackWriter::new(writer)
        .write(&collection, pack.resources(), output, &name)
        .context("Failed to export pack")?;

    println!("Exported to {} in {:?}", written.display(), start.elapsed());

    Ok(())
}
