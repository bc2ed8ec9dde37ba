//! Catalog analytics as JSON: artist comparisons per genre, track popularity
//! per artist and album, album sizes, followers per artist.
//!
//! Usage: catalog-stats <artists.csv> <tracks.csv> [--genre G]... [--top N]

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;

use kpop_recs::analytics::catalog_report;
use kpop_recs::prepare::genre_labels;
use kpop_recs::progress::{create_spinner, finish_phase, init_logging, set_log_only};
use kpop_recs::{Catalog, CombinedTable, RecommenderConfig};

#[derive(Parser)]
#[command(name = "catalog-stats")]
#[command(about = "Print catalog analytics for the artist and track exports as JSON")]
struct Args {
    #[arg(env = "KPOP_ARTISTS_CSV")]
    artists: PathBuf,

    #[arg(env = "KPOP_TRACKS_CSV")]
    tracks: PathBuf,

    /// Genres to compare artists in (default: all configured genres)
    #[arg(long = "genre")]
    genres: Vec<String>,

    #[arg(long, default_value = "10")]
    top: usize,

    /// TOML file supplying the recognized genre list
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    log_only: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging();
    set_log_only(args.log_only);

    let config = match &args.config {
        Some(path) => RecommenderConfig::load(path)?,
        None => RecommenderConfig::default(),
    };

    let phase = Instant::now();
    let spinner = create_spinner("Loading catalog");
    let catalog = Catalog::load(&args.artists, &args.tracks).context("Failed to load catalog")?;
    // Analytics read the exploded table, one row per (track, genre)
    let table = CombinedTable::build(&catalog.artists, &catalog.tracks, &config.genres);
    finish_phase(
        &spinner,
        "load",
        &format!("{} combined rows", table.len()),
        phase,
    );

    let genres: Vec<String> = if args.genres.is_empty() {
        config.genres.clone()
    } else {
        genre_labels(&args.genres)
    };

    let report = catalog_report(&table, &genres, args.top);
    let body = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
    println!("{}", body);

    Ok(())
}
