use anyhow::{Context, Result};
use clap::{ArgGroup, Parser, Subcommand};
use serde_json::json;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;

use kpop_recs::content::{GenreFeatures, SimilarityMatrix};
use kpop_recs::models::{ContentMatch, GenreRanking, HybridTrack, TrackDetail};
use kpop_recs::normalize::{Resolution, TrackNameResolver};
use kpop_recs::prepare::genre_labels;
use kpop_recs::progress::{create_spinner, finish_phase, format_duration, init_logging, set_log_only};
use kpop_recs::safety::validate_output_path;
use kpop_recs::{
    content, prepare, rank_by_popularity, recommend_hybrid, Catalog, CombinedTable, RecommenderConfig,
};

#[derive(Parser)]
#[command(name = "kpop-recs")]
#[command(about = "Popularity, content-based and hybrid K-pop recommendations from catalog CSV exports")]
struct Args {
    /// Artists table (CSV)
    #[arg(env = "KPOP_ARTISTS_CSV")]
    artists: PathBuf,

    /// Tracks table (CSV)
    #[arg(env = "KPOP_TRACKS_CSV")]
    tracks: PathBuf,

    /// TOML file with genres, top_n and weights
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of results per list (overrides config top_n)
    #[arg(long)]
    top: Option<usize>,

    /// Hide spinners and log phase summaries instead
    #[arg(long)]
    log_only: bool,

    /// Also write the result as JSON to this file
    #[arg(long)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Top tracks and artists per genre
    Popular {
        /// Genres to rank (default: all configured genres)
        #[arg(long = "genre")]
        genres: Vec<String>,
    },

    /// Tracks similar in genre space to the liked tracks
    Similar {
        #[arg(long = "like", required = true)]
        liked: Vec<String>,

        #[arg(long = "prefer")]
        preferred: Vec<String>,
    },

    /// Popularity and content recommendations combined per genre
    #[command(group(ArgGroup::new("input").args(["liked", "preferred"]).required(true).multiple(true)))]
    Hybrid {
        #[arg(long = "like")]
        liked: Vec<String>,

        #[arg(long = "prefer")]
        preferred: Vec<String>,
    },

    /// List catalog track names, optionally filtered
    Tracks {
        #[arg(long)]
        search: Option<String>,
    },
}

// ============================================================================
// Helpers
// ============================================================================

/// Map typed names onto catalog names; unresolved ones are reported and skipped.
fn resolve_liked(table: &CombinedTable, liked: &[String]) -> (Vec<String>, Vec<(String, Resolution)>) {
    let resolver = TrackNameResolver::new(table.track_names());
    let mut resolved = Vec::new();
    let mut report = Vec::new();
    for query in liked {
        let resolution = resolver.resolve(query);
        match &resolution {
            Resolution::Exact { .. } => {}
            Resolution::Normalized { name } => println!("Using '{}' for '{}'", name, query),
            Resolution::Fuzzy { name, similarity } => {
                println!("Using '{}' for '{}' (similarity {:.2})", name, query, similarity)
            }
            Resolution::Unresolved => println!("No catalog track matches '{}', skipping", query),
        }
        if let Some(name) = resolution.name() {
            resolved.push(name.to_string());
        }
        report.push((query.clone(), resolution));
    }
    (resolved, report)
}

fn print_tracks(tracks: &[TrackDetail]) {
    for (i, track) in tracks.iter().enumerate() {
        println!(
            "  {:>2}. {} - {} [{}] popularity={} {}",
            i + 1,
            track.track_name,
            track.artist_name,
            track.album_name,
            track.track_popularity,
            track.spotify_url()
        );
    }
}

fn print_popular(rankings: &BTreeMap<String, GenreRanking>) {
    for (genre, ranking) in rankings {
        println!("\nTop tracks for {}:", genre);
        println!("{:-<80}", "");
        print_tracks(&ranking.top_tracks);

        println!("\nTop artists for {}:", genre);
        println!("{:-<80}", "");
        for (i, artist) in ranking.top_artists.iter().enumerate() {
            println!(
                "  {:>2}. {} followers={} {}",
                i + 1,
                artist.artist_name,
                artist.followers,
                artist.spotify_url()
            );
        }
    }
}

fn print_similar(matches: &[ContentMatch]) {
    println!("\nContent-based recommendations:");
    println!("{:-<80}", "");
    if matches.is_empty() {
        println!("No recommendations found.");
    }
    for (i, m) in matches.iter().enumerate() {
        let detail = m.row.track_detail();
        println!(
            "  {:>2}. {} - {} similarity={:.3} {}",
            i + 1,
            detail.track_name,
            detail.artist_name,
            m.similarity,
            detail.spotify_url()
        );
    }
}

/// With preferred genres only those are shown. Returns the preferred genres
/// that have no entry at all.
fn retain_preferred(recs: &mut BTreeMap<String, Vec<HybridTrack>>, preferred: &[String]) -> Vec<String> {
    if preferred.is_empty() {
        return Vec::new();
    }
    recs.retain(|genre, _| preferred.contains(genre));
    preferred
        .iter()
        .filter(|genre| !recs.contains_key(genre.as_str()))
        .cloned()
        .collect()
}

fn print_hybrid(recs: &BTreeMap<String, Vec<HybridTrack>>) {
    for (genre, tracks) in recs {
        println!("\nHybrid recommendations for {}:", genre);
        println!("{:-<80}", "");
        if tracks.is_empty() {
            println!("No recommendations found.");
        }
        for (i, t) in tracks.iter().enumerate() {
            println!(
                "  {:>2}. {} - {} score={:.3} ({:?}) {}",
                i + 1,
                t.detail.track_name,
                t.detail.artist_name,
                t.score,
                t.source,
                t.detail.spotify_url()
            );
        }
    }
}

// ============================================================================
// Main
// ============================================================================

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging();
    set_log_only(args.log_only);

    let mut config = match &args.config {
        Some(path) => RecommenderConfig::load(path)?,
        None => RecommenderConfig::default(),
    };
    if let Some(top) = args.top {
        config.top_n = top;
    }
    config.validate().context("Invalid settings")?;

    // Fail before doing any work if the report would clobber an input
    if let Some(output) = &args.output {
        validate_output_path(output, &[args.artists.as_path(), args.tracks.as_path()])?;
    }

    let start = Instant::now();

    let phase = Instant::now();
    let spinner = create_spinner("Phase 1: Loading catalog");
    let catalog = Catalog::load(&args.artists, &args.tracks).context("Failed to load catalog")?;
    finish_phase(
        &spinner,
        "load",
        &format!(
            "Phase 1: Loaded {} artists, {} tracks",
            catalog.artists.len(),
            catalog.tracks.len()
        ),
        phase,
    );

    let phase = Instant::now();
    let spinner = create_spinner("Phase 2: Preparing combined table");
    let table = prepare(&catalog.artists, &catalog.tracks, &config.genres);
    drop(catalog);
    finish_phase(
        &spinner,
        "prepare",
        &format!("Phase 2: {} tracks in combined table", table.len()),
        phase,
    );

    let top_n = config.top_n;
    let report = match &args.command {
        Command::Popular { genres } => {
            let genres = if genres.is_empty() {
                config.genres.clone()
            } else {
                genre_labels(genres)
            };
            let rankings = rank_by_popularity(&table, &genres, top_n);
            print_popular(&rankings);
            json!({ "popular": rankings })
        }

        Command::Similar { liked, preferred } => {
            let (resolved, resolutions) = resolve_liked(&table, liked);
            let preferred = genre_labels(preferred);

            let phase = Instant::now();
            let spinner = create_spinner("Phase 3: Computing track similarities");
            let features = GenreFeatures::build(&table, &config.genres, config.weights());
            let matrix = SimilarityMatrix::from_features(&features);
            finish_phase(
                &spinner,
                "similarity",
                &format!(
                    "Phase 3: {} x {} similarity matrix over {} genres",
                    matrix.len(),
                    matrix.len(),
                    features.genres().len()
                ),
                phase,
            );
            if matrix.is_empty() {
                println!("No tracks carry a recognized genre; nothing to compare.");
            }

            let matches = content::match_with_matrix(
                &table,
                &matrix,
                &resolved,
                Some(preferred.as_slice()),
                top_n,
            );
            print_similar(&matches);
            json!({ "liked": resolutions_json(&resolutions), "similar": matches })
        }

        Command::Hybrid { liked, preferred } => {
            let (resolved, resolutions) = resolve_liked(&table, liked);
            let preferred = genre_labels(preferred);
            for genre in &preferred {
                if !config.genres.contains(genre) {
                    tracing::warn!(genre = %genre, "Preferred genre is not a recognized genre");
                }
            }

            let phase = Instant::now();
            let spinner = create_spinner("Phase 3: Composing hybrid recommendations");
            let mut recs = recommend_hybrid(
                &table,
                &config.genres,
                Some(resolved.as_slice()),
                Some(preferred.as_slice()),
                top_n,
                config.weights(),
                config.blend(),
            );
            finish_phase(
                &spinner,
                "hybrid",
                &format!("Phase 3: {} genres composed", recs.len()),
                phase,
            );

            let missing = retain_preferred(&mut recs, &preferred);
            print_hybrid(&recs);
            for genre in &missing {
                println!("\nNo recommendations available for genre {}", genre);
            }
            json!({ "liked": resolutions_json(&resolutions), "hybrid": recs })
        }

        Command::Tracks { search } => {
            let resolver = TrackNameResolver::new(table.track_names());
            let names = resolver.search(search.as_deref().unwrap_or(""));
            println!("\n{} of {} catalog tracks:", names.len(), resolver.len());
            println!("{:-<80}", "");
            for name in &names {
                println!("  {}", name);
            }
            json!({ "tracks": names })
        }
    };

    if let Some(output) = &args.output {
        let body = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        std::fs::write(output, body)
            .with_context(|| format!("Failed to write report to {:?}", output))?;
        println!("\nWrote report to {:?}", output);
    }

    println!("\n{:=<60}", "");
    println!("Done in {}", format_duration(start.elapsed()));
    println!("{:=<60}", "");

    Ok(())
}

fn resolutions_json(resolutions: &[(String, Resolution)]) -> serde_json::Value {
    resolutions
        .iter()
        .map(|(query, resolution)| json!({ "query": query, "resolution": resolution }))
        .collect()
}
