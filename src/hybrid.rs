//! Hybrid recommendations: popularity ranking and content matches per genre.

use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

use crate::config::GenreWeights;
use crate::content::match_by_content;
use crate::models::{ContentMatch, HybridSource, HybridTrack, TrackDetail};
use crate::popularity::rank_by_popularity;
use crate::prepare::{genre_labels, CombinedTable};
use crate::scoring::{blend_score, BlendWeights};

/// Union of the genre's popularity tracks and the content matches, one entry
/// per Track ID, ordered by blend score and capped at `top_n`.
///
/// Popularity runs on the preferred genres when given (all genres otherwise);
/// content matching runs once over the whole genre list. Every genre in
/// `genres` gets an entry keyed by its canonical label, and content matches
/// are not restricted to the genre they are listed under.
pub fn recommend_hybrid(
    table: &CombinedTable,
    genres: &[String],
    liked_tracks: Option<&[String]>,
    preferred_genres: Option<&[String]>,
    top_n: usize,
    weights: Option<&GenreWeights>,
    blend: BlendWeights,
) -> BTreeMap<String, Vec<HybridTrack>> {
    let genres = genre_labels(genres);
    let preferred_genres = preferred_genres.map(genre_labels).filter(|p| !p.is_empty());
    let preferred_genres = preferred_genres.as_deref();
    let liked_tracks = liked_tracks.filter(|l| !l.is_empty());

    let popularity = rank_by_popularity(table, preferred_genres.unwrap_or(&genres), top_n);
    tracing::debug!(
        genres = ?popularity.keys().collect::<Vec<_>>(),
        "Genres available in popularity recommendations"
    );

    let content: Vec<ContentMatch> = match liked_tracks {
        Some(liked) => match_by_content(table, &genres, liked, preferred_genres, top_n, weights),
        None => Vec::new(),
    };

    let mut recommendations = BTreeMap::new();
    for genre in &genres {
        let popular: &[TrackDetail] = match popularity.get(genre) {
            Some(ranking) => &ranking.top_tracks,
            None => {
                tracing::warn!(genre = %genre, "Genre not found in popularity recommendations");
                &[]
            }
        };
        recommendations.insert(genre.clone(), compose(popular, &content, top_n, blend));
    }
    recommendations
}

/// Merge both lists on Track ID, score, stable-sort and truncate.
pub fn compose(
    popular: &[TrackDetail],
    content: &[ContentMatch],
    top_n: usize,
    blend: BlendWeights,
) -> Vec<HybridTrack> {
    let mut merged: Vec<HybridTrack> = Vec::with_capacity(popular.len() + content.len());
    let mut by_id: FxHashMap<&str, usize> = FxHashMap::default();

    for detail in popular {
        if by_id.contains_key(detail.track_id.as_str()) {
            continue;
        }
        by_id.insert(detail.track_id.as_str(), merged.len());
        merged.push(HybridTrack {
            detail: detail.clone(),
            similarity: None,
            score: 0.0,
            source: HybridSource::Popularity,
        });
    }

    for m in content {
        match by_id.get(m.row.track_id.as_str()) {
            Some(&idx) => {
                let entry = &mut merged[idx];
                entry.similarity = Some(entry.similarity.map_or(m.similarity, |s| s.max(m.similarity)));
                if entry.source == HybridSource::Popularity {
                    entry.source = HybridSource::Both;
                }
            }
            None => {
                by_id.insert(m.row.track_id.as_str(), merged.len());
                merged.push(HybridTrack {
                    detail: m.row.track_detail(),
                    similarity: Some(m.similarity),
                    score: 0.0,
                    source: HybridSource::Content,
                });
            }
        }
    }

    for entry in &mut merged {
        entry.score = blend_score(entry.detail.track_popularity, entry.similarity, blend);
    }
    merged.sort_by(|a, b| b.score.total_cmp(&a.score));
    merged.truncate(top_n);
    merged
}
