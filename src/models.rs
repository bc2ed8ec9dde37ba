//! Core data models for the recommendation pipeline.
//!
//! Source records (`Artist`, `Track`) deserialize straight from the catalog
//! CSV exports. `CombinedRow` is the denormalized join produced by
//! [`crate::prepare`]; everything downstream reads it and never mutates it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::catalog::{de_u32, de_u64};

/// Base URL for track links shown next to recommendations
pub const SPOTIFY_TRACK_URL: &str = "https://open.spotify.com/track/";

/// Base URL for artist profile links
pub const SPOTIFY_ARTIST_URL: &str = "https://open.spotify.com/artist/";

// ============================================================================
// Source Records
// ============================================================================

/// Raw artist record from the artists table.
///
/// The same artist usually appears several times (once per genre query that
/// surfaced it); preparation collapses those by `artist_id`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Artist {
    #[serde(rename = "Artist Name")]
    pub artist_name: String,
    #[serde(rename = "Artist ID")]
    pub artist_id: String,
    #[serde(rename = "Popularity", deserialize_with = "de_u32", default)]
    pub popularity: u32, // 0-100
    #[serde(rename = "Followers", deserialize_with = "de_u64", default)]
    pub followers: u64,
    /// Delimited tag list, e.g. "k-pop, k-pop girl group". May be empty.
    #[serde(rename = "Genres", default)]
    pub genres: String,
    #[serde(rename = "Genre Queried", default)]
    pub genre_queried: Option<String>,
    #[serde(rename = "Artist Image", default)]
    pub artist_image: Option<String>,
}

/// Raw track record from the tracks table.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Track {
    #[serde(rename = "Track Name")]
    pub track_name: String,
    #[serde(rename = "Track ID")]
    pub track_id: String,
    #[serde(rename = "Duration (ms)", deserialize_with = "de_u64", default)]
    pub duration_ms: u64,
    #[serde(rename = "Popularity", deserialize_with = "de_u32", default)]
    pub popularity: u32, // 0-100
    #[serde(rename = "Track Number", deserialize_with = "de_u32", default)]
    pub track_number: u32,
    #[serde(rename = "URI", default)]
    pub uri: String,
    #[serde(rename = "Album Name", default)]
    pub album_name: String,
    #[serde(rename = "Album ID", default)]
    pub album_id: String,
    /// Credited artists joined with ", " (the export calls this column "Artists")
    #[serde(rename = "Artists", alias = "Artist Name")]
    pub artist_name: String,
    /// Stable foreign key, only present in newer exports
    #[serde(rename = "Artist ID", default)]
    pub artist_id: Option<String>,
    #[serde(rename = "Genre Queried", default)]
    pub genre_queried: Option<String>,
    #[serde(rename = "Track Image", default)]
    pub track_image: Option<String>,
}

// ============================================================================
// Combined Table Row
// ============================================================================

/// One track joined with one (artist, genre tag) pair.
///
/// `genre` is the tag this row was exploded from; `genres` is the full set of
/// recognized tags of the joined artist, so genre filters keep working after
/// the table has been deduplicated down to one row per track.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct CombinedRow {
    // Track side
    pub track_name: String,
    pub track_id: String,
    pub duration_ms: u64,
    pub track_popularity: u32,
    pub track_number: u32,
    pub uri: String,
    pub album_name: String,
    pub album_id: String,
    pub artist_name: String,
    pub track_gq: Option<String>,
    pub track_image: Option<String>,

    // Artist side
    pub artist_id: String,
    pub artist_popularity: u32,
    pub followers: u64,
    pub artist_gq: Option<String>,
    pub artist_image: Option<String>,

    // Genre
    pub genre: String,
    pub genres: BTreeSet<String>,
}

impl CombinedRow {
    /// Join a track with one tag of its artist
    pub fn join(track: &Track, artist: &Artist, genre: &str, genres: &BTreeSet<String>) -> Self {
        Self {
            track_name: track.track_name.clone(),
            track_id: track.track_id.clone(),
            duration_ms: track.duration_ms,
            track_popularity: track.popularity,
            track_number: track.track_number,
            uri: track.uri.clone(),
            album_name: track.album_name.clone(),
            album_id: track.album_id.clone(),
            artist_name: track.artist_name.clone(),
            track_gq: track.genre_queried.clone(),
            track_image: track.track_image.clone(),
            artist_id: artist.artist_id.clone(),
            artist_popularity: artist.popularity,
            followers: artist.followers,
            artist_gq: artist.genre_queried.clone(),
            artist_image: artist.artist_image.clone(),
            genre: genre.to_string(),
            genres: genres.clone(),
        }
    }

    pub fn has_genre(&self, genre: &str) -> bool {
        self.genres.contains(genre)
    }

    pub fn track_detail(&self) -> TrackDetail {
        TrackDetail {
            track_name: self.track_name.clone(),
            track_id: self.track_id.clone(),
            artist_name: self.artist_name.clone(),
            album_name: self.album_name.clone(),
            track_image: self.track_image.clone(),
            track_popularity: self.track_popularity,
        }
    }

    pub fn artist_detail(&self) -> ArtistDetail {
        ArtistDetail {
            artist_name: self.artist_name.clone(),
            artist_id: self.artist_id.clone(),
            followers: self.followers,
            artist_image: self.artist_image.clone(),
        }
    }
}

// ============================================================================
// Recommendation Outputs
// ============================================================================

/// Track columns shown in ranked lists
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct TrackDetail {
    pub track_name: String,
    pub track_id: String,
    pub artist_name: String,
    pub album_name: String,
    pub track_image: Option<String>,
    pub track_popularity: u32,
}

impl TrackDetail {
    pub fn spotify_url(&self) -> String {
        format!("{}{}", SPOTIFY_TRACK_URL, self.track_id)
    }
}

/// Artist columns shown in ranked lists
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ArtistDetail {
    pub artist_name: String,
    pub artist_id: String,
    pub followers: u64,
    pub artist_image: Option<String>,
}

impl ArtistDetail {
    pub fn spotify_url(&self) -> String {
        format!("{}{}", SPOTIFY_ARTIST_URL, self.artist_id)
    }
}

/// Popularity ranking for a single genre
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct GenreRanking {
    pub top_tracks: Vec<TrackDetail>,
    pub top_artists: Vec<ArtistDetail>,
}

/// A content-based recommendation: the track's first combined row plus the
/// best cosine similarity it reached against any liked track.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ContentMatch {
    #[serde(flatten)]
    pub row: CombinedRow,
    pub similarity: f64,
}

/// Which recommender contributed a hybrid entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HybridSource {
    Popularity,
    Content,
    Both,
}

/// Hybrid entry for one genre
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HybridTrack {
    #[serde(flatten)]
    pub detail: TrackDetail,
    pub similarity: Option<f64>, // None for popularity-only entries
    pub score: f64,
    pub source: HybridSource,
}
