//! Catalog analytics over the combined table.
//!
//! Aggregates used for exploring a catalog: artist comparisons within a
//! genre, average track popularity per artist and per album, album sizes,
//! average followers per artist. All rankings are descending by the metric
//! with ties in first-appearance order.

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::models::CombinedRow;
use crate::prepare::{genre_label, unique_in_order, CombinedTable};

// ============================================================================
// Output Rows
// ============================================================================

/// Artist within a genre with both of its reach metrics
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ArtistReach {
    pub artist_name: String,
    pub artist_id: String,
    pub followers: u64,
    pub artist_popularity: u32,
}

/// Top artists of one genre by followers and by artist popularity
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ArtistComparison {
    pub genre: String,
    pub by_followers: Vec<ArtistReach>,
    pub by_popularity: Vec<ArtistReach>,
}

/// Average track popularity of an artist plus its most popular track
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ArtistTrackPopularity {
    pub artist_name: String,
    pub average_track_popularity: f64,
    pub top_track_name: String,
    pub top_album_name: String,
    pub top_track_popularity: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AlbumTrackCount {
    pub album_name: String,
    pub tracks: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AlbumPopularity {
    pub album_name: String,
    pub average_track_popularity: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ArtistFollowers {
    pub artist_name: String,
    pub average_followers: f64,
}

/// Everything `catalog-stats` reports
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CatalogReport {
    pub rows: usize,
    pub tracks: usize,
    pub artist_comparisons: Vec<ArtistComparison>,
    pub top_artists_by_track_popularity: Vec<ArtistTrackPopularity>,
    pub top_albums_by_track_popularity: Vec<AlbumPopularity>,
    pub top_artists_by_followers: Vec<ArtistFollowers>,
    pub tracks_per_album: Vec<AlbumTrackCount>,
}

// ============================================================================
// Grouping Helper
// ============================================================================

/// Running mean per key, keys kept in first-appearance order
struct MeanGroups<'a> {
    order: Vec<&'a str>,
    sums: FxHashMap<&'a str, (f64, usize)>,
}

impl<'a> MeanGroups<'a> {
    fn new() -> Self {
        Self {
            order: Vec::new(),
            sums: FxHashMap::default(),
        }
    }

    fn add(&mut self, key: &'a str, value: f64) {
        let entry = self.sums.entry(key).or_insert_with(|| {
            self.order.push(key);
            (0.0, 0)
        });
        entry.0 += value;
        entry.1 += 1;
    }

    /// (key, mean) sorted descending by mean, ties in first-appearance order
    fn ranked(&self) -> Vec<(&'a str, f64)> {
        let mut means: Vec<(&'a str, f64)> = self
            .order
            .iter()
            .map(|key| {
                let (sum, count) = self.sums[key];
                (*key, sum / count as f64)
            })
            .collect();
        means.sort_by(|a, b| b.1.total_cmp(&a.1));
        means
    }
}

// ============================================================================
// Aggregations
// ============================================================================

/// Top `top_n` artists exploded on exactly `genre`, by followers and by
/// artist popularity.
pub fn artist_comparison(table: &CombinedTable, genre: &str, top_n: usize) -> ArtistComparison {
    let genre = genre_label(genre);
    let artists: Vec<ArtistReach> = unique_in_order(
        table
            .rows()
            .iter()
            .filter(|row| row.genre == genre)
            .map(|row| ArtistReach {
                artist_name: row.artist_name.clone(),
                artist_id: row.artist_id.clone(),
                followers: row.followers,
                artist_popularity: row.artist_popularity,
            }),
    );

    let mut by_followers = artists.clone();
    by_followers.sort_by(|a, b| b.followers.cmp(&a.followers));
    by_followers.truncate(top_n);

    let mut by_popularity = artists;
    by_popularity.sort_by(|a, b| b.artist_popularity.cmp(&a.artist_popularity));
    by_popularity.truncate(top_n);

    ArtistComparison {
        genre,
        by_followers,
        by_popularity,
    }
}

/// Artists ranked by mean track popularity, each with its most popular track
/// (first one on ties).
pub fn top_artists_by_track_popularity(table: &CombinedTable, top_n: usize) -> Vec<ArtistTrackPopularity> {
    let mut groups = MeanGroups::new();
    let mut best_rows = FxHashMap::default();
    for row in table.rows() {
        groups.add(&row.artist_name, row.track_popularity as f64);
        best_rows
            .entry(row.artist_name.as_str())
            .and_modify(|best: &mut &CombinedRow| {
                if row.track_popularity > best.track_popularity {
                    *best = row;
                }
            })
            .or_insert(row);
    }

    groups
        .ranked()
        .into_iter()
        .take(top_n)
        .map(|(artist, mean)| {
            let best = best_rows[artist];
            ArtistTrackPopularity {
                artist_name: artist.to_string(),
                average_track_popularity: mean,
                top_track_name: best.track_name.clone(),
                top_album_name: best.album_name.clone(),
                top_track_popularity: best.track_popularity,
            }
        })
        .collect()
}

/// Row count per album, in first-appearance order
pub fn tracks_per_album(table: &CombinedTable) -> Vec<AlbumTrackCount> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: FxHashMap<&str, usize> = FxHashMap::default();
    for row in table.rows() {
        *counts.entry(row.album_name.as_str()).or_insert_with(|| {
            order.push(row.album_name.as_str());
            0
        }) += 1;
    }
    order
        .into_iter()
        .map(|album| AlbumTrackCount {
            album_name: album.to_string(),
            tracks: counts[album],
        })
        .collect()
}

pub fn top_albums_by_track_popularity(table: &CombinedTable, top_n: usize) -> Vec<AlbumPopularity> {
    let mut groups = MeanGroups::new();
    for row in table.rows() {
        groups.add(&row.album_name, row.track_popularity as f64);
    }
    groups
        .ranked()
        .into_iter()
        .take(top_n)
        .map(|(album, mean)| AlbumPopularity {
            album_name: album.to_string(),
            average_track_popularity: mean,
        })
        .collect()
}

pub fn top_artists_by_followers(table: &CombinedTable, top_n: usize) -> Vec<ArtistFollowers> {
    let mut groups = MeanGroups::new();
    for row in table.rows() {
        groups.add(&row.artist_name, row.followers as f64);
    }
    groups
        .ranked()
        .into_iter()
        .take(top_n)
        .map(|(artist, mean)| ArtistFollowers {
            artist_name: artist.to_string(),
            average_followers: mean,
        })
        .collect()
}

/// Full report for the given genres
pub fn catalog_report(table: &CombinedTable, genres: &[String], top_n: usize) -> CatalogReport {
    CatalogReport {
        rows: table.len(),
        tracks: table.dedup_tracks().len(),
        artist_comparisons: genres
            .iter()
            .map(|genre| artist_comparison(table, genre, top_n))
            .collect(),
        top_artists_by_track_popularity: top_artists_by_track_popularity(table, top_n),
        top_albums_by_track_popularity: top_albums_by_track_popularity(table, top_n),
        top_artists_by_followers: top_artists_by_followers(table, top_n),
        tracks_per_album: tracks_per_album(table),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{genres, row};

    fn sample_table() -> CombinedTable {
        let mut ballad = row("Love Poem", "t3", 60, "IU", 9_000, &["k-pop ballad", "k-pop"]);
        ballad.artist_popularity = 90;
        let mut iu = row("Blueming", "t2", 80, "IU", 9_000, &["k-pop", "k-pop ballad"]);
        iu.artist_popularity = 90;
        let mut bts = row("Dynamite", "t1", 90, "BTS", 70_000, &["k-pop"]);
        bts.artist_popularity = 85;
        let mut bts_b = row("Butter", "t4", 70, "BTS", 70_000, &["k-pop"]);
        bts_b.artist_popularity = 85;
        bts_b.album_name = "BTS album".to_string();
        CombinedTable::from_rows(vec![bts, iu, ballad, bts_b])
    }

    #[test]
    fn test_artist_comparison() {
        let comparison = artist_comparison(&sample_table(), "k-pop", 10);

        let followers: Vec<&str> = comparison.by_followers.iter().map(|a| a.artist_name.as_str()).collect();
        let popularity: Vec<&str> = comparison.by_popularity.iter().map(|a| a.artist_name.as_str()).collect();
        assert_eq!(followers, vec!["BTS", "IU"]);
        assert_eq!(popularity, vec!["IU", "BTS"]);

        // Exact genre column match, not tag membership
        let ballad = artist_comparison(&sample_table(), "k-pop ballad", 10);
        assert_eq!(ballad.by_followers.len(), 1);
        assert_eq!(ballad.by_followers[0].artist_name, "IU");
    }

    #[test]
    fn test_artist_comparison_label_case() {
        let comparison = artist_comparison(&sample_table(), " K-Pop Ballad", 10);

        assert_eq!(comparison.genre, "k-pop ballad");
        assert_eq!(comparison.by_followers.len(), 1);
        assert_eq!(comparison.by_followers[0].artist_name, "IU");
    }

    #[test]
    fn test_top_artists_by_track_popularity() {
        let ranked = top_artists_by_track_popularity(&sample_table(), 10);

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].artist_name, "BTS");
        assert_eq!(ranked[0].average_track_popularity, 80.0);
        assert_eq!(ranked[0].top_track_name, "Dynamite");
        assert_eq!(ranked[1].artist_name, "IU");
        assert_eq!(ranked[1].average_track_popularity, 70.0);
        assert_eq!(ranked[1].top_track_name, "Blueming");
        assert_eq!(ranked[1].top_album_name, "IU album");
    }

    #[test]
    fn test_tracks_per_album() {
        let counts = tracks_per_album(&sample_table());
        assert_eq!(
            counts,
            vec![
                AlbumTrackCount { album_name: "BTS album".to_string(), tracks: 2 },
                AlbumTrackCount { album_name: "IU album".to_string(), tracks: 2 },
            ]
        );
    }

    #[test]
    fn test_top_albums_and_followers() {
        let table = sample_table();

        let albums = top_albums_by_track_popularity(&table, 1);
        assert_eq!(albums.len(), 1);
        assert_eq!(albums[0].album_name, "BTS album");
        assert_eq!(albums[0].average_track_popularity, 80.0);

        let followers = top_artists_by_followers(&table, 10);
        assert_eq!(followers[0].artist_name, "BTS");
        assert_eq!(followers[0].average_followers, 70_000.0);
        assert_eq!(followers[1].average_followers, 9_000.0);
    }

    #[test]
    fn test_catalog_report() {
        let report = catalog_report(&sample_table(), &genres(&["k-pop", "trot"]), 5);

        assert_eq!(report.rows, 4);
        assert_eq!(report.tracks, 4);
        assert_eq!(report.artist_comparisons.len(), 2);
        assert!(report.artist_comparisons[1].by_followers.is_empty());
    }
}
