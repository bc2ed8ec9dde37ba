//! Popularity-based ranking per genre.

use std::collections::BTreeMap;

use crate::models::{ArtistDetail, GenreRanking, TrackDetail};
use crate::prepare::{genre_label, genre_labels, unique_in_order, CombinedTable};

/// Top tracks (by Track Popularity) and top artists (by Followers) for each
/// requested genre.
///
/// Labels are keyed in canonical form. Genres with no rows are logged and
/// left out of the mapping. Ties keep table order.
pub fn rank_by_popularity(
    table: &CombinedTable,
    genres: &[String],
    top_n: usize,
) -> BTreeMap<String, GenreRanking> {
    let mut rankings = BTreeMap::new();
    for genre in genre_labels(genres) {
        match rank_genre(table, &genre, top_n) {
            Some(ranking) => {
                rankings.insert(genre, ranking);
            }
            None => tracing::warn!(genre = %genre, "No data available for genre"),
        }
    }
    rankings
}

/// Ranking for one genre, `None` when no row carries it.
pub fn rank_genre(table: &CombinedTable, genre: &str, top_n: usize) -> Option<GenreRanking> {
    let genre = genre_label(genre);
    let rows: Vec<_> = table.rows_with_genre(&genre).collect();
    if rows.is_empty() {
        return None;
    }

    let mut top_tracks: Vec<TrackDetail> = unique_in_order(rows.iter().map(|r| r.track_detail()));
    top_tracks.sort_by(|a, b| b.track_popularity.cmp(&a.track_popularity));
    top_tracks.truncate(top_n);

    let mut top_artists: Vec<ArtistDetail> = unique_in_order(rows.iter().map(|r| r.artist_detail()));
    top_artists.sort_by(|a, b| b.followers.cmp(&a.followers));
    top_artists.truncate(top_n);

    Some(GenreRanking {
        top_tracks,
        top_artists,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prepare::prepare;
    use crate::testutil::{artist, genres, row, track};

    fn sample_table() -> CombinedTable {
        CombinedTable::from_rows(vec![
            row("Next Level", "t1", 80, "aespa", 5_000_000, &["k-pop", "k-pop girl group"]),
            row("Savage", "t2", 40, "aespa", 5_000_000, &["k-pop", "k-pop girl group"]),
            row("Love Dive", "t3", 90, "IVE", 7_000_000, &["k-pop girl group"]),
            row("Eleven", "t4", 90, "IVE", 7_000_000, &["k-pop girl group"]),
            row("Antifragile", "t5", 60, "LE SSERAFIM", 6_000_000, &["k-pop"]),
        ])
    }

    #[test]
    fn test_top_one_kpop_track() {
        let table = CombinedTable::from_rows(vec![
            row("Hit", "t1", 80, "A", 100, &["k-pop"]),
            row("Miss", "t2", 40, "B", 100, &["k-pop"]),
        ]);

        let recs = rank_by_popularity(&table, &genres(&["k-pop"]), 1);

        let tracks = &recs["k-pop"].top_tracks;
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].track_name, "Hit");
        assert_eq!(tracks[0].track_popularity, 80);
    }

    #[test]
    fn test_absent_genre_is_omitted() {
        let recs = rank_by_popularity(&sample_table(), &genres(&["x-pop", "k-pop"]), 5);

        assert!(!recs.contains_key("x-pop"));
        assert!(recs.contains_key("k-pop"));
    }

    #[test]
    fn test_tracks_sorted_and_capped() {
        let table = sample_table();
        for top_n in 1..=6 {
            let recs = rank_by_popularity(&table, &genres(&["k-pop", "k-pop girl group"]), top_n);
            for ranking in recs.values() {
                assert!(ranking.top_tracks.len() <= top_n);
                assert!(ranking
                    .top_tracks
                    .windows(2)
                    .all(|w| w[0].track_popularity >= w[1].track_popularity));
                assert!(ranking.top_artists.len() <= top_n);
                assert!(ranking
                    .top_artists
                    .windows(2)
                    .all(|w| w[0].followers >= w[1].followers));
            }
        }
    }

    #[test]
    fn test_ties_keep_table_order() {
        let recs = rank_by_popularity(&sample_table(), &genres(&["k-pop girl group"]), 2);

        let names: Vec<&str> = recs["k-pop girl group"]
            .top_tracks
            .iter()
            .map(|t| t.track_name.as_str())
            .collect();
        assert_eq!(names, vec!["Love Dive", "Eleven"]);
    }

    #[test]
    fn test_artist_follower_ties_keep_table_order() {
        let table = CombinedTable::from_rows(vec![
            row("Hype Boy", "t1", 50, "NewJeans", 1_000, &["k-pop"]),
            row("Fearless", "t2", 60, "LE SSERAFIM", 1_000, &["k-pop"]),
            row("Kitsch", "t3", 70, "IVE", 1_000, &["k-pop"]),
            row("Drama", "t4", 80, "aespa", 500, &["k-pop"]),
        ]);

        let recs = rank_by_popularity(&table, &genres(&["k-pop"]), 2);

        let artists: Vec<&str> = recs["k-pop"]
            .top_artists
            .iter()
            .map(|a| a.artist_name.as_str())
            .collect();
        assert_eq!(artists, vec!["NewJeans", "LE SSERAFIM"]);
    }

    #[test]
    fn test_prepared_table_with_mixed_case_labels() {
        let artists = vec![artist("IU", "a1", 100, "k-pop")];
        let tracks = vec![track("Blueming", "t1", "IU", 70), track("Love Poem", "t2", "IU", 60)];
        let labels = genres(&["K-Pop", " Trot"]);

        let table = prepare(&artists, &tracks, &labels);
        let recs = rank_by_popularity(&table, &labels, 5);

        assert_eq!(table.len(), 2);
        assert_eq!(recs.keys().collect::<Vec<_>>(), vec!["k-pop"]);
        assert_eq!(recs["k-pop"].top_tracks.len(), 2);
        assert!(rank_genre(&table, " K-POP ", 1).is_some());
    }

    #[test]
    fn test_artists_deduplicated() {
        let recs = rank_by_popularity(&sample_table(), &genres(&["k-pop"]), 10);

        let artists: Vec<&str> = recs["k-pop"]
            .top_artists
            .iter()
            .map(|a| a.artist_name.as_str())
            .collect();
        assert_eq!(artists, vec!["LE SSERAFIM", "aespa"]);
    }

    #[test]
    fn test_exploded_rows_do_not_duplicate_tracks() {
        let mut second = row("Next Level", "t1", 80, "aespa", 5_000_000, &["k-pop", "k-pop girl group"]);
        second.genre = "k-pop girl group".to_string();
        let table = CombinedTable::from_rows(vec![
            row("Next Level", "t1", 80, "aespa", 5_000_000, &["k-pop", "k-pop girl group"]),
            second,
        ]);

        let recs = rank_by_popularity(&table, &genres(&["k-pop"]), 10);

        assert_eq!(recs["k-pop"].top_tracks.len(), 1);
        assert_eq!(
            recs["k-pop"].top_tracks[0].spotify_url(),
            "https://open.spotify.com/track/t1"
        );
    }
}
