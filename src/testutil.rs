//! Fixture builders shared by unit tests.

use std::collections::BTreeSet;

use crate::models::{Artist, CombinedRow, Track};

pub fn genres(labels: &[&str]) -> Vec<String> {
    labels.iter().map(|s| s.to_string()).collect()
}

pub fn artist(name: &str, id: &str, followers: u64, genres: &str) -> Artist {
    Artist {
        artist_name: name.to_string(),
        artist_id: id.to_string(),
        popularity: 50,
        followers,
        genres: genres.to_string(),
        genre_queried: Some("k-pop".to_string()),
        artist_image: Some(format!("https://i.scdn.co/image/{}", id)),
    }
}

pub fn track(name: &str, id: &str, artist: &str, popularity: u32) -> Track {
    Track {
        track_name: name.to_string(),
        track_id: id.to_string(),
        duration_ms: 200_000,
        popularity,
        track_number: 1,
        uri: format!("spotify:track:{}", id),
        album_name: format!("{} album", artist),
        album_id: format!("album-{}", artist),
        artist_name: artist.to_string(),
        artist_id: None,
        genre_queried: Some("k-pop".to_string()),
        track_image: None,
    }
}

/// A combined row exploded on the first tag of `tags`
pub fn row(
    track_name: &str,
    track_id: &str,
    popularity: u32,
    artist_name: &str,
    followers: u64,
    tags: &[&str],
) -> CombinedRow {
    let t = track(track_name, track_id, artist_name, popularity);
    let a = artist(artist_name, &format!("id-{}", artist_name), followers, &tags.join(", "));
    let tag_set: BTreeSet<String> = tags.iter().map(|s| s.to_string()).collect();
    CombinedRow::join(&t, &a, tags.first().copied().unwrap_or(""), &tag_set)
}
