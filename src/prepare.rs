//! Data preparation: explode artist genres, join tracks, deduplicate.
//!
//! The resulting [`CombinedTable`] is built once and then only read.

use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeSet;
use std::hash::Hash;

use crate::models::{Artist, CombinedRow, Track};

/// Separator between tags in the artist "Genres" column
pub static GENRE_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*,\s*").unwrap());

/// Separator between credited artists in the track "Artists" column
pub const CREDIT_SEPARATOR: &str = ", ";

/// Canonical form of a genre label: trimmed and lowercased
pub fn genre_label(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Canonical labels in first occurrence order, blanks and repeats dropped.
pub fn genre_labels<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut labels: Vec<String> = Vec::new();
    for label in raw {
        let label = genre_label(label.as_ref());
        if !label.is_empty() && !labels.contains(&label) {
            labels.push(label);
        }
    }
    labels
}

/// Split a raw genre cell into canonical tags (first occurrence order).
pub fn split_genres(raw: &str) -> Vec<String> {
    genre_labels(GENRE_SEPARATOR.split(raw.trim()))
}

/// First credited artist, when the credit list names more than one
pub fn primary_credit(credits: &str) -> Option<&str> {
    credits
        .split(CREDIT_SEPARATOR)
        .next()
        .map(str::trim)
        .filter(|primary| !primary.is_empty() && *primary != credits)
}

/// Keep the first occurrence of every distinct item.
pub(crate) fn unique_in_order<T, I>(items: I) -> Vec<T>
where
    T: Eq + Hash + Clone,
    I: IntoIterator<Item = T>,
{
    let mut seen: FxHashSet<T> = FxHashSet::default();
    let mut out = Vec::new();
    for item in items {
        if !seen.contains(&item) {
            seen.insert(item.clone());
            out.push(item);
        }
    }
    out
}

// ============================================================================
// Artist Index
// ============================================================================

/// An artist with the recognized subset of its genre tags
struct TaggedArtist<'a> {
    artist: &'a Artist,
    tags: Vec<String>,
    tag_set: BTreeSet<String>,
}

/// Join index over artists, collapsed by Artist ID.
struct ArtistIndex<'a> {
    tagged: Vec<TaggedArtist<'a>>,
    /// Every artist ID in the catalog, tagged or not
    known_ids: FxHashSet<&'a str>,
    by_id: FxHashMap<&'a str, usize>,
    by_name: FxHashMap<&'a str, Vec<usize>>,
}

impl<'a> ArtistIndex<'a> {
    fn build(artists: &'a [Artist], recognized: &FxHashSet<String>) -> Self {
        let mut index = ArtistIndex {
            tagged: Vec::new(),
            known_ids: FxHashSet::default(),
            by_id: FxHashMap::default(),
            by_name: FxHashMap::default(),
        };
        let mut ids_per_name: FxHashMap<&str, FxHashSet<&str>> = FxHashMap::default();

        for artist in artists {
            ids_per_name
                .entry(artist.artist_name.as_str())
                .or_default()
                .insert(artist.artist_id.as_str());

            // Same artist surfaced by several genre queries: first record wins
            if !index.known_ids.insert(artist.artist_id.as_str()) {
                continue;
            }

            let tags: Vec<String> = split_genres(&artist.genres)
                .into_iter()
                .filter(|tag| recognized.contains(tag))
                .collect();
            if tags.is_empty() {
                continue;
            }

            let idx = index.tagged.len();
            index.by_id.insert(artist.artist_id.as_str(), idx);
            index
                .by_name
                .entry(artist.artist_name.as_str())
                .or_default()
                .push(idx);
            let tag_set = tags.iter().cloned().collect();
            index.tagged.push(TaggedArtist {
                artist,
                tags,
                tag_set,
            });
        }

        let mut ambiguous: Vec<&str> = ids_per_name
            .iter()
            .filter(|(_, ids)| ids.len() > 1)
            .map(|(name, _)| *name)
            .collect();
        ambiguous.sort_unstable();
        for name in ambiguous {
            tracing::warn!(
                artist = name,
                "Artist name maps to several artist IDs; name-joined tracks may be misattributed"
            );
        }

        index
    }

    /// Artists a track joins with.
    ///
    /// A known Artist ID is authoritative. Otherwise the exact credit string is
    /// tried, then the primary credited artist.
    fn matches(&self, track: &Track) -> &[usize] {
        if let Some(id) = track.artist_id.as_deref().filter(|id| !id.is_empty()) {
            if self.known_ids.contains(id) {
                return match self.by_id.get(id) {
                    Some(idx) => std::slice::from_ref(idx),
                    None => &[],
                };
            }
        }

        if let Some(found) = self.by_name.get(track.artist_name.as_str()) {
            return found;
        }

        match primary_credit(&track.artist_name).and_then(|primary| self.by_name.get(primary)) {
            Some(found) => found,
            None => &[],
        }
    }
}

// ============================================================================
// Combined Table
// ============================================================================

/// Denormalized track x artist-genre table
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CombinedTable {
    rows: Vec<CombinedRow>,
}

impl CombinedTable {
    pub fn from_rows(rows: Vec<CombinedRow>) -> Self {
        Self { rows }
    }

    /// Explode, filter and join (steps a-d) and drop fully duplicated rows.
    ///
    /// Genre labels are compared trimmed and lowercased. Tracks whose artist
    /// has no recognized tag are dropped.
    pub fn build(artists: &[Artist], tracks: &[Track], genres: &[String]) -> Self {
        let recognized: FxHashSet<String> = genre_labels(genres).into_iter().collect();
        let index = ArtistIndex::build(artists, &recognized);

        let mut rows = Vec::new();
        let mut unmatched = 0usize;
        for track in tracks {
            let matches = index.matches(track);
            if matches.is_empty() {
                unmatched += 1;
                continue;
            }
            for &idx in matches {
                let tagged = &index.tagged[idx];
                for tag in &tagged.tags {
                    rows.push(CombinedRow::join(track, tagged.artist, tag, &tagged.tag_set));
                }
            }
        }

        tracing::debug!(
            joined = rows.len(),
            unmatched,
            "Joined tracks with artist genres"
        );

        Self {
            rows: unique_in_order(rows),
        }
    }

    /// Keep the first row per (Track Name, Track ID, URI).
    pub fn dedup_tracks(&self) -> Self {
        let mut seen: FxHashSet<(&str, &str, &str)> = FxHashSet::default();
        let rows = self
            .rows
            .iter()
            .filter(|row| {
                seen.insert((
                    row.track_name.as_str(),
                    row.track_id.as_str(),
                    row.uri.as_str(),
                ))
            })
            .cloned()
            .collect();
        Self { rows }
    }

    pub fn rows(&self) -> &[CombinedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows carrying `genre` in their tag set. `genre` must be canonical
    /// (see [`genre_label`]).
    pub fn rows_with_genre<'a>(&'a self, genre: &'a str) -> impl Iterator<Item = &'a CombinedRow> + 'a {
        self.rows.iter().filter(move |row| row.has_genre(genre))
    }

    /// Distinct track names in table order
    pub fn track_names(&self) -> Vec<&str> {
        unique_in_order(self.rows.iter().map(|row| row.track_name.as_str()))
    }

    /// First row of every distinct track name
    pub fn first_rows_by_name(&self) -> FxHashMap<&str, &CombinedRow> {
        let mut first: FxHashMap<&str, &CombinedRow> = FxHashMap::default();
        for row in &self.rows {
            first.entry(row.track_name.as_str()).or_insert(row);
        }
        first
    }
}

/// Full preparation: build the combined table and deduplicate it per track.
pub fn prepare(artists: &[Artist], tracks: &[Track], genres: &[String]) -> CombinedTable {
    let combined = CombinedTable::build(artists, tracks, genres);
    let deduped = combined.dedup_tracks();
    tracing::info!(
        rows = combined.len(),
        tracks = deduped.len(),
        "Prepared combined table"
    );
    deduped
}
