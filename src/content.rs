//! Content-based matching on genre-membership vectors.
//!
//! Every distinct track name gets one vector with a column per recognized
//! genre. A row contributes 1 to each column whose genre is in its tag set,
//! and rows sharing a track name are summed, so tracks exploded over several
//! rows end up with small counts rather than 0/1 indicators. Similarity is the
//! cosine of those vectors.
//!
//! The feature matrix and similarity matrix are derived values; the combined
//! table itself is never touched.

use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeMap;

use crate::config::GenreWeights;
use crate::models::{CombinedRow, ContentMatch};
use crate::prepare::{genre_label, genre_labels, CombinedTable};
use crate::scoring::{cosine_similarity, norm};

/// Catch-all tag that only filters when asked for by name
pub const UMBRELLA_GENRE: &str = "k-pop";

// ============================================================================
// Feature Matrix
// ============================================================================

/// Genre vectors pivoted by track name (rows sorted by name)
#[derive(Debug, Clone, PartialEq)]
pub struct GenreFeatures {
    genres: Vec<String>,
    names: Vec<String>,
    vectors: Vec<Vec<f64>>,
}

impl GenreFeatures {
    /// Encode, pivot and optionally weight. Weights for genres outside the
    /// column list are ignored.
    pub fn build(table: &CombinedTable, genres: &[String], weights: Option<&GenreWeights>) -> Self {
        let genres = genre_labels(genres);
        let mut pivot: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
        for row in table.rows() {
            let vector = pivot
                .entry(row.track_name.as_str())
                .or_insert_with(|| vec![0.0; genres.len()]);
            for (col, genre) in genres.iter().enumerate() {
                if row.has_genre(genre) {
                    vector[col] += 1.0;
                }
            }
        }

        if let Some(weights) = weights {
            let by_label: FxHashMap<String, f64> = weights
                .iter()
                .map(|(genre, weight)| (genre_label(genre), *weight))
                .collect();
            for vector in pivot.values_mut() {
                for (col, genre) in genres.iter().enumerate() {
                    if let Some(weight) = by_label.get(genre) {
                        vector[col] *= weight;
                    }
                }
            }
        }

        let (names, vectors) = pivot
            .into_iter()
            .map(|(name, vector)| (name.to_string(), vector))
            .unzip();

        Self {
            genres,
            names,
            vectors,
        }
    }

    pub fn genres(&self) -> &[String] {
        &self.genres
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn vector(&self, name: &str) -> Option<&[f64]> {
        self.names
            .binary_search_by(|probe| probe.as_str().cmp(name))
            .ok()
            .map(|idx| self.vectors[idx].as_slice())
    }
}

// ============================================================================
// Similarity Matrix
// ============================================================================

/// Symmetric pairwise cosine similarity over all tracks
#[derive(Debug, Clone)]
pub struct SimilarityMatrix {
    names: Vec<String>,
    index: FxHashMap<String, usize>,
    values: Vec<f64>, // row-major, names.len() squared
}

impl SimilarityMatrix {
    pub fn from_features(features: &GenreFeatures) -> Self {
        let n = features.len();
        let norms: Vec<f64> = features.vectors.iter().map(|v| norm(v)).collect();
        let mut values = vec![0.0; n * n];

        for i in 0..n {
            // Self-similarity is 1 unless the vector is all zeros
            values[i * n + i] = if norms[i] == 0.0 { 0.0 } else { 1.0 };
            for j in (i + 1)..n {
                let sim = cosine_similarity(&features.vectors[i], &features.vectors[j]);
                values[i * n + j] = sim;
                values[j * n + i] = sim;
            }
        }

        let index = features
            .names
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), idx))
            .collect();

        Self {
            names: features.names.clone(),
            index,
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn name(&self, idx: usize) -> &str {
        &self.names[idx]
    }

    pub fn similarity(&self, a: &str, b: &str) -> Option<f64> {
        let i = *self.index.get(a)?;
        let j = *self.index.get(b)?;
        Some(self.values[i * self.len() + j])
    }

    /// Up to `top_n` most similar tracks to `name`, itself excluded.
    ///
    /// Takes the `top_n + 1` best entries of the row (stable, ties in matrix
    /// order) and drops the track itself from them. `None` if the track is not
    /// in the matrix.
    pub fn neighbours(&self, name: &str, top_n: usize) -> Option<Vec<(usize, f64)>> {
        let i = *self.index.get(name)?;
        let n = self.len();
        let mut row: Vec<(usize, f64)> = (0..n).map(|j| (j, self.values[i * n + j])).collect();
        row.sort_by(|a, b| b.1.total_cmp(&a.1));

        let mut similar: Vec<(usize, f64)> = row
            .into_iter()
            .take(top_n.saturating_add(1))
            .filter(|&(j, _)| j != i)
            .collect();
        similar.truncate(top_n);
        Some(similar)
    }
}

// ============================================================================
// Matching
// ============================================================================

/// Genres a candidate must intersect; the umbrella tag only counts when the
/// caller listed it.
pub fn effective_genre_filter(preferred: &[String]) -> FxHashSet<&str> {
    let umbrella_requested = preferred.iter().any(|g| g == UMBRELLA_GENRE);
    preferred
        .iter()
        .map(String::as_str)
        .filter(|g| umbrella_requested || *g != UMBRELLA_GENRE)
        .collect()
}

fn passes_filter(row: &CombinedRow, filter: &FxHashSet<&str>) -> bool {
    row.genres.iter().any(|g| filter.contains(g.as_str()))
}

/// Tracks most similar in genre space to the liked tracks.
///
/// Candidates are accumulated per liked track, filtered by the preferred
/// genres (if any), then collapsed to distinct names in first-seen order and
/// cut to `top_n`. Each result is the track's first row in the table with the
/// best similarity it reached. Liked tracks missing from the table are ignored.
pub fn match_by_content(
    table: &CombinedTable,
    genres: &[String],
    liked_tracks: &[String],
    preferred_genres: Option<&[String]>,
    top_n: usize,
    weights: Option<&GenreWeights>,
) -> Vec<ContentMatch> {
    let features = GenreFeatures::build(table, genres, weights);
    let matrix = SimilarityMatrix::from_features(&features);
    match_with_matrix(table, &matrix, liked_tracks, preferred_genres, top_n)
}

/// Lookup half of [`match_by_content`] against a precomputed matrix.
pub fn match_with_matrix(
    table: &CombinedTable,
    matrix: &SimilarityMatrix,
    liked_tracks: &[String],
    preferred_genres: Option<&[String]>,
    top_n: usize,
) -> Vec<ContentMatch> {
    let mut candidates: Vec<(usize, f64)> = Vec::new();
    for liked in liked_tracks {
        match matrix.neighbours(liked, top_n) {
            Some(similar) => candidates.extend(similar),
            None => tracing::debug!(track = %liked, "Liked track not in catalog, ignoring"),
        }
    }

    let first_rows = table.first_rows_by_name();

    let preferred = preferred_genres.map(genre_labels).filter(|p| !p.is_empty());
    if let Some(preferred) = &preferred {
        let filter = effective_genre_filter(preferred);
        candidates.retain(|&(j, _)| {
            first_rows
                .get(matrix.name(j))
                .is_some_and(|row| passes_filter(row, &filter))
        });
    }

    let mut order: Vec<usize> = Vec::new();
    let mut best: FxHashMap<usize, f64> = FxHashMap::default();
    for (j, sim) in candidates {
        best.entry(j)
            .and_modify(|b| *b = b.max(sim))
            .or_insert_with(|| {
                order.push(j);
                sim
            });
    }
    order.truncate(top_n);

    order
        .into_iter()
        .filter_map(|j| {
            let row = first_rows.get(matrix.name(j))?;
            Some(ContentMatch {
                row: (*row).clone(),
                similarity: best[&j],
            })
        })
        .collect()
}
