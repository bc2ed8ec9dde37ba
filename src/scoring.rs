//! Scoring functions for recommendations.
//!
//! - Cosine similarity between genre vectors
//! - Popularity normalization
//! - Hybrid blend score

use serde::{Deserialize, Serialize};

/// Popularity values are on a 0-100 scale
pub const MAX_POPULARITY: u32 = 100;

/// Cosine similarity of two equal-length vectors.
/// Zero vectors are dissimilar to everything (0.0). The result is clamped
/// to [-1, 1].
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = norm(a);
    let norm_b = norm(b);
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        // Rounding can push parallel vectors just past 1
        (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
    }
}

pub fn norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Popularity mapped onto 0.0-1.0
pub fn normalized_popularity(popularity: u32) -> f64 {
    popularity.min(MAX_POPULARITY) as f64 / MAX_POPULARITY as f64
}

/// Relative weight of the two hybrid signals
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlendWeights {
    pub pop_weight: f64,
    pub content_weight: f64,
}

impl Default for BlendWeights {
    fn default() -> Self {
        Self {
            pop_weight: 0.5,
            content_weight: 0.5,
        }
    }
}

/// Hybrid score: `pop_weight * popularity/100 + content_weight * similarity`.
/// Popularity-only entries have no similarity and contribute 0 on that side.
pub fn blend_score(popularity: u32, similarity: Option<f64>, weights: BlendWeights) -> f64 {
    weights.pop_weight * normalized_popularity(popularity)
        + weights.content_weight * similarity.unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_identical_and_orthogonal() {
        assert!((cosine_similarity(&[1.0, 1.0, 0.0], &[2.0, 2.0, 0.0]) - 1.0).abs() < 1e-12);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 3.0]), 0.0);
    }

    #[test]
    fn test_cosine_partial_overlap() {
        // [1,1,0] vs [1,0,0] -> 1 / sqrt(2)
        let sim = cosine_similarity(&[1.0, 1.0, 0.0], &[1.0, 0.0, 0.0]);
        assert!((sim - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-12);
    }

    #[test]
    fn test_cosine_stays_within_unit_range() {
        let vectors: [&[f64]; 4] = [
            &[0.1, 0.2, 0.3],
            &[1.0, 3.0, 0.0, 0.0],
            &[0.7, 0.7, 0.7, 0.7, 0.7],
            &[1e-3, 1e3, 7.0],
        ];
        for v in vectors {
            let sim = cosine_similarity(v, v);
            assert!(sim <= 1.0, "{:?} gave {}", v, sim);
            assert!((sim - 1.0).abs() < 1e-12);

            let negated: Vec<f64> = v.iter().map(|x| -x).collect();
            assert!(cosine_similarity(v, &negated) >= -1.0);
        }
    }

    #[test]
    fn test_cosine_zero_vector() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_normalized_popularity_clamps() {
        assert_eq!(normalized_popularity(0), 0.0);
        assert_eq!(normalized_popularity(50), 0.5);
        assert_eq!(normalized_popularity(250), 1.0);
    }

    #[test]
    fn test_blend_score() {
        let weights = BlendWeights::default();
        assert!((blend_score(80, None, weights) - 0.4).abs() < 1e-12);
        assert!((blend_score(40, Some(1.0), weights) - 0.7).abs() < 1e-12);

        let pop_only = BlendWeights {
            pop_weight: 1.0,
            content_weight: 0.0,
        };
        assert!((blend_score(40, Some(1.0), pop_only) - 0.4).abs() < 1e-12);
    }
}
