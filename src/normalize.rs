//! Track-name normalization and liked-track resolution.
//!
//! Names typed on the command line rarely match catalog names byte for byte
//! ("Dynamite (feat. ...)", "Love Dive", "Ｌｏｖｅ ｄｉｖｅ"). Resolution tries
//! the exact name first, then the normalized key, then fuzzy similarity.

use any_ascii::any_ascii;
use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHashMap;
use serde::Serialize;
use unicode_normalization::UnicodeNormalization;

/// Minimum normalized Levenshtein similarity for a fuzzy match
pub const FUZZY_THRESHOLD: f64 = 0.85;

// ============================================================================
// REGEX PATTERNS
// ============================================================================

/// Title cleanup patterns (applied in order).
pub static TITLE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        // Featured artists: "(feat. Artist)", "[ft. Someone]"
        Regex::new(r"(?i)\s*[\(\[](?:feat\.?|ft\.?|featuring|with)\s+[^)\]]+[\)\]]").unwrap(),
        // Language/version variants: "(Korean Ver.)", "(English Version)", "[Japanese ver]"
        Regex::new(r"(?i)\s*[\(\[][^)\]]*\bver(?:\.|sion)?[\)\]]").unwrap(),
        // Remaster variants: "- Remastered 2021", "(2021 Remaster)"
        Regex::new(r"(?i)\s*[\(\[](?:\d{4}\s+)?remaster(?:ed)?(?:\s+\d{4})?[\)\]]").unwrap(),
        Regex::new(r"(?i)\s*[-–—]\s*(?:\d{4}\s+)?remaster(?:ed)?(?:\s+\d{4})?$").unwrap(),
        // Mix variants: "(Remix)", "(Instrumental)", "(Sped Up)"
        Regex::new(r"(?i)\s*[\(\[](?:[^)\]]+\s+)?(?:remix|instrumental|inst\.|sped\s+up|slowed)[\)\]]").unwrap(),
        // Soundtrack credits: "(From \"Drama\" Original Soundtrack)"
        Regex::new(r"(?i)\s*[\(\[]from\s+[^)\]]+[\)\]]").unwrap(),
        // Producer credits: "(Prod. by Someone)"
        Regex::new(r"(?i)\s*[\(\[]prod\.?\s+(?:by\s+)?[^)\]]+[\)\]]").unwrap(),
        // Feat without brackets: "Song feat. Artist"
        Regex::new(r"(?i)\s+(?:feat\.?|ft\.?|featuring)\s+.+$").unwrap(),
    ]
});

/// Regex to collapse runs of whitespace into a single space
pub static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").unwrap());

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Check if a character is a Unicode combining mark (diacritical mark).
pub fn is_combining_mark(c: char) -> bool {
    matches!(c as u32, 0x0300..=0x036F | 0x1AB0..=0x1AFF | 0x1DC0..=0x1DFF | 0xFE20..=0xFE2F)
}

/// Fold Unicode text to lowercase ASCII: NFKD, drop combining marks, then
/// transliterate the rest (Hangul, CJK, full-width forms).
/// e.g., "Beyoncé" → "beyonce", "ＬＯＶＥ" → "love"
pub fn fold_to_ascii(s: &str) -> String {
    let stripped: String = s.nfkd().filter(|c| !is_combining_mark(*c)).collect();
    any_ascii(&stripped).to_lowercase()
}

/// Straight quotes, "&" spelled out.
pub fn normalize_punctuation(s: &str) -> String {
    s.replace(['\u{2018}', '\u{2019}', '\u{00B4}', '\u{0060}'], "'")
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace(" & ", " and ")
}

// ============================================================================
// NORMALIZATION
// ============================================================================

/// Matching key for a track name: feature credits, version and remaster tags
/// stripped, folded to ASCII, whitespace collapsed.
pub fn normalize_track_name(name: &str) -> String {
    let mut result = normalize_punctuation(name);
    for pattern in TITLE_PATTERNS.iter() {
        result = pattern.replace_all(&result, "").to_string();
    }
    let folded = fold_to_ascii(&result);
    MULTI_SPACE.replace_all(folded.trim(), " ").to_string()
}

// ============================================================================
// RESOLUTION
// ============================================================================

/// How a typed name was mapped onto the catalog
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Resolution {
    Exact { name: String },
    Normalized { name: String },
    Fuzzy { name: String, similarity: f64 },
    Unresolved,
}

impl Resolution {
    /// Catalog name, if any
    pub fn name(&self) -> Option<&str> {
        match self {
            Resolution::Exact { name } | Resolution::Normalized { name } | Resolution::Fuzzy { name, .. } => {
                Some(name)
            }
            Resolution::Unresolved => None,
        }
    }
}

/// Index of distinct catalog track names for resolving user input
pub struct TrackNameResolver {
    names: Vec<String>,
    keys: Vec<String>,
    exact: FxHashMap<String, usize>,
    by_key: FxHashMap<String, usize>,
}

impl TrackNameResolver {
    /// Build from catalog names; repeats are ignored, first occurrence wins.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut resolver = Self {
            names: Vec::new(),
            keys: Vec::new(),
            exact: FxHashMap::default(),
            by_key: FxHashMap::default(),
        };
        for name in names {
            let name = name.as_ref();
            if resolver.exact.contains_key(name) {
                continue;
            }
            let idx = resolver.names.len();
            let key = normalize_track_name(name);
            resolver.exact.insert(name.to_string(), idx);
            resolver.by_key.entry(key.clone()).or_insert(idx);
            resolver.names.push(name.to_string());
            resolver.keys.push(key);
        }
        resolver
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn resolve(&self, query: &str) -> Resolution {
        if self.exact.contains_key(query) {
            return Resolution::Exact {
                name: query.to_string(),
            };
        }

        let key = normalize_track_name(query);
        if key.is_empty() {
            return Resolution::Unresolved;
        }
        if let Some(&idx) = self.by_key.get(&key) {
            return Resolution::Normalized {
                name: self.names[idx].clone(),
            };
        }

        // Best fuzzy candidate, first one on ties
        let mut best: Option<(usize, f64)> = None;
        for (idx, candidate) in self.keys.iter().enumerate() {
            let score = strsim::normalized_levenshtein(&key, candidate);
            if score >= FUZZY_THRESHOLD && best.map_or(true, |(_, s)| score > s) {
                best = Some((idx, score));
            }
        }
        match best {
            Some((idx, similarity)) => Resolution::Fuzzy {
                name: self.names[idx].clone(),
                similarity,
            },
            None => Resolution::Unresolved,
        }
    }

    /// Names whose normalized key contains the normalized query, in catalog
    /// order. An empty query lists everything.
    pub fn search(&self, text: &str) -> Vec<&str> {
        let needle = normalize_track_name(text);
        self.names
            .iter()
            .zip(&self.keys)
            .filter(|(_, key)| key.contains(&needle))
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> TrackNameResolver {
        TrackNameResolver::new([
            "Dynamite",
            "LOVE DIVE",
            "Blueming",
            "Dynamite",
            "Butter (feat. Megan Thee Stallion)",
            "Seven (feat. Latto) - Explicit Ver.",
        ])
    }

    #[test]
    fn test_fold_to_ascii() {
        assert_eq!(fold_to_ascii("Beyoncé"), "beyonce");
        assert_eq!(fold_to_ascii("ＬＯＶＥ"), "love");
        assert!(fold_to_ascii("소주 한 잔").is_ascii());
    }

    #[test]
    fn test_normalize_track_name() {
        assert_eq!(normalize_track_name("Butter (feat. Megan Thee Stallion)"), "butter");
        assert_eq!(normalize_track_name("Dynamite (Korean Ver.)"), "dynamite");
        assert_eq!(normalize_track_name("Spring Day [Remastered]"), "spring day");
        assert_eq!(normalize_track_name("  Love   Dive  "), "love dive");
        assert_eq!(normalize_track_name("Salt & Pepper"), "salt and pepper");
        assert_eq!(normalize_track_name("Hype Boy - 2023 Remaster"), "hype boy");
    }

    #[test]
    fn test_resolve_exact_and_normalized() {
        let resolver = resolver();
        assert_eq!(resolver.len(), 5);
        assert_eq!(
            resolver.resolve("Dynamite"),
            Resolution::Exact {
                name: "Dynamite".to_string()
            }
        );
        assert_eq!(resolver.resolve("love dive").name(), Some("LOVE DIVE"));
        assert!(matches!(resolver.resolve("butter"), Resolution::Normalized { .. }));
        assert_eq!(
            resolver.resolve("butter").name(),
            Some("Butter (feat. Megan Thee Stallion)")
        );
    }

    #[test]
    fn test_resolve_fuzzy() {
        let resolver = resolver();
        match resolver.resolve("Bluemingg") {
            Resolution::Fuzzy { name, similarity } => {
                assert_eq!(name, "Blueming");
                assert!(similarity >= FUZZY_THRESHOLD);
            }
            other => panic!("expected fuzzy match, got {:?}", other),
        }
        assert_eq!(resolver.resolve("Ditto"), Resolution::Unresolved);
        assert_eq!(resolver.resolve("   "), Resolution::Unresolved);
    }

    #[test]
    fn test_search() {
        let resolver = resolver();
        assert_eq!(resolver.search("dyna"), vec!["Dynamite"]);
        assert_eq!(resolver.search("").len(), 5);
        assert!(resolver.search("ditto").is_empty());
    }
}
