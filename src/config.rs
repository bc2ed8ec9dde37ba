//! Recommender configuration.
//!
//! Everything has a default, so a config file only needs the keys it
//! changes:
//!
//! ```toml
//! top_n = 5
//! pop_weight = 0.7
//! content_weight = 0.3
//! genres = ["k-pop", "k-rap", "trot"]
//!
//! [genre_weights]
//! "k-rap" = 2.0
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::prepare::{genre_label, genre_labels};
use crate::scoring::BlendWeights;

/// Per-genre multipliers for the content matcher's feature columns
pub type GenreWeights = BTreeMap<String, f64>;

/// Recognized genre labels used when no config overrides them
pub const DEFAULT_GENRES: &[&str] = &[
    "k-pop",
    "k-pop boy group",
    "k-pop girl group",
    "5th gen k-pop",
    "classic k-pop",
    "korean r&b",
    "k-rap",
    "korean ost",
    "korean pop",
    "classic korean pop",
    "k-indie",
    "trot",
    "k-pop ballad",
    "korean soundtrack",
];

pub const DEFAULT_TOP_N: usize = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommenderConfig {
    /// Recognized genre labels, also the hybrid output keys
    pub genres: Vec<String>,
    pub top_n: usize,
    pub pop_weight: f64,
    pub content_weight: f64,
    pub genre_weights: GenreWeights,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        let blend = BlendWeights::default();
        Self {
            genres: DEFAULT_GENRES.iter().map(|g| g.to_string()).collect(),
            top_n: DEFAULT_TOP_N,
            pop_weight: blend.pop_weight,
            content_weight: blend.content_weight,
            genre_weights: GenreWeights::new(),
        }
    }
}

impl RecommenderConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&contents)?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Parse, normalize genre labels and validate
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(contents)?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    /// Trim and lowercase genre labels, drop blanks and repeats
    pub fn normalize(&mut self) {
        self.genres = genre_labels(&self.genres);
        self.genre_weights = std::mem::take(&mut self.genre_weights)
            .into_iter()
            .map(|(genre, weight)| (genre_label(&genre), weight))
            .collect();
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.genres.is_empty() {
            return Err(ConfigError::Invalid("genre list is empty".to_string()));
        }
        if self.top_n == 0 {
            return Err(ConfigError::Invalid("top_n must be at least 1".to_string()));
        }
        check_weight("pop_weight", self.pop_weight)?;
        check_weight("content_weight", self.content_weight)?;
        for (genre, weight) in &self.genre_weights {
            check_weight(&format!("genre_weights.\"{}\"", genre), *weight)?;
        }
        Ok(())
    }

    pub fn blend(&self) -> BlendWeights {
        BlendWeights {
            pop_weight: self.pop_weight,
            content_weight: self.content_weight,
        }
    }

    /// Genre weights, `None` when none are configured
    pub fn weights(&self) -> Option<&GenreWeights> {
        if self.genre_weights.is_empty() {
            None
        } else {
            Some(&self.genre_weights)
        }
    }
}

fn check_weight(name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{} must be a finite non-negative number, got {}",
            name, value
        )))
    }
}
