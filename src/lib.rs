//! K-pop recommendation library: catalog loading, preparation and the three
//! recommenders shared by the `kpop-recs` and `catalog-stats` binaries.

pub mod analytics;
pub mod catalog;
pub mod config;
pub mod content;
pub mod hybrid;
pub mod models;
pub mod normalize;
pub mod popularity;
pub mod prepare;
pub mod progress;
pub mod safety;
pub mod scoring;

#[cfg(test)]
mod testutil;

pub use catalog::{Catalog, CatalogError};
pub use config::{ConfigError, RecommenderConfig};
pub use content::match_by_content;
pub use hybrid::recommend_hybrid;
pub use popularity::rank_by_popularity;
pub use prepare::{prepare, CombinedTable};
