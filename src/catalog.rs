//! Catalog loading from the artist/track CSV exports.
//!
//! Numeric cells are read leniently: empty cells become 0 and integral float
//! renderings ("80.0", written by dataframe tools when a column had gaps) are
//! accepted as integers.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::{Artist, Track};

/// Errors raised while reading the catalog tables
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("malformed record at line {line} of {path}: {source}")]
    Record {
        path: PathBuf,
        line: u64,
        #[source]
        source: csv::Error,
    },
}

/// Both source tables, loaded wholesale into memory
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub artists: Vec<Artist>,
    pub tracks: Vec<Track>,
}

impl Catalog {
    pub fn load(artists_path: &Path, tracks_path: &Path) -> Result<Self, CatalogError> {
        let artists = load_artists(artists_path)?;
        let tracks = load_tracks(tracks_path)?;
        tracing::info!(
            artists = artists.len(),
            tracks = tracks.len(),
            "Loaded catalog tables"
        );
        Ok(Self { artists, tracks })
    }
}

pub fn load_artists(path: &Path) -> Result<Vec<Artist>, CatalogError> {
    load_records(path)
}

pub fn load_tracks(path: &Path) -> Result<Vec<Track>, CatalogError> {
    load_records(path)
}

fn load_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, CatalogError> {
    let reader = csv::Reader::from_path(path).map_err(|source| CatalogError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    read_records(reader, path)
}

/// Deserialize every record of an already opened reader.
/// `origin` only labels errors.
pub fn read_records<T: DeserializeOwned, R: Read>(
    mut reader: csv::Reader<R>,
    origin: &Path,
) -> Result<Vec<T>, CatalogError> {
    let mut records = Vec::new();
    for result in reader.deserialize() {
        let record = result.map_err(|source| CatalogError::Record {
            path: origin.to_path_buf(),
            line: source.position().map_or(0, |p| p.line()),
            source,
        })?;
        records.push(record);
    }
    Ok(records)
}

// ============================================================================
// Lenient Numeric Cells
// ============================================================================

fn parse_count(raw: &str) -> Result<u64, String> {
    let s = raw.trim();
    if s.is_empty() {
        return Ok(0);
    }
    if let Ok(value) = s.parse::<u64>() {
        return Ok(value);
    }
    match s.parse::<f64>() {
        Ok(f) if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => {
            Ok(f as u64)
        }
        _ => Err(format!("expected a non-negative integer, got '{}'", raw)),
    }
}

pub(crate) fn de_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_count(&raw).map_err(serde::de::Error::custom)
}

pub(crate) fn de_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = de_u64(deserializer)?;
    u32::try_from(value).map_err(|_| serde::de::Error::custom(format!("{} is out of range", value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const ARTISTS_HEADER: &str =
        "Artist Name,Artist ID,Popularity,Followers,Genres,Genre Queried,Artist Image";
    const TRACKS_HEADER: &str = "Track Name,Track ID,Duration (ms),Popularity,Track Number,URI,Album Name,Album ID,Artists,Genre Queried,Track Image";

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("42"), Ok(42));
        assert_eq!(parse_count(" 80.0 "), Ok(80));
        assert_eq!(parse_count(""), Ok(0));
        assert!(parse_count("12.5").is_err());
        assert!(parse_count("-3").is_err());
        assert!(parse_count("lots").is_err());
    }

    #[test]
    fn test_load_artists() {
        let mut file = NamedTempFile::new().expect("temp file");
        writeln!(file, "{}", ARTISTS_HEADER).expect("write header");
        writeln!(
            file,
            "BTS,3Nrfpe0tUJi4K4DXYWgMUX,88,75000000.0,\"k-pop, k-pop boy group\",k-pop,https://i.scdn.co/bts"
        )
        .expect("write row");
        writeln!(file, "Nobody,abc123,,,,k-pop,").expect("write row");

        let artists = load_artists(file.path()).expect("load artists");

        assert_eq!(artists.len(), 2);
        assert_eq!(artists[0].artist_name, "BTS");
        assert_eq!(artists[0].followers, 75_000_000);
        assert_eq!(artists[0].genres, "k-pop, k-pop boy group");
        assert_eq!(artists[0].artist_image.as_deref(), Some("https://i.scdn.co/bts"));
        assert_eq!(artists[1].popularity, 0);
        assert_eq!(artists[1].genres, "");
        assert_eq!(artists[1].artist_image, None);
    }

    #[test]
    fn test_load_tracks_reads_artists_column() {
        let mut file = NamedTempFile::new().expect("temp file");
        writeln!(file, "{}", TRACKS_HEADER).expect("write header");
        writeln!(
            file,
            "Dynamite,0t1kP63rueHleOhQkYSXFY,199053,85,1,spotify:track:0t1kP63rueHleOhQkYSXFY,BE,alb1,BTS,k-pop,"
        )
        .expect("write row");

        let tracks = load_tracks(file.path()).expect("load tracks");

        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].artist_name, "BTS");
        assert_eq!(tracks[0].duration_ms, 199_053);
        assert_eq!(tracks[0].popularity, 85);
        assert_eq!(tracks[0].artist_id, None);
        assert_eq!(tracks[0].track_image, None);
    }

    #[test]
    fn test_malformed_record_reports_line() {
        let mut file = NamedTempFile::new().expect("temp file");
        writeln!(file, "{}", ARTISTS_HEADER).expect("write header");
        writeln!(file, "BTS,id1,88,100,k-pop,k-pop,").expect("write row");
        writeln!(file, "IU,id2,not-a-number,100,k-pop,k-pop,").expect("write row");

        let err = load_artists(file.path()).unwrap_err();
        match err {
            CatalogError::Record { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_missing_file() {
        let err = load_tracks(Path::new("/nonexistent/tracks.csv")).unwrap_err();
        assert!(matches!(err, CatalogError::Open { .. }));
        assert!(err.to_string().contains("failed to open"));
    }
}
