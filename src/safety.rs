//! Safety checks for report output.
//!
//! `--output` overwrites whatever is at the given path, so it must never be
//! pointed at one of the catalog CSVs the report was computed from.

use anyhow::{bail, Result};
use std::path::Path;

/// Required extension for report files
pub const REPORT_EXTENSION: &str = "json";

/// Validates that an output path is safe to overwrite.
///
/// Checks:
/// - Output must have a `.json` extension
/// - Output cannot be the same as any of the provided source paths
pub fn validate_output_path(output: &Path, source_paths: &[&Path]) -> Result<()> {
    let has_extension = output
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(REPORT_EXTENSION));
    if !has_extension {
        bail!(
            "Safety check failed: output file '{}' must have a .{} extension",
            output.display(),
            REPORT_EXTENSION
        );
    }

    for source in source_paths {
        let same = output == *source
            || matches!(
                (output.canonicalize(), source.canonicalize()),
                (Ok(a), Ok(b)) if a == b
            );
        if same {
            bail!(
                "Safety check failed: output '{}' cannot be the same as source '{}'",
                output.display(),
                source.display()
            );
        }
    }

    Ok(())
}
